//! Low-level primitives behind the persisted path summary.

/// Byte-level utilities and encoding/decoding.
///
/// Variable-length integer codec, token helpers, and a fallible slice cursor.
pub mod bytes;
