//! Statistics-driven path indexing and cost-based index selection for the
//! xylem embedded XML document database.
//!
//! While a document is constructed, [`path::PathSummary`] records every
//! distinct root-to-node label path with occurrence counts and inferred value
//! types. At query-compilation time, [`index::IndexInfo`] consults those
//! statistics (or the live indexes) to decide whether a value predicate can
//! be rewritten into a direct index lookup, and builds the rewritten access
//! plan with a cost estimate when it can.

#![warn(missing_docs)]

pub mod index;
pub mod path;
pub mod primitives;
pub mod query;
pub mod storage;
pub mod types;
