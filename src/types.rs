//! Shared identifiers, node kinds, and the crate-wide error type.

use std::fmt;

use thiserror::Error;

/// Identifier of an element or attribute name in the name dictionary.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct NameId(pub u32);

impl fmt::Display for NameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NameId {
    fn from(value: u32) -> Self {
        NameId(value)
    }
}

impl From<NameId> for u32 {
    fn from(value: NameId) -> Self {
        value.0
    }
}

/// Kind of a stored document node.
///
/// The discriminants match the kind bytes used by the node table and the
/// persisted path summary, so they must never be reordered.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum NodeKind {
    /// Document root node.
    Document = 0,
    /// Element node.
    Element = 1,
    /// Text node.
    Text = 2,
    /// Attribute node.
    Attribute = 3,
    /// Comment node.
    Comment = 4,
    /// Processing instruction node.
    Pi = 5,
}

impl NodeKind {
    /// Returns the kind byte written to disk.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decodes a kind byte, failing on values outside the closed set.
    pub fn try_from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(NodeKind::Document),
            1 => Ok(NodeKind::Element),
            2 => Ok(NodeKind::Text),
            3 => Ok(NodeKind::Attribute),
            4 => Ok(NodeKind::Comment),
            5 => Ok(NodeKind::Pi),
            _ => Err(XylemError::Corruption("unknown node kind byte")),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NodeKind::Document => "document",
            NodeKind::Element => "element",
            NodeKind::Text => "text",
            NodeKind::Attribute => "attribute",
            NodeKind::Comment => "comment",
            NodeKind::Pi => "processing-instruction",
        };
        f.write_str(label)
    }
}

/// Errors raised by this crate.
///
/// Only data-integrity and programming faults surface here; an optimizer
/// deciding not to rewrite an expression is a regular `None` outcome, never an
/// error.
#[derive(Debug, Error)]
pub enum XylemError {
    /// Underlying I/O failure.
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    /// Persisted data failed to decode.
    #[error("corruption: {0}")]
    Corruption(&'static str),
    /// Persisted data failed to decode at a known byte offset.
    #[error("corruption at byte {offset}: {reason}")]
    CorruptionAt {
        /// Byte offset into the decoded buffer.
        offset: usize,
        /// What was being decoded.
        reason: &'static str,
    },
    /// Caller supplied an argument outside the valid domain.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, XylemError>;
