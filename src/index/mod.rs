#![forbid(unsafe_code)]

//! Cost-based index selection: decides at compile time whether a value
//! predicate can be answered by an index lookup instead of a tree scan, and
//! builds the rewritten access plan when it can.

/// Expected-result-count algebra with enforcement sentinels.
pub mod costs;

/// Shape classification of a rewritable predicate's subject.
pub mod pred;

/// The planner that classifies, costs, and rewrites candidate predicates.
pub mod planner;

use std::fmt;

pub use costs::IndexCosts;
pub use planner::{IndexInfo, IndexPlan, PlannerOptions};
pub use pred::IndexPred;

/// The value index families a predicate may be routed to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum IndexType {
    /// Text-node values.
    Text,
    /// Attribute values.
    Attribute,
    /// Tokenized attribute values.
    Token,
    /// Full-text index; planned by a separate optimizer, never by this one.
    FullText,
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IndexType::Text => "text",
            IndexType::Attribute => "attribute",
            IndexType::Token => "token",
            IndexType::FullText => "full-text",
        };
        f.write_str(label)
    }
}
