#![forbid(unsafe_code)]

//! Compile-time query surface consumed by the index planner.
//!
//! Only the shapes the planner pattern-matches are modeled here: axis steps
//! with node tests and predicates, literal atom sequences, and descriptors of
//! run-time probe expressions. Full query evaluation lives outside this
//! crate.

/// Expression and step model for candidate predicates.
pub mod ast;

pub use ast::{Atom, AtomType, Axis, AxisPath, DynExpr, Expr, IndexAccess, NodeTest, Probe, Step};
