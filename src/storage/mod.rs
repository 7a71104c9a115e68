//! Boundary to the document storage engine.
//!
//! The planner never touches the node table or the physical indexes
//! directly; it consults this read-only interface for document metadata,
//! index existence, per-token cost estimates, and the path summary. All
//! implementations must stay safe under concurrent read access.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::index::{IndexCosts, IndexType};
use crate::path::PathSummary;
use crate::types::NameId;

/// Document metadata the planner depends on.
#[derive(Clone, Debug)]
pub struct DocMeta {
    /// Total number of stored nodes.
    pub size: u64,
    /// Longest value the text and attribute indexes will store.
    pub max_index_len: usize,
    /// False once pending updates have outdated index structures.
    pub uptodate: bool,
    /// True when the document declares no namespaces.
    pub ns_free: bool,
}

impl Default for DocMeta {
    fn default() -> Self {
        Self {
            size: 0,
            max_index_len: 96,
            uptodate: true,
            ns_free: true,
        }
    }
}

/// Read-only view of one document's storage, as consumed at planning time.
pub trait DocStore {
    /// Document metadata.
    fn meta(&self) -> &DocMeta;

    /// True if the given index physically exists.
    fn index_exists(&self, index_type: IndexType) -> bool;

    /// True if the index's name dictionary covers the given name.
    fn index_contains_name(&self, index_type: IndexType, name: NameId) -> bool;

    /// Expected result count for probing the index with one token, or `None`
    /// when no estimate can be computed.
    fn costs(&self, index_type: IndexType, token: &str) -> Option<IndexCosts>;

    /// The document's path summary.
    fn summary(&self) -> &PathSummary;
}

/// In-memory [`DocStore`] for tests and prototyping.
#[derive(Default)]
pub struct MemStore {
    meta: DocMeta,
    indexes: FxHashSet<IndexType>,
    names: FxHashSet<(IndexType, NameId)>,
    costs: FxHashMap<(IndexType, String), u64>,
    summary: PathSummary,
}

impl MemStore {
    /// Creates an empty store with default metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the document metadata.
    pub fn with_meta(mut self, meta: DocMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Sets the total node count.
    pub fn with_size(mut self, size: u64) -> Self {
        self.meta.size = size;
        self
    }

    /// Registers an existing index.
    pub fn with_index(mut self, index_type: IndexType) -> Self {
        self.indexes.insert(index_type);
        self
    }

    /// Registers a name in an index's name dictionary.
    pub fn with_name(mut self, index_type: IndexType, name: NameId) -> Self {
        self.names.insert((index_type, name));
        self
    }

    /// Registers the expected result count for one probe token.
    pub fn with_cost(mut self, index_type: IndexType, token: impl Into<String>, n: u64) -> Self {
        self.costs.insert((index_type, token.into()), n);
        self
    }

    /// Attaches a path summary.
    pub fn with_summary(mut self, summary: PathSummary) -> Self {
        self.summary = summary;
        self
    }
}

impl DocStore for MemStore {
    fn meta(&self) -> &DocMeta {
        &self.meta
    }

    fn index_exists(&self, index_type: IndexType) -> bool {
        self.indexes.contains(&index_type)
    }

    fn index_contains_name(&self, index_type: IndexType, name: NameId) -> bool {
        self.names.contains(&(index_type, name))
    }

    fn costs(&self, index_type: IndexType, token: &str) -> Option<IndexCosts> {
        if !self.index_exists(index_type) {
            return None;
        }
        let n = self
            .costs
            .get(&(index_type, token.to_string()))
            .copied()
            .unwrap_or(0);
        Some(IndexCosts::Results(n))
    }

    fn summary(&self) -> &PathSummary {
        &self.summary
    }
}
