//! Path summary: a compact tree of every distinct root-to-node label path in
//! a document, with per-path occurrence counts and inferred value types.
//!
//! The summary is built incrementally by a single writer while a document is
//! constructed, one `(name, kind, level, value)` event per stored node. Once
//! construction finishes the structure is immutable and may be shared freely
//! between concurrent query compilations. Edits never patch the tree; a
//! rebuild replaces it wholesale.

/// One vertex of the summary tree.
pub mod node;

/// Per-path value statistics and kind inference.
pub mod stats;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use crate::primitives::bytes::{buf::Cursor, vnum};
use crate::types::{NameId, NodeKind, Result, XylemError};

pub use node::{NodeRef, PathNode};
pub use stats::{Categories, ValueKind, ValueStats};

/// Leading format byte of the persisted summary, bumped on layout changes.
const FORMAT_FLAG: u8 = 0x01;

/// Tuning options for summary construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryOptions {
    /// Upper bound on distinct values tracked per path before category
    /// tracking is abandoned.
    pub max_categories: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self { max_categories: 100 }
    }
}

/// Aggregated statistics for one `(name, kind)` pair across the whole tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NameStats {
    /// Total occurrences over all paths ending in this pair.
    pub count: u64,
    /// True iff every such path is a leaf (no element/comment/PI children).
    pub leaf: bool,
    /// Most general value kind observed across those paths.
    pub kind: ValueKind,
}

/// The root-anchored tree of path nodes for one document.
pub struct PathSummary {
    nodes: Vec<PathNode>,
    /// Currently open node per nesting depth during construction.
    stack: SmallVec<[NodeRef; 16]>,
    opts: SummaryOptions,
}

impl Default for PathSummary {
    fn default() -> Self {
        Self::new(SummaryOptions::default())
    }
}

impl PathSummary {
    /// Creates an empty summary.
    pub fn new(opts: SummaryOptions) -> Self {
        Self {
            nodes: Vec::new(),
            stack: SmallVec::new(),
            opts,
        }
    }

    /// Appends one traversal event in document order.
    ///
    /// Level 0 creates or reuses the root; deeper levels attach to the open
    /// node one level up, so equally-deep siblings under different parents
    /// are never confused. `value` carries the node text for text and
    /// attribute events.
    pub fn index(&mut self, name: NameId, kind: NodeKind, level: usize, value: Option<&str>) {
        if level == 0 {
            if self.nodes.is_empty() {
                self.nodes.push(PathNode::new(name, kind, None));
            }
            self.bump(NodeRef(0), value);
            self.open(0, NodeRef(0));
            return;
        }
        assert!(
            level <= self.stack.len(),
            "traversal event at level {level} without an open parent"
        );
        let parent = self.stack[level - 1];
        let child = self.child(parent, name, kind);
        self.bump(child, value);
        self.open(level, child);
    }

    /// Returns the matching child of `parent`, creating it on first sight.
    fn child(&mut self, parent: NodeRef, name: NameId, kind: NodeKind) -> NodeRef {
        if let Some(&c) = self.nodes[parent.idx()]
            .children
            .iter()
            .find(|c| self.nodes[c.idx()].matches(name, kind))
        {
            return c;
        }
        let r = NodeRef(self.nodes.len() as u32);
        self.nodes.push(PathNode::new(name, kind, Some(parent)));
        self.nodes[parent.idx()].children.push(r);
        r
    }

    fn bump(&mut self, r: NodeRef, value: Option<&str>) {
        let stats = &mut self.nodes[r.idx()].stats;
        stats.count = stats.count.saturating_add(1);
        if let Some(value) = value {
            stats.add(value, &self.opts);
        }
    }

    fn open(&mut self, level: usize, r: NodeRef) {
        if level == self.stack.len() {
            self.stack.push(r);
        } else {
            self.stack[level] = r;
        }
    }

    /// The root node, absent only for an empty summary.
    pub fn root(&self) -> Option<NodeRef> {
        (!self.nodes.is_empty()).then_some(NodeRef(0))
    }

    /// Borrows a node from the arena.
    pub fn node(&self, r: NodeRef) -> &PathNode {
        &self.nodes[r.idx()]
    }

    /// Number of distinct paths in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no event has been indexed yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth of a node below the root.
    pub fn level(&self, r: NodeRef) -> usize {
        let mut level = 0;
        let mut cur = r;
        while let Some(p) = self.nodes[cur.idx()].parent {
            level += 1;
            cur = p;
        }
        level
    }

    /// True iff the node has no element/comment/PI children.
    pub fn is_leaf(&self, r: NodeRef) -> bool {
        self.nodes[r.idx()].is_leaf(&self.nodes)
    }

    /// Distinct parents of the given nodes, in first-seen order.
    pub fn parent(&self, nodes: &[NodeRef]) -> Vec<NodeRef> {
        let mut out = Vec::new();
        for &r in nodes {
            if let Some(p) = self.nodes[r.idx()].parent {
                if !out.contains(&p) {
                    out.push(p);
                }
            }
        }
        out
    }

    /// Children (or, with `recursive`, all descendants in pre-order) of the
    /// given nodes, deduplicated in first-seen order.
    pub fn descendants(&self, nodes: &[NodeRef], recursive: bool) -> Vec<NodeRef> {
        let mut out = Vec::new();
        for &r in nodes {
            self.collect(r, recursive, &mut out);
        }
        out
    }

    fn collect(&self, r: NodeRef, recursive: bool, out: &mut Vec<NodeRef>) {
        for &c in &self.nodes[r.idx()].children {
            if !out.contains(&c) {
                out.push(c);
            }
            if recursive {
                self.collect(c, true, out);
            }
        }
    }

    /// Every node anywhere in the tree with the given name and kind, in
    /// pre-order.
    pub fn desc(&self, name: NameId, kind: NodeKind) -> Vec<NodeRef> {
        let mut out = Vec::new();
        if let Some(root) = self.root() {
            self.desc_from(root, name, kind, &mut out);
        }
        out
    }

    fn desc_from(&self, r: NodeRef, name: NameId, kind: NodeKind, out: &mut Vec<NodeRef>) {
        if self.nodes[r.idx()].matches(name, kind) {
            out.push(r);
        }
        for &c in &self.nodes[r.idx()].children {
            self.desc_from(c, name, kind, out);
        }
    }

    /// Aggregated statistics for one `(name, kind)` pair, or `None` when the
    /// pair never occurred. Never an error: an unknown name is a regular
    /// outcome for the planner.
    pub fn stats_for(&self, name: NameId, kind: NodeKind) -> Option<NameStats> {
        let hits = self.desc(name, kind);
        if hits.is_empty() {
            return None;
        }
        let mut count = 0u64;
        let mut leaf = true;
        let mut value_kind = ValueKind::Integer;
        for r in hits {
            let node = &self.nodes[r.idx()];
            count += u64::from(node.stats.count);
            leaf &= node.is_leaf(&self.nodes);
            value_kind = value_kind.max(node.stats.kind());
        }
        Some(NameStats {
            count,
            leaf,
            kind: value_kind,
        })
    }

    /// Serializes the whole tree behind a leading format flag byte.
    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(FORMAT_FLAG);
        vnum::encode(u32::from(!self.nodes.is_empty()), out);
        if let Some(root) = self.root() {
            PathNode::write(&self.nodes, root, out);
        }
        debug!(nodes = self.nodes.len(), bytes = out.len(), "persisted path summary");
    }

    /// Restores a tree written by [`PathSummary::write`]. Children come back
    /// in the exact order they were written.
    pub fn read(bytes: &[u8], opts: SummaryOptions) -> Result<Self> {
        let mut cur = Cursor::new(bytes);
        let flag = cur.byte()?;
        if flag != FORMAT_FLAG {
            return Err(XylemError::Corruption("unsupported path summary format"));
        }
        let mut nodes = Vec::new();
        if vnum::decode(&mut cur)? != 0 {
            PathNode::read(&mut nodes, None, &mut cur)?;
        }
        if cur.remaining() != 0 {
            return Err(XylemError::CorruptionAt {
                offset: cur.offset(),
                reason: "trailing bytes after path summary",
            });
        }
        debug!(nodes = nodes.len(), "loaded path summary");
        Ok(Self {
            nodes,
            stack: SmallVec::new(),
            opts,
        })
    }

    /// Renders the tree for introspection, one node per line, with `resolve`
    /// supplying human-readable labels.
    pub fn render(&self, resolve: &dyn Fn(NameId, NodeKind) -> String) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let mut walk: Vec<(NodeRef, usize)> = match self.root() {
            Some(root) => vec![(root, 0)],
            None => Vec::new(),
        };
        while let Some((r, depth)) = walk.pop() {
            let node = &self.nodes[r.idx()];
            for _ in 0..depth {
                out.push_str("  ");
            }
            let _ = write!(
                out,
                "{}: {}x, {}",
                resolve(node.name, node.kind),
                node.stats.count,
                node.stats.kind()
            );
            if node.stats.kind().numeric() && node.stats.min <= node.stats.max {
                let _ = write!(out, " [{}..{}]", node.stats.min, node.stats.max);
            }
            out.push('\n');
            for &c in node.children.iter().rev() {
                walk.push((c, depth + 1));
            }
        }
        out
    }
}
