//! One vertex of the path summary tree.

use crate::primitives::bytes::{buf::Cursor, vnum};
use crate::types::{NameId, NodeKind, Result, XylemError};

use super::stats::ValueStats;

/// Index of a path node within its summary's arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct NodeRef(pub u32);

impl NodeRef {
    pub(crate) fn idx(self) -> usize {
        self.0 as usize
    }
}

/// A labeled, typed, statistics-bearing vertex of the path summary.
///
/// Identity is the `(name, kind)` pair, unique among the children of one
/// parent; revisiting the same pair merges into the existing node instead of
/// creating a sibling. Children keep first-discovery order.
#[derive(Clone, Debug, PartialEq)]
pub struct PathNode {
    /// Name id of the path segment (0 for unnamed kinds).
    pub name: NameId,
    /// Node kind of the path segment.
    pub kind: NodeKind,
    pub(crate) parent: Option<NodeRef>,
    pub(crate) children: Vec<NodeRef>,
    /// Aggregated statistics over every occurrence of this path.
    pub stats: ValueStats,
}

impl PathNode {
    pub(crate) fn new(name: NameId, kind: NodeKind, parent: Option<NodeRef>) -> Self {
        Self {
            name,
            kind,
            parent,
            children: Vec::new(),
            stats: ValueStats::new(),
        }
    }

    /// True if this node represents the given path segment.
    pub fn matches(&self, name: NameId, kind: NodeKind) -> bool {
        self.name == name && self.kind == kind
    }

    /// Children in first-discovery order.
    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }

    /// The owning parent, absent only for the root.
    pub fn parent(&self) -> Option<NodeRef> {
        self.parent
    }

    /// True iff no child is an element, comment, or processing instruction;
    /// the text content of such a path is addressable as the path's own value.
    pub fn is_leaf(&self, nodes: &[PathNode]) -> bool {
        self.children.iter().all(|c| {
            !matches!(
                nodes[c.idx()].kind,
                NodeKind::Element | NodeKind::Comment | NodeKind::Pi
            )
        })
    }

    /// Writes this node and its subtree in pre-order.
    pub(crate) fn write(nodes: &[PathNode], r: NodeRef, out: &mut Vec<u8>) {
        let node = &nodes[r.idx()];
        vnum::encode(node.name.0, out);
        out.push(node.kind.as_u8());
        vnum::encode(node.stats.count, out);
        vnum::encode(node.children.len() as u32, out);
        node.stats.write(out);
        for &child in &node.children {
            Self::write(nodes, child, out);
        }
    }

    /// Reads one subtree written by [`PathNode::write`], appending its nodes
    /// to the arena and returning the subtree root. Children are restored in
    /// the exact order they were written.
    pub(crate) fn read(
        nodes: &mut Vec<PathNode>,
        parent: Option<NodeRef>,
        cur: &mut Cursor<'_>,
    ) -> Result<NodeRef> {
        let name = NameId(vnum::decode(cur)?);
        let kind_off = cur.offset();
        let kind = NodeKind::try_from_u8(cur.byte()?).map_err(|_| XylemError::CorruptionAt {
            offset: kind_off,
            reason: "unknown node kind byte",
        })?;
        let count = vnum::decode(cur)?;
        let child_count = vnum::decode(cur)?;
        let stats = ValueStats::read(count, cur)?;

        if nodes.len() >= u32::MAX as usize {
            return Err(XylemError::Corruption("path summary arena overflow"));
        }
        let r = NodeRef(nodes.len() as u32);
        nodes.push(PathNode {
            name,
            kind,
            parent,
            children: Vec::new(),
            stats,
        });
        for _ in 0..child_count {
            let child = Self::read(nodes, Some(r), cur)?;
            nodes[r.idx()].children.push(child);
        }
        Ok(r)
    }
}
