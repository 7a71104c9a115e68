//! Expression and step model for candidate predicates.

use std::fmt;

use crate::index::IndexType;
use crate::types::{NameId, NodeKind};

/// Navigation axis of a step.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Axis {
    /// Direct children.
    Child,
    /// All descendants.
    Descendant,
    /// The node itself and all descendants.
    DescOrSelf,
    /// Attributes of the node.
    Attribute,
    /// The node itself.
    SelfAxis,
    /// The direct parent.
    Parent,
    /// All ancestors.
    Ancestor,
    /// The node itself and all ancestors.
    AncOrSelf,
}

impl Axis {
    /// The axis that walks back where this one came from.
    pub fn invert(self) -> Axis {
        match self {
            Axis::Child | Axis::Attribute => Axis::Parent,
            Axis::Descendant => Axis::Ancestor,
            Axis::DescOrSelf => Axis::AncOrSelf,
            Axis::SelfAxis => Axis::SelfAxis,
            Axis::Parent => Axis::Child,
            Axis::Ancestor => Axis::Descendant,
            Axis::AncOrSelf => Axis::DescOrSelf,
        }
    }

    /// True for axes that never leave the subtree of the context node.
    pub fn down(self) -> bool {
        matches!(
            self,
            Axis::Child | Axis::Descendant | Axis::DescOrSelf | Axis::Attribute | Axis::SelfAxis
        )
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Axis::Child => "child",
            Axis::Descendant => "descendant",
            Axis::DescOrSelf => "descendant-or-self",
            Axis::Attribute => "attribute",
            Axis::SelfAxis => "self",
            Axis::Parent => "parent",
            Axis::Ancestor => "ancestor",
            Axis::AncOrSelf => "ancestor-or-self",
        };
        f.write_str(label)
    }
}

/// Node test applied by a step.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NodeTest {
    /// `node()`: accepts every node.
    AnyNode,
    /// Kind test without a name, e.g. `text()`.
    Kind(NodeKind),
    /// Simple local-name test for a named kind, e.g. `chapter` or `@id`.
    Name {
        /// Name id of the tested label.
        name: NameId,
        /// Kind the name applies to.
        kind: NodeKind,
    },
    /// Wildcard name test for a kind, e.g. `*` or `@*`.
    Wildcard(NodeKind),
}

impl NodeTest {
    /// The kind this test restricts to, if any.
    pub fn kind(&self) -> Option<NodeKind> {
        match self {
            NodeTest::AnyNode => None,
            NodeTest::Kind(kind) | NodeTest::Wildcard(kind) => Some(*kind),
            NodeTest::Name { kind, .. } => Some(*kind),
        }
    }

    /// The tested name, if the test carries one.
    pub fn name(&self) -> Option<NameId> {
        match self {
            NodeTest::Name { name, .. } => Some(*name),
            _ => None,
        }
    }
}

/// One step of an axis path.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    /// Navigation axis.
    pub axis: Axis,
    /// Node test.
    pub test: NodeTest,
    /// Predicates attached to the step.
    pub preds: Vec<Expr>,
}

impl Step {
    /// A step without predicates.
    pub fn new(axis: Axis, test: NodeTest) -> Self {
        Self {
            axis,
            test,
            preds: Vec::new(),
        }
    }

    /// A step carrying predicates.
    pub fn with_preds(axis: Axis, test: NodeTest, preds: Vec<Expr>) -> Self {
        Self { axis, test, preds }
    }

    /// True if any predicate makes the traversal position load-bearing.
    /// An index scan cannot reproduce traversal order, so positional steps
    /// disqualify a path from rewriting.
    pub fn positional(&self) -> bool {
        self.preds.iter().any(|p| match p {
            Expr::Position | Expr::Last => true,
            Expr::Literal(atoms) => atoms
                .iter()
                .any(|a| matches!(a.ty, AtomType::Int | AtomType::Dbl)),
            _ => false,
        })
    }
}

/// A path of consecutive steps, optionally anchored at a root expression.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisPath {
    /// Root the path starts from; `None` for a relative path.
    pub root: Option<Box<Expr>>,
    /// Steps in evaluation order, never empty.
    pub steps: Vec<Step>,
}

impl AxisPath {
    /// A relative path.
    pub fn relative(steps: Vec<Step>) -> Self {
        Self { root: None, steps }
    }

    /// A path starting from `root`.
    pub fn rooted(root: Expr, steps: Vec<Step>) -> Self {
        Self {
            root: Some(Box::new(root)),
            steps,
        }
    }

    /// True when the path starts from the context item.
    pub fn rootless(&self) -> bool {
        self.root.is_none()
    }
}

/// Atomic type of a literal or of a run-time expression's result.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AtomType {
    /// `xs:string`.
    Str,
    /// Untyped atomic data.
    Untyped,
    /// `xs:integer`.
    Int,
    /// `xs:double`.
    Dbl,
    /// `xs:boolean`.
    Bool,
}

impl AtomType {
    /// True for the types an index probe may carry.
    pub fn is_string_or_untyped(self) -> bool {
        matches!(self, AtomType::Str | AtomType::Untyped)
    }
}

/// One literal atomic value.
#[derive(Clone, Debug, PartialEq)]
pub struct Atom {
    /// String representation of the value.
    pub value: String,
    /// Atomic type.
    pub ty: AtomType,
}

impl Atom {
    /// A string literal.
    pub fn str(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ty: AtomType::Str,
        }
    }

    /// An untyped-atomic literal.
    pub fn untyped(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ty: AtomType::Untyped,
        }
    }

    /// An integer literal.
    pub fn int(value: i64) -> Self {
        Self {
            value: value.to_string(),
            ty: AtomType::Int,
        }
    }
}

/// Statically-known facts about a run-time-evaluated probe expression.
///
/// The planner never sees the expression itself; these are the properties the
/// surrounding compiler derives for it.
#[derive(Clone, Debug, PartialEq)]
pub struct DynExpr {
    /// Display label, e.g. `$query`.
    pub label: String,
    /// Atomic type of the evaluated result.
    pub returns: AtomType,
    /// True if evaluation reads the context item.
    pub uses_context: bool,
    /// False for expressions with side effects or unstable results.
    pub deterministic: bool,
}

impl DynExpr {
    /// A deterministic, context-free expression of the given type.
    pub fn new(label: impl Into<String>, returns: AtomType) -> Self {
        Self {
            label: label.into(),
            returns,
            uses_context: false,
            deterministic: true,
        }
    }
}

/// Expression forms the planner distinguishes.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// The context item `.`.
    ContextItem,
    /// An axis path.
    Path(AxisPath),
    /// A literal sequence of atomic values.
    Literal(Vec<Atom>),
    /// A run-time-evaluated expression, reduced to its static facts.
    Dyn(DynExpr),
    /// The `position()` function.
    Position,
    /// The `last()` function.
    Last,
    /// A rewritten index lookup.
    IndexAccess(Box<IndexAccess>),
}

impl Expr {
    /// A single-atom literal.
    pub fn literal(atom: Atom) -> Self {
        Expr::Literal(vec![atom])
    }
}

/// Probe carried by an index access.
#[derive(Clone, Debug, PartialEq)]
pub enum Probe {
    /// Deduplicated literal probe strings.
    Tokens(Vec<String>),
    /// Probe evaluated at run time.
    Dyn(DynExpr),
}

/// The rewritten access-plan expression: retrieves results from an index
/// lookup instead of a tree scan.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexAccess {
    /// Index consulted by the scan.
    pub index_type: IndexType,
    /// Probe value(s).
    pub probe: Probe,
    /// Structural-name re-filter applied to the raw hits, if any.
    pub name_test: Option<NodeTest>,
    /// Exact result cardinality when provable; `None` means unbounded.
    pub size: Option<u64>,
}
