//! Classification of a rewritable predicate's subject expression.

use smallvec::SmallVec;

use crate::query::ast::{Axis, AxisPath, Expr, NodeTest, Step};
use crate::types::NodeKind;

/// The two syntactic forms a rewritable predicate's subject can take.
///
/// Dispatch over the variants is closed and total; anything else is not a
/// candidate for index rewriting.
#[derive(Debug)]
pub enum IndexPred<'a> {
    /// The subject is the context item itself, as in `a[. = 'x']`.
    Context,
    /// The subject is a relative, root-less path, as in `a[b/c = 'x']`.
    Path(&'a AxisPath),
}

impl<'a> IndexPred<'a> {
    /// Classifies a subject expression, or returns `None` when it has
    /// neither supported shape.
    pub fn get(subject: &'a Expr) -> Option<IndexPred<'a>> {
        match subject {
            Expr::ContextItem => Some(IndexPred::Context),
            Expr::Path(path) if path.rootless() && !path.steps.is_empty() => {
                Some(IndexPred::Path(path))
            }
            _ => None,
        }
    }

    /// The step whose matched node is directly compared to the probe value.
    ///
    /// For a path subject this is the final step — unless any step along the
    /// path carries a positional predicate, which disqualifies the whole
    /// shape: an index scan cannot reproduce traversal order.
    pub fn target_step(&self, enclosing: &'a Step) -> Option<&'a Step> {
        match self {
            IndexPred::Context => Some(enclosing),
            IndexPred::Path(path) => {
                if path.steps.iter().any(Step::positional) {
                    return None;
                }
                path.steps.last()
            }
        }
    }

    /// The step carrying the element or attribute name that selects between
    /// a text and an element/attribute-rooted lookup.
    ///
    /// When the target is an explicit `child::text()` step, the name lives
    /// one step up: on the previous path step, or on the enclosing step for
    /// a single-step path.
    pub fn structural_name_step(&self, enclosing: &'a Step) -> Option<&'a Step> {
        let target = self.target_step(enclosing)?;
        match self {
            IndexPred::Context => Some(target),
            IndexPred::Path(path) => {
                if target.axis == Axis::Child && target.test.kind() == Some(NodeKind::Text) {
                    match path.steps.len() {
                        0 | 1 => Some(enclosing),
                        n => Some(&path.steps[n - 2]),
                    }
                } else {
                    Some(target)
                }
            }
        }
    }

    /// Rewrites the subject path so the original result set can be produced
    /// by walking upward from an index hit rooted at `new_root`.
    ///
    /// Attribute targets first re-narrow the hit with a self-axis step
    /// mirroring the final step's name test; intermediate steps are then
    /// replayed with inverted axes, and a final inverted step with an
    /// any-node test lands back on the original context.
    pub fn invert(&self, new_root: Expr) -> Expr {
        match self {
            IndexPred::Context => new_root,
            IndexPred::Path(path) => {
                let mut steps: SmallVec<[Step; 4]> = SmallVec::new();
                let last = path.steps.last().expect("classified paths are non-empty");
                if last.test.kind() == Some(NodeKind::Attribute) {
                    steps.push(Step::new(Axis::SelfAxis, last.test.clone()));
                }
                for s in (0..path.steps.len() - 1).rev() {
                    let step = &path.steps[s];
                    let axis = path.steps[s + 1].axis.invert();
                    steps.push(Step::with_preds(axis, step.test.clone(), step.preds.clone()));
                }
                steps.push(Step::new(path.steps[0].axis.invert(), NodeTest::AnyNode));
                Expr::Path(AxisPath::rooted(new_root, steps.into_vec()))
            }
        }
    }
}
