//! The index planner: classifies candidate predicates, estimates access
//! costs, and builds the rewritten index-scan expression.
//!
//! Planning moves through *classify* and *plan*; both reject by returning
//! `None`, after which the original, unindexed expression remains the valid
//! evaluation plan. Rejection is never an error: whenever eligibility cannot
//! be proven, the safe unrewritten path wins.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::index::{costs::IndexCosts, pred::IndexPred, IndexType};
use crate::query::ast::{Atom, Axis, DynExpr, Expr, IndexAccess, NodeTest, Probe, Step};
use crate::storage::DocStore;
use crate::types::NodeKind;

/// Global planner configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerOptions {
    /// Forces index use even when cost estimation finds it unprofitable or
    /// cannot produce an estimate at all, e.g. on freshly created databases
    /// without warm statistics.
    pub enforce_index: bool,
}

/// Outcome of a successful rewrite.
#[derive(Clone, Debug)]
pub struct IndexPlan {
    /// The rewritten access expression: the index scan wrapped in the
    /// inverted path leading back to the original context.
    pub expr: Expr,
    /// Combined access cost. [`IndexCosts::ZERO`] proves an empty result.
    pub costs: IndexCosts,
    /// Human-readable rationale for query-plan diagnostics.
    pub note: String,
}

/// Classification and planning state for one candidate predicate.
pub struct IndexInfo<'a> {
    store: Option<&'a dyn DocStore>,
    opts: &'a PlannerOptions,
    /// The step whose predicate list holds the candidate comparison.
    enclosing: &'a Step,
    pred: Option<IndexPred<'a>>,
    resolved: Option<Resolved>,
}

/// Facts established by a successful classification.
struct Resolved {
    index_type: IndexType,
    /// Structural-name re-filter derived from the name step, if it has one.
    name_test: Option<NodeTest>,
    /// Whether the re-filter is applied inside the access itself (as opposed
    /// to being replayed by the inverted path).
    attach_name: bool,
    /// True when the filtered access already yields nodes at the level of
    /// the enclosing context, so no inverted path is needed.
    hit_at_context: bool,
}

impl<'a> IndexInfo<'a> {
    /// Starts planning against an optionally known document.
    ///
    /// `store` is `None` when the document is not known at compile time; in
    /// that case only enforced planning can succeed.
    pub fn new(
        store: Option<&'a dyn DocStore>,
        opts: &'a PlannerOptions,
        enclosing: &'a Step,
    ) -> Self {
        Self {
            store,
            opts,
            enclosing,
            pred: None,
            resolved: None,
        }
    }

    /// True when index use is globally enforced.
    pub fn enforce(&self) -> bool {
        self.opts.enforce_index
    }

    /// Decides whether `subject` is eligible for an index rewrite and
    /// resolves the concrete index type, honoring a caller-requested type.
    /// Returns `None` when no rewrite is possible.
    pub fn classify(
        &mut self,
        subject: &'a Expr,
        requested: Option<IndexType>,
    ) -> Option<IndexType> {
        let pred = IndexPred::get(subject)?;
        let target = pred.target_step(self.enclosing)?;

        let index_type = match target.test.kind() {
            Some(NodeKind::Text) => IndexType::Text,
            Some(NodeKind::Attribute) => {
                if requested == Some(IndexType::Token) {
                    IndexType::Token
                } else {
                    IndexType::Attribute
                }
            }
            Some(NodeKind::Element) => {
                // an element compares through its text content, which only
                // equals a single index entry if the element is always a leaf
                if !self.leaf_element(target) {
                    debug!("element target is not a proven leaf, skipping index");
                    return None;
                }
                IndexType::Text
            }
            _ => return None,
        };
        if requested.is_some_and(|r| r != index_type) {
            return None;
        }

        let name_step = pred.structural_name_step(self.enclosing)?;
        if let Some(store) = self.store {
            if !store.index_exists(index_type) {
                debug!(%index_type, "index does not exist, skipping rewrite");
                return None;
            }
            if let Some(name) = name_step.test.name() {
                if !store.index_contains_name(index_type, name) {
                    debug!(%index_type, %name, "name absent from index, skipping rewrite");
                    return None;
                }
            }
        }

        let name_test = match &name_step.test {
            test @ NodeTest::Name { .. } => Some(test.clone()),
            _ => None,
        };
        let attach_name = attach_name(&pred, target);
        let hit_at_context = attach_name
            && name_test.is_some()
            && matches!(&pred, IndexPred::Path(path) if path.steps.len() == 1
                && target.axis == Axis::Child
                && target.test.kind() == Some(NodeKind::Text));
        self.pred = Some(pred);
        self.resolved = Some(Resolved {
            index_type,
            name_test,
            attach_name,
            hit_at_context,
        });
        Some(index_type)
    }

    /// True iff the target names an element whose every occurrence has only
    /// text children, provable from the summary of an up-to-date,
    /// namespace-free document.
    fn leaf_element(&self, target: &Step) -> bool {
        let Some(store) = self.store else {
            return false;
        };
        let meta = store.meta();
        if !meta.uptodate || !meta.ns_free {
            return false;
        }
        let Some(name) = target.test.name() else {
            return false;
        };
        store
            .summary()
            .stats_for(name, NodeKind::Element)
            .is_some_and(|stats| stats.leaf)
    }

    /// Builds the rewritten access plan for a classified predicate, or
    /// `None` when the probe disqualifies the rewrite.
    pub fn plan(
        &mut self,
        probe: Option<&Expr>,
        index_type: Option<IndexType>,
        trim: bool,
    ) -> Option<IndexPlan> {
        let probe = probe?;
        let index_type = index_type?;
        let resolved = self.resolved.as_ref()?;
        if resolved.index_type != index_type {
            return None;
        }
        if self.store.is_none() && !self.opts.enforce_index {
            debug!("document unknown and index use not enforced, skipping rewrite");
            return None;
        }

        let (probe, costs, size) = match probe {
            Expr::Literal(atoms) => self.plan_const(atoms, index_type, trim, resolved)?,
            Expr::Dyn(dynamic) => self.plan_dyn(dynamic)?,
            _ => return None,
        };

        let desc = match &probe {
            Probe::Tokens(tokens) => tokens
                .iter()
                .map(|t| format!("\"{t}\""))
                .collect::<Vec<_>>()
                .join(", "),
            Probe::Dyn(dynamic) => dynamic.label.clone(),
        };
        let note = format!("applying {index_type} index for {desc}");
        debug!(%index_type, %costs, probe = %desc, "rewriting predicate to index access");

        let access = Expr::IndexAccess(Box::new(IndexAccess {
            index_type,
            probe,
            name_test: resolved
                .attach_name
                .then(|| resolved.name_test.clone())
                .flatten(),
            size,
        }));
        let expr = if resolved.hit_at_context {
            access
        } else {
            self.pred
                .as_ref()
                .expect("classification stores the predicate shape")
                .invert(access)
        };
        Some(IndexPlan { expr, costs, note })
    }

    /// Costs a literal probe sequence. Every item must be string-or-untyped;
    /// each distinct string is costed once, with repeats served from the
    /// call-local memo.
    fn plan_const(
        &self,
        atoms: &[Atom],
        index_type: IndexType,
        trim: bool,
        resolved: &Resolved,
    ) -> Option<(Probe, IndexCosts, Option<u64>)> {
        let mut tokens: Vec<String> = Vec::new();
        let mut memo: FxHashMap<String, IndexCosts> = FxHashMap::default();
        let mut combined = IndexCosts::ZERO;
        for atom in atoms {
            if !atom.ty.is_string_or_untyped() {
                debug!("mixed-type probe sequence, skipping rewrite");
                return None;
            }
            let token = if trim {
                atom.value.trim()
            } else {
                atom.value.as_str()
            };
            if token.is_empty() {
                return None;
            }
            if let Some(store) = self.store {
                // token indexes store individual tokens, never whole values,
                // so the stored-value length cap does not apply to them
                if index_type != IndexType::Token && token.len() > store.meta().max_index_len {
                    debug!(len = token.len(), "probe string exceeds indexed length");
                    return None;
                }
            }
            if memo.contains_key(token) {
                continue;
            }
            let cost = match self.store {
                Some(store) => store.costs(index_type, token)?,
                None => IndexCosts::EnforceStatic,
            };
            trace!(token, %cost, "probe cost");
            memo.insert(token.to_string(), cost);
            tokens.push(token.to_string());
            combined = IndexCosts::combine(combined, cost);
        }
        if self.store.is_none() {
            combined = IndexCosts::EnforceStatic;
        } else if !self.opts.enforce_index {
            let total = self.store?.meta().size;
            if combined.too_expensive(total) {
                debug!(%combined, total, "index access dearer than a full scan");
                return None;
            }
        }

        let filtered = resolved.attach_name && resolved.name_test.is_some();
        let size = if !filtered && (index_type != IndexType::Token || tokens.len() <= 1) {
            combined.results()
        } else {
            None
        };
        Some((Probe::Tokens(tokens), combined, size))
    }

    /// Costs a run-time probe. Rewriting is only sound for deterministic,
    /// context-free expressions of string-or-untyped type.
    fn plan_dyn(&self, dynamic: &DynExpr) -> Option<(Probe, IndexCosts, Option<u64>)> {
        if !dynamic.returns.is_string_or_untyped() {
            return None;
        }
        if dynamic.uses_context || !dynamic.deterministic {
            debug!("run-time probe depends on context or is non-deterministic");
            return None;
        }
        let costs = match self.store {
            Some(store) if !self.opts.enforce_index => {
                IndexCosts::Results((store.meta().size / 10).max(1))
            }
            _ => IndexCosts::EnforceDynamic,
        };
        Some((Probe::Dyn(dynamic.clone()), costs, None))
    }
}

/// Decides whether the structural-name re-filter runs inside the access.
/// A name on an intermediate path step is replayed by the inverted path
/// instead.
fn attach_name(pred: &IndexPred<'_>, target: &Step) -> bool {
    match pred {
        IndexPred::Context => true,
        IndexPred::Path(path) => {
            !(target.axis == Axis::Child
                && target.test.kind() == Some(NodeKind::Text)
                && path.steps.len() > 1)
        }
    }
}
