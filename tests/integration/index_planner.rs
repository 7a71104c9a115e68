#![allow(clippy::all)]

//! End-to-end index planning scenarios against an in-memory store.

use xylem::index::{IndexCosts, IndexInfo, IndexType, PlannerOptions};
use xylem::path::{PathSummary, SummaryOptions};
use xylem::query::{Atom, AtomType, Axis, AxisPath, DynExpr, Expr, NodeTest, Probe, Step};
use xylem::storage::{DocStore, MemStore};
use xylem::types::{NameId, NodeKind};

const X: NameId = NameId(1);
const Y: NameId = NameId(2);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// doc -> x* -> (@y, text)
fn summary() -> PathSummary {
    let mut summary = PathSummary::new(SummaryOptions::default());
    summary.index(NameId(0), NodeKind::Document, 0, None);
    for _ in 0..4 {
        summary.index(X, NodeKind::Element, 1, None);
        summary.index(Y, NodeKind::Attribute, 2, Some("z"));
        summary.index(NameId(0), NodeKind::Text, 2, Some("foo"));
    }
    summary
}

fn x_step() -> Step {
    Step::new(
        Axis::Descendant,
        NodeTest::Name {
            name: X,
            kind: NodeKind::Element,
        },
    )
}

fn attr_path() -> Expr {
    Expr::Path(AxisPath::relative(vec![Step::new(
        Axis::Attribute,
        NodeTest::Name {
            name: Y,
            kind: NodeKind::Attribute,
        },
    )]))
}

fn strings(values: &[&str]) -> Expr {
    Expr::Literal(values.iter().map(|v| Atom::str(*v)).collect())
}

#[test]
fn missing_attribute_index_leaves_the_query_unrewritten() {
    init_tracing();
    // //x[@y = 'z'] against a document whose attribute index was never built
    let store = MemStore::new()
        .with_size(1000)
        .with_summary(summary())
        .with_index(IndexType::Text)
        .with_name(IndexType::Text, X);
    let opts = PlannerOptions::default();
    let enclosing = x_step();
    let subject = attr_path();
    let mut info = IndexInfo::new(Some(&store), &opts, &enclosing);
    assert_eq!(info.classify(&subject, None), None);
}

#[test]
fn attribute_predicate_rewrites_once_the_index_exists() {
    init_tracing();
    let store = MemStore::new()
        .with_size(1000)
        .with_summary(summary())
        .with_index(IndexType::Attribute)
        .with_name(IndexType::Attribute, Y)
        .with_cost(IndexType::Attribute, "z", 4);
    let opts = PlannerOptions::default();
    let enclosing = x_step();
    let subject = attr_path();
    let mut info = IndexInfo::new(Some(&store), &opts, &enclosing);
    let it = info.classify(&subject, None);
    assert_eq!(it, Some(IndexType::Attribute));
    let plan = info.plan(Some(&strings(&["z"])), it, false).expect("rewrite");
    assert_eq!(plan.costs, IndexCosts::of(4));
    assert_eq!(plan.note, "applying attribute index for \"z\"");
    // index hits are re-narrowed to @y and walked back up to the context
    match &plan.expr {
        Expr::Path(path) => {
            assert!(matches!(path.root.as_deref(), Some(Expr::IndexAccess(_))));
            assert_eq!(path.steps.len(), 2);
            assert_eq!(path.steps[0].axis, Axis::SelfAxis);
            assert_eq!(path.steps[1].axis, Axis::Parent);
        }
        other => panic!("expected inverted path, got {other:?}"),
    }
}

#[test]
fn constant_probe_cardinality_is_the_sum_of_per_string_costs() {
    // 1000-node document, "foo" occurs 3 times and "bar" 5 times,
    // no structural-name filter: the estimate is exactly 8
    let store = MemStore::new()
        .with_size(1000)
        .with_summary(summary())
        .with_index(IndexType::Text)
        .with_cost(IndexType::Text, "foo", 3)
        .with_cost(IndexType::Text, "bar", 5);
    let opts = PlannerOptions::default();
    let enclosing = Step::new(Axis::Child, NodeTest::Kind(NodeKind::Text));
    let context = Expr::ContextItem;
    let mut info = IndexInfo::new(Some(&store), &opts, &enclosing);
    let it = info.classify(&context, None);
    assert_eq!(it, Some(IndexType::Text));
    let plan = info
        .plan(Some(&strings(&["foo", "bar"])), it, false)
        .expect("rewrite");
    assert_eq!(plan.costs, IndexCosts::of(8));
    match &plan.expr {
        Expr::IndexAccess(access) => {
            assert_eq!(access.size, Some(8));
            match &access.probe {
                Probe::Tokens(tokens) => assert_eq!(tokens, &["foo", "bar"]),
                other => panic!("expected tokens, got {other:?}"),
            }
        }
        other => panic!("expected bare access, got {other:?}"),
    }
}

#[test]
fn dynamic_probe_estimates_a_tenth_of_the_document() {
    let store = MemStore::new()
        .with_size(1000)
        .with_summary(summary())
        .with_index(IndexType::Text)
        .with_name(IndexType::Text, X);
    let opts = PlannerOptions::default();
    let enclosing = Step::new(Axis::Child, NodeTest::Kind(NodeKind::Text));
    let context = Expr::ContextItem;
    let mut info = IndexInfo::new(Some(&store), &opts, &enclosing);
    let it = info.classify(&context, None);
    let probe = Expr::Dyn(DynExpr::new("$needle", AtomType::Str));
    let plan = info.plan(Some(&probe), it, false).expect("rewrite");
    assert_eq!(plan.costs, IndexCosts::of(100));
}

#[test]
fn statistics_loaded_from_disk_still_drive_classification() {
    // persist the summary, reload it, and prove a leaf element through it
    let mut buf = Vec::new();
    summary().write(&mut buf);
    let reloaded = PathSummary::read(&buf, SummaryOptions::default()).unwrap();
    assert!(reloaded.stats_for(X, NodeKind::Element).unwrap().leaf);

    let store = MemStore::new()
        .with_size(1000)
        .with_summary(reloaded)
        .with_index(IndexType::Text)
        .with_name(IndexType::Text, X)
        .with_cost(IndexType::Text, "foo", 3);
    let opts = PlannerOptions::default();
    // x[. = 'foo']: element context, eligible because x is a proven leaf
    let enclosing = Step::new(
        Axis::Child,
        NodeTest::Name {
            name: X,
            kind: NodeKind::Element,
        },
    );
    let context = Expr::ContextItem;
    let mut info = IndexInfo::new(Some(&store), &opts, &enclosing);
    let it = info.classify(&context, None);
    assert_eq!(it, Some(IndexType::Text));
    let plan = info.plan(Some(&strings(&["foo"])), it, false).expect("rewrite");
    assert_eq!(plan.costs, IndexCosts::of(3));
    assert_eq!(store.meta().size, 1000);
}
