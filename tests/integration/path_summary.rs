#![allow(clippy::all)]

//! End-to-end path summary construction, persistence, and introspection.

use xylem::path::{PathSummary, SummaryOptions, ValueKind};
use xylem::types::{NameId, NodeKind, Result};

const A: NameId = NameId(1);
const B: NameId = NameId(2);
const LANG: NameId = NameId(3);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Feeds `<a><b lang="..">1</b><b lang="..">2</b>...</a>` with ten rounds of
/// the values 1, 2, 3 under `b` and a three-way language attribute.
fn build() -> PathSummary {
    let mut summary = PathSummary::new(SummaryOptions::default());
    summary.index(NameId(0), NodeKind::Document, 0, None);
    summary.index(A, NodeKind::Element, 1, None);
    let langs = ["en", "de", "fr"];
    for round in 0..10usize {
        for value in 1..=3usize {
            summary.index(B, NodeKind::Element, 2, None);
            summary.index(LANG, NodeKind::Attribute, 3, Some(langs[(round + value) % 3]));
            summary.index(NameId(0), NodeKind::Text, 3, Some(&value.to_string()));
        }
    }
    summary
}

#[test]
fn repeated_values_aggregate_into_one_path() {
    init_tracing();
    let summary = build();
    // doc, a, b, @lang, text: five distinct paths
    assert_eq!(summary.len(), 5);

    let b = summary.desc(B, NodeKind::Element);
    assert_eq!(b.len(), 1);
    assert_eq!(summary.node(b[0]).stats.count, 30);

    let text = summary.descendants(&b, false)
        .into_iter()
        .find(|&r| summary.node(r).kind == NodeKind::Text)
        .expect("text path under b");
    let stats = &summary.node(text).stats;
    assert_eq!(stats.count, 30);
    assert_eq!(stats.kind(), ValueKind::Integer);
    assert_eq!(stats.min, 1.0);
    assert_eq!(stats.max, 3.0);
}

#[test]
fn attribute_values_build_a_category_histogram() {
    let summary = build();
    let lang = summary.desc(LANG, NodeKind::Attribute);
    assert_eq!(lang.len(), 1);
    let stats = &summary.node(lang[0]).stats;
    assert_eq!(stats.kind(), ValueKind::Category);
    let cats = stats.categories().expect("bounded histogram");
    assert_eq!(cats.len(), 3);
    assert_eq!(cats.iter().map(|(_, n)| n as u64).sum::<u64>(), 30);
}

#[test]
fn name_stats_prove_leafness() {
    let summary = build();
    let b = summary.stats_for(B, NodeKind::Element).expect("b occurred");
    assert_eq!(b.count, 30);
    assert!(b.leaf, "b holds only text and attribute children");
    let a = summary.stats_for(A, NodeKind::Element).expect("a occurred");
    assert!(!a.leaf);
    assert!(summary.stats_for(NameId(42), NodeKind::Element).is_none());
}

#[test]
fn summary_survives_a_disk_roundtrip() -> Result<()> {
    init_tracing();
    let summary = build();
    let mut buf = Vec::new();
    summary.write(&mut buf);

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("paths.bin");
    std::fs::write(&path, &buf)?;
    let bytes = std::fs::read(&path)?;
    let back = PathSummary::read(&bytes, SummaryOptions::default())?;

    assert_eq!(back.len(), summary.len());
    let lang = back.desc(LANG, NodeKind::Attribute);
    let stats = &back.node(lang[0]).stats;
    assert_eq!(stats.kind(), ValueKind::Category);
    assert_eq!(stats.categories().unwrap().len(), 3);
    let b = back.stats_for(B, NodeKind::Element).unwrap();
    assert_eq!(b.count, 30);
    assert!(b.leaf);
    Ok(())
}

#[test]
fn corrupted_blob_fails_loudly() {
    let summary = build();
    let mut buf = Vec::new();
    summary.write(&mut buf);
    buf.truncate(buf.len() / 2);
    assert!(PathSummary::read(&buf, SummaryOptions::default()).is_err());
}

#[test]
fn render_shows_counts_per_path() {
    let summary = build();
    let rendered = summary.render(&|name, kind| match kind {
        NodeKind::Document => "doc()".into(),
        NodeKind::Text => "text()".into(),
        NodeKind::Attribute => format!("@{name}"),
        _ => format!("e{name}"),
    });
    assert!(rendered.contains("e2: 30x"));
    assert!(rendered.contains("@3: 30x, category"));
    assert!(rendered.contains("text(): 30x, integer [1..3]"));
}
