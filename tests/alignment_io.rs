//! Alignment file round trips through the filesystem.

use ontomatch::alignment::io::{load, save};
use ontomatch::alignment::{Alignment, MappingStatus, RelationKind};
use ontomatch::config::MatchConfig;
use ontomatch::context::MatchContext;
use ontomatch::entity::{EntityId, EntityType};
use ontomatch::error::FormatError;
use ontomatch::ontology::{EntitySnapshot, OntologySnapshot};

fn id(raw: u32) -> EntityId {
    EntityId::new(raw)
}

fn ctx() -> MatchContext {
    let mut source = OntologySnapshot::new("http://example.org/mouse");
    let mut target = OntologySnapshot::new("http://example.org/human");
    for (n, name) in [(1, "Heart"), (2, "Lung"), (3, "Femur"), (4, "hasPart")] {
        let kind = if n == 4 { EntityType::ObjectProperty } else { EntityType::Class };
        source.entities.push(
            EntitySnapshot::new(n, format!("http://example.org/mouse#{name}"), kind).named(name),
        );
        target.entities.push(
            EntitySnapshot::new(n + 10, format!("http://example.org/human#{name}"), kind)
                .named(name),
        );
    }
    MatchContext::from_snapshots(source, target, MatchConfig::default()).unwrap()
}

fn sample(ctx: &MatchContext) -> Alignment {
    let mut a = ctx.new_alignment();
    a.add(id(1), id(11), 0.98765);
    a.add_full(id(2), id(12), 0.5, RelationKind::TargetSubsumesSource, MappingStatus::Correct);
    a.add_full(id(3), id(13), 0.25, RelationKind::Incompatible, MappingStatus::Incorrect);
    a.add_full(id(4), id(14), 1.0, RelationKind::Overlap, MappingStatus::Unknown);
    a
}

fn triples(a: &Alignment) -> Vec<(EntityId, EntityId, RelationKind, MappingStatus, f64)> {
    let mut out: Vec<_> = a
        .iter()
        .map(|m| (m.source, m.target, m.relation, m.status, m.similarity()))
        .collect();
    out.sort_by_key(|t| (t.0, t.1));
    out
}

fn assert_same(a: &Alignment, b: &Alignment) {
    let (ta, tb) = (triples(a), triples(b));
    assert_eq!(ta.len(), tb.len());
    for (x, y) in ta.iter().zip(&tb) {
        assert_eq!((x.0, x.1, x.2, x.3), (y.0, y.1, y.2, y.3));
        assert!((x.4 - y.4).abs() < 1e-4);
    }
}

#[test]
fn tsv_round_trip() {
    let ctx = ctx();
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("out.tsv");
    let a = sample(&ctx);
    save(&a, &ctx, &path).unwrap();
    let b = load(&ctx, &path).unwrap();
    assert_same(&a, &b);
    assert_eq!(b.similarity(id(1), id(11)), 0.9877);
}

#[test]
fn rdf_round_trip() {
    let ctx = ctx();
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("out.rdf");
    let a = sample(&ctx);
    save(&a, &ctx, &path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("<Alignment>"));
    assert!(text.contains("http://example.org/human#Heart"));
    let b = load(&ctx, &path).unwrap();
    assert_same(&a, &b);
}

#[test]
fn convert_between_formats() {
    let ctx = ctx();
    let dir = tempfile::TempDir::new().unwrap();
    let tsv = dir.path().join("a.tsv");
    let xml = dir.path().join("a.xml");
    let back = dir.path().join("b.tsv");

    let a = sample(&ctx);
    save(&a, &ctx, &tsv).unwrap();
    save(&load(&ctx, &tsv).unwrap(), &ctx, &xml).unwrap();
    save(&load(&ctx, &xml).unwrap(), &ctx, &back).unwrap();
    assert_same(&a, &load(&ctx, &back).unwrap());
}

#[test]
fn unknown_extension_and_missing_file() {
    let ctx = ctx();
    let dir = tempfile::TempDir::new().unwrap();
    let err = save(&sample(&ctx), &ctx, &dir.path().join("out.csv")).unwrap_err();
    assert!(matches!(err, FormatError::UnrecognizedExtension { .. }));

    let err = load(&ctx, &dir.path().join("missing.tsv")).unwrap_err();
    assert!(matches!(err, FormatError::Io { .. }));
}

#[test]
fn foreign_tsv_is_rejected() {
    let ctx = ctx();
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("foreign.tsv");
    std::fs::write(&path, "a\tb\tc\n").unwrap();
    assert!(matches!(
        load(&ctx, &path).unwrap_err(),
        FormatError::UnrecognizedFormat { .. }
    ));
}
