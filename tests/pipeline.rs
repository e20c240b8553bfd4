//! End-to-end matching tests.
//!
//! These run the engine stages and the full pipeline on small hand-built
//! knowledge bases and check the alignments they produce.

use ontomatch::alignment::RelationKind;
use ontomatch::config::MatchConfig;
use ontomatch::context::MatchContext;
use ontomatch::entity::{EntityId, EntityType};
use ontomatch::matcher::{LexicalMatcher, MatchEngine, StringMatcher};
use ontomatch::ontology::{EntitySnapshot, OntologySnapshot};
use ontomatch::pipeline::{Pipeline, Stage};
use ontomatch::selection::{SelectionType, select};
use ontomatch::similarity::isub;

fn id(raw: u32) -> EntityId {
    EntityId::new(raw)
}

fn snapshot(uri: &str, rows: &[(u32, &str)]) -> OntologySnapshot {
    let mut snap = OntologySnapshot::new(uri);
    for &(n, label) in rows {
        snap.entities
            .push(EntitySnapshot::new(n, format!("{uri}#e{n}"), EntityType::Class).named(label));
    }
    snap
}

fn toy() -> MatchContext {
    MatchContext::from_snapshots(
        snapshot("http://example.org/src", &[(1, "Heart"), (2, "Lung")]),
        snapshot("http://example.org/tgt", &[(10, "Cardiac Organ"), (11, "Lung")]),
        MatchConfig::default(),
    )
    .unwrap()
}

fn engine() -> MatchEngine {
    MatchEngine::new(&MatchConfig::default()).unwrap()
}

#[test]
fn toy_scenario_stage_by_stage() {
    let ctx = toy();
    let engine = engine();

    let mut running = engine
        .match_entities(&ctx, &LexicalMatcher, EntityType::Class, 0.5)
        .unwrap();
    assert_eq!(running.len(), 1);
    let lung = running.get(id(2), id(11)).unwrap();
    assert_eq!(lung.similarity(), 1.0);
    assert_eq!(lung.relation, RelationKind::Equivalence);

    // "heart" and "cardiac organ" share no substring longer than two
    // characters, so the string stage has nothing to add at 0.3.
    assert_eq!(isub("heart", "cardiac organ"), 0.0);
    let extra = engine
        .extend(&ctx, &StringMatcher::default(), &running, EntityType::Class, 0.3)
        .unwrap();
    assert!(extra.is_empty());
    running.add_all_one_to_one(&extra);

    let selected = select(&running, SelectionType::StrictOneToOne, 0.5);
    let pairs: Vec<_> = selected.iter().map(|m| (m.source, m.target)).collect();
    assert_eq!(pairs, vec![(id(2), id(11))]);
}

#[test]
fn toy_scenario_through_the_pipeline() {
    let ctx = toy();
    let outcome = Pipeline::from_config(ctx.config()).unwrap().run(&ctx).unwrap();

    assert_eq!(outcome.selection, SelectionType::StrictOneToOne);
    assert_eq!(outcome.alignment.len(), 1);
    assert_eq!(outcome.alignment.similarity(id(2), id(11)), 1.0);

    let stages: Vec<Stage> = outcome.reports.iter().map(|r| r.stage).collect();
    assert_eq!(
        stages,
        vec![Stage::Lexical, Stage::Word, Stage::String, Stage::Selection, Stage::Repair]
    );
    assert_eq!(outcome.reports[0].produced, 1);
    assert_eq!(outcome.reports[0].gain, 1.0);
}

#[test]
fn engine_output_does_not_depend_on_threads() {
    let labels: Vec<(u32, String)> = (1..=60).map(|i| (i, format!("organ part {i}"))).collect();
    let others: Vec<(u32, String)> = (101..=160).map(|i| (i, format!("organ part {}", i - 97))).collect();
    fn rows(v: &[(u32, String)]) -> Vec<(u32, &str)> {
        v.iter().map(|(i, s)| (*i, s.as_str())).collect::<Vec<_>>()
    }
    let ctx = MatchContext::from_snapshots(
        snapshot("http://a", &rows(&labels)),
        snapshot("http://b", &rows(&others)),
        MatchConfig::default(),
    )
    .unwrap();

    let run = |threads: usize, batch_size: usize| {
        let engine = MatchEngine::new(&MatchConfig {
            threads: Some(threads),
            batch_size,
            ..Default::default()
        })
        .unwrap();
        engine
            .match_entities(&ctx, &StringMatcher::default(), EntityType::Class, 0.8)
            .unwrap()
            .iter()
            .map(|m| (m.source, m.target, m.similarity()))
            .collect::<Vec<_>>()
    };

    let reference = run(1, 10_000);
    assert!(!reference.is_empty());
    for _ in 0..3 {
        assert_eq!(run(4, 16), reference);
    }
}

#[test]
fn hierarchy_lets_structure_recover_a_renamed_class() {
    // Source: Organ ⊐ {Heart, Kidney}. Target: Organ ⊐ {Heart, Ren}.
    let side = |uri: &str, base: u32, kidney: &str| {
        let mut snap = OntologySnapshot::new(uri);
        snap.entities.push(
            EntitySnapshot::new(base, format!("{uri}#Organ"), EntityType::Class).named("organ"),
        );
        snap.entities.push(
            EntitySnapshot::new(base + 1, format!("{uri}#Heart"), EntityType::Class)
                .named("heart")
                .child_of(base),
        );
        snap.entities.push(
            EntitySnapshot::new(base + 2, format!("{uri}#K"), EntityType::Class)
                .named(kidney)
                .child_of(base),
        );
        snap
    };
    let config = MatchConfig {
        structural_threshold: 0.3,
        threshold: 0.3,
        ..Default::default()
    };
    let ctx = MatchContext::from_snapshots(
        side("http://src", 1, "kidney"),
        side("http://tgt", 10, "ren"),
        config,
    )
    .unwrap();

    let outcome = Pipeline::from_config(ctx.config()).unwrap().run(&ctx).unwrap();
    assert!(outcome.alignment.contains(id(1), id(10)));
    assert!(outcome.alignment.contains(id(2), id(11)));
    assert!(outcome.alignment.contains(id(3), id(12)));
    let structural = outcome
        .reports
        .iter()
        .find(|r| r.stage == Stage::Structural)
        .unwrap();
    assert_eq!(structural.merged, 1);
}
