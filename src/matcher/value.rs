//! Individual matching on asserted literal values.

use crate::alignment::Alignment;
use crate::context::MatchContext;
use crate::entity::{EntityId, EntityType};
use crate::similarity::isub;

use super::{Candidates, Scorer, SupportsExtend, SupportsRematch, admissible};

/// Compares the data-property literals of two individuals.
///
/// The score is the best ISub similarity over all literal pairs; two equal
/// literals score 1.0 outright. Property URIs are not compared, since the
/// two sides rarely share a vocabulary.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueMatcher;

impl ValueMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Individuals on both sides that carry at least one value.
    fn valued(ctx: &MatchContext) -> Candidates {
        let targets: Vec<EntityId> = ctx
            .target()
            .entities_of(EntityType::Individual)
            .into_iter()
            .filter(|&t| ctx.target().values().has_values(t))
            .collect();
        let mut out = Candidates::new();
        for s in ctx.source().entities_of(EntityType::Individual) {
            if !ctx.source().values().has_values(s) {
                continue;
            }
            for &t in &targets {
                if admissible(ctx, s, t) {
                    out.insert(s, t);
                }
            }
        }
        out
    }
}

impl Scorer for ValueMatcher {
    fn score(&self, ctx: &MatchContext, source: EntityId, target: EntityId) -> f64 {
        let source_values = ctx.source().values();
        let target_values = ctx.target().values();
        let mut best: f64 = 0.0;
        for a in source_values.literals(source) {
            for b in target_values.literals(target) {
                if a == b {
                    return 1.0;
                }
                best = best.max(isub(a, b));
            }
        }
        best
    }

    fn name(&self) -> &str {
        "value"
    }

    fn supports(&self, kind: EntityType) -> bool {
        kind == EntityType::Individual
    }

    fn candidates(&self, ctx: &MatchContext, _kind: EntityType) -> Candidates {
        Self::valued(ctx)
    }
}

impl SupportsExtend for ValueMatcher {
    fn extension_candidates(
        &self,
        ctx: &MatchContext,
        _kind: EntityType,
        base: &Alignment,
    ) -> Candidates {
        let mut out = Self::valued(ctx);
        out.retain(|s, t| !base.contains_source(s) && !base.contains_target(t));
        out
    }
}

impl SupportsRematch for ValueMatcher {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::error::MatchError;
    use crate::matcher::MatchEngine;
    use crate::matcher::test_support::labelled;
    use crate::ontology::{EntitySnapshot, OntologySnapshot, PropertyValue};

    fn id(raw: u32) -> EntityId {
        EntityId::new(raw)
    }

    fn individual(id: u32, uri: &str, values: &[&str]) -> EntitySnapshot {
        let mut e = EntitySnapshot::new(id, format!("{uri}#i{id}"), EntityType::Individual);
        e.values = values
            .iter()
            .map(|v| PropertyValue {
                property: format!("{uri}#name"),
                value: v.to_string(),
            })
            .collect();
        e
    }

    fn drugs() -> MatchContext {
        let mut source = OntologySnapshot::new("http://src");
        source.entities.push(individual(1, "http://src", &["Aspirin", "N02BA01"]));
        source.entities.push(individual(2, "http://src", &["Paracetamol"]));
        source.entities.push(individual(3, "http://src", &[]));
        let mut target = OntologySnapshot::new("http://tgt");
        target.entities.push(individual(10, "http://tgt", &["N02BA01"]));
        target.entities.push(individual(11, "http://tgt", &["paracetamol tablet"]));
        MatchContext::from_snapshots(source, target, MatchConfig::default()).unwrap()
    }

    #[test]
    fn exact_literal_scores_one() {
        let ctx = drugs();
        assert_eq!(ValueMatcher.score(&ctx, id(1), id(10)), 1.0);
        let near = ValueMatcher.score(&ctx, id(2), id(11));
        assert!(near > 0.5 && near < 1.0);
    }

    #[test]
    fn only_valued_individuals_are_candidates() {
        let ctx = drugs();
        let c = ValueMatcher.candidates(&ctx, EntityType::Individual);
        assert_eq!(c.len(), 4);
        assert!(c.targets_of(id(3)).next().is_none());
    }

    #[test]
    fn classes_are_rejected() {
        let ctx = labelled(&[(1, "a")], &[(10, "a")]);
        let engine = MatchEngine::new(&MatchConfig::default()).unwrap();
        let err = engine
            .match_entities(&ctx, &ValueMatcher, EntityType::Class, 0.5)
            .unwrap_err();
        assert!(matches!(err, MatchError::UnsupportedEntityType { .. }));
    }
}
