//! Exact name matching.
//!
//! Two entities match when they share a normalized name. The score of a
//! pair is the best over shared names of the lower of the two corrected
//! weights, so a label-to-label hit outranks a synonym-to-label hit.

use crate::alignment::Alignment;
use crate::context::MatchContext;
use crate::entity::{EntityId, EntityType};

use super::{Candidates, Scorer, SupportsExtend, SupportsRematch, admissible};

/// Hash-join on normalized names.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalMatcher;

impl LexicalMatcher {
    pub fn new() -> Self {
        Self
    }

    fn join(ctx: &MatchContext, kind: EntityType, base: Option<&Alignment>) -> Candidates {
        let language = ctx.config().language.as_deref();
        let source = ctx.source();
        let target = ctx.target();
        let mut out = Candidates::new();
        for s in source.entities_of(kind) {
            if base.is_some_and(|a| a.contains_source(s)) {
                continue;
            }
            for entry in source.lexicon().entries_in(s, language) {
                for t in target.lexicon().entities_named(&entry.name) {
                    if target.type_of(t) != Some(kind) || !admissible(ctx, s, t) {
                        continue;
                    }
                    if base.is_some_and(|a| a.contains_target(t)) {
                        continue;
                    }
                    out.insert(s, t);
                }
            }
        }
        out
    }
}

impl Scorer for LexicalMatcher {
    fn score(&self, ctx: &MatchContext, source: EntityId, target: EntityId) -> f64 {
        let language = ctx.config().language.as_deref();
        let source_lex = ctx.source().lexicon();
        let target_lex = ctx.target().lexicon();
        let mut best: f64 = 0.0;
        for entry in source_lex.entries_in(source, language) {
            let usable = target_lex
                .entries_in(target, language)
                .any(|e| e.name == entry.name);
            if !usable {
                continue;
            }
            let weight = source_lex
                .corrected_weight(source, &entry.name)
                .min(target_lex.corrected_weight(target, &entry.name));
            best = best.max(weight);
        }
        best
    }

    fn name(&self) -> &str {
        "lexical"
    }

    fn candidates(&self, ctx: &MatchContext, kind: EntityType) -> Candidates {
        Self::join(ctx, kind, None)
    }
}

impl SupportsExtend for LexicalMatcher {
    fn extension_candidates(
        &self,
        ctx: &MatchContext,
        kind: EntityType,
        base: &Alignment,
    ) -> Candidates {
        Self::join(ctx, kind, Some(base))
    }
}

impl SupportsRematch for LexicalMatcher {}
