//! Name-to-name string similarity.

use crate::context::MatchContext;
use crate::entity::EntityId;
use crate::similarity::StringMeasure;

use super::{Scorer, SupportsExtend, SupportsRematch};

/// Best weighted string similarity over all name pairs of two entities.
///
/// Each name pair scores `measure(a, b) · w_a · w_b` with corrected lexicon
/// weights. Candidates are the full type-filtered cross product, so in
/// practice this matcher runs in extend mode after the lexical stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringMatcher {
    measure: StringMeasure,
}

impl StringMatcher {
    pub fn new(measure: StringMeasure) -> Self {
        Self { measure }
    }

    pub fn measure(&self) -> StringMeasure {
        self.measure
    }
}

impl Scorer for StringMatcher {
    fn score(&self, ctx: &MatchContext, source: EntityId, target: EntityId) -> f64 {
        let language = ctx.config().language.as_deref();
        let source_lex = ctx.source().lexicon();
        let target_lex = ctx.target().lexicon();

        let mut best: f64 = 0.0;
        for a in source_lex.entries_in(source, language) {
            let wa = source_lex.corrected_weight(source, &a.name);
            if wa <= best {
                continue;
            }
            for b in target_lex.entries_in(target, language) {
                let wb = target_lex.corrected_weight(target, &b.name);
                let upper = wa * wb;
                if upper <= best {
                    continue;
                }
                best = best.max(self.measure.compare(&a.name, &b.name) * upper);
            }
        }
        best
    }

    fn name(&self) -> &str {
        match self.measure {
            StringMeasure::Isub => "string/isub",
            StringMeasure::Levenshtein => "string/levenshtein",
            StringMeasure::QGram => "string/qgram",
        }
    }
}

impl SupportsExtend for StringMatcher {}

impl SupportsRematch for StringMatcher {}
