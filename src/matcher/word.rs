//! Word-level matching weighted by evidence content.
//!
//! Names are split into content words. Each word carries an evidence
//! content `ec(w) = ln(N / freq(w)) / ln(N)`, where `N` is the number of
//! named entities in both knowledge bases and `freq(w)` the number of those
//! entities using the word, so rare words count for more than common ones.
//! Word sets are compared with an EC-weighted Jaccard index.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::alignment::Alignment;
use crate::context::MatchContext;
use crate::entity::{EntityId, EntityType};
use crate::ontology::Ontology;
use crate::similarity::words;

use super::{Candidates, Scorer, SupportsExtend, SupportsRematch, admissible};

/// How name-level and entity-level word similarity are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WordStrategy {
    /// All words of all names of each entity as one bag.
    ByEntity,
    /// Best single name pair.
    ByName,
    #[default]
    Average,
    Maximum,
    Minimum,
}

/// EC-weighted word overlap.
#[derive(Debug, Clone)]
pub struct WordMatcher {
    strategy: WordStrategy,
    language: Option<String>,
    entity_words: HashMap<EntityId, BTreeSet<String>>,
    ec: HashMap<String, f64>,
    by_word: HashMap<String, BTreeSet<EntityId>>,
}

fn name_words<'a>(onto: &'a Ontology, id: EntityId, language: Option<&'a str>) -> BTreeSet<String> {
    onto.lexicon()
        .entries_in(id, language)
        .flat_map(|e| words(&e.name))
        .map(str::to_string)
        .collect()
}

impl WordMatcher {
    /// Index the words of every entity in both knowledge bases.
    pub fn new(ctx: &MatchContext, strategy: WordStrategy) -> Self {
        let language = ctx.config().language.clone();
        let lang = language.as_deref();
        let mut entity_words = HashMap::new();
        let mut freq: HashMap<String, usize> = HashMap::new();
        let mut by_word: HashMap<String, BTreeSet<EntityId>> = HashMap::new();

        for (onto, is_target) in [(ctx.source(), false), (ctx.target(), true)] {
            for id in onto.entity_ids() {
                let ws = name_words(onto, id, lang);
                if ws.is_empty() {
                    continue;
                }
                for w in &ws {
                    *freq.entry(w.clone()).or_insert(0) += 1;
                    if is_target {
                        by_word.entry(w.clone()).or_default().insert(id);
                    }
                }
                entity_words.insert(id, ws);
            }
        }

        let n = entity_words.len() as f64;
        let ec = freq
            .into_iter()
            .map(|(w, f)| {
                let weight = if n <= 1.0 {
                    1.0
                } else {
                    (n / f as f64).ln() / n.ln()
                };
                (w, weight)
            })
            .collect();

        Self {
            strategy,
            language,
            entity_words,
            ec,
            by_word,
        }
    }

    pub fn strategy(&self) -> WordStrategy {
        self.strategy
    }

    /// Evidence content of a word, 0 for words never seen.
    pub fn evidence(&self, word: &str) -> f64 {
        self.ec.get(word).copied().unwrap_or(0.0)
    }

    fn jaccard<'a>(
        &self,
        a: impl IntoIterator<Item = &'a str>,
        b: impl IntoIterator<Item = &'a str>,
    ) -> f64 {
        let a: BTreeSet<&str> = a.into_iter().collect();
        let b: BTreeSet<&str> = b.into_iter().collect();
        let shared: f64 = a.intersection(&b).map(|w| self.evidence(w)).sum();
        let total: f64 = a.union(&b).map(|w| self.evidence(w)).sum();
        if total > 0.0 { shared / total } else { 0.0 }
    }

    fn by_entity(&self, source: EntityId, target: EntityId) -> f64 {
        match (self.entity_words.get(&source), self.entity_words.get(&target)) {
            (Some(a), Some(b)) => {
                self.jaccard(a.iter().map(String::as_str), b.iter().map(String::as_str))
            }
            _ => 0.0,
        }
    }

    fn by_name(&self, ctx: &MatchContext, source: EntityId, target: EntityId) -> f64 {
        let language = self.language.as_deref();
        let source_lex = ctx.source().lexicon();
        let target_lex = ctx.target().lexicon();
        let mut best: f64 = 0.0;
        for a in source_lex.entries_in(source, language) {
            let wa = source_lex.corrected_weight(source, &a.name);
            for b in target_lex.entries_in(target, language) {
                let wb = target_lex.corrected_weight(target, &b.name);
                let sim = self.jaccard(words(&a.name), words(&b.name));
                best = best.max(sim * wa * wb);
            }
        }
        best
    }

    fn join(&self, ctx: &MatchContext, kind: EntityType, base: Option<&Alignment>) -> Candidates {
        let mut out = Candidates::new();
        for s in ctx.source().entities_of(kind) {
            if base.is_some_and(|a| a.contains_source(s)) {
                continue;
            }
            let Some(ws) = self.entity_words.get(&s) else {
                continue;
            };
            for w in ws {
                for &t in self.by_word.get(w).into_iter().flatten() {
                    if ctx.target().type_of(t) != Some(kind) || !admissible(ctx, s, t) {
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

impl Scorer for WordMatcher {
    fn score(&self, ctx: &MatchContext, source: EntityId, target: EntityId) -> f64 {
        match self.strategy {
            WordStrategy::ByEntity => self.by_entity(source, target),
            WordStrategy::ByName => self.by_name(ctx, source, target),
            WordStrategy::Average => {
                (self.by_entity(source, target) + self.by_name(ctx, source, target)) / 2.0
            }
            WordStrategy::Maximum => self
                .by_entity(source, target)
                .max(self.by_name(ctx, source, target)),
            WordStrategy::Minimum => self
                .by_entity(source, target)
                .min(self.by_name(ctx, source, target)),
        }
    }

    fn name(&self) -> &str {
        "word"
    }

    fn candidates(&self, ctx: &MatchContext, kind: EntityType) -> Candidates {
        self.join(ctx, kind, None)
    }
}

impl SupportsExtend for WordMatcher {
    fn extension_candidates(
        &self,
        ctx: &MatchContext,
        kind: EntityType,
        base: &Alignment,
    ) -> Candidates {
        self.join(ctx, kind, Some(base))
    }
}

impl SupportsRematch for WordMatcher {}
