//! Structural similarity propagation.
//!
//! A pair is as similar as its relatives are well matched in a reference
//! alignment. For ancestors (descendants are symmetric):
//!
//! ```text
//! parent_sim(s,t) = Σ_{i∈anc(s), j∈anc(t)} A.sim(i,j) / sqrt(d(s,i)·d(t,j))
//!                   ÷ (Σ_{i∈anc(s)} 0.5/d(s,i) + Σ_{j∈anc(t)} 0.5/d(t,j))
//! ```
//!
//! Relatives closer in the hierarchy weigh more, and the normalizer keeps
//! entities with many relatives from being favoured. The matcher both
//! rematches pairs of the reference and extends it with pairs among the
//! parents and children of already mapped pairs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::alignment::Alignment;
use crate::context::MatchContext;
use crate::entity::{EntityId, EntityType};

use super::{Candidates, Scorer, SupportsExtend, SupportsRematch, admissible};

/// Which relatives contribute to the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StructuralStrategy {
    Ancestors,
    Descendants,
    Minimum,
    Maximum,
    #[default]
    Average,
}

/// Neighbour similarity over a reference alignment.
#[derive(Debug, Clone, Copy)]
pub struct NeighborSimilarityMatcher<'a> {
    reference: &'a Alignment,
    strategy: StructuralStrategy,
    depth: usize,
}

impl<'a> NeighborSimilarityMatcher<'a> {
    /// `depth` bounds how far up or down the hierarchy relatives are taken
    /// (1 = direct parents and children).
    pub fn new(reference: &'a Alignment, strategy: StructuralStrategy, depth: usize) -> Self {
        Self {
            reference,
            strategy,
            depth: depth.max(1),
        }
    }

    /// Distance-weighted similarity of two relative sets.
    fn relative_sim(&self, source_rel: &[(EntityId, usize)], target_rel: &[(EntityId, usize)]) -> f64 {
        if source_rel.is_empty() || target_rel.is_empty() {
            return 0.0;
        }
        let target_dist: HashMap<EntityId, usize> = target_rel.iter().copied().collect();

        let mut total = 0.0;
        for &(i, di) in source_rel {
            for j in self.reference.source_mappings(i) {
                if let Some(&dj) = target_dist.get(&j) {
                    total += self.reference.similarity(i, j) / ((di * dj) as f64).sqrt();
                }
            }
        }
        let normalizer: f64 = source_rel
            .iter()
            .chain(target_rel)
            .map(|&(_, d)| 0.5 / d as f64)
            .sum();
        (total / normalizer).min(1.0)
    }

    /// Similarity from ancestors only.
    pub fn parent_sim(&self, ctx: &MatchContext, source: EntityId, target: EntityId) -> f64 {
        let h = ctx.hierarchy();
        self.relative_sim(
            &h.ancestors(source, Some(self.depth)),
            &h.ancestors(target, Some(self.depth)),
        )
    }

    /// Similarity from descendants only.
    pub fn child_sim(&self, ctx: &MatchContext, source: EntityId, target: EntityId) -> f64 {
        let h = ctx.hierarchy();
        self.relative_sim(
            &h.descendants(source, Some(self.depth)),
            &h.descendants(target, Some(self.depth)),
        )
    }
}

impl Scorer for NeighborSimilarityMatcher<'_> {
    fn score(&self, ctx: &MatchContext, source: EntityId, target: EntityId) -> f64 {
        match self.strategy {
            StructuralStrategy::Ancestors => self.parent_sim(ctx, source, target),
            StructuralStrategy::Descendants => self.child_sim(ctx, source, target),
            StructuralStrategy::Minimum => self
                .parent_sim(ctx, source, target)
                .min(self.child_sim(ctx, source, target)),
            StructuralStrategy::Maximum => self
                .parent_sim(ctx, source, target)
                .max(self.child_sim(ctx, source, target)),
            StructuralStrategy::Average => {
                (self.parent_sim(ctx, source, target) + self.child_sim(ctx, source, target)) / 2.0
            }
        }
    }

    fn name(&self) -> &str {
        "structural"
    }

    /// Only pairs related to the reference are worth scoring.
    fn candidates(&self, ctx: &MatchContext, kind: EntityType) -> Candidates {
        self.extension_candidates(ctx, kind, self.reference)
    }
}

impl SupportsExtend for NeighborSimilarityMatcher<'_> {
    /// Parents × parents and children × children of every mapped pair,
    /// leaving out entities `base` already maps.
    fn extension_candidates(
        &self,
        ctx: &MatchContext,
        kind: EntityType,
        base: &Alignment,
    ) -> Candidates {
        let h = ctx.hierarchy();
        let mut out = Candidates::new();
        let mut propose = |s: EntityId, t: EntityId| {
            let fits = ctx.source().type_of(s) == Some(kind)
                && ctx.target().type_of(t) == Some(kind)
                && !base.contains_source(s)
                && !base.contains_target(t)
                && admissible(ctx, s, t);
            if fits {
                out.insert(s, t);
            }
        };

        for m in self.reference {
            let (sp, tp) = (h.parents(m.source), h.parents(m.target));
            for &s in &sp {
                for &t in &tp {
                    propose(s, t);
                }
            }
            let (sc, tc) = (h.children(m.source), h.children(m.target));
            for &s in &sc {
                for &t in &tc {
                    propose(s, t);
                }
            }
        }
        out
    }
}

impl SupportsRematch for NeighborSimilarityMatcher<'_> {}
