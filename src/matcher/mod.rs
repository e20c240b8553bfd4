//! Parallel pairwise scoring.
//!
//! Every matcher is a [`Scorer`]: a side-effect-free function from a
//! `(source, target)` pair to a similarity, plus the candidate pairs it wants
//! scored. The [`MatchEngine`] fans candidate pairs out over a bounded rayon
//! pool in batches, then inserts the surviving pairs into a fresh
//! [`Alignment`] on the calling thread, in candidate order. Given the same
//! candidates the result is identical from run to run regardless of the
//! order in which batches finish.
//!
//! Three modes share the engine:
//!
//! - [`MatchEngine::match_entities`]: the scorer's own candidates for a kind.
//! - [`MatchEngine::extend`]: candidates among entities a base alignment
//!   has not mapped yet ([`SupportsExtend`]).
//! - [`MatchEngine::rematch`]: exactly the pairs of a base alignment, at
//!   threshold 0, keeping their relation and status ([`SupportsRematch`]).
//!
//! A scoring call that panics or returns a non-finite value is logged and
//! its pair dropped; the rest of the sweep carries on.

pub mod background;
pub mod lexical;
pub mod property;
pub mod string;
pub mod structural;
pub mod value;
pub mod word;

use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroUsize;
use std::panic::{AssertUnwindSafe, catch_unwind};

use rayon::prelude::*;

use crate::alignment::{Alignment, Mapping};
use crate::config::MatchConfig;
use crate::context::MatchContext;
use crate::entity::{EntityId, EntityType};
use crate::error::{MatchError, MatchResult};

pub use background::{BackgroundKnowledge, MediatingMatcher, SynonymTable};
pub use lexical::LexicalMatcher;
pub use property::PropertyMatcher;
pub use string::StringMatcher;
pub use structural::{NeighborSimilarityMatcher, StructuralStrategy};
pub use value::ValueMatcher;
pub use word::{WordMatcher, WordStrategy};

// ---------------------------------------------------------------------------
// Scorer and capabilities
// ---------------------------------------------------------------------------

/// A pairwise similarity function with its candidate generator.
///
/// `score` is called concurrently from the engine's worker threads and must
/// only read from `self` and the context.
pub trait Scorer: Sync {
    /// Similarity of a pair, in [0, 1].
    fn score(&self, ctx: &MatchContext, source: EntityId, target: EntityId) -> f64;

    /// Short name for logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether the scorer can handle entities of this kind.
    fn supports(&self, _kind: EntityType) -> bool {
        true
    }

    /// Pairs to score in match mode.
    fn candidates(&self, ctx: &MatchContext, kind: EntityType) -> Candidates {
        Candidates::for_kind(ctx, kind)
    }
}

/// Scorers that can propose pairs among entities a base alignment lacks.
pub trait SupportsExtend: Scorer {
    /// Pairs to score in extend mode. Neither entity may be mapped in `base`.
    fn extension_candidates(
        &self,
        ctx: &MatchContext,
        kind: EntityType,
        base: &Alignment,
    ) -> Candidates {
        Candidates::unmapped(ctx, kind, base)
    }
}

/// Scorers whose scores are meaningful for pairs found by another matcher.
pub trait SupportsRematch: Scorer {}

/// Wraps a plain function as a scorer over the type-filtered cross product.
pub struct ScoreFn<F> {
    name: String,
    score: F,
}

impl<F> ScoreFn<F>
where
    F: Fn(&MatchContext, EntityId, EntityId) -> f64 + Sync,
{
    pub fn new(name: impl Into<String>, score: F) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

impl<F> Scorer for ScoreFn<F>
where
    F: Fn(&MatchContext, EntityId, EntityId) -> f64 + Sync,
{
    fn score(&self, ctx: &MatchContext, source: EntityId, target: EntityId) -> f64 {
        (self.score)(ctx, source, target)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> SupportsExtend for ScoreFn<F> where F: Fn(&MatchContext, EntityId, EntityId) -> f64 + Sync
{}

impl<F> SupportsRematch for ScoreFn<F> where F: Fn(&MatchContext, EntityId, EntityId) -> f64 + Sync
{}

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// Ordered multi-map from source entity to candidate targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    pairs: BTreeMap<EntityId, BTreeSet<EntityId>>,
}

/// Whether a pair may be proposed at all under the run's settings.
///
/// Pairs whose entities share a URI are left out unless `match_same_uri`
/// is set.
pub fn admissible(ctx: &MatchContext, source: EntityId, target: EntityId) -> bool {
    if ctx.config().match_same_uri {
        return true;
    }
    match (ctx.source().uri_of(source), ctx.target().uri_of(target)) {
        (Some(a), Some(b)) => a != b,
        _ => true,
    }
}

fn speaks(ctx: &MatchContext, source: EntityId, target: EntityId) -> bool {
    match ctx.config().language.as_deref() {
        Some(lang) => {
            ctx.source().lexicon().has_language(source, lang)
                && ctx.target().lexicon().has_language(target, lang)
        }
        None => true,
    }
}

impl Candidates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pair. Returns `false` if it was already present.
    pub fn insert(&mut self, source: EntityId, target: EntityId) -> bool {
        self.pairs.entry(source).or_default().insert(target)
    }

    pub fn contains(&self, source: EntityId, target: EntityId) -> bool {
        self.pairs.get(&source).is_some_and(|ts| ts.contains(&target))
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in ascending `(source, target)` order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, EntityId)> + '_ {
        self.pairs
            .iter()
            .flat_map(|(&s, ts)| ts.iter().map(move |&t| (s, t)))
    }

    /// Candidate targets of one source.
    pub fn targets_of(&self, source: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.pairs.get(&source).into_iter().flatten().copied()
    }

    /// Keep only the pairs matching the predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(EntityId, EntityId) -> bool) {
        for (&s, ts) in self.pairs.iter_mut() {
            ts.retain(|&t| keep(s, t));
        }
        self.pairs.retain(|_, ts| !ts.is_empty());
    }

    fn product(ctx: &MatchContext, sources: &[EntityId], targets: &[EntityId]) -> Self {
        let mut out = Self::new();
        for &s in sources {
            for &t in targets {
                if admissible(ctx, s, t) && speaks(ctx, s, t) {
                    out.insert(s, t);
                }
            }
        }
        out
    }

    /// Type-filtered cross product, respecting the language and same-URI settings.
    pub fn for_kind(ctx: &MatchContext, kind: EntityType) -> Self {
        Self::product(
            ctx,
            &ctx.source().entities_of(kind),
            &ctx.target().entities_of(kind),
        )
    }

    /// Cross product of the entities `base` has not mapped on either side.
    ///
    /// Mapped entities are dropped before the product is taken, so its size
    /// is bounded by the unmapped counts.
    pub fn unmapped(ctx: &MatchContext, kind: EntityType, base: &Alignment) -> Self {
        let mut sources = ctx.source().entities_of(kind);
        sources.retain(|&s| !base.contains_source(s));
        let mut targets = ctx.target().entities_of(kind);
        targets.retain(|&t| !base.contains_target(t));
        tracing::debug!(
            %kind,
            sources = sources.len(),
            targets = targets.len(),
            "unmapped candidate product"
        );
        Self::product(ctx, &sources, &targets)
    }

    /// The pairs of `alignment` whose source is of `kind`.
    pub fn from_alignment(ctx: &MatchContext, alignment: &Alignment, kind: EntityType) -> Self {
        alignment
            .iter()
            .filter(|m| ctx.source().type_of(m.source) == Some(kind))
            .map(|m| (m.source, m.target))
            .collect()
    }
}

impl FromIterator<(EntityId, EntityId)> for Candidates {
    fn from_iter<I: IntoIterator<Item = (EntityId, EntityId)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (s, t) in iter {
            out.insert(s, t);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

fn check_threshold(threshold: f64) -> MatchResult<()> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(MatchError::InvalidThreshold { threshold })
    }
}

fn ensure_supported<S: Scorer + ?Sized>(scorer: &S, kind: EntityType) -> MatchResult<()> {
    if scorer.supports(kind) {
        Ok(())
    } else {
        Err(MatchError::UnsupportedEntityType {
            matcher: scorer.name().to_string(),
            kind,
        })
    }
}

/// Score one pair, turning panics and non-finite values into a dropped pair.
fn score_pair<S: Scorer + ?Sized>(
    ctx: &MatchContext,
    scorer: &S,
    source: EntityId,
    target: EntityId,
) -> Option<f64> {
    match catch_unwind(AssertUnwindSafe(|| scorer.score(ctx, source, target))) {
        Ok(value) if value.is_finite() => Some(value),
        Ok(value) => {
            tracing::warn!(
                scorer = scorer.name(),
                %source,
                %target,
                value,
                "non-finite score, dropping pair"
            );
            None
        }
        Err(_) => {
            tracing::warn!(
                scorer = scorer.name(),
                %source,
                %target,
                "scoring task panicked, dropping pair"
            );
            None
        }
    }
}

/// Bounded worker pool plus batching policy.
pub struct MatchEngine {
    pool: rayon::ThreadPool,
    batch_size: usize,
}

impl std::fmt::Debug for MatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchEngine")
            .field("threads", &self.pool.current_num_threads())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl MatchEngine {
    /// Build a pool of `config.threads` workers (default: available parallelism).
    pub fn new(config: &MatchConfig) -> MatchResult<Self> {
        let threads = config.threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        });
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("ontomatch-score-{i}"))
            .build()
            .map_err(|e| MatchError::ThreadPool {
                message: e.to_string(),
            })?;
        Ok(Self {
            pool,
            batch_size: config.batch_size.max(1),
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Score every candidate and keep pairs with `score >= threshold`.
    ///
    /// Candidate sets smaller than one batch are scored on the calling
    /// thread.
    pub fn run<S: Scorer + ?Sized>(
        &self,
        ctx: &MatchContext,
        scorer: &S,
        candidates: &Candidates,
        threshold: f64,
    ) -> MatchResult<Alignment> {
        check_threshold(threshold)?;
        let pairs: Vec<(EntityId, EntityId)> = candidates.iter().collect();
        if pairs.len() < self.batch_size {
            let scores = sequential_scores(ctx, scorer, &pairs);
            return Ok(self.collect(ctx, scorer, &pairs, scores, threshold));
        }

        let batch_size = self.batch_size;
        let scores: Vec<Option<f64>> = self.pool.install(|| {
            pairs
                .par_chunks(batch_size)
                .map(|batch| {
                    batch
                        .iter()
                        .map(|&(s, t)| score_pair(ctx, scorer, s, t))
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<Vec<_>>>()
        })
        .into_iter()
        .flatten()
        .collect();

        Ok(self.collect(ctx, scorer, &pairs, scores, threshold))
    }

    /// Same as [`run`](Self::run), always on the calling thread.
    pub fn run_sequential<S: Scorer + ?Sized>(
        &self,
        ctx: &MatchContext,
        scorer: &S,
        candidates: &Candidates,
        threshold: f64,
    ) -> MatchResult<Alignment> {
        check_threshold(threshold)?;
        let pairs: Vec<(EntityId, EntityId)> = candidates.iter().collect();
        let scores = sequential_scores(ctx, scorer, &pairs);
        Ok(self.collect(ctx, scorer, &pairs, scores, threshold))
    }

    /// Single-threaded fan-in, in candidate order.
    fn collect<S: Scorer + ?Sized>(
        &self,
        ctx: &MatchContext,
        scorer: &S,
        pairs: &[(EntityId, EntityId)],
        scores: Vec<Option<f64>>,
        threshold: f64,
    ) -> Alignment {
        let mut out = ctx.new_alignment();
        let mut dropped = 0usize;
        for (&(s, t), score) in pairs.iter().zip(scores) {
            match score {
                Some(value) => {
                    if value >= threshold {
                        out.add(s, t, value);
                    }
                }
                None => dropped += 1,
            }
        }
        tracing::debug!(
            scorer = scorer.name(),
            candidates = pairs.len(),
            kept = out.len(),
            dropped,
            threshold,
            "scoring sweep done"
        );
        out
    }

    /// Match mode: score the scorer's own candidates for `kind`.
    pub fn match_entities<S: Scorer + ?Sized>(
        &self,
        ctx: &MatchContext,
        scorer: &S,
        kind: EntityType,
        threshold: f64,
    ) -> MatchResult<Alignment> {
        ensure_supported(scorer, kind)?;
        let candidates = scorer.candidates(ctx, kind);
        tracing::info!(
            scorer = scorer.name(),
            %kind,
            candidates = candidates.len(),
            threshold,
            "match"
        );
        self.run(ctx, scorer, &candidates, threshold)
    }

    /// Extend mode: score pairs among entities `base` has not mapped.
    pub fn extend<S: SupportsExtend + ?Sized>(
        &self,
        ctx: &MatchContext,
        scorer: &S,
        base: &Alignment,
        kind: EntityType,
        threshold: f64,
    ) -> MatchResult<Alignment> {
        ensure_supported(scorer, kind)?;
        let candidates = scorer.extension_candidates(ctx, kind, base);
        tracing::info!(
            scorer = scorer.name(),
            %kind,
            candidates = candidates.len(),
            threshold,
            "extend"
        );
        self.run(ctx, scorer, &candidates, threshold)
    }

    /// Rematch mode: re-score the pairs of `base` of one kind.
    ///
    /// Nothing is filtered by threshold. Relation and status are carried
    /// over from `base`.
    pub fn rematch<S: SupportsRematch + ?Sized>(
        &self,
        ctx: &MatchContext,
        scorer: &S,
        base: &Alignment,
        kind: EntityType,
    ) -> MatchResult<Alignment> {
        ensure_supported(scorer, kind)?;
        let candidates = Candidates::from_alignment(ctx, base, kind);
        tracing::info!(scorer = scorer.name(), %kind, pairs = candidates.len(), "rematch");
        let scored = self.run(ctx, scorer, &candidates, 0.0)?;

        let mut out = base.empty_like();
        for m in &scored {
            let original = base.get(m.source, m.target);
            let relation = original.map_or(m.relation, |o| o.relation);
            let status = original.map_or(m.status, |o| o.status);
            out.add_mapping(
                Mapping::with_relation(m.source, m.target, m.similarity(), relation)
                    .with_status(status),
            );
        }
        Ok(out)
    }
}

fn sequential_scores<S: Scorer + ?Sized>(
    ctx: &MatchContext,
    scorer: &S,
    pairs: &[(EntityId, EntityId)],
) -> Vec<Option<f64>> {
    pairs
        .iter()
        .map(|&(s, t)| score_pair(ctx, scorer, s, t))
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::MatchConfig;
    use crate::context::MatchContext;
    use crate::entity::EntityType;
    use crate::ontology::{EntitySnapshot, OntologySnapshot};

    /// Two class-only knowledge bases from `(id, label)` lists.
    pub fn labelled(source: &[(u32, &str)], target: &[(u32, &str)]) -> MatchContext {
        labelled_with(source, target, MatchConfig::default())
    }

    pub fn labelled_with(
        source: &[(u32, &str)],
        target: &[(u32, &str)],
        config: MatchConfig,
    ) -> MatchContext {
        let build = |uri: &str, rows: &[(u32, &str)]| {
            let mut snap = OntologySnapshot::new(uri);
            for &(id, label) in rows {
                snap.entities.push(
                    EntitySnapshot::new(id, format!("{uri}#e{id}"), EntityType::Class)
                        .named(label),
                );
            }
            snap
        };
        MatchContext::from_snapshots(build("http://src", source), build("http://tgt", target), config)
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{labelled, labelled_with};
    use super::*;
    use crate::alignment::{MappingStatus, RelationKind};

    fn id(raw: u32) -> EntityId {
        EntityId::new(raw)
    }

    fn engine(threads: usize, batch_size: usize) -> MatchEngine {
        MatchEngine::new(&MatchConfig {
            threads: Some(threads),
            batch_size,
            ..Default::default()
        })
        .unwrap()
    }

    fn id_distance(_: &MatchContext, s: EntityId, t: EntityId) -> f64 {
        1.0 / (1.0 + (t.get() as f64 - s.get() as f64 - 10.0).abs())
    }

    fn wide_context() -> MatchContext {
        let source: Vec<(u32, String)> = (1..=40).map(|i| (i, format!("s{i}"))).collect();
        let target: Vec<(u32, String)> = (11..=50).map(|i| (i, format!("t{i}"))).collect();
        let s: Vec<(u32, &str)> = source.iter().map(|(i, n)| (*i, n.as_str())).collect();
        let t: Vec<(u32, &str)> = target.iter().map(|(i, n)| (*i, n.as_str())).collect();
        labelled(&s, &t)
    }

    #[test]
    fn cross_product_in_order() {
        let ctx = labelled(&[(2, "b"), (1, "a")], &[(11, "y"), (10, "x")]);
        let c = Candidates::for_kind(&ctx, EntityType::Class);
        let pairs: Vec<_> = c.iter().collect();
        assert_eq!(pairs, vec![(id(1), id(10)), (id(1), id(11)), (id(2), id(10)), (id(2), id(11))]);
        assert!(Candidates::for_kind(&ctx, EntityType::Individual).is_empty());
    }

    #[test]
    fn unmapped_excludes_mapped_entities() {
        let ctx = labelled(&[(1, "a"), (2, "b")], &[(10, "x"), (11, "y")]);
        let mut base = ctx.new_alignment();
        base.add(id(1), id(10), 1.0);
        let c = Candidates::unmapped(&ctx, EntityType::Class, &base);
        assert_eq!(c.iter().collect::<Vec<_>>(), vec![(id(2), id(11))]);
    }

    #[test]
    fn unmapped_product_covers_only_unmapped_entities() {
        let names: Vec<String> = (0..40).map(|i| format!("part {i}")).collect();
        let source: Vec<(u32, &str)> = (0..40).map(|i| (i + 1, names[i as usize].as_str())).collect();
        let target: Vec<(u32, &str)> =
            (0..40).map(|i| (i + 101, names[i as usize].as_str())).collect();
        let ctx = labelled(&source, &target);
        let mut base = ctx.new_alignment();
        for i in 0..38 {
            base.add(id(i + 1), id(i + 101), 1.0);
        }

        let c = Candidates::unmapped(&ctx, EntityType::Class, &base);
        assert_eq!(c.len(), 4);
        assert_eq!(
            c.iter().collect::<Vec<_>>(),
            vec![(id(39), id(139)), (id(39), id(140)), (id(40), id(139)), (id(40), id(140))]
        );

        let everything = ctx.new_alignment();
        assert_eq!(Candidates::unmapped(&ctx, EntityType::Class, &everything).len(), 1600);
    }

    #[test]
    fn language_filter_requires_names_in_language() {
        let config = MatchConfig {
            language: Some("fr".into()),
            ..Default::default()
        };
        let ctx = labelled_with(&[(1, "a")], &[(10, "x")], config);
        // Labels built by `named` are untagged and therefore usable.
        assert_eq!(Candidates::for_kind(&ctx, EntityType::Class).len(), 1);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let ctx = wide_context();
        let scorer = ScoreFn::new("distance", id_distance);
        let candidates = Candidates::for_kind(&ctx, EntityType::Class);
        let parallel = engine(4, 7).run(&ctx, &scorer, &candidates, 0.3).unwrap();
        let sequential = engine(1, 7)
            .run_sequential(&ctx, &scorer, &candidates, 0.3)
            .unwrap();
        let a: Vec<_> = parallel.iter().map(|m| (m.source, m.target, m.similarity())).collect();
        let b: Vec<_> = sequential.iter().map(|m| (m.source, m.target, m.similarity())).collect();
        assert_eq!(a, b);
        // Pairs within two ids of the diagonal score at least 1/3.
        assert!(parallel.contains(id(5), id(15)));
        assert_eq!(parallel.similarity(id(5), id(16)), 0.5);
        assert!(!parallel.contains(id(5), id(18)));
    }

    #[test]
    fn repeated_parallel_runs_are_identical() {
        let ctx = wide_context();
        let scorer = ScoreFn::new("distance", id_distance);
        let candidates = Candidates::for_kind(&ctx, EntityType::Class);
        let engine = engine(8, 3);
        let first = engine.run(&ctx, &scorer, &candidates, 0.0).unwrap();
        for _ in 0..3 {
            let again = engine.run(&ctx, &scorer, &candidates, 0.0).unwrap();
            let a: Vec<_> = first.iter().map(|m| (m.source, m.target, m.similarity())).collect();
            let b: Vec<_> = again.iter().map(|m| (m.source, m.target, m.similarity())).collect();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn panicking_and_nan_pairs_are_dropped() {
        let ctx = labelled(&[(1, "a"), (2, "b"), (3, "c")], &[(10, "x")]);
        let scorer = ScoreFn::new("flaky", |_: &MatchContext, s: EntityId, _| match s.get() {
            1 => panic!("boom"),
            2 => f64::NAN,
            _ => 0.9,
        });
        let candidates = Candidates::for_kind(&ctx, EntityType::Class);
        for batch in [1, 256] {
            let out = engine(2, batch).run(&ctx, &scorer, &candidates, 0.0).unwrap();
            assert_eq!(out.len(), 1);
            assert!(out.contains(id(3), id(10)));
        }
    }

    #[test]
    fn invalid_threshold_is_an_error() {
        let ctx = labelled(&[(1, "a")], &[(10, "x")]);
        let scorer = ScoreFn::new("one", |_: &MatchContext, _, _| 1.0);
        let err = engine(1, 8)
            .run(&ctx, &scorer, &Candidates::new(), 1.5)
            .unwrap_err();
        assert!(matches!(err, MatchError::InvalidThreshold { .. }));
    }

    #[test]
    fn extend_only_scores_unmapped_entities() {
        let ctx = labelled(&[(1, "a"), (2, "b")], &[(10, "x"), (11, "y")]);
        let mut base = ctx.new_alignment();
        base.add(id(1), id(10), 1.0);
        let scorer = ScoreFn::new("one", |_: &MatchContext, _, _| 1.0);
        let out = engine(1, 8)
            .extend(&ctx, &scorer, &base, EntityType::Class, 0.5)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert!(out.contains(id(2), id(11)));
    }

    #[test]
    fn rematch_keeps_every_pair_and_its_payload() {
        let ctx = labelled(&[(1, "a"), (2, "b")], &[(10, "x"), (11, "y")]);
        let mut base = ctx.new_alignment();
        base.add_full(id(1), id(10), 0.9, RelationKind::Overlap, MappingStatus::Correct);
        base.add(id(2), id(11), 0.8);
        let scorer = ScoreFn::new("zero", |_: &MatchContext, _, _| 0.0);
        let out = engine(1, 8)
            .rematch(&ctx, &scorer, &base, EntityType::Class)
            .unwrap();
        assert_eq!(out.len(), 2);
        let m = out.get(id(1), id(10)).unwrap();
        assert_eq!(m.similarity(), 0.0);
        assert_eq!(m.relation, RelationKind::Overlap);
        assert_eq!(m.status, MappingStatus::Correct);
    }

    #[test]
    fn unsupported_kind_is_rejected() {
        struct ClassesOnly;
        impl Scorer for ClassesOnly {
            fn score(&self, _: &MatchContext, _: EntityId, _: EntityId) -> f64 {
                1.0
            }
            fn name(&self) -> &str {
                "classes-only"
            }
            fn supports(&self, kind: EntityType) -> bool {
                kind == EntityType::Class
            }
        }
        let ctx = labelled(&[(1, "a")], &[(10, "x")]);
        let err = engine(1, 8)
            .match_entities(&ctx, &ClassesOnly, EntityType::Individual, 0.5)
            .unwrap_err();
        assert!(matches!(
            err,
            MatchError::UnsupportedEntityType { kind: EntityType::Individual, .. }
        ));
    }
}
