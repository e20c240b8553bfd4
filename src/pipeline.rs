//! End-to-end matching pipeline.
//!
//! A run plans an ordered list of [`Stage`]s from the size and shape of the
//! two knowledge bases, then folds over it. The only state carried from one
//! stage to the next is the running alignment and, once chosen, the
//! selection policy; each stage leaves a [`StageReport`].

use std::fmt;

use serde::Serialize;

use crate::alignment::Alignment;
use crate::combination::combine;
use crate::config::MatchConfig;
use crate::context::MatchContext;
use crate::entity::EntityType;
use crate::error::MatchResult;
use crate::matcher::{
    BackgroundKnowledge, LexicalMatcher, MatchEngine, MediatingMatcher,
    NeighborSimilarityMatcher, PropertyMatcher, StringMatcher, ValueMatcher, WordMatcher,
    WordStrategy,
};
use crate::selection::{SelectionType, repair, select};

/// Coarse size of a matching problem, from the larger class count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeCategory {
    Small,
    Medium,
    Large,
    Huge,
}

impl SizeCategory {
    pub fn from_class_count(classes: usize) -> Self {
        match classes {
            0..500 => SizeCategory::Small,
            500..5000 => SizeCategory::Medium,
            5000..20000 => SizeCategory::Large,
            _ => SizeCategory::Huge,
        }
    }

    pub fn of(ctx: &MatchContext) -> Self {
        let classes = ctx
            .source()
            .count(EntityType::Class)
            .max(ctx.target().count(EntityType::Class));
        Self::from_class_count(classes)
    }
}

impl fmt::Display for SizeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeCategory::Small => write!(f, "small"),
            SizeCategory::Medium => write!(f, "medium"),
            SizeCategory::Large => write!(f, "large"),
            SizeCategory::Huge => write!(f, "huge"),
        }
    }
}

/// One step of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Exact name matching of classes.
    Lexical,
    /// Mediated matching through the n-th registered knowledge source.
    Background(usize),
    /// Word-overlap extension.
    Word,
    /// String-similarity extension.
    String,
    /// Neighbour-similarity extension.
    Structural,
    /// Neighbour-similarity rematch blended into the running scores.
    StructuralBlend,
    /// Properties of one kind, constrained by the class alignment.
    Properties(EntityType),
    /// Individuals by name and by literal values.
    Individuals,
    Selection,
    Repair,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Lexical => write!(f, "lexical"),
            Stage::Background(i) => write!(f, "background#{i}"),
            Stage::Word => write!(f, "word"),
            Stage::String => write!(f, "string"),
            Stage::Structural => write!(f, "structural"),
            Stage::StructuralBlend => write!(f, "structural-blend"),
            Stage::Properties(kind) => write!(f, "properties/{kind}"),
            Stage::Individuals => write!(f, "individuals"),
            Stage::Selection => write!(f, "selection"),
            Stage::Repair => write!(f, "repair"),
        }
    }
}

/// What one stage did to the running alignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    /// Mappings the stage's matcher produced.
    pub produced: usize,
    /// Mappings added to or changed in the running alignment.
    pub merged: usize,
    /// Gain of the stage output over the running alignment before merging.
    pub gain: f64,
    /// Size of the running alignment after the stage.
    pub kept: usize,
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub alignment: Alignment,
    /// Policy used by the selection stage.
    pub selection: SelectionType,
    pub reports: Vec<StageReport>,
}

/// Accumulator threaded through the stages.
struct Fold {
    alignment: Alignment,
    selection: Option<SelectionType>,
}

/// Stage planner and runner.
pub struct Pipeline {
    engine: MatchEngine,
    knowledge: Vec<Box<dyn BackgroundKnowledge>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("engine", &self.engine)
            .field(
                "knowledge",
                &self.knowledge.iter().map(|k| k.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Pipeline {
    pub fn new(engine: MatchEngine) -> Self {
        Self {
            engine,
            knowledge: Vec::new(),
        }
    }

    /// Pipeline with an engine sized by `config`.
    pub fn from_config(config: &MatchConfig) -> MatchResult<Self> {
        Ok(Self::new(MatchEngine::new(config)?))
    }

    /// Register a background-knowledge source, tried in registration order.
    pub fn add_knowledge(&mut self, knowledge: Box<dyn BackgroundKnowledge>) {
        self.knowledge.push(knowledge);
    }

    pub fn with_knowledge(mut self, knowledge: Box<dyn BackgroundKnowledge>) -> Self {
        self.add_knowledge(knowledge);
        self
    }

    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    /// Stages a run on `ctx` would execute, in order.
    pub fn plan(&self, ctx: &MatchContext) -> Vec<Stage> {
        let config = ctx.config();
        let size = SizeCategory::of(ctx);
        let mut stages = vec![Stage::Lexical];

        if size != SizeCategory::Huge {
            stages.extend((0..self.knowledge.len()).map(Stage::Background));
        }
        stages.push(Stage::Word);
        if size <= SizeCategory::Medium {
            stages.push(Stage::String);
        }
        if !ctx.hierarchy().is_empty() {
            stages.push(Stage::Structural);
            stages.push(Stage::StructuralBlend);
        }
        if config.match_properties {
            for kind in [EntityType::ObjectProperty, EntityType::DataProperty] {
                if ctx.source().count(kind) > 0 && ctx.target().count(kind) > 0 {
                    stages.push(Stage::Properties(kind));
                }
            }
        }
        let individuals = ctx.source().count(EntityType::Individual) > 0
            && ctx.target().count(EntityType::Individual) > 0;
        if config.match_individuals && individuals {
            stages.push(Stage::Individuals);
        }
        stages.push(Stage::Selection);
        stages.push(Stage::Repair);

        tracing::debug!(%size, stages = stages.len(), "planned pipeline");
        stages
    }

    /// Plan and run every stage on `ctx`.
    pub fn run(&self, ctx: &MatchContext) -> MatchResult<PipelineOutcome> {
        let stages = self.plan(ctx);
        tracing::info!(
            source_uri = ctx.source().uri(),
            target_uri = ctx.target().uri(),
            size = %SizeCategory::of(ctx),
            stages = stages.len(),
            "pipeline started"
        );

        let mut fold = Fold {
            alignment: ctx.new_alignment(),
            selection: None,
        };
        let mut reports = Vec::with_capacity(stages.len());
        for stage in stages {
            let report = self.apply(stage, ctx, &mut fold)?;
            tracing::info!(
                stage = %report.stage,
                produced = report.produced,
                merged = report.merged,
                gain = report.gain,
                kept = report.kept,
                "stage done"
            );
            reports.push(report);
        }

        let selection = fold.selection.unwrap_or(SelectionType::StrictOneToOne);
        tracing::info!(mappings = fold.alignment.len(), %selection, "pipeline finished");
        Ok(PipelineOutcome {
            alignment: fold.alignment,
            selection,
            reports,
        })
    }

    fn apply(&self, stage: Stage, ctx: &MatchContext, fold: &mut Fold) -> MatchResult<StageReport> {
        let config = ctx.config();
        let engine = &self.engine;
        let class = EntityType::Class;

        match stage {
            Stage::Lexical => {
                let found = engine.match_entities(ctx, &LexicalMatcher, class, config.threshold)?;
                Ok(merge_all(stage, fold, &found))
            }
            Stage::Background(i) => {
                let knowledge = self.knowledge[i].as_ref();
                let matcher = MediatingMatcher::new(knowledge);
                let found = engine.match_entities(ctx, &matcher, class, config.threshold)?;
                let gain = found.gain_one_to_one(&fold.alignment);
                if gain <= config.min_gain {
                    tracing::warn!(
                        knowledge = knowledge.name(),
                        gain,
                        min_gain = config.min_gain,
                        "background knowledge rejected"
                    );
                    return Ok(StageReport {
                        stage,
                        produced: found.len(),
                        merged: 0,
                        gain,
                        kept: fold.alignment.len(),
                    });
                }
                Ok(merge_all(stage, fold, &found))
            }
            Stage::Word => {
                let matcher = WordMatcher::new(ctx, WordStrategy::Average);
                let found =
                    engine.extend(ctx, &matcher, &fold.alignment, class, config.word_threshold)?;
                Ok(merge_one_to_one(stage, fold, &found))
            }
            Stage::String => {
                let found = engine.extend(
                    ctx,
                    &StringMatcher::default(),
                    &fold.alignment,
                    class,
                    config.string_threshold,
                )?;
                Ok(merge_one_to_one(stage, fold, &found))
            }
            Stage::Structural => {
                let found = {
                    let matcher = NeighborSimilarityMatcher::new(
                        &fold.alignment,
                        config.structural_strategy,
                        config.structural_depth,
                    );
                    engine.extend(
                        ctx,
                        &matcher,
                        &fold.alignment,
                        class,
                        config.structural_threshold,
                    )?
                };
                Ok(merge_one_to_one(stage, fold, &found))
            }
            Stage::StructuralBlend => {
                // Pairs without relatives on both sides carry no structural
                // evidence and keep their similarity.
                let h = ctx.hierarchy();
                let connected = |id| !h.parents(id).is_empty() || !h.children(id).is_empty();
                let mut eligible = fold.alignment.clone();
                eligible.retain(|m| {
                    ctx.source().type_of(m.source) == Some(class)
                        && connected(m.source)
                        && connected(m.target)
                });
                let rescored = {
                    let matcher = NeighborSimilarityMatcher::new(
                        &fold.alignment,
                        config.structural_strategy,
                        config.structural_depth,
                    );
                    engine.rematch(ctx, &matcher, &eligible, class)?
                };
                let blended = combine(&eligible, &rescored, config.structural_weight)?;
                let mut changed = 0;
                for m in blended.iter() {
                    if fold.alignment.similarity(m.source, m.target) != m.similarity() {
                        fold.alignment.set_similarity(m.source, m.target, m.similarity());
                        changed += 1;
                    }
                }
                Ok(StageReport {
                    stage,
                    produced: rescored.len(),
                    merged: changed,
                    gain: 0.0,
                    kept: fold.alignment.len(),
                })
            }
            Stage::Properties(kind) => {
                let found = {
                    let matcher = PropertyMatcher::new(&fold.alignment);
                    engine.match_entities(ctx, &matcher, kind, config.threshold)?
                };
                Ok(merge_one_to_one(stage, fold, &found))
            }
            Stage::Individuals => {
                let kind = EntityType::Individual;
                let mut found = engine.match_entities(ctx, &LexicalMatcher, kind, config.threshold)?;
                let by_value = engine.match_entities(ctx, &ValueMatcher, kind, config.threshold)?;
                found.add_all(&by_value);
                found.sort_descending();
                Ok(merge_one_to_one(stage, fold, &found))
            }
            Stage::Selection => {
                let policy = config
                    .selection
                    .unwrap_or_else(|| SelectionType::detect(&fold.alignment));
                let produced = fold.alignment.len();
                fold.alignment = select(&fold.alignment, policy, config.threshold);
                fold.selection = Some(policy);
                Ok(StageReport {
                    stage,
                    produced,
                    merged: fold.alignment.len(),
                    gain: 0.0,
                    kept: fold.alignment.len(),
                })
            }
            Stage::Repair => {
                let policy = fold.selection.unwrap_or(SelectionType::StrictOneToOne);
                let produced = fold.alignment.len();
                fold.alignment = repair(&fold.alignment, policy);
                Ok(StageReport {
                    stage,
                    produced,
                    merged: fold.alignment.len(),
                    gain: 0.0,
                    kept: fold.alignment.len(),
                })
            }
        }
    }
}

fn merge_all(stage: Stage, fold: &mut Fold, found: &Alignment) -> StageReport {
    let gain = found.gain(&fold.alignment);
    let merged = fold.alignment.add_all(found);
    StageReport {
        stage,
        produced: found.len(),
        merged,
        gain,
        kept: fold.alignment.len(),
    }
}

fn merge_one_to_one(stage: Stage, fold: &mut Fold, found: &Alignment) -> StageReport {
    let gain = found.gain_one_to_one(&fold.alignment);
    let merged = fold.alignment.add_all_one_to_one(found);
    StageReport {
        stage,
        produced: found.len(),
        merged,
        gain,
        kept: fold.alignment.len(),
    }
}
