//! A single correspondence between a source and a target entity.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::error::FormatError;

/// Semantic relation asserted by a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    #[default]
    Equivalence,
    /// The source entity is broader than the target.
    SourceSubsumesTarget,
    /// The target entity is broader than the source.
    TargetSubsumesSource,
    Overlap,
    Incompatible,
    Unknown,
}

impl RelationKind {
    pub const ALL: [RelationKind; 6] = [
        RelationKind::Equivalence,
        RelationKind::SourceSubsumesTarget,
        RelationKind::TargetSubsumesSource,
        RelationKind::Overlap,
        RelationKind::Incompatible,
        RelationKind::Unknown,
    ];

    /// The relation seen from the other side.
    pub fn inverse(self) -> Self {
        match self {
            RelationKind::SourceSubsumesTarget => RelationKind::TargetSubsumesSource,
            RelationKind::TargetSubsumesSource => RelationKind::SourceSubsumesTarget,
            other => other,
        }
    }

    /// Canonical short token used by the alignment file formats.
    pub fn token(self) -> &'static str {
        match self {
            RelationKind::Equivalence => "=",
            RelationKind::SourceSubsumesTarget => ">",
            RelationKind::TargetSubsumesSource => "<",
            RelationKind::Overlap => "^",
            RelationKind::Incompatible => "%",
            RelationKind::Unknown => "?",
        }
    }

    /// Parse a short token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "=" => Some(RelationKind::Equivalence),
            ">" => Some(RelationKind::SourceSubsumesTarget),
            "<" => Some(RelationKind::TargetSubsumesSource),
            "^" => Some(RelationKind::Overlap),
            "%" => Some(RelationKind::Incompatible),
            "?" => Some(RelationKind::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for RelationKind {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or_else(|| FormatError::UnrecognizedFormat {
            detail: format!("unknown relation token `{s}`"),
        })
    }
}

/// Review verdict on a mapping.
///
/// Variant order is the ranking order: `Incorrect < Unknown < Correct`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum MappingStatus {
    Incorrect,
    #[default]
    Unknown,
    Correct,
}

impl MappingStatus {
    /// File-format token; empty for `Unknown`.
    pub fn token(self) -> &'static str {
        match self {
            MappingStatus::Correct => "+",
            MappingStatus::Incorrect => "-",
            MappingStatus::Unknown => "",
        }
    }

    /// Parse a token. Anything unrecognized is `Unknown`.
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "+" => MappingStatus::Correct,
            "-" => MappingStatus::Incorrect,
            t if t.eq_ignore_ascii_case("correct") => MappingStatus::Correct,
            t if t.eq_ignore_ascii_case("incorrect") => MappingStatus::Incorrect,
            _ => MappingStatus::Unknown,
        }
    }
}

/// Clamp to [0, 1] and round to 4 decimal places. NaN becomes 0.
pub fn round_similarity(similarity: f64) -> f64 {
    if similarity.is_nan() {
        return 0.0;
    }
    (similarity.clamp(0.0, 1.0) * 10_000.0).round() / 10_000.0
}

/// One `(source, target)` correspondence.
///
/// Identity is the entity pair; similarity, relation and status are payload.
#[derive(Debug, Clone, Copy)]
pub struct Mapping {
    pub source: EntityId,
    pub target: EntityId,
    similarity: f64,
    pub relation: RelationKind,
    pub status: MappingStatus,
}

impl Mapping {
    /// Equivalence mapping with unknown status.
    pub fn new(source: EntityId, target: EntityId, similarity: f64) -> Self {
        Self::with_relation(source, target, similarity, RelationKind::Equivalence)
    }

    pub fn with_relation(
        source: EntityId,
        target: EntityId,
        similarity: f64,
        relation: RelationKind,
    ) -> Self {
        Self {
            source,
            target,
            similarity: round_similarity(similarity),
            relation,
            status: MappingStatus::Unknown,
        }
    }

    pub fn with_status(mut self, status: MappingStatus) -> Self {
        self.status = status;
        self
    }

    pub fn similarity(&self) -> f64 {
        self.similarity
    }

    pub fn set_similarity(&mut self, similarity: f64) {
        self.similarity = round_similarity(similarity);
    }

    /// Ranking order: status first, then similarity ascending.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        self.status
            .cmp(&other.status)
            .then_with(|| self.similarity.total_cmp(&other.similarity))
    }

    /// Strictly higher similarity.
    pub fn is_better_than(&self, other: &Self) -> bool {
        self.similarity > other.similarity
    }

    /// Whether the two mappings share an entity but are different pairs.
    pub fn conflicts_with(&self, other: &Self) -> bool {
        (self.source == other.source) != (self.target == other.target)
    }
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.target == other.target
    }
}

impl Eq for Mapping {}

impl Hash for Mapping {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
        self.target.hash(state);
    }
}

impl std::fmt::Display for Mapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} ({:.4})",
            self.source, self.relation, self.target, self.similarity
        )
    }
}
