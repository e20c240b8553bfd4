//! Core entity types for the alignment engine.
//!
//! Entities are the classes, properties and individuals of the two knowledge
//! bases being aligned. Each one is identified by an [`EntityId`] handed out
//! by the ontology loader; the engine never interprets URIs directly. The
//! [`Partition`] records which knowledge base each id belongs to.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Opaque, dense identifier for an entity of either knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// Wrap a raw registry id.
    pub const fn new(raw: u32) -> Self {
        EntityId(raw)
    }

    /// Get the underlying `u32` value.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for EntityId {
    fn from(raw: u32) -> Self {
        EntityId(raw)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ent:{}", self.0)
    }
}

/// Classification of an entity in a knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// An OWL/SKOS class or concept.
    Class,
    /// A property relating two individuals.
    ObjectProperty,
    /// A property relating an individual to a literal.
    DataProperty,
    /// A named individual.
    Individual,
}

impl EntityType {
    /// All entity types, in declaration order.
    pub const ALL: [EntityType; 4] = [
        EntityType::Class,
        EntityType::ObjectProperty,
        EntityType::DataProperty,
        EntityType::Individual,
    ];

    /// Whether this is one of the two property kinds.
    pub fn is_property(self) -> bool {
        matches!(self, EntityType::ObjectProperty | EntityType::DataProperty)
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Class => write!(f, "class"),
            EntityType::ObjectProperty => write!(f, "object property"),
            EntityType::DataProperty => write!(f, "data property"),
            EntityType::Individual => write!(f, "individual"),
        }
    }
}

/// Which of the two knowledge bases an entity comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Source,
    Target,
}

/// Membership of entity ids in the source and target knowledge bases.
///
/// Shared (via `Arc`) by every alignment created for a match run so that
/// [`Alignment::add`](crate::alignment::Alignment::add) can reject mappings
/// pointing the wrong way.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    source: HashSet<EntityId>,
    target: HashSet<EntityId>,
}

impl Partition {
    /// Build a partition from the entity ids of each side.
    pub fn new(
        source: impl IntoIterator<Item = EntityId>,
        target: impl IntoIterator<Item = EntityId>,
    ) -> Self {
        Self {
            source: source.into_iter().collect(),
            target: target.into_iter().collect(),
        }
    }

    /// Whether `id` belongs to the source knowledge base.
    pub fn in_source(&self, id: EntityId) -> bool {
        self.source.contains(&id)
    }

    /// Whether `id` belongs to the target knowledge base.
    pub fn in_target(&self, id: EntityId) -> bool {
        self.target.contains(&id)
    }

    /// The side an id belongs to. Ids shared by both sides report `Source`.
    pub fn side_of(&self, id: EntityId) -> Option<Side> {
        if self.in_source(id) {
            Some(Side::Source)
        } else if self.in_target(id) {
            Some(Side::Target)
        } else {
            None
        }
    }

    /// Whether a `(source, target)` pair points the right way.
    ///
    /// A pair is rejected when the source id is known to the target knowledge
    /// base or the target id is known to the source knowledge base.
    pub fn admits(&self, source: EntityId, target: EntityId) -> bool {
        !self.in_target(source) && !self.in_source(target)
    }
}
