//! JSON exchange form for knowledge-base tables.
//!
//! A snapshot is what an external OWL/SKOS loader emits: a knowledge-base
//! URI and a flat list of entities, each with its global id, type, names,
//! direct parents, property signature and literal values.
//!
//! ```json
//! {
//!   "uri": "http://example.org/anatomy",
//!   "entities": [
//!     { "id": 1, "uri": "http://example.org/anatomy#Heart", "type": "class",
//!       "names": [{ "name": "Heart", "kind": "label", "lang": "en" }],
//!       "parents": [3] }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, EntityType};
use crate::error::{OntologyError, OntologyResult};

use super::{
    EntityHierarchy, LexicalType, Ontology, PropertySignature, PropertyValue, local_name,
};

/// One name as emitted by the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameSnapshot {
    pub name: String,
    #[serde(default)]
    pub kind: LexicalType,
    #[serde(default)]
    pub lang: String,
    /// Overrides the provenance default weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

/// One entity row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub uri: String,
    #[serde(rename = "type")]
    pub kind: EntityType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<NameSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<EntityId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain: Vec<EntityId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub range: Vec<EntityId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datatypes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<PropertyValue>,
}

impl EntitySnapshot {
    /// Bare entity with no names or relations.
    pub fn new(id: u32, uri: impl Into<String>, kind: EntityType) -> Self {
        Self {
            id: EntityId::new(id),
            uri: uri.into(),
            kind,
            names: Vec::new(),
            parents: Vec::new(),
            domain: Vec::new(),
            range: Vec::new(),
            datatypes: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Add a label.
    pub fn named(mut self, name: &str) -> Self {
        self.names.push(NameSnapshot {
            name: name.to_string(),
            kind: LexicalType::Label,
            lang: String::new(),
            weight: None,
        });
        self
    }

    /// Add a direct parent.
    pub fn child_of(mut self, parent: u32) -> Self {
        self.parents.push(EntityId::new(parent));
        self
    }
}

/// Tables for one knowledge base, as exchanged with the loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OntologySnapshot {
    pub uri: String,
    #[serde(default)]
    pub entities: Vec<EntitySnapshot>,
}

impl OntologySnapshot {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            entities: Vec::new(),
        }
    }

    /// Parse a snapshot from JSON text. `origin` names the input in errors.
    pub fn from_json(json: &str, origin: &str) -> OntologyResult<Self> {
        serde_json::from_str(json).map_err(|e| OntologyError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Load a snapshot file.
    pub fn load(path: &Path) -> OntologyResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| OntologyError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json(&content, &path.display().to_string())
    }

    /// Write the snapshot as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> OntologyResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| OntologyError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|e| OntologyError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Build the in-memory tables, adding subclass edges to `hierarchy`.
    ///
    /// Parents, domains and ranges must refer to entities declared in the
    /// same snapshot. An entity without any name gets its URI local name.
    pub fn into_ontology(self, hierarchy: &mut EntityHierarchy) -> OntologyResult<Ontology> {
        let mut onto = Ontology::new(self.uri);
        for entity in &self.entities {
            onto.add_entity(entity.id, entity.uri.clone(), entity.kind)?;
        }

        for entity in self.entities {
            let id = entity.id;
            let check = |other: EntityId| {
                if onto.contains(other) {
                    Ok(other)
                } else {
                    Err(OntologyError::UnknownEntity { id: other.get() })
                }
            };

            for parent in &entity.parents {
                hierarchy.add_subclass(id, check(*parent)?);
            }
            let signature = PropertySignature {
                domain: entity.domain.iter().map(|&d| check(d)).collect::<Result<_, _>>()?,
                range: entity.range.iter().map(|&r| check(r)).collect::<Result<_, _>>()?,
                datatypes: entity.datatypes.into_iter().collect(),
            };
            onto.set_signature(id, signature);

            let lexicon = onto.lexicon_mut();
            for n in &entity.names {
                let weight = n.weight.unwrap_or_else(|| n.kind.default_weight());
                lexicon.add_weighted(id, &n.name, n.kind, &n.lang, weight);
            }
            if lexicon.entries(id).is_empty() {
                lexicon.add(id, local_name(&entity.uri), LexicalType::LocalName, "");
            }

            for pv in &entity.values {
                onto.values_mut().add(id, &pv.property, &pv.value);
            }
        }
        Ok(onto)
    }
}
