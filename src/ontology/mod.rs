//! Knowledge-base tables consumed by the matchers.
//!
//! An [`Ontology`] holds one side of a match run: its entities, their names,
//! property signatures and individual values. The subclass structure of both
//! sides lives in a single shared [`EntityHierarchy`] keyed by global ids.
//! Loading OWL or SKOS documents is left to external tooling, which hands
//! tables over as an [`OntologySnapshot`].

pub mod hierarchy;
pub mod lexicon;
pub mod snapshot;
pub mod values;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, EntityType};
use crate::error::{OntologyError, OntologyResult};

pub use hierarchy::EntityHierarchy;
pub use lexicon::{LexicalEntry, LexicalType, Lexicon, normalize_name};
pub use snapshot::{EntitySnapshot, NameSnapshot, OntologySnapshot};
pub use values::{PropertyValue, ValueTable};

/// Table row for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityInfo {
    pub uri: String,
    pub kind: EntityType,
}

/// Domain, range and datatypes of a property.
///
/// Domain and range hold class ids of the same knowledge base. Datatypes are
/// the XSD datatype URIs a data property ranges over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySignature {
    #[serde(default)]
    pub domain: BTreeSet<EntityId>,
    #[serde(default)]
    pub range: BTreeSet<EntityId>,
    #[serde(default)]
    pub datatypes: BTreeSet<String>,
}

impl PropertySignature {
    pub fn is_empty(&self) -> bool {
        self.domain.is_empty() && self.range.is_empty() && self.datatypes.is_empty()
    }
}

/// One knowledge base taking part in a match run.
#[derive(Debug, Clone, Default)]
pub struct Ontology {
    uri: String,
    entities: BTreeMap<EntityId, EntityInfo>,
    by_uri: HashMap<String, EntityId>,
    lexicon: Lexicon,
    signatures: HashMap<EntityId, PropertySignature>,
    values: ValueTable,
}

impl Ontology {
    /// Create an empty knowledge base identified by `uri`.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    /// URI of the knowledge base itself.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Declare an entity.
    pub fn add_entity(
        &mut self,
        id: EntityId,
        uri: impl Into<String>,
        kind: EntityType,
    ) -> OntologyResult<()> {
        let uri = uri.into();
        if self.entities.contains_key(&id) {
            return Err(OntologyError::DuplicateEntity {
                id: id.get(),
                ontology: self.uri.clone(),
            });
        }
        self.by_uri.insert(uri.clone(), id);
        self.entities.insert(id, EntityInfo { uri, kind });
        Ok(())
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Entities of one kind, in ascending id order.
    pub fn entities_of(&self, kind: EntityType) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, info)| info.kind == kind)
            .map(|(&id, _)| id)
            .collect()
    }

    /// All entity ids, in ascending order.
    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    pub fn count(&self, kind: EntityType) -> usize {
        self.entities.values().filter(|info| info.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn uri_of(&self, id: EntityId) -> Option<&str> {
        self.entities.get(&id).map(|info| info.uri.as_str())
    }

    pub fn type_of(&self, id: EntityId) -> Option<EntityType> {
        self.entities.get(&id).map(|info| info.kind)
    }

    pub fn id_for_uri(&self, uri: &str) -> Option<EntityId> {
        self.by_uri.get(uri).copied()
    }

    /// Fragment of the entity URI after the last `#` or `/`.
    pub fn local_name(&self, id: EntityId) -> Option<&str> {
        self.uri_of(id).map(local_name)
    }

    /// Display label: best lexicon name, else local name.
    pub fn label(&self, id: EntityId) -> String {
        self.lexicon
            .best_name(id)
            .map(str::to_string)
            .or_else(|| self.local_name(id).map(str::to_string))
            .unwrap_or_default()
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn lexicon_mut(&mut self) -> &mut Lexicon {
        &mut self.lexicon
    }

    pub fn signature(&self, id: EntityId) -> Option<&PropertySignature> {
        self.signatures.get(&id)
    }

    pub fn set_signature(&mut self, id: EntityId, signature: PropertySignature) {
        if signature.is_empty() {
            self.signatures.remove(&id);
        } else {
            self.signatures.insert(id, signature);
        }
    }

    pub fn values(&self) -> &ValueTable {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut ValueTable {
        &mut self.values
    }
}

/// Fragment of a URI after the last `#` or `/`.
pub fn local_name(uri: &str) -> &str {
    let cut = uri.rfind(['#', '/']).map(|i| i + 1).unwrap_or(0);
    &uri[cut..]
}
