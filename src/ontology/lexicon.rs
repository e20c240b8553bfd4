//! Lexicon: weighted names and synonyms per entity.
//!
//! Every name is stored in normalized form (see [`normalize_name`]) together
//! with its provenance ([`LexicalType`]), a language tag and a base weight.
//! A reverse index from normalized name to entities supports the hash-join
//! candidate generation used by the lexical matchers.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::entity::EntityId;

static RE_CAMEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\p{Ll}|\p{Nd})(\p{Lu})").unwrap());
static RE_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());

/// Provenance of a name in the lexicon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LexicalType {
    /// Fragment of the entity URI.
    LocalName,
    /// `rdfs:label`, `skos:prefLabel` and similar.
    #[default]
    Label,
    /// Synonym declared as exact.
    ExactSynonym,
    /// Related, broad or narrow synonym.
    OtherSynonym,
    /// Chemical or mathematical formula.
    Formula,
    /// Name contributed by a background-knowledge source.
    External,
}

impl LexicalType {
    /// Base weight for names of this provenance.
    pub fn default_weight(self) -> f64 {
        match self {
            LexicalType::LocalName => 1.0,
            LexicalType::Label => 1.0,
            LexicalType::ExactSynonym => 0.95,
            LexicalType::OtherSynonym => 0.9,
            LexicalType::Formula => 0.85,
            LexicalType::External => 0.8,
        }
    }
}

impl std::fmt::Display for LexicalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexicalType::LocalName => write!(f, "local-name"),
            LexicalType::Label => write!(f, "label"),
            LexicalType::ExactSynonym => write!(f, "exact-synonym"),
            LexicalType::OtherSynonym => write!(f, "other-synonym"),
            LexicalType::Formula => write!(f, "formula"),
            LexicalType::External => write!(f, "external"),
        }
    }
}

/// A single name of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalEntry {
    /// Normalized name.
    pub name: String,
    /// Where the name came from.
    pub kind: LexicalType,
    /// BCP 47 language tag, empty when unknown.
    pub language: String,
    /// Base weight in [0, 1].
    pub weight: f64,
}

/// Normalize a raw name for comparison.
///
/// Applies NFKC, splits camel case, turns every run of non-alphanumeric
/// characters into a single space and lower-cases the result.
pub fn normalize_name(raw: &str) -> String {
    let composed: String = raw.nfkc().collect();
    let split = RE_CAMEL.replace_all(&composed, "$1 $2");
    let spaced = RE_SEPARATORS.replace_all(&split, " ");
    spaced.trim().to_lowercase()
}

/// Per-entity weighted names with a reverse name index.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    entries: HashMap<EntityId, Vec<LexicalEntry>>,
    by_name: HashMap<String, BTreeSet<EntityId>>,
}

impl Lexicon {
    /// Create an empty lexicon.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name with the default weight for its provenance.
    ///
    /// Returns `false` when the name normalizes to nothing or the entity
    /// already carries it with an equal or higher weight.
    pub fn add(&mut self, id: EntityId, name: &str, kind: LexicalType, language: &str) -> bool {
        self.add_weighted(id, name, kind, language, kind.default_weight())
    }

    /// Add a name with an explicit weight.
    pub fn add_weighted(
        &mut self,
        id: EntityId,
        name: &str,
        kind: LexicalType,
        language: &str,
        weight: f64,
    ) -> bool {
        let normalized = normalize_name(name);
        if normalized.is_empty() {
            return false;
        }
        let weight = weight.clamp(0.0, 1.0);
        let names = self.entries.entry(id).or_default();
        if let Some(existing) = names.iter_mut().find(|e| e.name == normalized) {
            if existing.weight >= weight {
                return false;
            }
            existing.weight = weight;
            existing.kind = kind;
            existing.language = language.to_string();
            return true;
        }
        names.push(LexicalEntry {
            name: normalized.clone(),
            kind,
            language: language.to_string(),
            weight,
        });
        self.by_name.entry(normalized).or_default().insert(id);
        true
    }

    /// All names of an entity, in insertion order.
    pub fn entries(&self, id: EntityId) -> &[LexicalEntry] {
        self.entries.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Names of an entity usable under a language setting.
    ///
    /// With `Some(lang)`, only names tagged `lang` or carrying no tag are
    /// returned.
    pub fn entries_in<'a>(
        &'a self,
        id: EntityId,
        language: Option<&'a str>,
    ) -> impl Iterator<Item = &'a LexicalEntry> + 'a {
        self.entries(id).iter().filter(move |e| match language {
            Some(lang) => e.language.is_empty() || e.language == lang,
            None => true,
        })
    }

    /// Normalized names of an entity.
    pub fn names(&self, id: EntityId) -> impl Iterator<Item = &str> {
        self.entries(id).iter().map(|e| e.name.as_str())
    }

    /// Entities carrying an already-normalized name, in ascending id order.
    pub fn entities_named(&self, name: &str) -> impl Iterator<Item = EntityId> + '_ {
        self.by_name.get(name).into_iter().flatten().copied()
    }

    /// Whether the entity carries the normalized name.
    pub fn contains_name(&self, id: EntityId, name: &str) -> bool {
        self.entries(id).iter().any(|e| e.name == name)
    }

    /// Base weight of a name on an entity.
    pub fn weight(&self, id: EntityId, name: &str) -> Option<f64> {
        self.entries(id)
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.weight)
    }

    /// Weight corrected for provenance crowding.
    ///
    /// Every other name of the same provenance on the entity costs 0.01, so
    /// that entities with long synonym lists do not dominate exact matches.
    /// Returns 0.0 for names the entity does not carry.
    pub fn corrected_weight(&self, id: EntityId, name: &str) -> f64 {
        let entries = self.entries(id);
        let Some(entry) = entries.iter().find(|e| e.name == name) else {
            return 0.0;
        };
        let crowding = entries.iter().filter(|e| e.kind == entry.kind).count() - 1;
        (entry.weight - 0.01 * crowding as f64).max(0.0)
    }

    /// Highest-weight name of an entity (first one on ties).
    pub fn best_name(&self, id: EntityId) -> Option<&str> {
        let mut best: Option<&LexicalEntry> = None;
        for entry in self.entries(id) {
            if best.is_none_or(|b| entry.weight > b.weight) {
                best = Some(entry);
            }
        }
        best.map(|e| e.name.as_str())
    }

    /// Whether the entity has at least one name usable under `language`.
    pub fn has_language(&self, id: EntityId, language: &str) -> bool {
        self.entries_in(id, Some(language)).next().is_some()
    }

    /// Distinct non-empty language tags in the lexicon.
    pub fn languages(&self) -> BTreeSet<&str> {
        self.entries
            .values()
            .flatten()
            .filter(|e| !e.language.is_empty())
            .map(|e| e.language.as_str())
            .collect()
    }

    /// Number of entities with at least one name.
    pub fn entity_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of (entity, name) entries.
    pub fn name_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Whether the lexicon holds no names.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
