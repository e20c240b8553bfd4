//! Matching through external background knowledge.
//!
//! A [`BackgroundKnowledge`] source maps a name to names it considers
//! equivalent (a thesaurus, a mediating ontology, a translation table). The
//! [`MediatingMatcher`] expands every source name through it and joins the
//! expansions against the target lexicon.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use csv::ReaderBuilder;

use crate::alignment::Alignment;
use crate::context::MatchContext;
use crate::entity::{EntityId, EntityType};
use crate::error::{FormatError, FormatResult};
use crate::ontology::normalize_name;

use super::{Candidates, Scorer, SupportsExtend, admissible};

/// A source of name equivalences.
pub trait BackgroundKnowledge: Sync {
    /// Short name for logs and stage reports.
    fn name(&self) -> &str;

    /// Names equivalent to `name`, normalized, excluding `name` itself.
    fn synonyms(&self, name: &str) -> Vec<String>;

    /// How far a mediated match is trusted relative to a direct one.
    fn confidence(&self) -> f64 {
        0.9
    }
}

impl<K: BackgroundKnowledge + ?Sized> BackgroundKnowledge for &K {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn synonyms(&self, name: &str) -> Vec<String> {
        (**self).synonyms(name)
    }

    fn confidence(&self) -> f64 {
        (**self).confidence()
    }
}

impl<K: BackgroundKnowledge + ?Sized> BackgroundKnowledge for Box<K> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn synonyms(&self, name: &str) -> Vec<String> {
        (**self).synonyms(name)
    }

    fn confidence(&self) -> f64 {
        (**self).confidence()
    }
}

/// In-memory symmetric synonym table.
#[derive(Debug, Clone)]
pub struct SynonymTable {
    name: String,
    confidence: f64,
    synonyms: HashMap<String, BTreeSet<String>>,
}

impl SynonymTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            confidence: 0.9,
            synonyms: HashMap::new(),
        }
    }

    /// Override the default confidence of 0.9. Values are clamped to [0, 1].
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Record `a` and `b` as synonyms of each other.
    pub fn add(&mut self, a: &str, b: &str) {
        let (a, b) = (normalize_name(a), normalize_name(b));
        if a.is_empty() || b.is_empty() || a == b {
            return;
        }
        self.synonyms.entry(a.clone()).or_default().insert(b.clone());
        self.synonyms.entry(b).or_default().insert(a);
    }

    /// Record every member of a group as a synonym of every other.
    pub fn add_group<'a>(&mut self, group: impl IntoIterator<Item = &'a str>) {
        let members: Vec<&str> = group.into_iter().collect();
        for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                self.add(a, b);
            }
        }
    }

    /// Load a tab-separated file with one synonym group per line.
    ///
    /// Lines starting with `#` are comments. The table is named after the
    /// file stem.
    pub fn load(path: &Path) -> FormatResult<Self> {
        let file = std::fs::File::open(path).map_err(|e| FormatError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "synonyms".to_string());

        let mut table = Self::new(name);
        let mut rows = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .comment(Some(b'#'))
            .from_reader(file);
        for record in rows.records() {
            let record = record.map_err(|e| FormatError::Csv {
                message: e.to_string(),
            })?;
            table.add_group(record.iter());
        }
        tracing::debug!(table = %table.name, terms = table.len(), "loaded synonym table");
        Ok(table)
    }

    /// Number of terms with at least one synonym.
    pub fn len(&self) -> usize {
        self.synonyms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.synonyms.is_empty()
    }
}

impl BackgroundKnowledge for SynonymTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn synonyms(&self, name: &str) -> Vec<String> {
        self.synonyms
            .get(&normalize_name(name))
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// Lexical matching with source names expanded through background knowledge.
///
/// A pair scores `min(w_source, w_target) · confidence` for the best source
/// name whose expansion hits a target name.
#[derive(Debug, Clone)]
pub struct MediatingMatcher<K> {
    knowledge: K,
}

impl<K: BackgroundKnowledge> MediatingMatcher<K> {
    pub fn new(knowledge: K) -> Self {
        Self { knowledge }
    }

    pub fn knowledge(&self) -> &K {
        &self.knowledge
    }

    fn join(&self, ctx: &MatchContext, kind: EntityType, base: Option<&Alignment>) -> Candidates {
        let language = ctx.config().language.as_deref();
        let source = ctx.source();
        let target = ctx.target();
        let mut out = Candidates::new();
        for s in source.entities_of(kind) {
            if base.is_some_and(|a| a.contains_source(s)) {
                continue;
            }
            for entry in source.lexicon().entries_in(s, language) {
                for synonym in self.knowledge.synonyms(&entry.name) {
                    for t in target.lexicon().entities_named(&synonym) {
                        if target.type_of(t) != Some(kind) || !admissible(ctx, s, t) {
                            continue;
                        }
                        if base.is_some_and(|a| a.contains_target(t)) {
                            continue;
                        }
                        out.insert(s, t);
                    }
                }
            }
        }
        out
    }
}

impl<K: BackgroundKnowledge> Scorer for MediatingMatcher<K> {
    fn score(&self, ctx: &MatchContext, source: EntityId, target: EntityId) -> f64 {
        let language = ctx.config().language.as_deref();
        let source_lex = ctx.source().lexicon();
        let target_lex = ctx.target().lexicon();
        let mut best: f64 = 0.0;
        for entry in source_lex.entries_in(source, language) {
            let ws = source_lex.corrected_weight(source, &entry.name);
            for synonym in self.knowledge.synonyms(&entry.name) {
                let hit = target_lex
                    .entries_in(target, language)
                    .any(|e| e.name == synonym);
                if hit {
                    let wt = target_lex.corrected_weight(target, &synonym);
                    best = best.max(ws.min(wt));
                }
            }
        }
        best * self.knowledge.confidence()
    }

    fn name(&self) -> &str {
        self.knowledge.name()
    }

    fn candidates(&self, ctx: &MatchContext, kind: EntityType) -> Candidates {
        self.join(ctx, kind, None)
    }
}

impl<K: BackgroundKnowledge> SupportsExtend for MediatingMatcher<K> {
    fn extension_candidates(
        &self,
        ctx: &MatchContext,
        kind: EntityType,
        base: &Alignment,
    ) -> Candidates {
        self.join(ctx, kind, Some(base))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::config::MatchConfig;
    use crate::matcher::MatchEngine;
    use crate::matcher::test_support::labelled;

    fn id(raw: u32) -> EntityId {
        EntityId::new(raw)
    }

    fn cardiology() -> SynonymTable {
        let mut table = SynonymTable::new("cardio");
        table.add("Heart", "cardiac organ");
        table
    }

    #[test]
    fn table_is_symmetric_and_normalized() {
        let table = cardiology();
        assert_eq!(table.synonyms("heart"), vec!["cardiac organ".to_string()]);
        assert_eq!(table.synonyms("Cardiac_Organ"), vec!["heart".to_string()]);
        assert!(table.synonyms("lung").is_empty());
    }

    #[test]
    fn mediated_match_is_discounted() {
        let ctx = labelled(&[(1, "Heart"), (2, "Lung")], &[(10, "Cardiac Organ"), (11, "Lung")]);
        let engine = MatchEngine::new(&MatchConfig::default()).unwrap();
        let out = engine
            .match_entities(&ctx, &MediatingMatcher::new(cardiology()), EntityType::Class, 0.5)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert!((out.similarity(id(1), id(10)) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn load_groups_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# anatomy").unwrap();
        writeln!(file, "kidney\tren\tnephros").unwrap();
        writeln!(file, "liver\thepar").unwrap();
        let table = SynonymTable::load(file.path()).unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(
            table.synonyms("nephros"),
            vec!["kidney".to_string(), "ren".to_string()]
        );
    }

    #[test]
    fn boxed_knowledge_delegates() {
        let boxed: Box<dyn BackgroundKnowledge> = Box::new(cardiology().with_confidence(0.8));
        let m = MediatingMatcher::new(boxed.as_ref());
        assert_eq!(m.name(), "cardio");
        assert_eq!(m.knowledge().confidence(), 0.8);
    }
}
