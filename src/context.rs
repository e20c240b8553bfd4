//! Match context: the two knowledge bases, their hierarchy and the settings
//! of one run, passed by reference to every matcher.

use std::path::Path;
use std::sync::Arc;

use crate::alignment::Alignment;
use crate::config::MatchConfig;
use crate::entity::{EntityId, EntityType, Partition, Side};
use crate::error::OntoResult;
use crate::ontology::{EntityHierarchy, Ontology, OntologySnapshot};

/// Immutable inputs of a match run.
#[derive(Debug)]
pub struct MatchContext {
    source: Ontology,
    target: Ontology,
    hierarchy: EntityHierarchy,
    partition: Arc<Partition>,
    config: MatchConfig,
}

impl MatchContext {
    /// Assemble a context from already-loaded tables.
    pub fn new(
        source: Ontology,
        target: Ontology,
        hierarchy: EntityHierarchy,
        config: MatchConfig,
    ) -> Self {
        let partition = Arc::new(Partition::new(source.entity_ids(), target.entity_ids()));
        Self {
            source,
            target,
            hierarchy,
            partition,
            config,
        }
    }

    /// Build a context from two loader snapshots.
    pub fn from_snapshots(
        source: OntologySnapshot,
        target: OntologySnapshot,
        config: MatchConfig,
    ) -> OntoResult<Self> {
        config.validate()?;
        let mut hierarchy = EntityHierarchy::new();
        let source = source.into_ontology(&mut hierarchy)?;
        let target = target.into_ontology(&mut hierarchy)?;
        tracing::info!(
            source_uri = source.uri(),
            source_entities = source.len(),
            target_uri = target.uri(),
            target_entities = target.len(),
            subclass_edges = hierarchy.edge_count(),
            "loaded knowledge bases"
        );
        Ok(Self::new(source, target, hierarchy, config))
    }

    /// Load both snapshot files and an optional TOML config.
    pub fn load(source: &Path, target: &Path, config: Option<&Path>) -> OntoResult<Self> {
        let config = match config {
            Some(path) => MatchConfig::load(path)?,
            None => MatchConfig::default(),
        };
        Self::from_snapshots(
            OntologySnapshot::load(source)?,
            OntologySnapshot::load(target)?,
            config,
        )
    }

    pub fn source(&self) -> &Ontology {
        &self.source
    }

    pub fn target(&self) -> &Ontology {
        &self.target
    }

    /// The knowledge base on one side.
    pub fn side(&self, side: Side) -> &Ontology {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }

    pub fn hierarchy(&self) -> &EntityHierarchy {
        &self.hierarchy
    }

    pub fn partition(&self) -> &Arc<Partition> {
        &self.partition
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Empty alignment bound to this run's partition.
    pub fn new_alignment(&self) -> Alignment {
        Alignment::new(Arc::clone(&self.partition))
    }

    /// Type of an entity on either side.
    pub fn type_of(&self, id: EntityId) -> Option<EntityType> {
        self.source.type_of(id).or_else(|| self.target.type_of(id))
    }

    /// URI of an entity on either side.
    pub fn uri_of(&self, id: EntityId) -> Option<&str> {
        self.source.uri_of(id).or_else(|| self.target.uri_of(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::EntitySnapshot;

    fn snapshots() -> (OntologySnapshot, OntologySnapshot) {
        let mut source = OntologySnapshot::new("http://src");
        source.entities.push(EntitySnapshot::new(1, "http://src#Heart", EntityType::Class));
        let mut target = OntologySnapshot::new("http://tgt");
        target.entities.push(EntitySnapshot::new(10, "http://tgt#Heart", EntityType::Class));
        (source, target)
    }

    #[test]
    fn alignments_are_bound_to_the_partition() {
        let (s, t) = snapshots();
        let ctx = MatchContext::from_snapshots(s, t, MatchConfig::default()).unwrap();
        let mut a = ctx.new_alignment();
        assert!(!a.add(EntityId::new(10), EntityId::new(1), 1.0));
        assert!(a.add(EntityId::new(1), EntityId::new(10), 1.0));
    }

    #[test]
    fn lookups_cover_both_sides() {
        let (s, t) = snapshots();
        let ctx = MatchContext::from_snapshots(s, t, MatchConfig::default()).unwrap();
        assert_eq!(ctx.uri_of(EntityId::new(10)), Some("http://tgt#Heart"));
        assert_eq!(ctx.type_of(EntityId::new(1)), Some(EntityType::Class));
        assert_eq!(ctx.side(Side::Target).uri(), "http://tgt");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let (s, t) = snapshots();
        let config = MatchConfig {
            threshold: -0.1,
            ..Default::default()
        };
        assert!(MatchContext::from_snapshots(s, t, config).is_err());
    }
}
