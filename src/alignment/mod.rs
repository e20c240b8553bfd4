//! Indexed mapping set.
//!
//! An [`Alignment`] owns a dense vector of [`Mapping`]s in insertion order
//! plus two indices (source → target → slot, target → source → slot). The
//! indices store slots into the vector, so an update made through either
//! lookup path is the same update.
//!
//! Alignments are built by one owning thread. Parallel stages produce
//! private alignments that are merged single-threaded.

pub mod io;
pub mod mapping;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::entity::{EntityId, Partition};

pub use mapping::{Mapping, MappingStatus, RelationKind, round_similarity};

type SlotIndex = HashMap<EntityId, BTreeMap<EntityId, usize>>;

/// Deduplicated set of mappings with bidirectional lookup.
#[derive(Debug, Clone, Default)]
pub struct Alignment {
    mappings: Vec<Mapping>,
    /// source → target → slot
    by_source: SlotIndex,
    /// target → source → slot
    by_target: SlotIndex,
    /// `None` for internal alignments, which skip the direction check.
    partition: Option<Arc<Partition>>,
}

impl Alignment {
    /// Empty alignment that rejects pairs pointing the wrong way.
    pub fn new(partition: Arc<Partition>) -> Self {
        Self {
            partition: Some(partition),
            ..Default::default()
        }
    }

    /// Empty alignment with no direction check.
    pub fn internal() -> Self {
        Self::default()
    }

    /// Empty alignment sharing this one's partition.
    pub fn empty_like(&self) -> Self {
        Self {
            partition: self.partition.clone(),
            ..Default::default()
        }
    }

    /// Build from a collection of mappings under an optional partition.
    pub fn from_mappings(
        partition: Option<Arc<Partition>>,
        mappings: impl IntoIterator<Item = Mapping>,
    ) -> Self {
        let mut out = Self {
            partition,
            ..Default::default()
        };
        for m in mappings {
            out.add_mapping(m);
        }
        out
    }

    pub fn is_internal(&self) -> bool {
        self.partition.is_none()
    }

    pub fn partition(&self) -> Option<&Arc<Partition>> {
        self.partition.as_ref()
    }

    // -----------------------------------------------------------------------
    // Insertion
    // -----------------------------------------------------------------------

    /// Add an equivalence mapping with unknown status.
    pub fn add(&mut self, source: EntityId, target: EntityId, similarity: f64) -> bool {
        self.add_mapping(Mapping::new(source, target, similarity))
    }

    /// Add a mapping with explicit relation and status.
    pub fn add_full(
        &mut self,
        source: EntityId,
        target: EntityId,
        similarity: f64,
        relation: RelationKind,
        status: MappingStatus,
    ) -> bool {
        let m = Mapping::with_relation(source, target, similarity, relation).with_status(status);
        self.add_mapping(m)
    }

    /// Insert or update a mapping.
    ///
    /// An existing pair keeps the higher similarity, takes the new relation
    /// and takes the new status unless it is `Unknown`. Returns whether the
    /// alignment changed. Pairs rejected by the partition return `false`.
    pub fn add_mapping(&mut self, m: Mapping) -> bool {
        if self
            .partition
            .as_ref()
            .is_some_and(|p| !p.admits(m.source, m.target))
        {
            return false;
        }

        if let Some(slot) = self.slot(m.source, m.target) {
            let existing = &mut self.mappings[slot];
            let mut changed = false;
            if m.similarity() > existing.similarity() {
                existing.set_similarity(m.similarity());
                changed = true;
            }
            if existing.relation != m.relation {
                existing.relation = m.relation;
                changed = true;
            }
            if m.status != MappingStatus::Unknown && existing.status != m.status {
                existing.status = m.status;
                changed = true;
            }
            return changed;
        }

        let slot = self.mappings.len();
        self.mappings.push(m);
        self.by_source.entry(m.source).or_default().insert(m.target, slot);
        self.by_target.entry(m.target).or_default().insert(m.source, slot);
        true
    }

    /// Add every mapping of `other`. Returns how many changed this alignment.
    pub fn add_all(&mut self, other: &Alignment) -> usize {
        other.iter().filter(|m| self.add_mapping(**m)).count()
    }

    /// Add the mappings of `other` that do not conflict with this alignment.
    ///
    /// Conflicts are checked against the alignment as it grows, so of two
    /// conflicting mappings in `other` only the first one is added.
    pub fn add_all_one_to_one(&mut self, other: &Alignment) -> usize {
        let mut added = 0;
        for m in other.iter() {
            if !self.contains_conflict(m.source, m.target) && self.add_mapping(*m) {
                added += 1;
            }
        }
        added
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    fn slot(&self, source: EntityId, target: EntityId) -> Option<usize> {
        self.by_source.get(&source)?.get(&target).copied()
    }

    pub fn contains(&self, source: EntityId, target: EntityId) -> bool {
        self.slot(source, target).is_some()
    }

    pub fn contains_source(&self, source: EntityId) -> bool {
        self.by_source.contains_key(&source)
    }

    pub fn contains_target(&self, target: EntityId) -> bool {
        self.by_target.contains_key(&target)
    }

    /// Whether the id appears on either side of any mapping.
    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.contains_source(id) || self.contains_target(id)
    }

    /// Whether `source` or `target` is already mapped to something else.
    pub fn contains_conflict(&self, source: EntityId, target: EntityId) -> bool {
        let other_target = self
            .by_source
            .get(&source)
            .is_some_and(|ts| ts.keys().any(|&t| t != target));
        let other_source = self
            .by_target
            .get(&target)
            .is_some_and(|ss| ss.keys().any(|&s| s != source));
        other_target || other_source
    }

    /// Mappings sharing exactly one entity with `(source, target)`.
    pub fn conflicts(&self, source: EntityId, target: EntityId) -> Vec<&Mapping> {
        let mut slots: BTreeSet<usize> = BTreeSet::new();
        if let Some(ts) = self.by_source.get(&source) {
            slots.extend(ts.iter().filter(|&(&t, _)| t != target).map(|(_, &i)| i));
        }
        if let Some(ss) = self.by_target.get(&target) {
            slots.extend(ss.iter().filter(|&(&s, _)| s != source).map(|(_, &i)| i));
        }
        slots.into_iter().map(|i| &self.mappings[i]).collect()
    }

    /// Whether a mapping sharing an entity with `m` has strictly higher similarity.
    pub fn contains_better_mapping(&self, m: &Mapping) -> bool {
        self.conflicts(m.source, m.target)
            .into_iter()
            .any(|other| other.is_better_than(m))
    }

    pub fn get(&self, source: EntityId, target: EntityId) -> Option<&Mapping> {
        self.slot(source, target).map(|i| &self.mappings[i])
    }

    /// Similarity of a pair, 0.0 when absent.
    pub fn similarity(&self, source: EntityId, target: EntityId) -> f64 {
        self.get(source, target).map_or(0.0, Mapping::similarity)
    }

    /// Targets mapped from `source`, in ascending id order.
    pub fn source_mappings(&self, source: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.by_source.get(&source).into_iter().flat_map(|ts| ts.keys().copied())
    }

    /// Sources mapped to `target`, in ascending id order.
    pub fn target_mappings(&self, target: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.by_target.get(&target).into_iter().flat_map(|ss| ss.keys().copied())
    }

    /// Highest-similarity mapping of a source entity (lowest target id on ties).
    pub fn best_for_source(&self, source: EntityId) -> Option<&Mapping> {
        let ts = self.by_source.get(&source)?;
        let mut best: Option<&Mapping> = None;
        for &slot in ts.values() {
            let m = &self.mappings[slot];
            if best.is_none_or(|b| m.is_better_than(b)) {
                best = Some(m);
            }
        }
        best
    }

    /// Mapping at an insertion slot.
    pub fn mapping(&self, slot: usize) -> Option<&Mapping> {
        self.mappings.get(slot)
    }

    // -----------------------------------------------------------------------
    // Payload updates
    // -----------------------------------------------------------------------

    /// Overwrite the similarity of an existing pair.
    pub fn set_similarity(&mut self, source: EntityId, target: EntityId, similarity: f64) -> bool {
        match self.slot(source, target) {
            Some(i) => {
                self.mappings[i].set_similarity(similarity);
                true
            }
            None => false,
        }
    }

    pub fn set_status(&mut self, source: EntityId, target: EntityId, status: MappingStatus) -> bool {
        match self.slot(source, target) {
            Some(i) => {
                self.mappings[i].status = status;
                true
            }
            None => false,
        }
    }

    pub fn set_relation(
        &mut self,
        source: EntityId,
        target: EntityId,
        relation: RelationKind,
    ) -> bool {
        match self.slot(source, target) {
            Some(i) => {
                self.mappings[i].relation = relation;
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Removal
    // -----------------------------------------------------------------------

    fn reindex(&mut self) {
        self.by_source.clear();
        self.by_target.clear();
        for (slot, m) in self.mappings.iter().enumerate() {
            self.by_source.entry(m.source).or_default().insert(m.target, slot);
            self.by_target.entry(m.target).or_default().insert(m.source, slot);
        }
    }

    fn unlink(index: &mut SlotIndex, key: EntityId, other: EntityId) {
        if let Some(inner) = index.get_mut(&key) {
            inner.remove(&other);
            if inner.is_empty() {
                index.remove(&key);
            }
        }
    }

    fn set_slot(&mut self, slot: usize) {
        let (source, target) = (self.mappings[slot].source, self.mappings[slot].target);
        if let Some(s) = self.by_source.get_mut(&source).and_then(|ts| ts.get_mut(&target)) {
            *s = slot;
        }
        if let Some(s) = self.by_target.get_mut(&target).and_then(|ss| ss.get_mut(&source)) {
            *s = slot;
        }
    }

    /// Remove a pair, preserving the order of the remaining mappings.
    ///
    /// Only the mappings after the removed slot have their index entries
    /// shifted; the indices are not rebuilt.
    pub fn remove(&mut self, source: EntityId, target: EntityId) -> Option<Mapping> {
        let slot = self.slot(source, target)?;
        Self::unlink(&mut self.by_source, source, target);
        Self::unlink(&mut self.by_target, target, source);
        let removed = self.mappings.remove(slot);
        for shifted in slot..self.mappings.len() {
            self.set_slot(shifted);
        }
        Some(removed)
    }

    /// Keep only the mappings matching the predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(&Mapping) -> bool) -> usize {
        let before = self.mappings.len();
        self.mappings.retain(|m| keep(m));
        let removed = before - self.mappings.len();
        if removed > 0 {
            self.reindex();
        }
        removed
    }

    // -----------------------------------------------------------------------
    // Cardinality and set algebra
    // -----------------------------------------------------------------------

    /// Number of mappings the entity takes part in, on either side.
    pub fn cardinality_of(&self, id: EntityId) -> usize {
        self.by_source.get(&id).map_or(0, BTreeMap::len)
            + self.by_target.get(&id).map_or(0, BTreeMap::len)
    }

    /// Mean per-entity cardinality over every mapped entity (0 when empty).
    pub fn cardinality(&self) -> f64 {
        let entities = self.by_source.len() + self.by_target.len();
        if entities == 0 {
            return 0.0;
        }
        2.0 * self.mappings.len() as f64 / entities as f64
    }

    pub fn max_source_cardinality(&self) -> usize {
        self.by_source.values().map(BTreeMap::len).max().unwrap_or(0)
    }

    pub fn max_target_cardinality(&self) -> usize {
        self.by_target.values().map(BTreeMap::len).max().unwrap_or(0)
    }

    /// Fraction of this alignment's mappings absent from `other`.
    pub fn gain(&self, other: &Alignment) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let new = self
            .iter()
            .filter(|m| !other.contains(m.source, m.target))
            .count();
        new as f64 / self.len() as f64
    }

    /// Fraction of mappings absent from `other` that also do not conflict with it.
    pub fn gain_one_to_one(&self, other: &Alignment) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let new = self
            .iter()
            .filter(|m| {
                !other.contains(m.source, m.target) && !other.contains_conflict(m.source, m.target)
            })
            .count();
        new as f64 / self.len() as f64
    }

    /// Mappings of this alignment absent from `other`.
    pub fn difference(&self, other: &Alignment) -> Alignment {
        let kept = self
            .iter()
            .filter(|m| !other.contains(m.source, m.target))
            .copied();
        Self::from_mappings(self.partition.clone(), kept)
    }

    /// Mappings of this alignment also present in `other` (payload from `self`).
    pub fn intersection(&self, other: &Alignment) -> Alignment {
        let kept = self
            .iter()
            .filter(|m| other.contains(m.source, m.target))
            .copied();
        Self::from_mappings(self.partition.clone(), kept)
    }

    /// Stable sort by similarity, lowest first.
    pub fn sort_ascending(&mut self) {
        self.mappings
            .sort_by(|a, b| a.similarity().total_cmp(&b.similarity()));
        self.reindex();
    }

    /// Stable sort by similarity, highest first. Ties keep insertion order.
    pub fn sort_descending(&mut self) {
        self.mappings
            .sort_by(|a, b| b.similarity().total_cmp(&a.similarity()));
        self.reindex();
    }

    // -----------------------------------------------------------------------
    // Iteration
    // -----------------------------------------------------------------------

    pub fn iter(&self) -> std::slice::Iter<'_, Mapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Mapped source ids, ascending.
    pub fn sources(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.by_source.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Mapped target ids, ascending.
    pub fn targets(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.by_target.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl<'a> IntoIterator for &'a Alignment {
    type Item = &'a Mapping;
    type IntoIter = std::slice::Iter<'a, Mapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.mappings.iter()
    }
}

impl FromIterator<Mapping> for Alignment {
    /// Collects into an internal alignment.
    fn from_iter<I: IntoIterator<Item = Mapping>>(iter: I) -> Self {
        Self::from_mappings(None, iter)
    }
}
