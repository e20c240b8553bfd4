//! Entity hierarchy: subclass/subproperty graph over global entity ids.
//!
//! Edges point from a child to each of its direct parents. The graph is
//! built once by the ontology loader and is read-only for the duration of a
//! match run, so queries take `&self` and need no locking.
//!
//! Ancestor and descendant queries walk the graph breadth-first and report
//! the hop distance at which each relative was first reached, which is the
//! shortest subclass path between the two entities.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::entity::EntityId;

/// Read-only subsumption index over the entities of both knowledge bases.
#[derive(Debug, Clone, Default)]
pub struct EntityHierarchy {
    /// child → parent edges.
    graph: DiGraph<EntityId, ()>,
    /// EntityId → NodeIndex mapping for O(1) node lookups.
    nodes: HashMap<EntityId, NodeIndex>,
}

impl EntityHierarchy {
    /// Create an empty hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_node(&mut self, id: EntityId) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(&id) {
            return idx;
        }
        let idx = self.graph.add_node(id);
        self.nodes.insert(id, idx);
        idx
    }

    /// Record that `child` is a direct subclass (or subproperty) of `parent`.
    ///
    /// Returns `false` for self-loops and edges already present.
    pub fn add_subclass(&mut self, child: EntityId, parent: EntityId) -> bool {
        if child == parent {
            return false;
        }
        let c = self.ensure_node(child);
        let p = self.ensure_node(parent);
        if self.graph.find_edge(c, p).is_some() {
            return false;
        }
        self.graph.add_edge(c, p, ());
        true
    }

    fn neighbors(&self, id: EntityId, dir: Direction) -> Vec<EntityId> {
        let Some(&idx) = self.nodes.get(&id) else {
            return Vec::new();
        };
        let mut out: Vec<EntityId> = self
            .graph
            .neighbors_directed(idx, dir)
            .map(|n| self.graph[n])
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Direct parents, in ascending id order.
    pub fn parents(&self, id: EntityId) -> Vec<EntityId> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Direct children, in ascending id order.
    pub fn children(&self, id: EntityId) -> Vec<EntityId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// BFS from `id` in one direction, up to `max_depth` hops (`None` = unbounded).
    fn walk(&self, id: EntityId, dir: Direction, max_depth: Option<usize>) -> Vec<(EntityId, usize)> {
        let mut out = Vec::new();
        if !self.nodes.contains_key(&id) {
            return out;
        }
        let mut visited: HashSet<EntityId> = HashSet::from([id]);
        let mut queue: VecDeque<(EntityId, usize)> = VecDeque::from([(id, 0)]);

        while let Some((current, depth)) = queue.pop_front() {
            if max_depth.is_some_and(|max| depth >= max) {
                continue;
            }
            for next in self.neighbors(current, dir) {
                if visited.insert(next) {
                    out.push((next, depth + 1));
                    queue.push_back((next, depth + 1));
                }
            }
        }
        out
    }

    /// Ancestors of `id` with their distance, nearest first.
    pub fn ancestors(&self, id: EntityId, max_depth: Option<usize>) -> Vec<(EntityId, usize)> {
        self.walk(id, Direction::Outgoing, max_depth)
    }

    /// Descendants of `id` with their distance, nearest first.
    pub fn descendants(&self, id: EntityId, max_depth: Option<usize>) -> Vec<(EntityId, usize)> {
        self.walk(id, Direction::Incoming, max_depth)
    }

    /// Entities sharing at least one direct parent with `id`.
    pub fn siblings(&self, id: EntityId) -> Vec<EntityId> {
        let mut out: Vec<EntityId> = self
            .parents(id)
            .into_iter()
            .flat_map(|p| self.children(p))
            .filter(|&c| c != id)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Length of the shortest subclass path between two related entities.
    ///
    /// The path may run upwards from either end but never changes direction,
    /// so siblings are unrelated (`None`). An entity is at distance 0 from
    /// itself.
    pub fn distance(&self, a: EntityId, b: EntityId) -> Option<usize> {
        if a == b {
            return Some(0);
        }
        let up = |from: EntityId, to: EntityId| {
            self.ancestors(from, None)
                .into_iter()
                .find(|&(id, _)| id == to)
                .map(|(_, d)| d)
        };
        up(a, b).or_else(|| up(b, a))
    }

    /// Whether `descendant` is a (transitive) subclass of `ancestor`.
    pub fn is_subclass_of(&self, descendant: EntityId, ancestor: EntityId) -> bool {
        descendant != ancestor
            && self
                .ancestors(descendant, None)
                .iter()
                .any(|&(id, _)| id == ancestor)
    }

    /// Whether the entity takes part in at least one subclass edge.
    pub fn contains(&self, id: EntityId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of direct subclass edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the hierarchy has no edges.
    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u32) -> EntityId {
        EntityId::new(raw)
    }

    /// ```text
    ///        1
    ///      /   \
    ///     2     3
    ///    / \     \
    ///   4   5     6
    ///   |
    ///   7
    /// ```
    fn tree() -> EntityHierarchy {
        let mut h = EntityHierarchy::new();
        h.add_subclass(id(2), id(1));
        h.add_subclass(id(3), id(1));
        h.add_subclass(id(4), id(2));
        h.add_subclass(id(5), id(2));
        h.add_subclass(id(6), id(3));
        h.add_subclass(id(7), id(4));
        h
    }

    #[test]
    fn direct_parents_and_children() {
        let h = tree();
        assert_eq!(h.parents(id(4)), vec![id(2)]);
        assert_eq!(h.children(id(2)), vec![id(4), id(5)]);
        assert!(h.parents(id(1)).is_empty());
        assert!(h.children(id(99)).is_empty());
    }

    #[test]
    fn duplicate_and_self_edges_are_ignored() {
        let mut h = tree();
        assert!(!h.add_subclass(id(2), id(1)));
        assert!(!h.add_subclass(id(8), id(8)));
        assert_eq!(h.edge_count(), 6);
    }

    #[test]
    fn ancestors_report_shortest_distance() {
        let h = tree();
        assert_eq!(h.ancestors(id(7), None), vec![(id(4), 1), (id(2), 2), (id(1), 3)]);
        assert_eq!(h.ancestors(id(7), Some(1)), vec![(id(4), 1)]);
    }

    #[test]
    fn descendants_breadth_first() {
        let h = tree();
        let d = h.descendants(id(1), None);
        assert_eq!(
            d,
            vec![(id(2), 1), (id(3), 1), (id(4), 2), (id(5), 2), (id(6), 2), (id(7), 3)]
        );
        assert_eq!(h.descendants(id(1), Some(1)).len(), 2);
    }

    #[test]
    fn diamond_takes_shortest_path() {
        let mut h = EntityHierarchy::new();
        h.add_subclass(id(2), id(1));
        h.add_subclass(id(3), id(2));
        h.add_subclass(id(3), id(1));
        assert_eq!(h.distance(id(3), id(1)), Some(1));
    }

    #[test]
    fn siblings_share_a_parent() {
        let h = tree();
        assert_eq!(h.siblings(id(4)), vec![id(5)]);
        assert_eq!(h.siblings(id(2)), vec![id(3)]);
        assert!(h.siblings(id(1)).is_empty());
    }

    #[test]
    fn distance_in_either_direction() {
        let h = tree();
        assert_eq!(h.distance(id(7), id(1)), Some(3));
        assert_eq!(h.distance(id(1), id(7)), Some(3));
        assert_eq!(h.distance(id(4), id(4)), Some(0));
        assert_eq!(h.distance(id(4), id(5)), None);
        assert!(h.is_subclass_of(id(7), id(2)));
        assert!(!h.is_subclass_of(id(2), id(7)));
    }
}
