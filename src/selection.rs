//! Cardinality-constrained selection and final repair.
//!
//! Every policy shares one greedy scan: mappings are visited by descending
//! similarity (ties in insertion order), the scan stops at the first
//! mapping below the threshold, and each mapping is accepted or skipped by
//! checking it against what has been accepted so far. Accepted mappings are
//! copied into a new alignment.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::alignment::{Alignment, Mapping, MappingStatus};

/// Cardinality policy of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionType {
    /// No entity in more than one mapping.
    StrictOneToOne,
    /// An entity may keep several mappings only when none is beaten by a
    /// conflicting one.
    PermissiveOneToOne,
    /// Everything above the threshold.
    ManyToMany,
    /// No entity in more than `k` mappings.
    Bounded(usize),
}

impl SelectionType {
    /// Policy suited to an alignment of the given cardinality.
    pub fn from_cardinality(cardinality: f64) -> Self {
        if cardinality > 1.4 {
            SelectionType::ManyToMany
        } else if cardinality > 1.02 {
            SelectionType::PermissiveOneToOne
        } else {
            SelectionType::StrictOneToOne
        }
    }

    /// Policy suited to an alignment, from its observed cardinality.
    pub fn detect(alignment: &Alignment) -> Self {
        Self::from_cardinality(alignment.cardinality())
    }

    /// The policy repair runs under.
    pub fn strict_counterpart(self) -> Self {
        match self {
            SelectionType::PermissiveOneToOne => SelectionType::StrictOneToOne,
            other => other,
        }
    }

    /// Whether `m` may join `accepted` under this policy.
    fn accepts(self, accepted: &Alignment, m: &Mapping) -> bool {
        match self {
            SelectionType::ManyToMany => true,
            SelectionType::StrictOneToOne => {
                !accepted.contains_source(m.source) && !accepted.contains_target(m.target)
            }
            SelectionType::PermissiveOneToOne => !accepted.contains_better_mapping(m),
            SelectionType::Bounded(k) => {
                accepted.source_mappings(m.source).count() < k
                    && accepted.target_mappings(m.target).count() < k
            }
        }
    }
}

impl fmt::Display for SelectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionType::StrictOneToOne => write!(f, "strict 1:1"),
            SelectionType::PermissiveOneToOne => write!(f, "permissive 1:1"),
            SelectionType::ManyToMany => write!(f, "n:m"),
            SelectionType::Bounded(k) => write!(f, "bounded {k}"),
        }
    }
}

fn greedy<'a>(
    template: &Alignment,
    ranked: impl IntoIterator<Item = &'a Mapping>,
    policy: SelectionType,
    threshold: f64,
) -> Alignment {
    let mut accepted = template.empty_like();
    for m in ranked {
        if m.similarity() < threshold {
            break;
        }
        if policy.accepts(&accepted, m) {
            accepted.add_mapping(*m);
        }
    }
    accepted
}

/// Reduce `alignment` to the mappings accepted under `policy` at `threshold`.
pub fn select(alignment: &Alignment, policy: SelectionType, threshold: f64) -> Alignment {
    let mut ranked: Vec<&Mapping> = alignment.iter().collect();
    ranked.sort_by(|a, b| b.similarity().total_cmp(&a.similarity()));
    let out = greedy(alignment, ranked, policy, threshold);
    tracing::info!(
        %policy,
        threshold,
        before = alignment.len(),
        kept = out.len(),
        "selection"
    );
    out
}

/// Remove whatever cardinality violations remain after selection.
///
/// `Incorrect` mappings are dropped, `Correct` ones take precedence over the
/// rest, and the greedy scan is re-run at threshold 0 under the policy's
/// strict counterpart.
pub fn repair(alignment: &Alignment, policy: SelectionType) -> Alignment {
    let mut ranked: Vec<&Mapping> = alignment
        .iter()
        .filter(|m| m.status != MappingStatus::Incorrect)
        .collect();
    ranked.sort_by(|a, b| b.rank_cmp(a));
    let strict = policy.strict_counterpart();
    let out = greedy(alignment, ranked, strict, 0.0);
    tracing::info!(
        policy = %strict,
        before = alignment.len(),
        kept = out.len(),
        "repair"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityId;

    fn id(raw: u32) -> EntityId {
        EntityId::new(raw)
    }

    /// 1→10 0.9, 1→11 0.8, 2→10 0.8, 2→11 0.7, 3→12 0.4
    fn noisy() -> Alignment {
        let mut a = Alignment::internal();
        a.add(id(1), id(10), 0.9);
        a.add(id(1), id(11), 0.8);
        a.add(id(2), id(10), 0.8);
        a.add(id(2), id(11), 0.7);
        a.add(id(3), id(12), 0.4);
        a
    }

    fn pairs(a: &Alignment) -> Vec<(u32, u32)> {
        a.iter().map(|m| (m.source.get(), m.target.get())).collect()
    }

    #[test]
    fn policy_from_cardinality() {
        assert_eq!(SelectionType::from_cardinality(1.0), SelectionType::StrictOneToOne);
        assert_eq!(SelectionType::from_cardinality(1.02), SelectionType::StrictOneToOne);
        assert_eq!(SelectionType::from_cardinality(1.2), SelectionType::PermissiveOneToOne);
        assert_eq!(SelectionType::from_cardinality(1.5), SelectionType::ManyToMany);
    }

    #[test]
    fn strict_takes_the_best_and_stops_at_threshold() {
        let out = select(&noisy(), SelectionType::StrictOneToOne, 0.5);
        assert_eq!(pairs(&out), vec![(1, 10), (2, 11)]);
    }

    #[test]
    fn permissive_keeps_ties_only() {
        let mut a = Alignment::internal();
        a.add(id(1), id(10), 0.9);
        a.add(id(1), id(11), 0.9);
        a.add(id(2), id(11), 0.8);
        let out = select(&a, SelectionType::PermissiveOneToOne, 0.0);
        assert_eq!(pairs(&out), vec![(1, 10), (1, 11)]);
    }

    #[test]
    fn bounded_and_many_to_many() {
        let two = select(&noisy(), SelectionType::Bounded(2), 0.5);
        assert_eq!(two.len(), 4);
        let one = select(&noisy(), SelectionType::Bounded(1), 0.5);
        assert_eq!(pairs(&one), vec![(1, 10), (2, 11)]);
        let all = select(&noisy(), SelectionType::ManyToMany, 0.0);
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn selection_copies_mappings() {
        let a = noisy();
        let mut out = select(&a, SelectionType::ManyToMany, 0.0);
        out.set_similarity(id(1), id(10), 0.1);
        assert_eq!(a.similarity(id(1), id(10)), 0.9);
    }

    #[test]
    fn repair_prefers_confirmed_and_drops_rejected() {
        let mut a = noisy();
        a.set_status(id(2), id(11), MappingStatus::Correct);
        a.set_status(id(1), id(10), MappingStatus::Incorrect);
        let out = repair(&a, SelectionType::PermissiveOneToOne);
        // 2→11 first; 1→10 is gone, so 1's best remaining is 1→11, which
        // conflicts with 2→11 on target 11; 2→10 conflicts on source 2.
        assert_eq!(pairs(&out), vec![(2, 11), (3, 12)]);
    }

    #[test]
    fn serde_forms() {
        #[derive(Serialize, Deserialize)]
        struct Wrap {
            selection: SelectionType,
        }
        let w: Wrap = toml::from_str("selection = { bounded = 3 }").unwrap();
        assert_eq!(w.selection, SelectionType::Bounded(3));
        let w: Wrap = toml::from_str("selection = \"permissive_one_to_one\"").unwrap();
        assert_eq!(w.selection, SelectionType::PermissiveOneToOne);
    }
}
