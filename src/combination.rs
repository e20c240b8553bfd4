//! Linear weighted combination of two alignments.

use crate::alignment::{Alignment, Mapping};
use crate::error::{MatchError, MatchResult};

/// Blend two similarity signals over the union of their pairs.
///
/// A pair of `a` scores `w·a + (1-w)·b`, with `b` taken as 0 when absent; a
/// pair only in `b` scores `(1-w)·b`. Relation and status come from `a`
/// when it has the pair. The result shares `a`'s partition.
pub fn combine(a: &Alignment, b: &Alignment, weight: f64) -> MatchResult<Alignment> {
    if !(0.0..=1.0).contains(&weight) {
        return Err(MatchError::InvalidWeight { weight });
    }

    let mut out = a.empty_like();
    for m in a {
        let blended = weight * m.similarity() + (1.0 - weight) * b.similarity(m.source, m.target);
        out.add_mapping(
            Mapping::with_relation(m.source, m.target, blended, m.relation).with_status(m.status),
        );
    }
    for m in b {
        if a.contains(m.source, m.target) {
            continue;
        }
        out.add_mapping(
            Mapping::with_relation(m.source, m.target, (1.0 - weight) * m.similarity(), m.relation)
                .with_status(m.status),
        );
    }
    tracing::debug!(
        weight,
        left = a.len(),
        right = b.len(),
        combined = out.len(),
        "linear weighted combination"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::{MappingStatus, RelationKind};
    use crate::entity::EntityId;

    fn id(raw: u32) -> EntityId {
        EntityId::new(raw)
    }

    #[test]
    fn blends_over_the_union() {
        let mut a = Alignment::internal();
        a.add(id(1), id(10), 0.8);
        a.add(id(2), id(11), 0.6);
        let mut b = Alignment::internal();
        b.add(id(1), id(10), 0.4);
        b.add(id(3), id(12), 1.0);

        let c = combine(&a, &b, 0.75).unwrap();
        assert_eq!(c.len(), 3);
        assert!((c.similarity(id(1), id(10)) - 0.7).abs() < 1e-9);
        assert!((c.similarity(id(2), id(11)) - 0.45).abs() < 1e-9);
        assert!((c.similarity(id(3), id(12)) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn payload_comes_from_the_left_side() {
        let mut a = Alignment::internal();
        a.add_full(id(1), id(10), 0.8, RelationKind::TargetSubsumesSource, MappingStatus::Correct);
        let mut b = Alignment::internal();
        b.add_full(id(1), id(10), 0.4, RelationKind::Overlap, MappingStatus::Incorrect);
        b.add_full(id(2), id(11), 0.4, RelationKind::Overlap, MappingStatus::Incorrect);

        let c = combine(&a, &b, 0.5).unwrap();
        let m = c.get(id(1), id(10)).unwrap();
        assert_eq!(m.relation, RelationKind::TargetSubsumesSource);
        assert_eq!(m.status, MappingStatus::Correct);
        assert_eq!(c.get(id(2), id(11)).unwrap().relation, RelationKind::Overlap);
    }

    #[test]
    fn rejects_weight_outside_unit_interval() {
        let a = Alignment::internal();
        assert!(matches!(
            combine(&a, &a, 1.5),
            Err(MatchError::InvalidWeight { .. })
        ));
        assert!(combine(&a, &a, 0.0).is_ok());
    }
}
