//! Property matching constrained by the class alignment.

use std::collections::BTreeSet;

use crate::alignment::Alignment;
use crate::context::MatchContext;
use crate::entity::{EntityId, EntityType};
use crate::ontology::PropertySignature;
use crate::similarity::StringMeasure;

use super::{Candidates, Scorer, StringMatcher, admissible};

/// Matches object and data properties by name, but only between properties
/// whose signatures already correspond under a class alignment.
#[derive(Debug, Clone, Copy)]
pub struct PropertyMatcher<'a> {
    class_alignment: &'a Alignment,
    names: StringMatcher,
}

/// Every class on either side has a counterpart on the other.
fn classes_correspond(
    alignment: &Alignment,
    source: &BTreeSet<EntityId>,
    target: &BTreeSet<EntityId>,
) -> bool {
    source
        .iter()
        .all(|&s| target.iter().any(|&t| alignment.contains(s, t)))
        && target
            .iter()
            .all(|&t| source.iter().any(|&s| alignment.contains(s, t)))
}

impl<'a> PropertyMatcher<'a> {
    pub fn new(class_alignment: &'a Alignment) -> Self {
        Self::with_measure(class_alignment, StringMeasure::default())
    }

    pub fn with_measure(class_alignment: &'a Alignment, measure: StringMeasure) -> Self {
        Self {
            class_alignment,
            names: StringMatcher::new(measure),
        }
    }

    /// Whether two property signatures line up.
    ///
    /// Unset domains or ranges correspond only to unset ones.
    pub fn signatures_correspond(&self, source: &PropertySignature, target: &PropertySignature) -> bool {
        source.datatypes == target.datatypes
            && classes_correspond(self.class_alignment, &source.domain, &target.domain)
            && classes_correspond(self.class_alignment, &source.range, &target.range)
    }
}

impl Scorer for PropertyMatcher<'_> {
    fn score(&self, ctx: &MatchContext, source: EntityId, target: EntityId) -> f64 {
        self.names.score(ctx, source, target)
    }

    fn name(&self) -> &str {
        "property"
    }

    fn supports(&self, kind: EntityType) -> bool {
        kind.is_property()
    }

    fn candidates(&self, ctx: &MatchContext, kind: EntityType) -> Candidates {
        let unset = PropertySignature::default();
        let targets = ctx.target().entities_of(kind);
        let mut out = Candidates::new();
        for s in ctx.source().entities_of(kind) {
            let sig_s = ctx.source().signature(s).unwrap_or(&unset);
            for &t in &targets {
                let sig_t = ctx.target().signature(t).unwrap_or(&unset);
                if admissible(ctx, s, t) && self.signatures_correspond(sig_s, sig_t) {
                    out.insert(s, t);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::error::MatchError;
    use crate::matcher::MatchEngine;
    use crate::ontology::{EntitySnapshot, OntologySnapshot};

    fn id(raw: u32) -> EntityId {
        EntityId::new(raw)
    }

    /// Classes 1/10 organ, 2/11 tissue; properties 5/14 hasPart (organ → tissue),
    /// 6/15 weight (decimal), source-only 7 partOf (tissue → organ).
    fn body() -> MatchContext {
        let side = |uri: &str, base: u32| {
            let mut snap = OntologySnapshot::new(uri);
            let class = |n: u32, label: &str| {
                EntitySnapshot::new(base + n, format!("{uri}#c{n}"), EntityType::Class).named(label)
            };
            snap.entities.push(class(0, "organ"));
            snap.entities.push(class(1, "tissue"));

            let mut has_part =
                EntitySnapshot::new(base + 4, format!("{uri}#hasPart"), EntityType::ObjectProperty);
            has_part.domain.push(EntityId::new(base));
            has_part.range.push(EntityId::new(base + 1));
            snap.entities.push(has_part);

            let mut weight =
                EntitySnapshot::new(base + 5, format!("{uri}#weight"), EntityType::DataProperty);
            weight.domain.push(EntityId::new(base));
            weight.datatypes.push("xsd:decimal".into());
            snap.entities.push(weight);
            snap
        };
        let mut source = side("http://src", 1);
        let mut part_of =
            EntitySnapshot::new(7, "http://src#partOf", EntityType::ObjectProperty);
        part_of.domain.push(id(2));
        part_of.range.push(id(1));
        source.entities.push(part_of);
        let target = side("http://tgt", 10);
        MatchContext::from_snapshots(source, target, MatchConfig::default()).unwrap()
    }

    #[test]
    fn candidates_need_corresponding_signatures() {
        let ctx = body();
        let mut classes = ctx.new_alignment();
        classes.add(id(1), id(10), 1.0);
        classes.add(id(2), id(11), 1.0);
        let m = PropertyMatcher::new(&classes);

        let objects = m.candidates(&ctx, EntityType::ObjectProperty);
        // partOf runs Tissue → Organ, which has no counterpart among
        // the target properties.
        assert_eq!(objects.iter().collect::<Vec<_>>(), vec![(id(5), id(14))]);
        let data = m.candidates(&ctx, EntityType::DataProperty);
        assert_eq!(data.iter().collect::<Vec<_>>(), vec![(id(6), id(15))]);
    }

    #[test]
    fn unmatched_domain_blocks_the_pair() {
        let ctx = body();
        let mut classes = ctx.new_alignment();
        classes.add(id(2), id(11), 1.0);
        let m = PropertyMatcher::new(&classes);
        assert!(m.candidates(&ctx, EntityType::ObjectProperty).is_empty());
    }

    #[test]
    fn scores_by_name_and_rejects_classes() {
        let ctx = body();
        let mut classes = ctx.new_alignment();
        classes.add(id(1), id(10), 1.0);
        classes.add(id(2), id(11), 1.0);
        let m = PropertyMatcher::new(&classes);
        assert_eq!(m.score(&ctx, id(5), id(14)), 1.0);

        let engine = MatchEngine::new(&MatchConfig::default()).unwrap();
        let err = engine
            .match_entities(&ctx, &m, EntityType::Class, 0.5)
            .unwrap_err();
        assert!(matches!(err, MatchError::UnsupportedEntityType { .. }));
    }
}
