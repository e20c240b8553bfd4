//! Data-property assertions on individuals.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// One `(property, literal)` assertion on an individual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyValue {
    /// URI of the data property.
    pub property: String,
    /// Lexical form of the literal.
    pub value: String,
}

/// Individual → asserted literal values.
#[derive(Debug, Clone, Default)]
pub struct ValueTable {
    values: HashMap<EntityId, Vec<PropertyValue>>,
}

impl ValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a literal value. Exact duplicates are ignored.
    pub fn add(&mut self, individual: EntityId, property: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let list = self.values.entry(individual).or_default();
        if list
            .iter()
            .any(|pv| pv.property == property && pv.value == value)
        {
            return;
        }
        list.push(PropertyValue {
            property: property.to_string(),
            value: value.to_string(),
        });
    }

    /// All values asserted on an individual, in insertion order.
    pub fn values(&self, individual: EntityId) -> &[PropertyValue] {
        self.values
            .get(&individual)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Literal forms only.
    pub fn literals(&self, individual: EntityId) -> impl Iterator<Item = &str> {
        self.values(individual).iter().map(|pv| pv.value.as_str())
    }

    pub fn has_values(&self, individual: EntityId) -> bool {
        self.values.contains_key(&individual)
    }

    /// Number of individuals with at least one value.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_and_blank_literals_are_skipped() {
        let mut table = ValueTable::new();
        let ind = EntityId::new(5);
        table.add(ind, "http://x/hasName", "Aspirin");
        table.add(ind, "http://x/hasName", " Aspirin ");
        table.add(ind, "http://x/hasName", "   ");
        table.add(ind, "http://x/hasCode", "N02BA01");
        assert_eq!(table.values(ind).len(), 2);
        assert_eq!(table.literals(ind).collect::<Vec<_>>(), vec!["Aspirin", "N02BA01"]);
        assert!(!table.has_values(EntityId::new(6)));
        assert_eq!(table.len(), 1);
    }
}
