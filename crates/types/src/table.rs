use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::{Address, UnitName};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("unit {0} already has a recorded address")]
    DuplicateEntry(UnitName),

    #[error("no address recorded for unit {0}")]
    UnknownUnit(UnitName),
}

/// Mapping from logical unit name to deployed address.
///
/// Append-only for the duration of a run: entries are added strictly in
/// dependency order and never removed or replaced. A table seeded from a
/// previous run's output record lets incremental plans reference units that
/// already exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressTable {
    entries: BTreeMap<UnitName, Address>,
}

impl AddressTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(entries: impl IntoIterator<Item = (UnitName, Address)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Record a newly deployed unit. Overwriting is not a thing the engine
    /// ever does, so a duplicate insert is an error rather than a replace.
    pub fn insert(&mut self, name: UnitName, address: Address) -> Result<(), TableError> {
        if self.entries.contains_key(&name) {
            return Err(TableError::DuplicateEntry(name));
        }
        self.entries.insert(name, address);
        Ok(())
    }

    pub fn get(&self, name: &UnitName) -> Result<&Address, TableError> {
        self.entries
            .get(name)
            .ok_or_else(|| TableError::UnknownUnit(name.clone()))
    }

    pub fn contains(&self, name: &UnitName) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UnitName, &Address)> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &UnitName> {
        self.entries.keys()
    }
}

impl IntoIterator for AddressTable {
    type Item = (UnitName, Address);
    type IntoIter = std::collections::btree_map::IntoIter<UnitName, Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut table = AddressTable::new();
        table
            .insert(UnitName::from("voter"), Address::new("0x01"))
            .unwrap();

        assert_eq!(
            table.get(&UnitName::from("voter")).unwrap(),
            &Address::new("0x01")
        );
        assert!(table.contains(&UnitName::from("voter")));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let mut table = AddressTable::new();
        table
            .insert(UnitName::from("voter"), Address::new("0x01"))
            .unwrap();
        let err = table
            .insert(UnitName::from("voter"), Address::new("0x02"))
            .unwrap_err();

        assert_eq!(err, TableError::DuplicateEntry(UnitName::from("voter")));
        // The original entry survives.
        assert_eq!(
            table.get(&UnitName::from("voter")).unwrap(),
            &Address::new("0x01")
        );
    }

    #[test]
    fn test_unknown_lookup_names_the_unit() {
        let table = AddressTable::new();
        let err = table.get(&UnitName::from("ghost")).unwrap_err();
        assert_eq!(err, TableError::UnknownUnit(UnitName::from("ghost")));
    }

    #[test]
    fn test_serde_roundtrip() {
        let table = AddressTable::seeded([
            (UnitName::from("voter"), Address::new("0x01")),
            (UnitName::from("minter"), Address::new("0x02")),
        ]);

        let json = serde_json::to_string(&table).unwrap();
        let back: AddressTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
