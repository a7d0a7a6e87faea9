use serde::{Deserialize, Serialize};

use dromos_types::{Address, AddressTable, Amount};

/// Migration results worth keeping alongside the address table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationArtifacts {
    pub facilitator: Address,
    pub permanent_lock_id: u64,
    pub legacy_locked_amount: Amount,
}

/// Final snapshot of a deployment run.
///
/// Written once per successful run and never mutated afterwards. A later
/// run may read it back as the seed table for an incremental deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub addresses: AddressTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migration: Option<MigrationArtifacts>,
    pub written_at: u64,
}

impl OutputRecord {
    pub fn new(
        addresses: AddressTable,
        migration: Option<MigrationArtifacts>,
        written_at: u64,
    ) -> Self {
        Self {
            addresses,
            migration,
            written_at,
        }
    }

    /// The address table, for seeding a later run.
    pub fn seed_table(&self) -> AddressTable {
        self.addresses.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dromos_types::UnitName;

    #[test]
    fn test_record_roundtrip_preserves_table() {
        let table = AddressTable::seeded([
            (UnitName::from("voter"), Address::new("0x01")),
            (UnitName::from("minter"), Address::new("0x02")),
        ]);
        let record = OutputRecord::new(
            table.clone(),
            Some(MigrationArtifacts {
                facilitator: Address::new("0xsink"),
                permanent_lock_id: 7,
                legacy_locked_amount: Amount::new(444_000),
            }),
            1_700_000_000,
        );

        let json = serde_json::to_string_pretty(&record).unwrap();
        let back: OutputRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(back, record);
        assert_eq!(back.seed_table(), table);
    }

    #[test]
    fn test_migration_section_omitted_when_absent() {
        let record = OutputRecord::new(AddressTable::new(), None, 0);
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("migration"));
    }
}
