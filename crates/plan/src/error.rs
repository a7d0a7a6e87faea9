use dromos_types::UnitName;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("duplicate unit name: {0}")]
    DuplicateUnit(UnitName),

    #[error("dependency cycle detected: {}", format_cycle(.members))]
    CycleDetected { members: Vec<UnitName> },

    #[error("unit {unit} references unknown unit {reference}")]
    UnresolvedReference { unit: UnitName, reference: UnitName },
}

fn format_cycle(members: &[UnitName]) -> String {
    members
        .iter()
        .map(UnitName::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}
