use serde::Serialize;
use std::collections::BTreeMap;

use dromos_plan::ExecutionPlan;
use dromos_types::{Address, AddressTable, DeployedUnit, UnitDescriptor, UnitKind, Value};

use crate::{DeployError, ExecutionEnvironment, LibraryLinker};

/// Result of a completed deployment walk.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentOutcome {
    /// Seed entries plus every unit deployed this run.
    pub table: AddressTable,
    /// Units deployed this run, in execution order.
    pub units: Vec<DeployedUnit>,
}

/// Walks an execution plan in order, resolving references against the
/// partial address table and recording each deployed unit.
///
/// A construction failure aborts the whole run: nothing after the failed
/// unit is submitted, and the environment error is surfaced with the unit's
/// identity. There are no retries.
pub struct DeploymentExecutor<E> {
    env: E,
    linker: LibraryLinker,
    gas_ceiling: u64,
}

impl<E: ExecutionEnvironment> DeploymentExecutor<E> {
    pub fn new(env: E, gas_ceiling: u64) -> Self {
        Self {
            env,
            linker: LibraryLinker::new(),
            gas_ceiling,
        }
    }

    pub async fn execute(
        &mut self,
        plan: &ExecutionPlan,
        seed: AddressTable,
    ) -> Result<DeploymentOutcome, DeployError> {
        let mut table = seed;
        let mut units = Vec::with_capacity(plan.len());

        for (sequence, unit) in plan.iter().enumerate() {
            let args: Vec<Value> = unit
                .constructor_args
                .iter()
                .map(|arg| arg.resolve(&table))
                .collect::<Result<_, _>>()?;

            let address = match unit.kind {
                UnitKind::Library => {
                    self.linker
                        .link(&self.env, unit, &args, self.gas_ceiling)
                        .await?
                }
                UnitKind::Contract => {
                    let mut libraries = BTreeMap::new();
                    for (slot, library) in &unit.libraries {
                        libraries.insert(slot.clone(), table.get(library)?.clone());
                    }
                    self.construct_contract(unit, &libraries, &args).await?
                }
            };

            tracing::info!(
                unit = %unit.name,
                type_name = %unit.type_name,
                address = %address,
                deployed_at = sequence as u64,
                "Unit deployed"
            );

            table.insert(unit.name.clone(), address.clone())?;
            units.push(DeployedUnit {
                name: unit.name.clone(),
                type_name: unit.type_name.clone(),
                address,
                deployed_at: sequence as u64,
            });
        }

        Ok(DeploymentOutcome { table, units })
    }

    async fn construct_contract(
        &self,
        unit: &UnitDescriptor,
        libraries: &BTreeMap<String, Address>,
        args: &[Value],
    ) -> Result<Address, DeployError> {
        self.env
            .construct(&unit.type_name, libraries, args, self.gas_ceiling)
            .await
            .map_err(|source| DeployError::ConstructionFailed {
                unit: unit.name.clone(),
                type_name: unit.type_name.clone(),
                source,
            })
    }

    pub fn into_environment(self) -> E {
        self.env
    }
}
