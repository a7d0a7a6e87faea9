use dromos_plan::ExecutionPlan;
use dromos_types::{AddressTable, Value};

use crate::{DeployError, ExecutionEnvironment};

/// Issues post-deployment configuration calls once every unit exists.
///
/// Calls run in plan order, each unit's calls in declared order, numbered
/// 1..N across the stage. Calls are independent: a failure stops the stage
/// and reports the failed ordinal, while everything already applied stays
/// applied. Recovery is an operator decision, not a rollback.
pub struct ConfigurationStage<E> {
    env: E,
    gas_ceiling: u64,
}

impl<E: ExecutionEnvironment> ConfigurationStage<E> {
    pub fn new(env: E, gas_ceiling: u64) -> Self {
        Self { env, gas_ceiling }
    }

    /// Run the stage against the complete address table. Returns the number
    /// of calls applied.
    pub async fn run(
        &self,
        plan: &ExecutionPlan,
        table: &AddressTable,
    ) -> Result<usize, DeployError> {
        let mut ordinal = 0usize;

        for unit in plan.iter() {
            if unit.post_deploy_calls.is_empty() {
                continue;
            }
            let target = table.get(&unit.name)?.clone();

            for call in &unit.post_deploy_calls {
                ordinal += 1;
                let args: Vec<Value> = call
                    .args
                    .iter()
                    .map(|arg| arg.resolve(table))
                    .collect::<Result<_, _>>()?;

                tracing::info!(
                    call = ordinal,
                    unit = %unit.name,
                    method = %call.method,
                    "Applying post-deploy call"
                );

                self.env
                    .call(&target, &call.method, &args, self.gas_ceiling)
                    .await
                    .map_err(|source| DeployError::ConfigurationCallFailed {
                        call: ordinal,
                        unit: unit.name.clone(),
                        method: call.method.clone(),
                        source,
                    })?;
            }
        }

        Ok(ordinal)
    }
}
