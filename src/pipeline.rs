//! The end-to-end pipeline: plan, deploy, configure, migrate, persist.

use thiserror::Error;
use tracing::{error, info};

use dromos_config::{validate_config, ConfigError, DeployConfig};
use dromos_deployer::{
    ConfigurationStage, DeployError, DeploymentExecutor, DeploymentOutcome, EnvironmentError,
    ExecutionEnvironment,
};
use dromos_migration::{
    MigrationController, MigrationError, MigrationReport, MigrationSetup, MigrationStateStore,
};
use dromos_output::{MigrationArtifacts, OutputError, OutputRecord, OutputStore};
use dromos_plan::{ExecutionPlan, PlanError};
use dromos_types::{Address, AddressTable, TableError, UnitName, Value};

use crate::plans;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("pool provisioning failed for {pool}: {reason}")]
    PoolProvisioning { pool: String, reason: String },
}

/// Drives a whole deployment run against one execution environment.
pub struct Orchestrator<E> {
    env: E,
    config: DeployConfig,
}

impl<E: ExecutionEnvironment + Clone> Orchestrator<E> {
    pub fn new(env: E, config: DeployConfig) -> Self {
        Self { env, config }
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// Deploy and configure the core system.
    pub async fn deploy(&self, seed: AddressTable) -> Result<DeploymentOutcome, PipelineError> {
        validate_config(&self.config)?;

        let plan = ExecutionPlan::build(plans::core_system(&self.config), &seed)?;
        let gas_ceiling = self.config.deployment.gas_ceiling;

        let mut executor = DeploymentExecutor::new(self.env.clone(), gas_ceiling);
        let outcome = executor.execute(&plan, seed).await?;

        let stage = ConfigurationStage::new(self.env.clone(), gas_ceiling);
        let applied = stage.run(&plan, &outcome.table).await?;

        info!(
            units = outcome.units.len(),
            calls = applied,
            "Core system deployed and configured"
        );
        Ok(outcome)
    }

    /// Run the legacy migration if this network has one configured.
    pub async fn migrate<S: MigrationStateStore>(
        &self,
        store: S,
        table: &AddressTable,
        now: u64,
    ) -> Result<Option<MigrationReport>, PipelineError> {
        let Some(migration) = &self.config.migration else {
            info!("No migration configured; skipping");
            return Ok(None);
        };

        let setup = MigrationSetup {
            legacy_token: migration.legacy_token.clone(),
            legacy_escrow: migration.legacy_escrow.clone(),
            legacy_voter: migration.legacy_voter.clone(),
            drain_target: migration.drain_target.clone(),
            operator: migration.operator.clone(),
            escrow_amount: migration.escrow_amount,
            lock_duration_secs: migration.lock_duration_secs,
            facilitator_type: migration.facilitator_type.clone(),
            facilitator_links: migration
                .facilitator_links
                .iter()
                .map(|name| UnitName::from(name.as_str()))
                .collect(),
            gas_ceiling: self.config.deployment.gas_ceiling,
        };

        let controller = MigrationController::new(self.env.clone(), store, setup, table.clone());
        let report = controller.run(now).await?;
        Ok(Some(report))
    }

    /// Full run: deploy, configure, migrate, and persist the output record.
    pub async fn run<S: MigrationStateStore>(
        &self,
        seed: AddressTable,
        store: S,
        output: &OutputStore,
        now: u64,
    ) -> Result<OutputRecord, PipelineError> {
        let outcome = self.deploy(seed).await?;
        let report = self.migrate(store, &outcome.table, now).await?;

        let artifacts = report.as_ref().and_then(|report| {
            match (
                &report.state.facilitator_address,
                report.state.permanent_lock_id,
            ) {
                (Some(facilitator), Some(permanent_lock_id)) => Some(MigrationArtifacts {
                    facilitator: facilitator.clone(),
                    permanent_lock_id,
                    legacy_locked_amount: report.state.legacy_locked_amount,
                }),
                _ => None,
            }
        });

        let record = OutputRecord::new(outcome.table, artifacts, now);
        if let Err(e) = output.write(&record) {
            // The on-chain work succeeded; losing the record now would lose
            // the address table needed for recovery. Say so unmistakably.
            error!(
                path = %output.path().display(),
                error = %e,
                "DEPLOYMENT SUCCEEDED BUT THE OUTPUT RECORD COULD NOT BE WRITTEN"
            );
            return Err(e.into());
        }
        Ok(record)
    }

    /// Deploy the governors against an existing system.
    pub async fn deploy_governors(
        &self,
        seed: AddressTable,
    ) -> Result<DeploymentOutcome, PipelineError> {
        validate_config(&self.config)?;

        let plan = ExecutionPlan::build(plans::governors(&self.config), &seed)?;
        let gas_ceiling = self.config.deployment.gas_ceiling;

        let mut executor = DeploymentExecutor::new(self.env.clone(), gas_ceiling);
        let outcome = executor.execute(&plan, seed).await?;
        let stage = ConfigurationStage::new(self.env.clone(), gas_ceiling);
        stage.run(&plan, &outcome.table).await?;

        Ok(outcome)
    }

    /// Incremental pools-and-gauges run against an existing deployment: for
    /// each configured pool, create it via the factory, discover its address
    /// through the read interface, and create its gauge via the voter.
    pub async fn create_pools_and_gauges(
        &self,
        table: &AddressTable,
    ) -> Result<Vec<Address>, PipelineError> {
        let factory = table.get(&UnitName::from("poolFactory"))?.clone();
        let voter = table.get(&UnitName::from("voter"))?.clone();
        let gas_ceiling = self.config.deployment.gas_ceiling;

        let mut pairs: Vec<(Address, Address, bool)> = self
            .config
            .pools
            .iter()
            .map(|p| (p.token_a.clone(), p.token_b.clone(), p.stable))
            .collect();
        if !self.config.token_pools.is_empty() {
            let protocol_token = table.get(&UnitName::from("token"))?.clone();
            pairs.extend(
                self.config
                    .token_pools
                    .iter()
                    .map(|p| (protocol_token.clone(), p.token.clone(), p.stable)),
            );
        }

        let mut pools = Vec::with_capacity(pairs.len());
        for (token_a, token_b, stable) in pairs {
            let label = format!("{token_a}/{token_b}");
            let args = [
                Value::Address(token_a),
                Value::Address(token_b),
                Value::Bool(stable),
            ];

            self.env
                .call(&factory, "createPool", &args, gas_ceiling)
                .await
                .map_err(|e| provisioning_failed(&label, e))?;

            let pool = self
                .env
                .read(&factory, "getPool", &args)
                .await
                .map_err(|e| provisioning_failed(&label, e))?;
            let pool = pool
                .as_address()
                .cloned()
                .ok_or_else(|| PipelineError::PoolProvisioning {
                    pool: label.clone(),
                    reason: format!("factory returned a non-address pool: {pool}"),
                })?;

            self.env
                .call(
                    &voter,
                    "createGauge",
                    &[Value::Address(factory.clone()), Value::Address(pool.clone())],
                    gas_ceiling,
                )
                .await
                .map_err(|e| provisioning_failed(&label, e))?;

            info!(pool = %pool, label = %label, "Pool and gauge created");
            pools.push(pool);
        }

        Ok(pools)
    }
}

fn provisioning_failed(label: &str, source: EnvironmentError) -> PipelineError {
    PipelineError::PoolProvisioning {
        pool: label.to_string(),
        reason: source.to_string(),
    }
}
