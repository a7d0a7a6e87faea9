//! dromos is the deployment orchestration CLI for the Dromos exchange.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use dromos::{Orchestrator, RehearsalEnvironment};
use dromos_config::{validate_config, ConfigLoader, DeployConfig};
use dromos_migration::JsonFileStateStore;
use dromos_output::OutputStore;
use dromos_plan::ExecutionPlan;
use dromos_types::AddressTable;

/// Environment variable prefix for config overrides.
const ENV_PREFIX: &str = "DROMOS";

#[derive(Parser)]
#[command(name = "dromos")]
#[command(about = "Deployment orchestration for the Dromos exchange", long_about = None)]
struct Cli {
    /// Log verbosity (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    verbosity: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve and print the core system's execution order without touching
    /// anything.
    Plan {
        /// Path to the constants file (TOML, YAML, or JSON).
        #[arg(long)]
        config: PathBuf,
    },

    /// Run the whole pipeline (deploy, configure, migrate, persist)
    /// against the in-process rehearsal environment.
    Rehearse {
        #[arg(long)]
        config: PathBuf,

        /// Directory for the output record and migration state.
        #[arg(long, default_value = "rehearsal")]
        outdir: PathBuf,
    },

    /// Run (or resume) the legacy migration against an existing deployment
    /// output. Completed phases are skipped via the persisted state file.
    Migrate {
        #[arg(long)]
        config: PathBuf,

        /// Output record of the deployment being migrated into. Optional
        /// when resuming past the facilitator phase, which is the only one
        /// that reads the table.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Migration state file.
        #[arg(long, default_value = "rehearsal/migration-state.json")]
        state: PathBuf,
    },

    /// Create the configured pools and their gauges against an existing
    /// deployment output.
    Pools {
        #[arg(long)]
        config: PathBuf,

        /// Output record of the deployment to extend.
        #[arg(long)]
        output: PathBuf,
    },

    /// Deploy the governors against an existing deployment output.
    Governors {
        #[arg(long)]
        config: PathBuf,

        /// Output record of the deployment to extend.
        #[arg(long)]
        output: PathBuf,

        #[arg(long, default_value = "rehearsal")]
        outdir: PathBuf,
    },
}

fn load_config(path: &PathBuf) -> Result<DeployConfig> {
    let config = ConfigLoader::from_file_with_env(path, ENV_PREFIX)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    validate_config(&config).context("config validation failed")?;
    Ok(config)
}

fn load_seed(path: &PathBuf) -> Result<AddressTable> {
    let record = OutputStore::new(path)
        .read()
        .with_context(|| format!("failed to read output record from {}", path.display()))?;
    Ok(record.seed_table())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    match cli.command {
        Command::Plan { config } => {
            let config = load_config(&config)?;
            let plan =
                ExecutionPlan::build(dromos::plans::core_system(&config), &AddressTable::new())?;

            for (position, unit) in plan.iter().enumerate() {
                tracing::info!(
                    position,
                    unit = %unit.name,
                    type_name = %unit.type_name,
                    kind = ?unit.kind,
                    post_deploy_calls = unit.post_deploy_calls.len(),
                    "Planned unit"
                );
            }
            tracing::info!(units = plan.len(), "Plan resolves");
        }

        Command::Rehearse { config, outdir } => {
            let config = load_config(&config)?;
            std::fs::create_dir_all(&outdir)
                .with_context(|| format!("failed to create {}", outdir.display()))?;

            let env = RehearsalEnvironment::new();
            let orchestrator = Orchestrator::new(env.clone(), config);
            let store = JsonFileStateStore::new(outdir.join("migration-state.json"));
            let output = OutputStore::new(outdir.join("output.json"));
            let now = chrono::Utc::now().timestamp() as u64;

            let record = orchestrator
                .run(AddressTable::new(), store, &output, now)
                .await?;

            for (name, address) in record.addresses.iter() {
                tracing::info!(unit = %name, address = %address, "Deployed");
            }
            if let Some(migration) = &record.migration {
                tracing::info!(
                    facilitator = %migration.facilitator,
                    permanent_lock_id = migration.permanent_lock_id,
                    legacy_locked_amount = %migration.legacy_locked_amount,
                    "Migration finalized"
                );
            }
            tracing::info!(
                constructions = env.construction_count(),
                calls = env.call_count(),
                output = %output.path().display(),
                "Rehearsal complete"
            );
        }

        Command::Migrate {
            config,
            output,
            state,
        } => {
            let config = load_config(&config)?;
            let seed = match output {
                Some(path) => load_seed(&path)?,
                None => AddressTable::new(),
            };

            let env = RehearsalEnvironment::new();
            let orchestrator = Orchestrator::new(env, config);
            let store = JsonFileStateStore::new(state);
            let now = chrono::Utc::now().timestamp() as u64;

            match orchestrator.migrate(store, &seed, now).await? {
                Some(report) => tracing::info!(
                    executed = ?report.executed.iter().map(|p| p.name()).collect::<Vec<_>>(),
                    skipped = report.skipped.len(),
                    finalized = report.state.finalized,
                    "Migration run complete"
                ),
                None => tracing::warn!("No migration section in config; nothing to do"),
            }
        }

        Command::Pools { config, output } => {
            let config = load_config(&config)?;
            let seed = load_seed(&output)?;

            let env = RehearsalEnvironment::new();
            let orchestrator = Orchestrator::new(env, config);
            let pools = orchestrator.create_pools_and_gauges(&seed).await?;

            tracing::info!(pools = pools.len(), "Pools and gauges created");
        }

        Command::Governors { config, output, outdir } => {
            let config = load_config(&config)?;
            let seed = load_seed(&output)?;
            std::fs::create_dir_all(&outdir)
                .with_context(|| format!("failed to create {}", outdir.display()))?;

            let env = RehearsalEnvironment::new();
            let orchestrator = Orchestrator::new(env, config);
            let outcome = orchestrator.deploy_governors(seed).await?;

            let now = chrono::Utc::now().timestamp() as u64;
            let store = OutputStore::new(outdir.join("governors.json"));
            store.write(&dromos_output::OutputRecord::new(
                outcome.table,
                None,
                now,
            ))?;
            tracing::info!(output = %store.path().display(), "Governors deployed");
        }
    }

    Ok(())
}
