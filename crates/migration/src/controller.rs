use std::collections::BTreeMap;

use tracing::{info, warn};

use dromos_deployer::{EnvironmentError, ExecutionEnvironment};
use dromos_types::{Address, AddressTable, Amount, UnitName, Value};

use crate::{
    MigrationError, MigrationPhase, MigrationState, MigrationStateStore,
};

/// Inputs the controller needs: the legacy system's addresses, the escrow
/// parameters, and how to construct the facilitator. All of it comes from
/// the constants file; none of it changes mid-run.
#[derive(Debug, Clone)]
pub struct MigrationSetup {
    pub legacy_token: Address,
    pub legacy_escrow: Address,
    pub legacy_voter: Address,
    /// Legacy reward-emission destination to drain. Left blank in early
    /// constants files, which is why `Init` refuses to run without it.
    pub drain_target: Address,
    /// Account funding the escrow transfer.
    pub operator: Address,
    pub escrow_amount: Amount,
    pub lock_duration_secs: u64,
    /// Type name of the bridging facilitator contract.
    pub facilitator_type: String,
    /// New-system units passed to the facilitator's constructor, resolved
    /// against the deployment's address table.
    pub facilitator_links: Vec<UnitName>,
    pub gas_ceiling: u64,
}

/// What a controller run did.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    /// Phases executed by this run, in order.
    pub executed: Vec<MigrationPhase>,
    /// Phases already committed by an earlier run and therefore skipped.
    pub skipped: Vec<MigrationPhase>,
    pub state: MigrationState,
}

/// Drives the legacy-to-current migration as a strict forward state
/// machine.
///
/// Each phase is committed to the state store before the next one starts.
/// On startup the controller reads the store and resumes at the first
/// incomplete phase; committed phases are never re-issued, because the
/// lock-creation and drain calls are not idempotent against the legacy
/// environment.
pub struct MigrationController<E, S> {
    env: E,
    store: S,
    setup: MigrationSetup,
    table: AddressTable,
}

impl<E, S> MigrationController<E, S>
where
    E: ExecutionEnvironment,
    S: MigrationStateStore,
{
    pub fn new(env: E, store: S, setup: MigrationSetup, table: AddressTable) -> Self {
        Self {
            env,
            store,
            setup,
            table,
        }
    }

    pub async fn run(&self, now: u64) -> Result<MigrationReport, MigrationError> {
        let mut executed = Vec::new();
        let mut skipped = Vec::new();

        let mut state = match self.store.load().await? {
            Some(state) if state.finalized => {
                info!("Migration already finalized; nothing to do");
                return Ok(MigrationReport {
                    executed,
                    skipped: MigrationPhase::ALL.to_vec(),
                    state,
                });
            }
            Some(state) => {
                skipped = MigrationPhase::ALL
                    .iter()
                    .copied()
                    .filter(|phase| state.completed(*phase))
                    .collect();
                info!(
                    phase = %state.phase,
                    "Resuming migration from persisted state"
                );
                state
            }
            None => {
                self.check_preconditions().await?;
                let state = MigrationState::new(now);
                self.store.save(&state).await?;
                info!(
                    escrow_amount = %self.setup.escrow_amount,
                    "Migration initialized"
                );
                executed.push(MigrationPhase::Init);
                state
            }
        };

        while let Some(phase) = state.phase.next() {
            self.execute_phase(phase, &mut state).await?;
            state.advance(phase, now);
            self.store.save(&state).await?;
            info!(phase = %phase, "Migration phase committed");
            executed.push(phase);
        }

        Ok(MigrationReport {
            executed,
            skipped,
            state,
        })
    }

    async fn check_preconditions(&self) -> Result<(), MigrationError> {
        if self.setup.drain_target.is_empty() {
            return Err(MigrationError::PreconditionFailed {
                reason: "drain target address is required".to_string(),
            });
        }
        if self.setup.escrow_amount.is_zero() {
            return Err(MigrationError::PreconditionFailed {
                reason: "escrow amount must be positive".to_string(),
            });
        }

        let probes = [
            ("legacy token", &self.setup.legacy_token, "totalSupply"),
            ("legacy escrow", &self.setup.legacy_escrow, "supply"),
            ("legacy voter", &self.setup.legacy_voter, "length"),
        ];
        for (label, address, probe) in probes {
            self.env.read(address, probe, &[]).await.map_err(|e| {
                MigrationError::PreconditionFailed {
                    reason: format!("{label} unreachable at {address}: {e}"),
                }
            })?;
        }

        let balance = self
            .env
            .read(
                &self.setup.legacy_token,
                "balanceOf",
                &[Value::Address(self.setup.operator.clone())],
            )
            .await
            .map_err(|e| MigrationError::PreconditionFailed {
                reason: format!("could not read operator balance: {e}"),
            })?;

        match balance.as_uint() {
            Some(balance) if balance >= self.setup.escrow_amount => Ok(()),
            Some(balance) => Err(MigrationError::PreconditionFailed {
                reason: format!(
                    "operator balance {balance} is below the escrow amount {}",
                    self.setup.escrow_amount
                ),
            }),
            None => Err(MigrationError::PreconditionFailed {
                reason: "operator balance read returned a non-numeric value".to_string(),
            }),
        }
    }

    async fn execute_phase(
        &self,
        phase: MigrationPhase,
        state: &mut MigrationState,
    ) -> Result<(), MigrationError> {
        match phase {
            MigrationPhase::Init => Ok(()),
            MigrationPhase::FacilitatorDeployed => self.deploy_facilitator(state).await,
            MigrationPhase::AssetEscrowed => self.escrow_asset(state).await,
            MigrationPhase::PermanentLockCreated => self.create_permanent_lock(state).await,
            MigrationPhase::OwnershipRegistered => self.register_ownership(state).await,
            MigrationPhase::LegacyGaugeDrained => self.drain_legacy_gauge(state).await,
            MigrationPhase::Finalized => self.finalize(state).await,
        }
    }

    async fn deploy_facilitator(&self, state: &mut MigrationState) -> Result<(), MigrationError> {
        let mut args = vec![
            Value::Address(self.setup.legacy_token.clone()),
            Value::Address(self.setup.legacy_escrow.clone()),
            Value::Address(self.setup.legacy_voter.clone()),
        ];
        for link in &self.setup.facilitator_links {
            args.push(Value::Address(self.table.get(link)?.clone()));
        }

        let address = self
            .env
            .construct(
                &self.setup.facilitator_type,
                &BTreeMap::new(),
                &args,
                self.setup.gas_ceiling,
            )
            .await
            .map_err(|e| phase_failed(MigrationPhase::FacilitatorDeployed, e))?;

        info!(facilitator = %address, "Facilitator deployed");
        state.facilitator_address = Some(address);
        Ok(())
    }

    async fn escrow_asset(&self, state: &mut MigrationState) -> Result<(), MigrationError> {
        let facilitator = self.facilitator(state)?;
        let amount = Value::Uint(self.setup.escrow_amount);

        self.env
            .call(
                &self.setup.legacy_token,
                "transfer",
                &[Value::Address(facilitator.clone()), amount.clone()],
                self.setup.gas_ceiling,
            )
            .await
            .map_err(|e| phase_failed(MigrationPhase::AssetEscrowed, e))?;

        self.env
            .call(
                &facilitator,
                "approveLegacyEscrow",
                &[amount],
                self.setup.gas_ceiling,
            )
            .await
            .map_err(|e| phase_failed(MigrationPhase::AssetEscrowed, e))?;

        state.legacy_locked_amount = self.setup.escrow_amount;
        Ok(())
    }

    async fn create_permanent_lock(
        &self,
        state: &mut MigrationState,
    ) -> Result<(), MigrationError> {
        let facilitator = self.facilitator(state)?;
        let args = [
            Value::Uint(self.setup.escrow_amount),
            Value::Uint(Amount::from(self.setup.lock_duration_secs)),
        ];

        // The identifier must be known before the next phase can reference
        // it, so the mutating call is preceded by a dry-run read of the same
        // method.
        let preview = self
            .env
            .read(&facilitator, "createLock", &args)
            .await
            .map_err(|e| phase_failed(MigrationPhase::PermanentLockCreated, e))?;

        let lock_id = preview
            .as_uint()
            .and_then(|amount| u64::try_from(amount.get()).ok())
            .ok_or_else(|| MigrationError::PhaseFailed {
                phase: MigrationPhase::PermanentLockCreated,
                reason: format!("dry-run lock creation returned a non-numeric id: {preview}"),
            })?;

        self.env
            .call(&facilitator, "createLock", &args, self.setup.gas_ceiling)
            .await
            .map_err(|e| phase_failed(MigrationPhase::PermanentLockCreated, e))?;

        info!(lock_id, "Permanent lock created");
        state.permanent_lock_id = Some(lock_id);
        Ok(())
    }

    async fn register_ownership(&self, state: &mut MigrationState) -> Result<(), MigrationError> {
        let facilitator = self.facilitator(state)?;
        let lock_id = state
            .permanent_lock_id
            .ok_or_else(|| MigrationError::InvalidState {
                reason: "ownership registration requires a recorded lock id".to_string(),
            })?;

        self.env
            .call(
                &facilitator,
                "setOwnedTokenId",
                &[Value::Uint(Amount::from(lock_id))],
                self.setup.gas_ceiling,
            )
            .await
            .map_err(|e| phase_failed(MigrationPhase::OwnershipRegistered, e))
    }

    async fn drain_legacy_gauge(&self, state: &mut MigrationState) -> Result<(), MigrationError> {
        let facilitator = self.facilitator(state)?;

        self.env
            .call(
                &facilitator,
                "activateDrain",
                &[Value::Address(self.setup.drain_target.clone())],
                self.setup.gas_ceiling,
            )
            .await
            .map_err(|e| phase_failed(MigrationPhase::LegacyGaugeDrained, e))?;

        state.legacy_gauge_drained = true;
        Ok(())
    }

    async fn finalize(&self, state: &mut MigrationState) -> Result<(), MigrationError> {
        let facilitator = self.facilitator(state)?;

        self.env
            .call(&facilitator, "renounceOwnership", &[], self.setup.gas_ceiling)
            .await
            .map_err(|e| phase_failed(MigrationPhase::Finalized, e))?;

        warn!(
            facilitator = %facilitator,
            "Facilitator ownership renounced; migration is irreversible from here"
        );
        state.finalized = true;
        Ok(())
    }

    fn facilitator(&self, state: &MigrationState) -> Result<Address, MigrationError> {
        state
            .facilitator_address
            .clone()
            .ok_or_else(|| MigrationError::InvalidState {
                reason: "facilitator address missing from persisted state".to_string(),
            })
    }
}

fn phase_failed(phase: MigrationPhase, source: EnvironmentError) -> MigrationError {
    MigrationError::PhaseFailed {
        phase,
        reason: source.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    use crate::InMemoryStateStore;

    const LOCK_ID: u64 = 7;

    #[derive(Clone)]
    struct MockLegacyEnvironment {
        constructions: Arc<Mutex<Vec<String>>>,
        calls: Arc<Mutex<Vec<(Address, String)>>>,
        balance: Arc<Mutex<Amount>>,
        fail_method: Arc<Mutex<Option<String>>>,
    }

    impl MockLegacyEnvironment {
        fn new() -> Self {
            Self {
                constructions: Arc::new(Mutex::new(Vec::new())),
                calls: Arc::new(Mutex::new(Vec::new())),
                balance: Arc::new(Mutex::new(Amount::new(1_000_000))),
                fail_method: Arc::new(Mutex::new(None)),
            }
        }

        fn fail_on(&self, method: &str) {
            *self.fail_method.lock().unwrap() = Some(method.to_string());
        }

        fn clear_failures(&self) {
            *self.fail_method.lock().unwrap() = None;
        }

        fn set_balance(&self, balance: Amount) {
            *self.balance.lock().unwrap() = balance;
        }

        fn methods_called(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|c| c.1.clone()).collect()
        }
    }

    #[async_trait]
    impl ExecutionEnvironment for MockLegacyEnvironment {
        async fn construct(
            &self,
            type_name: &str,
            _libraries: &BTreeMap<String, Address>,
            _args: &[Value],
            _gas_ceiling: u64,
        ) -> Result<Address, EnvironmentError> {
            self.constructions.lock().unwrap().push(type_name.to_string());
            Ok(Address::new("0xsink"))
        }

        async fn call(
            &self,
            target: &Address,
            method: &str,
            _args: &[Value],
            _gas_ceiling: u64,
        ) -> Result<(), EnvironmentError> {
            if self.fail_method.lock().unwrap().as_deref() == Some(method) {
                return Err(EnvironmentError::Rejected("simulated failure".to_string()));
            }
            self.calls
                .lock()
                .unwrap()
                .push((target.clone(), method.to_string()));
            Ok(())
        }

        async fn read(
            &self,
            _target: &Address,
            method: &str,
            _args: &[Value],
        ) -> Result<Value, EnvironmentError> {
            match method {
                "balanceOf" => Ok(Value::Uint(*self.balance.lock().unwrap())),
                "createLock" => Ok(Value::Uint(Amount::from(LOCK_ID))),
                _ => Ok(Value::Uint(Amount::zero())),
            }
        }
    }

    fn setup() -> MigrationSetup {
        MigrationSetup {
            legacy_token: Address::new("0xlegacy-token"),
            legacy_escrow: Address::new("0xlegacy-escrow"),
            legacy_voter: Address::new("0xlegacy-voter"),
            drain_target: Address::new("0xdrain"),
            operator: Address::new("0xoperator"),
            escrow_amount: Amount::new(444_000),
            lock_duration_secs: 126_144_000,
            facilitator_type: "SinkManager".to_string(),
            facilitator_links: vec!["token".into(), "minter".into()],
            gas_ceiling: 5_000_000,
        }
    }

    fn new_system_table() -> AddressTable {
        AddressTable::seeded([
            ("token".into(), Address::new("0xtoken")),
            ("minter".into(), Address::new("0xminter")),
        ])
    }

    fn controller(
        env: MockLegacyEnvironment,
        store: InMemoryStateStore,
    ) -> MigrationController<MockLegacyEnvironment, InMemoryStateStore> {
        MigrationController::new(env, store, setup(), new_system_table())
    }

    #[tokio::test]
    async fn test_full_run_executes_every_phase_once() {
        let env = MockLegacyEnvironment::new();
        let store = InMemoryStateStore::new();

        let report = controller(env.clone(), store.clone()).run(1000).await.unwrap();

        assert_eq!(report.executed, MigrationPhase::ALL.to_vec());
        assert!(report.skipped.is_empty());
        assert!(report.state.finalized);
        assert_eq!(report.state.permanent_lock_id, Some(LOCK_ID));
        assert_eq!(report.state.legacy_locked_amount, Amount::new(444_000));
        assert_eq!(
            report.state.facilitator_address,
            Some(Address::new("0xsink"))
        );

        assert_eq!(
            env.methods_called(),
            vec![
                "transfer",
                "approveLegacyEscrow",
                "createLock",
                "setOwnedTokenId",
                "activateDrain",
                "renounceOwnership"
            ]
        );
        assert_eq!(env.constructions.lock().unwrap().as_slice(), ["SinkManager"]);
    }

    #[tokio::test]
    async fn test_crash_resume_skips_committed_phases() {
        let env = MockLegacyEnvironment::new();
        let store = InMemoryStateStore::new();

        // First run dies at the drain phase.
        env.fail_on("activateDrain");
        let err = controller(env.clone(), store.clone()).run(1000).await.unwrap_err();
        match err {
            MigrationError::PhaseFailed { phase, .. } => {
                assert_eq!(phase, MigrationPhase::LegacyGaugeDrained);
            }
            other => panic!("expected phase failure, got {other:?}"),
        }
        let persisted = store.snapshot().unwrap();
        assert_eq!(persisted.phase, MigrationPhase::OwnershipRegistered);
        assert_eq!(persisted.permanent_lock_id, Some(LOCK_ID));

        // Second run completes only the last two phases.
        env.clear_failures();
        let report = controller(env.clone(), store.clone()).run(2000).await.unwrap();
        assert_eq!(
            report.executed,
            vec![MigrationPhase::LegacyGaugeDrained, MigrationPhase::Finalized]
        );
        assert_eq!(
            report.skipped,
            vec![
                MigrationPhase::Init,
                MigrationPhase::FacilitatorDeployed,
                MigrationPhase::AssetEscrowed,
                MigrationPhase::PermanentLockCreated,
                MigrationPhase::OwnershipRegistered,
            ]
        );
        assert_eq!(report.state.permanent_lock_id, Some(LOCK_ID));

        // Across both runs, no state-changing call of a committed phase was
        // re-issued.
        let methods = env.methods_called();
        assert_eq!(
            methods.iter().filter(|m| m.as_str() == "createLock").count(),
            1
        );
        assert_eq!(
            methods.iter().filter(|m| m.as_str() == "transfer").count(),
            1
        );
        assert_eq!(env.constructions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_finalized_rerun_is_a_no_op() {
        let env = MockLegacyEnvironment::new();
        let store = InMemoryStateStore::new();

        controller(env.clone(), store.clone()).run(1000).await.unwrap();
        let calls_after_first = env.methods_called().len();

        let report = controller(env.clone(), store.clone()).run(2000).await.unwrap();
        assert!(report.executed.is_empty());
        assert_eq!(report.skipped, MigrationPhase::ALL.to_vec());
        assert_eq!(env.methods_called().len(), calls_after_first);
    }

    #[tokio::test]
    async fn test_missing_drain_target_fails_init() {
        let env = MockLegacyEnvironment::new();
        let store = InMemoryStateStore::new();
        let mut bad_setup = setup();
        bad_setup.drain_target = Address::new("");

        let controller =
            MigrationController::new(env.clone(), store.clone(), bad_setup, new_system_table());
        let err = controller.run(1000).await.unwrap_err();

        assert!(matches!(err, MigrationError::PreconditionFailed { .. }));
        // Planning-time failure: nothing persisted, nothing submitted.
        assert!(store.snapshot().is_none());
        assert!(env.methods_called().is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_balance_fails_init() {
        let env = MockLegacyEnvironment::new();
        env.set_balance(Amount::new(1));
        let store = InMemoryStateStore::new();

        let err = controller(env.clone(), store.clone()).run(1000).await.unwrap_err();
        match err {
            MigrationError::PreconditionFailed { reason } => {
                assert!(reason.contains("below the escrow amount"), "{reason}");
            }
            other => panic!("expected precondition failure, got {other:?}"),
        }
        assert!(store.snapshot().is_none());
    }
}
