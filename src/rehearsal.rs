//! A deterministic, in-process execution environment.
//!
//! Lets a full deployment, migration included, run end to end with no
//! chain behind it: addresses are minted sequentially, reads answer the
//! methods the engine and the standard plans use, and any call can be made
//! to fail on demand to rehearse a crash at an exact point.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use dromos_deployer::{EnvironmentError, ExecutionEnvironment};
use dromos_types::{Address, Amount, Value};

#[derive(Default)]
struct Ledger {
    next_address: u64,
    next_lock_id: u64,
    constructions: Vec<String>,
    calls: Vec<(Address, String)>,
    pools: BTreeMap<String, Address>,
    fail_method: Option<String>,
}

impl Ledger {
    fn mint_address(&mut self) -> Address {
        self.next_address += 1;
        Address::new(format!("0x{:040x}", self.next_address))
    }
}

/// Shared-state rehearsal environment. Clones share one ledger, so the
/// executor, configuration stage, and migration controller all see the same
/// world.
#[derive(Clone, Default)]
pub struct RehearsalEnvironment {
    ledger: Arc<Mutex<Ledger>>,
}

impl RehearsalEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call of `method` fail until cleared.
    pub fn fail_on_method(&self, method: &str) {
        self.ledger.lock().unwrap().fail_method = Some(method.to_string());
    }

    pub fn clear_failures(&self) {
        self.ledger.lock().unwrap().fail_method = None;
    }

    pub fn construction_count(&self) -> usize {
        self.ledger.lock().unwrap().constructions.len()
    }

    pub fn call_count(&self) -> usize {
        self.ledger.lock().unwrap().calls.len()
    }

    /// Type names constructed, in order.
    pub fn constructions(&self) -> Vec<String> {
        self.ledger.lock().unwrap().constructions.clone()
    }

    /// Methods called, in order.
    pub fn methods_called(&self) -> Vec<String> {
        self.ledger
            .lock()
            .unwrap()
            .calls
            .iter()
            .map(|(_, method)| method.clone())
            .collect()
    }
}

fn pool_key(args: &[Value]) -> String {
    args.iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join("|")
}

#[async_trait]
impl ExecutionEnvironment for RehearsalEnvironment {
    async fn construct(
        &self,
        type_name: &str,
        _libraries: &BTreeMap<String, Address>,
        _args: &[Value],
        _gas_ceiling: u64,
    ) -> Result<Address, EnvironmentError> {
        let mut ledger = self.ledger.lock().unwrap();
        let address = ledger.mint_address();
        ledger.constructions.push(type_name.to_string());
        Ok(address)
    }

    async fn call(
        &self,
        target: &Address,
        method: &str,
        args: &[Value],
        _gas_ceiling: u64,
    ) -> Result<(), EnvironmentError> {
        let mut ledger = self.ledger.lock().unwrap();
        if ledger.fail_method.as_deref() == Some(method) {
            return Err(EnvironmentError::Rejected(format!(
                "rehearsal failure injected for {method}"
            )));
        }

        match method {
            "createPool" => {
                let pool = ledger.mint_address();
                ledger.pools.insert(pool_key(args), pool);
            }
            "createLock" => {
                ledger.next_lock_id += 1;
            }
            _ => {}
        }

        ledger.calls.push((target.clone(), method.to_string()));
        Ok(())
    }

    async fn read(
        &self,
        _target: &Address,
        method: &str,
        args: &[Value],
    ) -> Result<Value, EnvironmentError> {
        let ledger = self.ledger.lock().unwrap();
        match method {
            "getPool" => ledger
                .pools
                .get(&pool_key(args))
                .cloned()
                .map(Value::Address)
                .ok_or_else(|| {
                    EnvironmentError::Unreachable(format!(
                        "no pool created for {}",
                        pool_key(args)
                    ))
                }),
            // Peek at the id the next lock creation will produce; the
            // mutating call is what advances it.
            "createLock" => Ok(Value::Uint(Amount::from(ledger.next_lock_id + 1))),
            // Rehearsal operators are endlessly rich.
            "balanceOf" => Ok(Value::Uint(Amount::new(u128::MAX >> 1))),
            _ => Ok(Value::Uint(Amount::zero())),
        }
    }
}
