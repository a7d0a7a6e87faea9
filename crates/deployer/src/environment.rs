use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

use dromos_types::{Address, Value};

/// Failure reported by the execution environment.
///
/// The environment is opaque beyond accepted/rejected: the engine never
/// retries, it only records how far it got and stops.
#[derive(Debug, Clone, Error)]
pub enum EnvironmentError {
    #[error("operation rejected: {0}")]
    Rejected(String),

    #[error("target unreachable: {0}")]
    Unreachable(String),

    #[error("transport failure: {0}")]
    Transport(String),
}

/// The three narrow interfaces the engine consumes from the underlying
/// execution environment. Implementations own transport, signing, and
/// whatever else it takes to submit an operation; the engine only sees
/// success-with-result or a terminal failure.
#[async_trait]
pub trait ExecutionEnvironment: Send + Sync {
    /// Submit a construction operation. `libraries` maps link slot names to
    /// already-deployed library addresses.
    async fn construct(
        &self,
        type_name: &str,
        libraries: &BTreeMap<String, Address>,
        args: &[Value],
        gas_ceiling: u64,
    ) -> Result<Address, EnvironmentError>;

    /// Submit a state-changing call against a deployed unit.
    async fn call(
        &self,
        target: &Address,
        method: &str,
        args: &[Value],
        gas_ceiling: u64,
    ) -> Result<(), EnvironmentError>;

    /// Read without side effects. Used for dry-run identifier discovery and
    /// precondition probes.
    async fn read(
        &self,
        target: &Address,
        method: &str,
        args: &[Value],
    ) -> Result<Value, EnvironmentError>;
}
