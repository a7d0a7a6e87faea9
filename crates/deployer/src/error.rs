use thiserror::Error;

use dromos_types::{TableError, UnitName};

use crate::EnvironmentError;

#[derive(Debug, Error)]
pub enum DeployError {
    /// The environment rejected a construction. The run aborts: a half-built
    /// dependency graph is unsafe to continue.
    #[error("construction of unit {unit} ({type_name}) failed: {source}")]
    ConstructionFailed {
        unit: UnitName,
        type_name: String,
        source: EnvironmentError,
    },

    /// A post-deploy configuration call failed. `call` is the 1-based
    /// ordinal across the whole stage; earlier calls remain in effect.
    #[error("post-deploy call #{call} ({unit}.{method}) failed: {source}")]
    ConfigurationCallFailed {
        call: usize,
        unit: UnitName,
        method: String,
        source: EnvironmentError,
    },

    #[error(transparent)]
    Table(#[from] TableError),
}
