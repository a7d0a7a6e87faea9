//! Execution layer: walks a resolved plan against an opaque execution
//! environment, links libraries, and applies post-deploy configuration.

mod configure;
mod environment;
mod error;
mod executor;
mod linker;

pub use configure::ConfigurationStage;
pub use environment::{EnvironmentError, ExecutionEnvironment};
pub use error::DeployError;
pub use executor::{DeploymentExecutor, DeploymentOutcome};
pub use linker::LibraryLinker;
