//! Constants and seed configuration for a deployment run.
//!
//! The config file is the analogue of the old per-network constants JSON:
//! administrative addresses, whitelisted assets, pool specs, and the legacy
//! system's coordinates for the migration. It is read once at startup and
//! read-only to the engine.

mod config;
mod loader;
mod validation;

pub use config::*;
pub use loader::*;
pub use validation::*;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(String),

    #[error("Config validation failed: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config library error: {0}")]
    ConfigLibError(#[from] ::config::ConfigError),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
