//! Configuration loading from multiple sources

use crate::{ConfigError, DeployConfig, Result};
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use std::path::Path;

/// Configuration loader with support for multiple formats and sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    ///
    /// Supports TOML, YAML, and JSON formats based on file extension
    pub fn from_file(path: &Path) -> Result<DeployConfig> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::LoadError("No file extension found".to_string()))?;

        let content = std::fs::read_to_string(path)?;

        match extension {
            "toml" => Self::from_toml(&content),
            "yaml" | "yml" => Self::from_yaml(&content),
            "json" => Self::from_json(&content),
            _ => Err(ConfigError::LoadError(format!(
                "Unsupported file extension: {}",
                extension
            ))),
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<DeployConfig> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from YAML string
    pub fn from_yaml(content: &str) -> Result<DeployConfig> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<DeployConfig> {
        serde_json::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from environment variables
    ///
    /// Uses default prefix "DROMOS"
    pub fn from_env() -> Result<DeployConfig> {
        Self::from_env_with_prefix("DROMOS")
    }

    /// Load configuration from environment variables with custom prefix
    ///
    /// Environment variables should be in the format: PREFIX_SECTION_KEY
    /// For example: DROMOS_ADMIN_TEAM=0xteam
    pub fn from_env_with_prefix(prefix: &str) -> Result<DeployConfig> {
        let config = Config::builder()
            .add_source(Environment::with_prefix(prefix).separator("_"))
            .build()?;

        config.try_deserialize().map_err(ConfigError::from)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Sources are merged at the value level, so a single env var can
    /// override a single field of the file config.
    pub fn from_file_with_env(path: &Path, env_prefix: &str) -> Result<DeployConfig> {
        Self::builder()
            .add_file(path, true)
            .add_env(env_prefix)
            .build()
    }

    /// Build configuration using the config crate's builder pattern
    ///
    /// This allows for more complex configuration scenarios with multiple sources
    pub fn builder() -> ConfigLoaderBuilder {
        ConfigLoaderBuilder {
            builder: Config::builder(),
        }
    }
}

/// Builder for complex configuration loading scenarios
pub struct ConfigLoaderBuilder {
    builder: ConfigBuilder<config::builder::DefaultState>,
}

impl ConfigLoaderBuilder {
    /// Add a configuration file source
    pub fn add_file(mut self, path: &Path, required: bool) -> Self {
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Toml, // Default to TOML
        };

        self.builder = self
            .builder
            .add_source(File::from(path).format(format).required(required));
        self
    }

    /// Add environment variable source with prefix
    pub fn add_env(mut self, prefix: &str) -> Self {
        self.builder = self
            .builder
            .add_source(Environment::with_prefix(prefix).separator("_"));
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Result<DeployConfig> {
        let config = self.builder.build()?;
        config.try_deserialize().map_err(ConfigError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dromos_types::{Address, Amount};

    const SAMPLE_TOML: &str = r#"
        [admin]
        team = "0xteam"
        fee_manager = "0xfees"

        [tokens]
        weth = "0xweth"
        whitelist = ["0xusdc", "0xdai"]

        [deployment]
        gas_ceiling = 5000000

        [[pools]]
        stable = true
        token_a = "0xusdc"
        token_b = "0xdai"

        [[token_pools]]
        stable = false
        token = "0xusdc"

        [migration]
        legacy_token = "0xv1-token"
        legacy_escrow = "0xv1-escrow"
        legacy_voter = "0xv1-voter"
        drain_target = "0xdrain"
        operator = "0xoperator"
        escrow_amount = "444000000000000000000000000"
    "#;

    #[test]
    fn test_load_from_toml() {
        let config = ConfigLoader::from_toml(SAMPLE_TOML).unwrap();
        assert_eq!(config.admin.team, Address::new("0xteam"));
        assert_eq!(config.tokens.whitelist.len(), 2);
        assert_eq!(config.pools.len(), 1);
        assert_eq!(config.token_pools.len(), 1);

        let migration = config.migration.unwrap();
        assert_eq!(
            migration.escrow_amount,
            Amount::new(444_000_000_000_000_000_000_000_000)
        );
    }

    #[test]
    fn test_load_from_yaml() {
        let yaml = r#"
admin:
  team: "0xteam"
  fee_manager: "0xfees"

tokens:
  weth: "0xweth"
  whitelist:
    - "0xusdc"

pools: []
token_pools: []
        "#;

        let config = ConfigLoader::from_yaml(yaml).unwrap();
        assert_eq!(config.tokens.weth, Address::new("0xweth"));
        assert!(config.migration.is_none());
        // Defaults fill unspecified sections.
        assert_eq!(config.deployment.gas_ceiling, 5_000_000);
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"
        {
            "admin": { "team": "0xteam", "fee_manager": "0xfees" },
            "tokens": { "weth": "0xweth", "whitelist": [] }
        }
        "#;

        let config = ConfigLoader::from_json(json).unwrap();
        assert_eq!(config.admin.fee_manager, Address::new("0xfees"));
        assert!(config.pools.is_empty());
    }

    #[test]
    fn test_unsupported_extension_fails() {
        let err = ConfigLoader::from_file(Path::new("constants.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_) | ConfigError::IoError(_)));
    }
}
