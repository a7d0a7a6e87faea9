//! Configuration validation

use crate::{ConfigError, DeployConfig, Result};
use dromos_types::Address;
use std::collections::HashSet;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the entire deployment configuration
pub fn validate_config(config: &DeployConfig) -> Result<()> {
    let mut errors = Vec::new();

    // Validate admin config
    if config.admin.team.is_empty() {
        errors.push(ValidationError::new("admin.team", "team address is required"));
    }
    if config.admin.fee_manager.is_empty() {
        errors.push(ValidationError::new(
            "admin.fee_manager",
            "fee manager address is required",
        ));
    }

    // Validate token config
    if config.tokens.weth.is_empty() {
        errors.push(ValidationError::new("tokens.weth", "WETH address is required"));
    }
    for (idx, token) in config.tokens.whitelist.iter().enumerate() {
        if token.is_empty() {
            errors.push(ValidationError::new(
                format!("tokens.whitelist[{idx}]"),
                "whitelisted token address must not be empty",
            ));
        }
    }
    let distinct: HashSet<&Address> = config.tokens.whitelist.iter().collect();
    if distinct.len() != config.tokens.whitelist.len() {
        errors.push(ValidationError::new(
            "tokens.whitelist",
            "duplicate whitelisted tokens found",
        ));
    }

    // Validate deployment config
    if config.deployment.gas_ceiling == 0 {
        errors.push(ValidationError::new(
            "deployment.gas_ceiling",
            "must be greater than 0",
        ));
    }

    // Validate pool specs
    for (idx, pool) in config.pools.iter().enumerate() {
        if pool.token_a.is_empty() || pool.token_b.is_empty() {
            errors.push(ValidationError::new(
                format!("pools[{idx}]"),
                "pool token addresses must not be empty",
            ));
        } else if pool.token_a == pool.token_b {
            errors.push(ValidationError::new(
                format!("pools[{idx}]"),
                "a pool needs two distinct tokens",
            ));
        }
    }
    for (idx, pool) in config.token_pools.iter().enumerate() {
        if pool.token.is_empty() {
            errors.push(ValidationError::new(
                format!("token_pools[{idx}].token"),
                "paired token address must not be empty",
            ));
        }
    }

    // Validate migration config
    if let Some(migration) = &config.migration {
        let addresses = [
            ("migration.legacy_token", &migration.legacy_token),
            ("migration.legacy_escrow", &migration.legacy_escrow),
            ("migration.legacy_voter", &migration.legacy_voter),
            ("migration.operator", &migration.operator),
        ];
        for (field, address) in addresses {
            if address.is_empty() {
                errors.push(ValidationError::new(field, "address is required"));
            }
        }

        // The drain target used to be filled in by hand right before the
        // run; an unset value must stop the migration before it starts.
        if migration.drain_target.is_empty() {
            errors.push(ValidationError::new(
                "migration.drain_target",
                "drain target must be set before a migration run",
            ));
        }

        if migration.escrow_amount.is_zero() {
            errors.push(ValidationError::new(
                "migration.escrow_amount",
                "must be greater than 0",
            ));
        }
        if migration.lock_duration_secs == 0 {
            errors.push(ValidationError::new(
                "migration.lock_duration_secs",
                "must be greater than 0",
            ));
        }
        if migration.facilitator_type.is_empty() {
            errors.push(ValidationError::new(
                "migration.facilitator_type",
                "facilitator type name is required",
            ));
        }
    }

    // Return all errors if any were found
    if !errors.is_empty() {
        let error_msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ConfigError::ValidationError(error_msg));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AdminConfig, DeploymentConfig, MigrationConfig, TokenConfig};
    use dromos_types::Amount;

    fn valid_config() -> DeployConfig {
        DeployConfig {
            admin: AdminConfig {
                team: Address::new("0xteam"),
                fee_manager: Address::new("0xfees"),
            },
            tokens: TokenConfig {
                weth: Address::new("0xweth"),
                whitelist: vec![Address::new("0xusdc"), Address::new("0xdai")],
            },
            deployment: DeploymentConfig::default(),
            pools: Vec::new(),
            token_pools: Vec::new(),
            migration: Some(MigrationConfig {
                legacy_token: Address::new("0xv1-token"),
                legacy_escrow: Address::new("0xv1-escrow"),
                legacy_voter: Address::new("0xv1-voter"),
                drain_target: Address::new("0xdrain"),
                operator: Address::new("0xoperator"),
                escrow_amount: Amount::new(444_000),
                lock_duration_secs: 126_144_000,
                facilitator_type: "SinkManager".to_string(),
                facilitator_links: vec!["token".to_string(), "minter".to_string()],
            }),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_drain_target_rejected() {
        let mut config = valid_config();
        config.migration.as_mut().unwrap().drain_target = Address::new("");

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("drain_target"));
    }

    #[test]
    fn test_zero_escrow_amount_rejected() {
        let mut config = valid_config();
        config.migration.as_mut().unwrap().escrow_amount = Amount::zero();

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("escrow_amount"));
    }

    #[test]
    fn test_duplicate_whitelist_rejected() {
        let mut config = valid_config();
        config.tokens.whitelist.push(Address::new("0xusdc"));

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("whitelist"));
    }

    #[test]
    fn test_identical_pool_tokens_rejected() {
        let mut config = valid_config();
        config.pools.push(crate::PoolSpec {
            stable: true,
            token_a: Address::new("0xusdc"),
            token_b: Address::new("0xusdc"),
        });

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("distinct"));
    }

    #[test]
    fn test_errors_are_collected_not_first_only() {
        let mut config = valid_config();
        config.admin.team = Address::new("");
        config.tokens.weth = Address::new("");

        let err = validate_config(&config).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("admin.team"));
        assert!(message.contains("tokens.weth"));
    }
}
