//! Core configuration structures for a deployment run

use serde::{Deserialize, Serialize};

use dromos_types::{Address, Amount};

/// Everything a run needs to know that is not derivable from the plan
/// itself: who ends up in control, which external assets exist, and where
/// the legacy system lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Post-deployment control handoff targets.
    pub admin: AdminConfig,

    /// External token addresses.
    pub tokens: TokenConfig,

    /// Engine-level knobs.
    #[serde(default)]
    pub deployment: DeploymentConfig,

    /// Pools of two external tokens.
    #[serde(default)]
    pub pools: Vec<PoolSpec>,

    /// Pools pairing the protocol token with an external token.
    #[serde(default)]
    pub token_pools: Vec<TokenPoolSpec>,

    /// Legacy system coordinates; present only on networks that replace a
    /// predecessor deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migration: Option<MigrationConfig>,
}

/// Addresses that receive control of the system once it is wired up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Team multisig: governor, pauser, emergency council.
    pub team: Address,

    /// Address allowed to change pool fees afterwards.
    pub fee_manager: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Wrapped native token, passed to the router.
    pub weth: Address,

    /// Tokens whitelisted for gauge creation. The protocol token is added
    /// automatically.
    #[serde(default)]
    pub whitelist: Vec<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Gas ceiling applied to every construction and call.
    #[serde(default = "default_gas_ceiling")]
    pub gas_ceiling: u64,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            gas_ceiling: default_gas_ceiling(),
        }
    }
}

/// A pool of two external tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSpec {
    pub stable: bool,
    pub token_a: Address,
    pub token_b: Address,
}

/// A pool pairing the protocol token with an external token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPoolSpec {
    pub stable: bool,
    pub token: Address,
}

/// Coordinates of the legacy system and the parameters of the one-time
/// migration into the new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    pub legacy_token: Address,
    pub legacy_escrow: Address,
    pub legacy_voter: Address,

    /// Legacy reward-emission destination to drain. Must be filled in
    /// before the migration can run.
    pub drain_target: Address,

    /// Account funding the escrow transfer.
    pub operator: Address,

    /// Fixed legacy amount moved into custody, in base units.
    pub escrow_amount: Amount,

    /// Duration of the permanent lock, in seconds.
    #[serde(default = "default_lock_duration_secs")]
    pub lock_duration_secs: u64,

    /// Type name of the bridging facilitator contract.
    #[serde(default = "default_facilitator_type")]
    pub facilitator_type: String,

    /// New-system units the facilitator is constructed against.
    #[serde(default = "default_facilitator_links")]
    pub facilitator_links: Vec<String>,
}

fn default_gas_ceiling() -> u64 {
    5_000_000
}

/// Four years, the maximum lock the escrow accepts.
fn default_lock_duration_secs() -> u64 {
    4 * 365 * 86_400
}

fn default_facilitator_type() -> String {
    "SinkManager".to_string()
}

fn default_facilitator_links() -> Vec<String> {
    vec!["token".to_string(), "minter".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deployment_defaults() {
        let deployment = DeploymentConfig::default();
        assert_eq!(deployment.gas_ceiling, 5_000_000);
    }

    #[test]
    fn test_migration_defaults_fill_in() {
        let toml = r#"
            legacy_token = "0xv1-token"
            legacy_escrow = "0xv1-escrow"
            legacy_voter = "0xv1-voter"
            drain_target = "0xdrain"
            operator = "0xoperator"
            escrow_amount = "444000000000000000000000000"
        "#;

        let migration: MigrationConfig = toml::from_str(toml).unwrap();
        assert_eq!(migration.lock_duration_secs, 126_144_000);
        assert_eq!(migration.facilitator_type, "SinkManager");
        assert_eq!(migration.facilitator_links, vec!["token", "minter"]);
        assert_eq!(
            migration.escrow_amount,
            Amount::new(444_000_000_000_000_000_000_000_000)
        );
    }
}
