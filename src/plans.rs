//! The declarative plan catalog.
//!
//! Each function builds the unit descriptors for one run. Ordering is the
//! planner's job: descriptors declare what they reference and the dependency
//! graph works out the rest.

use dromos_config::DeployConfig;
use dromos_types::{Arg, UnitDescriptor};

/// The full core system: factories, registry, voting escrow with its linked
/// libraries, rewards distribution, voter, router, and minter, plus the
/// post-deploy wiring that hands control to the team.
pub fn core_system(config: &DeployConfig) -> Vec<UnitDescriptor> {
    let team = Arg::Address(config.admin.team.clone());

    // The protocol token joins the whitelist alongside the configured
    // external tokens.
    let mut whitelist: Vec<Arg> = config
        .tokens
        .whitelist
        .iter()
        .cloned()
        .map(Arg::Address)
        .collect();
    whitelist.push(Arg::reference("token"));

    vec![
        UnitDescriptor::contract("token", "Dromos")
            .post_deploy("setMinter", vec![Arg::reference("minter")]),
        UnitDescriptor::contract("poolImplementation", "Pool"),
        UnitDescriptor::contract("poolFactory", "PoolFactory")
            .constructor_arg(Arg::reference("poolImplementation"))
            .post_deploy("setFee", vec![Arg::Bool(true), Arg::uint(1u64)])
            .post_deploy("setFee", vec![Arg::Bool(false), Arg::uint(1u64)])
            .post_deploy("setPauser", vec![team.clone()])
            .post_deploy(
                "setFeeManager",
                vec![Arg::Address(config.admin.fee_manager.clone())],
            )
            .post_deploy("setVoter", vec![Arg::reference("voter")]),
        UnitDescriptor::contract("votingRewardsFactory", "VotingRewardsFactory"),
        UnitDescriptor::contract("gaugeFactory", "GaugeFactory"),
        UnitDescriptor::contract("managedRewardsFactory", "ManagedRewardsFactory"),
        UnitDescriptor::contract("factoryRegistry", "FactoryRegistry")
            .constructor_arg(Arg::reference("poolFactory"))
            .constructor_arg(Arg::reference("votingRewardsFactory"))
            .constructor_arg(Arg::reference("gaugeFactory"))
            .constructor_arg(Arg::reference("managedRewardsFactory"))
            .post_deploy("transferOwnership", vec![team.clone()]),
        UnitDescriptor::contract("forwarder", "Forwarder"),
        UnitDescriptor::library("balanceLogicLibrary", "BalanceLogicLibrary"),
        UnitDescriptor::library("delegationLogicLibrary", "DelegationLogicLibrary"),
        UnitDescriptor::contract("votingEscrow", "VotingEscrow")
            .link("BalanceLogicLibrary", "balanceLogicLibrary")
            .link("DelegationLogicLibrary", "delegationLogicLibrary")
            .constructor_arg(Arg::reference("forwarder"))
            .constructor_arg(Arg::reference("token"))
            .constructor_arg(Arg::reference("factoryRegistry"))
            .post_deploy("setArtProxy", vec![Arg::reference("artProxy")])
            .post_deploy(
                "setVoterAndDistributor",
                vec![
                    Arg::reference("voter"),
                    Arg::reference("rewardsDistributor"),
                ],
            )
            .post_deploy("setTeam", vec![team.clone()]),
        UnitDescriptor::library("trig", "Trig"),
        UnitDescriptor::library("perlinNoise", "PerlinNoise"),
        UnitDescriptor::contract("artProxy", "VeArtProxy")
            .link("Trig", "trig")
            .link("PerlinNoise", "perlinNoise")
            .constructor_arg(Arg::reference("votingEscrow")),
        UnitDescriptor::contract("rewardsDistributor", "RewardsDistributor")
            .constructor_arg(Arg::reference("votingEscrow"))
            .post_deploy("setMinter", vec![Arg::reference("minter")]),
        UnitDescriptor::contract("voter", "Voter")
            .constructor_arg(Arg::reference("forwarder"))
            .constructor_arg(Arg::reference("votingEscrow"))
            .constructor_arg(Arg::reference("factoryRegistry"))
            .post_deploy(
                "initialize",
                vec![Arg::List(whitelist), Arg::reference("minter")],
            )
            .post_deploy("setEmergencyCouncil", vec![team.clone()])
            .post_deploy("setEpochGovernor", vec![team.clone()])
            .post_deploy("setGovernor", vec![team]),
        UnitDescriptor::contract("router", "Router")
            .constructor_arg(Arg::reference("forwarder"))
            .constructor_arg(Arg::reference("factoryRegistry"))
            .constructor_arg(Arg::reference("poolFactory"))
            .constructor_arg(Arg::reference("voter"))
            .constructor_arg(Arg::Address(config.tokens.weth.clone())),
        UnitDescriptor::contract("minter", "Minter")
            .constructor_arg(Arg::reference("voter"))
            .constructor_arg(Arg::reference("votingEscrow"))
            .constructor_arg(Arg::reference("rewardsDistributor")),
    ]
}

/// The governors run: deployed later, against an existing system read back
/// from a previous output record (`votingEscrow`, `forwarder`, `minter` come
/// from the seed table).
pub fn governors(config: &DeployConfig) -> Vec<UnitDescriptor> {
    vec![
        UnitDescriptor::contract("governor", "DromosGovernor")
            .constructor_arg(Arg::reference("votingEscrow"))
            .post_deploy("setVetoer", vec![Arg::Address(config.admin.team.clone())]),
        UnitDescriptor::contract("epochGovernor", "EpochGovernor")
            .constructor_arg(Arg::reference("forwarder"))
            .constructor_arg(Arg::reference("votingEscrow"))
            .constructor_arg(Arg::reference("minter")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use dromos_config::ConfigLoader;
    use dromos_plan::ExecutionPlan;
    use dromos_types::{Address, AddressTable, UnitKind};

    fn sample_config() -> DeployConfig {
        ConfigLoader::from_toml(
            r#"
            [admin]
            team = "0xteam"
            fee_manager = "0xfees"

            [tokens]
            weth = "0xweth"
            whitelist = ["0xusdc"]
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_core_system_plan_is_acyclic_and_complete() {
        let units = core_system(&sample_config());
        let plan = ExecutionPlan::build(units, &AddressTable::new()).unwrap();
        assert_eq!(plan.len(), 18);

        // Libraries land before the units that link them.
        let escrow = plan.position(&"votingEscrow".into()).unwrap();
        assert!(plan.position(&"balanceLogicLibrary".into()).unwrap() < escrow);
        assert!(plan.position(&"delegationLogicLibrary".into()).unwrap() < escrow);

        // The registry waits for all four factories.
        let registry = plan.position(&"factoryRegistry".into()).unwrap();
        for factory in [
            "poolFactory",
            "votingRewardsFactory",
            "gaugeFactory",
            "managedRewardsFactory",
        ] {
            assert!(plan.position(&factory.into()).unwrap() < registry);
        }
    }

    #[test]
    fn test_core_system_has_four_libraries() {
        let units = core_system(&sample_config());
        let libraries: Vec<&str> = units
            .iter()
            .filter(|u| u.kind == UnitKind::Library)
            .map(|u| u.name.as_str())
            .collect();
        assert_eq!(
            libraries,
            vec![
                "balanceLogicLibrary",
                "delegationLogicLibrary",
                "trig",
                "perlinNoise"
            ]
        );
    }

    #[test]
    fn test_governors_resolve_against_seed() {
        let seed = AddressTable::seeded([
            ("votingEscrow".into(), Address::new("0x0b")),
            ("forwarder".into(), Address::new("0x08")),
            ("minter".into(), Address::new("0x12")),
        ]);
        let plan = ExecutionPlan::build(governors(&sample_config()), &seed).unwrap();
        assert_eq!(plan.len(), 2);
    }
}
