//! Assembly of the built-in contract table.

use crate::addresses;
use crate::config::GovernanceConfig;
use crate::contracts::{
    AppchainManager, DappManager, GovernanceContract, InterchainManager, NodeManager, ProposalStrategyManager,
    RoleManager, RuleManager, ServiceManager,
};
use bolt_vm::registry::{BoltContract, ContractRegistry, RegistryBuilder};
use bolt_vm::VmError;
use std::sync::Arc;

/// Builder pre-loaded with the nine built-in contracts.
///
/// Hosts add extension contracts on the returned builder before calling
/// `build()`.
pub fn builtin_builder(config: &GovernanceConfig) -> RegistryBuilder {
    let config = Arc::new(config.clone());
    ContractRegistry::builder()
        .ibtp_handler(
            "interchain contract",
            addresses::INTERCHAIN,
            Arc::new(InterchainManager::new(Arc::clone(&config))),
        )
        .register_all([
            BoltContract::new(
                "governance service",
                addresses::GOVERNANCE,
                Arc::new(GovernanceContract::new(Arc::clone(&config))),
            ),
            BoltContract::new(
                "role manager service",
                addresses::ROLE_MANAGER,
                Arc::new(RoleManager::new(Arc::clone(&config))),
            ),
            BoltContract::new("node manager service", addresses::NODE_MANAGER, Arc::new(NodeManager::new())),
            BoltContract::new("rule manager service", addresses::RULE_MANAGER, Arc::new(RuleManager::new())),
            BoltContract::new(
                "appchain manager service",
                addresses::APPCHAIN_MANAGER,
                Arc::new(AppchainManager::new()),
            ),
            BoltContract::new(
                "service manager service",
                addresses::SERVICE_MANAGER,
                Arc::new(ServiceManager::new(Arc::clone(&config))),
            ),
            BoltContract::new(
                "dapp manager service",
                addresses::DAPP_MANAGER,
                Arc::new(DappManager::new(config)),
            ),
            BoltContract::new(
                "proposal strategy manager service",
                addresses::PROPOSAL_STRATEGY_MANAGER,
                Arc::new(ProposalStrategyManager::new()),
            ),
        ])
}

/// The built-in contract table.
pub fn builtin_registry(config: &GovernanceConfig) -> Result<ContractRegistry, VmError> {
    builtin_builder(config).build()
}
