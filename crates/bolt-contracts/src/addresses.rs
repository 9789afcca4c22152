//! Fixed addresses of the built-in contracts.

/// Interchain manager.
pub const INTERCHAIN: &str = "0x000000000000000000000000000000000000000a";
/// Rule manager.
pub const RULE_MANAGER: &str = "0x000000000000000000000000000000000000000c";
/// Node manager.
pub const NODE_MANAGER: &str = "0x0000000000000000000000000000000000000010";
/// Role manager.
pub const ROLE_MANAGER: &str = "0x0000000000000000000000000000000000000011";
/// Governance (proposal) contract.
pub const GOVERNANCE: &str = "0x0000000000000000000000000000000000000012";
/// Appchain manager.
pub const APPCHAIN_MANAGER: &str = "0x0000000000000000000000000000000000000013";
/// Service manager.
pub const SERVICE_MANAGER: &str = "0x0000000000000000000000000000000000000014";
/// Dapp manager.
pub const DAPP_MANAGER: &str = "0x0000000000000000000000000000000000000015";
/// Proposal strategy manager.
pub const PROPOSAL_STRATEGY_MANAGER: &str = "0x0000000000000000000000000000000000000016";

/// Every manager contract allowed to submit proposals.
pub const MANAGERS: &[&str] = &[
    APPCHAIN_MANAGER,
    RULE_MANAGER,
    NODE_MANAGER,
    ROLE_MANAGER,
    DAPP_MANAGER,
    SERVICE_MANAGER,
    PROPOSAL_STRATEGY_MANAGER,
];
