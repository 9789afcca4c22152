//! # Genesis State
//!
//! Seeds the ledger before the first block: the relay chain id read by the
//! interchain manager, the super governance admins that form the first
//! electorate and one proposal strategy record per proposal type. Writes go straight to the ledger, bypassing the contracts,
//! because no account exists yet that could pass a permission check.

use crate::addresses;
use crate::config::GovernanceConfig;
use crate::contracts::interchain::BITXHUB_ID_KEY;
use crate::contracts::role_manager::occupied_key;
use crate::domain::proposal::ProposalType;
use crate::domain::role::{Role, RoleType};
use crate::domain::strategy::ModuleStrategy;
use crate::errors::{ContractError, ContractResult};
use crate::governance::status::GovernanceStatus;
use crate::governance::store::Governable;
use bolt_vm::domain::value_objects::Address;
use bolt_vm::ports::LedgerState;
use tracing::info;

/// Write the genesis state described by `config`.
///
/// Fails before writing anything when the configuration is invalid or
/// lists an admin twice.
pub fn apply(ledger: &dyn LedgerState, config: &GovernanceConfig) -> ContractResult<()> {
    config.validate()?;
    for (i, admin) in config.super_admins.iter().enumerate() {
        if config.super_admins[..i].contains(admin) {
            return Err(ContractError::invalid(format!("duplicate genesis admin {admin}")));
        }
    }

    let interchain = Address::new(addresses::INTERCHAIN);
    ledger.set_state(
        &interchain,
        BITXHUB_ID_KEY.as_bytes(),
        config.bitxhub_id.as_bytes().to_vec(),
    );

    let role_manager = Address::new(addresses::ROLE_MANAGER);
    for admin in &config.super_admins {
        let role = Role {
            id: admin.clone(),
            typ: RoleType::GovernanceAdmin,
            weight: config.super_admin_weight,
            node_account: String::new(),
            appchain_id: String::new(),
            status: GovernanceStatus::Available,
        };
        ledger.set_state(&role_manager, Role::key(admin).as_bytes(), serde_json::to_vec(&role)?);
        ledger.set_state(
            &role_manager,
            occupied_key(admin).as_bytes(),
            RoleType::GovernanceAdmin.as_str().as_bytes().to_vec(),
        );
    }

    let strategy_manager = Address::new(addresses::PROPOSAL_STRATEGY_MANAGER);
    for typ in ProposalType::ALL {
        let record = config.default_strategy(typ);
        ledger.set_state(
            &strategy_manager,
            ModuleStrategy::key(typ.as_str()).as_bytes(),
            serde_json::to_vec(&record)?,
        );
    }

    info!(
        "[genesis] bitxhub {} with {} super admins",
        config.bitxhub_id,
        config.super_admins.len()
    );
    Ok(())
}
