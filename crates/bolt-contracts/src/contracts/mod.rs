//! # Built-in Contracts
//!
//! | Contract | Address | Resource |
//! |----------|---------|----------|
//! | `InterchainManager` | `addresses::INTERCHAIN` | interchain counters |
//! | `GovernanceContract` | `addresses::GOVERNANCE` | proposals |
//! | `RoleManager` | `addresses::ROLE_MANAGER` | roles |
//! | `NodeManager` | `addresses::NODE_MANAGER` | nodes |
//! | `RuleManager` | `addresses::RULE_MANAGER` | validation rules |
//! | `AppchainManager` | `addresses::APPCHAIN_MANAGER` | appchains |
//! | `ServiceManager` | `addresses::SERVICE_MANAGER` | services |
//! | `DappManager` | `addresses::DAPP_MANAGER` | dapps |
//! | `ProposalStrategyManager` | `addresses::PROPOSAL_STRATEGY_MANAGER` | decision rules |
//!
//! Every contract decodes `(method, args)` into a closed operation enum;
//! an unknown method is the only `MethodNotFound` path. Business failures
//! become failed responses at the end of `dispatch`.

pub mod appchain_manager;
pub mod dapp_manager;
pub mod governance;
pub mod interchain;
pub mod node_manager;
pub mod role_manager;
pub mod rule_manager;
pub mod service_manager;
pub mod strategy_manager;

pub use appchain_manager::AppchainManager;
pub use dapp_manager::DappManager;
pub use governance::GovernanceContract;
pub use interchain::InterchainManager;
pub use node_manager::NodeManager;
pub use role_manager::RoleManager;
pub use rule_manager::RuleManager;
pub use service_manager::ServiceManager;
pub use strategy_manager::ProposalStrategyManager;

use crate::errors::ContractResult;
use crate::governance::status::{parse_last_status, EventType, GovernanceStatus, ManageTrigger};
use bolt_vm::domain::args::Args;
use bolt_vm::domain::entities::Response;
use bolt_vm::VmError;
use tracing::{debug, warn};

/// Turn an operation result into the contract's response.
pub(crate) fn respond(contract: &str, method: &str, result: ContractResult<Response>) -> Response {
    match result {
        Ok(response) => {
            debug!("[{contract}] {method} ok");
            response
        }
        Err(err) => {
            warn!("[{contract}] {method} failed: {err}");
            err.into()
        }
    }
}

/// Raw arguments of a `Manage` callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ManageArgs {
    pub event: String,
    pub result: String,
    pub last_status: String,
    pub obj_id: String,
    pub extra: Vec<u8>,
}

impl ManageArgs {
    pub(crate) fn decode(method: &str, args: &Args) -> Result<Self, VmError> {
        args.expect_len(method, 5)?;
        Ok(Self {
            event: args.string(0)?,
            result: args.string(1)?,
            last_status: args.string(2)?,
            obj_id: args.string(3)?,
            extra: args.bytes(4)?,
        })
    }

    pub(crate) fn parse(&self) -> ContractResult<ManageCall> {
        Ok(ManageCall {
            event: self.event.parse()?,
            trigger: self.result.parse()?,
            last: parse_last_status(&self.last_status)?,
            obj_id: self.obj_id.clone(),
            extra: self.extra.clone(),
        })
    }
}

/// A parsed `Manage` callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ManageCall {
    /// Event of the closing proposal.
    pub event: EventType,
    /// Outcome, or the event of a resumed proposal.
    pub trigger: ManageTrigger,
    /// Status recorded when the proposal opened.
    pub last: Option<GovernanceStatus>,
    /// Governed object.
    pub obj_id: String,
    /// Proposal payload.
    pub extra: Vec<u8>,
}

impl ManageCall {
    /// True when the closing proposal's approval side effects apply.
    pub fn approved(&self) -> bool {
        self.trigger.is_approved()
    }
}
