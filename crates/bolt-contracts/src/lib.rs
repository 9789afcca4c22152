//! # Bolt Contracts - Governance and Manager Contracts
//!
//! The built-in contracts of the relay chain, running on [`bolt_vm`].
//!
//! ## Call Graph
//!
//! ```text
//!   account ──► Manager.Register/Update/Freeze/...
//!                  │ governance_pre, reservations, change_status
//!                  ▼
//!               Governance.SubmitProposal ──► Role.GetRolesByType (electorate)
//!                  │
//!   admins  ──► Governance.Vote ... threshold reached
//!                  │
//!                  ▼
//!               Manager.Manage(event, outcome, last status, id, extra)
//!                  │ settle, side effects
//!                  ▼
//!               Interchain.Register / Service.PauseChainService / ...
//! ```
//!
//! ## Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | `governance` | State machine pattern, permissions, proposals, diffs |
//! | `domain` | Governed resources and their transition tables |
//! | `contracts` | The nine contracts |
//! | `genesis` | Initial ledger state |
//! | `registry` | Built-in contract table |
//! | `testing` | In-memory chain for tests |

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// =============================================================================
// MODULES
// =============================================================================

pub mod addresses;
pub mod config;
pub mod contracts;
pub mod domain;
pub mod errors;
pub mod genesis;
pub mod governance;
pub mod registry;
pub mod testing;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use config::GovernanceConfig;
pub use errors::{ContractError, ContractResult};
pub use registry::{builtin_builder, builtin_registry};

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::addresses;
    pub use crate::config::GovernanceConfig;
    pub use crate::contracts::{
        AppchainManager, DappManager, GovernanceContract, InterchainManager, NodeManager, ProposalStrategyManager,
        RoleManager, RuleManager, ServiceManager,
    };
    pub use crate::domain::{Appchain, Dapp, Interchain, Node, Proposal, ProposalStatus, Role, Rule, Service};
    pub use crate::errors::{ContractError, ContractResult};
    pub use crate::governance::{EventType, GovernanceStatus};
    pub use crate::registry::builtin_registry;
    pub use crate::testing::{account, TestChain};
}
