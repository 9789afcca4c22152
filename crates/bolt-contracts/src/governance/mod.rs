//! # Governance Pattern
//!
//! Building blocks shared by every manager contract.
//!
//! | Module | Role |
//! |--------|------|
//! | `status` | Status, event and outcome vocabulary |
//! | `machine` | Static transition tables |
//! | `store` | `governance_pre` / `change_status` / `settle` over stored resources |
//! | `proposals` | Calls into the governance contract |
//! | `permission` | Fail-closed permission checks |
//! | `audit` | Audit trail events |
//! | `diff` | Typed update diffs |
//! | `index` | Secondary indices and name reservations |
//! | `scoring` | Incremental averages |

pub mod audit;
pub mod call;
pub mod diff;
pub mod index;
pub mod machine;
pub mod permission;
pub mod proposals;
pub mod scoring;
pub mod status;
pub mod store;

pub use machine::{EventRule, StateMachine, Target, Via};
pub use permission::{check_permission, Owner, Permission};
pub use status::{EventType, GovernanceStatus, ManageTrigger};
pub use store::{Governable, ResourceStore};
