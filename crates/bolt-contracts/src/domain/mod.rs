//! # Domain
//!
//! Resources governed by the manager contracts, their transition tables,
//! proposals and identifiers.

pub mod appchain;
pub mod dapp;
pub mod ids;
pub mod interchain;
pub mod node;
pub mod proposal;
pub mod role;
pub mod rule;
pub mod service;
pub mod strategy;

pub use appchain::Appchain;
pub use dapp::Dapp;
pub use ids::{ChainServiceId, FullServiceId};
pub use interchain::Interchain;
pub use node::Node;
pub use proposal::{Proposal, ProposalStatus, ProposalStrategy, ProposalType};
pub use role::Role;
pub use rule::Rule;
pub use service::Service;
pub use strategy::{ModuleStrategy, StrategyKind};
