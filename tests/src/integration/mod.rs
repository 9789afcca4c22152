//! # Cross-Contract Flows
//!
//! Each module drives the relay through public contract methods only, the
//! way accounts and the executor would, and checks the resulting state.

pub mod appchain_flows;
pub mod dapp_flows;
pub mod governance_flows;
pub mod interchain_flows;
pub mod transition_guards;
