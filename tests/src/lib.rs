//! # Bolt Relay Test Suite
//!
//! Unified test crate for flows that cross several built-in contracts.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Chain setup shared by every flow
//! └── integration/      # End-to-end governance and interchain flows
//!     ├── governance_flows.rs
//!     ├── appchain_flows.rs
//!     ├── service_flows.rs
//!     ├── interchain_flows.rs
//!     ├── role_node_flows.rs
//!     ├── dapp_flows.rs
//!     ├── strategy_flows.rs
//!     ├── transition_guards.rs
//!     └── properties.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p bolt-tests
//!
//! # By flow
//! cargo test -p bolt-tests integration::interchain_flows
//!
//! # Benchmarks
//! cargo bench -p bolt-tests
//! ```
//!
//! Set `BOLT_LOG_LEVEL=debug` to see the contracts' log lines.

#![allow(dead_code)]

pub mod fixtures;
pub mod integration;
