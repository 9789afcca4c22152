//! # Ports Layer
//!
//! Hexagonal boundaries of the execution engine.

pub mod inbound;
pub mod outbound;

pub use inbound::{Contract, IbtpHandler, Stub, StubExt};
pub use outbound::{LedgerState, ValidationEngine};
