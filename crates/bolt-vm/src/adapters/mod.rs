//! # Adapters Layer
//!
//! Concrete implementations of the outbound ports.

pub mod memory_ledger;
pub mod validation;

pub use memory_ledger::{InMemoryLedger, LedgerSnapshot, StateWrite, WriteOp};
pub use validation::StaticValidationEngine;
