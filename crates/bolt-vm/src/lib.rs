//! # Bolt VM - Built-in Contract Execution Engine
//!
//! Executes native contracts registered at fixed addresses. Every call is
//! synchronous and deterministic; contracts see the ledger only through the
//! [`ports::Stub`] bound to their frame.
//!
//! ## Execution Model
//!
//! | Step | Location | Failure |
//! |------|----------|---------|
//! | Payload decoding | `domain/entities.rs` - `InvokePayload::decode()` | `VmError::InvalidPayload` |
//! | Depth check | `domain/invariants.rs` - `check_call_depth()` | `VmError::CallDepthExceeded` |
//! | Contract lookup | `registry.rs` - `ContractRegistry::get()` | `VmError::ContractNotFound` |
//! | Argument decoding | `domain/args.rs` - `Args::decode()` | `VmError::ArgumentDecode` |
//! | Method resolution | each contract's `dispatch()` | `VmError::MethodNotFound` |
//! | Contract body | `vm.rs` - panic containment | `VmError::Panic` |
//!
//! ## Identity Rules
//!
//! | Field | Top-level call | Nested call |
//! |-------|----------------|-------------|
//! | `caller` | transaction sender | unchanged |
//! | `current_caller` | transaction sender | parent's callee |
//! | `callee` | target contract | target contract |
//!
//! ## Outbound Dependencies
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | `LedgerState` | Per-contract key-value state and event log |
//! | `ValidationEngine` | IBTP proof verification |
//!
//! ## Usage Example
//!
//! ```ignore
//! use bolt_vm::prelude::*;
//!
//! let vm = BoltVm::new(registry, engine);
//! let ctx = ExecutionContext::new_transaction(from, to, tx, ledger);
//! let out = vm.run(&ctx, &payload_bytes)?;
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod registry;
pub mod stub;
pub mod telemetry;
pub mod vm;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use config::VmConfig;
pub use errors::{TelemetryError, ValidationError, VmError};
pub use registry::{BoltContract, ContractRegistry, RegistryBuilder};
pub use stub::BoltStub;
pub use vm::BoltVm;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain
    pub use crate::domain::args::{ArgValue, Args};
    pub use crate::domain::entities::{
        Event, EventType, ExecutionContext, Ibtp, IbtpType, InvokePayload, Response, TxInfo,
    };
    pub use crate::domain::value_objects::{Address, Arg, ArgType, TxHash};

    // Ports
    pub use crate::ports::inbound::{Contract, IbtpHandler, Stub, StubExt};
    pub use crate::ports::outbound::{LedgerState, ValidationEngine};

    // Adapters
    pub use crate::adapters::{InMemoryLedger, StaticValidationEngine};

    // Engine
    pub use crate::config::VmConfig;
    pub use crate::errors::{ValidationError, VmError};
    pub use crate::registry::{BoltContract, ContractRegistry, RegistryBuilder};
    pub use crate::vm::BoltVm;
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
