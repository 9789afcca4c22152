//! # Domain Layer
//!
//! Entities, value objects, argument decoding and invariants of the
//! execution engine.

pub mod args;
pub mod entities;
pub mod invariants;
pub mod value_objects;

pub use args::{ArgValue, Args};
pub use entities::{
    Event, EventType, ExecutionContext, Ibtp, IbtpType, InvokePayload, Response, TxInfo,
};
pub use invariants::{check_call_depth, identity_propagated};
pub use value_objects::{Address, Arg, ArgType, TxHash};
