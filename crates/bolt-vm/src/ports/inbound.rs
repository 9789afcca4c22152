//! # Inbound Ports (Driving Ports)
//!
//! The contract capability surface: what a built-in contract implements
//! ([`Contract`], [`IbtpHandler`]) and the only handle it receives ([`Stub`]).

use crate::domain::args::Args;
use crate::domain::entities::{EventType, Ibtp, Response};
use crate::domain::value_objects::{Arg, TxHash};
use crate::errors::VmError;
use crate::ports::outbound::ValidationEngine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::Span;

// =============================================================================
// CONTRACT
// =============================================================================

/// A built-in contract.
///
/// Contracts are stateless between calls: all durable state lives in the
/// ledger and is reached through the [`Stub`] passed to each call.
pub trait Contract: Send + Sync {
    /// Contract name used in logs.
    fn name(&self) -> &'static str;

    /// Resolve `method` against the contract's operation set and run it.
    ///
    /// Returns `Err` only for wire-boundary failures (unknown method, bad
    /// arguments). Business failures are `Ok` responses with `ok = false`.
    fn dispatch(&self, stub: &dyn Stub, method: &str, args: &Args) -> Result<Response, VmError>;
}

/// Typed IBTP entry point, bypassing generic method dispatch.
pub trait IbtpHandler: Send + Sync {
    /// Handle one interchain message.
    fn handle_ibtp(&self, stub: &dyn Stub, ibtp: &Ibtp) -> Response;
}

// =============================================================================
// STUB
// =============================================================================

/// Capability object bound to one contract frame.
///
/// State access is scoped to the frame's callee address.
pub trait Stub {
    /// Original transaction sender.
    fn caller(&self) -> &str;
    /// Contract executing in this frame.
    fn callee(&self) -> &str;
    /// Immediate invoker of this frame.
    fn current_caller(&self) -> &str;

    /// Transaction hash.
    fn tx_hash(&self) -> TxHash;
    /// Transaction timestamp.
    fn tx_timestamp(&self) -> i64;
    /// Transaction index within the block.
    fn tx_index(&self) -> u64;
    /// Current block height.
    fn current_height(&self) -> u64;

    /// True when `key` holds a value.
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
    /// Raw read.
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    /// Raw replace.
    fn set(&self, key: &str, value: Vec<u8>);
    /// Raw additive merge.
    fn add(&self, key: &str, value: Vec<u8>);
    /// Raw delete.
    fn delete(&self, key: &str);
    /// Values of every key starting with `prefix`.
    fn query(&self, prefix: &str) -> Vec<Vec<u8>>;

    /// Append an already encoded event.
    fn post_raw_event(&self, event_type: EventType, data: Vec<u8>);

    /// Synchronous nested call preserving the original sender.
    ///
    /// Returns the nested Response verbatim; the calling contract must
    /// check `ok` itself.
    fn cross_invoke(&self, address: &str, method: &str, args: Vec<Arg>) -> Response;

    /// External rule validation engine.
    fn validation_engine(&self) -> &dyn ValidationEngine;

    /// Logging span of this frame.
    fn span(&self) -> &Span;
}

/// JSON helpers over any [`Stub`].
pub trait StubExt: Stub {
    /// Read and decode a JSON object.
    fn get_object<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, VmError> {
        match self.get(key) {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    /// Encode and store a JSON object, replacing any previous value.
    fn set_object<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), VmError> {
        self.set(key, serde_json::to_vec(value)?);
        Ok(())
    }

    /// Encode and merge a JSON object into the existing value.
    fn add_object<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), VmError> {
        self.add(key, serde_json::to_vec(value)?);
        Ok(())
    }

    /// Encode and append an application event.
    fn post_event<T: Serialize + ?Sized>(
        &self,
        event_type: EventType,
        event: &T,
    ) -> Result<(), VmError> {
        self.post_raw_event(event_type, serde_json::to_vec(event)?);
        Ok(())
    }

    /// Encode and append an interchain event.
    fn post_interchain_event<T: Serialize + ?Sized>(&self, event: &T) -> Result<(), VmError> {
        self.post_event(EventType::Interchain, event)
    }
}

impl<S: Stub + ?Sized> StubExt for S {}
