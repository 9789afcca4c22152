//! # Stub
//!
//! [`Stub`] implementation handed to a contract for one frame.

use crate::domain::entities::{Event, EventType, ExecutionContext, Response};
use crate::domain::value_objects::{Address, Arg, TxHash};
use crate::ports::inbound::Stub;
use crate::ports::outbound::ValidationEngine;
use crate::vm::BoltVm;
use tracing::Span;

/// Frame-bound capability object.
pub struct BoltStub<'vm> {
    vm: &'vm BoltVm,
    ctx: ExecutionContext,
}

impl<'vm> BoltStub<'vm> {
    /// Bind `ctx` to `vm`.
    pub(crate) fn new(vm: &'vm BoltVm, ctx: ExecutionContext) -> Self {
        Self { vm, ctx }
    }

    /// Frame context.
    #[must_use]
    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }
}

impl Stub for BoltStub<'_> {
    fn caller(&self) -> &str {
        self.ctx.caller.as_str()
    }

    fn callee(&self) -> &str {
        self.ctx.callee.as_str()
    }

    fn current_caller(&self) -> &str {
        self.ctx.current_caller.as_str()
    }

    fn tx_hash(&self) -> TxHash {
        self.ctx.tx.hash
    }

    fn tx_timestamp(&self) -> i64 {
        self.ctx.tx.timestamp
    }

    fn tx_index(&self) -> u64 {
        self.ctx.tx.index
    }

    fn current_height(&self) -> u64 {
        self.ctx.tx.height
    }

    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.ctx
            .ledger()
            .get_state(&self.ctx.callee, key.as_bytes())
            .filter(|v| !v.is_empty())
    }

    fn set(&self, key: &str, value: Vec<u8>) {
        self.ctx.ledger().set_state(&self.ctx.callee, key.as_bytes(), value);
    }

    fn add(&self, key: &str, value: Vec<u8>) {
        self.ctx.ledger().add_state(&self.ctx.callee, key.as_bytes(), value);
    }

    fn delete(&self, key: &str) {
        self.ctx.ledger().delete_state(&self.ctx.callee, key.as_bytes());
    }

    fn query(&self, prefix: &str) -> Vec<Vec<u8>> {
        self.ctx
            .ledger()
            .query_by_prefix(&self.ctx.callee, prefix.as_bytes())
            .into_iter()
            .filter(|v| !v.is_empty())
            .collect()
    }

    fn post_raw_event(&self, event_type: EventType, data: Vec<u8>) {
        self.ctx.ledger().add_event(Event {
            event_type,
            data,
            tx_hash: self.ctx.tx.hash,
        });
    }

    fn cross_invoke(&self, address: &str, method: &str, args: Vec<Arg>) -> Response {
        let child = self.ctx.child_call(Address::new(address));
        tracing::debug!(
            "[stub] cross invoke {} -> {}.{}",
            self.ctx.callee,
            address,
            method
        );
        self.vm.execute(&child, method, &args)
    }

    fn validation_engine(&self) -> &dyn ValidationEngine {
        self.vm.validation_engine()
    }

    fn span(&self) -> &Span {
        self.ctx.span()
    }
}
