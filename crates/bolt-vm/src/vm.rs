//! # Bolt VM
//!
//! Dispatcher for built-in contracts.
//!
//! ## Dispatch Order
//!
//! 1. Depth check against [`VmConfig::max_call_depth`]
//! 2. Registry lookup of the callee
//! 3. Argument decoding
//! 4. Contract body, with panics contained
//!
//! Steps 1-3 fail before any contract code runs.

use crate::config::VmConfig;
use crate::domain::args::Args;
use crate::domain::entities::{ExecutionContext, Ibtp, InvokePayload, Response};
use crate::domain::invariants::check_call_depth;
use crate::domain::value_objects::Arg;
use crate::errors::VmError;
use crate::ports::outbound::ValidationEngine;
use crate::registry::ContractRegistry;
use crate::stub::BoltStub;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Built-in contract execution engine.
#[derive(Clone)]
pub struct BoltVm {
    registry: Arc<ContractRegistry>,
    engine: Arc<dyn ValidationEngine>,
    config: VmConfig,
}

impl BoltVm {
    /// Create an engine with default configuration.
    pub fn new(registry: Arc<ContractRegistry>, engine: Arc<dyn ValidationEngine>) -> Self {
        Self::with_config(registry, engine, VmConfig::default())
    }

    /// Create an engine with explicit configuration.
    pub fn with_config(
        registry: Arc<ContractRegistry>,
        engine: Arc<dyn ValidationEngine>,
        config: VmConfig,
    ) -> Self {
        Self {
            registry,
            engine,
            config,
        }
    }

    /// Contract table.
    #[must_use]
    pub fn registry(&self) -> &ContractRegistry {
        &self.registry
    }

    /// External validation engine.
    #[must_use]
    pub fn validation_engine(&self) -> &dyn ValidationEngine {
        self.engine.as_ref()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Decode an encoded [`InvokePayload`] and run it.
    pub fn run(&self, ctx: &ExecutionContext, input: &[u8]) -> Result<Vec<u8>, VmError> {
        let payload = InvokePayload::decode(input)?;
        self.invoke(ctx, &payload)
    }

    /// Run a decoded payload. A failed contract response becomes
    /// [`VmError::CallError`].
    pub fn invoke(&self, ctx: &ExecutionContext, payload: &InvokePayload) -> Result<Vec<u8>, VmError> {
        let response = self.dispatch(ctx, &payload.method, &payload.args)?;
        if response.ok {
            Ok(response.result)
        } else {
            Err(VmError::CallError(response.result_str().into_owned()))
        }
    }

    /// Run a call and return the contract's response verbatim.
    ///
    /// Dispatch failures are folded into a failed response.
    pub fn execute(&self, ctx: &ExecutionContext, method: &str, args: &[Arg]) -> Response {
        match self.dispatch(ctx, method, args) {
            Ok(response) => response,
            Err(err) => Response::error(err.to_string()),
        }
    }

    /// Route an IBTP to the registered interchain handler.
    pub fn handle_ibtp(&self, ctx: &ExecutionContext, ibtp: &Ibtp) -> Result<Response, VmError> {
        check_call_depth(ctx.depth, self.config.max_call_depth)?;
        let handler = self.registry.ibtp_handler()?;
        let stub = BoltStub::new(self, ctx.clone());
        let _guard = ctx.span().enter();
        debug!("[boltvm] handle ibtp {}", ibtp.id());
        self.contain(|| Ok(handler.handle_ibtp(&stub, ibtp)))
    }

    fn dispatch(&self, ctx: &ExecutionContext, method: &str, args: &[Arg]) -> Result<Response, VmError> {
        check_call_depth(ctx.depth, self.config.max_call_depth)?;
        let entry = self.registry.get(&ctx.callee)?;
        let args = Args::decode(args)?;
        let stub = BoltStub::new(self, ctx.clone());

        let _guard = ctx.span().enter();
        debug!("[boltvm] {}.{} from {}", entry.name, method, ctx.current_caller);
        let response = self.contain(|| entry.contract.dispatch(&stub, method, &args))?;
        if !response.ok {
            debug!(
                "[boltvm] {}.{} failed: {}",
                entry.name,
                method,
                response.result_str()
            );
        }
        Ok(response)
    }

    fn contain<F>(&self, body: F) -> Result<Response, VmError>
    where
        F: FnOnce() -> Result<Response, VmError>,
    {
        if !self.config.recover_panics {
            return body();
        }
        match catch_unwind(AssertUnwindSafe(body)) {
            Ok(result) => result,
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                warn!("[boltvm] contract panicked: {}", msg);
                Err(VmError::Panic(msg))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
