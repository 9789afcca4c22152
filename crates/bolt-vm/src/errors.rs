//! # Error Types
//!
//! All error types for built-in contract dispatch.

use thiserror::Error;

// =============================================================================
// VM ERRORS
// =============================================================================

/// Errors that can occur while dispatching a built-in contract call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VmError {
    /// The invocation payload could not be decoded.
    #[error("unmarshal invoke payload: {0}")]
    InvalidPayload(String),

    /// No contract is registered at the callee address.
    #[error("the address {0} is not a bolt contract")]
    ContractNotFound(String),

    /// The contract exposes no operation with this name.
    #[error("not such method `{0}`")]
    MethodNotFound(String),

    /// The operation was called with the wrong number of arguments.
    #[error("method `{method}` expects {expected} arguments, got {got}")]
    ArgumentCount {
        /// Method name
        method: String,
        /// Declared arity
        expected: usize,
        /// Supplied arity
        got: usize,
    },

    /// An argument could not be decoded into the declared wire type.
    #[error("parse args: argument {index} is not a valid {expected}: {reason}")]
    ArgumentDecode {
        /// Zero-based argument position
        index: usize,
        /// Expected wire type
        expected: &'static str,
        /// Decoder message
        reason: String,
    },

    /// Two contracts were registered under the same address.
    #[error("duplicate bolt contract address: {0}")]
    DuplicateContract(String),

    /// No interchain handler is registered for the IBTP fast path.
    #[error("no ibtp handler registered")]
    MissingIbtpHandler,

    /// The contract returned a failed response.
    #[error("call error: {0}")]
    CallError(String),

    /// The contract panicked; the panic was contained by the dispatcher.
    #[error("contract panicked: {0}")]
    Panic(String),

    /// Nested cross invocations went deeper than allowed.
    #[error("call depth exceeded: {depth} > {max}")]
    CallDepthExceeded {
        /// Depth of the rejected frame
        depth: usize,
        /// Configured maximum
        max: usize,
    },

    /// JSON (de)serialization of a stored object or event failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for VmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl VmError {
    /// Returns true for errors raised before the contract body ran.
    #[must_use]
    pub fn is_dispatch_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPayload(_)
                | Self::ContractNotFound(_)
                | Self::MethodNotFound(_)
                | Self::ArgumentCount { .. }
                | Self::ArgumentDecode { .. }
                | Self::CallDepthExceeded { .. }
        )
    }
}

// =============================================================================
// VALIDATION ERRORS
// =============================================================================

/// Errors raised by the external rule validation engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The rule contract could not be located or executed.
    #[error("rule {0} is not available")]
    RuleUnavailable(String),

    /// The proof was malformed.
    #[error("malformed proof: {0}")]
    MalformedProof(String),
}

// =============================================================================
// TELEMETRY ERRORS
// =============================================================================

/// Errors from logging initialisation.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),

    /// A global subscriber was already installed.
    #[error("subscriber init failed: {0}")]
    SubscriberInit(String),
}
