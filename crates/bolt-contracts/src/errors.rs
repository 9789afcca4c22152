//! # Error Types
//!
//! Failure taxonomy of the manager contracts. Every variant carries a stable
//! numeric code and crosses the contract boundary as a failed
//! [`Response`] whose message reads `[code] message`.

use bolt_vm::domain::entities::Response;
use bolt_vm::VmError;
use thiserror::Error;

/// Result alias used by every contract operation.
pub type ContractResult<T> = Result<T, ContractError>;

/// Errors raised by built-in contract operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// The resource, proposal or record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The requested event is not legal from the resource's current status.
    #[error("the {kind} {id} is in status {status} and can not handle event {event}")]
    IllegalTransition {
        /// Resource kind
        kind: &'static str,
        /// Resource id
        id: String,
        /// Current status
        status: String,
        /// Rejected event or outcome
        event: String,
    },

    /// The caller failed every requested permission check.
    #[error("{caller} has no permission: {reason}")]
    PermissionDenied {
        /// Rejected address
        caller: String,
        /// Why the last check failed
        reason: String,
    },

    /// Malformed input.
    #[error("{0}")]
    Validation(String),

    /// The name or account is already held by another resource.
    #[error("{name} is occupied by {holder}")]
    DuplicateName {
        /// Contested name
        name: String,
        /// Current holder
        holder: String,
    },

    /// A nested call returned a failed response.
    #[error("cross invoke {method} error: {message}")]
    DownstreamCall {
        /// Invoked method
        method: String,
        /// The downstream result text
        message: String,
    },

    /// Serialization failure or inconsistent state.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ContractError {
    /// Stable numeric code.
    #[must_use]
    pub fn code(&self) -> u32 {
        match self {
            Self::NotFound(_) => 1,
            Self::IllegalTransition { .. } => 2,
            Self::PermissionDenied { .. } => 3,
            Self::Validation(_) => 4,
            Self::DuplicateName { .. } => 5,
            Self::DownstreamCall { .. } => 6,
            Self::Internal(_) => 7,
        }
    }

    /// Shorthand for a permission failure.
    pub fn denied(caller: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PermissionDenied {
            caller: caller.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a validation failure.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Shorthand for a missing record.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<VmError> for ContractError {
    fn from(err: VmError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ContractError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<ContractError> for Response {
    fn from(err: ContractError) -> Self {
        Response::error(format!("[{}] {}", err.code(), err))
    }
}
