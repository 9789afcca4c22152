//! # Domain Entities
//!
//! Core entities for built-in contract execution.

use super::value_objects::{Address, Arg, TxHash};
use crate::errors::VmError;
use crate::ports::outbound::LedgerState;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::Span;

// =============================================================================
// TRANSACTION INFO
// =============================================================================

/// Transaction attributes visible to contracts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TxInfo {
    /// Transaction hash.
    pub hash: TxHash,
    /// Index of the transaction within its block.
    pub index: u64,
    /// Transaction timestamp (nanoseconds).
    pub timestamp: i64,
    /// Height of the block being executed.
    pub height: u64,
}

// =============================================================================
// EXECUTION CONTEXT
// =============================================================================

/// Immutable per-frame execution snapshot.
///
/// Created once per transaction and re-derived (never mutated) for every
/// nested cross invocation through [`ExecutionContext::child_call`].
#[derive(Clone)]
pub struct ExecutionContext {
    /// Original transaction sender. Stable across the whole call tree.
    pub caller: Address,
    /// Contract executing in this frame.
    pub callee: Address,
    /// Immediate invoker of this frame.
    pub current_caller: Address,
    /// Transaction attributes.
    pub tx: TxInfo,
    /// Nesting depth, 0 for the top-level call.
    pub depth: usize,
    ledger: Arc<dyn LedgerState>,
    span: Span,
}

impl ExecutionContext {
    /// Creates the context of a top-level transaction.
    pub fn new_transaction(
        from: Address,
        to: Address,
        tx: TxInfo,
        ledger: Arc<dyn LedgerState>,
    ) -> Self {
        let span = tracing::info_span!(
            "boltvm_tx",
            tx_hash = %tx.hash,
            callee = %to,
            depth = 0usize
        );
        Self {
            caller: from.clone(),
            callee: to,
            current_caller: from,
            tx,
            depth: 0,
            ledger,
            span,
        }
    }

    /// Creates a child context for a nested cross invocation.
    ///
    /// `caller` is carried unchanged, `current_caller` becomes this frame's
    /// callee, `callee` becomes the target.
    #[must_use]
    pub fn child_call(&self, callee: Address) -> Self {
        let depth = self.depth.saturating_add(1);
        let span = tracing::debug_span!(
            parent: &self.span,
            "cross_invoke",
            callee = %callee,
            depth = depth
        );
        Self {
            caller: self.caller.clone(),
            current_caller: self.callee.clone(),
            callee,
            tx: self.tx,
            depth,
            ledger: Arc::clone(&self.ledger),
            span,
        }
    }

    /// Ledger shared by every frame of the transaction.
    #[must_use]
    pub fn ledger(&self) -> &Arc<dyn LedgerState> {
        &self.ledger
    }

    /// Logging span of this frame.
    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("caller", &self.caller)
            .field("callee", &self.callee)
            .field("current_caller", &self.current_caller)
            .field("tx", &self.tx)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// RESPONSE
// =============================================================================

/// Uniform call outcome.
///
/// `ok = false` carries a human-readable reason in `result`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Whether the call succeeded.
    pub ok: bool,
    /// Return payload, or error message bytes.
    pub result: Vec<u8>,
}

impl Response {
    /// Successful response.
    pub fn success(result: impl Into<Vec<u8>>) -> Self {
        Self {
            ok: true,
            result: result.into(),
        }
    }

    /// Successful response without payload.
    #[must_use]
    pub fn empty() -> Self {
        Self::success(Vec::new())
    }

    /// Failed response carrying `msg`.
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: msg.into().into_bytes(),
        }
    }

    /// Result bytes as text.
    #[must_use]
    pub fn result_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.result)
    }

    /// Converts into `Ok(payload)` or `Err(message)`.
    pub fn into_result(self) -> Result<Vec<u8>, String> {
        if self.ok {
            Ok(self.result)
        } else {
            Err(String::from_utf8_lossy(&self.result).into_owned())
        }
    }
}

// =============================================================================
// INVOKE PAYLOAD
// =============================================================================

/// Method name plus encoded arguments, as produced by the transaction layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokePayload {
    /// Operation name.
    pub method: String,
    /// Encoded arguments.
    #[serde(default)]
    pub args: Vec<Arg>,
}

impl InvokePayload {
    /// Create a payload.
    pub fn new(method: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }

    /// Encode to wire bytes.
    pub fn encode(&self) -> Result<Vec<u8>, VmError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode from wire bytes.
    pub fn decode(input: &[u8]) -> Result<Self, VmError> {
        serde_json::from_slice(input).map_err(|e| VmError::InvalidPayload(e.to_string()))
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// Kind of an application event appended to the transaction log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Interchain index bookkeeping.
    Interchain,
    /// Service snapshot for external caches.
    Service,
    /// Audit: proposal changed.
    AuditProposal,
    /// Audit: appchain changed.
    AuditAppchain,
    /// Audit: rule changed.
    AuditRule,
    /// Audit: service changed.
    AuditService,
    /// Audit: node changed.
    AuditNode,
    /// Audit: role changed.
    AuditRole,
    /// Audit: dapp changed.
    AuditDapp,
    /// Audit: proposal strategy changed.
    AuditProposalStrategy,
}

impl EventType {
    /// True for audit trail events.
    #[must_use]
    pub fn is_audit(&self) -> bool {
        !matches!(self, Self::Interchain | Self::Service)
    }
}

/// Application event carrying the current transaction hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event kind.
    pub event_type: EventType,
    /// JSON payload.
    pub data: Vec<u8>,
    /// Hash of the emitting transaction.
    pub tx_hash: TxHash,
}

// =============================================================================
// IBTP
// =============================================================================

/// IBTP message kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IbtpType {
    /// Cross-chain request.
    Interchain,
    /// Receipt of a successful request.
    ReceiptSuccess,
    /// Receipt of a failed request.
    ReceiptFailure,
}

impl IbtpType {
    /// True for either receipt kind.
    #[must_use]
    pub fn is_receipt(&self) -> bool {
        matches!(self, Self::ReceiptSuccess | Self::ReceiptFailure)
    }
}

/// Inter-Blockchain Transfer Protocol message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ibtp {
    /// Source service id (`chain:service` or `bxh:chain:service`).
    pub from: String,
    /// Destination service id.
    pub to: String,
    /// Sequence number per (from, to) pair.
    pub index: u64,
    /// Message kind.
    pub typ: IbtpType,
    /// Block height after which the request times out.
    #[serde(default)]
    pub timeout_height: i64,
    /// Proof checked by the source chain's validation rule.
    #[serde(default)]
    pub proof: Vec<u8>,
    /// Opaque content.
    #[serde(default)]
    pub payload: Vec<u8>,
}

impl Ibtp {
    /// Stable id `{from}-{to}-{index}`.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}-{}-{}", self.from, self.to, self.index)
    }
}
