//! Audit trail events.
//!
//! Every mutating operation posts exactly one audit record for the resource
//! it touched, naming the chains and nodes an auditor should be told about.

use crate::errors::ContractResult;
use bolt_vm::domain::entities::EventType;
use bolt_vm::ports::{Stub, StubExt};
use serde::{Deserialize, Serialize};

/// Payload of an audit event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Snapshot of the changed object.
    pub info: serde_json::Value,
    /// Appchains related to the change.
    #[serde(default)]
    pub related_chain_ids: Vec<String>,
    /// Nodes related to the change.
    #[serde(default)]
    pub related_node_ids: Vec<String>,
}

/// Post an audit event for `info`.
pub fn post_audit<T: Serialize>(
    stub: &dyn Stub,
    event_type: EventType,
    info: &T,
    related_chain_ids: Vec<String>,
    related_node_ids: Vec<String>,
) -> ContractResult<()> {
    let record = AuditRecord {
        info: serde_json::to_value(info)?,
        related_chain_ids,
        related_node_ids,
    };
    stub.post_event(event_type, &record)?;
    Ok(())
}
