//! Client side of the governance contract, as used by the managers.

use super::call::invoke;
use super::status::{EventType, GovernanceStatus};
use crate::addresses;
use crate::domain::proposal::ProposalType;
use crate::errors::ContractResult;
use bolt_vm::domain::entities::Response;
use bolt_vm::domain::value_objects::Arg;
use bolt_vm::ports::Stub;
use serde::{Deserialize, Serialize};

/// A proposal to open.
#[derive(Clone, Debug)]
pub struct ProposalRequest<'a> {
    /// Event under vote.
    pub event: EventType,
    /// Owning manager domain.
    pub typ: ProposalType,
    /// Governed object id.
    pub obj_id: &'a str,
    /// Status to roll back to on rejection.
    pub last_status: Option<GovernanceStatus>,
    /// Free-text reason.
    pub reason: &'a str,
    /// Opaque payload handed back to `Manage`.
    pub extra: Vec<u8>,
}

/// Open a proposal on behalf of the transaction sender.
pub fn submit_proposal(stub: &dyn Stub, request: &ProposalRequest<'_>) -> ContractResult<String> {
    let id = invoke(
        stub,
        addresses::GOVERNANCE,
        "SubmitProposal",
        vec![
            Arg::string(stub.caller()),
            Arg::string(request.event.as_str()),
            Arg::string(request.typ.as_str()),
            Arg::string(request.obj_id),
            Arg::string(request.last_status.map(|s| s.as_str()).unwrap_or_default()),
            Arg::string(request.reason),
            Arg::bytes(request.extra.clone()),
        ],
    )?;
    Ok(String::from_utf8_lossy(&id).into_owned())
}

/// Approve `proposal_id` at once when its type needs no vote.
pub fn zero_permission(stub: &dyn Stub, proposal_id: &str) -> ContractResult<()> {
    invoke(stub, addresses::GOVERNANCE, "ZeroPermission", vec![Arg::string(proposal_id)])?;
    Ok(())
}

/// Pause open proposals of `obj_id` below the priority of `event`.
pub fn lock_low_priority(stub: &dyn Stub, obj_id: &str, event: EventType) -> ContractResult<()> {
    invoke(
        stub,
        addresses::GOVERNANCE,
        "LockLowPriorityProposal",
        vec![Arg::string(obj_id), Arg::string(event.as_str())],
    )?;
    Ok(())
}

/// Resume the highest-priority paused proposal of `obj_id`.
pub fn unlock_low_priority(stub: &dyn Stub, obj_id: &str, event: EventType) -> ContractResult<()> {
    invoke(
        stub,
        addresses::GOVERNANCE,
        "UnLockLowPriorityProposal",
        vec![Arg::string(obj_id), Arg::string(event.as_str())],
    )?;
    Ok(())
}

/// Close every unfinished proposal of `obj_id`.
pub fn end_obj_proposal(stub: &dyn Stub, obj_id: &str, reason: &str) -> ContractResult<()> {
    invoke(
        stub,
        addresses::GOVERNANCE,
        "EndObjProposal",
        vec![Arg::string(obj_id), Arg::string(reason), Arg::bytes(Vec::new())],
    )?;
    Ok(())
}

/// Result of an operation that may have opened a proposal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceResult {
    /// Opened proposal, empty when the change applied directly.
    pub proposal_id: String,
    /// Operation specific payload.
    #[serde(default)]
    pub extra: Vec<u8>,
}

/// Encode a [`GovernanceResult`] response.
pub fn governance_ret(proposal_id: impl Into<String>, extra: Vec<u8>) -> ContractResult<Response> {
    let ret = GovernanceResult {
        proposal_id: proposal_id.into(),
        extra,
    };
    Ok(Response::success(serde_json::to_vec(&ret)?))
}
