//! # Governance Contract
//!
//! Holds proposals and counts votes. Managers open proposals through
//! `SubmitProposal`; once a proposal closes, the owning manager's `Manage`
//! is called with the outcome.
//!
//! ## Locking
//!
//! At most one proposal per object is open at a time. A submission with a
//! higher priority than the open proposal pauses it and records the paused
//! id in `lock_proposal_id`. When the newer proposal closes, the paused one
//! is rejected (newer approved) or reopened (newer rejected). In the first
//! case its manager is told `discarded` and releases what it reserved; in
//! the second the manager receives the reopened event instead of `rejected`.

use super::respond;
use crate::addresses;
use crate::config::GovernanceConfig;
use crate::domain::proposal::{is_special, threshold, Ballot, Proposal, ProposalStatus, ProposalStrategy, ProposalType};
use crate::domain::role::Role;
use crate::domain::strategy::ModuleStrategy;
use crate::errors::{ContractError, ContractResult};
use crate::governance::audit::post_audit;
use crate::governance::call::{invoke, invoke_json, json_response};
use crate::governance::index;
use crate::governance::permission::{check_permission, Permission, GOVERNANCE_ADMIN};
use crate::governance::status::{parse_last_status, EventType, GovernanceStatus, ManageTrigger};
use bolt_vm::domain::args::Args;
use bolt_vm::domain::entities::{EventType as LogEventType, Response};
use bolt_vm::domain::value_objects::Arg;
use bolt_vm::ports::{Contract, Stub, StubExt};
use bolt_vm::VmError;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

const COMPONENT: &str = "governance";

/// Close reason of a proposal withdrawn by its submitter.
pub const WITHDRAWN_REASON: &str = "withdrawn";

fn proposal_key(id: &str) -> String {
    format!("proposal-{id}")
}

fn obj_key(obj_id: &str) -> String {
    format!("idx-obj-{obj_id}")
}

fn from_key(from: &str) -> String {
    format!("idx-from-{from}")
}

fn type_key(typ: ProposalType) -> String {
    format!("idx-type-{typ}")
}

fn status_key(status: ProposalStatus) -> String {
    format!("idx-status-{}", status.as_str())
}

// =============================================================================
// OPERATIONS
// =============================================================================

#[derive(Debug)]
enum Op {
    SubmitProposal {
        from: String,
        event: String,
        typ: String,
        obj_id: String,
        last_status: String,
        reason: String,
        extra: Vec<u8>,
    },
    ZeroPermission { id: String },
    Vote { id: String, approve: String, reason: String },
    WithdrawProposal { id: String, reason: String },
    LockLowPriorityProposal { obj_id: String, event: String },
    UnLockLowPriorityProposal { obj_id: String, event: String },
    EndObjProposal { obj_id: String, reason: String },
    GetProposal { id: String },
    GetProposalsByObjId { obj_id: String },
    GetProposalsByFrom { from: String },
    GetProposalsByTyp { typ: String },
    GetProposalsByStatus { status: String },
    GetNotClosedProposals,
    GetProposalStrategy { typ: String },
}

impl Op {
    fn decode(method: &str, args: &Args) -> Result<Self, VmError> {
        let n = |expected| args.expect_len(method, expected);
        let op = match method {
            "SubmitProposal" => {
                n(7)?;
                Self::SubmitProposal {
                    from: args.string(0)?,
                    event: args.string(1)?,
                    typ: args.string(2)?,
                    obj_id: args.string(3)?,
                    last_status: args.string(4)?,
                    reason: args.string(5)?,
                    extra: args.bytes(6)?,
                }
            }
            "ZeroPermission" => {
                n(1)?;
                Self::ZeroPermission { id: args.string(0)? }
            }
            "Vote" => {
                n(3)?;
                Self::Vote {
                    id: args.string(0)?,
                    approve: args.string(1)?,
                    reason: args.string(2)?,
                }
            }
            "WithdrawProposal" => {
                n(2)?;
                Self::WithdrawProposal {
                    id: args.string(0)?,
                    reason: args.string(1)?,
                }
            }
            "LockLowPriorityProposal" | "UnLockLowPriorityProposal" => {
                n(2)?;
                let (obj_id, event) = (args.string(0)?, args.string(1)?);
                if method == "LockLowPriorityProposal" {
                    Self::LockLowPriorityProposal { obj_id, event }
                } else {
                    Self::UnLockLowPriorityProposal { obj_id, event }
                }
            }
            "EndObjProposal" => {
                // the third argument is reserved for a closing payload
                n(3)?;
                Self::EndObjProposal {
                    obj_id: args.string(0)?,
                    reason: args.string(1)?,
                }
            }
            "GetProposal" => {
                n(1)?;
                Self::GetProposal { id: args.string(0)? }
            }
            "GetProposalsByObjId" => {
                n(1)?;
                Self::GetProposalsByObjId { obj_id: args.string(0)? }
            }
            "GetProposalsByFrom" => {
                n(1)?;
                Self::GetProposalsByFrom { from: args.string(0)? }
            }
            "GetProposalsByTyp" => {
                n(1)?;
                Self::GetProposalsByTyp { typ: args.string(0)? }
            }
            "GetProposalsByStatus" => {
                n(1)?;
                Self::GetProposalsByStatus { status: args.string(0)? }
            }
            "GetNotClosedProposals" => {
                n(0)?;
                Self::GetNotClosedProposals
            }
            "GetProposalStrategy" => {
                n(1)?;
                Self::GetProposalStrategy { typ: args.string(0)? }
            }
            other => return Err(VmError::MethodNotFound(other.to_string())),
        };
        Ok(op)
    }
}

// =============================================================================
// CONTRACT
// =============================================================================

/// Governance (proposal) contract.
pub struct GovernanceContract {
    config: Arc<GovernanceConfig>,
}

impl GovernanceContract {
    /// Create the contract.
    #[must_use]
    pub fn new(config: Arc<GovernanceConfig>) -> Self {
        Self { config }
    }

    fn run(&self, stub: &dyn Stub, op: Op) -> ContractResult<Response> {
        match op {
            Op::SubmitProposal {
                from,
                event,
                typ,
                obj_id,
                last_status,
                reason,
                extra,
            } => {
                check_permission(stub, &[Permission::Specific(addresses::MANAGERS)], stub.current_caller())?;
                let typ: ProposalType = typ.parse()?;
                if typ.manager() != stub.current_caller() {
                    return Err(ContractError::denied(
                        stub.current_caller(),
                        format!("can not submit {typ} proposals"),
                    ));
                }
                if from.is_empty() {
                    return Err(ContractError::invalid("proposal submitter is empty"));
                }
                let proposal = self.submit(
                    stub,
                    from,
                    event.parse()?,
                    typ,
                    obj_id,
                    parse_last_status(&last_status)?,
                    reason,
                    extra,
                )?;
                Ok(Response::success(proposal.id))
            }
            Op::ZeroPermission { id } => {
                check_permission(stub, &[Permission::Specific(addresses::MANAGERS)], stub.current_caller())?;
                let mut proposal = load(stub, &id)?;
                if proposal.strategy == ProposalStrategy::ZeroPermission && proposal.is_open() {
                    proposal.close_reason = "zero permission".to_string();
                    set_status(stub, &mut proposal, ProposalStatus::Approved)?;
                    info!("[{COMPONENT}] proposal {id} approved without vote");
                    handle_result(stub, &proposal)?;
                }
                Ok(Response::empty())
            }
            Op::Vote { id, approve, reason } => self.vote(stub, &id, &approve, reason),
            Op::WithdrawProposal { id, reason } => {
                let mut proposal = load(stub, &id)?;
                check_permission(
                    stub,
                    &[Permission::Specific(&[proposal.from.as_str()])],
                    stub.current_caller(),
                )?;
                if !proposal.is_open() {
                    return Err(ContractError::invalid(format!(
                        "the proposal {id} is {} and can not be withdrawn",
                        proposal.status.as_str()
                    )));
                }
                proposal.close_reason = format!("{WITHDRAWN_REASON}: {reason}");
                set_status(stub, &mut proposal, ProposalStatus::Rejected)?;
                info!("[{COMPONENT}] proposal {id} withdrawn");
                handle_result(stub, &proposal)?;
                Ok(Response::empty())
            }
            Op::LockLowPriorityProposal { obj_id, event } => {
                only_locking_managers(stub)?;
                let locked = lock_low_priority(stub, &obj_id, event.parse()?)?;
                Ok(Response::success(locked.unwrap_or_default()))
            }
            Op::UnLockLowPriorityProposal { obj_id, event } => {
                only_locking_managers(stub)?;
                let event: EventType = event.parse()?;
                let Some(mut locked) = highest_paused(stub, &obj_id)? else {
                    return Ok(Response::empty());
                };
                set_status(stub, &mut locked, ProposalStatus::Proposed)?;
                info!("[{COMPONENT}] proposal {} reopened after {event}", locked.id);
                manage(stub, &locked, event, ManageTrigger::Restore(locked.event_type), None, Vec::new())?;
                Ok(Response::empty())
            }
            Op::EndObjProposal { obj_id, reason } => {
                check_permission(stub, &[Permission::Specific(addresses::MANAGERS)], stub.current_caller())?;
                for mut proposal in by_index(stub, &obj_key(&obj_id))? {
                    if !proposal.status.is_closed() {
                        proposal.close_reason = reason.clone();
                        set_status(stub, &mut proposal, ProposalStatus::Rejected)?;
                        debug!("[{COMPONENT}] proposal {} ended: {reason}", proposal.id);
                    }
                }
                Ok(Response::empty())
            }
            Op::GetProposal { id } => json_response(&load(stub, &id)?),
            Op::GetProposalsByObjId { obj_id } => json_response(&newest_first(by_index(stub, &obj_key(&obj_id))?)),
            Op::GetProposalsByFrom { from } => json_response(&newest_first(by_index(stub, &from_key(&from))?)),
            Op::GetProposalsByTyp { typ } => {
                let typ: ProposalType = typ.parse()?;
                json_response(&newest_first(by_index(stub, &type_key(typ))?))
            }
            Op::GetProposalsByStatus { status } => {
                let status: ProposalStatus = status.parse()?;
                json_response(&newest_first(by_index(stub, &status_key(status))?))
            }
            Op::GetNotClosedProposals => {
                let mut open = by_index(stub, &status_key(ProposalStatus::Proposed))?;
                open.extend(by_index(stub, &status_key(ProposalStatus::Paused))?);
                json_response(&newest_first(open))
            }
            Op::GetProposalStrategy { typ } => json_response(&strategy_of(stub, typ.parse()?)?),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn submit(
        &self,
        stub: &dyn Stub,
        from: String,
        event: EventType,
        typ: ProposalType,
        obj_id: String,
        obj_last_status: Option<GovernanceStatus>,
        reason: String,
        extra: Vec<u8>,
    ) -> ContractResult<Proposal> {
        let sequence = index::members(stub, &from_key(&from))?.len();
        let electorate = electorate(stub)?;
        let strategy = strategy_of(stub, typ)?;
        let threshold = match strategy {
            ProposalStrategy::ZeroPermission => 0,
            ProposalStrategy::SimpleMajority { participate_threshold } => {
                threshold(electorate.len(), participate_threshold)
            }
        };
        let lock_proposal_id = lock_low_priority(stub, &obj_id, event)?.unwrap_or_default();

        let proposal = Proposal {
            id: format!("{from}-{sequence}"),
            event_type: event,
            typ,
            status: ProposalStatus::Proposed,
            obj_id,
            obj_last_status,
            from,
            strategy,
            electorate,
            ballots: BTreeMap::new(),
            approve: 0,
            against: 0,
            threshold,
            reason,
            close_reason: String::new(),
            lock_proposal_id,
            is_special: is_special(event, typ),
            is_super_admin_voted: false,
            extra,
            create_time: stub.tx_timestamp(),
        };

        stub.set_object(&proposal_key(&proposal.id), &proposal)?;
        index::insert(stub, &from_key(&proposal.from), &proposal.id)?;
        index::insert(stub, &obj_key(&proposal.obj_id), &proposal.id)?;
        index::insert(stub, &type_key(proposal.typ), &proposal.id)?;
        index::insert(stub, &status_key(proposal.status), &proposal.id)?;
        post_proposal(stub, &proposal)?;
        info!(
            "[{COMPONENT}] proposal {} opened: {} {} on {}",
            proposal.id, proposal.typ, proposal.event_type, proposal.obj_id
        );
        Ok(proposal)
    }

    fn vote(&self, stub: &dyn Stub, id: &str, approve: &str, reason: String) -> ContractResult<Response> {
        let voter = stub.caller().to_string();
        check_permission(stub, &[Permission::Admin], &voter)?;

        let mut proposal = load(stub, id)?;
        if !proposal.is_open() {
            return Err(ContractError::invalid(format!(
                "the proposal {id} is {} and can not be voted on",
                proposal.status.as_str()
            )));
        }
        let Some(&weight) = proposal.electorate.get(&voter) else {
            return Err(ContractError::denied(&voter, format!("not in the electorate of {id}")));
        };
        if proposal.ballots.contains_key(&voter) {
            return Err(ContractError::invalid(format!("{voter} has already voted on {id}")));
        }
        let approve = match approve {
            "approve" => true,
            "reject" => false,
            other => return Err(ContractError::invalid(format!("illegal ballot {other}, want approve or reject"))),
        };

        if approve {
            proposal.approve += 1;
        } else {
            proposal.against += 1;
        }
        if weight == self.config.super_admin_weight {
            proposal.is_super_admin_voted = true;
        }
        proposal.ballots.insert(
            voter.clone(),
            Ballot {
                approve,
                weight,
                reason,
                vote_time: stub.tx_timestamp(),
            },
        );
        debug!("[{COMPONENT}] {voter} voted {approve} on {id}");

        if proposal.reached_threshold() {
            let outcome = proposal.outcome();
            proposal.close_reason = "vote finished".to_string();
            set_status(stub, &mut proposal, outcome)?;
            info!("[{COMPONENT}] proposal {id} closed: {}", outcome.as_str());
            handle_result(stub, &proposal)?;
        } else {
            stub.set_object(&proposal_key(id), &proposal)?;
            post_proposal(stub, &proposal)?;
        }
        Ok(Response::empty())
    }
}

// =============================================================================
// PROPOSAL STORAGE
// =============================================================================

fn load(stub: &dyn Stub, id: &str) -> ContractResult<Proposal> {
    stub.get_object(&proposal_key(id))?
        .ok_or_else(|| ContractError::not_found(format!("the proposal {id} does not exist")))
}

fn by_index(stub: &dyn Stub, key: &str) -> ContractResult<Vec<Proposal>> {
    index::members(stub, key)?.iter().map(|id| load(stub, id)).collect()
}

/// Newest first; proposals of one transaction keep reverse submission order.
fn newest_first(mut proposals: Vec<Proposal>) -> Vec<Proposal> {
    proposals.reverse();
    proposals.sort_by(|a, b| b.create_time.cmp(&a.create_time));
    proposals
}

/// Persist `status`, keeping the status index in step.
fn set_status(stub: &dyn Stub, proposal: &mut Proposal, status: ProposalStatus) -> ContractResult<()> {
    index::remove(stub, &status_key(proposal.status), &proposal.id)?;
    index::insert(stub, &status_key(status), &proposal.id)?;
    proposal.status = status;
    stub.set_object(&proposal_key(&proposal.id), proposal)?;
    post_proposal(stub, proposal)
}

fn post_proposal(stub: &dyn Stub, proposal: &Proposal) -> ContractResult<()> {
    let chain_id = match proposal.typ {
        ProposalType::AppchainMgr => Some(proposal.obj_id.clone()),
        ProposalType::ServiceMgr | ProposalType::RuleMgr => proposal.obj_id.split(':').next().map(String::from),
        _ => None,
    };
    post_audit(stub, LogEventType::AuditProposal, proposal, chain_id.into_iter().collect(), vec![])
}

// =============================================================================
// ELECTORATE AND LOCKING
// =============================================================================

/// Decision rule currently recorded for proposals of `typ`.
fn strategy_of(stub: &dyn Stub, typ: ProposalType) -> ContractResult<ProposalStrategy> {
    let record: ModuleStrategy = invoke_json(
        stub,
        addresses::PROPOSAL_STRATEGY_MANAGER,
        "GetProposalStrategy",
        vec![Arg::string(typ.as_str())],
    )?;
    Ok(record.strategy())
}

/// Available governance admins with their weights.
fn electorate(stub: &dyn Stub) -> ContractResult<BTreeMap<String, u64>> {
    let admins: Vec<Role> = invoke_json(
        stub,
        addresses::ROLE_MANAGER,
        "GetRolesByType",
        vec![Arg::string(GOVERNANCE_ADMIN)],
    )?;
    Ok(admins
        .into_iter()
        .filter(Role::is_available)
        .map(|role| (role.id, role.weight))
        .collect())
}

fn only_locking_managers(stub: &dyn Stub) -> ContractResult<()> {
    check_permission(
        stub,
        &[Permission::Specific(&[addresses::SERVICE_MANAGER, addresses::RULE_MANAGER])],
        stub.current_caller(),
    )
}

/// Pause the open proposal of `obj_id` if `event` outranks it.
fn lock_low_priority(stub: &dyn Stub, obj_id: &str, event: EventType) -> ContractResult<Option<String>> {
    let Some(mut open) = by_index(stub, &obj_key(obj_id))?.into_iter().find(Proposal::is_open) else {
        return Ok(None);
    };
    if open.event_type.priority() >= event.priority() {
        return Err(ContractError::invalid(format!(
            "the object {obj_id} has an equal or higher priority proposal {} ({}) in progress",
            open.id, open.event_type
        )));
    }
    set_status(stub, &mut open, ProposalStatus::Paused)?;
    info!("[{COMPONENT}] proposal {} paused by {event}", open.id);
    Ok(Some(open.id))
}

/// Paused proposal of `obj_id` with the highest priority, earliest first on ties.
fn highest_paused(stub: &dyn Stub, obj_id: &str) -> ContractResult<Option<Proposal>> {
    let mut best: Option<Proposal> = None;
    for proposal in by_index(stub, &obj_key(obj_id))? {
        if proposal.status != ProposalStatus::Paused {
            continue;
        }
        match &best {
            Some(current) if current.event_type.priority() >= proposal.event_type.priority() => {}
            _ => best = Some(proposal),
        }
    }
    Ok(best)
}

// =============================================================================
// RESULT HANDLING
// =============================================================================

/// Settle the proposal this one paused, then hand the outcome to the manager.
///
/// A paused proposal dropped for priority is handed to its manager as
/// [`ManageTrigger::Discarded`] so the names it reserved are released.
fn handle_result(stub: &dyn Stub, proposal: &Proposal) -> ContractResult<()> {
    let approved = proposal.status == ProposalStatus::Approved;
    let mut trigger = if approved {
        ManageTrigger::Approved
    } else {
        ManageTrigger::Rejected
    };

    if !proposal.lock_proposal_id.is_empty() {
        let mut locked = load(stub, &proposal.lock_proposal_id)?;
        if locked.status == ProposalStatus::Paused {
            if approved {
                locked.close_reason = format!("priority: a higher priority proposal {} was approved", proposal.id);
                set_status(stub, &mut locked, ProposalStatus::Rejected)?;
                manage(
                    stub,
                    &locked,
                    locked.event_type,
                    ManageTrigger::Discarded,
                    locked.obj_last_status,
                    locked.extra.clone(),
                )?;
            } else {
                set_status(stub, &mut locked, ProposalStatus::Proposed)?;
                trigger = ManageTrigger::Restore(locked.event_type);
            }
            debug!("[{COMPONENT}] locked proposal {} now {}", locked.id, locked.status.as_str());
        }
    }

    manage(
        stub,
        proposal,
        proposal.event_type,
        trigger,
        proposal.obj_last_status,
        proposal.extra.clone(),
    )
}

fn manage(
    stub: &dyn Stub,
    proposal: &Proposal,
    event: EventType,
    trigger: ManageTrigger,
    last: Option<GovernanceStatus>,
    extra: Vec<u8>,
) -> ContractResult<()> {
    invoke(
        stub,
        proposal.typ.manager(),
        "Manage",
        vec![
            Arg::string(event.as_str()),
            Arg::string(trigger.as_str()),
            Arg::string(last.map(|s| s.as_str()).unwrap_or_default()),
            Arg::string(&proposal.obj_id),
            Arg::bytes(extra),
        ],
    )?;
    Ok(())
}

impl Contract for GovernanceContract {
    fn name(&self) -> &'static str {
        COMPONENT
    }

    fn dispatch(&self, stub: &dyn Stub, method: &str, args: &Args) -> Result<Response, VmError> {
        let op = Op::decode(method, args)?;
        Ok(respond(COMPONENT, method, self.run(stub, op)))
    }
}
