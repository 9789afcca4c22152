//! # Service Manager
//!
//! Registers the services appchains expose to each other and drives their
//! lifecycle. Besides the proposal-driven events, services follow their
//! appchain: freezing or logging out a chain pauses them, logging it out
//! for good clears them.
//!
//! Every mutating operation posts one audit event and one service event;
//! the latter carries the fresh snapshot for external service caches.

use super::{respond, ManageArgs, ManageCall};
use crate::addresses;
use crate::config::GovernanceConfig;
use crate::domain::ids::{ChainServiceId, FullServiceId};
use crate::domain::proposal::ProposalType;
use crate::domain::service::{Service, ServiceType, ServiceUpdate, SERVICE_PAUSABLE};
use crate::errors::{ContractError, ContractResult};
use crate::governance::audit::post_audit;
use crate::governance::call::{bool_response, invoke, invoke_bool, json_response};
use crate::governance::diff::{split_list, Edit};
use crate::governance::index;
use crate::governance::permission::{check_permission, only, only_governance, Owner, Permission};
use crate::governance::proposals::{
    end_obj_proposal, governance_ret, lock_low_priority, submit_proposal, unlock_low_priority,
    zero_permission, ProposalRequest,
};
use crate::governance::scoring::{incremental_mean, outcome, EvaluationRecord, InvokeRecord};
use crate::governance::status::{EventType, GovernanceStatus};
use crate::governance::store::{Governable, ResourceStore};
use bolt_vm::domain::args::Args;
use bolt_vm::domain::entities::{EventType as LogEventType, Response};
use bolt_vm::domain::value_objects::Arg;
use bolt_vm::ports::{Contract, Stub, StubExt};
use bolt_vm::VmError;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

const COMPONENT: &str = "service-mgr";

fn name_key(name: &str) -> String {
    format!("name-{name}")
}

fn chain_key(chain_id: &str) -> String {
    format!("chain-{chain_id}")
}

fn type_key(typ: ServiceType) -> String {
    format!("type-{typ}")
}

// =============================================================================
// OPERATIONS
// =============================================================================

#[derive(Debug)]
enum Op {
    RegisterService {
        chain_id: String,
        service_id: String,
        name: String,
        typ: String,
        intro: String,
        ordered: bool,
        permits: String,
        details: String,
        reason: String,
    },
    UpdateService {
        chain_service_id: String,
        name: String,
        intro: String,
        permits: String,
        details: String,
        reason: String,
    },
    LogoutService { chain_service_id: String, reason: String },
    FreezeService { chain_service_id: String, reason: String },
    ActivateService { chain_service_id: String, reason: String },
    PauseChainService { chain_id: String },
    UnPauseChainService { chain_id: String },
    ClearChainService { chain_id: String },
    EvaluateService { chain_service_id: String, desc: String, score: f64 },
    RecordInvokeService { full_service_id: String, from_full_service_id: String, result: bool },
    Manage(ManageArgs),
    GetServiceInfo { chain_service_id: String },
    GetAllServices,
    GetPermissionServices { full_service_id: String },
    GetServicesByAppchainID { chain_id: String },
    GetServicesByType { typ: String },
    IsAvailable { chain_service_id: String },
}

impl Op {
    fn decode(method: &str, args: &Args) -> Result<Self, VmError> {
        let n = |expected| args.expect_len(method, expected);
        let op = match method {
            "RegisterService" => {
                n(9)?;
                Self::RegisterService {
                    chain_id: args.string(0)?,
                    service_id: args.string(1)?,
                    name: args.string(2)?,
                    typ: args.string(3)?,
                    intro: args.string(4)?,
                    ordered: args.bool(5)?,
                    permits: args.string(6)?,
                    details: args.string(7)?,
                    reason: args.string(8)?,
                }
            }
            "UpdateService" => {
                n(6)?;
                Self::UpdateService {
                    chain_service_id: args.string(0)?,
                    name: args.string(1)?,
                    intro: args.string(2)?,
                    permits: args.string(3)?,
                    details: args.string(4)?,
                    reason: args.string(5)?,
                }
            }
            "LogoutService" | "FreezeService" | "ActivateService" => {
                n(2)?;
                let (chain_service_id, reason) = (args.string(0)?, args.string(1)?);
                match method {
                    "LogoutService" => Self::LogoutService { chain_service_id, reason },
                    "FreezeService" => Self::FreezeService { chain_service_id, reason },
                    _ => Self::ActivateService { chain_service_id, reason },
                }
            }
            "PauseChainService" | "UnPauseChainService" | "ClearChainService" | "GetServicesByAppchainID" => {
                n(1)?;
                let chain_id = args.string(0)?;
                match method {
                    "PauseChainService" => Self::PauseChainService { chain_id },
                    "UnPauseChainService" => Self::UnPauseChainService { chain_id },
                    "ClearChainService" => Self::ClearChainService { chain_id },
                    _ => Self::GetServicesByAppchainID { chain_id },
                }
            }
            "EvaluateService" => {
                n(3)?;
                Self::EvaluateService {
                    chain_service_id: args.string(0)?,
                    desc: args.string(1)?,
                    score: args.f64(2)?,
                }
            }
            "RecordInvokeService" => {
                n(3)?;
                Self::RecordInvokeService {
                    full_service_id: args.string(0)?,
                    from_full_service_id: args.string(1)?,
                    result: args.bool(2)?,
                }
            }
            "Manage" => Self::Manage(ManageArgs::decode(method, args)?),
            "GetServiceInfo" | "IsAvailable" => {
                n(1)?;
                let chain_service_id = args.string(0)?;
                if method == "GetServiceInfo" {
                    Self::GetServiceInfo { chain_service_id }
                } else {
                    Self::IsAvailable { chain_service_id }
                }
            }
            "GetAllServices" => {
                n(0)?;
                Self::GetAllServices
            }
            "GetPermissionServices" => {
                n(1)?;
                Self::GetPermissionServices { full_service_id: args.string(0)? }
            }
            "GetServicesByType" => {
                n(1)?;
                Self::GetServicesByType { typ: args.string(0)? }
            }
            other => return Err(VmError::MethodNotFound(other.to_string())),
        };
        Ok(op)
    }
}

// =============================================================================
// CONTRACT
// =============================================================================

/// Service manager contract.
pub struct ServiceManager {
    config: Arc<GovernanceConfig>,
}

impl ServiceManager {
    /// Create the contract.
    #[must_use]
    pub fn new(config: Arc<GovernanceConfig>) -> Self {
        Self { config }
    }

    fn run(&self, stub: &dyn Stub, op: Op) -> ContractResult<Response> {
        let services = ResourceStore::<Service>::new(stub);
        match op {
            Op::RegisterService {
                chain_id,
                service_id,
                name,
                typ,
                intro,
                ordered,
                permits,
                details,
                reason,
            } => {
                check_permission(
                    stub,
                    &[Permission::SelfOwned(Owner::AppchainAdmin(&chain_id))],
                    stub.current_caller(),
                )?;
                let service = Service {
                    chain_id,
                    service_id,
                    name,
                    typ: typ.parse()?,
                    intro,
                    ordered,
                    permission: split_list(&permits).into_iter().collect(),
                    details,
                    score: 0.0,
                    status: GovernanceStatus::Unavailable,
                    invoke_count: 0,
                    invoke_success_rate: 0.0,
                    invoke_records: Default::default(),
                    evaluation_records: Default::default(),
                    create_time: stub.tx_timestamp(),
                };
                self.register(stub, service, &reason)
            }
            Op::UpdateService {
                chain_service_id,
                name,
                intro,
                permits,
                details,
                reason,
            } => {
                let id = ChainServiceId::parse(&chain_service_id)?;
                check_permission(
                    stub,
                    &[Permission::SelfOwned(Owner::AppchainAdmin(&id.chain_id))],
                    stub.current_caller(),
                )?;
                let permission: BTreeSet<String> = split_list(&permits).into_iter().collect();
                self.update(stub, &chain_service_id, name, intro, permission, details, &reason)
            }
            Op::LogoutService { chain_service_id, reason } => {
                let id = ChainServiceId::parse(&chain_service_id)?;
                check_permission(
                    stub,
                    &[Permission::SelfOwned(Owner::AppchainAdmin(&id.chain_id))],
                    stub.current_caller(),
                )?;
                self.submit_event(stub, &chain_service_id, EventType::Logout, &reason)
            }
            Op::FreezeService { chain_service_id, reason } => {
                check_permission(stub, &[Permission::Admin], stub.current_caller())?;
                self.submit_event(stub, &chain_service_id, EventType::Freeze, &reason)
            }
            Op::ActivateService { chain_service_id, reason } => {
                let id = ChainServiceId::parse(&chain_service_id)?;
                check_permission(
                    stub,
                    &[Permission::SelfOwned(Owner::AppchainAdmin(&id.chain_id)), Permission::Admin],
                    stub.current_caller(),
                )?;
                self.submit_event(stub, &chain_service_id, EventType::Activate, &reason)
            }
            Op::PauseChainService { chain_id } => {
                only(stub, addresses::APPCHAIN_MANAGER)?;
                for service in chain_services(stub, &chain_id)? {
                    if SERVICE_PAUSABLE.contains(&service.status) {
                        self.pause(stub, &service.chain_service_id())?;
                    }
                }
                Ok(Response::empty())
            }
            Op::UnPauseChainService { chain_id } => {
                only(stub, addresses::APPCHAIN_MANAGER)?;
                for service in chain_services(stub, &chain_id)? {
                    if service.status == GovernanceStatus::Paused {
                        let id = service.chain_service_id();
                        let service = services.change_status(&id, EventType::Unpause, None)?;
                        post_events(stub, &service)?;
                        unlock_low_priority(stub, &id, EventType::Unpause)?;
                    }
                }
                Ok(Response::empty())
            }
            Op::ClearChainService { chain_id } => {
                only(stub, addresses::APPCHAIN_MANAGER)?;
                for service in chain_services(stub, &chain_id)? {
                    if service.machine().can_fire(EventType::Clear, service.status) {
                        let id = service.chain_service_id();
                        end_obj_proposal(stub, &id, "the appchain is logged out")?;
                        let service = services.change_status(&id, EventType::Clear, None)?;
                        index::release(stub, &name_key(&service.name), &id);
                        post_events(stub, &service)?;
                    }
                }
                info!("[{COMPONENT}] cleared services of {chain_id}");
                Ok(Response::empty())
            }
            Op::EvaluateService {
                chain_service_id,
                desc,
                score,
            } => {
                if !(0.0..=self.config.max_score).contains(&score) {
                    return Err(ContractError::invalid(format!(
                        "score {score} is out of [0, {}]",
                        self.config.max_score
                    )));
                }
                let mut service = services.load(&chain_service_id)?;
                let caller = stub.caller().to_string();
                if service.evaluation_records.contains_key(&caller) {
                    return Err(ContractError::invalid(format!("{caller} has already evaluated {chain_service_id}")));
                }
                service.score = incremental_mean(service.score, service.evaluation_records.len() as u64, score);
                service.evaluation_records.insert(
                    caller.clone(),
                    EvaluationRecord {
                        addr: caller,
                        score,
                        desc,
                        create_time: stub.tx_timestamp(),
                    },
                );
                services.save(&service)?;
                post_events(stub, &service)?;
                Ok(Response::empty())
            }
            Op::RecordInvokeService {
                full_service_id,
                from_full_service_id,
                result,
            } => {
                only(stub, addresses::INTERCHAIN)?;
                let id = FullServiceId::parse(&full_service_id)?;
                let mut service = services.load(&id.chain_service.to_string())?;
                service
                    .invoke_records
                    .entry(from_full_service_id.clone())
                    .or_insert_with(|| InvokeRecord::new(&from_full_service_id))
                    .record(result);
                service.invoke_success_rate =
                    incremental_mean(service.invoke_success_rate, service.invoke_count, outcome(result));
                service.invoke_count += 1;
                services.save(&service)?;
                post_events(stub, &service)?;
                Ok(Response::empty())
            }
            Op::Manage(args) => {
                only_governance(stub)?;
                self.manage(stub, &args.parse()?)
            }
            Op::GetServiceInfo { chain_service_id } => json_response(&services.load(&chain_service_id)?),
            Op::GetAllServices => json_response(&services.all()?),
            Op::GetPermissionServices { full_service_id } => {
                FullServiceId::parse(&full_service_id)?;
                let admitted: Vec<Service> = services
                    .all()?
                    .into_iter()
                    .filter(|s| s.is_available() && s.admits(&full_service_id))
                    .collect();
                json_response(&admitted)
            }
            Op::GetServicesByAppchainID { chain_id } => json_response(&chain_services(stub, &chain_id)?),
            Op::GetServicesByType { typ } => {
                let typ: ServiceType = typ.parse()?;
                let mut found = Vec::new();
                for id in index::members(stub, &type_key(typ))? {
                    found.push(services.load(&id)?);
                }
                json_response(&found)
            }
            Op::IsAvailable { chain_service_id } => Ok(bool_response(
                services.get(&chain_service_id)?.is_some_and(|s| s.is_available()),
            )),
        }
    }

    fn register(&self, stub: &dyn Stub, service: Service, reason: &str) -> ContractResult<Response> {
        let id = service.chain_service_id();
        ChainServiceId::parse(&id)?;
        if !invoke_bool(stub, addresses::APPCHAIN_MANAGER, "IsAvailable", vec![Arg::string(&service.chain_id)])? {
            return Err(ContractError::invalid(format!("the appchain {} is not available", service.chain_id)));
        }

        let services = ResourceStore::<Service>::new(stub);
        services.governance_pre(&id, EventType::Register)?;
        if service.name.is_empty() {
            return Err(ContractError::invalid("service name is empty"));
        }
        index::check_free(stub, &name_key(&service.name), &service.name, &id)?;
        for permit in &service.permission {
            check_full_service_id(stub, permit)?;
        }

        index::reserve(stub, &name_key(&service.name), &service.name, &id)?;
        index::insert(stub, &chain_key(&service.chain_id), &id)?;
        index::insert(stub, &type_key(service.typ), &id)?;
        services.save(&service)?;

        let proposal_id = submit_proposal(
            stub,
            &ProposalRequest {
                event: EventType::Register,
                typ: ProposalType::ServiceMgr,
                obj_id: &id,
                last_status: Some(GovernanceStatus::Unavailable),
                reason,
                extra: Vec::new(),
            },
        )?;
        let service = services.change_status(&id, EventType::Register, Some(GovernanceStatus::Unavailable))?;
        post_events(stub, &service)?;
        zero_permission(stub, &proposal_id)?;
        info!("[{COMPONENT}] register service {id}: proposal {proposal_id}");
        governance_ret(proposal_id, id.into_bytes())
    }

    #[allow(clippy::too_many_arguments)]
    fn update(
        &self,
        stub: &dyn Stub,
        id: &str,
        name: String,
        intro: String,
        permission: BTreeSet<String>,
        details: String,
        reason: &str,
    ) -> ContractResult<Response> {
        let services = ResourceStore::<Service>::new(stub);
        let mut service = services
            .governance_pre(id, EventType::Update)?
            .ok_or_else(|| ContractError::not_found(format!("the service {id} does not exist")))?;

        let diff = ServiceUpdate {
            name: Edit::between(&service.name, &name),
            intro: Edit::between(&service.intro, &intro),
            permission: Edit::between(&service.permission, &permission),
            details: Edit::between(&service.details, &details),
        };
        if diff.is_empty() {
            return Err(ContractError::invalid(format!("nothing to update for service {id}")));
        }
        for permit in &permission {
            check_full_service_id(stub, permit)?;
        }

        if !diff.needs_vote() {
            diff.apply(&mut service);
            services.save(&service)?;
            post_events(stub, &service)?;
            return governance_ret("", id.as_bytes().to_vec());
        }

        if let Some(edit) = &diff.name {
            if edit.new.is_empty() {
                return Err(ContractError::invalid("service name is empty"));
            }
            index::reserve(stub, &name_key(&edit.new), &edit.new, id)?;
        }

        let last = service.status;
        let proposal_id = submit_proposal(
            stub,
            &ProposalRequest {
                event: EventType::Update,
                typ: ProposalType::ServiceMgr,
                obj_id: id,
                last_status: Some(last),
                reason,
                extra: serde_json::to_vec(&diff)?,
            },
        )?;
        let service = services.change_status(id, EventType::Update, Some(last))?;
        post_events(stub, &service)?;
        zero_permission(stub, &proposal_id)?;
        governance_ret(proposal_id, id.as_bytes().to_vec())
    }

    fn submit_event(&self, stub: &dyn Stub, id: &str, event: EventType, reason: &str) -> ContractResult<Response> {
        let services = ResourceStore::<Service>::new(stub);
        let service = services
            .governance_pre(id, event)?
            .ok_or_else(|| ContractError::not_found(format!("the service {id} does not exist")))?;

        let last = service.status;
        let proposal_id = submit_proposal(
            stub,
            &ProposalRequest {
                event,
                typ: ProposalType::ServiceMgr,
                obj_id: id,
                last_status: Some(last),
                reason,
                extra: Vec::new(),
            },
        )?;
        let service = services.change_status(id, event, Some(last))?;
        post_events(stub, &service)?;
        zero_permission(stub, &proposal_id)?;
        governance_ret(proposal_id, id.as_bytes().to_vec())
    }

    fn pause(&self, stub: &dyn Stub, id: &str) -> ContractResult<Service> {
        lock_low_priority(stub, id, EventType::Pause)?;
        let service = ResourceStore::<Service>::new(stub).change_status(id, EventType::Pause, None)?;
        post_events(stub, &service)?;
        Ok(service)
    }

    fn manage(&self, stub: &dyn Stub, call: &ManageCall) -> ContractResult<Response> {
        let services = ResourceStore::<Service>::new(stub);
        let mut service = services.settle(&call.obj_id, call.trigger, call.last)?;
        let id = service.chain_service_id();

        match (call.event, call.approved()) {
            (EventType::Register, true) => {
                invoke(stub, addresses::INTERCHAIN, "Register", vec![Arg::string(&id)])?;
                if !chain_available(stub, &service.chain_id)? {
                    service.status = GovernanceStatus::Frozen;
                    services.save(&service)?;
                }
            }
            (EventType::Register, false) => {
                index::release(stub, &name_key(&service.name), &id);
            }
            (EventType::Update, true) => {
                let diff: ServiceUpdate = serde_json::from_slice(&call.extra)?;
                if let Some(edit) = &diff.name {
                    index::release(stub, &name_key(&edit.old), &id);
                }
                diff.apply(&mut service);
                services.save(&service)?;
            }
            (EventType::Update, false) => {
                let diff: ServiceUpdate = serde_json::from_slice(&call.extra)?;
                if let Some(edit) = &diff.name {
                    index::release(stub, &name_key(&edit.new), &id);
                }
            }
            (EventType::Logout, true) => {
                index::release(stub, &name_key(&service.name), &id);
            }
            (EventType::Logout, false) => {
                // the appchain may have been frozen while the logout was open
                if SERVICE_PAUSABLE.contains(&service.status) && !chain_available(stub, &service.chain_id)? {
                    warn!("[{COMPONENT}] appchain of {id} is unavailable, pausing again");
                    service = self.pause(stub, &id)?;
                }
            }
            _ => {}
        }

        post_events(stub, &service)?;
        info!("[{COMPONENT}] {id} {} {}: now {}", call.event, call.trigger, service.status);
        Ok(Response::empty())
    }
}

/// Check a full service id against this relay.
fn check_full_service_id(stub: &dyn Stub, id: &str) -> ContractResult<()> {
    let full = FullServiceId::parse(id)?;
    let local = invoke(stub, addresses::INTERCHAIN, "GetBitXHubID", Vec::new())?;
    let local = String::from_utf8_lossy(&local);
    if full.bitxhub_id != local {
        return Err(ContractError::invalid(format!(
            "BitxhubID {} is not the current bitxhub {local}",
            full.bitxhub_id
        )));
    }
    let chain_service = full.chain_service.to_string();
    if !ResourceStore::<Service>::new(stub).exists(&chain_service) {
        return Err(ContractError::not_found(format!("the service {chain_service} does not exist")));
    }
    Ok(())
}

fn chain_available(stub: &dyn Stub, chain_id: &str) -> ContractResult<bool> {
    invoke_bool(stub, addresses::APPCHAIN_MANAGER, "IsAvailable", vec![Arg::string(chain_id)])
}

fn chain_services(stub: &dyn Stub, chain_id: &str) -> ContractResult<Vec<Service>> {
    let services = ResourceStore::<Service>::new(stub);
    index::members(stub, &chain_key(chain_id))?
        .iter()
        .map(|id| services.load(id))
        .collect()
}

fn post_events(stub: &dyn Stub, service: &Service) -> ContractResult<()> {
    post_audit(stub, LogEventType::AuditService, service, vec![service.chain_id.clone()], vec![])?;
    stub.post_event(LogEventType::Service, service)?;
    Ok(())
}

impl Contract for ServiceManager {
    fn name(&self) -> &'static str {
        COMPONENT
    }

    fn dispatch(&self, stub: &dyn Stub, method: &str, args: &Args) -> Result<Response, VmError> {
        let op = Op::decode(method, args)?;
        Ok(respond(COMPONENT, method, self.run(stub, op)))
    }
}
