//! # Dapp Manager
//!
//! Dapps are owned by a single account. Ownership moves through a voted
//! transfer that the new owner then confirms; the owner index keeps every
//! dapp an account has ever owned.

use super::{respond, ManageArgs, ManageCall};
use crate::config::GovernanceConfig;
use crate::domain::dapp::{Dapp, DappType, DappUpdate, TransferRecord};
use crate::domain::proposal::ProposalType;
use crate::errors::{ContractError, ContractResult};
use crate::governance::audit::post_audit;
use crate::governance::call::{bool_response, json_response};
use crate::governance::diff::{split_list, Edit};
use crate::governance::index;
use crate::governance::permission::{check_permission, only_governance, Owner, Permission};
use crate::governance::proposals::{governance_ret, submit_proposal, zero_permission, ProposalRequest};
use crate::governance::scoring::{incremental_mean, EvaluationRecord};
use crate::governance::status::{EventType, GovernanceStatus};
use crate::governance::store::ResourceStore;
use bolt_vm::domain::args::Args;
use bolt_vm::domain::entities::{EventType as LogEventType, Response};
use bolt_vm::domain::value_objects::Address;
use bolt_vm::ports::{Contract, Stub};
use bolt_vm::VmError;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

const COMPONENT: &str = "dapp-mgr";

fn name_key(name: &str) -> String {
    format!("name-{name}")
}

fn contract_key(addr: &str) -> String {
    format!("contract-{addr}")
}

fn owner_key(owner: &str) -> String {
    format!("owner-{owner}")
}

#[derive(Debug)]
enum Op {
    RegisterDapp {
        name: String,
        typ: String,
        desc: String,
        url: String,
        contract_addrs: String,
        permits: String,
        reason: String,
    },
    UpdateDapp {
        dapp_id: String,
        name: String,
        desc: String,
        url: String,
        contract_addrs: String,
        permits: String,
        reason: String,
    },
    FreezeDapp { dapp_id: String, reason: String },
    ActivateDapp { dapp_id: String, reason: String },
    TransferDapp { dapp_id: String, new_owner: String, reason: String },
    ConfirmTransfer { dapp_id: String },
    EvaluateDapp { dapp_id: String, desc: String, score: f64 },
    Manage(ManageArgs),
    GetDapp { dapp_id: String },
    GetDappByName { name: String },
    GetAllDapps,
    GetPermissionDapps { caller: String },
    GetPermissionAvailableDapps { caller: String },
    GetDappsByOwner { owner: String },
    IsAvailable { dapp_id: String },
}

impl Op {
    fn decode(method: &str, args: &Args) -> Result<Self, VmError> {
        let n = |expected| args.expect_len(method, expected);
        let op = match method {
            "RegisterDapp" => {
                n(7)?;
                Self::RegisterDapp {
                    name: args.string(0)?,
                    typ: args.string(1)?,
                    desc: args.string(2)?,
                    url: args.string(3)?,
                    contract_addrs: args.string(4)?,
                    permits: args.string(5)?,
                    reason: args.string(6)?,
                }
            }
            "UpdateDapp" => {
                n(7)?;
                Self::UpdateDapp {
                    dapp_id: args.string(0)?,
                    name: args.string(1)?,
                    desc: args.string(2)?,
                    url: args.string(3)?,
                    contract_addrs: args.string(4)?,
                    permits: args.string(5)?,
                    reason: args.string(6)?,
                }
            }
            "FreezeDapp" => {
                n(2)?;
                Self::FreezeDapp {
                    dapp_id: args.string(0)?,
                    reason: args.string(1)?,
                }
            }
            "ActivateDapp" => {
                n(2)?;
                Self::ActivateDapp {
                    dapp_id: args.string(0)?,
                    reason: args.string(1)?,
                }
            }
            "TransferDapp" => {
                n(3)?;
                Self::TransferDapp {
                    dapp_id: args.string(0)?,
                    new_owner: args.string(1)?,
                    reason: args.string(2)?,
                }
            }
            "ConfirmTransfer" => {
                n(1)?;
                Self::ConfirmTransfer { dapp_id: args.string(0)? }
            }
            "EvaluateDapp" => {
                n(3)?;
                Self::EvaluateDapp {
                    dapp_id: args.string(0)?,
                    desc: args.string(1)?,
                    score: args.f64(2)?,
                }
            }
            "Manage" => Self::Manage(ManageArgs::decode(method, args)?),
            "GetDapp" => {
                n(1)?;
                Self::GetDapp { dapp_id: args.string(0)? }
            }
            "GetDappByName" => {
                n(1)?;
                Self::GetDappByName { name: args.string(0)? }
            }
            "GetAllDapps" => {
                n(0)?;
                Self::GetAllDapps
            }
            "GetPermissionDapps" => {
                n(1)?;
                Self::GetPermissionDapps { caller: args.string(0)? }
            }
            "GetPermissionAvailableDapps" => {
                n(1)?;
                Self::GetPermissionAvailableDapps { caller: args.string(0)? }
            }
            "GetDappsByOwner" => {
                n(1)?;
                Self::GetDappsByOwner { owner: args.string(0)? }
            }
            "IsAvailable" => {
                n(1)?;
                Self::IsAvailable { dapp_id: args.string(0)? }
            }
            other => return Err(VmError::MethodNotFound(other.to_string())),
        };
        Ok(op)
    }
}

/// Dapp manager contract.
pub struct DappManager {
    config: Arc<GovernanceConfig>,
}

impl DappManager {
    /// Create the contract.
    #[must_use]
    pub fn new(config: Arc<GovernanceConfig>) -> Self {
        Self { config }
    }

    fn run(&self, stub: &dyn Stub, op: Op) -> ContractResult<Response> {
        let dapps = ResourceStore::<Dapp>::new(stub);
        match op {
            Op::RegisterDapp {
                name,
                typ,
                desc,
                url,
                contract_addrs,
                permits,
                reason,
            } => {
                let owner = stub.caller().to_string();
                let dapp_id = format!("{owner}-{}", index::members(stub, &owner_key(&owner))?.len());
                let dapp = Dapp {
                    dapp_id,
                    name,
                    typ: typ.parse::<DappType>()?,
                    desc,
                    url,
                    contract_addr: address_set(&contract_addrs)?,
                    permission: address_set(&permits)?,
                    owner_addr: owner,
                    status: GovernanceStatus::Unavailable,
                    score: 0.0,
                    transfer_records: Vec::new(),
                    evaluation_records: Default::default(),
                    create_time: stub.tx_timestamp(),
                };
                self.register(stub, dapp, &reason)
            }
            Op::UpdateDapp {
                dapp_id,
                name,
                desc,
                url,
                contract_addrs,
                permits,
                reason,
            } => {
                let new = (name, desc, url, address_set(&contract_addrs)?, address_set(&permits)?);
                self.update(stub, &dapp_id, new, &reason)
            }
            Op::FreezeDapp { dapp_id, reason } => {
                self.submit_event(stub, &dapp_id, EventType::Freeze, &reason, Vec::new(), |_| {
                    vec![Permission::Admin]
                })
            }
            Op::ActivateDapp { dapp_id, reason } => {
                self.submit_event(stub, &dapp_id, EventType::Activate, &reason, Vec::new(), |owner| {
                    vec![Permission::SelfOwned(Owner::Account(owner)), Permission::Admin]
                })
            }
            Op::TransferDapp {
                dapp_id,
                new_owner,
                reason,
            } => {
                if !Address::is_well_formed(&new_owner) {
                    return Err(ContractError::invalid(format!("illegal transfer address {new_owner}")));
                }
                if new_owner == stub.caller() {
                    return Err(ContractError::invalid(format!("can not transfer dapp to self {new_owner}")));
                }
                let record = TransferRecord {
                    from: stub.caller().to_string(),
                    to: new_owner,
                    reason: reason.clone(),
                    confirm: false,
                    create_time: 0,
                };
                let extra = serde_json::to_vec(&record)?;
                self.submit_event(stub, &dapp_id, EventType::Transfer, &reason, extra, |owner| {
                    vec![Permission::SelfOwned(Owner::Account(owner))]
                })
            }
            Op::ConfirmTransfer { dapp_id } => {
                let mut dapp = dapps.load(&dapp_id)?;
                check_permission(
                    stub,
                    &[Permission::SelfOwned(Owner::Account(&dapp.owner_addr))],
                    stub.current_caller(),
                )?;
                if let Some(last) = dapp.transfer_records.last_mut() {
                    if !last.confirm {
                        last.confirm = true;
                        dapps.save(&dapp)?;
                    }
                }
                post_event(stub, &dapp)?;
                governance_ret("", Vec::new())
            }
            Op::EvaluateDapp { dapp_id, desc, score } => {
                if !(0.0..=self.config.max_score).contains(&score) {
                    return Err(ContractError::invalid(format!(
                        "score {score} is out of [0, {}]",
                        self.config.max_score
                    )));
                }
                let mut dapp = dapps.load(&dapp_id)?;
                let caller = stub.caller().to_string();
                if dapp.evaluation_records.contains_key(&caller) {
                    return Err(ContractError::invalid(format!("{caller} has already evaluated {dapp_id}")));
                }
                dapp.score = incremental_mean(dapp.score, dapp.evaluation_records.len() as u64, score);
                dapp.evaluation_records.insert(
                    caller.clone(),
                    EvaluationRecord {
                        addr: caller,
                        score,
                        desc,
                        create_time: stub.tx_timestamp(),
                    },
                );
                dapps.save(&dapp)?;
                post_event(stub, &dapp)?;
                governance_ret("", Vec::new())
            }
            Op::Manage(args) => {
                only_governance(stub)?;
                self.manage(stub, &args.parse()?)
            }
            Op::GetDapp { dapp_id } => json_response(&dapps.load(&dapp_id)?),
            Op::GetDappByName { name } => {
                let dapp_id = index::holder(stub, &name_key(&name))
                    .ok_or_else(|| ContractError::not_found(format!("the dapp named {name} does not exist")))?;
                json_response(&dapps.load(&dapp_id)?)
            }
            Op::GetAllDapps => json_response(&dapps.all()?),
            Op::GetPermissionDapps { caller } => {
                let admitted: Vec<Dapp> = dapps.all()?.into_iter().filter(|d| d.admits(&caller)).collect();
                json_response(&admitted)
            }
            Op::GetPermissionAvailableDapps { caller } => {
                let admitted: Vec<Dapp> = dapps
                    .all()?
                    .into_iter()
                    .filter(|d| d.is_available() && d.admits(&caller))
                    .collect();
                json_response(&admitted)
            }
            Op::GetDappsByOwner { owner } => json_response(&owned_by(stub, &owner)?),
            Op::IsAvailable { dapp_id } => Ok(bool_response(
                dapps.get(&dapp_id)?.is_some_and(|d| d.is_available()),
            )),
        }
    }

    fn register(&self, stub: &dyn Stub, dapp: Dapp, reason: &str) -> ContractResult<Response> {
        let dapps = ResourceStore::<Dapp>::new(stub);
        check_fields(stub, &dapp)?;
        dapps.governance_pre(&dapp.dapp_id, EventType::Register)?;

        index::reserve(stub, &name_key(&dapp.name), &dapp.name, &dapp.dapp_id)?;
        for addr in &dapp.contract_addr {
            index::reserve(stub, &contract_key(addr), addr, &dapp.dapp_id)?;
        }

        let proposal_id = submit_proposal(
            stub,
            &ProposalRequest {
                event: EventType::Register,
                typ: ProposalType::DappMgr,
                obj_id: &dapp.dapp_id,
                last_status: Some(GovernanceStatus::Unavailable),
                reason,
                extra: Vec::new(),
            },
        )?;
        dapps.save(&dapp)?;
        let dapp = dapps.change_status(&dapp.dapp_id, EventType::Register, Some(GovernanceStatus::Unavailable))?;
        post_event(stub, &dapp)?;
        zero_permission(stub, &proposal_id)?;
        info!("[{COMPONENT}] register dapp {}: proposal {proposal_id}", dapp.dapp_id);
        governance_ret(proposal_id, dapp.dapp_id.into_bytes())
    }

    fn update(
        &self,
        stub: &dyn Stub,
        dapp_id: &str,
        (name, desc, url, contract_addr, permission): (String, String, String, BTreeSet<String>, BTreeSet<String>),
        reason: &str,
    ) -> ContractResult<Response> {
        let dapps = ResourceStore::<Dapp>::new(stub);
        let mut dapp = dapps
            .governance_pre(dapp_id, EventType::Update)?
            .ok_or_else(|| ContractError::not_found(format!("the dapp {dapp_id} does not exist")))?;
        check_permission(
            stub,
            &[Permission::SelfOwned(Owner::Account(&dapp.owner_addr))],
            stub.current_caller(),
        )?;

        let diff = DappUpdate {
            name: Edit::between(&dapp.name, &name),
            desc: Edit::between(&dapp.desc, &desc),
            url: Edit::between(&dapp.url, &url),
            contract_addr: Edit::between(&dapp.contract_addr, &contract_addr),
            permission: Edit::between(&dapp.permission, &permission),
        };
        let mut proposed = dapp.clone();
        diff.apply(&mut proposed);
        check_fields(stub, &proposed)?;

        if !diff.needs_vote() {
            diff.apply(&mut dapp);
            dapps.save(&dapp)?;
            post_event(stub, &dapp)?;
            return governance_ret("", Vec::new());
        }

        if let Some(edit) = &diff.name {
            index::reserve(stub, &name_key(&edit.new), &edit.new, dapp_id)?;
        }
        if let Some(edit) = &diff.contract_addr {
            for addr in edit.new.difference(&edit.old) {
                index::reserve(stub, &contract_key(addr), addr, dapp_id)?;
            }
        }

        let last = dapp.status;
        let proposal_id = submit_proposal(
            stub,
            &ProposalRequest {
                event: EventType::Update,
                typ: ProposalType::DappMgr,
                obj_id: dapp_id,
                last_status: Some(last),
                reason,
                extra: serde_json::to_vec(&diff)?,
            },
        )?;
        let dapp = dapps.change_status(dapp_id, EventType::Update, Some(last))?;
        post_event(stub, &dapp)?;
        zero_permission(stub, &proposal_id)?;
        governance_ret(proposal_id, Vec::new())
    }

    fn submit_event<F>(
        &self,
        stub: &dyn Stub,
        dapp_id: &str,
        event: EventType,
        reason: &str,
        extra: Vec<u8>,
        permissions: F,
    ) -> ContractResult<Response>
    where
        F: FnOnce(&str) -> Vec<Permission<'_>>,
    {
        let dapps = ResourceStore::<Dapp>::new(stub);
        let dapp = dapps
            .governance_pre(dapp_id, event)?
            .ok_or_else(|| ContractError::not_found(format!("the dapp {dapp_id} does not exist")))?;
        check_permission(stub, &permissions(&dapp.owner_addr), stub.current_caller())?;

        let last = dapp.status;
        let proposal_id = submit_proposal(
            stub,
            &ProposalRequest {
                event,
                typ: ProposalType::DappMgr,
                obj_id: dapp_id,
                last_status: Some(last),
                reason,
                extra,
            },
        )?;
        let dapp = dapps.change_status(dapp_id, event, Some(last))?;
        post_event(stub, &dapp)?;
        zero_permission(stub, &proposal_id)?;
        governance_ret(proposal_id, Vec::new())
    }

    fn manage(&self, stub: &dyn Stub, call: &ManageCall) -> ContractResult<Response> {
        let dapps = ResourceStore::<Dapp>::new(stub);
        let mut dapp = dapps.settle(&call.obj_id, call.trigger, call.last)?;
        let dapp_id = dapp.dapp_id.clone();

        match (call.event, call.approved()) {
            (EventType::Register, true) => {
                dapp.create_time = stub.tx_timestamp();
                dapps.save(&dapp)?;
                index::insert(stub, &owner_key(&dapp.owner_addr), &dapp_id)?;
            }
            (EventType::Register, false) => {
                index::release(stub, &name_key(&dapp.name), &dapp_id);
                for addr in &dapp.contract_addr {
                    index::release(stub, &contract_key(addr), &dapp_id);
                }
            }
            (EventType::Update, approved) => {
                let diff: DappUpdate = serde_json::from_slice(&call.extra)?;
                if approved {
                    if let Some(edit) = &diff.name {
                        index::release(stub, &name_key(&edit.old), &dapp_id);
                    }
                    if let Some(edit) = &diff.contract_addr {
                        for addr in edit.old.difference(&edit.new) {
                            index::release(stub, &contract_key(addr), &dapp_id);
                        }
                    }
                    diff.apply(&mut dapp);
                    dapps.save(&dapp)?;
                } else {
                    if let Some(edit) = &diff.name {
                        index::release(stub, &name_key(&edit.new), &dapp_id);
                    }
                    if let Some(edit) = &diff.contract_addr {
                        for addr in edit.new.difference(&edit.old) {
                            index::release(stub, &contract_key(addr), &dapp_id);
                        }
                    }
                }
            }
            (EventType::Transfer, true) => {
                let mut record: TransferRecord = serde_json::from_slice(&call.extra)?;
                record.create_time = stub.tx_timestamp();
                dapp.owner_addr = record.to.clone();
                dapp.transfer_records.push(record);
                dapps.save(&dapp)?;
                index::insert(stub, &owner_key(&dapp.owner_addr), &dapp_id)?;
            }
            _ => {}
        }

        post_event(stub, &dapp)?;
        info!("[{COMPONENT}] {dapp_id} {} {}: now {}", call.event, call.trigger, dapp.status);
        Ok(Response::empty())
    }
}

fn address_set(raw: &str) -> ContractResult<BTreeSet<String>> {
    let set: BTreeSet<String> = split_list(raw).into_iter().collect();
    match set.iter().find(|a| !Address::is_well_formed(a)) {
        Some(bad) => Err(ContractError::invalid(format!("illegal address {bad}"))),
        None => Ok(set),
    }
}

fn check_fields(stub: &dyn Stub, dapp: &Dapp) -> ContractResult<()> {
    if dapp.url.trim().is_empty() {
        return Err(ContractError::invalid("dapp url is empty"));
    }
    if dapp.name.is_empty() {
        return Err(ContractError::invalid("dapp name is empty"));
    }
    index::check_free(stub, &name_key(&dapp.name), &dapp.name, &dapp.dapp_id)?;
    for addr in &dapp.contract_addr {
        index::check_free(stub, &contract_key(addr), addr, &dapp.dapp_id)?;
    }
    Ok(())
}

/// Dapps `owner` holds, newest first, followed by the ones it transferred away.
fn owned_by(stub: &dyn Stub, owner: &str) -> ContractResult<Vec<Dapp>> {
    let dapps = ResourceStore::<Dapp>::new(stub);
    let (mut held, mut transferred): (Vec<Dapp>, Vec<Dapp>) = index::members(stub, &owner_key(owner))?
        .iter()
        .map(|id| dapps.load(id))
        .collect::<ContractResult<Vec<_>>>()?
        .into_iter()
        .partition(|d| d.owner_addr == owner);
    held.sort_by(|a, b| b.create_time.cmp(&a.create_time));
    transferred.sort_by(|a, b| b.create_time.cmp(&a.create_time));
    held.extend(transferred);
    Ok(held)
}

fn post_event(stub: &dyn Stub, dapp: &Dapp) -> ContractResult<()> {
    post_audit(stub, LogEventType::AuditDapp, dapp, vec![], vec![])
}

impl Contract for DappManager {
    fn name(&self) -> &'static str {
        COMPONENT
    }

    fn dispatch(&self, stub: &dyn Stub, method: &str, args: &Args) -> Result<Response, VmError> {
        let op = Op::decode(method, args)?;
        Ok(respond(COMPONENT, method, self.run(stub, op)))
    }
}
