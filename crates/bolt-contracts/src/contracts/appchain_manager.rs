//! # Appchain Manager
//!
//! Registers appchains and drives their lifecycle. Approved changes fan
//! out to the role manager (admins), the rule manager (master rule) and
//! the service manager (pausing and clearing the chain's services).

use super::{respond, ManageArgs, ManageCall};
use crate::addresses;
use crate::domain::appchain::{Appchain, AppchainRegistration, AppchainUpdate};
use crate::domain::proposal::ProposalType;
use crate::domain::role::Role;
use crate::errors::{ContractError, ContractResult};
use crate::governance::audit::post_audit;
use crate::governance::call::{bool_response, invoke, invoke_json, json_response};
use crate::governance::diff::{normalized, split_list, Edit};
use crate::governance::index;
use crate::governance::permission::{check_permission, only_governance, Owner, Permission};
use crate::governance::proposals::{governance_ret, submit_proposal, zero_permission, ProposalRequest};
use crate::governance::status::{EventType, GovernanceStatus};
use crate::governance::store::ResourceStore;
use bolt_vm::domain::args::Args;
use bolt_vm::domain::entities::{EventType as LogEventType, Response};
use bolt_vm::domain::value_objects::Arg;
use bolt_vm::ports::{Contract, Stub};
use bolt_vm::VmError;
use tracing::info;

const COMPONENT: &str = "appchain-mgr";

fn name_key(name: &str) -> String {
    format!("chain-name-{name}")
}

#[derive(Debug)]
enum Op {
    RegisterAppchain {
        chain_id: String,
        chain_name: String,
        chain_type: String,
        trust_root: Vec<u8>,
        broker: String,
        desc: String,
        master_rule: String,
        master_rule_url: String,
        admins: String,
        reason: String,
    },
    UpdateAppchain {
        chain_id: String,
        chain_name: String,
        desc: String,
        trust_root: Vec<u8>,
        admins: String,
        reason: String,
    },
    FreezeAppchain { chain_id: String, reason: String },
    ActivateAppchain { chain_id: String, reason: String },
    LogoutAppchain { chain_id: String, reason: String },
    Manage(ManageArgs),
    GetAppchain { chain_id: String },
    GetAppchainByName { chain_name: String },
    GetAllAppchains,
    IsAvailable { chain_id: String },
}

impl Op {
    fn decode(method: &str, args: &Args) -> Result<Self, VmError> {
        let n = |expected| args.expect_len(method, expected);
        let op = match method {
            "RegisterAppchain" => {
                n(10)?;
                Self::RegisterAppchain {
                    chain_id: args.string(0)?,
                    chain_name: args.string(1)?,
                    chain_type: args.string(2)?,
                    trust_root: args.bytes(3)?,
                    broker: args.string(4)?,
                    desc: args.string(5)?,
                    master_rule: args.string(6)?,
                    master_rule_url: args.string(7)?,
                    admins: args.string(8)?,
                    reason: args.string(9)?,
                }
            }
            "UpdateAppchain" => {
                n(6)?;
                Self::UpdateAppchain {
                    chain_id: args.string(0)?,
                    chain_name: args.string(1)?,
                    desc: args.string(2)?,
                    trust_root: args.bytes(3)?,
                    admins: args.string(4)?,
                    reason: args.string(5)?,
                }
            }
            "FreezeAppchain" | "ActivateAppchain" | "LogoutAppchain" => {
                n(2)?;
                let (chain_id, reason) = (args.string(0)?, args.string(1)?);
                match method {
                    "FreezeAppchain" => Self::FreezeAppchain { chain_id, reason },
                    "ActivateAppchain" => Self::ActivateAppchain { chain_id, reason },
                    _ => Self::LogoutAppchain { chain_id, reason },
                }
            }
            "Manage" => Self::Manage(ManageArgs::decode(method, args)?),
            "GetAppchain" => {
                n(1)?;
                Self::GetAppchain { chain_id: args.string(0)? }
            }
            "GetAppchainByName" => {
                n(1)?;
                Self::GetAppchainByName { chain_name: args.string(0)? }
            }
            "GetAllAppchains" => {
                n(0)?;
                Self::GetAllAppchains
            }
            "IsAvailable" => {
                n(1)?;
                Self::IsAvailable { chain_id: args.string(0)? }
            }
            other => return Err(VmError::MethodNotFound(other.to_string())),
        };
        Ok(op)
    }
}

/// Appchain manager contract.
#[derive(Debug, Default)]
pub struct AppchainManager;

impl AppchainManager {
    /// Create the contract.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn run(&self, stub: &dyn Stub, op: Op) -> ContractResult<Response> {
        let chains = ResourceStore::<Appchain>::new(stub);
        match op {
            Op::RegisterAppchain {
                chain_id,
                chain_name,
                chain_type,
                trust_root,
                broker,
                desc,
                master_rule,
                master_rule_url,
                admins,
                reason,
            } => {
                let chain = Appchain {
                    id: chain_id,
                    chain_name,
                    chain_type,
                    trust_root,
                    broker,
                    desc,
                    status: GovernanceStatus::Unavailable,
                    create_time: stub.tx_timestamp(),
                };
                let registration = AppchainRegistration {
                    admins: split_list(&admins),
                    master_rule,
                    master_rule_url,
                };
                self.register(stub, chain, registration, &reason)
            }
            Op::UpdateAppchain {
                chain_id,
                chain_name,
                desc,
                trust_root,
                admins,
                reason,
            } => {
                check_permission(
                    stub,
                    &[Permission::SelfOwned(Owner::AppchainAdmin(&chain_id))],
                    stub.current_caller(),
                )?;
                self.update(stub, &chain_id, chain_name, desc, trust_root, split_list(&admins), &reason)
            }
            Op::FreezeAppchain { chain_id, reason } => {
                check_permission(stub, &[Permission::Admin], stub.current_caller())?;
                self.submit_event(stub, &chain_id, EventType::Freeze, &reason)
            }
            Op::ActivateAppchain { chain_id, reason } => {
                check_permission(
                    stub,
                    &[Permission::SelfOwned(Owner::AppchainAdmin(&chain_id)), Permission::Admin],
                    stub.current_caller(),
                )?;
                self.submit_event(stub, &chain_id, EventType::Activate, &reason)
            }
            Op::LogoutAppchain { chain_id, reason } => {
                check_permission(
                    stub,
                    &[Permission::SelfOwned(Owner::AppchainAdmin(&chain_id))],
                    stub.current_caller(),
                )?;
                self.submit_event(stub, &chain_id, EventType::Logout, &reason)
            }
            Op::Manage(args) => {
                only_governance(stub)?;
                self.manage(stub, &args.parse()?)
            }
            Op::GetAppchain { chain_id } => json_response(&chains.load(&chain_id)?),
            Op::GetAppchainByName { chain_name } => {
                let chain_id = index::holder(stub, &name_key(&chain_name))
                    .ok_or_else(|| ContractError::not_found(format!("the appchain named {chain_name} does not exist")))?;
                json_response(&chains.load(&chain_id)?)
            }
            Op::GetAllAppchains => json_response(&chains.all()?),
            Op::IsAvailable { chain_id } => {
                Ok(bool_response(chains.get(&chain_id)?.is_some_and(|c| c.is_available())))
            }
        }
    }

    fn register(
        &self,
        stub: &dyn Stub,
        chain: Appchain,
        registration: AppchainRegistration,
        reason: &str,
    ) -> ContractResult<Response> {
        if chain.id.is_empty() || chain.chain_name.is_empty() || chain.broker.is_empty() {
            return Err(ContractError::invalid("appchain id, name and broker must not be empty"));
        }
        if registration.master_rule.is_empty() {
            return Err(ContractError::invalid("master rule address is empty"));
        }
        let caller = stub.caller().to_string();
        if !registration.admins.contains(&caller) {
            return Err(ContractError::denied(caller, "the sender must be one of the appchain admins"));
        }

        let chains = ResourceStore::<Appchain>::new(stub);
        chains.governance_pre(&chain.id, EventType::Register)?;
        index::reserve(stub, &name_key(&chain.chain_name), &chain.chain_name, &chain.id)?;
        invoke(
            stub,
            addresses::ROLE_MANAGER,
            "OccupyAccount",
            vec![Arg::string(registration.admins.join(",")), Arg::string("appchainAdmin")],
        )?;
        chains.save(&chain)?;

        let proposal_id = submit_proposal(
            stub,
            &ProposalRequest {
                event: EventType::Register,
                typ: ProposalType::AppchainMgr,
                obj_id: &chain.id,
                last_status: Some(GovernanceStatus::Unavailable),
                reason,
                extra: serde_json::to_vec(&registration)?,
            },
        )?;
        let chain = chains.change_status(&chain.id, EventType::Register, Some(GovernanceStatus::Unavailable))?;
        post_audit(stub, LogEventType::AuditAppchain, &chain, vec![chain.id.clone()], vec![])?;
        zero_permission(stub, &proposal_id)?;
        info!("[{COMPONENT}] register appchain {}: proposal {proposal_id}", chain.id);
        governance_ret(proposal_id, chain.id.into_bytes())
    }

    #[allow(clippy::too_many_arguments)]
    fn update(
        &self,
        stub: &dyn Stub,
        chain_id: &str,
        chain_name: String,
        desc: String,
        trust_root: Vec<u8>,
        admins: Vec<String>,
        reason: &str,
    ) -> ContractResult<Response> {
        let chains = ResourceStore::<Appchain>::new(stub);
        let mut chain = chains
            .governance_pre(chain_id, EventType::Update)?
            .ok_or_else(|| ContractError::not_found(format!("the appchain {chain_id} does not exist")))?;

        let current_admins: Vec<Role> = invoke_json(
            stub,
            addresses::ROLE_MANAGER,
            "GetAppchainAdmins",
            vec![Arg::string(chain_id)],
        )?;
        let current_admins: Vec<String> = current_admins.into_iter().map(|r| r.id).collect();
        if !admins.is_empty() && !admins.iter().any(|a| a == stub.caller()) {
            return Err(ContractError::invalid("the sender must stay an appchain admin"));
        }

        let diff = AppchainUpdate {
            name: Edit::between(&chain.chain_name, &chain_name),
            admins: if admins.is_empty() {
                None
            } else {
                Edit::between(&normalized(&current_admins), &normalized(&admins))
            },
            desc: Edit::between(&chain.desc, &desc),
            trust_root: Edit::between(&chain.trust_root, &trust_root),
        };

        if !diff.needs_vote() {
            diff.apply(&mut chain);
            chains.save(&chain)?;
            post_audit(stub, LogEventType::AuditAppchain, &chain, vec![chain_id.to_string()], vec![])?;
            return governance_ret("", Vec::new());
        }

        if let Some(name) = &diff.name {
            if name.new.is_empty() {
                return Err(ContractError::invalid("appchain name is empty"));
            }
            index::reserve(stub, &name_key(&name.new), &name.new, chain_id)?;
        }
        if let Some(admins) = &diff.admins {
            let added: Vec<String> = admins.new.iter().filter(|a| !admins.old.contains(a)).cloned().collect();
            if !added.is_empty() {
                invoke(
                    stub,
                    addresses::ROLE_MANAGER,
                    "OccupyAccount",
                    vec![Arg::string(added.join(",")), Arg::string("appchainAdmin")],
                )?;
            }
        }

        let last = chain.status;
        let proposal_id = submit_proposal(
            stub,
            &ProposalRequest {
                event: EventType::Update,
                typ: ProposalType::AppchainMgr,
                obj_id: chain_id,
                last_status: Some(last),
                reason,
                extra: serde_json::to_vec(&diff)?,
            },
        )?;
        let chain = chains.change_status(chain_id, EventType::Update, Some(last))?;
        post_audit(stub, LogEventType::AuditAppchain, &chain, vec![chain_id.to_string()], vec![])?;
        zero_permission(stub, &proposal_id)?;
        governance_ret(proposal_id, Vec::new())
    }

    fn submit_event(&self, stub: &dyn Stub, chain_id: &str, event: EventType, reason: &str) -> ContractResult<Response> {
        let chains = ResourceStore::<Appchain>::new(stub);
        let chain = chains
            .governance_pre(chain_id, event)?
            .ok_or_else(|| ContractError::not_found(format!("the appchain {chain_id} does not exist")))?;

        let last = chain.status;
        let proposal_id = submit_proposal(
            stub,
            &ProposalRequest {
                event,
                typ: ProposalType::AppchainMgr,
                obj_id: chain_id,
                last_status: Some(last),
                reason,
                extra: Vec::new(),
            },
        )?;
        let chain = chains.change_status(chain_id, event, Some(last))?;
        if event == EventType::Logout && last != GovernanceStatus::Frozen {
            invoke(stub, addresses::SERVICE_MANAGER, "PauseChainService", vec![Arg::string(chain_id)])?;
        }
        post_audit(stub, LogEventType::AuditAppchain, &chain, vec![chain_id.to_string()], vec![])?;
        zero_permission(stub, &proposal_id)?;
        governance_ret(proposal_id, Vec::new())
    }

    fn manage(&self, stub: &dyn Stub, call: &ManageCall) -> ContractResult<Response> {
        let chains = ResourceStore::<Appchain>::new(stub);
        let mut chain = chains.settle(&call.obj_id, call.trigger, call.last)?;
        let chain_id = chain.id.clone();
        let services = |method: &str| invoke(stub, addresses::SERVICE_MANAGER, method, vec![Arg::string(&chain_id)]);

        match (call.event, call.approved()) {
            (EventType::Register, true) => {
                let registration: AppchainRegistration = serde_json::from_slice(&call.extra)?;
                invoke(
                    stub,
                    addresses::ROLE_MANAGER,
                    "UpdateAppchainAdmin",
                    vec![Arg::string(&chain_id), Arg::string(registration.admins.join(","))],
                )?;
                invoke(
                    stub,
                    addresses::RULE_MANAGER,
                    "RegisterRuleFirst",
                    vec![
                        Arg::string(&chain_id),
                        Arg::string(&registration.master_rule),
                        Arg::string(&registration.master_rule_url),
                    ],
                )?;
            }
            (EventType::Register, false) => {
                let registration: AppchainRegistration = serde_json::from_slice(&call.extra)?;
                index::release(stub, &name_key(&chain.chain_name), &chain_id);
                invoke(
                    stub,
                    addresses::ROLE_MANAGER,
                    "FreeAccount",
                    vec![Arg::string(registration.admins.join(","))],
                )?;
            }
            (EventType::Update, true) => {
                let diff: AppchainUpdate = serde_json::from_slice(&call.extra)?;
                if let Some(name) = &diff.name {
                    index::release(stub, &name_key(&name.old), &chain_id);
                }
                diff.apply(&mut chain);
                chains.save(&chain)?;
                if let Some(admins) = &diff.admins {
                    invoke(
                        stub,
                        addresses::ROLE_MANAGER,
                        "UpdateAppchainAdmin",
                        vec![Arg::string(&chain_id), Arg::string(admins.new.join(","))],
                    )?;
                }
            }
            (EventType::Update, false) => {
                let diff: AppchainUpdate = serde_json::from_slice(&call.extra)?;
                if let Some(name) = &diff.name {
                    index::release(stub, &name_key(&name.new), &chain_id);
                }
                if let Some(admins) = &diff.admins {
                    let added: Vec<String> = admins.new.iter().filter(|a| !admins.old.contains(a)).cloned().collect();
                    if !added.is_empty() {
                        invoke(stub, addresses::ROLE_MANAGER, "FreeAccount", vec![Arg::string(added.join(","))])?;
                    }
                }
            }
            (EventType::Freeze, true) => {
                services("PauseChainService")?;
            }
            (EventType::Activate, true) => {
                services("UnPauseChainService")?;
            }
            (EventType::Logout, true) => {
                services("ClearChainService")?;
                invoke(stub, addresses::RULE_MANAGER, "ClearRule", vec![Arg::string(&chain_id)])?;
            }
            (EventType::Logout, false) => {
                if chain.is_available() {
                    services("UnPauseChainService")?;
                }
            }
            _ => {}
        }

        post_audit(stub, LogEventType::AuditAppchain, &chain, vec![chain_id.clone()], vec![])?;
        info!("[{COMPONENT}] {chain_id} {} {}: now {}", call.event, call.trigger, chain.status);
        Ok(Response::empty())
    }
}

impl Contract for AppchainManager {
    fn name(&self) -> &'static str {
        COMPONENT
    }

    fn dispatch(&self, stub: &dyn Stub, method: &str, args: &Args) -> Result<Response, VmError> {
        let op = Op::decode(method, args)?;
        Ok(respond(COMPONENT, method, self.run(stub, op)))
    }
}
