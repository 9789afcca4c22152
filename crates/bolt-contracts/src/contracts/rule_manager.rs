//! # Rule Manager
//!
//! Each appchain has one master rule validating its proofs. Further rules
//! may be registered and swapped in as master through a proposal.

use super::{respond, ManageArgs, ManageCall};
use crate::addresses;
use crate::domain::proposal::ProposalType;
use crate::domain::rule::Rule;
use crate::errors::{ContractError, ContractResult};
use crate::governance::audit::post_audit;
use crate::governance::call::{bool_response, invoke_bool, json_response};
use crate::governance::permission::{check_permission, only, only_governance, Owner, Permission};
use crate::governance::proposals::{
    end_obj_proposal, governance_ret, submit_proposal, zero_permission, ProposalRequest,
};
use crate::governance::status::{EventType, GovernanceStatus, ManageTrigger};
use crate::governance::store::{Governable, ResourceStore};
use bolt_vm::domain::args::Args;
use bolt_vm::domain::entities::{EventType as LogEventType, Response};
use bolt_vm::domain::value_objects::Arg;
use bolt_vm::ports::{Contract, Stub};
use bolt_vm::VmError;
use serde::{Deserialize, Serialize};
use tracing::info;

const COMPONENT: &str = "rule-mgr";

/// Payload of a master rule update proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterRuleUpdate {
    /// Id of the master rule being replaced.
    pub old_master: String,
}

#[derive(Debug)]
enum Op {
    RegisterRuleFirst { chain_id: String, rule_addr: String, url: String },
    RegisterRule { chain_id: String, rule_addr: String, url: String },
    UpdateMasterRule { chain_id: String, rule_addr: String, reason: String },
    LogoutRule { chain_id: String, rule_addr: String },
    ClearRule { chain_id: String },
    Manage(ManageArgs),
    GetRuleByAddr { chain_id: String, rule_addr: String },
    GetMasterRule { chain_id: String },
    GetRules { chain_id: String },
    HasMasterRule { chain_id: String },
    IsAvailableRule { chain_id: String, rule_addr: String },
}

impl Op {
    fn decode(method: &str, args: &Args) -> Result<Self, VmError> {
        let n = |expected| args.expect_len(method, expected);
        let op = match method {
            "RegisterRuleFirst" | "RegisterRule" => {
                n(3)?;
                let (chain_id, rule_addr, url) = (args.string(0)?, args.string(1)?, args.string(2)?);
                if method == "RegisterRuleFirst" {
                    Self::RegisterRuleFirst { chain_id, rule_addr, url }
                } else {
                    Self::RegisterRule { chain_id, rule_addr, url }
                }
            }
            "UpdateMasterRule" => {
                n(3)?;
                Self::UpdateMasterRule {
                    chain_id: args.string(0)?,
                    rule_addr: args.string(1)?,
                    reason: args.string(2)?,
                }
            }
            "LogoutRule" | "GetRuleByAddr" | "IsAvailableRule" => {
                n(2)?;
                let (chain_id, rule_addr) = (args.string(0)?, args.string(1)?);
                match method {
                    "LogoutRule" => Self::LogoutRule { chain_id, rule_addr },
                    "GetRuleByAddr" => Self::GetRuleByAddr { chain_id, rule_addr },
                    _ => Self::IsAvailableRule { chain_id, rule_addr },
                }
            }
            "ClearRule" | "GetMasterRule" | "GetRules" | "HasMasterRule" => {
                n(1)?;
                let chain_id = args.string(0)?;
                match method {
                    "ClearRule" => Self::ClearRule { chain_id },
                    "GetMasterRule" => Self::GetMasterRule { chain_id },
                    "GetRules" => Self::GetRules { chain_id },
                    _ => Self::HasMasterRule { chain_id },
                }
            }
            "Manage" => Self::Manage(ManageArgs::decode(method, args)?),
            other => return Err(VmError::MethodNotFound(other.to_string())),
        };
        Ok(op)
    }
}

/// Rule manager contract.
#[derive(Debug, Default)]
pub struct RuleManager;

impl RuleManager {
    /// Create the contract.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn run(&self, stub: &dyn Stub, op: Op) -> ContractResult<Response> {
        let rules = ResourceStore::<Rule>::new(stub);
        match op {
            Op::RegisterRuleFirst { chain_id, rule_addr, url } => {
                only(stub, addresses::APPCHAIN_MANAGER)?;
                if master_rule(stub, &chain_id)?.is_some() {
                    return Err(ContractError::invalid(format!("appchain {chain_id} already has a master rule")));
                }
                let rule = new_rule(stub, &chain_id, &rule_addr, &url, true, GovernanceStatus::Available)?;
                rules.save(&rule)?;
                post_audit(stub, LogEventType::AuditRule, &rule, vec![chain_id], vec![])?;
                Ok(Response::empty())
            }
            Op::RegisterRule { chain_id, rule_addr, url } => {
                check_self(stub, &chain_id)?;
                if !invoke_bool(stub, addresses::APPCHAIN_MANAGER, "IsAvailable", vec![Arg::string(&chain_id)])? {
                    return Err(ContractError::invalid(format!("the appchain {chain_id} is not available")));
                }
                let id = Rule::id_of(&chain_id, &rule_addr);
                rules.governance_pre(&id, EventType::Register)?;
                let rule = new_rule(stub, &chain_id, &rule_addr, &url, false, GovernanceStatus::Unavailable)?;
                rules.save(&rule)?;
                let rule = rules.change_status(&id, EventType::Register, None)?;
                post_audit(stub, LogEventType::AuditRule, &rule, vec![chain_id], vec![])?;
                governance_ret("", id.into_bytes())
            }
            Op::UpdateMasterRule { chain_id, rule_addr, reason } => {
                check_self(stub, &chain_id)?;
                self.update_master_rule(stub, &chain_id, &rule_addr, &reason)
            }
            Op::LogoutRule { chain_id, rule_addr } => {
                check_self(stub, &chain_id)?;
                let id = Rule::id_of(&chain_id, &rule_addr);
                let rule = rules
                    .governance_pre(&id, EventType::Logout)?
                    .ok_or_else(|| ContractError::not_found(format!("the rule {id} does not exist")))?;
                if rule.master {
                    return Err(ContractError::invalid("can not logout the master rule"));
                }
                let rule = rules.change_status(&id, EventType::Logout, None)?;
                post_audit(stub, LogEventType::AuditRule, &rule, vec![chain_id], vec![])?;
                Ok(Response::empty())
            }
            Op::ClearRule { chain_id } => {
                only(stub, addresses::APPCHAIN_MANAGER)?;
                for rule in chain_rules(stub, &chain_id)? {
                    if rule.machine().can_fire(EventType::Clear, rule.status) {
                        let id = rule.governance_id();
                        end_obj_proposal(stub, &id, "the appchain is logged out")?;
                        let rule = rules.change_status(&id, EventType::Clear, None)?;
                        post_audit(stub, LogEventType::AuditRule, &rule, vec![chain_id.clone()], vec![])?;
                    }
                }
                info!("[{COMPONENT}] cleared rules of {chain_id}");
                Ok(Response::empty())
            }
            Op::Manage(args) => {
                only_governance(stub)?;
                self.manage(stub, &args.parse()?)
            }
            Op::GetRuleByAddr { chain_id, rule_addr } => {
                json_response(&rules.load(&Rule::id_of(&chain_id, &rule_addr))?)
            }
            Op::GetMasterRule { chain_id } => {
                let rule = master_rule(stub, &chain_id)?
                    .ok_or_else(|| ContractError::not_found(format!("appchain {chain_id} has no master rule")))?;
                json_response(&rule)
            }
            Op::GetRules { chain_id } => json_response(&chain_rules(stub, &chain_id)?),
            Op::HasMasterRule { chain_id } => Ok(bool_response(master_rule(stub, &chain_id)?.is_some())),
            Op::IsAvailableRule { chain_id, rule_addr } => {
                let rule = rules.get(&Rule::id_of(&chain_id, &rule_addr))?;
                Ok(bool_response(rule.is_some_and(|r| r.status == GovernanceStatus::Available)))
            }
        }
    }

    fn update_master_rule(&self, stub: &dyn Stub, chain_id: &str, rule_addr: &str, reason: &str) -> ContractResult<Response> {
        let rules = ResourceStore::<Rule>::new(stub);
        let new_id = Rule::id_of(chain_id, rule_addr);
        rules
            .governance_pre(&new_id, EventType::Bind)?
            .ok_or_else(|| ContractError::not_found(format!("the rule {new_id} does not exist")))?;
        let old = master_rule(stub, chain_id)?
            .ok_or_else(|| ContractError::not_found(format!("appchain {chain_id} has no master rule")))?;
        let old_id = old.governance_id();
        rules.governance_pre(&old_id, EventType::Unbind)?;

        let payload = MasterRuleUpdate {
            old_master: old_id.clone(),
        };
        let proposal_id = submit_proposal(
            stub,
            &ProposalRequest {
                event: EventType::Bind,
                typ: ProposalType::RuleMgr,
                obj_id: &new_id,
                last_status: Some(GovernanceStatus::Bindable),
                reason,
                extra: serde_json::to_vec(&payload)?,
            },
        )?;
        let new_rule = rules.change_status(&new_id, EventType::Bind, Some(GovernanceStatus::Bindable))?;
        let old_rule = rules.change_status(&old_id, EventType::Unbind, Some(GovernanceStatus::Available))?;
        post_audit(stub, LogEventType::AuditRule, &new_rule, vec![chain_id.to_string()], vec![])?;
        post_audit(stub, LogEventType::AuditRule, &old_rule, vec![chain_id.to_string()], vec![])?;
        zero_permission(stub, &proposal_id)?;
        info!("[{COMPONENT}] master rule of {chain_id}: {old_id} -> {new_id}, proposal {proposal_id}");
        governance_ret(proposal_id, Vec::new())
    }

    fn manage(&self, stub: &dyn Stub, call: &ManageCall) -> ContractResult<Response> {
        let rules = ResourceStore::<Rule>::new(stub);
        let mut rule = rules.settle(&call.obj_id, call.trigger, call.last)?;

        if call.event == EventType::Bind {
            let payload: MasterRuleUpdate = serde_json::from_slice(&call.extra)?;
            // the old master waits on this proposal alone
            let old_trigger = match call.trigger {
                ManageTrigger::Discarded => ManageTrigger::Rejected,
                trigger => trigger,
            };
            let mut old = rules.settle(&payload.old_master, old_trigger, Some(GovernanceStatus::Available))?;
            if call.approved() {
                rule.master = true;
                old.master = false;
                rules.save(&rule)?;
                rules.save(&old)?;
            }
            post_audit(stub, LogEventType::AuditRule, &old, vec![old.chain_id.clone()], vec![])?;
        }

        post_audit(stub, LogEventType::AuditRule, &rule, vec![rule.chain_id.clone()], vec![])?;
        info!("[{COMPONENT}] {} {} {}: now {}", call.obj_id, call.event, call.trigger, rule.status);
        Ok(Response::empty())
    }
}

fn check_self(stub: &dyn Stub, chain_id: &str) -> ContractResult<()> {
    check_permission(
        stub,
        &[Permission::SelfOwned(Owner::AppchainAdmin(chain_id))],
        stub.current_caller(),
    )
}

fn new_rule(
    stub: &dyn Stub,
    chain_id: &str,
    rule_addr: &str,
    url: &str,
    master: bool,
    status: GovernanceStatus,
) -> ContractResult<Rule> {
    if chain_id.is_empty() || rule_addr.is_empty() {
        return Err(ContractError::invalid("chain id and rule address must not be empty"));
    }
    Ok(Rule {
        address: rule_addr.to_string(),
        chain_id: chain_id.to_string(),
        url: url.to_string(),
        master,
        status,
        create_time: stub.tx_timestamp(),
    })
}

fn chain_rules(stub: &dyn Stub, chain_id: &str) -> ContractResult<Vec<Rule>> {
    stub.query(&Rule::chain_prefix(chain_id))
        .iter()
        .map(|data| serde_json::from_slice(data).map_err(ContractError::from))
        .collect()
}

fn master_rule(stub: &dyn Stub, chain_id: &str) -> ContractResult<Option<Rule>> {
    Ok(chain_rules(stub, chain_id)?
        .into_iter()
        .find(|r| r.master && r.status != GovernanceStatus::Forbidden))
}

impl Contract for RuleManager {
    fn name(&self) -> &'static str {
        COMPONENT
    }

    fn dispatch(&self, stub: &dyn Stub, method: &str, args: &Args) -> Result<Response, VmError> {
        let op = Op::decode(method, args)?;
        Ok(respond(COMPONENT, method, self.run(stub, op)))
    }
}
