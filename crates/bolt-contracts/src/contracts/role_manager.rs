//! # Role Manager
//!
//! Holds every privileged account: governance admins (the electorate),
//! audit admins bound to non-validating nodes, and appchain admins.
//! Other contracts ask it who may do what.

use super::{respond, ManageArgs, ManageCall};
use crate::addresses;
use crate::config::GovernanceConfig;
use crate::domain::node::{Node, NodeType};
use crate::domain::proposal::ProposalType;
use crate::domain::role::{Role, RoleType, ROLE_MACHINE};
use crate::errors::{ContractError, ContractResult};
use crate::governance::audit::post_audit;
use crate::governance::call::{bool_response, invoke, invoke_json, json_response};
use crate::governance::diff::split_list;
use crate::governance::index;
use crate::governance::permission::{check_permission, only, only_governance, Permission};
use crate::governance::proposals::{governance_ret, submit_proposal, zero_permission, ProposalRequest};
use crate::governance::status::{EventType, GovernanceStatus};
use crate::governance::store::ResourceStore;
use bolt_vm::domain::args::Args;
use bolt_vm::domain::entities::{EventType as LogEventType, Response};
use bolt_vm::domain::value_objects::{Address, Arg};
use bolt_vm::ports::{Contract, Stub};
use bolt_vm::VmError;
use std::sync::Arc;
use tracing::info;

const COMPONENT: &str = "role-mgr";

fn admins_key(chain_id: &str) -> String {
    format!("appchain-admins-{chain_id}")
}

pub(crate) fn occupied_key(addr: &str) -> String {
    format!("occupied-{addr}")
}

// =============================================================================
// OPERATIONS
// =============================================================================

#[derive(Debug)]
enum Op {
    RegisterRole {
        role_id: String,
        role_type: String,
        node_account: String,
        reason: String,
    },
    FreezeRole { role_id: String, reason: String },
    ActivateRole { role_id: String, reason: String },
    LogoutRole { role_id: String, reason: String },
    Manage(ManageArgs),
    PauseAuditAdmin { role_id: String },
    UpdateAppchainAdmin { chain_id: String, addrs: String },
    OccupyAccount { addrs: String, role_type: String },
    FreeAccount { addrs: String },
    GetRole { role_id: String },
    GetRolesByType { role_type: String },
    GetAppchainAdmins { chain_id: String },
    IsAnyAdmin { addr: String, role_type: String },
    IsAnyAvailableAdmin { addr: String, role_type: String },
    IsAppchainAdmin { addr: String, chain_id: String },
    IsOccupiedAccount { addr: String },
    GetRoleWeight { addr: String },
}

impl Op {
    fn decode(method: &str, args: &Args) -> Result<Self, VmError> {
        let n = |expected| args.expect_len(method, expected);
        let op = match method {
            "RegisterRole" => {
                n(4)?;
                Self::RegisterRole {
                    role_id: args.string(0)?,
                    role_type: args.string(1)?,
                    node_account: args.string(2)?,
                    reason: args.string(3)?,
                }
            }
            "FreezeRole" | "ActivateRole" | "LogoutRole" => {
                n(2)?;
                let (role_id, reason) = (args.string(0)?, args.string(1)?);
                match method {
                    "FreezeRole" => Self::FreezeRole { role_id, reason },
                    "ActivateRole" => Self::ActivateRole { role_id, reason },
                    _ => Self::LogoutRole { role_id, reason },
                }
            }
            "Manage" => Self::Manage(ManageArgs::decode(method, args)?),
            "PauseAuditAdmin" => {
                n(1)?;
                Self::PauseAuditAdmin { role_id: args.string(0)? }
            }
            "UpdateAppchainAdmin" => {
                n(2)?;
                Self::UpdateAppchainAdmin {
                    chain_id: args.string(0)?,
                    addrs: args.string(1)?,
                }
            }
            "OccupyAccount" => {
                n(2)?;
                Self::OccupyAccount {
                    addrs: args.string(0)?,
                    role_type: args.string(1)?,
                }
            }
            "FreeAccount" => {
                n(1)?;
                Self::FreeAccount { addrs: args.string(0)? }
            }
            "GetRole" => {
                n(1)?;
                Self::GetRole { role_id: args.string(0)? }
            }
            "GetRolesByType" => {
                n(1)?;
                Self::GetRolesByType { role_type: args.string(0)? }
            }
            "GetAppchainAdmins" => {
                n(1)?;
                Self::GetAppchainAdmins { chain_id: args.string(0)? }
            }
            "IsAnyAdmin" | "IsAnyAvailableAdmin" => {
                n(2)?;
                let (addr, role_type) = (args.string(0)?, args.string(1)?);
                if method == "IsAnyAdmin" {
                    Self::IsAnyAdmin { addr, role_type }
                } else {
                    Self::IsAnyAvailableAdmin { addr, role_type }
                }
            }
            "IsAppchainAdmin" => {
                n(2)?;
                Self::IsAppchainAdmin {
                    addr: args.string(0)?,
                    chain_id: args.string(1)?,
                }
            }
            "IsOccupiedAccount" => {
                n(1)?;
                Self::IsOccupiedAccount { addr: args.string(0)? }
            }
            "GetRoleWeight" => {
                n(1)?;
                Self::GetRoleWeight { addr: args.string(0)? }
            }
            other => return Err(VmError::MethodNotFound(other.to_string())),
        };
        Ok(op)
    }
}

// =============================================================================
// CONTRACT
// =============================================================================

/// Role manager contract.
pub struct RoleManager {
    config: Arc<GovernanceConfig>,
}

impl RoleManager {
    /// Create the contract.
    #[must_use]
    pub fn new(config: Arc<GovernanceConfig>) -> Self {
        Self { config }
    }

    fn run(&self, stub: &dyn Stub, op: Op) -> ContractResult<Response> {
        let roles = ResourceStore::<Role>::new(stub);
        match op {
            Op::RegisterRole {
                role_id,
                role_type,
                node_account,
                reason,
            } => self.register_role(stub, &role_id, &role_type, &node_account, &reason),
            Op::FreezeRole { role_id, reason } => {
                self.submit_event(stub, &role_id, EventType::Freeze, &reason)
            }
            Op::ActivateRole { role_id, reason } => {
                self.submit_event(stub, &role_id, EventType::Activate, &reason)
            }
            Op::LogoutRole { role_id, reason } => {
                self.submit_event(stub, &role_id, EventType::Logout, &reason)
            }
            Op::Manage(args) => {
                only_governance(stub)?;
                self.manage(stub, &args.parse()?)
            }
            Op::PauseAuditAdmin { role_id } => {
                only(stub, addresses::NODE_MANAGER)?;
                let role = roles.load(&role_id)?;
                if ROLE_MACHINE.can_fire(EventType::Pause, role.status) {
                    let role = roles.change_status(&role_id, EventType::Pause, None)?;
                    post_audit(stub, LogEventType::AuditRole, &role, vec![], vec![role.node_account.clone()])?;
                }
                Ok(Response::empty())
            }
            Op::UpdateAppchainAdmin { chain_id, addrs } => {
                only(stub, addresses::APPCHAIN_MANAGER)?;
                self.update_appchain_admins(stub, &chain_id, &split_list(&addrs))?;
                Ok(Response::empty())
            }
            Op::OccupyAccount { addrs, role_type } => {
                only(stub, addresses::APPCHAIN_MANAGER)?;
                let role_type: RoleType = role_type.parse()?;
                let addrs = split_list(&addrs);
                for addr in &addrs {
                    check_address(addr)?;
                    if is_occupied(stub, &roles, addr)? {
                        return Err(ContractError::DuplicateName {
                            name: addr.clone(),
                            holder: "another role".to_string(),
                        });
                    }
                }
                for addr in &addrs {
                    stub.set(&occupied_key(addr), role_type.as_str().as_bytes().to_vec());
                }
                Ok(Response::empty())
            }
            Op::FreeAccount { addrs } => {
                only(stub, addresses::APPCHAIN_MANAGER)?;
                for addr in split_list(&addrs) {
                    stub.delete(&occupied_key(&addr));
                }
                Ok(Response::empty())
            }
            Op::GetRole { role_id } => json_response(&roles.load(&role_id)?),
            Op::GetRolesByType { role_type } => {
                let typ: RoleType = role_type.parse()?;
                let found: Vec<Role> = roles
                    .all()?
                    .into_iter()
                    .filter(|r| r.matches(typ, self.config.super_admin_weight))
                    .collect();
                json_response(&found)
            }
            Op::GetAppchainAdmins { chain_id } => {
                let mut found = Vec::new();
                for id in index::members(stub, &admins_key(&chain_id))? {
                    found.push(roles.load(&id)?);
                }
                json_response(&found)
            }
            Op::IsAnyAdmin { addr, role_type } => {
                let typ: RoleType = role_type.parse()?;
                let admin = roles
                    .get(&addr)?
                    .is_some_and(|r| r.matches(typ, self.config.super_admin_weight));
                Ok(bool_response(admin))
            }
            Op::IsAnyAvailableAdmin { addr, role_type } => {
                let typ: RoleType = role_type.parse()?;
                let admin = roles
                    .get(&addr)?
                    .is_some_and(|r| r.is_available() && r.matches(typ, self.config.super_admin_weight));
                Ok(bool_response(admin))
            }
            Op::IsAppchainAdmin { addr, chain_id } => {
                let admin = roles.get(&addr)?.is_some_and(|r| {
                    r.typ == RoleType::AppchainAdmin && r.appchain_id == chain_id && r.is_available()
                });
                Ok(bool_response(admin))
            }
            Op::IsOccupiedAccount { addr } => Ok(bool_response(is_occupied(stub, &roles, &addr)?)),
            Op::GetRoleWeight { addr } => {
                let role = roles.load(&addr)?;
                Ok(Response::success(role.weight.to_string()))
            }
        }
    }

    fn register_role(
        &self,
        stub: &dyn Stub,
        role_id: &str,
        role_type: &str,
        node_account: &str,
        reason: &str,
    ) -> ContractResult<Response> {
        check_permission(stub, &[Permission::Admin], stub.current_caller())?;
        check_address(role_id)?;
        let typ: RoleType = role_type.parse()?;
        if !matches!(typ, RoleType::GovernanceAdmin | RoleType::AuditAdmin) {
            return Err(ContractError::invalid(format!("can not register role of type {typ}")));
        }

        let roles = ResourceStore::<Role>::new(stub);
        roles.governance_pre(role_id, EventType::Register)?;
        if stub.has(&occupied_key(role_id)) {
            return Err(ContractError::DuplicateName {
                name: role_id.to_string(),
                holder: "another role".to_string(),
            });
        }

        let mut role = Role {
            id: role_id.to_string(),
            typ,
            weight: self.config.admin_weight,
            node_account: String::new(),
            appchain_id: String::new(),
            status: GovernanceStatus::Unavailable,
        };
        if typ == RoleType::AuditAdmin {
            let node: Node = invoke_json(stub, addresses::NODE_MANAGER, "GetNode", vec![Arg::string(node_account)])?;
            if node.typ != NodeType::NvpNode {
                return Err(ContractError::invalid(format!("the node {node_account} is not a nvpNode")));
            }
            if node.status != GovernanceStatus::Bindable {
                return Err(ContractError::invalid(format!(
                    "the node {node_account} is {} and can not be bound",
                    node.status
                )));
            }
            invoke(
                stub,
                addresses::NODE_MANAGER,
                "BindNode",
                vec![Arg::string(node_account), Arg::string(role_id)],
            )?;
            role.node_account = node_account.to_string();
            role.weight = 0;
        }
        roles.save(&role)?;

        let proposal_id = submit_proposal(
            stub,
            &ProposalRequest {
                event: EventType::Register,
                typ: ProposalType::RoleMgr,
                obj_id: role_id,
                last_status: Some(GovernanceStatus::Unavailable),
                reason,
                extra: Vec::new(),
            },
        )?;
        let role = roles.change_status(role_id, EventType::Register, Some(GovernanceStatus::Unavailable))?;
        post_audit(stub, LogEventType::AuditRole, &role, vec![], related_nodes(&role))?;
        zero_permission(stub, &proposal_id)?;
        info!("[{COMPONENT}] register {typ} {role_id}: proposal {proposal_id}");
        governance_ret(proposal_id, role_id.as_bytes().to_vec())
    }

    fn submit_event(&self, stub: &dyn Stub, role_id: &str, event: EventType, reason: &str) -> ContractResult<Response> {
        check_permission(stub, &[Permission::Admin], stub.current_caller())?;
        let roles = ResourceStore::<Role>::new(stub);
        let role = roles.load(role_id)?;
        let super_admin = role.is_super_admin(self.config.super_admin_weight);
        let forbidden = match event {
            EventType::Logout => super_admin || role.typ == RoleType::AppchainAdmin,
            _ => super_admin || matches!(role.typ, RoleType::AppchainAdmin | RoleType::AuditAdmin),
        };
        if forbidden {
            return Err(ContractError::denied(
                stub.current_caller(),
                format!("can not {event} role {role_id} of type {}", role.typ),
            ));
        }
        if event == EventType::Logout && role_id == stub.caller() {
            return Err(ContractError::denied(role_id, "can not logout yourself"));
        }
        roles.governance_pre(role_id, event)?;

        let last = role.status;
        let proposal_id = submit_proposal(
            stub,
            &ProposalRequest {
                event,
                typ: ProposalType::RoleMgr,
                obj_id: role_id,
                last_status: Some(last),
                reason,
                extra: Vec::new(),
            },
        )?;
        let role = roles.change_status(role_id, event, Some(last))?;
        post_audit(stub, LogEventType::AuditRole, &role, vec![], related_nodes(&role))?;
        zero_permission(stub, &proposal_id)?;
        governance_ret(proposal_id, Vec::new())
    }

    fn manage(&self, stub: &dyn Stub, call: &ManageCall) -> ContractResult<Response> {
        let roles = ResourceStore::<Role>::new(stub);
        let role = roles.settle(&call.obj_id, call.trigger, call.last)?;

        if role.typ == RoleType::AuditAdmin {
            match call.event {
                EventType::Register => {
                    invoke(
                        stub,
                        addresses::NODE_MANAGER,
                        "ManageBindNode",
                        vec![
                            Arg::string(&role.node_account),
                            Arg::string(if call.approved() { "approved" } else { "rejected" }),
                        ],
                    )?;
                }
                EventType::Logout if call.approved() => {
                    invoke(stub, addresses::NODE_MANAGER, "UnbindNode", vec![Arg::string(&role.node_account)])?;
                }
                _ => {}
            }
        }

        post_audit(stub, LogEventType::AuditRole, &role, vec![], related_nodes(&role))?;
        info!("[{COMPONENT}] {} {} {}: now {}", call.obj_id, call.event, call.trigger, role.status);
        Ok(Response::empty())
    }

    fn update_appchain_admins(&self, stub: &dyn Stub, chain_id: &str, addrs: &[String]) -> ContractResult<()> {
        let roles = ResourceStore::<Role>::new(stub);
        let key = admins_key(chain_id);

        for old in index::members(stub, &key)? {
            if !addrs.contains(&old) {
                if let Some(mut role) = roles.get(&old)? {
                    role.status = GovernanceStatus::Forbidden;
                    roles.save(&role)?;
                    post_audit(stub, LogEventType::AuditRole, &role, vec![chain_id.to_string()], vec![])?;
                }
                index::remove(stub, &key, &old)?;
                stub.delete(&occupied_key(&old));
            }
        }

        for addr in addrs {
            check_address(addr)?;
            let role = Role {
                id: addr.clone(),
                typ: RoleType::AppchainAdmin,
                weight: 0,
                node_account: String::new(),
                appchain_id: chain_id.to_string(),
                status: GovernanceStatus::Available,
            };
            roles.save(&role)?;
            index::insert(stub, &key, addr)?;
            stub.set(&occupied_key(addr), RoleType::AppchainAdmin.as_str().as_bytes().to_vec());
            post_audit(stub, LogEventType::AuditRole, &role, vec![chain_id.to_string()], vec![])?;
        }
        info!("[{COMPONENT}] appchain {chain_id} now has {} admins", addrs.len());
        Ok(())
    }
}

fn check_address(addr: &str) -> ContractResult<()> {
    if Address::is_well_formed(addr) {
        Ok(())
    } else {
        Err(ContractError::invalid(format!("illegal account address {addr}")))
    }
}

fn is_occupied(stub: &dyn Stub, roles: &ResourceStore<'_, Role>, addr: &str) -> ContractResult<bool> {
    if stub.has(&occupied_key(addr)) {
        return Ok(true);
    }
    Ok(roles
        .get(addr)?
        .is_some_and(|r| !matches!(r.status, GovernanceStatus::Unavailable | GovernanceStatus::Forbidden)))
}

fn related_nodes(role: &Role) -> Vec<String> {
    if role.node_account.is_empty() {
        Vec::new()
    } else {
        vec![role.node_account.clone()]
    }
}

impl Contract for RoleManager {
    fn name(&self) -> &'static str {
        COMPONENT
    }

    fn dispatch(&self, stub: &dyn Stub, method: &str, args: &Args) -> Result<Response, VmError> {
        let op = Op::decode(method, args)?;
        Ok(respond(COMPONENT, method, self.run(stub, op)))
    }
}
