//! # Node Manager
//!
//! Validating nodes join and leave through proposals. Non-validating nodes
//! register directly and are bound to an audit admin by the role manager.

use super::{respond, ManageArgs, ManageCall};
use crate::addresses;
use crate::domain::node::{Node, NodeType};
use crate::domain::proposal::ProposalType;
use crate::errors::{ContractError, ContractResult};
use crate::governance::audit::post_audit;
use crate::governance::call::{bool_response, invoke, json_response};
use crate::governance::diff::split_list;
use crate::governance::index;
use crate::governance::permission::{check_permission, only, only_governance, Permission};
use crate::governance::proposals::{governance_ret, submit_proposal, zero_permission, ProposalRequest};
use crate::governance::status::{EventType, GovernanceStatus, ManageTrigger};
use crate::governance::store::{Governable, ResourceStore};
use bolt_vm::domain::args::Args;
use bolt_vm::domain::entities::{EventType as LogEventType, Response};
use bolt_vm::domain::value_objects::{Address, Arg};
use bolt_vm::ports::{Contract, Stub};
use bolt_vm::VmError;
use tracing::info;

const COMPONENT: &str = "node-mgr";

fn pid_key(pid: &str) -> String {
    format!("vp-pid-{pid}")
}

fn vp_id_key(vp_id: u64) -> String {
    format!("vp-id-{vp_id}")
}

fn name_key(name: &str) -> String {
    format!("nvp-name-{name}")
}

#[derive(Debug)]
enum Op {
    RegisterNode {
        account: String,
        typ: String,
        pid: String,
        vp_id: u64,
        name: String,
        permits: String,
        reason: String,
    },
    LogoutNode { account: String, reason: String },
    UpdateNode { account: String, name: String, permits: String },
    BindNode { account: String, audit_admin: String },
    ManageBindNode { account: String, result: String },
    UnbindNode { account: String },
    Manage(ManageArgs),
    GetNode { account: String },
    GetAllNodes,
    IsAvailable { account: String },
}

impl Op {
    fn decode(method: &str, args: &Args) -> Result<Self, VmError> {
        let n = |expected| args.expect_len(method, expected);
        let op = match method {
            "RegisterNode" => {
                n(7)?;
                Self::RegisterNode {
                    account: args.string(0)?,
                    typ: args.string(1)?,
                    pid: args.string(2)?,
                    vp_id: args.u64(3)?,
                    name: args.string(4)?,
                    permits: args.string(5)?,
                    reason: args.string(6)?,
                }
            }
            "LogoutNode" => {
                n(2)?;
                Self::LogoutNode {
                    account: args.string(0)?,
                    reason: args.string(1)?,
                }
            }
            "UpdateNode" => {
                n(3)?;
                Self::UpdateNode {
                    account: args.string(0)?,
                    name: args.string(1)?,
                    permits: args.string(2)?,
                }
            }
            "BindNode" => {
                n(2)?;
                Self::BindNode {
                    account: args.string(0)?,
                    audit_admin: args.string(1)?,
                }
            }
            "ManageBindNode" => {
                n(2)?;
                Self::ManageBindNode {
                    account: args.string(0)?,
                    result: args.string(1)?,
                }
            }
            "UnbindNode" => {
                n(1)?;
                Self::UnbindNode { account: args.string(0)? }
            }
            "Manage" => Self::Manage(ManageArgs::decode(method, args)?),
            "GetNode" => {
                n(1)?;
                Self::GetNode { account: args.string(0)? }
            }
            "GetAllNodes" => {
                n(0)?;
                Self::GetAllNodes
            }
            "IsAvailable" => {
                n(1)?;
                Self::IsAvailable { account: args.string(0)? }
            }
            other => return Err(VmError::MethodNotFound(other.to_string())),
        };
        Ok(op)
    }
}

/// Node manager contract.
#[derive(Debug, Default)]
pub struct NodeManager;

impl NodeManager {
    /// Create the contract.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn run(&self, stub: &dyn Stub, op: Op) -> ContractResult<Response> {
        let nodes = ResourceStore::<Node>::new(stub);
        match op {
            Op::RegisterNode {
                account,
                typ,
                pid,
                vp_id,
                name,
                permits,
                reason,
            } => {
                check_permission(stub, &[Permission::Admin], stub.current_caller())?;
                let node = Node {
                    account,
                    typ: typ.parse()?,
                    pid,
                    vp_id,
                    name,
                    permissions: split_list(&permits).into_iter().collect(),
                    audit_admin_addr: String::new(),
                    status: GovernanceStatus::Unavailable,
                };
                self.register_node(stub, node, &reason)
            }
            Op::LogoutNode { account, reason } => {
                check_permission(stub, &[Permission::Admin], stub.current_caller())?;
                let node = nodes
                    .governance_pre(&account, EventType::Logout)?
                    .ok_or_else(|| ContractError::not_found(format!("the node {account} does not exist")))?;
                let proposal_id = submit_proposal(
                    stub,
                    &ProposalRequest {
                        event: EventType::Logout,
                        typ: ProposalType::NodeMgr,
                        obj_id: &account,
                        last_status: Some(node.status),
                        reason: &reason,
                        extra: Vec::new(),
                    },
                )?;
                let node = nodes.change_status(&account, EventType::Logout, Some(node.status))?;
                post_audit(stub, LogEventType::AuditNode, &node, vec![], vec![account.clone()])?;
                zero_permission(stub, &proposal_id)?;
                governance_ret(proposal_id, Vec::new())
            }
            Op::UpdateNode { account, name, permits } => {
                check_permission(stub, &[Permission::Admin], stub.current_caller())?;
                let mut node = nodes.load(&account)?;
                if node.typ != NodeType::NvpNode {
                    return Err(ContractError::invalid(format!("the node {account} is not a nvpNode")));
                }
                if node.status == GovernanceStatus::Forbidden {
                    return Err(ContractError::invalid(format!("the node {account} is logged out")));
                }
                if name.is_empty() {
                    return Err(ContractError::invalid("node name is empty"));
                }
                if name != node.name {
                    index::reserve(stub, &name_key(&name), &name, &account)?;
                    index::release(stub, &name_key(&node.name), &account);
                    node.name = name;
                }
                node.permissions = split_list(&permits).into_iter().collect();
                nodes.save(&node)?;
                post_audit(stub, LogEventType::AuditNode, &node, vec![], vec![account])?;
                Ok(Response::empty())
            }
            Op::BindNode { account, audit_admin } => {
                only(stub, addresses::ROLE_MANAGER)?;
                nodes.governance_pre(&account, EventType::Bind)?;
                let mut node = nodes.change_status(&account, EventType::Bind, Some(GovernanceStatus::Bindable))?;
                node.audit_admin_addr = audit_admin;
                nodes.save(&node)?;
                post_audit(stub, LogEventType::AuditNode, &node, vec![], vec![account])?;
                Ok(Response::empty())
            }
            Op::ManageBindNode { account, result } => {
                only(stub, addresses::ROLE_MANAGER)?;
                let trigger: ManageTrigger = result.parse()?;
                let mut node = nodes.settle(&account, trigger, Some(GovernanceStatus::Bindable))?;
                if !trigger.is_approved() {
                    node.audit_admin_addr.clear();
                    nodes.save(&node)?;
                }
                post_audit(stub, LogEventType::AuditNode, &node, vec![], vec![account])?;
                Ok(Response::empty())
            }
            Op::UnbindNode { account } => {
                only(stub, addresses::ROLE_MANAGER)?;
                let mut node = nodes.load(&account)?;
                if node.machine().can_fire(EventType::Unbind, node.status) {
                    node = nodes.change_status(&account, EventType::Unbind, None)?;
                }
                node.audit_admin_addr.clear();
                nodes.save(&node)?;
                post_audit(stub, LogEventType::AuditNode, &node, vec![], vec![account])?;
                Ok(Response::empty())
            }
            Op::Manage(args) => {
                only_governance(stub)?;
                self.manage(stub, &args.parse()?)
            }
            Op::GetNode { account } => json_response(&nodes.load(&account)?),
            Op::GetAllNodes => json_response(&nodes.all()?),
            Op::IsAvailable { account } => {
                Ok(bool_response(nodes.get(&account)?.is_some_and(|n| n.is_available())))
            }
        }
    }

    fn register_node(&self, stub: &dyn Stub, node: Node, reason: &str) -> ContractResult<Response> {
        let nodes = ResourceStore::<Node>::new(stub);
        let account = node.account.clone();
        if !Address::is_well_formed(&account) {
            return Err(ContractError::invalid(format!("illegal node account {account}")));
        }
        nodes.governance_pre(&account, EventType::Register)?;

        match node.typ {
            NodeType::VpNode => {
                if node.pid.is_empty() {
                    return Err(ContractError::invalid("vp node pid is empty"));
                }
                index::reserve(stub, &pid_key(&node.pid), &node.pid, &account)?;
                index::reserve(stub, &vp_id_key(node.vp_id), &node.vp_id.to_string(), &account)?;
            }
            NodeType::NvpNode => {
                if node.name.is_empty() {
                    return Err(ContractError::invalid("node name is empty"));
                }
                index::reserve(stub, &name_key(&node.name), &node.name, &account)?;
            }
        }
        nodes.save(&node)?;

        if !node.machine().is_voted(EventType::Register) {
            let node = nodes.change_status(&account, EventType::Register, None)?;
            post_audit(stub, LogEventType::AuditNode, &node, vec![], vec![account.clone()])?;
            info!("[{COMPONENT}] nvp node {account} registered");
            return governance_ret("", account.into_bytes());
        }

        let proposal_id = submit_proposal(
            stub,
            &ProposalRequest {
                event: EventType::Register,
                typ: ProposalType::NodeMgr,
                obj_id: &account,
                last_status: Some(GovernanceStatus::Unavailable),
                reason,
                extra: Vec::new(),
            },
        )?;
        let node = nodes.change_status(&account, EventType::Register, Some(GovernanceStatus::Unavailable))?;
        post_audit(stub, LogEventType::AuditNode, &node, vec![], vec![account.clone()])?;
        zero_permission(stub, &proposal_id)?;
        info!("[{COMPONENT}] vp node {account}: proposal {proposal_id}");
        governance_ret(proposal_id, account.into_bytes())
    }

    fn manage(&self, stub: &dyn Stub, call: &ManageCall) -> ContractResult<Response> {
        let nodes = ResourceStore::<Node>::new(stub);
        let node = nodes.settle(&call.obj_id, call.trigger, call.last)?;

        match (call.event, call.approved()) {
            (EventType::Register, false) => release_indices(stub, &node),
            (EventType::Logout, true) => {
                release_indices(stub, &node);
                if !node.audit_admin_addr.is_empty() {
                    invoke(
                        stub,
                        addresses::ROLE_MANAGER,
                        "PauseAuditAdmin",
                        vec![Arg::string(&node.audit_admin_addr)],
                    )?;
                }
            }
            _ => {}
        }

        post_audit(stub, LogEventType::AuditNode, &node, vec![], vec![node.account.clone()])?;
        info!("[{COMPONENT}] {} {} {}: now {}", call.obj_id, call.event, call.trigger, node.status);
        Ok(Response::empty())
    }
}

fn release_indices(stub: &dyn Stub, node: &Node) {
    index::release(stub, &pid_key(&node.pid), &node.account);
    index::release(stub, &vp_id_key(node.vp_id), &node.account);
    index::release(stub, &name_key(&node.name), &node.account);
}

impl Contract for NodeManager {
    fn name(&self) -> &'static str {
        COMPONENT
    }

    fn dispatch(&self, stub: &dyn Stub, method: &str, args: &Args) -> Result<Response, VmError> {
        let op = Op::decode(method, args)?;
        Ok(respond(COMPONENT, method, self.run(stub, op)))
    }
}
