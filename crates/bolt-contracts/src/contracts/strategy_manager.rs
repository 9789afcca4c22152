//! # Proposal Strategy Manager
//!
//! Holds the decision rule of every proposal type. The governance contract
//! reads the record of a type when it opens a proposal of that type, so a
//! change applies to proposals opened after it was approved.

use super::{respond, ManageArgs, ManageCall};
use crate::domain::proposal::ProposalType;
use crate::domain::strategy::{check_threshold, ModuleStrategy, StrategyKind};
use crate::errors::{ContractError, ContractResult};
use crate::governance::audit::post_audit;
use crate::governance::call::json_response;
use crate::governance::diff::{apply, Edit};
use crate::governance::permission::{check_permission, only_governance, Permission};
use crate::governance::proposals::{governance_ret, submit_proposal, zero_permission, ProposalRequest};
use crate::governance::status::EventType;
use crate::governance::store::ResourceStore;
use bolt_vm::domain::args::Args;
use bolt_vm::domain::entities::{EventType as LogEventType, Response};
use bolt_vm::ports::{Contract, Stub};
use bolt_vm::VmError;
use serde::{Deserialize, Serialize};
use tracing::info;

const COMPONENT: &str = "strategy-mgr";

/// Payload of a strategy update proposal.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyUpdate {
    /// Rule change.
    pub typ: Option<Edit<StrategyKind>>,
    /// Threshold change.
    pub participate_threshold: Option<Edit<f64>>,
}

impl StrategyUpdate {
    fn is_empty(&self) -> bool {
        self.typ.is_none() && self.participate_threshold.is_none()
    }

    fn apply(&self, record: &mut ModuleStrategy) {
        apply(&mut record.typ, self.typ.as_ref());
        apply(&mut record.participate_threshold, self.participate_threshold.as_ref());
    }
}

#[derive(Debug)]
enum Op {
    UpdateProposalStrategy {
        module: String,
        typ: String,
        participate_threshold: f64,
        reason: String,
    },
    Manage(ManageArgs),
    GetProposalStrategy { module: String },
    GetAllProposalStrategy,
}

impl Op {
    fn decode(method: &str, args: &Args) -> Result<Self, VmError> {
        let n = |expected| args.expect_len(method, expected);
        let op = match method {
            "UpdateProposalStrategy" => {
                n(4)?;
                Self::UpdateProposalStrategy {
                    module: args.string(0)?,
                    typ: args.string(1)?,
                    participate_threshold: args.f64(2)?,
                    reason: args.string(3)?,
                }
            }
            "Manage" => Self::Manage(ManageArgs::decode(method, args)?),
            "GetProposalStrategy" => {
                n(1)?;
                Self::GetProposalStrategy { module: args.string(0)? }
            }
            "GetAllProposalStrategy" => {
                n(0)?;
                Self::GetAllProposalStrategy
            }
            other => return Err(VmError::MethodNotFound(other.to_string())),
        };
        Ok(op)
    }
}

/// Proposal strategy manager contract.
#[derive(Debug, Default)]
pub struct ProposalStrategyManager;

impl ProposalStrategyManager {
    /// Create the contract.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn run(&self, stub: &dyn Stub, op: Op) -> ContractResult<Response> {
        let strategies = ResourceStore::<ModuleStrategy>::new(stub);
        match op {
            Op::UpdateProposalStrategy {
                module,
                typ,
                participate_threshold,
                reason,
            } => {
                check_permission(stub, &[Permission::Admin], stub.current_caller())?;
                self.update(stub, module.parse()?, typ.parse()?, participate_threshold, &reason)
            }
            Op::Manage(args) => {
                only_governance(stub)?;
                self.manage(stub, &args.parse()?)
            }
            Op::GetProposalStrategy { module } => {
                let module: ProposalType = module.parse()?;
                json_response(&strategies.load(module.as_str())?)
            }
            Op::GetAllProposalStrategy => json_response(&strategies.all()?),
        }
    }

    fn update(
        &self,
        stub: &dyn Stub,
        module: ProposalType,
        typ: StrategyKind,
        participate_threshold: f64,
        reason: &str,
    ) -> ContractResult<Response> {
        check_threshold(participate_threshold)?;
        let strategies = ResourceStore::<ModuleStrategy>::new(stub);
        let id = module.as_str();
        let record = strategies
            .governance_pre(id, EventType::Update)?
            .ok_or_else(|| ContractError::not_found(format!("the proposal strategy of {id} does not exist")))?;

        let diff = StrategyUpdate {
            typ: Edit::between(&record.typ, &typ),
            participate_threshold: Edit::between(&record.participate_threshold, &participate_threshold),
        };
        if diff.is_empty() {
            return Err(ContractError::invalid(format!("nothing to update for the strategy of {id}")));
        }

        let last = record.status;
        let proposal_id = submit_proposal(
            stub,
            &ProposalRequest {
                event: EventType::Update,
                typ: ProposalType::ProposalStrategyMgr,
                obj_id: id,
                last_status: Some(last),
                reason,
                extra: serde_json::to_vec(&diff)?,
            },
        )?;
        let record = strategies.change_status(id, EventType::Update, Some(last))?;
        post_audit(stub, LogEventType::AuditProposalStrategy, &record, vec![], vec![])?;
        zero_permission(stub, &proposal_id)?;
        info!("[{COMPONENT}] strategy of {id}: proposal {proposal_id}");
        governance_ret(proposal_id, id.as_bytes().to_vec())
    }

    fn manage(&self, stub: &dyn Stub, call: &ManageCall) -> ContractResult<Response> {
        let strategies = ResourceStore::<ModuleStrategy>::new(stub);
        let mut record = strategies.settle(&call.obj_id, call.trigger, call.last)?;

        if call.event == EventType::Update && call.approved() {
            let diff: StrategyUpdate = serde_json::from_slice(&call.extra)?;
            diff.apply(&mut record);
            strategies.save(&record)?;
        }

        post_audit(stub, LogEventType::AuditProposalStrategy, &record, vec![], vec![])?;
        info!(
            "[{COMPONENT}] {} {} {}: {} {}",
            call.obj_id, call.event, call.trigger, record.typ, record.participate_threshold
        );
        Ok(Response::empty())
    }
}

impl Contract for ProposalStrategyManager {
    fn name(&self) -> &'static str {
        COMPONENT
    }

    fn dispatch(&self, stub: &dyn Stub, method: &str, args: &Args) -> Result<Response, VmError> {
        let op = Op::decode(method, args)?;
        Ok(respond(COMPONENT, method, self.run(stub, op)))
    }
}
