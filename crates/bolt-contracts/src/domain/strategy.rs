//! Decision rules of the proposal types, governed like any other resource.
//!
//! One record per [`ProposalType`], seeded at genesis from the configured
//! defaults. Changing a record goes through an `Update` proposal of type
//! `ProposalStrategyMgr`.

use crate::domain::proposal::{ProposalStrategy, ProposalType};
use crate::errors::{ContractError, ContractResult};
use crate::governance::machine::{EventRule, StateMachine, Target, Via};
use crate::governance::status::{EventType, GovernanceStatus};
use crate::governance::store::Governable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use GovernanceStatus::*;

/// Name of a decision rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    /// Closes by vote once enough of the electorate took part.
    SimpleMajority,
    /// Approved on submission.
    ZeroPermission,
}

impl StrategyKind {
    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SimpleMajority => "SimpleMajority",
            Self::ZeroPermission => "ZeroPermission",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::SimpleMajority, Self::ZeroPermission]
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ContractError::invalid(format!("illegal proposal strategy {s}")))
    }
}

/// The decision rule in force for one proposal type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModuleStrategy {
    /// Proposal type the rule applies to.
    pub module: ProposalType,
    /// Rule name.
    pub typ: StrategyKind,
    /// Share of the electorate that must vote, in `[0, 1]`.
    pub participate_threshold: f64,
    /// Lifecycle status.
    pub status: GovernanceStatus,
}

impl ModuleStrategy {
    /// An available record for `module`.
    #[must_use]
    pub fn new(module: ProposalType, typ: StrategyKind, participate_threshold: f64) -> Self {
        Self {
            module,
            typ,
            participate_threshold,
            status: Available,
        }
    }

    /// Decision rule applied to new proposals.
    #[must_use]
    pub fn strategy(&self) -> ProposalStrategy {
        match self.typ {
            StrategyKind::ZeroPermission => ProposalStrategy::ZeroPermission,
            StrategyKind::SimpleMajority => ProposalStrategy::SimpleMajority {
                participate_threshold: self.participate_threshold,
            },
        }
    }
}

/// Reject a threshold outside `[0, 1]`.
pub fn check_threshold(participate_threshold: f64) -> ContractResult<()> {
    if (0.0..=1.0).contains(&participate_threshold) {
        Ok(())
    } else {
        Err(ContractError::invalid(format!(
            "participate threshold {participate_threshold} is out of [0, 1]"
        )))
    }
}

impl Governable for ModuleStrategy {
    const KIND: &'static str = "proposal strategy";
    const PREFIX: &'static str = "strategy-";

    fn governance_id(&self) -> String {
        self.module.as_str().to_string()
    }

    fn status(&self) -> GovernanceStatus {
        self.status
    }

    fn set_status(&mut self, status: GovernanceStatus) {
        self.status = status;
    }

    fn machine(&self) -> &'static StateMachine {
        &STRATEGY_MACHINE
    }
}

static STRATEGY_RULES: &[EventRule] = &[EventRule {
    event: EventType::Update,
    from: &[Available],
    via: Via::Vote {
        pending: Updating,
        approve: Target::Fixed(Available),
        reject: Target::Fixed(Available),
    },
}];

/// Proposal strategy transition table.
pub static STRATEGY_MACHINE: StateMachine = StateMachine {
    kind: "proposal strategy",
    rules: STRATEGY_RULES,
};
