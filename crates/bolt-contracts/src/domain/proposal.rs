//! # Proposals
//!
//! A proposal is one vote over one lifecycle event of one resource. It is
//! created by a manager contract, decided by the governance admins and,
//! once closed, drives the manager's `Manage` callback.

use crate::addresses;
use crate::errors::ContractError;
use crate::governance::status::{EventType, GovernanceStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// PROPOSAL TYPE
// =============================================================================

/// Manager domain a proposal belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalType {
    /// Appchain manager.
    AppchainMgr,
    /// Rule manager.
    RuleMgr,
    /// Node manager.
    NodeMgr,
    /// Service manager.
    ServiceMgr,
    /// Role manager.
    RoleMgr,
    /// Dapp manager.
    DappMgr,
    /// Proposal strategy manager.
    ProposalStrategyMgr,
}

impl ProposalType {
    /// Every type.
    pub const ALL: [Self; 7] = [
        Self::AppchainMgr,
        Self::RuleMgr,
        Self::NodeMgr,
        Self::ServiceMgr,
        Self::RoleMgr,
        Self::DappMgr,
        Self::ProposalStrategyMgr,
    ];

    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AppchainMgr => "AppchainMgr",
            Self::RuleMgr => "RuleMgr",
            Self::NodeMgr => "NodeMgr",
            Self::ServiceMgr => "ServiceMgr",
            Self::RoleMgr => "RoleMgr",
            Self::DappMgr => "DappMgr",
            Self::ProposalStrategyMgr => "ProposalStrategyMgr",
        }
    }

    /// Address of the owning manager contract.
    #[must_use]
    pub fn manager(&self) -> &'static str {
        match self {
            Self::AppchainMgr => addresses::APPCHAIN_MANAGER,
            Self::RuleMgr => addresses::RULE_MANAGER,
            Self::NodeMgr => addresses::NODE_MANAGER,
            Self::ServiceMgr => addresses::SERVICE_MANAGER,
            Self::RoleMgr => addresses::ROLE_MANAGER,
            Self::DappMgr => addresses::DAPP_MANAGER,
            Self::ProposalStrategyMgr => addresses::PROPOSAL_STRATEGY_MANAGER,
        }
    }
}

impl fmt::Display for ProposalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalType {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ContractError::invalid(format!("illegal proposal type {s}")))
    }
}

// =============================================================================
// PROPOSAL STATUS
// =============================================================================

/// Lifecycle of a proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    /// Open for votes.
    Proposed,
    /// Closed in favour.
    Approved,
    /// Closed against, withdrawn or ended.
    Rejected,
    /// Locked by a higher priority proposal on the same object.
    Paused,
}

impl ProposalStatus {
    /// Every status.
    pub const ALL: [Self; 4] = [Self::Proposed, Self::Approved, Self::Rejected, Self::Paused];

    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Paused => "paused",
        }
    }

    /// True once the proposal can no longer change.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalStatus {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ContractError::invalid(format!("illegal proposal status {s}")))
    }
}

// =============================================================================
// STRATEGY
// =============================================================================

/// Decision rule of a proposal type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "typ", rename_all = "snake_case")]
pub enum ProposalStrategy {
    /// Approved as soon as it is submitted.
    ZeroPermission,
    /// Closes once `ceil(electorate * participate_threshold)` admins voted.
    SimpleMajority {
        /// Share of the electorate that must vote.
        participate_threshold: f64,
    },
}

// =============================================================================
// PROPOSAL
// =============================================================================

/// One vote cast on a proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    /// True for approve.
    pub approve: bool,
    /// Vote weight of the voter.
    pub weight: u64,
    /// Free-text reason.
    pub reason: String,
    /// Transaction timestamp.
    pub vote_time: i64,
}

/// A governance proposal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// `{from}-{sequence}`.
    pub id: String,
    /// Lifecycle event under vote.
    pub event_type: EventType,
    /// Owning manager domain.
    pub typ: ProposalType,
    /// Current status.
    pub status: ProposalStatus,
    /// Governed object id.
    pub obj_id: String,
    /// Status of the object before the proposal opened.
    pub obj_last_status: Option<GovernanceStatus>,
    /// Submitting account.
    pub from: String,
    /// Decision rule.
    pub strategy: ProposalStrategy,
    /// Accounts allowed to vote, with their weights.
    pub electorate: BTreeMap<String, u64>,
    /// Cast ballots by voter.
    pub ballots: BTreeMap<String, Ballot>,
    /// Number of approving ballots.
    pub approve: u64,
    /// Number of rejecting ballots.
    pub against: u64,
    /// Ballots needed to close.
    pub threshold: u64,
    /// Submission reason.
    pub reason: String,
    /// Why the proposal closed without a vote, if it did.
    pub close_reason: String,
    /// Proposal paused by this one.
    pub lock_proposal_id: String,
    /// True when a genesis admin must vote before the proposal closes.
    pub is_special: bool,
    /// True once a genesis admin voted.
    pub is_super_admin_voted: bool,
    /// Opaque payload for the manager.
    pub extra: Vec<u8>,
    /// Transaction timestamp of the submission.
    pub create_time: i64,
}

impl Proposal {
    /// True while votes are still counted.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == ProposalStatus::Proposed
    }

    /// True once enough ballots arrived to close.
    #[must_use]
    pub fn reached_threshold(&self) -> bool {
        self.approve + self.against >= self.threshold
            && (!self.is_special || self.is_super_admin_voted)
    }

    /// Outcome once closed by vote.
    #[must_use]
    pub fn outcome(&self) -> ProposalStatus {
        if self.approve > self.against {
            ProposalStatus::Approved
        } else {
            ProposalStatus::Rejected
        }
    }
}

/// Ballots needed under a participation threshold.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn threshold(electorate: usize, participate_threshold: f64) -> u64 {
    (electorate as f64 * participate_threshold).ceil() as u64
}

/// True for events that a genesis admin must co-sign.
#[must_use]
pub fn is_special(event: EventType, typ: ProposalType) -> bool {
    matches!(event, EventType::Freeze | EventType::Activate | EventType::Logout)
        || typ == ProposalType::RoleMgr
}
