//! Dapps built on top of the relay.

use crate::errors::ContractError;
use crate::governance::diff::Edit;
use crate::governance::machine::{EventRule, StateMachine, Target, Via};
use crate::governance::scoring::EvaluationRecord;
use crate::governance::status::{EventType, GovernanceStatus};
use crate::governance::store::Governable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use GovernanceStatus::*;

/// Kind of a dapp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DappType {
    /// Tooling.
    Tool,
    /// General application.
    Application,
    /// Game.
    Game,
    /// Anything else.
    Others,
}

impl FromStr for DappType {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tool" => Ok(Self::Tool),
            "application" => Ok(Self::Application),
            "game" => Ok(Self::Game),
            "others" => Ok(Self::Others),
            _ => Err(ContractError::invalid(format!("illegal dapp type {s}"))),
        }
    }
}

/// One ownership transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Previous owner.
    pub from: String,
    /// New owner.
    pub to: String,
    /// Transfer reason.
    pub reason: String,
    /// True once the new owner accepted.
    pub confirm: bool,
    /// Transaction timestamp.
    pub create_time: i64,
}

/// A registered dapp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dapp {
    /// `{owner}-{sequence}`.
    pub dapp_id: String,
    /// Unique human name.
    pub name: String,
    /// Dapp kind.
    pub typ: DappType,
    /// Free-text description.
    pub desc: String,
    /// Home page.
    pub url: String,
    /// Contracts backing the dapp.
    pub contract_addr: BTreeSet<String>,
    /// Accounts refused access.
    pub permission: BTreeSet<String>,
    /// Current owner.
    pub owner_addr: String,
    /// Lifecycle status.
    pub status: GovernanceStatus,
    /// Mean evaluation score.
    pub score: f64,
    /// Ownership transfers, oldest first.
    pub transfer_records: Vec<TransferRecord>,
    /// Evaluations by account.
    pub evaluation_records: BTreeMap<String, EvaluationRecord>,
    /// Registration timestamp.
    pub create_time: i64,
}

impl Dapp {
    /// True in a status that still serves users.
    #[must_use]
    pub fn is_available(&self) -> bool {
        DAPP_AVAILABLE.contains(&self.status)
    }

    /// True unless `account` is blocklisted.
    #[must_use]
    pub fn admits(&self, account: &str) -> bool {
        !self.permission.contains(account)
    }
}

impl Governable for Dapp {
    const KIND: &'static str = "dapp";
    const PREFIX: &'static str = "dapp-";

    fn governance_id(&self) -> String {
        self.dapp_id.clone()
    }

    fn status(&self) -> GovernanceStatus {
        self.status
    }

    fn set_status(&mut self, status: GovernanceStatus) {
        self.status = status;
    }

    fn machine(&self) -> &'static StateMachine {
        &DAPP_MACHINE
    }
}

/// Governed fields changed by an update proposal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DappUpdate {
    /// Name change.
    pub name: Option<Edit<String>>,
    /// Description change.
    pub desc: Option<Edit<String>>,
    /// Url change.
    pub url: Option<Edit<String>>,
    /// Contract set change.
    pub contract_addr: Option<Edit<BTreeSet<String>>>,
    /// Blocklist change.
    pub permission: Option<Edit<BTreeSet<String>>>,
}

impl DappUpdate {
    /// True when a change needs a vote.
    #[must_use]
    pub fn needs_vote(&self) -> bool {
        self.name.is_some() || self.contract_addr.is_some()
    }

    /// Apply every change to `dapp`.
    pub fn apply(&self, dapp: &mut Dapp) {
        use crate::governance::diff::apply;
        apply(&mut dapp.name, self.name.as_ref());
        apply(&mut dapp.desc, self.desc.as_ref());
        apply(&mut dapp.url, self.url.as_ref());
        apply(&mut dapp.contract_addr, self.contract_addr.as_ref());
        apply(&mut dapp.permission, self.permission.as_ref());
    }
}

/// Statuses in which a dapp still serves users.
pub const DAPP_AVAILABLE: &[GovernanceStatus] = &[Available, Freezing, Transferring];

static DAPP_RULES: &[EventRule] = &[
    EventRule {
        event: EventType::Register,
        from: &[Unavailable],
        via: Via::Vote {
            pending: Registering,
            approve: Target::Fixed(Available),
            reject: Target::Last,
        },
    },
    EventRule {
        event: EventType::Update,
        from: &[Available, Frozen, Transferring],
        via: Via::Vote {
            pending: Updating,
            approve: Target::Last,
            reject: Target::Last,
        },
    },
    EventRule {
        event: EventType::Freeze,
        from: &[Available, Transferring],
        via: Via::Vote {
            pending: Freezing,
            approve: Target::Fixed(Frozen),
            reject: Target::Last,
        },
    },
    EventRule {
        event: EventType::Activate,
        from: &[Frozen],
        via: Via::Vote {
            pending: Activating,
            approve: Target::Fixed(Available),
            reject: Target::Last,
        },
    },
    EventRule {
        event: EventType::Transfer,
        from: &[Available],
        via: Via::Vote {
            pending: Transferring,
            approve: Target::Fixed(Available),
            reject: Target::Last,
        },
    },
];

/// Dapp transition table.
pub static DAPP_MACHINE: StateMachine = StateMachine {
    kind: "dapp",
    rules: DAPP_RULES,
};
