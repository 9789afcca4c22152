//! # Services
//!
//! A service is a callable endpoint of an appchain. Its `permission` set is
//! a blocklist of full service ids refused access.

use crate::errors::ContractError;
use crate::governance::diff::Edit;
use crate::governance::machine::{EventRule, StateMachine, Target, Via};
use crate::governance::scoring::{EvaluationRecord, InvokeRecord};
use crate::governance::status::{EventType, GovernanceStatus};
use crate::governance::store::Governable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use GovernanceStatus::*;

// =============================================================================
// SERVICE TYPE
// =============================================================================

/// Kind of a service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    /// Contract call.
    CallContract,
    /// Certificate deposit.
    DepositCertificate,
    /// Data migration.
    DataMigration,
}

impl ServiceType {
    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CallContract => "CallContract",
            Self::DepositCertificate => "DepositCertificate",
            Self::DataMigration => "DataMigration",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CallContract" => Ok(Self::CallContract),
            "DepositCertificate" => Ok(Self::DepositCertificate),
            "DataMigration" => Ok(Self::DataMigration),
            _ => Err(ContractError::invalid(format!("illegal service type {s}"))),
        }
    }
}

// =============================================================================
// SERVICE
// =============================================================================

/// A registered service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Owning appchain.
    pub chain_id: String,
    /// Id within the appchain.
    pub service_id: String,
    /// Unique human name.
    pub name: String,
    /// Service kind.
    pub typ: ServiceType,
    /// Free-text introduction.
    pub intro: String,
    /// Whether calls must be delivered in order.
    pub ordered: bool,
    /// Full service ids refused access.
    pub permission: BTreeSet<String>,
    /// Free-text details.
    pub details: String,
    /// Mean evaluation score.
    pub score: f64,
    /// Lifecycle status.
    pub status: GovernanceStatus,
    /// Number of received invocations.
    pub invoke_count: u64,
    /// Share of successful invocations.
    pub invoke_success_rate: f64,
    /// Invocation statistics per calling service.
    pub invoke_records: BTreeMap<String, InvokeRecord>,
    /// Evaluations by account.
    pub evaluation_records: BTreeMap<String, EvaluationRecord>,
    /// Registration timestamp.
    pub create_time: i64,
}

impl Service {
    /// `chainID:serviceID`.
    #[must_use]
    pub fn chain_service_id(&self) -> String {
        format!("{}:{}", self.chain_id, self.service_id)
    }

    /// True in a status that still serves calls.
    #[must_use]
    pub fn is_available(&self) -> bool {
        SERVICE_AVAILABLE.contains(&self.status)
    }

    /// True unless `full_service_id` is blocklisted.
    #[must_use]
    pub fn admits(&self, full_service_id: &str) -> bool {
        !self.permission.contains(full_service_id)
    }
}

impl Governable for Service {
    const KIND: &'static str = "service";
    const PREFIX: &'static str = "service-";

    fn governance_id(&self) -> String {
        self.chain_service_id()
    }

    fn status(&self) -> GovernanceStatus {
        self.status
    }

    fn set_status(&mut self, status: GovernanceStatus) {
        self.status = status;
    }

    fn machine(&self) -> &'static StateMachine {
        &SERVICE_MACHINE
    }
}

/// Governed fields changed by an update proposal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceUpdate {
    /// Name change.
    pub name: Option<Edit<String>>,
    /// Introduction change.
    pub intro: Option<Edit<String>>,
    /// Blocklist change.
    pub permission: Option<Edit<BTreeSet<String>>>,
    /// Details change.
    pub details: Option<Edit<String>>,
}

impl ServiceUpdate {
    /// True when a change needs a vote.
    #[must_use]
    pub fn needs_vote(&self) -> bool {
        self.name.is_some() || self.permission.is_some()
    }

    /// True when nothing changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.intro.is_none() && self.permission.is_none() && self.details.is_none()
    }

    /// Apply every change to `service`.
    pub fn apply(&self, service: &mut Service) {
        use crate::governance::diff::apply;
        apply(&mut service.name, self.name.as_ref());
        apply(&mut service.intro, self.intro.as_ref());
        apply(&mut service.permission, self.permission.as_ref());
        apply(&mut service.details, self.details.as_ref());
    }
}

// =============================================================================
// TRANSITIONS
// =============================================================================

/// Statuses in which a service still serves calls.
pub const SERVICE_AVAILABLE: &[GovernanceStatus] = &[Available, Updating, Freezing, LoggingOut];

/// Statuses a chain pause suspends.
pub const SERVICE_PAUSABLE: &[GovernanceStatus] = &[Available, Updating, Activating];

static SERVICE_RULES: &[EventRule] = &[
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
        from: &[Available, Frozen],
        via: Via::Vote {
            pending: Updating,
            approve: Target::Last,
            reject: Target::Last,
        },
    },
    EventRule {
        event: EventType::Freeze,
        from: &[Available, Updating, Activating],
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
        event: EventType::Logout,
        from: &[Available, Updating, Freezing, Frozen, Activating, Paused],
        via: Via::Vote {
            pending: LoggingOut,
            approve: Target::Fixed(Forbidden),
            reject: Target::Last,
        },
    },
    EventRule {
        event: EventType::Pause,
        from: SERVICE_PAUSABLE,
        via: Via::Direct(Target::Fixed(Paused)),
    },
    EventRule {
        event: EventType::Unpause,
        from: &[Paused],
        via: Via::Direct(Target::Fixed(Available)),
    },
    EventRule {
        event: EventType::Clear,
        from: &[
            Unavailable,
            Registering,
            Available,
            Updating,
            Freezing,
            Frozen,
            Activating,
            LoggingOut,
            Paused,
        ],
        via: Via::Direct(Target::Fixed(Forbidden)),
    },
];

/// Service transition table.
pub static SERVICE_MACHINE: StateMachine = StateMachine {
    kind: "service",
    rules: SERVICE_RULES,
};
