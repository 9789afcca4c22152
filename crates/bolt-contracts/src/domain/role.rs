//! Roles: governance admins, audit admins and appchain admins.

use crate::errors::ContractError;
use crate::governance::machine::{EventRule, StateMachine, Target, Via};
use crate::governance::status::{EventType, GovernanceStatus};
use crate::governance::store::Governable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use GovernanceStatus::*;

/// Kind of a role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoleType {
    /// Votes on proposals.
    GovernanceAdmin,
    /// Query alias for governance admins carrying the genesis weight.
    SuperGovernanceAdmin,
    /// Audits the traffic of one non-validating node.
    AuditAdmin,
    /// Administers one appchain.
    AppchainAdmin,
}

impl RoleType {
    /// Every type.
    pub const ALL: [Self; 4] = [
        Self::GovernanceAdmin,
        Self::SuperGovernanceAdmin,
        Self::AuditAdmin,
        Self::AppchainAdmin,
    ];

    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GovernanceAdmin => "governanceAdmin",
            Self::SuperGovernanceAdmin => "superGovernanceAdmin",
            Self::AuditAdmin => "auditAdmin",
            Self::AppchainAdmin => "appchainAdmin",
        }
    }
}

impl fmt::Display for RoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleType {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ContractError::invalid(format!("illegal role type {s}")))
    }
}

/// A role held by one account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Account address.
    pub id: String,
    /// Role kind.
    pub typ: RoleType,
    /// Vote weight (governance admins).
    pub weight: u64,
    /// Audited node (audit admins).
    #[serde(default)]
    pub node_account: String,
    /// Administered appchain (appchain admins).
    #[serde(default)]
    pub appchain_id: String,
    /// Lifecycle status.
    pub status: GovernanceStatus,
}

impl Role {
    /// True in a status that still grants the role's rights.
    #[must_use]
    pub fn is_available(&self) -> bool {
        ROLE_AVAILABLE.contains(&self.status)
    }

    /// True for a governance admin carrying at least `super_weight`.
    #[must_use]
    pub fn is_super_admin(&self, super_weight: u64) -> bool {
        self.typ == RoleType::GovernanceAdmin && self.weight >= super_weight
    }

    /// True when the role matches a queried type, honouring the
    /// super admin alias.
    #[must_use]
    pub fn matches(&self, typ: RoleType, super_weight: u64) -> bool {
        match typ {
            RoleType::SuperGovernanceAdmin => self.is_super_admin(super_weight),
            other => self.typ == other,
        }
    }
}

impl Governable for Role {
    const KIND: &'static str = "role";
    const PREFIX: &'static str = "role-";

    fn governance_id(&self) -> String {
        self.id.clone()
    }

    fn status(&self) -> GovernanceStatus {
        self.status
    }

    fn set_status(&mut self, status: GovernanceStatus) {
        self.status = status;
    }

    fn machine(&self) -> &'static StateMachine {
        &ROLE_MACHINE
    }
}

/// Statuses in which a role still grants rights.
pub const ROLE_AVAILABLE: &[GovernanceStatus] = &[Available, Freezing];

static ROLE_RULES: &[EventRule] = &[
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
        event: EventType::Freeze,
        from: &[Available],
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
        from: &[Available, Freezing, Frozen, Activating],
        via: Via::Vote {
            pending: LoggingOut,
            approve: Target::Fixed(Forbidden),
            reject: Target::Last,
        },
    },
    EventRule {
        event: EventType::Pause,
        from: &[Available],
        via: Via::Direct(Target::Fixed(Frozen)),
    },
];

/// Role transition table.
pub static ROLE_MACHINE: StateMachine = StateMachine {
    kind: "role",
    rules: ROLE_RULES,
};
