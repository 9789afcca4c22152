//! Appchains: the chains connected to the relay.

use crate::governance::diff::Edit;
use crate::governance::machine::{EventRule, StateMachine, Target, Via};
use crate::governance::status::{EventType, GovernanceStatus};
use crate::governance::store::Governable;
use serde::{Deserialize, Serialize};
use GovernanceStatus::*;

/// A registered appchain. Its admins live in the role manager.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appchain {
    /// Unique id.
    pub id: String,
    /// Unique human name.
    pub chain_name: String,
    /// Chain technology, e.g. `Fabric V1.4.3`.
    pub chain_type: String,
    /// Validator set or root certificate, handed to proof validation.
    pub trust_root: Vec<u8>,
    /// Broker contract address on the appchain.
    pub broker: String,
    /// Free-text description.
    pub desc: String,
    /// Lifecycle status.
    pub status: GovernanceStatus,
    /// Registration timestamp.
    pub create_time: i64,
}

impl Appchain {
    /// True in a status that still relays traffic.
    #[must_use]
    pub fn is_available(&self) -> bool {
        APPCHAIN_AVAILABLE.contains(&self.status)
    }
}

impl Governable for Appchain {
    const KIND: &'static str = "appchain";
    const PREFIX: &'static str = "appchain-";

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
        &APPCHAIN_MACHINE
    }
}

/// Payload of an appchain registration proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppchainRegistration {
    /// Appchain admins.
    pub admins: Vec<String>,
    /// Address of the master validation rule.
    pub master_rule: String,
    /// Url of the master validation rule.
    pub master_rule_url: String,
}

/// Governed fields changed by an update proposal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppchainUpdate {
    /// Name change.
    pub name: Option<Edit<String>>,
    /// Admin set change.
    pub admins: Option<Edit<Vec<String>>>,
    /// Description change.
    pub desc: Option<Edit<String>>,
    /// Trust root change.
    pub trust_root: Option<Edit<Vec<u8>>>,
}

impl AppchainUpdate {
    /// True when a change needs a vote.
    #[must_use]
    pub fn needs_vote(&self) -> bool {
        self.name.is_some() || self.admins.is_some()
    }

    /// Apply the appchain's own fields. Admins are applied by the role manager.
    pub fn apply(&self, chain: &mut Appchain) {
        use crate::governance::diff::apply;
        apply(&mut chain.chain_name, self.name.as_ref());
        apply(&mut chain.desc, self.desc.as_ref());
        apply(&mut chain.trust_root, self.trust_root.as_ref());
    }
}

/// Statuses in which an appchain still relays traffic.
pub const APPCHAIN_AVAILABLE: &[GovernanceStatus] = &[Available, Updating, Freezing, LoggingOut];

static APPCHAIN_RULES: &[EventRule] = &[
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
        from: &[Available, Updating, Freezing, Frozen, Activating],
        via: Via::Vote {
            pending: LoggingOut,
            approve: Target::Fixed(Forbidden),
            reject: Target::Last,
        },
    },
];

/// Appchain transition table.
pub static APPCHAIN_MACHINE: StateMachine = StateMachine {
    kind: "appchain",
    rules: APPCHAIN_RULES,
};
