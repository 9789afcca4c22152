//! Validation rules bound to appchains.

use crate::governance::machine::{EventRule, StateMachine, Target, Via};
use crate::governance::status::{EventType, GovernanceStatus};
use crate::governance::store::Governable;
use serde::{Deserialize, Serialize};
use GovernanceStatus::*;

/// A validation rule deployed for an appchain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Rule contract address.
    pub address: String,
    /// Owning appchain.
    pub chain_id: String,
    /// Where the rule source can be fetched.
    pub url: String,
    /// True for the rule currently validating the chain's proofs.
    pub master: bool,
    /// Lifecycle status.
    pub status: GovernanceStatus,
    /// Registration timestamp.
    pub create_time: i64,
}

impl Rule {
    /// Id of the rule `address` of `chain_id`.
    #[must_use]
    pub fn id_of(chain_id: &str, address: &str) -> String {
        format!("{chain_id}:{address}")
    }

    /// Prefix of every rule key of `chain_id`.
    #[must_use]
    pub fn chain_prefix(chain_id: &str) -> String {
        format!("{}{chain_id}:", <Self as Governable>::PREFIX)
    }

    /// True for the bound master rule.
    #[must_use]
    pub fn is_available_master(&self) -> bool {
        self.master && self.status == Available
    }
}

impl Governable for Rule {
    const KIND: &'static str = "rule";
    const PREFIX: &'static str = "rule-";

    fn governance_id(&self) -> String {
        Self::id_of(&self.chain_id, &self.address)
    }

    fn status(&self) -> GovernanceStatus {
        self.status
    }

    fn set_status(&mut self, status: GovernanceStatus) {
        self.status = status;
    }

    fn machine(&self) -> &'static StateMachine {
        &RULE_MACHINE
    }
}

static RULE_RULES: &[EventRule] = &[
    EventRule {
        event: EventType::Register,
        from: &[Unavailable],
        via: Via::Direct(Target::Fixed(Bindable)),
    },
    EventRule {
        event: EventType::Bind,
        from: &[Bindable],
        via: Via::Vote {
            pending: Binding,
            approve: Target::Fixed(Available),
            reject: Target::Last,
        },
    },
    EventRule {
        event: EventType::Unbind,
        from: &[Available],
        via: Via::Vote {
            pending: Unbinding,
            approve: Target::Fixed(Bindable),
            reject: Target::Last,
        },
    },
    EventRule {
        event: EventType::Logout,
        from: &[Bindable],
        via: Via::Direct(Target::Fixed(Forbidden)),
    },
    EventRule {
        event: EventType::Clear,
        from: &[Bindable, Binding, Available, Unbinding],
        via: Via::Direct(Target::Fixed(Forbidden)),
    },
];

/// Rule transition table.
pub static RULE_MACHINE: StateMachine = StateMachine {
    kind: "rule",
    rules: RULE_RULES,
};
