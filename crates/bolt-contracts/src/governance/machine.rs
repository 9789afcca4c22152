//! # Lifecycle State Machine
//!
//! Each resource kind owns a static table of legal events. An event is
//! either applied directly or opens a proposal: the resource then sits in
//! the event's transient status until the proposal closes, and the outcome
//! is resolved against that transient status.
//!
//! ```text
//! (event, current ∈ from) --Direct--> target
//! (event, current ∈ from) --Vote----> pending --approved--> approve
//!                                             \--rejected--> reject
//! ```

use super::status::{EventType, GovernanceStatus, ManageTrigger};
use crate::errors::{ContractError, ContractResult};

/// Destination of a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// A fixed status.
    Fixed(GovernanceStatus),
    /// The status recorded before the proposal opened.
    Last,
}

/// How an event is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Via {
    /// Applied without a vote.
    Direct(Target),
    /// Applied through a proposal.
    Vote {
        /// Transient status while the proposal is open.
        pending: GovernanceStatus,
        /// Status on approval.
        approve: Target,
        /// Status on rejection.
        reject: Target,
    },
}

/// One row of a transition table.
#[derive(Clone, Copy, Debug)]
pub struct EventRule {
    /// Event name.
    pub event: EventType,
    /// Statuses the event may fire from.
    pub from: &'static [GovernanceStatus],
    /// Application mode.
    pub via: Via,
}

/// Transition table of one resource kind.
#[derive(Debug)]
pub struct StateMachine {
    /// Resource kind, used in error messages.
    pub kind: &'static str,
    /// Legal events.
    pub rules: &'static [EventRule],
}

impl StateMachine {
    /// Rule of `event`, if the kind supports it.
    #[must_use]
    pub fn rule(&self, event: EventType) -> Option<&EventRule> {
        self.rules.iter().find(|r| r.event == event)
    }

    /// True when `event` may fire from `current`.
    #[must_use]
    pub fn can_fire(&self, event: EventType, current: GovernanceStatus) -> bool {
        self.rule(event).is_some_and(|r| r.from.contains(&current))
    }

    /// True when `event` needs a proposal.
    #[must_use]
    pub fn is_voted(&self, event: EventType) -> bool {
        self.rule(event)
            .is_some_and(|r| matches!(r.via, Via::Vote { .. }))
    }

    /// Fails with `IllegalTransition` unless `event` may fire from `current`.
    pub fn check(&self, id: &str, event: EventType, current: GovernanceStatus) -> ContractResult<()> {
        if self.can_fire(event, current) {
            Ok(())
        } else {
            Err(self.illegal(id, current, event.as_str()))
        }
    }

    /// Status after firing `event` from `current`.
    ///
    /// `last` resolves [`Target::Last`] for direct rules.
    pub fn fire(
        &self,
        id: &str,
        event: EventType,
        current: GovernanceStatus,
        last: Option<GovernanceStatus>,
    ) -> ContractResult<GovernanceStatus> {
        self.check(id, event, current)?;
        let rule = self
            .rule(event)
            .ok_or_else(|| self.illegal(id, current, event.as_str()))?;
        match rule.via {
            Via::Direct(target) => self.resolve(id, target, current, last, event.as_str()),
            Via::Vote { pending, .. } => Ok(pending),
        }
    }

    /// Status after a proposal outcome, resolved from the transient status
    /// `current`.
    pub fn settle(
        &self,
        id: &str,
        trigger: ManageTrigger,
        current: GovernanceStatus,
        last: Option<GovernanceStatus>,
    ) -> ContractResult<GovernanceStatus> {
        match trigger {
            ManageTrigger::Approved | ManageTrigger::Rejected => {
                let (approve, reject) = self
                    .pending_rule(current)
                    .ok_or_else(|| self.illegal(id, current, trigger.as_str()))?;
                let target = if trigger.is_approved() { approve } else { reject };
                self.resolve(id, target, current, last, trigger.as_str())
            }
            ManageTrigger::Restore(event) => match self.rule(event).map(|r| r.via) {
                // the resumed proposal was legal when submitted; reopen it
                Some(Via::Vote { pending, .. }) => Ok(pending),
                _ => self.fire(id, event, current, last),
            },
            ManageTrigger::Discarded => Ok(current),
        }
    }

    fn pending_rule(&self, current: GovernanceStatus) -> Option<(Target, Target)> {
        self.rules.iter().find_map(|r| match r.via {
            Via::Vote {
                pending,
                approve,
                reject,
            } if pending == current => Some((approve, reject)),
            _ => None,
        })
    }

    fn resolve(
        &self,
        id: &str,
        target: Target,
        current: GovernanceStatus,
        last: Option<GovernanceStatus>,
        trigger: &str,
    ) -> ContractResult<GovernanceStatus> {
        match target {
            Target::Fixed(status) => Ok(status),
            Target::Last => last.ok_or_else(|| self.illegal(id, current, trigger)),
        }
    }

    fn illegal(&self, id: &str, current: GovernanceStatus, event: &str) -> ContractError {
        ContractError::IllegalTransition {
            kind: self.kind,
            id: id.to_string(),
            status: current.to_string(),
            event: event.to_string(),
        }
    }
}
