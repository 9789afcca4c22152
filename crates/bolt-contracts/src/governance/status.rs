//! # Governance Vocabulary
//!
//! Statuses, lifecycle events and proposal outcomes shared by every
//! governable resource.

use crate::errors::ContractError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// STATUS
// =============================================================================

/// Lifecycle status of a governable resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceStatus {
    /// Never registered, or registration rejected.
    #[default]
    Unavailable,
    /// Registration proposal pending.
    Registering,
    /// Usable.
    Available,
    /// Update proposal pending.
    Updating,
    /// Freeze proposal pending.
    Freezing,
    /// Frozen by governance.
    Frozen,
    /// Activate proposal pending.
    Activating,
    /// Logout proposal pending.
    LoggingOut,
    /// Terminal.
    Forbidden,
    /// Suspended together with its appchain.
    Paused,
    /// Registered and waiting to be bound.
    Bindable,
    /// Bind proposal pending.
    Binding,
    /// Unbind proposal pending.
    Unbinding,
    /// Ownership transfer proposal pending.
    Transferring,
}

impl GovernanceStatus {
    /// Every status.
    pub const ALL: [Self; 14] = [
        Self::Unavailable,
        Self::Registering,
        Self::Available,
        Self::Updating,
        Self::Freezing,
        Self::Frozen,
        Self::Activating,
        Self::LoggingOut,
        Self::Forbidden,
        Self::Paused,
        Self::Bindable,
        Self::Binding,
        Self::Unbinding,
        Self::Transferring,
    ];

    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::Registering => "registering",
            Self::Available => "available",
            Self::Updating => "updating",
            Self::Freezing => "freezing",
            Self::Frozen => "frozen",
            Self::Activating => "activating",
            Self::LoggingOut => "logging_out",
            Self::Forbidden => "forbidden",
            Self::Paused => "paused",
            Self::Bindable => "bindable",
            Self::Binding => "binding",
            Self::Unbinding => "unbinding",
            Self::Transferring => "transferring",
        }
    }
}

impl fmt::Display for GovernanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GovernanceStatus {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == wanted || status.as_str().replace('_', "") == wanted)
            .ok_or_else(|| ContractError::invalid(format!("illegal governance status {s}")))
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// Lifecycle event requested on a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Create the resource.
    Register,
    /// Change governed fields.
    Update,
    /// Suspend by governance.
    Freeze,
    /// Lift a freeze.
    Activate,
    /// Retire permanently.
    Logout,
    /// Attach (rule to chain, node to audit admin).
    Bind,
    /// Detach.
    Unbind,
    /// Suspend with the owning appchain.
    Pause,
    /// Resume with the owning appchain.
    Unpause,
    /// Hand ownership to another account.
    Transfer,
    /// Retire with the owning appchain.
    Clear,
}

impl EventType {
    /// Every event.
    pub const ALL: [Self; 11] = [
        Self::Register,
        Self::Update,
        Self::Freeze,
        Self::Activate,
        Self::Logout,
        Self::Bind,
        Self::Unbind,
        Self::Pause,
        Self::Unpause,
        Self::Transfer,
        Self::Clear,
    ];

    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Update => "update",
            Self::Freeze => "freeze",
            Self::Activate => "activate",
            Self::Logout => "logout",
            Self::Bind => "bind",
            Self::Unbind => "unbind",
            Self::Pause => "pause",
            Self::Unpause => "unpause",
            Self::Transfer => "transfer",
            Self::Clear => "clear",
        }
    }

    /// Proposal priority. A pending proposal of lower priority is paused
    /// by a new submission on the same object.
    #[must_use]
    pub fn priority(&self) -> u8 {
        match self {
            Self::Register | Self::Logout => 3,
            Self::Freeze | Self::Pause => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|event| event.as_str() == wanted)
            .ok_or_else(|| ContractError::invalid(format!("illegal event type {s}")))
    }
}

// =============================================================================
// PROPOSAL OUTCOME
// =============================================================================

/// How a closed (or resumed) proposal drives its resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManageTrigger {
    /// The proposal passed.
    Approved,
    /// The proposal failed or was withdrawn.
    Rejected,
    /// A paused proposal resumed; its event is fired again.
    Restore(EventType),
    /// A paused proposal was dropped because the proposal that paused it
    /// passed. The resource status belongs to the newer proposal and is left
    /// alone; only the reservations of the dropped one are released.
    Discarded,
}

impl ManageTrigger {
    /// Side effects of a restore are the rejection side effects of the
    /// proposal that is ending.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Restore(event) => event.as_str(),
            Self::Discarded => "discarded",
        }
    }
}

impl fmt::Display for ManageTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ManageTrigger {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approved" | "approve" => Ok(Self::Approved),
            "rejected" | "reject" => Ok(Self::Rejected),
            "discarded" | "discard" => Ok(Self::Discarded),
            other => other.parse().map(Self::Restore),
        }
    }
}

/// Parse an optional status argument; the empty string means "none".
pub fn parse_last_status(s: &str) -> Result<Option<GovernanceStatus>, ContractError> {
    if s.trim().is_empty() {
        Ok(None)
    } else {
        s.parse().map(Some)
    }
}
