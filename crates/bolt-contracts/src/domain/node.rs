//! Nodes of the relay chain.
//!
//! Validating (vp) nodes join and leave by vote. Non-validating (nvp) nodes
//! register directly and become available once an audit admin binds them.

use crate::errors::ContractError;
use crate::governance::machine::{EventRule, StateMachine, Target, Via};
use crate::governance::status::{EventType, GovernanceStatus};
use crate::governance::store::Governable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use GovernanceStatus::*;

/// Kind of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    /// Consensus participant.
    VpNode,
    /// Read-only participant.
    NvpNode,
}

impl NodeType {
    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VpNode => "vpNode",
            Self::NvpNode => "nvpNode",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vpNode" => Ok(Self::VpNode),
            "nvpNode" => Ok(Self::NvpNode),
            _ => Err(ContractError::invalid(format!("illegal node type {s}"))),
        }
    }
}

/// A node account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Node account address.
    pub account: String,
    /// Node kind.
    pub typ: NodeType,
    /// Network peer id (vp nodes).
    #[serde(default)]
    pub pid: String,
    /// Consensus id (vp nodes).
    #[serde(default)]
    pub vp_id: u64,
    /// Human name.
    pub name: String,
    /// Appchains whose traffic the node may read (nvp nodes).
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    /// Bound audit admin (nvp nodes).
    #[serde(default)]
    pub audit_admin_addr: String,
    /// Lifecycle status.
    pub status: GovernanceStatus,
}

impl Node {
    /// True once the node may take part in the network.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == Available
    }
}

impl Governable for Node {
    const KIND: &'static str = "node";
    const PREFIX: &'static str = "node-";

    fn governance_id(&self) -> String {
        self.account.clone()
    }

    fn status(&self) -> GovernanceStatus {
        self.status
    }

    fn set_status(&mut self, status: GovernanceStatus) {
        self.status = status;
    }

    fn machine(&self) -> &'static StateMachine {
        match self.typ {
            NodeType::VpNode => &VP_NODE_MACHINE,
            NodeType::NvpNode => &NVP_NODE_MACHINE,
        }
    }
}

static VP_NODE_RULES: &[EventRule] = &[
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
        event: EventType::Logout,
        from: &[Available],
        via: Via::Vote {
            pending: LoggingOut,
            approve: Target::Fixed(Forbidden),
            reject: Target::Last,
        },
    },
];

static NVP_NODE_RULES: &[EventRule] = &[
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
            reject: Target::Fixed(Bindable),
        },
    },
    EventRule {
        event: EventType::Unbind,
        from: &[Available],
        via: Via::Direct(Target::Fixed(Bindable)),
    },
    EventRule {
        event: EventType::Logout,
        from: &[Available, Bindable, Binding],
        via: Via::Vote {
            pending: LoggingOut,
            approve: Target::Fixed(Forbidden),
            reject: Target::Last,
        },
    },
];

/// Validating node transition table.
pub static VP_NODE_MACHINE: StateMachine = StateMachine {
    kind: "node",
    rules: VP_NODE_RULES,
};

/// Non-validating node transition table.
pub static NVP_NODE_MACHINE: StateMachine = StateMachine {
    kind: "node",
    rules: NVP_NODE_RULES,
};
