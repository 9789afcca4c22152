//! Governance configuration shared by the built-in contracts.

use crate::domain::proposal::ProposalType;
use crate::domain::strategy::{ModuleStrategy, StrategyKind};
use crate::errors::{ContractError, ContractResult};
use bolt_vm::domain::value_objects::Address;
use std::env;

/// Relay chain id used when none is configured.
pub const DEFAULT_BITXHUB_ID: &str = "1356";
/// Share of the electorate that must vote before a proposal closes.
pub const DEFAULT_PARTICIPATE_THRESHOLD: f64 = 0.75;

/// Configuration of the governance layer.
#[derive(Clone, Debug, PartialEq)]
pub struct GovernanceConfig {
    /// Numeric id of this relay chain.
    pub bitxhub_id: String,

    /// Genesis participation threshold of the simple-majority strategy (0..=1).
    pub participate_threshold: f64,

    /// Proposal types seeded at genesis as approved without a vote.
    pub zero_permission_types: Vec<ProposalType>,

    /// Genesis governance admins.
    pub super_admins: Vec<String>,

    /// Vote weight of an ordinary governance admin.
    pub admin_weight: u64,

    /// Vote weight of a genesis governance admin.
    pub super_admin_weight: u64,

    /// Upper bound of an evaluation score.
    pub max_score: f64,

    /// Number of recent interchain records kept per service and direction.
    pub interchain_meta_window: usize,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            bitxhub_id: DEFAULT_BITXHUB_ID.to_string(),
            participate_threshold: DEFAULT_PARTICIPATE_THRESHOLD,
            zero_permission_types: Vec::new(),
            super_admins: Vec::new(),
            admin_weight: 1,
            super_admin_weight: 2,
            max_score: 5.0,
            interchain_meta_window: 5,
        }
    }
}

impl GovernanceConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BOLT_BITXHUB_ID`: Relay chain id (default: 1356)
    /// - `BOLT_PARTICIPATE_THRESHOLD`: Voting participation threshold (default: 0.75)
    /// - `BOLT_SUPER_ADMINS`: Comma separated genesis admin addresses
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bitxhub_id: env::var("BOLT_BITXHUB_ID").unwrap_or(defaults.bitxhub_id),

            participate_threshold: env::var("BOLT_PARTICIPATE_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.participate_threshold),

            super_admins: env::var("BOLT_SUPER_ADMINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),

            ..defaults
        }
    }

    /// Builder-style override of the genesis admins.
    #[must_use]
    pub fn with_super_admins<I, S>(mut self, admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.super_admins = admins.into_iter().map(Into::into).collect();
        self
    }

    /// True when proposals of `typ` skip the vote.
    #[must_use]
    pub fn is_zero_permission(&self, typ: ProposalType) -> bool {
        self.zero_permission_types.contains(&typ)
    }

    /// Strategy record of `typ` written at genesis.
    #[must_use]
    pub fn default_strategy(&self, typ: ProposalType) -> ModuleStrategy {
        let kind = if self.is_zero_permission(typ) {
            StrategyKind::ZeroPermission
        } else {
            StrategyKind::SimpleMajority
        };
        ModuleStrategy::new(typ, kind, self.participate_threshold)
    }

    /// Reject impossible values.
    pub fn validate(&self) -> ContractResult<()> {
        if self.bitxhub_id.is_empty() || !self.bitxhub_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ContractError::invalid(format!(
                "bitxhub id {:?} is not numeric",
                self.bitxhub_id
            )));
        }
        if !(0.0..=1.0).contains(&self.participate_threshold) {
            return Err(ContractError::invalid(format!(
                "participate threshold {} is out of [0, 1]",
                self.participate_threshold
            )));
        }
        if self.admin_weight == 0 || self.super_admin_weight == 0 {
            return Err(ContractError::invalid("admin weights must be positive"));
        }
        if self.max_score <= 0.0 {
            return Err(ContractError::invalid("max score must be positive"));
        }
        if self.interchain_meta_window == 0 {
            return Err(ContractError::invalid("interchain meta window must be positive"));
        }
        if let Some(bad) = self
            .super_admins
            .iter()
            .find(|a| !Address::is_well_formed(a))
        {
            return Err(ContractError::invalid(format!("illegal admin address {bad}")));
        }
        Ok(())
    }
}
