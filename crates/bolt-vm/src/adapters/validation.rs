//! # Static Validation Engine
//!
//! A [`ValidationEngine`] with a fixed verdict, plus an optional list of
//! rule addresses that are treated as unavailable.

use crate::errors::ValidationError;
use crate::ports::outbound::ValidationEngine;
use std::collections::HashSet;

/// Validation engine returning the same verdict for every proof.
#[derive(Clone, Debug)]
pub struct StaticValidationEngine {
    verdict: bool,
    unavailable: HashSet<String>,
}

impl StaticValidationEngine {
    /// Accept every proof.
    #[must_use]
    pub fn accept_all() -> Self {
        Self {
            verdict: true,
            unavailable: HashSet::new(),
        }
    }

    /// Reject every proof.
    #[must_use]
    pub fn reject_all() -> Self {
        Self {
            verdict: false,
            unavailable: HashSet::new(),
        }
    }

    /// Mark a rule address as not executable.
    #[must_use]
    pub fn with_unavailable(mut self, rule_address: impl Into<String>) -> Self {
        self.unavailable.insert(rule_address.into());
        self
    }
}

impl Default for StaticValidationEngine {
    fn default() -> Self {
        Self::accept_all()
    }
}

impl ValidationEngine for StaticValidationEngine {
    fn validate(
        &self,
        rule_address: &str,
        from: &str,
        proof: &[u8],
        _payload: &[u8],
        _validators: &str,
    ) -> Result<bool, ValidationError> {
        if self.unavailable.contains(rule_address) {
            return Err(ValidationError::RuleUnavailable(rule_address.to_string()));
        }
        tracing::trace!(
            "[validation] rule={} from={} proof_len={} verdict={}",
            rule_address,
            from,
            proof.len(),
            self.verdict
        );
        Ok(self.verdict)
    }
}
