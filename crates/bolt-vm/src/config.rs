//! Execution engine configuration.

use std::env;

/// Default maximum nesting depth of cross invocations.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 64;

/// Configuration of a [`crate::BoltVm`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VmConfig {
    /// Maximum depth of nested cross invocations. Deeper calls fail with
    /// [`crate::VmError::CallDepthExceeded`].
    pub max_call_depth: usize,

    /// Convert contract panics into [`crate::VmError::Panic`] instead of
    /// unwinding into the host.
    pub recover_panics: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            recover_panics: true,
        }
    }
}

impl VmConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BOLT_MAX_CALL_DEPTH`: Maximum cross invocation depth (default: 64)
    /// - `BOLT_RECOVER_PANICS`: Contain contract panics (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_call_depth: env::var("BOLT_MAX_CALL_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_call_depth),

            recover_panics: env::var("BOLT_RECOVER_PANICS")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.recover_panics),
        }
    }

    /// Builder-style override of the depth limit.
    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }
}
