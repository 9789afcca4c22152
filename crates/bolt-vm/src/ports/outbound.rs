//! # Outbound Ports (Driven Ports)
//!
//! Interfaces the execution engine consumes but does not implement.
//!
//! | Port | Owner | Purpose |
//! |------|-------|---------|
//! | `LedgerState` | Ledger | Per-contract key-value state and the event log |
//! | `ValidationEngine` | Rule engine | Proof verification for IBTP messages |

use crate::domain::entities::Event;
use crate::domain::value_objects::Address;
use crate::errors::ValidationError;

// =============================================================================
// LEDGER STATE
// =============================================================================

/// Ledger state access, scoped by contract address.
///
/// Writes are visible immediately to every later read of the same
/// transaction. Rolling back a failed transaction is the host's concern.
pub trait LedgerState: Send + Sync {
    /// Read a value. Absent and deleted keys both return `None`.
    fn get_state(&self, address: &Address, key: &[u8]) -> Option<Vec<u8>>;

    /// Replace a value.
    fn set_state(&self, address: &Address, key: &[u8], value: Vec<u8>);

    /// Merge a value into the existing one (append-only indices).
    fn add_state(&self, address: &Address, key: &[u8], value: Vec<u8>);

    /// Delete a value. Equivalent to setting it empty.
    fn delete_state(&self, address: &Address, key: &[u8]) {
        self.set_state(address, key, Vec::new());
    }

    /// All values whose key starts with `prefix`, in key order.
    fn query_by_prefix(&self, address: &Address, prefix: &[u8]) -> Vec<Vec<u8>>;

    /// Append an event to the transaction log.
    fn add_event(&self, event: Event);
}

// =============================================================================
// VALIDATION ENGINE
// =============================================================================

/// External rule validation engine.
pub trait ValidationEngine: Send + Sync {
    /// Verify `proof` for `payload` sent by `from` under the rule deployed at
    /// `rule_address`.
    fn validate(
        &self,
        rule_address: &str,
        from: &str,
        proof: &[u8],
        payload: &[u8],
        validators: &str,
    ) -> Result<bool, ValidationError>;
}
