//! # In-Memory Ledger
//!
//! [`LedgerState`] backed by an ordered map. Used by tests, the genesis
//! bootstrap and embedding hosts that persist state themselves.
//!
//! ## Semantics
//!
//! - Setting an empty value deletes the key, so `get_state` after a delete
//!   returns `None`.
//! - `add_state` merges JSON values: objects merge key by key (new wins),
//!   arrays concatenate, anything else is replaced.
//! - Every write is recorded in a write log for inspection.

use crate::domain::entities::{Event, EventType};
use crate::domain::value_objects::Address;
use crate::ports::outbound::LedgerState;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;

type StateKey = (Address, Vec<u8>);

/// Kind of a recorded write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOp {
    /// `set_state` with a non-empty value.
    Set,
    /// `add_state`.
    Add,
    /// `set_state` with an empty value, or `delete_state`.
    Delete,
}

/// One entry of the write log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateWrite {
    /// Operation kind.
    pub op: WriteOp,
    /// Contract address scope.
    pub address: Address,
    /// Raw key.
    pub key: Vec<u8>,
}

/// Point-in-time copy of state and events.
#[derive(Clone, Debug, Default)]
pub struct LedgerSnapshot {
    state: BTreeMap<StateKey, Vec<u8>>,
    events: Vec<Event>,
}

/// Thread-safe in-memory ledger.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<BTreeMap<StateKey, Vec<u8>>>,
    events: RwLock<Vec<Event>>,
    writes: RwLock<Vec<StateWrite>>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event appended so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.read().clone()
    }

    /// Events of one kind, in order.
    #[must_use]
    pub fn events_of(&self, event_type: EventType) -> Vec<Event> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Recorded writes, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<StateWrite> {
        self.writes.read().clone()
    }

    /// Number of recorded writes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.read().len()
    }

    /// Forget the write log without touching state.
    pub fn clear_write_log(&self) {
        self.writes.write().clear();
    }

    /// Number of live keys.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.state.read().len()
    }

    /// Copy state and events.
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            state: self.state.read().clone(),
            events: self.events.read().clone(),
        }
    }

    /// Roll state and events back to `snapshot`.
    pub fn restore(&self, snapshot: LedgerSnapshot) {
        *self.state.write() = snapshot.state;
        *self.events.write() = snapshot.events;
    }

    fn record(&self, op: WriteOp, address: &Address, key: &[u8]) {
        self.writes.write().push(StateWrite {
            op,
            address: address.clone(),
            key: key.to_vec(),
        });
    }
}

impl LedgerState for InMemoryLedger {
    fn get_state(&self, address: &Address, key: &[u8]) -> Option<Vec<u8>> {
        self.state
            .read()
            .get(&(address.clone(), key.to_vec()))
            .cloned()
    }

    fn set_state(&self, address: &Address, key: &[u8], value: Vec<u8>) {
        let map_key = (address.clone(), key.to_vec());
        if value.is_empty() {
            self.state.write().remove(&map_key);
            self.record(WriteOp::Delete, address, key);
        } else {
            self.state.write().insert(map_key, value);
            self.record(WriteOp::Set, address, key);
        }
    }

    fn add_state(&self, address: &Address, key: &[u8], value: Vec<u8>) {
        let map_key = (address.clone(), key.to_vec());
        {
            let mut state = self.state.write();
            let merged = match state.get(&map_key) {
                Some(existing) => merge_json(existing, &value).unwrap_or(value),
                None => value,
            };
            state.insert(map_key, merged);
        }
        self.record(WriteOp::Add, address, key);
    }

    fn query_by_prefix(&self, address: &Address, prefix: &[u8]) -> Vec<Vec<u8>> {
        let state = self.state.read();
        let start = (address.clone(), prefix.to_vec());
        state
            .range(start..)
            .take_while(|((addr, key), _)| addr == address && key.starts_with(prefix))
            .map(|(_, value)| value.clone())
            .collect()
    }

    fn add_event(&self, event: Event) {
        self.events.write().push(event);
    }
}

/// Merge `new` into `old` when both are JSON objects or arrays.
fn merge_json(old: &[u8], new: &[u8]) -> Option<Vec<u8>> {
    let old: Value = serde_json::from_slice(old).ok()?;
    let new: Value = serde_json::from_slice(new).ok()?;
    let merged = match (old, new) {
        (Value::Object(mut base), Value::Object(update)) => {
            base.extend(update);
            Value::Object(base)
        }
        (Value::Array(mut base), Value::Array(tail)) => {
            base.extend(tail);
            Value::Array(base)
        }
        _ => return None,
    };
    serde_json::to_vec(&merged).ok()
}
