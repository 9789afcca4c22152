//! Interchain bookkeeping per service.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index counters of one full service id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interchain {
    /// Full service id.
    pub id: String,
    /// Last request index sent to each destination.
    pub interchain_counter: BTreeMap<String, u64>,
    /// Last receipt index received from each destination.
    pub receipt_counter: BTreeMap<String, u64>,
    /// Last request index received from each source.
    pub source_interchain_counter: BTreeMap<String, u64>,
    /// Last receipt index sent back to each source.
    pub source_receipt_counter: BTreeMap<String, u64>,
}

impl Interchain {
    /// Empty record of `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Storage key of `id`.
    #[must_use]
    pub fn key(id: &str) -> String {
        format!("interchain-{id}")
    }
}

/// One entry of a service's recent interchain window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterchainMeta {
    /// Counterparty service id as carried in the IBTP.
    pub target_chain: String,
    /// Hash of the relaying transaction.
    pub tx_hash: String,
    /// Timestamp of the relaying transaction.
    pub timestamp: i64,
}

/// A parsed IBTP service id, as returned by `ParseChainService`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainService {
    /// Relay chain id.
    pub bxh_id: String,
    /// Appchain id.
    pub chain_id: String,
    /// Service id.
    pub service_id: String,
    /// True when the appchain is registered on this relay.
    pub is_local: bool,
}

impl ChainService {
    /// `bxhID:chainID:serviceID`.
    #[must_use]
    pub fn full_service_id(&self) -> String {
        format!("{}:{}:{}", self.bxh_id, self.chain_id, self.service_id)
    }

    /// `chainID:serviceID`.
    #[must_use]
    pub fn chain_service_id(&self) -> String {
        format!("{}:{}", self.chain_id, self.service_id)
    }
}

/// Payload of the interchain event posted per handled IBTP.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterchainEvent {
    /// IBTP id.
    pub ibtp_id: String,
    /// Source full service id.
    pub from: String,
    /// Destination full service id.
    pub to: String,
    /// IBTP index.
    pub index: u64,
    /// True for receipts.
    pub is_receipt: bool,
    /// Counters of the source after the update.
    pub source: Interchain,
}
