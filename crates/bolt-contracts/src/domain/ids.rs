//! Service identifiers.
//!
//! A chain-service id is `chainID:serviceID`; a full service id prefixes the
//! relay chain: `bitxhubID:chainID:serviceID`.

use crate::errors::{ContractError, ContractResult};
use std::fmt;

/// `chainID:serviceID`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChainServiceId {
    /// Appchain id.
    pub chain_id: String,
    /// Service id within the appchain.
    pub service_id: String,
}

impl ChainServiceId {
    /// Build from parts.
    pub fn new(chain_id: impl Into<String>, service_id: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            service_id: service_id.into(),
        }
    }

    /// Parse `chainID:serviceID`.
    pub fn parse(id: &str) -> ContractResult<Self> {
        match id.split(':').collect::<Vec<_>>().as_slice() {
            [chain, service] if !chain.is_empty() && !service.is_empty() => {
                Ok(Self::new(*chain, *service))
            }
            _ => Err(ContractError::invalid(format!("illegal chain service id {id}"))),
        }
    }
}

impl fmt::Display for ChainServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain_id, self.service_id)
    }
}

/// `bitxhubID:chainID:serviceID`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FullServiceId {
    /// Relay chain id, all digits.
    pub bitxhub_id: String,
    /// Appchain and service.
    pub chain_service: ChainServiceId,
}

impl FullServiceId {
    /// Build from parts.
    pub fn new(bitxhub_id: impl Into<String>, chain_service: ChainServiceId) -> Self {
        Self {
            bitxhub_id: bitxhub_id.into(),
            chain_service,
        }
    }

    /// Parse and check the shape of a full service id.
    pub fn parse(id: &str) -> ContractResult<Self> {
        let parts: Vec<&str> = id.split(':').collect();
        let [bxh, chain, service] = parts.as_slice() else {
            return Err(ContractError::invalid("the ID does not contain three parts"));
        };
        if bxh.is_empty() {
            return Err(ContractError::invalid("BitxhubID is empty"));
        }
        if chain.is_empty() || service.is_empty() {
            return Err(ContractError::invalid("AppchainID or ServiceID is empty"));
        }
        if !bxh.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ContractError::invalid("BitxhubID is not numeric"));
        }
        Ok(Self::new(*bxh, ChainServiceId::new(*chain, *service)))
    }

    /// Appchain id.
    #[must_use]
    pub fn chain_id(&self) -> &str {
        &self.chain_service.chain_id
    }
}

impl fmt::Display for FullServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.bitxhub_id, self.chain_service)
    }
}

/// A service id as carried in an IBTP: full, or chain-service on the local relay.
pub fn parse_ibtp_service(id: &str, local_bitxhub_id: &str) -> ContractResult<FullServiceId> {
    match id.split(':').count() {
        2 => Ok(FullServiceId::new(local_bitxhub_id, ChainServiceId::parse(id)?)),
        _ => FullServiceId::parse(id),
    }
}
