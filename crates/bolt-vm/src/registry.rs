//! # Contract Registry
//!
//! Fixed address-to-contract table. Built once at start-up and shared
//! read-only by every execution afterwards.

use crate::domain::value_objects::Address;
use crate::errors::VmError;
use crate::ports::inbound::{Contract, IbtpHandler};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// One registration entry.
#[derive(Clone)]
pub struct BoltContract {
    /// Disabled entries are dropped when the registry is built.
    pub enabled: bool,
    /// Human name used in logs.
    pub name: String,
    /// Fixed contract address.
    pub address: Address,
    /// Contract implementation.
    pub contract: Arc<dyn Contract>,
}

impl BoltContract {
    /// Enabled entry.
    pub fn new(name: impl Into<String>, address: impl Into<Address>, contract: Arc<dyn Contract>) -> Self {
        Self {
            enabled: true,
            name: name.into(),
            address: address.into(),
            contract,
        }
    }

    /// Same entry, switched off.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

impl fmt::Debug for BoltContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoltContract")
            .field("enabled", &self.enabled)
            .field("name", &self.name)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Immutable contract table.
pub struct ContractRegistry {
    contracts: BTreeMap<Address, BoltContract>,
    ibtp_handler: Option<Arc<dyn IbtpHandler>>,
}

impl ContractRegistry {
    /// Start building a registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Contract registered at `address`.
    pub fn get(&self, address: &Address) -> Result<&BoltContract, VmError> {
        self.contracts
            .get(address)
            .ok_or_else(|| VmError::ContractNotFound(address.to_string()))
    }

    /// True when a contract is registered at `address`.
    #[must_use]
    pub fn contains(&self, address: &Address) -> bool {
        self.contracts.contains_key(address)
    }

    /// Number of registered contracts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Registered addresses in order.
    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.contracts.keys()
    }

    /// Typed IBTP entry point.
    pub fn ibtp_handler(&self) -> Result<&Arc<dyn IbtpHandler>, VmError> {
        self.ibtp_handler.as_ref().ok_or(VmError::MissingIbtpHandler)
    }
}

impl fmt::Debug for ContractRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractRegistry")
            .field("contracts", &self.contracts.values().collect::<Vec<_>>())
            .field("ibtp_handler", &self.ibtp_handler.is_some())
            .finish()
    }
}

/// Builder for [`ContractRegistry`].
#[derive(Default)]
pub struct RegistryBuilder {
    entries: Vec<BoltContract>,
    ibtp_handler: Option<Arc<dyn IbtpHandler>>,
}

impl RegistryBuilder {
    /// Add one entry.
    #[must_use]
    pub fn register(mut self, entry: BoltContract) -> Self {
        self.entries.push(entry);
        self
    }

    /// Add several entries.
    #[must_use]
    pub fn register_all(mut self, entries: impl IntoIterator<Item = BoltContract>) -> Self {
        self.entries.extend(entries);
        self
    }

    /// Add an externally supplied contract next to the built-in set.
    #[must_use]
    pub fn extension(self, entry: BoltContract) -> Self {
        debug!("[registry] extension contract {} at {}", entry.name, entry.address);
        self.register(entry)
    }

    /// Register `contract` at `address` and use it as the IBTP entry point.
    #[must_use]
    pub fn ibtp_handler<T>(mut self, name: &str, address: impl Into<Address>, contract: Arc<T>) -> Self
    where
        T: Contract + IbtpHandler + 'static,
    {
        let handler: Arc<dyn IbtpHandler> = contract.clone();
        self.ibtp_handler = Some(handler);
        self.register(BoltContract::new(name, address, contract))
    }

    /// Build the table. Disabled entries are skipped; duplicate addresses fail.
    pub fn build(self) -> Result<ContractRegistry, VmError> {
        let mut contracts = BTreeMap::new();
        for entry in self.entries {
            if !entry.enabled {
                debug!("[registry] skipping disabled contract {}", entry.name);
                continue;
            }
            if contracts.contains_key(&entry.address) {
                return Err(VmError::DuplicateContract(entry.address.to_string()));
            }
            contracts.insert(entry.address.clone(), entry);
        }
        info!("[registry] {} bolt contracts registered", contracts.len());
        Ok(ContractRegistry {
            contracts,
            ibtp_handler: self.ibtp_handler,
        })
    }
}
