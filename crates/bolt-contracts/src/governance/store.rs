//! # Governable Resources
//!
//! The shared half of every manager: loading a resource, checking an event
//! against its transition table and persisting the new status. The status
//! written by [`ResourceStore::change_status`] marks the resource as busy,
//! so a second event on the same id fails the transition check until the
//! proposal closes.

use super::machine::StateMachine;
use super::status::{EventType, GovernanceStatus, ManageTrigger};
use crate::errors::{ContractError, ContractResult};
use bolt_vm::ports::{Stub, StubExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use tracing::debug;

/// A resource driven by governance events.
pub trait Governable: Serialize + DeserializeOwned {
    /// Resource kind, used in messages.
    const KIND: &'static str;
    /// Storage key prefix.
    const PREFIX: &'static str;

    /// Stable id.
    fn governance_id(&self) -> String;
    /// Current status.
    fn status(&self) -> GovernanceStatus;
    /// Overwrite the status.
    fn set_status(&mut self, status: GovernanceStatus);
    /// Transition table of this resource.
    fn machine(&self) -> &'static StateMachine;

    /// Storage key of `id`.
    fn key(id: &str) -> String {
        format!("{}{id}", Self::PREFIX)
    }
}

/// Typed access to the resources of one kind in the current contract.
pub struct ResourceStore<'a, T> {
    stub: &'a dyn Stub,
    _kind: PhantomData<T>,
}

impl<'a, T: Governable> ResourceStore<'a, T> {
    /// Bind to the current frame.
    pub fn new(stub: &'a dyn Stub) -> Self {
        Self {
            stub,
            _kind: PhantomData,
        }
    }

    /// Resource `id`, if stored.
    pub fn get(&self, id: &str) -> ContractResult<Option<T>> {
        Ok(self.stub.get_object(&T::key(id))?)
    }

    /// Resource `id`, failing with `NotFound`.
    pub fn load(&self, id: &str) -> ContractResult<T> {
        self.get(id)?
            .ok_or_else(|| ContractError::not_found(format!("the {} {id} does not exist", T::KIND)))
    }

    /// True when `id` is stored.
    #[must_use]
    pub fn exists(&self, id: &str) -> bool {
        self.stub.has(&T::key(id))
    }

    /// Persist `item`.
    pub fn save(&self, item: &T) -> ContractResult<()> {
        self.stub.set_object(&T::key(&item.governance_id()), item)?;
        Ok(())
    }

    /// Every stored resource of this kind, in key order.
    pub fn all(&self) -> ContractResult<Vec<T>> {
        self.stub
            .query(T::PREFIX)
            .iter()
            .map(|data| serde_json::from_slice(data).map_err(ContractError::from))
            .collect()
    }

    /// Check that `event` may fire on `id`.
    ///
    /// A register of an absent id passes with `None`; any other event on an
    /// absent id is `NotFound`.
    pub fn governance_pre(&self, id: &str, event: EventType) -> ContractResult<Option<T>> {
        match self.get(id)? {
            None if event == EventType::Register => Ok(None),
            None => Err(ContractError::not_found(format!("the {} {id} does not exist", T::KIND))),
            Some(item) => {
                item.machine().check(id, event, item.status())?;
                Ok(Some(item))
            }
        }
    }

    /// Fire `event` on a stored resource and persist the new status.
    pub fn change_status(
        &self,
        id: &str,
        event: EventType,
        last: Option<GovernanceStatus>,
    ) -> ContractResult<T> {
        let mut item = self.load(id)?;
        let current = item.status();
        let next = item.machine().fire(id, event, current, last)?;
        debug!("[{}] {id} {event}: {current} -> {next}", T::KIND);
        item.set_status(next);
        self.save(&item)?;
        Ok(item)
    }

    /// Resolve a proposal outcome on a stored resource and persist it.
    ///
    /// A [`ManageTrigger::Discarded`] outcome only loads the resource.
    pub fn settle(
        &self,
        id: &str,
        trigger: ManageTrigger,
        last: Option<GovernanceStatus>,
    ) -> ContractResult<T> {
        let mut item = self.load(id)?;
        if trigger == ManageTrigger::Discarded {
            debug!("[{}] {id} discarded proposal, status stays {}", T::KIND, item.status());
            return Ok(item);
        }
        let current = item.status();
        let next = item.machine().settle(id, trigger, current, last)?;
        debug!("[{}] {id} {trigger}: {current} -> {next}", T::KIND);
        item.set_status(next);
        self.save(&item)?;
        Ok(item)
    }
}
