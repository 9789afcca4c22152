//! Secondary indices and name reservations kept next to the resources.

use crate::errors::{ContractError, ContractResult};
use bolt_vm::ports::{Stub, StubExt};

/// Members of the list stored under `key`.
pub fn members(stub: &dyn Stub, key: &str) -> ContractResult<Vec<String>> {
    Ok(stub.get_object::<Vec<String>>(key)?.unwrap_or_default())
}

/// Append `value` to the list under `key` unless present.
pub fn insert(stub: &dyn Stub, key: &str, value: &str) -> ContractResult<()> {
    let mut list = members(stub, key)?;
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
        stub.set_object(key, &list)?;
    }
    Ok(())
}

/// Drop `value` from the list under `key`.
pub fn remove(stub: &dyn Stub, key: &str, value: &str) -> ContractResult<()> {
    let mut list = members(stub, key)?;
    let before = list.len();
    list.retain(|v| v != value);
    if list.len() != before {
        if list.is_empty() {
            stub.delete(key);
        } else {
            stub.set_object(key, &list)?;
        }
    }
    Ok(())
}

/// Current holder of the name under `key`.
#[must_use]
pub fn holder(stub: &dyn Stub, key: &str) -> Option<String> {
    stub.get(key).map(|v| String::from_utf8_lossy(&v).into_owned())
}

/// Fail with `DuplicateName` when `key` is held by someone other than `owner`.
pub fn check_free(stub: &dyn Stub, key: &str, name: &str, owner: &str) -> ContractResult<()> {
    match holder(stub, key) {
        Some(current) if current != owner => Err(ContractError::DuplicateName {
            name: name.to_string(),
            holder: current,
        }),
        _ => Ok(()),
    }
}

/// Reserve `key` for `owner`.
pub fn reserve(stub: &dyn Stub, key: &str, name: &str, owner: &str) -> ContractResult<()> {
    check_free(stub, key, name, owner)?;
    stub.set(key, owner.as_bytes().to_vec());
    Ok(())
}

/// Release `key` if `owner` holds it.
pub fn release(stub: &dyn Stub, key: &str, owner: &str) {
    if holder(stub, key).as_deref() == Some(owner) {
        stub.delete(key);
    }
}
