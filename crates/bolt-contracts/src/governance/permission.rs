//! # Permission Checks
//!
//! An operation lists the permission kinds it accepts; the caller passes if
//! any one of them matches. Nothing matching is a denial, and the operation
//! must stop before touching state.

use super::call::invoke_bool;
use crate::addresses;
use crate::errors::{ContractError, ContractResult};
use bolt_vm::domain::value_objects::Arg;
use bolt_vm::ports::Stub;

/// Role type checked by [`Permission::Admin`].
pub const GOVERNANCE_ADMIN: &str = "governanceAdmin";

/// Owner of a resource, as seen by [`Permission::SelfOwned`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Owner<'a> {
    /// A single account owns the resource.
    Account(&'a str),
    /// Any admin of the appchain owns the resource.
    AppchainAdmin(&'a str),
}

/// One accepted permission kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Permission<'a> {
    /// The regulator owns the resource.
    SelfOwned(Owner<'a>),
    /// The regulator is an available governance admin.
    Admin,
    /// The regulator is one of the listed addresses.
    Specific(&'a [&'a str]),
}

/// Pass if any of `permissions` admits `regulator`.
pub fn check_permission(stub: &dyn Stub, permissions: &[Permission<'_>], regulator: &str) -> ContractResult<()> {
    let mut reason = String::from("no permission requested");
    for permission in permissions {
        match permission {
            Permission::SelfOwned(Owner::Account(owner)) => {
                if *owner == regulator {
                    return Ok(());
                }
                reason = format!("not the owner {owner}");
            }
            Permission::SelfOwned(Owner::AppchainAdmin(chain_id)) => {
                if is_appchain_admin(stub, regulator, chain_id)? {
                    return Ok(());
                }
                reason = format!("not an admin of appchain {chain_id}");
            }
            Permission::Admin => {
                if is_available_governance_admin(stub, regulator)? {
                    return Ok(());
                }
                reason = "not an available governance admin".to_string();
            }
            Permission::Specific(allowed) => {
                if allowed.contains(&regulator) {
                    return Ok(());
                }
                reason = format!("not in {allowed:?}");
            }
        }
    }
    Err(ContractError::denied(regulator, reason))
}

/// Restrict to the governance contract.
pub fn only_governance(stub: &dyn Stub) -> ContractResult<()> {
    only(stub, addresses::GOVERNANCE)
}

/// Restrict to one contract.
pub fn only(stub: &dyn Stub, address: &str) -> ContractResult<()> {
    check_permission(stub, &[Permission::Specific(&[address])], stub.current_caller())
}

fn is_available_governance_admin(stub: &dyn Stub, addr: &str) -> ContractResult<bool> {
    invoke_bool(
        stub,
        addresses::ROLE_MANAGER,
        "IsAnyAvailableAdmin",
        vec![Arg::string(addr), Arg::string(GOVERNANCE_ADMIN)],
    )
}

fn is_appchain_admin(stub: &dyn Stub, addr: &str, chain_id: &str) -> ContractResult<bool> {
    invoke_bool(
        stub,
        addresses::ROLE_MANAGER,
        "IsAppchainAdmin",
        vec![Arg::string(addr), Arg::string(chain_id)],
    )
}
