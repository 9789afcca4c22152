//! # Domain Invariants
//!
//! Rules the dispatcher enforces on every frame.

use super::entities::ExecutionContext;
use crate::errors::VmError;

/// Invariant: call depth limit.
///
/// A nested cross invocation deeper than `max` is refused before any
/// contract code runs.
pub fn check_call_depth(depth: usize, max: usize) -> Result<(), VmError> {
    if depth > max {
        return Err(VmError::CallDepthExceeded { depth, max });
    }
    Ok(())
}

/// Invariant: caller identity is transaction scoped.
///
/// A child frame keeps the parent's `caller`, sees the parent's callee as
/// its `current_caller`, and shares the parent's transaction.
#[must_use]
pub fn identity_propagated(parent: &ExecutionContext, child: &ExecutionContext) -> bool {
    child.caller == parent.caller
        && child.current_caller == parent.callee
        && child.tx == parent.tx
        && child.depth == parent.depth + 1
}
