//! Typed update diffs carried in a proposal's extra payload.

use serde::{Deserialize, Serialize};

/// Old and new value of one governed field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit<T> {
    /// Value before the update.
    pub old: T,
    /// Value after the update.
    pub new: T,
}

impl<T: PartialEq + Clone> Edit<T> {
    /// `Some` when the values differ.
    pub fn between(old: &T, new: &T) -> Option<Self> {
        (old != new).then(|| Self {
            old: old.clone(),
            new: new.clone(),
        })
    }
}

/// Apply `edit` to `field` when present.
pub fn apply<T: Clone>(field: &mut T, edit: Option<&Edit<T>>) {
    if let Some(edit) = edit {
        *field = edit.new.clone();
    }
}

/// Sorted, deduplicated copy of a string list, for set comparisons.
#[must_use]
pub fn normalized(items: &[String]) -> Vec<String> {
    let mut items = items.to_vec();
    items.sort();
    items.dedup();
    items
}

/// Split a comma separated list, ignoring empty segments.
#[must_use]
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
