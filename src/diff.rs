//! Diff engine for lifecycle plans.
//!
//! Compares prior and proposed property bags against a static per-resource
//! key table and classifies the result as no-change, update-in-place, or
//! replacement. Which fields force replacement is declared by each resource
//! handler, not decided here.

use serde_json::{Map, Value};

/// Classification of a computed diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    /// Prior and proposed inputs are identical across all tracked fields.
    NoChange,
    /// Some fields changed, all of them updatable in place.
    UpdateInPlace,
    /// At least one changed field is part of the resource identity.
    RequiresReplacement,
}

/// The outcome of diffing prior against proposed inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDiff {
    /// Overall classification.
    pub kind: DiffKind,
    /// Every tracked field whose value changed, sorted by name.
    pub diffs: Vec<String>,
    /// The subset of `diffs` that forces replacement, sorted by name.
    pub replaces: Vec<String>,
    /// Whether the old instance must be deleted before the new one is
    /// created. Slug-addressed resources cannot coexist under the same
    /// identity, so this is true exactly when a replacement is required.
    pub delete_before_replace: bool,
}

impl ResourceDiff {
    /// A diff with no changes.
    pub fn no_change() -> Self {
        Self {
            kind: DiffKind::NoChange,
            diffs: Vec::new(),
            replaces: Vec::new(),
            delete_before_replace: false,
        }
    }
}

/// Compute the diff between two property bags.
///
/// `tracked` lists every field the resource cares about; `replace_keys` is
/// the subset whose change forces destroy-and-recreate. A field counts as
/// changed when it is present in one bag and not the other, or present in
/// both with different values.
pub fn diff_inputs(
    olds: &Map<String, Value>,
    news: &Map<String, Value>,
    tracked: &[&str],
    replace_keys: &[&str],
) -> ResourceDiff {
    let mut diffs = Vec::new();
    let mut replaces = Vec::new();

    for key in tracked {
        if olds.get(*key) != news.get(*key) {
            diffs.push(key.to_string());
            if replace_keys.contains(key) {
                replaces.push(key.to_string());
            }
        }
    }
    diffs.sort();
    replaces.sort();

    let kind = if diffs.is_empty() {
        DiffKind::NoChange
    } else if replaces.is_empty() {
        DiffKind::UpdateInPlace
    } else {
        DiffKind::RequiresReplacement
    };

    ResourceDiff {
        kind,
        delete_before_replace: !replaces.is_empty(),
        diffs,
        replaces,
    }
}
