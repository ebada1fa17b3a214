//! Drift detection - compare declared definitions against live state.
//!
//! All three differs are pure functions. Schema comparison treats both sides
//! as multisets of `(name, type)` pairs and subtracts tallies, so duplicate
//! pairs and columns matching on name but not type fall out naturally: a
//! type-changed column is unmatched on *both* sides, which is what signals a
//! substitutive change. Column mode never participates in drift detection.

use granary_schema::{Column, ColumnType, ExternalConfig, LabelSet};
use std::collections::HashMap;

/// The asymmetric outcome of comparing two schemas.
///
/// `added` is what the desired schema has that the live one lacks, `removed`
/// the opposite. Both are leftovers after multiset matching on `(name, type)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDrift {
    /// Columns present in the desired schema only.
    pub added: Vec<Column>,
    /// Columns present in the live schema only.
    pub removed: Vec<Column>,
}

impl SchemaDrift {
    /// No drift at all.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Only new columns; the live schema is a strict subset.
    pub fn is_pure_addition(&self) -> bool {
        !self.added.is_empty() && self.removed.is_empty()
    }

    /// Only dropped columns; the desired schema is a strict subset.
    pub fn is_pure_removal(&self) -> bool {
        self.added.is_empty() && !self.removed.is_empty()
    }

    /// Unmatched columns on both sides: a type change or rename. Covers the
    /// equal-count case as well as mixed add+remove drift.
    pub fn is_substitution(&self) -> bool {
        !self.added.is_empty() && !self.removed.is_empty()
    }
}

fn tally(schema: &[Column]) -> HashMap<(&str, ColumnType), usize> {
    let mut counts: HashMap<(&str, ColumnType), usize> = HashMap::new();
    for col in schema {
        *counts.entry(col.key()).or_default() += 1;
    }
    counts
}

/// Columns of `side` not matched by an identical `(name, type)` pair in
/// `other`, preserving `side` order. Each pair in `other` matches at most
/// once.
fn leftover(side: &[Column], other: &[Column]) -> Vec<Column> {
    let mut counts = tally(other);
    side.iter()
        .filter(|col| match counts.get_mut(&col.key()) {
            Some(n) if *n > 0 => {
                *n -= 1;
                false
            }
            _ => true,
        })
        .cloned()
        .collect()
}

/// Compare a live schema against the desired one.
pub fn diff_schema(current: &[Column], desired: &[Column]) -> SchemaDrift {
    SchemaDrift {
        added: leftover(desired, current),
        removed: leftover(current, desired),
    }
}

fn canonical(labels: &LabelSet) -> Vec<(&str, &str)> {
    let mut pairs: Vec<_> = labels
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    pairs.sort_unstable();
    pairs
}

/// Compare two label sets, ignoring key order.
///
/// Returns the desired set when it differs, signalling a whole-set
/// replacement; there are no partial-merge semantics.
pub fn changed_labels<'a>(current: &LabelSet, desired: &'a LabelSet) -> Option<&'a LabelSet> {
    if canonical(current) == canonical(desired) {
        None
    } else {
        Some(desired)
    }
}

/// Compare two external source configurations.
///
/// Format must match exactly; the URI lists are compared as sets. Any
/// difference means the table has to be dropped and recreated, so there is
/// nothing finer-grained to report than a boolean.
pub fn external_config_changed(current: &ExternalConfig, desired: &ExternalConfig) -> bool {
    if current.format != desired.format {
        return true;
    }
    let mut current_uris = current.source_uris.clone();
    let mut desired_uris = desired.source_uris.clone();
    current_uris.sort_unstable();
    desired_uris.sort_unstable();
    current_uris != desired_uris
}
