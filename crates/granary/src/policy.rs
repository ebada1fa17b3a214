//! Mutation strategy selection.
//!
//! Given the drift a table shows, pick the single mutation that converges
//! it. Schema drift always wins over label drift: a schema-bearing change
//! suppresses separate label handling for the pass (the labels either ride
//! along with the enclosing rebuild or get picked up on the next run). The
//! engine never performs two mutations for one entry in one pass.

use crate::diff::SchemaDrift;
use granary_schema::{Column, LabelSet, TableKind};
use std::fmt;

/// The mutation selected for one table in one pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// Live state already matches the declared definition.
    Noop,
    /// Append new columns to the existing schema in place. Native only;
    /// fails at apply time if any appended column is REQUIRED.
    AppendColumns(Vec<Column>),
    /// Recreate the table as a projection of itself without the named
    /// columns, preserving remaining data. Native only.
    DropColumns(Vec<String>),
    /// Recreate the table from the declared column list. Existing rows are
    /// discarded; there is no unambiguous cast for a substitutive change.
    /// Native only.
    Rebuild,
    /// Drop the table and create it again from the declared definition.
    /// External only; source format/location cannot be patched in place.
    Recreate,
    /// Replace the whole label set, leaving everything else untouched.
    PatchLabels(LabelSet),
}

impl Plan {
    pub fn is_noop(&self) -> bool {
        matches!(self, Plan::Noop)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plan::Noop => write!(f, "no changes"),
            Plan::AppendColumns(cols) => write!(f, "append {} column(s)", cols.len()),
            Plan::DropColumns(names) => write!(f, "drop column(s) {}", names.join(", ")),
            Plan::Rebuild => write!(f, "rebuild from declared schema"),
            Plan::Recreate => write!(f, "delete and recreate"),
            Plan::PatchLabels(_) => write!(f, "update labels"),
        }
    }
}

/// Select the mutation for one table.
///
/// `labels` is the replacement label set when label drift was detected,
/// `config_changed` whether the external source configuration drifted (it is
/// only ever true for external tables).
pub fn plan(
    kind: TableKind,
    drift: &SchemaDrift,
    labels: Option<&LabelSet>,
    config_changed: bool,
) -> Plan {
    match kind {
        TableKind::Native => {
            if drift.is_pure_addition() {
                Plan::AppendColumns(drift.added.clone())
            } else if drift.is_pure_removal() {
                Plan::DropColumns(drift.removed.iter().map(|c| c.name.clone()).collect())
            } else if drift.is_substitution() {
                Plan::Rebuild
            } else if let Some(labels) = labels {
                Plan::PatchLabels(labels.clone())
            } else {
                Plan::Noop
            }
        }
        TableKind::External => {
            // Any schema or source-config drift forces a full recreate;
            // only a drift-free table gets the cheap label patch.
            if !drift.is_empty() || config_changed {
                Plan::Recreate
            } else if let Some(labels) = labels {
                Plan::PatchLabels(labels.clone())
            } else {
                Plan::Noop
            }
        }
    }
}
