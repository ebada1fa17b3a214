//! Warehouse schema and catalog types for granary.
//!
//! This crate contains the data model shared between the reconciliation
//! engine and whatever loads the declared catalog: columns, table schemas,
//! label sets, external source configuration, table descriptors, the live
//! inventory snapshot, and the declared catalog itself.
//!
//! Column identity for comparison purposes is the `(name, type)` pair; the
//! column mode only matters when a change is applied, never when drift is
//! detected.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;


/// Default dataset location used when a catalog entry does not name one.
pub const DEFAULT_LOCATION: &str = "US";

/// Primitive warehouse column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    String,
    Bytes,
    Int64,
    Float64,
    Numeric,
    Bignumeric,
    Bool,
    Timestamp,
    Date,
    Time,
    Datetime,
    Geography,
    Json,
}

impl ColumnType {
    /// The canonical spelling used in schemas and DDL.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "STRING",
            ColumnType::Bytes => "BYTES",
            ColumnType::Int64 => "INT64",
            ColumnType::Float64 => "FLOAT64",
            ColumnType::Numeric => "NUMERIC",
            ColumnType::Bignumeric => "BIGNUMERIC",
            ColumnType::Bool => "BOOL",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Date => "DATE",
            ColumnType::Time => "TIME",
            ColumnType::Datetime => "DATETIME",
            ColumnType::Geography => "GEOGRAPHY",
            ColumnType::Json => "JSON",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column mode. NULLABLE is the default, matching the declared schema format
/// where `mode` may be omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnMode {
    #[default]
    Nullable,
    Required,
    Repeated,
}

/// A single column definition.
///
/// Deserializes from the declared schema object format:
/// `{"name": "id", "type": "INT64", "mode": "REQUIRED"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub mode: ColumnMode,
}

impl Column {
    /// Create a nullable column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            mode: ColumnMode::Nullable,
        }
    }

    /// Set the mode, builder style.
    pub fn with_mode(mut self, mode: ColumnMode) -> Self {
        self.mode = mode;
        self
    }

    /// Identity key for drift comparison. Mode is deliberately excluded.
    pub fn key(&self) -> (&str, ColumnType) {
        (self.name.as_str(), self.column_type)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.column_type)?;
        match self.mode {
            ColumnMode::Nullable => Ok(()),
            ColumnMode::Required => write!(f, " REQUIRED"),
            ColumnMode::Repeated => write!(f, " REPEATED"),
        }
    }
}

/// An ordered table schema. Name uniqueness within a schema is assumed
/// upstream, not enforced here.
pub type TableSchema = Vec<Column>;

/// Table labels. Insertion order is preserved for display purposes but is
/// irrelevant to equality, which is canonical (sorted key/value pairs).
pub type LabelSet = IndexMap<String, String>;

/// Source format for externally-backed tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceFormat {
    Csv,
    NewlineDelimitedJson,
    Avro,
    Parquet,
    Orc,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Csv => "CSV",
            SourceFormat::NewlineDelimitedJson => "NEWLINE_DELIMITED_JSON",
            SourceFormat::Avro => "AVRO",
            SourceFormat::Parquet => "PARQUET",
            SourceFormat::Orc => "ORC",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source configuration for an externally-backed table.
///
/// The URI list is compared as a set: ordering differences are not drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalConfig {
    pub format: SourceFormat,
    pub source_uris: Vec<String>,
}

/// Fully-qualified table reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl TableRef {
    pub fn new(
        project: impl Into<String>,
        dataset: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            dataset: dataset.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

/// Whether a table's data is stored by the warehouse or referenced from
/// outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Native,
    External,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Native => f.write_str("native"),
            TableKind::External => f.write_str("external"),
        }
    }
}

/// The unit the engine reconciles: one table's full declared (or observed)
/// state. Instances are built fresh per catalog entry per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub table_ref: TableRef,
    pub schema: TableSchema,
    pub labels: LabelSet,
    pub external: Option<ExternalConfig>,
}

impl TableDescriptor {
    pub fn kind(&self) -> TableKind {
        if self.external.is_some() {
            TableKind::External
        } else {
            TableKind::Native
        }
    }
}

/// Point-in-time snapshot of the datasets and tables present in a project.
///
/// Taken once at the start of a run and never re-queried; the orchestrator
/// records its own successful creations so later entries in the same run see
/// them. Anything another process does between snapshot and mutation is
/// invisible, which is a documented consistency gap of the whole scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveInventory {
    datasets: BTreeSet<String>,
    tables: BTreeMap<String, BTreeSet<String>>,
}

impl LiveInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_dataset(&self, dataset: &str) -> bool {
        self.datasets.contains(dataset)
    }

    pub fn has_table(&self, dataset: &str, table: &str) -> bool {
        self.tables
            .get(dataset)
            .is_some_and(|tables| tables.contains(table))
    }

    /// Record a dataset, typically right after creating it.
    pub fn record_dataset(&mut self, dataset: impl Into<String>) {
        let dataset = dataset.into();
        self.tables.entry(dataset.clone()).or_default();
        self.datasets.insert(dataset);
    }

    /// Record a table, typically right after creating it.
    pub fn record_table(&mut self, dataset: impl Into<String>, table: impl Into<String>) {
        let dataset = dataset.into();
        self.datasets.insert(dataset.clone());
        self.tables.entry(dataset).or_default().insert(table.into());
    }

    pub fn datasets(&self) -> impl Iterator<Item = &str> {
        self.datasets.iter().map(String::as_str)
    }

    pub fn tables_in(&self, dataset: &str) -> impl Iterator<Item = &str> {
        self.tables
            .get(dataset)
            .into_iter()
            .flat_map(|tables| tables.iter().map(String::as_str))
    }
}

/// A declared native table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeEntry {
    pub dataset: String,
    pub table: String,
    pub schema: TableSchema,
    #[serde(default)]
    pub labels: LabelSet,
    /// Dataset location, used only when the dataset has to be created.
    #[serde(default)]
    pub location: Option<String>,
}

impl NativeEntry {
    /// Build the descriptor the engine reconciles against the live state.
    pub fn descriptor(&self, project: &str) -> TableDescriptor {
        TableDescriptor {
            table_ref: TableRef::new(project, &self.dataset, &self.table),
            schema: self.schema.clone(),
            labels: self.labels.clone(),
            external: None,
        }
    }

    pub fn location(&self) -> &str {
        self.location.as_deref().unwrap_or(DEFAULT_LOCATION)
    }
}

/// A declared externally-backed table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalEntry {
    pub dataset: String,
    pub table: String,
    pub schema: TableSchema,
    pub source_format: SourceFormat,
    pub source_uris: Vec<String>,
    #[serde(default)]
    pub labels: LabelSet,
    #[serde(default)]
    pub location: Option<String>,
}

impl ExternalEntry {
    pub fn descriptor(&self, project: &str) -> TableDescriptor {
        TableDescriptor {
            table_ref: TableRef::new(project, &self.dataset, &self.table),
            schema: self.schema.clone(),
            labels: self.labels.clone(),
            external: Some(ExternalConfig {
                format: self.source_format,
                source_uris: self.source_uris.clone(),
            }),
        }
    }

    pub fn location(&self) -> &str {
        self.location.as_deref().unwrap_or(DEFAULT_LOCATION)
    }
}

/// The declared catalog: every table an operator wants present, partitioned
/// into native and external groups. Entries are processed in declaration
/// order, native group first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub native: Vec<NativeEntry>,
    #[serde(default)]
    pub external: Vec<ExternalEntry>,
}

impl Catalog {
    pub fn is_empty(&self) -> bool {
        self.native.is_empty() && self.external.is_empty()
    }

    pub fn len(&self) -> usize {
        self.native.len() + self.external.len()
    }
}
