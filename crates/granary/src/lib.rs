//! Catalog-driven convergence for a managed tabular warehouse.
//!
//! Granary takes a declared catalog of table definitions and the live state
//! of a warehouse project, detects drift, and applies the smallest mutation
//! that converges the live table onto its declared definition:
//!
//! - new columns are appended in place;
//! - dropped columns are removed via a projection rebuild that keeps data;
//! - substitutive changes (type change, rename) trigger a full rebuild;
//! - externally-backed tables are dropped and recreated on any schema or
//!   source-config drift, since their backing cannot be patched in place;
//! - label-only drift becomes a label patch.
//!
//! The warehouse itself is behind the [`WarehouseClient`] trait; granary
//! never opens a connection, parses a catalog file, or retries anything.
//! Processing is strictly sequential: one entry is fully reconciled before
//! the next begins, and the inventory snapshot taken at the start of a run
//! is never re-queried.
//!
//! ```ignore
//! let client = BigQueryAdapter::connect(creds).await?;
//! let mut reconciler = Reconciler::connect(&client, "acme-data").await?;
//! let report = reconciler.run(&catalog).await;
//! for (table, error) in &report.failed {
//!     eprintln!("{table}: {error}");
//! }
//! ```

mod apply;
mod client;
mod diff;
mod error;
mod policy;
mod reconcile;

pub use apply::{projection_rebuild_sql, rebuild_sql};
pub use client::{ClientError, WarehouseClient};
pub use diff::{SchemaDrift, changed_labels, diff_schema, external_config_changed};
pub use error::Error;
pub use policy::Plan;
pub use reconcile::{EntryOutcome, Reconciler, RunReport};

// Re-export the data model so engine users need only one import.
pub use granary_schema::{
    Catalog, Column, ColumnMode, ColumnType, ExternalConfig, ExternalEntry, LabelSet,
    LiveInventory, NativeEntry, SourceFormat, TableDescriptor, TableKind, TableRef, TableSchema,
};

/// Result type for granary operations.
pub type Result<T> = std::result::Result<T, Error>;
