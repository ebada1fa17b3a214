//! The warehouse adapter seam.
//!
//! Everything that actually talks to the warehouse lives behind
//! [`WarehouseClient`]. The engine only decides *what* to do; an adapter
//! implementation decides *how* (HTTP client, auth, timeouts, all of it).
//! Every method is a blocking-from-the-engine's-point-of-view remote call:
//! the engine awaits each one to completion before doing anything else.

use granary_schema::{Column, LabelSet, TableDescriptor, TableRef};
use thiserror::Error;

/// Error returned by a warehouse adapter.
///
/// The engine branches on the variant in exactly one place: `AlreadyExists`
/// surfacing from a create call means the inventory snapshot went stale, and
/// is handled like any other per-entry mutation failure.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("service error: {0}")]
    Service(String),
}

/// Client interface to the warehouse.
///
/// Implementations are expected to map their native error types onto
/// [`ClientError`] and to do nothing clever beyond that: no retries, no
/// caching, no reordering. `delete_table` with `ignore_missing` must treat
/// a missing table as success.
#[allow(async_fn_in_trait)]
pub trait WarehouseClient {
    /// Create a dataset at the given location.
    async fn create_dataset(
        &self,
        project: &str,
        dataset: &str,
        location: &str,
    ) -> Result<(), ClientError>;

    /// Create a table (native or external, per the descriptor).
    async fn create_table(&self, descriptor: &TableDescriptor) -> Result<(), ClientError>;

    /// Fetch the live state of a table: schema, labels, and external config
    /// if the table is externally backed.
    async fn get_table(&self, table_ref: &TableRef) -> Result<TableDescriptor, ClientError>;

    /// Replace a table's schema with the given column list.
    async fn update_schema(
        &self,
        table_ref: &TableRef,
        schema: &[Column],
    ) -> Result<(), ClientError>;

    /// Replace a table's labels with the given set.
    async fn update_labels(
        &self,
        table_ref: &TableRef,
        labels: &LabelSet,
    ) -> Result<(), ClientError>;

    /// Run a DDL/DML statement and block until the job completes.
    async fn run_query(&self, sql: &str) -> Result<(), ClientError>;

    /// Delete a table. With `ignore_missing`, a missing table is not an
    /// error.
    async fn delete_table(&self, table_ref: &TableRef, ignore_missing: bool)
    -> Result<(), ClientError>;

    /// List dataset names in a project.
    async fn list_datasets(&self, project: &str) -> Result<Vec<String>, ClientError>;

    /// List table names in a dataset.
    async fn list_tables(&self, project: &str, dataset: &str) -> Result<Vec<String>, ClientError>;
}
