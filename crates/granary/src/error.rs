use crate::client::ClientError;
use granary_schema::{ColumnType, TableRef};
use thiserror::Error;

/// Engine errors.
///
/// Only `Access` is fatal to a run, and it can only happen before any entry
/// is processed (the inventory snapshot). Everything else is fatal to one
/// catalog entry: the orchestrator logs it and moves on, and re-running the
/// whole process is the recovery mechanism.
#[derive(Debug, Error)]
pub enum Error {
    /// The warehouse project could not be read at the start of a run.
    #[error("cannot access project {project}: {source}")]
    Access {
        project: String,
        source: ClientError,
    },

    /// A REQUIRED column cannot be appended to a table that already holds
    /// data; there is no default to backfill it with.
    #[error("cannot append REQUIRED column {column} ({column_type}) to existing table {table}")]
    RequiredColumn {
        table: TableRef,
        column: String,
        column_type: ColumnType,
    },

    /// A create/alter/query/delete call failed at the warehouse. Includes
    /// the already-exists case, which means the inventory snapshot went
    /// stale between the existence check and the mutation.
    #[error("{action} failed for {table}: {source}")]
    Mutation {
        action: &'static str,
        table: TableRef,
        source: ClientError,
    },
}

impl Error {
    pub(crate) fn mutation(action: &'static str, table: &TableRef, source: ClientError) -> Self {
        Error::Mutation {
            action,
            table: table.clone(),
            source,
        }
    }
}
