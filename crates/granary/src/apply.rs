//! Plan execution - issue the selected mutation through the warehouse client.
//!
//! One plan, at most one mutation. The projection and rebuild paths go
//! through DDL because the warehouse cannot drop or retype columns via the
//! schema-update call; the generated statements are plain strings built by
//! pure helpers so they can be asserted on directly in tests.

use crate::client::WarehouseClient;
use crate::error::Error;
use crate::policy::Plan;
use granary_schema::{Column, ColumnMode, TableDescriptor, TableRef};
use tracing::{debug, info};

/// Quote a table reference for DDL. Project names routinely contain dashes,
/// so the whole path is backtick-quoted.
fn quoted(table_ref: &TableRef) -> String {
    format!(
        "`{}.{}.{}`",
        table_ref.project, table_ref.dataset, table_ref.table
    )
}

/// DDL that recreates a table as a projection of itself without the given
/// columns. All rows and all remaining columns' values survive.
pub fn projection_rebuild_sql(table_ref: &TableRef, dropped: &[String]) -> String {
    let table = quoted(table_ref);
    format!(
        "CREATE OR REPLACE TABLE {table} AS SELECT * EXCEPT ({cols}) FROM {table}",
        cols = dropped.join(", ")
    )
}

fn column_ddl(col: &Column) -> String {
    match col.mode {
        ColumnMode::Required => format!("{} {} NOT NULL", col.name, col.column_type),
        ColumnMode::Repeated => format!("{} ARRAY<{}>", col.name, col.column_type),
        ColumnMode::Nullable => format!("{} {}", col.name, col.column_type),
    }
}

/// DDL that recreates a table from the declared column list. REQUIRED
/// columns become NOT NULL constraints. Existing rows are not carried over.
pub fn rebuild_sql(table_ref: &TableRef, schema: &[Column]) -> String {
    let cols: Vec<String> = schema.iter().map(column_ddl).collect();
    format!(
        "CREATE OR REPLACE TABLE {} ({})",
        quoted(table_ref),
        cols.join(", ")
    )
}

/// Apply a plan to a table.
///
/// `live_schema` is the schema fetched for the diff; the append path extends
/// it rather than re-fetching. The REQUIRED check happens before any call is
/// issued, so a rejected append performs zero mutations.
pub(crate) async fn apply<C: WarehouseClient>(
    client: &C,
    desired: &TableDescriptor,
    live_schema: &[Column],
    plan: &Plan,
) -> Result<(), Error> {
    let table_ref = &desired.table_ref;
    match plan {
        Plan::Noop => {
            debug!(table = %table_ref, "live state matches declared definition");
            Ok(())
        }
        Plan::AppendColumns(cols) => {
            for col in cols {
                if col.mode == ColumnMode::Required {
                    return Err(Error::RequiredColumn {
                        table: table_ref.clone(),
                        column: col.name.clone(),
                        column_type: col.column_type,
                    });
                }
            }
            let mut schema = live_schema.to_vec();
            schema.extend(cols.iter().cloned());
            client
                .update_schema(table_ref, &schema)
                .await
                .map_err(|e| Error::mutation("schema update", table_ref, e))?;
            info!(table = %table_ref, appended = cols.len(), "appended column(s)");
            Ok(())
        }
        Plan::DropColumns(names) => {
            let sql = projection_rebuild_sql(table_ref, names);
            client
                .run_query(&sql)
                .await
                .map_err(|e| Error::mutation("projection rebuild", table_ref, e))?;
            info!(table = %table_ref, dropped = names.len(), "dropped column(s) via projection");
            Ok(())
        }
        Plan::Rebuild => {
            let sql = rebuild_sql(table_ref, &desired.schema);
            client
                .run_query(&sql)
                .await
                .map_err(|e| Error::mutation("rebuild", table_ref, e))?;
            info!(table = %table_ref, "rebuilt table from declared schema");
            Ok(())
        }
        Plan::Recreate => {
            client
                .delete_table(table_ref, true)
                .await
                .map_err(|e| Error::mutation("delete", table_ref, e))?;
            client
                .create_table(desired)
                .await
                .map_err(|e| Error::mutation("recreate", table_ref, e))?;
            info!(table = %table_ref, "recreated external table");
            Ok(())
        }
        Plan::PatchLabels(labels) => {
            client
                .update_labels(table_ref, labels)
                .await
                .map_err(|e| Error::mutation("label update", table_ref, e))?;
            info!(table = %table_ref, "updated labels");
            Ok(())
        }
    }
}
