//! The orchestrator: walk the declared catalog, create what is missing,
//! converge what drifted.
//!
//! A run works off a single inventory snapshot taken up front. Each entry is
//! classified as "create" (dataset and/or table absent from the snapshot) or
//! "converge" (both present, so fetch the live table and diff it), and fully
//! processed before the next entry starts. A failing entry is logged and
//! skipped; it never aborts the run. The snapshot is only ever amended with
//! the orchestrator's own successful creations, so later entries in the same
//! run see datasets and tables created earlier in it.

use crate::apply;
use crate::client::WarehouseClient;
use crate::diff::{changed_labels, diff_schema, external_config_changed};
use crate::error::Error;
use crate::policy;
use granary_schema::{Catalog, LiveInventory, TableDescriptor, TableRef};
use tracing::{debug, info, warn};

/// What happened to one catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Dataset and/or table was absent and got created.
    Created,
    /// Drift was detected and a mutation applied.
    Converged,
    /// Live state already matched the declared definition.
    Unchanged,
}

/// Summary of one reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub created: Vec<TableRef>,
    pub converged: Vec<TableRef>,
    pub unchanged: Vec<TableRef>,
    /// Entries that failed, with the rendered error. These are skipped, not
    /// retried; the next run picks them up again.
    pub failed: Vec<(TableRef, String)>,
}

impl RunReport {
    /// True when every entry was processed without error.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.created.len() + self.converged.len() + self.unchanged.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&mut self, table_ref: TableRef, outcome: EntryOutcome) {
        match outcome {
            EntryOutcome::Created => self.created.push(table_ref),
            EntryOutcome::Converged => self.converged.push(table_ref),
            EntryOutcome::Unchanged => self.unchanged.push(table_ref),
        }
    }
}

/// Drives one reconciliation run against one warehouse project.
///
/// Holds the client handle and the inventory snapshot explicitly; there is
/// no ambient state anywhere, and a `Reconciler` is cheap to throw away
/// after its run.
pub struct Reconciler<'a, C> {
    client: &'a C,
    project: String,
    inventory: LiveInventory,
}

impl<'a, C: WarehouseClient> Reconciler<'a, C> {
    /// Snapshot the live inventory of `project` and prepare a run.
    ///
    /// This is the only point where the inventory is read from the
    /// warehouse; a failure here is fatal to the whole run, before any
    /// entry is touched.
    pub async fn connect(client: &'a C, project: impl Into<String>) -> Result<Self, Error> {
        let project = project.into();
        let inventory = snapshot(client, &project).await.map_err(|source| Error::Access {
            project: project.clone(),
            source,
        })?;
        debug!(
            project,
            datasets = inventory.datasets().count(),
            "took inventory snapshot"
        );
        Ok(Self {
            client,
            project,
            inventory,
        })
    }

    /// The inventory as this run currently sees it.
    pub fn inventory(&self) -> &LiveInventory {
        &self.inventory
    }

    /// Process the whole catalog: native entries first, then external, each
    /// group in declaration order. Never reorders, batches, or parallelizes.
    pub async fn run(&mut self, catalog: &Catalog) -> RunReport {
        let mut report = RunReport::default();

        for entry in &catalog.native {
            let desired = entry.descriptor(&self.project);
            self.process(desired, entry.location(), &mut report).await;
        }
        for entry in &catalog.external {
            let desired = entry.descriptor(&self.project);
            self.process(desired, entry.location(), &mut report).await;
        }

        info!(
            created = report.created.len(),
            converged = report.converged.len(),
            unchanged = report.unchanged.len(),
            failed = report.failed.len(),
            "run complete"
        );
        report
    }

    async fn process(&mut self, desired: TableDescriptor, location: &str, report: &mut RunReport) {
        let table_ref = desired.table_ref.clone();
        let result = self.reconcile_one(&desired, location).await;
        match result {
            Ok(outcome) => report.record(table_ref, outcome),
            Err(error) => {
                warn!(
                    dataset = %table_ref.dataset,
                    table = %table_ref.table,
                    %error,
                    "entry skipped"
                );
                report.failed.push((table_ref, error.to_string()));
            }
        }
    }

    async fn reconcile_one(
        &mut self,
        desired: &TableDescriptor,
        location: &str,
    ) -> Result<EntryOutcome, Error> {
        let table_ref = &desired.table_ref;
        let dataset = table_ref.dataset.as_str();

        if !self.inventory.has_dataset(dataset) {
            info!(dataset, location, "creating dataset");
            self.client
                .create_dataset(&self.project, dataset, location)
                .await
                .map_err(|e| Error::mutation("dataset creation", table_ref, e))?;
            self.inventory.record_dataset(dataset.to_string());
            return self.create_table(desired).await;
        }

        if !self.inventory.has_table(dataset, &table_ref.table) {
            return self.create_table(desired).await;
        }

        self.converge(desired).await
    }

    async fn create_table(&mut self, desired: &TableDescriptor) -> Result<EntryOutcome, Error> {
        let table_ref = &desired.table_ref;
        info!(table = %table_ref, kind = %desired.kind(), "creating table");
        self.client
            .create_table(desired)
            .await
            .map_err(|e| Error::mutation("table creation", table_ref, e))?;
        self.inventory
            .record_table(table_ref.dataset.clone(), table_ref.table.clone());
        Ok(EntryOutcome::Created)
    }

    async fn converge(&self, desired: &TableDescriptor) -> Result<EntryOutcome, Error> {
        let table_ref = &desired.table_ref;
        let live = self
            .client
            .get_table(table_ref)
            .await
            .map_err(|e| Error::mutation("table fetch", table_ref, e))?;

        let drift = diff_schema(&live.schema, &desired.schema);
        let labels = changed_labels(&live.labels, &desired.labels);
        let config_changed = match (&live.external, &desired.external) {
            (Some(current), Some(want)) => external_config_changed(current, want),
            (None, None) => false,
            // The table switched between native and external backing, which
            // only a recreate can express.
            _ => true,
        };

        let plan = policy::plan(desired.kind(), &drift, labels, config_changed);
        debug!(
            table = %table_ref,
            added = drift.added.len(),
            removed = drift.removed.len(),
            %plan,
            "planned"
        );

        apply::apply(self.client, desired, &live.schema, &plan).await?;
        Ok(if plan.is_noop() {
            EntryOutcome::Unchanged
        } else {
            EntryOutcome::Converged
        })
    }
}

/// Read the full dataset/table listing of a project, once.
async fn snapshot<C: WarehouseClient>(
    client: &C,
    project: &str,
) -> Result<LiveInventory, crate::client::ClientError> {
    let mut inventory = LiveInventory::new();
    for dataset in client.list_datasets(project).await? {
        inventory.record_dataset(dataset.clone());
        for table in client.list_tables(project, &dataset).await? {
            inventory.record_table(dataset.clone(), table);
        }
    }
    Ok(inventory)
}
