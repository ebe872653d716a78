//! Bootstrap sequencer: first run, reload, and the completion barrier.
//!
//! # Responsibility
//! - Decide between the first-run and reload paths via the version-marker
//!   probe, drive table creation/seeding or schema reload, and settle the
//!   readiness gate.
//!
//! # Invariants
//! - The pending-table barrier is fully populated before any definition
//!   task is issued; completions may arrive in any order and count once
//!   per table.
//! - The gate settles exactly once per session.
//! - A driver failure is reported and its operation abandoned; bootstrap
//!   never fails the gate, so a mid-barrier failure leaves it unsettled
//!   indefinitely. Known liveness hazard, kept deliberately; see DESIGN.md.

use log::info;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::schema::defaults::DefaultSchema;
use crate::schema::{TableDefinition, VERSION_TABLE};
use crate::store::{persistence, StoreInner};

/// Outcome of marking one table done in the barrier.
#[derive(Debug, PartialEq, Eq)]
enum BarrierState {
    /// Other tables are still pending.
    Pending,
    /// This completion was the last one.
    Complete,
    /// The table was unknown to, or already counted by, this barrier.
    NotCounted,
}

/// Completion barrier keyed by table name, built fresh per bootstrap run.
struct PendingTableSet {
    tables: Mutex<HashMap<String, bool>>,
}

impl PendingTableSet {
    fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            tables: Mutex::new(names.into_iter().map(|name| (name, false)).collect()),
        }
    }

    fn is_empty(&self) -> bool {
        self.tables
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .is_empty()
    }

    fn mark_done(&self, name: &str) -> BarrierState {
        let mut tables = self.tables.lock().unwrap_or_else(|err| err.into_inner());
        match tables.get_mut(name) {
            Some(done) if !*done => *done = true,
            _ => return BarrierState::NotCounted,
        }
        if tables.values().all(|done| *done) {
            BarrierState::Complete
        } else {
            BarrierState::Pending
        }
    }
}

/// Entry point spawned by the store constructor.
pub(crate) async fn run(inner: Arc<StoreInner>, schema: DefaultSchema) {
    let probe = inner.sql.table_exists(VERSION_TABLE);
    match inner.driver.execute(&probe).await {
        Ok(outcome) if outcome.rows.is_empty() => first_run(inner, schema).await,
        Ok(_) => reload(inner).await,
        Err(err) => {
            // Abandoned; the gate stays unsettled.
            inner
                .faults
                .report(&format!("Error processing SQL: {err}"));
        }
    }
}

/// Creates and seeds every table of the default schema.
async fn first_run(inner: Arc<StoreInner>, schema: DefaultSchema) {
    info!(
        "event=bootstrap module=bootstrap status=start mode=first_run tables={}",
        schema.len()
    );

    // Underscore keys denote non-table metadata. The barrier is complete
    // before any definition is issued.
    let definitions: Vec<TableDefinition> = schema
        .into_iter()
        .filter(|(name, _)| !name.starts_with('_'))
        .map(|(_, definition)| definition)
        .collect();
    let pending = Arc::new(PendingTableSet::new(
        definitions.iter().map(|definition| definition.name.clone()),
    ));

    if pending.is_empty() {
        inner.gate.settle();
        return;
    }

    for definition in definitions {
        tokio::spawn(define_table(
            Arc::clone(&inner),
            Arc::clone(&pending),
            definition,
        ));
    }
}

/// Creates one table, registers it, persists due schemas, inserts seed
/// records, and reports completion to the barrier.
///
/// Any driver failure abandons the remainder of this table's work without
/// completing it.
async fn define_table(
    inner: Arc<StoreInner>,
    pending: Arc<PendingTableSet>,
    mut definition: TableDefinition,
) {
    definition.ensure_id_field();

    let ddl = [
        inner.sql.drop_table(&definition),
        inner.sql.create_table(&definition),
    ];
    if let Err(err) = inner.driver.execute_batch(&ddl).await {
        inner
            .faults
            .report(&format!("Error processing SQL: {err}"));
        return;
    }

    // Registration and the persistence plan are decided under one lock;
    // the metadata table sweeps up everything registered before it existed.
    let persist_plan = match inner.registry.register_for_bootstrap(definition.clone()) {
        Ok(plan) => plan,
        Err(err) => {
            inner.faults.report(&err.to_string());
            return;
        }
    };
    info!(
        "event=table_created module=bootstrap status=ok table={}",
        definition.name
    );
    for table_name in &persist_plan {
        persistence::persist(&inner, table_name).await;
    }

    let seeds: Vec<_> = definition
        .seed_records
        .iter()
        .filter_map(|record| inner.sql.insert(&definition, record))
        .collect();
    if !seeds.is_empty() {
        if let Err(err) = inner.driver.execute_batch(&seeds).await {
            inner
                .faults
                .report(&format!("Error processing SQL: {err}"));
            return;
        }
        info!(
            "event=table_seeded module=bootstrap status=ok table={} records={}",
            definition.name,
            seeds.len()
        );
    }

    match pending.mark_done(&definition.name) {
        BarrierState::Complete => {
            info!("event=bootstrap module=bootstrap status=ok mode=first_run");
            inner.gate.settle();
        }
        BarrierState::Pending => {}
        BarrierState::NotCounted => inner.faults.report(&format!(
            "completion for table {} not counted by the bootstrap barrier",
            definition.name
        )),
    }
}

/// Reloads every persisted schema into the registry.
async fn reload(inner: Arc<StoreInner>) {
    info!("event=bootstrap module=bootstrap status=start mode=reload");
    if persistence::load(&inner).await {
        info!("event=bootstrap module=bootstrap status=ok mode=reload");
        inner.gate.settle();
    }
}
