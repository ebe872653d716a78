//! Schema persistence: table definitions stored as data.
//!
//! # Responsibility
//! - Serialize definitions into metadata-table rows and decode them back.
//!
//! # Invariants
//! - Seed records are always stripped before persistence.
//! - Rows are append-only; there is no update path, so repeated first runs
//!   against a populated store produce duplicate rows. The only dedup guard
//!   is the in-memory registry refusing re-registration.
//! - Each persisted row decodes independently; one bad row never blocks the
//!   others.

use log::{debug, info};
use serde_json::Value;

use crate::schema::defaults::schema_table_definition;
use crate::schema::{Record, TableDefinition, SCHEMA_TABLE};
use crate::store::StoreInner;

/// Serializes a definition for persistence, dropping its seed records.
pub fn serialized_schema(definition: &TableDefinition) -> Result<String, serde_json::Error> {
    let mut stripped = definition.clone();
    stripped.seed_records.clear();
    serde_json::to_string(&stripped)
}

/// Inserts one `{name, schema}` row for `table_name` into the metadata
/// table. Failures are reported and the row abandoned.
pub(crate) async fn persist(inner: &StoreInner, table_name: &str) {
    let Some(metadata) = inner.registry.get(SCHEMA_TABLE) else {
        inner
            .faults
            .report(&format!("cannot persist schema for {table_name}: metadata table not registered"));
        return;
    };
    let Some(definition) = inner.registry.get(table_name) else {
        inner
            .faults
            .report(&format!("cannot persist schema for unregistered table {table_name}"));
        return;
    };

    let schema_text = match serialized_schema(&definition) {
        Ok(text) => text,
        Err(err) => {
            inner
                .faults
                .report(&format!("cannot serialize schema for table {table_name}: {err}"));
            return;
        }
    };

    let mut row = Record::new();
    row.insert("name".to_string(), Value::String(table_name.to_string()));
    row.insert("schema".to_string(), Value::String(schema_text));

    let Some(statement) = inner.sql.insert(&metadata, &row) else {
        inner
            .faults
            .report(&format!("cannot build schema insert for table {table_name}"));
        return;
    };
    match inner.driver.execute(&statement).await {
        Ok(_) => debug!("event=schema_saved module=persistence status=ok table={table_name}"),
        Err(err) => inner
            .faults
            .report(&format!("Error processing SQL: {err}")),
    }
}

/// Loads every persisted `(name, schema)` row into the registry.
///
/// Returns whether the select itself succeeded; per-row decode failures are
/// reported and leave that table absent for the session.
pub(crate) async fn load(inner: &StoreInner) -> bool {
    let metadata = schema_table_definition();
    let fields = ["name".to_string(), "schema".to_string()];
    let statement = inner.sql.select(&metadata, Some(&fields), None);

    let outcome = match inner.driver.execute(&statement).await {
        Ok(outcome) => outcome,
        Err(err) => {
            inner
                .faults
                .report(&format!("Error processing SQL: {err}"));
            return false;
        }
    };

    let mut loaded = 0usize;
    for row in &outcome.rows {
        if let Some(definition) = decode_row(inner, row) {
            match inner.registry.register(definition) {
                Ok(()) => loaded += 1,
                Err(err) => inner.faults.report(&err.to_string()),
            }
        }
    }
    info!(
        "event=schema_loaded module=persistence status=ok tables={loaded} rows={}",
        outcome.rows.len()
    );
    true
}

fn decode_row(inner: &StoreInner, row: &Record) -> Option<TableDefinition> {
    let name = row.get("name").and_then(Value::as_str).unwrap_or("?");
    let Some(schema_text) = row.get("schema").and_then(Value::as_str) else {
        inner
            .faults
            .report(&format!("Error parsing schema for table {name}: schema column missing"));
        return None;
    };
    match serde_json::from_str::<TableDefinition>(schema_text) {
        Ok(mut definition) => {
            // The row key is authoritative for the registry, as persisted.
            definition.name = name.to_string();
            Some(definition)
        }
        Err(err) => {
            inner
                .faults
                .report(&format!("Error parsing schema for table {name}: {err}"));
            None
        }
    }
}
