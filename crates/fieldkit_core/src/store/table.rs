//! Per-table accessor handles.
//!
//! # Responsibility
//! - Expose insert/select/count over one table, delegating all SQL text to
//!   the generator and all execution to the driver.
//!
//! # Invariants
//! - Handles exist only behind the settled readiness gate and hold an
//!   immutable snapshot of their table definition.
//! - No validation against `FieldSpec` constraints happens here; that is a
//!   presentation-layer concern.

use std::sync::Arc;

use crate::schema::{Record, TableDefinition};
use crate::store::{StoreError, StoreInner, StoreResult};

/// Options for [`TableHandle::select`].
#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    /// Ordered field names to project; `None` selects all fields.
    pub fields: Option<Vec<String>>,
    /// Caller-supplied, driver-native boolean expression appended to the
    /// statement verbatim. Trusted text from the application layer — it is
    /// passed through uninterpreted, so hostile input here is an injection
    /// vector. Hardening candidate: a structured filter type.
    pub filter: Option<String>,
}

/// Stateless handle over one registered table; cheap to clone and safe to
/// share between readers.
#[derive(Clone)]
pub struct TableHandle {
    inner: Arc<StoreInner>,
    definition: TableDefinition,
}

impl std::fmt::Debug for TableHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableHandle")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

impl TableHandle {
    pub(crate) fn new(inner: Arc<StoreInner>, definition: TableDefinition) -> Self {
        Self { inner, definition }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Snapshot of the table definition taken when the handle was opened.
    pub fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    /// Inserts one record and returns the generated identity value.
    ///
    /// Record fields with no matching definition field are ignored by the
    /// generator; no `FieldSpec` validation is applied.
    ///
    /// # Errors
    /// - [`StoreError::InvalidRecord`] when no record field matches.
    /// - [`StoreError::Driver`] when the statement fails; the failure is
    ///   also reported through the fault surface.
    pub async fn insert(&self, record: &Record) -> StoreResult<i64> {
        let Some(statement) = self.inner.sql.insert(&self.definition, record) else {
            let err = StoreError::InvalidRecord(self.definition.name.clone());
            self.inner.faults.report(&err.to_string());
            return Err(err);
        };
        match self.inner.driver.execute(&statement).await {
            Ok(outcome) => Ok(outcome.last_insert_id),
            Err(err) => {
                self.inner
                    .faults
                    .report(&format!("Error processing SQL: {err}"));
                Err(err.into())
            }
        }
    }

    /// Selects records, returning the raw driver result rows unmodified.
    pub async fn select(&self, options: &SelectOptions) -> StoreResult<Vec<Record>> {
        let statement = self.inner.sql.select(
            &self.definition,
            options.fields.as_deref(),
            options.filter.as_deref(),
        );
        match self.inner.driver.execute(&statement).await {
            Ok(outcome) => Ok(outcome.rows),
            Err(err) => {
                self.inner
                    .faults
                    .report(&format!("Error processing SQL: {err}"));
                Err(err.into())
            }
        }
    }

    /// Returns the number of rows in the table.
    pub async fn count(&self) -> StoreResult<u64> {
        let statement = self.inner.sql.count(&self.definition);
        match self.inner.driver.execute(&statement).await {
            Ok(outcome) => Ok(outcome
                .rows
                .first()
                .and_then(|row| row.get("count"))
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0)),
            Err(err) => {
                self.inner
                    .faults
                    .report(&format!("Error processing SQL: {err}"));
                Err(err.into())
            }
        }
    }
}
