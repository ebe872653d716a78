//! Store session: bootstrap orchestration entry points and gated access.
//!
//! # Responsibility
//! - Own all per-session state (registry, readiness gate, collaborators).
//! - Expose the public open/table/names surface.
//!
//! # Invariants
//! - Every path that reads the registry or issues user SQL awaits the
//!   readiness gate first; a partially populated registry is never observed.
//! - Exactly one driver handle is shared per store.

use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod bootstrap;
pub mod driver;
pub mod fault;
pub mod gate;
pub mod persistence;
pub mod registry;
pub mod sql;
pub mod table;

use crate::schema::defaults::{default_schema, DefaultSchema};
use driver::{DriverError, SqliteDriver, StorageDriver, StoreConfig, UnavailableDriver};
use fault::{FaultReporter, LogFaultReporter};
use gate::ReadyGate;
use registry::SchemaRegistry;
use sql::{SqlGenerator, SqliteGenerator};
use table::TableHandle;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    /// A statement or open failure at the storage engine.
    Driver(DriverError),
    /// A persisted schema row could not be decoded.
    SchemaDecode {
        table: String,
        source: serde_json::Error,
    },
    /// Attempt to register a table name already present in the registry.
    DuplicateDefinition(String),
    /// Accessor request for a name absent from the registry.
    UnknownTable(String),
    /// Insert record with no field matching the table definition.
    InvalidRecord(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Driver(err) => write!(f, "{err}"),
            Self::SchemaDecode { table, source } => {
                write!(f, "cannot decode persisted schema for table {table}: {source}")
            }
            Self::DuplicateDefinition(name) => write!(f, "redefinition of table {name}"),
            Self::UnknownTable(name) => write!(f, "unknown table {name}"),
            Self::InvalidRecord(table) => {
                write!(f, "record has no field matching table {table}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Driver(err) => Some(err),
            Self::SchemaDecode { source, .. } => Some(source),
            Self::DuplicateDefinition(_) | Self::UnknownTable(_) | Self::InvalidRecord(_) => None,
        }
    }
}

impl From<DriverError> for StoreError {
    fn from(value: DriverError) -> Self {
        Self::Driver(value)
    }
}

pub(crate) struct StoreInner {
    pub(crate) driver: Arc<dyn StorageDriver>,
    pub(crate) sql: Arc<dyn SqlGenerator>,
    pub(crate) faults: Arc<dyn FaultReporter>,
    pub(crate) registry: SchemaRegistry,
    pub(crate) gate: ReadyGate,
}

/// Handle to one schema-driven local store session.
///
/// Cheap to clone; all clones share the same session state.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Opens the store with the shipped default schema.
    ///
    /// Never fails: an engine open failure falls back to a degraded
    /// in-memory session seeded from the defaults (availability over
    /// durability).
    pub async fn open(config: &StoreConfig) -> Store {
        Self::open_with_schema(config, default_schema()).await
    }

    /// Opens the store with a caller-provided default schema.
    pub async fn open_with_schema(config: &StoreConfig, schema: DefaultSchema) -> Store {
        let faults: Arc<dyn FaultReporter> = Arc::new(LogFaultReporter);
        match SqliteDriver::open(config) {
            Ok(driver) => Self::with_collaborators(
                Arc::new(driver),
                Arc::new(SqliteGenerator),
                faults,
                schema,
            ),
            Err(err) => Self::degraded(schema, faults, &err),
        }
    }

    /// Assembles a store over caller-supplied collaborators and launches
    /// bootstrap in the background. Requires a running tokio runtime.
    pub fn with_collaborators(
        driver: Arc<dyn StorageDriver>,
        sql: Arc<dyn SqlGenerator>,
        faults: Arc<dyn FaultReporter>,
        schema: DefaultSchema,
    ) -> Store {
        let inner = Arc::new(StoreInner {
            driver,
            sql,
            faults,
            registry: SchemaRegistry::new(),
            gate: ReadyGate::new(),
        });
        tokio::spawn(bootstrap::run(Arc::clone(&inner), schema));
        Store { inner }
    }

    /// Degraded in-memory fallback after an engine open failure: the
    /// registry is seeded straight from the default definitions, nothing is
    /// persisted, and the gate settles immediately.
    fn degraded(
        schema: DefaultSchema,
        faults: Arc<dyn FaultReporter>,
        cause: &DriverError,
    ) -> Store {
        faults.report(&format!("Error opening database: {cause}"));

        let inner = Arc::new(StoreInner {
            driver: Arc::new(UnavailableDriver),
            sql: Arc::new(SqliteGenerator),
            faults,
            registry: SchemaRegistry::new(),
            gate: ReadyGate::new(),
        });
        for (name, definition) in schema {
            // Underscore keys are non-table metadata, not definitions.
            if name.starts_with('_') {
                continue;
            }
            if let Err(err) = inner.registry.register(definition) {
                inner.faults.report(&err.to_string());
            }
        }
        info!(
            "event=store_open module=store status=degraded tables={}",
            inner.registry.len()
        );
        inner.gate.settle();
        Store { inner }
    }

    /// Returns a handle for `name` once bootstrap has completed.
    ///
    /// # Errors
    /// - [`StoreError::UnknownTable`] when the name is not registered.
    pub async fn table(&self, name: &str) -> StoreResult<TableHandle> {
        self.inner.gate.ready().await;
        let definition = self
            .inner
            .registry
            .get(name)
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))?;
        Ok(TableHandle::new(Arc::clone(&self.inner), definition))
    }

    /// Lists registered table names outside the reserved bookkeeping
    /// namespace, once bootstrap has completed.
    pub async fn names(&self) -> Vec<String> {
        self.inner.gate.ready().await;
        self.inner.registry.user_table_names()
    }

    /// Whether the readiness gate has settled. Mainly useful for probes and
    /// tests; access paths await the gate instead of polling this.
    pub fn is_ready(&self) -> bool {
        self.inner.gate.is_settled()
    }
}
