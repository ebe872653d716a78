//! Core storage for the FieldKit mobile data-collection client.
//! This crate is the single source of truth for schema bootstrap, schema
//! persistence and gated table access.

pub mod logging;
pub mod schema;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status};
pub use schema::defaults::{default_schema, DefaultSchema, SCHEMA_FORMAT_VERSION};
pub use schema::{
    Field, FieldSpec, FieldType, Record, TableDefinition, ID_FIELD, RESERVED_PREFIX, SCHEMA_TABLE,
    VERSION_TABLE,
};
pub use store::driver::{
    DriverError, DriverResult, SqliteDriver, Statement, StatementOutcome, StorageDriver,
    StoreConfig, UnavailableDriver,
};
pub use store::fault::{FaultReporter, LogFaultReporter};
pub use store::sql::{SqlGenerator, SqliteGenerator};
pub use store::table::{SelectOptions, TableHandle};
pub use store::{Store, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
