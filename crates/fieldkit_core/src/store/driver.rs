//! Storage driver seam and SQLite implementation.
//!
//! # Responsibility
//! - Define the opaque statement-execution contract consumed by the core.
//! - Provide the rusqlite-backed driver used in production.
//!
//! # Invariants
//! - Exactly one driver handle is shared process-wide; the driver serializes
//!   statement execution internally, FIFO, one statement in flight.
//! - `execute_batch` is atomic: all statements run inside one transaction.
//! - The core never constructs SQL text itself; statements arrive fully
//!   formed from the SQL generator.

use async_trait::async_trait;
use log::info;
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::schema::Record;

pub type DriverResult<T> = Result<T, DriverError>;

#[derive(Debug)]
pub enum DriverError {
    /// The storage engine could not be opened at all.
    Open(rusqlite::Error),
    /// A single statement or batch failed at the engine.
    Statement(rusqlite::Error),
    /// The store runs in degraded in-memory mode; no engine is available.
    Unavailable,
}

impl Display for DriverError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open(err) => write!(f, "failed to open storage engine: {err}"),
            Self::Statement(err) => write!(f, "statement failed: {err}"),
            Self::Unavailable => write!(f, "storage engine unavailable"),
        }
    }
}

impl Error for DriverError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open(err) | Self::Statement(err) => Some(err),
            Self::Unavailable => None,
        }
    }
}

/// One parameterized statement: SQL text plus bound values in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Raw result of a single statement, passed to callers unmodified.
#[derive(Debug, Clone, Default)]
pub struct StatementOutcome {
    /// Result rows for queries; empty for DDL/DML.
    pub rows: Vec<Record>,
    /// Rows changed by DML; zero for queries.
    pub rows_affected: usize,
    /// Identity generated by the most recent insert on this handle.
    pub last_insert_id: i64,
}

/// Opaque storage engine contract.
///
/// Implementations must serialize execution internally; callers issue
/// statements concurrently without external locking.
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Executes one statement and returns its raw outcome.
    async fn execute(&self, statement: &Statement) -> DriverResult<StatementOutcome>;

    /// Executes all statements atomically, stopping at the first failure.
    async fn execute_batch(&self, statements: &[Statement]) -> DriverResult<()>;
}

/// Location of the persistent store.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Database file path; `None` opens an in-memory engine.
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self { path: None }
    }

    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

/// rusqlite-backed driver.
///
/// A fair async mutex guards the single connection, which yields the FIFO,
/// one-statement-in-flight execution order the core relies on.
pub struct SqliteDriver {
    conn: Mutex<Connection>,
}

impl SqliteDriver {
    /// Opens the engine at the configured location.
    ///
    /// # Errors
    /// - Returns [`DriverError::Open`] when the engine cannot be opened or
    ///   its connection pragmas cannot be applied.
    pub fn open(config: &StoreConfig) -> DriverResult<Self> {
        let conn = match &config.path {
            Some(path) => Connection::open(path),
            None => Connection::open_in_memory(),
        }
        .map_err(DriverError::Open)?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(DriverError::Open)?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(DriverError::Open)?;

        info!(
            "event=driver_open module=driver status=ok mode={}",
            if config.path.is_some() { "file" } else { "memory" }
        );
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl StorageDriver for SqliteDriver {
    async fn execute(&self, statement: &Statement) -> DriverResult<StatementOutcome> {
        let conn = self.conn.lock().await;
        run_statement(&conn, statement)
    }

    async fn execute_batch(&self, statements: &[Statement]) -> DriverResult<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(DriverError::Statement)?;
        for statement in statements {
            run_statement(&tx, statement)?;
        }
        tx.commit().map_err(DriverError::Statement)
    }
}

fn run_statement(conn: &Connection, statement: &Statement) -> DriverResult<StatementOutcome> {
    let mut prepared = conn
        .prepare(&statement.sql)
        .map_err(DriverError::Statement)?;
    let params = statement.params.iter().map(json_to_sql);

    if prepared.column_count() == 0 {
        let rows_affected = prepared
            .execute(params_from_iter(params))
            .map_err(DriverError::Statement)?;
        return Ok(StatementOutcome {
            rows: Vec::new(),
            rows_affected,
            last_insert_id: conn.last_insert_rowid(),
        });
    }

    let column_names: Vec<String> = prepared
        .column_names()
        .into_iter()
        .map(str::to_owned)
        .collect();
    let mut rows = prepared
        .query(params_from_iter(params))
        .map_err(DriverError::Statement)?;

    let mut result = Vec::new();
    while let Some(row) = rows.next().map_err(DriverError::Statement)? {
        let mut record = Record::new();
        for (index, name) in column_names.iter().enumerate() {
            let value = row.get_ref(index).map_err(DriverError::Statement)?;
            record.insert(name.clone(), sql_to_json(value));
        }
        result.push(record);
    }

    Ok(StatementOutcome {
        rows: result,
        rows_affected: 0,
        last_insert_id: conn.last_insert_rowid(),
    })
}

fn json_to_sql(value: &Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as SqlValue;
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        Value::Number(number) => number
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| number.as_f64().map(SqlValue::Real))
            .unwrap_or(SqlValue::Null),
        Value::String(text) => SqlValue::Text(text.clone()),
        // Structured values are stored serialized.
        other => SqlValue::Text(other.to_string()),
    }
}

fn sql_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(number) => Value::from(number),
        ValueRef::Real(number) => Value::from(number),
        ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(blob) => Value::String(String::from_utf8_lossy(blob).into_owned()),
    }
}

/// Stand-in driver for degraded in-memory mode after an open failure.
///
/// Every statement fails; callers see the same abandoned-operation behavior
/// as any other statement failure.
pub struct UnavailableDriver;

#[async_trait]
impl StorageDriver for UnavailableDriver {
    async fn execute(&self, _statement: &Statement) -> DriverResult<StatementOutcome> {
        Err(DriverError::Unavailable)
    }

    async fn execute_batch(&self, _statements: &[Statement]) -> DriverResult<()> {
        Err(DriverError::Unavailable)
    }
}
