use async_trait::async_trait;
use fieldkit_core::{
    DriverResult, FaultReporter, FieldSpec, FieldType, LogFaultReporter, Record, SelectOptions,
    SqliteDriver, SqliteGenerator, Statement, StatementOutcome, StorageDriver, Store, StoreConfig,
    TableDefinition, DefaultSchema, ID_FIELD, SCHEMA_TABLE, VERSION_TABLE,
};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Driver decorator recording every statement text it executes.
struct RecordingDriver {
    inner: SqliteDriver,
    statements: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl StorageDriver for RecordingDriver {
    async fn execute(&self, statement: &Statement) -> DriverResult<StatementOutcome> {
        self.statements.lock().unwrap().push(statement.sql.clone());
        self.inner.execute(statement).await
    }

    async fn execute_batch(&self, statements: &[Statement]) -> DriverResult<()> {
        {
            let mut log = self.statements.lock().unwrap();
            for statement in statements {
                log.push(statement.sql.clone());
            }
        }
        self.inner.execute_batch(statements).await
    }
}

/// Fault reporter collecting messages for assertions.
struct CollectingReporter {
    messages: Mutex<Vec<String>>,
}

impl CollectingReporter {
    fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
        }
    }

    fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl FaultReporter for CollectingReporter {
    fn report(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

fn test_schema() -> DefaultSchema {
    let metadata = TableDefinition::new(SCHEMA_TABLE)
        .with_field("name", FieldSpec::new(FieldType::String))
        .with_field("schema", FieldSpec::new(FieldType::Text));
    let version = TableDefinition::new(VERSION_TABLE)
        .with_field("version", FieldSpec::new(FieldType::String));

    let mut seed = Record::new();
    seed.insert("name".to_string(), Value::String("Alice".to_string()));
    let person = TableDefinition::new("person")
        .with_field(
            "name",
            FieldSpec::new(FieldType::String).with_label("Name"),
        )
        .with_seed_record(seed);

    let mut schema = DefaultSchema::new();
    for def in [metadata, version, person] {
        schema.insert(def.name.clone(), def);
    }
    schema
}

async fn populate(path: &Path) {
    let store = Store::open_with_schema(&StoreConfig::at_path(path), test_schema()).await;
    // Await readiness before dropping the store.
    assert_eq!(store.names().await, vec!["person".to_string()]);
}

#[tokio::test]
async fn reopening_takes_reload_path_without_create_statements() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fieldkit.db");
    populate(&path).await;

    let statements = Arc::new(Mutex::new(Vec::new()));
    let driver = RecordingDriver {
        inner: SqliteDriver::open(&StoreConfig::at_path(&path)).unwrap(),
        statements: Arc::clone(&statements),
    };
    let store = Store::with_collaborators(
        Arc::new(driver),
        Arc::new(SqliteGenerator),
        Arc::new(LogFaultReporter),
        test_schema(),
    );

    assert_eq!(store.names().await, vec!["person".to_string()]);
    let executed = statements.lock().unwrap().clone();
    assert!(!executed.is_empty());
    assert!(executed
        .iter()
        .all(|sql| !sql.contains("CREATE TABLE") && !sql.contains("DROP TABLE")));
}

#[tokio::test]
async fn reload_restores_definitions_without_rerunning_seeds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fieldkit.db");
    populate(&path).await;

    let store = Store::open_with_schema(&StoreConfig::at_path(&path), test_schema()).await;

    let person = store.table("person").await.unwrap();
    assert!(person.definition().has_field(ID_FIELD));
    // Presentation metadata survives the persistence round trip.
    assert_eq!(
        person.definition().field("name").unwrap().label.as_deref(),
        Some("Name")
    );
    // Seeds ran once, on the first run only.
    assert_eq!(person.count().await.unwrap(), 1);
}

#[tokio::test]
async fn undecodable_schema_row_leaves_that_table_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fieldkit.db");
    populate(&path).await;

    // Corrupt one schema row behind the store's back.
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute(
        "UPDATE fk_schema SET schema = 'not json' WHERE name = 'person';",
        [],
    )
    .unwrap();
    drop(conn);

    let reporter = Arc::new(CollectingReporter::new());
    let store = Store::with_collaborators(
        Arc::new(SqliteDriver::open(&StoreConfig::at_path(&path)).unwrap()),
        Arc::new(SqliteGenerator),
        Arc::clone(&reporter) as Arc<dyn FaultReporter>,
        test_schema(),
    );

    // Other rows still load; the bad one is absent for the session.
    assert!(store.names().await.is_empty());
    assert!(store.table(SCHEMA_TABLE).await.is_ok());
    assert!(store.table("person").await.is_err());
    assert!(reporter
        .messages()
        .iter()
        .any(|message| message.contains("Error parsing schema for table person")));
}

#[tokio::test]
async fn missing_version_marker_forces_a_full_first_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fieldkit.db");
    populate(&path).await;

    // Dropping the version marker makes the next open look like a first run;
    // drop-then-create discards the previous contents wholesale.
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute("DROP TABLE fk_version;", []).unwrap();
    conn.execute(
        "INSERT INTO person (name) VALUES ('Bob');",
        [],
    )
    .unwrap();
    drop(conn);

    let store = Store::open_with_schema(&StoreConfig::at_path(&path), test_schema()).await;
    let person = store.table("person").await.unwrap();
    // Bob is gone; only the fresh seed row remains.
    assert_eq!(person.count().await.unwrap(), 1);
    let metadata = store.table(SCHEMA_TABLE).await.unwrap();
    assert_eq!(metadata.count().await.unwrap(), 3);
}
