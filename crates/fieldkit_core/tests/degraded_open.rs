use fieldkit_core::{Record, Store, StoreConfig, StoreError, DriverError};
use serde_json::Value;

#[tokio::test]
async fn open_failure_falls_back_to_in_memory_defaults() {
    // Pointing the database file at an existing directory makes the engine
    // open fail, which must degrade instead of erroring out.
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&StoreConfig::at_path(dir.path())).await;

    // The gate settles immediately; no bootstrap barrier is involved.
    assert!(store.is_ready());
    assert_eq!(store.names().await, vec!["person".to_string()]);
}

#[tokio::test]
async fn degraded_store_reports_statement_failures_on_access() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&StoreConfig::at_path(dir.path())).await;

    let person = store.table("person").await.unwrap();

    let mut record = Record::new();
    record.insert("first_name".to_string(), Value::String("Alice".into()));
    let err = person.insert(&record).await.unwrap_err();
    assert!(matches!(err, StoreError::Driver(DriverError::Unavailable)));

    let err = person.count().await.unwrap_err();
    assert!(matches!(err, StoreError::Driver(DriverError::Unavailable)));
}
