use fieldkit_core::{
    FieldSpec, FieldType, Record, SelectOptions, Store, StoreConfig, TableDefinition,
    DefaultSchema, ID_FIELD, SCHEMA_TABLE, VERSION_TABLE,
};
use serde_json::Value;

fn scenario_schema() -> DefaultSchema {
    let metadata = TableDefinition::new(SCHEMA_TABLE)
        .with_field("name", FieldSpec::new(FieldType::String))
        .with_field("schema", FieldSpec::new(FieldType::Text));
    let version = TableDefinition::new(VERSION_TABLE)
        .with_field("version", FieldSpec::new(FieldType::String));

    let mut seed = Record::new();
    seed.insert("name".to_string(), Value::String("Alice".to_string()));
    let person = TableDefinition::new("person")
        .with_field("name", FieldSpec::new(FieldType::String))
        .with_seed_record(seed);

    let mut schema = DefaultSchema::new();
    for def in [metadata, version, person] {
        schema.insert(def.name.clone(), def);
    }
    schema
}

#[tokio::test]
async fn first_run_registers_creates_and_seeds_everything() {
    let store = Store::open_with_schema(&StoreConfig::in_memory(), scenario_schema()).await;

    // Listing excludes the reserved bookkeeping namespace.
    assert_eq!(store.names().await, vec!["person".to_string()]);

    // Identity field injected into application tables only.
    let person = store.table("person").await.unwrap();
    assert!(person.definition().has_field(ID_FIELD));
    let version = store.table(VERSION_TABLE).await.unwrap();
    assert!(!version.definition().has_field(ID_FIELD));

    // Exactly one seeded row named Alice.
    let rows = person.select(&SelectOptions::default()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name").and_then(Value::as_str), Some("Alice"));
    assert_eq!(rows[0].get("id").and_then(Value::as_i64), Some(1));

    // One schema row persisted per table, regardless of creation order.
    let metadata = store.table(SCHEMA_TABLE).await.unwrap();
    assert_eq!(metadata.count().await.unwrap(), 3);
}

#[tokio::test]
async fn persisted_schema_rows_never_carry_seed_records() {
    let store = Store::open_with_schema(&StoreConfig::in_memory(), scenario_schema()).await;

    let metadata = store.table(SCHEMA_TABLE).await.unwrap();
    let options = SelectOptions {
        filter: Some("name = 'person'".to_string()),
        ..SelectOptions::default()
    };
    let rows = metadata.select(&options).await.unwrap();
    assert_eq!(rows.len(), 1);

    let schema_text = rows[0].get("schema").and_then(Value::as_str).unwrap();
    let decoded: TableDefinition = serde_json::from_str(schema_text).unwrap();
    assert!(decoded.seed_records.is_empty());
    assert!(decoded.has_field(ID_FIELD));
    assert!(decoded.has_field("name"));
}

#[tokio::test]
async fn underscore_keys_in_default_schema_are_skipped() {
    let mut schema = scenario_schema();
    schema.insert(
        "_meta".to_string(),
        TableDefinition::new("_meta").with_field("note", FieldSpec::new(FieldType::String)),
    );

    let store = Store::open_with_schema(&StoreConfig::in_memory(), schema).await;

    assert_eq!(store.names().await, vec!["person".to_string()]);
    assert!(store.table("_meta").await.is_err());
}

#[tokio::test]
async fn shipped_defaults_bootstrap_end_to_end() {
    let store = Store::open(&StoreConfig::in_memory()).await;

    assert_eq!(store.names().await, vec!["person".to_string()]);

    // The version marker is seeded with the schema format version.
    let version = store.table(VERSION_TABLE).await.unwrap();
    let rows = version.select(&SelectOptions::default()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].get("version").and_then(Value::as_str),
        Some(fieldkit_core::SCHEMA_FORMAT_VERSION)
    );
}
