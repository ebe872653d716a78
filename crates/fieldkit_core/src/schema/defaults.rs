//! Default-schema provider.
//!
//! # Responsibility
//! - Ship the static table definitions used on the first-run path.
//!
//! # Invariants
//! - Underscore-prefixed keys denote non-table metadata and are skipped by
//!   the bootstrap sequencer.
//! - The metadata and version-marker tables are always present in the
//!   defaults; the reload path depends on the metadata table definition.

use std::collections::HashMap;

use super::{FieldSpec, FieldType, Record, TableDefinition, SCHEMA_TABLE, VERSION_TABLE};

/// Schema format version recorded in the version-marker seed row.
pub const SCHEMA_FORMAT_VERSION: &str = "1";

/// Static mapping of table name to definition consumed by bootstrap.
pub type DefaultSchema = HashMap<String, TableDefinition>;

/// Definition of the metadata table `{name, schema}`.
///
/// Kept as a standalone constructor because the reload path needs it before
/// any schema rows have been decoded.
pub fn schema_table_definition() -> TableDefinition {
    TableDefinition::new(SCHEMA_TABLE)
        .with_field("name", FieldSpec::new(FieldType::String))
        .with_field("schema", FieldSpec::new(FieldType::Text))
}

/// Definition of the version-marker sentinel, seeded with the current
/// schema format version. No identity field, by design of the sentinel.
pub fn version_table_definition() -> TableDefinition {
    let mut seed = Record::new();
    seed.insert(
        "version".to_string(),
        serde_json::Value::String(SCHEMA_FORMAT_VERSION.to_string()),
    );
    TableDefinition::new(VERSION_TABLE)
        .with_field("version", FieldSpec::new(FieldType::String))
        .with_seed_record(seed)
}

/// Returns the default schema for a fresh store.
pub fn default_schema() -> DefaultSchema {
    let person = TableDefinition::new("person")
        .with_field(
            "first_name",
            FieldSpec::new(FieldType::String)
                .with_label("First Name")
                .with_placeholder("Enter a first name"),
        )
        .with_field(
            "last_name",
            FieldSpec::new(FieldType::String)
                .with_label("Last Name")
                .with_placeholder("Enter a last name"),
        )
        .with_field(
            "date_of_birth",
            FieldSpec::new(FieldType::Date).with_label("Date of Birth"),
        );

    let mut schema = DefaultSchema::new();
    for def in [
        schema_table_definition(),
        version_table_definition(),
        person,
    ] {
        schema.insert(def.name.clone(), def);
    }
    schema
}
