//! SQL generator seam and SQLite dialect implementation.
//!
//! # Responsibility
//! - Produce all statement text and bound parameters consumed by the core.
//!
//! # Invariants
//! - The core never assembles SQL text outside this module.
//! - Insert parameters follow the field order of the table definition.

use serde_json::Value;

use crate::schema::{FieldType, Record, TableDefinition};
use crate::store::driver::Statement;

/// Statement generator contract.
///
/// Implementations own the storage dialect; the core treats returned text
/// as opaque.
pub trait SqlGenerator: Send + Sync {
    fn drop_table(&self, table: &TableDefinition) -> Statement;

    fn create_table(&self, table: &TableDefinition) -> Statement;

    /// Builds a parameterized insert for the record fields that exist in the
    /// table definition. Returns `None` when no record field matches.
    fn insert(&self, table: &TableDefinition, record: &Record) -> Option<Statement>;

    /// Builds a select over `fields` (all fields when `None`) with an
    /// optional caller-supplied boolean filter expression appended verbatim.
    fn select(
        &self,
        table: &TableDefinition,
        fields: Option<&[String]>,
        filter: Option<&str>,
    ) -> Statement;

    fn count(&self, table: &TableDefinition) -> Statement;

    /// Probe for the existence of a table, yielding one row when present.
    fn table_exists(&self, table_name: &str) -> Statement;
}

/// SQLite dialect generator.
#[derive(Debug, Default)]
pub struct SqliteGenerator;

impl SqlGenerator for SqliteGenerator {
    fn drop_table(&self, table: &TableDefinition) -> Statement {
        Statement::new(format!(
            "DROP TABLE IF EXISTS {};",
            quote_identifier(&table.name)
        ))
    }

    fn create_table(&self, table: &TableDefinition) -> Statement {
        let columns: Vec<String> = table
            .fields
            .iter()
            .map(|field| {
                let mut column = format!(
                    "{} {}",
                    quote_identifier(&field.name),
                    column_type(field.spec.field_type)
                );
                if let Some(default) = &field.spec.default_value {
                    column.push_str(" DEFAULT ");
                    column.push_str(&literal(default));
                }
                column
            })
            .collect();

        Statement::new(format!(
            "CREATE TABLE {} ({});",
            quote_identifier(&table.name),
            columns.join(", ")
        ))
    }

    fn insert(&self, table: &TableDefinition, record: &Record) -> Option<Statement> {
        let mut columns = Vec::new();
        let mut params = Vec::new();
        // Definition order keeps statements deterministic; record keys with
        // no matching field are ignored.
        for field in &table.fields {
            if let Some(value) = record.get(&field.name) {
                columns.push(quote_identifier(&field.name));
                params.push(value.clone());
            }
        }
        if columns.is_empty() {
            return None;
        }

        let placeholders: Vec<String> = (1..=params.len()).map(|n| format!("?{n}")).collect();
        Some(Statement::with_params(
            format!(
                "INSERT INTO {} ({}) VALUES ({});",
                quote_identifier(&table.name),
                columns.join(", "),
                placeholders.join(", ")
            ),
            params,
        ))
    }

    fn select(
        &self,
        table: &TableDefinition,
        fields: Option<&[String]>,
        filter: Option<&str>,
    ) -> Statement {
        let projection = match fields {
            Some(names) if !names.is_empty() => names
                .iter()
                .map(|name| quote_identifier(name))
                .collect::<Vec<_>>()
                .join(", "),
            _ => "*".to_string(),
        };

        let mut sql = format!("SELECT {} FROM {}", projection, quote_identifier(&table.name));
        if let Some(expression) = filter {
            sql.push_str(" WHERE ");
            sql.push_str(expression);
        }
        sql.push(';');
        Statement::new(sql)
    }

    fn count(&self, table: &TableDefinition) -> Statement {
        Statement::new(format!(
            "SELECT COUNT(*) AS count FROM {};",
            quote_identifier(&table.name)
        ))
    }

    fn table_exists(&self, table_name: &str) -> Statement {
        Statement::with_params(
            "SELECT DISTINCT tbl_name FROM sqlite_master WHERE tbl_name = ?1;",
            vec![Value::String(table_name.to_string())],
        )
    }
}

fn column_type(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Id => "INTEGER PRIMARY KEY",
        FieldType::Integer | FieldType::Boolean => "INTEGER",
        FieldType::Real => "REAL",
        FieldType::String
        | FieldType::Text
        | FieldType::Url
        | FieldType::Password
        | FieldType::Date
        | FieldType::Json => "TEXT",
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(flag) => if *flag { "1" } else { "0" }.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => quote_text(text),
        other => quote_text(&other.to_string()),
    }
}

fn quote_text(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
