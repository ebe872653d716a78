//! Declarative table schema model.
//!
//! # Responsibility
//! - Define the canonical table/field definition types shared by the
//!   bootstrap sequencer, schema persistence and the table accessors.
//! - Provide identity-field injection for application tables.
//!
//! # Invariants
//! - Every table except the version-marker sentinel carries exactly one
//!   identity field (`id`), injected automatically when absent.
//! - Field order is preserved from definition to CREATE statement.
//! - Presentation metadata (label/help/placeholder) is inert pass-through;
//!   the storage core never interprets it.

use serde::{Deserialize, Serialize};

pub mod defaults;

/// Name of the metadata table holding serialized schemas.
pub const SCHEMA_TABLE: &str = "fk_schema";

/// Name of the version-marker sentinel table. Its existence alone signals
/// "not first run"; it is exempt from identity-field injection.
pub const VERSION_TABLE: &str = "fk_version";

/// Prefix of the internal bookkeeping namespace, excluded from user-facing
/// table listings.
pub const RESERVED_PREFIX: &str = "fk_";

/// Name of the injected identity field.
pub const ID_FIELD: &str = "id";

/// Loosely-typed record: field name mapped to a JSON value.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Type tag for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Auto-generated integer identity.
    Id,
    /// Short single-line text.
    String,
    /// Long free-form text.
    Text,
    /// URL, stored as text.
    Url,
    /// Secret, stored as text; rendering is a presentation concern.
    Password,
    Integer,
    Real,
    Boolean,
    /// ISO date string.
    Date,
    /// Arbitrary JSON, stored serialized.
    Json,
}

/// Per-field definition.
///
/// `label`, `help` and `placeholder` exist for form rendering only and are
/// carried through persistence untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    /// Optional validation predicate as a regex pattern over the input text.
    /// Evaluated by presentation-layer callers via [`FieldSpec::accepts`];
    /// the storage core performs no validation on insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl FieldSpec {
    /// Creates a bare spec of the given type with no defaults or metadata.
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            default_value: None,
            validate: None,
            label: None,
            help: None,
            placeholder: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_validation(mut self, pattern: impl Into<String>) -> Self {
        self.validate = Some(pattern.into());
        self
    }

    /// Evaluates the validation pattern against `input`.
    ///
    /// Returns `Ok(true)` when no pattern is set.
    ///
    /// # Errors
    /// - Returns the compile error when the stored pattern is not a valid
    ///   regular expression.
    pub fn accepts(&self, input: &str) -> Result<bool, regex::Error> {
        match &self.validate {
            Some(pattern) => Ok(regex::Regex::new(pattern)?.is_match(input)),
            None => Ok(true),
        }
    }
}

/// One named field inside a table definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(flatten)]
    pub spec: FieldSpec,
}

/// Declarative definition of one table.
///
/// Created once on the first-run path or reconstructed once on the reload
/// path, then never mutated for the rest of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    /// Ordered field list; order is preserved into the CREATE statement.
    pub fields: Vec<Field>,
    /// Literal rows inserted once at table creation. Always stripped before
    /// schema persistence.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seed_records: Vec<Record>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            seed_records: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.push(Field {
            name: name.into(),
            spec,
        });
        self
    }

    pub fn with_seed_record(mut self, record: Record) -> Self {
        self.seed_records.push(record);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.spec)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Injects the identity field when absent.
    ///
    /// The version-marker sentinel is exempt; every other table must end up
    /// with exactly one identity field.
    pub fn ensure_id_field(&mut self) {
        if self.name == VERSION_TABLE || self.has_field(ID_FIELD) {
            return;
        }
        self.fields.insert(
            0,
            Field {
                name: ID_FIELD.to_string(),
                spec: FieldSpec::new(FieldType::Id),
            },
        );
    }
}

/// Returns whether `name` belongs to the internal bookkeeping namespace
/// hidden from user-facing listings.
pub fn is_reserved_name(name: &str) -> bool {
    name.starts_with('_') || name.starts_with(RESERVED_PREFIX)
}
