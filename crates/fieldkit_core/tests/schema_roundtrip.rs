use fieldkit_core::{FieldSpec, FieldType, Record, TableDefinition};
use serde_json::Value;

fn rich_definition() -> TableDefinition {
    let mut seed = Record::new();
    seed.insert("url".to_string(), Value::String("https://example.org".into()));

    TableDefinition::new("server")
        .with_field("id", FieldSpec::new(FieldType::Id))
        .with_field(
            "url",
            FieldSpec::new(FieldType::Url)
                .with_label("Server URL")
                .with_placeholder("Enter the server URL")
                .with_validation(r"^https?://\S+$"),
        )
        .with_field(
            "username",
            FieldSpec::new(FieldType::String).with_label("Username"),
        )
        .with_field(
            "password",
            FieldSpec::new(FieldType::Password).with_label("Password"),
        )
        .with_field(
            "active",
            FieldSpec::new(FieldType::Boolean).with_default(Value::Bool(true)),
        )
        .with_seed_record(seed)
}

#[test]
fn serde_round_trip_preserves_every_property() {
    let definition = rich_definition();
    let text = serde_json::to_string(&definition).unwrap();
    let decoded: TableDefinition = serde_json::from_str(&text).unwrap();

    assert_eq!(decoded, definition);
}

#[test]
fn persisted_form_differs_only_in_seed_records() {
    let definition = rich_definition();
    let text = fieldkit_core::store::persistence::serialized_schema(&definition).unwrap();
    let decoded: TableDefinition = serde_json::from_str(&text).unwrap();

    assert!(decoded.seed_records.is_empty());
    assert_eq!(decoded.name, definition.name);
    assert_eq!(decoded.fields, definition.fields);

    // Presentation metadata and the validation pattern pass through inert.
    let url = decoded.field("url").unwrap();
    assert_eq!(url.label.as_deref(), Some("Server URL"));
    assert_eq!(url.placeholder.as_deref(), Some("Enter the server URL"));
    assert!(url.accepts("https://example.org/eden").unwrap());
    assert!(!url.accepts("file:///etc/passwd").unwrap());
}

#[test]
fn field_order_survives_the_round_trip() {
    let definition = rich_definition();
    let text = serde_json::to_string(&definition).unwrap();
    let decoded: TableDefinition = serde_json::from_str(&text).unwrap();

    let names: Vec<&str> = decoded.fields.iter().map(|field| field.name.as_str()).collect();
    assert_eq!(names, vec!["id", "url", "username", "password", "active"]);
}
