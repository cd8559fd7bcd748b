use std::collections::BTreeMap;

use rowdupe::fields::{
    ColumnHint, FieldResolver, PrimaryKeyHints, ResolutionNotice, ResolveError,
    SelectionMechanism, SelectionRequest,
};
use rowdupe::source::Schema;

fn schema() -> Schema {
    Schema::from_names(["id", "name", "ts"]).unwrap()
}

fn hints(pattern: &str, columns: &[(&str, bool)]) -> PrimaryKeyHints {
    let mut entries = BTreeMap::new();
    entries.insert(
        pattern.to_string(),
        columns
            .iter()
            .map(|(name, pk)| ColumnHint::new(*name, *pk))
            .collect(),
    );
    PrimaryKeyHints::new(entries)
}

#[test]
fn test_indices_select_by_position() {
    let schema = schema();
    let request = SelectionRequest::new().with_indices([0]);

    let resolution = FieldResolver::new(&schema).resolve(&request).unwrap();

    assert_eq!(resolution.keys.names(), ["id"]);
    assert_eq!(
        resolution.mechanism,
        Some(SelectionMechanism::ExplicitIndices)
    );
}

#[test]
fn test_indices_keep_supplied_order() {
    let schema = schema();
    let request = SelectionRequest::new().with_indices([2, 0, 7]);

    let resolution = FieldResolver::new(&schema).resolve(&request).unwrap();

    assert_eq!(resolution.keys.names(), ["ts", "id"]);
    let dropped = ResolutionNotice::OutOfRangeIndices {
        indices: vec![7],
        column_count: 3,
    };
    assert!(resolution.notices.contains(&dropped));
}

#[test]
fn test_nothing_supplied_uses_all_fields() {
    let schema = schema();

    let resolution = FieldResolver::new(&schema)
        .resolve(&SelectionRequest::new())
        .unwrap();

    assert_eq!(resolution.keys.names(), ["id", "name", "ts"]);
    assert_eq!(resolution.mechanism, None);
    assert_eq!(
        resolution.notices,
        vec![ResolutionNotice::UsingAllFields { count: 3 }]
    );
}

#[test]
fn test_only_invalid_fields_is_fatal() {
    let schema = schema();
    let request = SelectionRequest::new().with_fields(["bogus"]);

    let err = FieldResolver::new(&schema).resolve(&request).unwrap_err();

    assert_eq!(
        err,
        ResolveError::NoValidFields {
            requested: vec!["bogus".to_string()]
        }
    );
}

#[test]
fn test_fields_case_insensitive_with_schema_spelling() {
    let schema = Schema::from_names(["ID", "Name"]).unwrap();
    let request = SelectionRequest::new().with_fields(["name", "id", "nope"]);

    let resolution = FieldResolver::new(&schema).resolve(&request).unwrap();

    assert_eq!(resolution.keys.names(), ["Name", "ID"]);
    assert_eq!(resolution.keys.positions(), [1, 0]);
    let invalid = resolution.notices.iter().any(|n| {
        matches!(n, ResolutionNotice::InvalidFields { names, .. } if names == &["nope"])
    });
    assert!(invalid);
}

#[test]
fn test_fields_win_over_indices_and_hints() {
    let schema = schema();
    let request = SelectionRequest::new()
        .with_fields(["name"])
        .with_indices([0])
        .with_hints(hints("*", &[("ts", true)]), "data.csv");

    let resolution = FieldResolver::new(&schema).resolve(&request).unwrap();

    assert_eq!(resolution.keys.names(), ["name"]);
    assert_eq!(
        resolution.notices[0],
        ResolutionNotice::IgnoredMechanisms {
            used: SelectionMechanism::ExplicitFields,
            ignored: vec![
                SelectionMechanism::ExplicitIndices,
                SelectionMechanism::ConfigHints
            ],
        }
    );
    assert_eq!(
        resolution.notices[0].to_string(),
        "Using explicit fields; ignoring column indices and primary-key hints"
    );
}

#[test]
fn test_indices_win_over_hints() {
    let schema = schema();
    let request = SelectionRequest::new()
        .with_indices([1])
        .with_hints(hints("*", &[("ts", true)]), "data.csv");

    let resolution = FieldResolver::new(&schema).resolve(&request).unwrap();

    assert_eq!(resolution.keys.names(), ["name"]);
    assert_eq!(
        resolution.notices[0],
        ResolutionNotice::IgnoredMechanisms {
            used: SelectionMechanism::ExplicitIndices,
            ignored: vec![SelectionMechanism::ConfigHints],
        }
    );
}

#[test]
fn test_hints_select_primary_key_columns() {
    let schema = schema();
    let request = SelectionRequest::new().with_hints(
        hints("orders.csv", &[("ts", true), ("name", false), ("id", true)]),
        "orders.csv",
    );

    let resolution = FieldResolver::new(&schema).resolve(&request).unwrap();

    assert_eq!(resolution.keys.names(), ["ts", "id"]);
    assert_eq!(resolution.mechanism, Some(SelectionMechanism::ConfigHints));
}

#[test]
fn test_hints_without_entry_fall_through_to_all_fields() {
    let schema = schema();
    let request =
        SelectionRequest::new().with_hints(hints("other.csv", &[("id", true)]), "orders.csv");

    let resolution = FieldResolver::new(&schema).resolve(&request).unwrap();

    assert_eq!(resolution.keys.len(), 3);
    assert_eq!(resolution.mechanism, None);
    assert!(resolution
        .notices
        .iter()
        .any(|n| n.to_string() == "No config entry found for 'orders.csv'"));
}

#[test]
fn test_hints_wildcard_fallback() {
    let schema = schema();
    let request = SelectionRequest::new().with_hints(hints("*", &[("name", true)]), "orders.csv");

    let resolution = FieldResolver::new(&schema).resolve(&request).unwrap();

    assert_eq!(resolution.keys.names(), ["name"]);
}
