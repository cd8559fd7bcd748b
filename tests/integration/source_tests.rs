use rowdupe::source::{open_input, FieldType, InputFormat, SourceError, SourceOptions};
use tempfile::tempdir;

use super::common::{write_csv, write_parquet};

#[test]
fn test_open_single_csv() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "people.csv", "id,name\n1,a\n2,\n");

    let dataset = open_input(&path, &SourceOptions::default()).unwrap();

    assert_eq!(dataset.schema().names().collect::<Vec<_>>(), ["id", "name"]);
    assert_eq!(dataset.rows().len(), 2);
    assert_eq!(dataset.rows()[1].value(1).as_display(), Some(""));
    assert_eq!(dataset.files(), [path]);
    assert!(!dataset.is_partial());
}

#[test]
fn test_open_csv_skips_malformed_rows() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "a.csv", "id,name\n1,a\n2\n3,c\n");

    let dataset = open_input(&path, &SourceOptions::default()).unwrap();

    assert_eq!(dataset.rows().len(), 2);
    assert_eq!(dataset.skipped_rows(), 1);
    assert_eq!(dataset.rows()[1].value(0).as_display(), Some("3"));
    assert_eq!(dataset.rows()[1].index(), 1);
}

#[test]
fn test_open_custom_delimiter() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "a.csv", "id;name\n1;a\n");
    let options = SourceOptions {
        delimiter: b';',
        ..SourceOptions::default()
    };

    let dataset = open_input(&path, &options).unwrap();
    assert_eq!(dataset.schema().len(), 2);
}

#[test]
fn test_open_single_parquet() {
    let dir = tempdir().unwrap();
    let path = write_parquet(
        dir.path(),
        "data.parquet",
        &[(1, "a", Some("x")), (2, "b", None)],
    );

    let dataset = open_input(&path, &SourceOptions::default()).unwrap();

    let fields = dataset.schema().fields();
    assert_eq!(fields[0].name, "id");
    assert_eq!(fields[0].field_type, FieldType::Integer);
    assert_eq!(fields[1].field_type, FieldType::Utf8);
    assert_eq!(dataset.rows()[0].value(0).as_display(), Some("1"));
    assert_eq!(dataset.rows()[0].value(1).as_display(), Some("a"));
    assert!(dataset.rows()[1].value(2).is_null());
}

#[test]
fn test_open_directory_merges_in_name_order() {
    let dir = tempdir().unwrap();
    write_parquet(dir.path(), "b.parquet", &[(3, "c", None)]);
    write_parquet(dir.path(), "a.parquet", &[(1, "a", None), (2, "b", None)]);
    write_csv(dir.path(), "ignored.csv", "id\n9\n");
    write_parquet(dir.path(), "_hidden.parquet", &[(7, "z", None)]);

    let dataset = open_input(dir.path(), &SourceOptions::default()).unwrap();

    assert_eq!(dataset.files().len(), 2);
    assert!(dataset.files()[0].ends_with("a.parquet"));
    let ids: Vec<&str> = dataset
        .rows()
        .iter()
        .filter_map(|r| r.value(0).as_display())
        .collect();
    assert_eq!(ids, ["1", "2", "3"]);
    let indices: Vec<usize> = dataset.rows().iter().map(|r| r.index()).collect();
    assert_eq!(indices, [0, 1, 2]);
}

#[test]
fn test_open_directory_partial_read() {
    let dir = tempdir().unwrap();
    write_parquet(dir.path(), "good.parquet", &[(1, "a", None)]);
    std::fs::write(dir.path().join("broken.parquet"), b"not a parquet file").unwrap();

    let dataset = open_input(dir.path(), &SourceOptions::default()).unwrap();

    assert!(dataset.is_partial());
    assert_eq!(dataset.failures().len(), 1);
    assert!(dataset.failures()[0].path.ends_with("broken.parquet"));
    assert_eq!(dataset.rows().len(), 1);
}

#[test]
fn test_open_nothing_readable() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("a.parquet"), b"garbage").unwrap();
    std::fs::write(dir.path().join("b.parquet"), b"garbage").unwrap();

    let err = open_input(dir.path(), &SourceOptions::default()).unwrap_err();

    match err {
        SourceError::NoReadableInputs { failures, .. } => assert_eq!(failures.len(), 2),
        other => panic!("Expected NoReadableInputs, got {other:?}"),
    }
}

#[test]
fn test_open_schema_mismatch() {
    let dir = tempdir().unwrap();
    write_csv(dir.path(), "a.csv", "id,name\n1,a\n");
    write_csv(dir.path(), "b.csv", "id,email\n2,b@x\n");

    let err = open_input(dir.path(), &SourceOptions::default()).unwrap_err();
    assert!(matches!(err, SourceError::SchemaMismatch { .. }));

    let options = SourceOptions {
        allow_schema_mismatch: true,
        ..SourceOptions::default()
    };
    let dataset = open_input(dir.path(), &options).unwrap();
    assert_eq!(dataset.schema().names().collect::<Vec<_>>(), ["id", "name"]);
    assert_eq!(dataset.rows().len(), 2);
    assert!(dataset.rows()[1].value(1).is_null());
}

#[test]
fn test_open_unsupported_and_missing() {
    let dir = tempdir().unwrap();
    let json = dir.path().join("data.json");
    std::fs::write(&json, "{}").unwrap();

    assert!(matches!(
        open_input(&json, &SourceOptions::default()),
        Err(SourceError::UnsupportedInput(_))
    ));
    assert!(matches!(
        open_input(dir.path(), &SourceOptions::default()),
        Err(SourceError::UnsupportedInput(_))
    ));
    assert!(matches!(
        open_input(&dir.path().join("missing.csv"), &SourceOptions::default()),
        Err(SourceError::NotFound(_))
    ));
}

#[test]
fn test_input_format_display() {
    assert_eq!(InputFormat::Columnar.to_string(), "columnar");
    assert_eq!(InputFormat::Delimited.to_string(), "delimited");
}
