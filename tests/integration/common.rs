//! Fixture builders shared by the integration tests.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parquet::data_type::{ByteArray, ByteArrayType, Int32Type};
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::parser::parse_message_type;

pub fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Write a parquet file with `id INT32`, `name UTF8` and an optional
/// `note UTF8` column (`None` written as null).
pub fn write_parquet(dir: &Path, name: &str, rows: &[(i32, &str, Option<&str>)]) -> PathBuf {
    let path = dir.join(name);
    let schema = Arc::new(
        parse_message_type(
            "message schema {
                REQUIRED INT32 id;
                REQUIRED BINARY name (UTF8);
                OPTIONAL BINARY note (UTF8);
            }",
        )
        .unwrap(),
    );
    let props = Arc::new(WriterProperties::builder().build());
    let file = File::create(&path).unwrap();
    let mut writer = SerializedFileWriter::new(file, schema, props).unwrap();
    let mut row_group = writer.next_row_group().unwrap();

    let ids: Vec<i32> = rows.iter().map(|r| r.0).collect();
    let names: Vec<ByteArray> = rows.iter().map(|r| ByteArray::from(r.1)).collect();
    let notes: Vec<ByteArray> = rows
        .iter()
        .filter_map(|r| r.2)
        .map(ByteArray::from)
        .collect();
    let note_levels: Vec<i16> = rows.iter().map(|r| i16::from(r.2.is_some())).collect();

    let mut col = row_group.next_column().unwrap().unwrap();
    col.typed::<Int32Type>()
        .write_batch(&ids, None, None)
        .unwrap();
    col.close().unwrap();

    let mut col = row_group.next_column().unwrap().unwrap();
    col.typed::<ByteArrayType>()
        .write_batch(&names, None, None)
        .unwrap();
    col.close().unwrap();

    let mut col = row_group.next_column().unwrap().unwrap();
    col.typed::<ByteArrayType>()
        .write_batch(&notes, Some(&note_levels), None)
        .unwrap();
    col.close().unwrap();

    row_group.close().unwrap();
    writer.close().unwrap();
    path
}
