//! Columnar (Parquet) reader.
//!
//! Uses the parquet crate's row API: the top-level fields of the file schema
//! become the [`Schema`], and every record is projected onto display strings.

use std::fs::File;
use std::path::Path;

use parquet::basic::{ConvertedType, LogicalType, Type as PhysicalType};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field as ParquetField;
use parquet::schema::types::Type as SchemaType;

use super::{
    CompositeKind, Field, FieldType, InputFormat, Schema, SourceError, Table, TableReader, Value,
};

/// Reader for `.parquet` files.
#[derive(Debug, Clone, Default)]
pub struct ColumnarReader;

impl ColumnarReader {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TableReader for ColumnarReader {
    fn format(&self) -> InputFormat {
        InputFormat::Columnar
    }

    fn read_table(&self, path: &Path) -> Result<Table, SourceError> {
        let parquet_err = |source| SourceError::Parquet {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = SerializedFileReader::new(file).map_err(parquet_err)?;

        let root = reader.metadata().file_metadata().schema();
        let schema = Schema::new(
            root.get_fields()
                .iter()
                .map(|ty| Field::new(ty.name(), field_type(ty)))
                .collect(),
        )
        .map_err(|name| SourceError::InvalidSchema {
            path: path.to_path_buf(),
            reason: format!("repeated column name '{name}'"),
        })?;

        let mut rows = Vec::with_capacity(
            usize::try_from(reader.metadata().file_metadata().num_rows()).unwrap_or(0),
        );
        for record in reader.get_row_iter(None).map_err(parquet_err)? {
            let record = record.map_err(parquet_err)?;
            let mut values = vec![Value::Null; schema.len()];
            for (name, field) in record.get_column_iter() {
                if let Some(pos) = schema.position(name) {
                    values[pos] = field_value(field);
                }
            }
            rows.push(values);
        }

        log::debug!("Read {} row(s) from {}", rows.len(), path.display());

        Ok(Table {
            schema,
            rows,
            skipped_rows: 0,
        })
    }
}

/// Map a Parquet schema node onto a type tag.
fn field_type(ty: &SchemaType) -> FieldType {
    let info = ty.get_basic_info();
    let logical = info.logical_type();
    let converted = info.converted_type();

    if ty.is_group() {
        return match (logical, converted) {
            (Some(LogicalType::List), _) | (_, ConvertedType::LIST) => FieldType::List,
            (Some(LogicalType::Map), _) | (_, ConvertedType::MAP) => FieldType::Map,
            (_, ConvertedType::MAP_KEY_VALUE) => FieldType::Map,
            _ => FieldType::Struct,
        };
    }

    match logical {
        Some(LogicalType::String | LogicalType::Enum | LogicalType::Json) => return FieldType::Utf8,
        Some(LogicalType::Decimal { .. }) => return FieldType::Decimal,
        Some(LogicalType::Date | LogicalType::Time { .. } | LogicalType::Timestamp { .. }) => {
            return FieldType::Temporal
        }
        _ => {}
    }
    match converted {
        ConvertedType::UTF8 | ConvertedType::ENUM | ConvertedType::JSON => return FieldType::Utf8,
        ConvertedType::DECIMAL => return FieldType::Decimal,
        ConvertedType::DATE
        | ConvertedType::TIME_MILLIS
        | ConvertedType::TIME_MICROS
        | ConvertedType::TIMESTAMP_MILLIS
        | ConvertedType::TIMESTAMP_MICROS => return FieldType::Temporal,
        _ => {}
    }

    match ty.get_physical_type() {
        PhysicalType::BOOLEAN => FieldType::Boolean,
        PhysicalType::INT32 | PhysicalType::INT64 => FieldType::Integer,
        PhysicalType::INT96 => FieldType::Temporal,
        PhysicalType::FLOAT | PhysicalType::DOUBLE => FieldType::Float,
        PhysicalType::BYTE_ARRAY | PhysicalType::FIXED_LEN_BYTE_ARRAY => FieldType::Binary,
    }
}

/// Project a decoded Parquet value onto a [`Value`].
fn field_value(field: &ParquetField) -> Value {
    match field {
        ParquetField::Null => Value::Null,
        ParquetField::Str(s) => Value::scalar(s.as_str()),
        ParquetField::Bytes(bytes) => {
            let display = match bytes.as_utf8() {
                Ok(text) => text.to_string(),
                Err(_) => hex_bytes(bytes.data()),
            };
            Value::composite(CompositeKind::Bytes, display)
        }
        ParquetField::Group(_) => Value::composite(CompositeKind::Struct, field.to_string()),
        ParquetField::ListInternal(_) => Value::composite(CompositeKind::List, field.to_string()),
        ParquetField::MapInternal(_) => Value::composite(CompositeKind::Map, field.to_string()),
        other => Value::scalar(other.to_string()),
    }
}

fn hex_bytes(data: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(2 + data.len() * 2);
    out.push_str("0x");
    for b in data {
        let _ = write!(out, "{b:02x}");
    }
    out
}
