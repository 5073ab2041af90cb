//! Parquet response decoding.
//!
//! The query service answers with a Parquet file whose columns line up with
//! the request's `select` list. Rows are handed out in reader order.

use bytes::Bytes;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::{Field, Row};
use serde_json::{Map, Number, Value};

use vswir_core::row::RawRow;

use crate::error::Result;

/// Decode every row of a Parquet payload, calling `on_row` in arrival order.
pub fn for_each_row<F>(payload: Bytes, mut on_row: F) -> Result<usize>
where
    F: FnMut(RawRow),
{
    let reader = SerializedFileReader::new(payload)?;
    let mut count = 0usize;
    for row in reader.get_row_iter(None)? {
        let row = row?;
        on_row(row_to_values(&row));
        count += 1;
    }
    tracing::debug!(rows = count, "decoded parquet payload");
    Ok(count)
}

/// Decode a Parquet payload into positional rows.
pub fn decode_rows(payload: impl Into<Bytes>) -> Result<Vec<RawRow>> {
    let mut rows = Vec::new();
    for_each_row(payload.into(), |r| rows.push(r))?;
    Ok(rows)
}

fn row_to_values(row: &Row) -> RawRow {
    row.get_column_iter()
        .map(|(_, field)| field_to_json(field))
        .collect()
}

fn field_to_json(field: &Field) -> Value {
    match field {
        Field::Null => Value::Null,
        Field::Bool(b) => Value::Bool(*b),
        Field::Byte(v) => Value::from(*v),
        Field::Short(v) => Value::from(*v),
        Field::Int(v) => Value::from(*v),
        Field::Long(v) => Value::from(*v),
        Field::UByte(v) => Value::from(*v),
        Field::UShort(v) => Value::from(*v),
        Field::UInt(v) => Value::from(*v),
        Field::ULong(v) => Value::from(*v),
        Field::Float(v) => float(*v as f64),
        Field::Double(v) => float(*v),
        Field::Str(s) => Value::String(s.clone()),
        Field::Bytes(b) => match b.as_utf8() {
            Ok(s) => Value::String(s.to_string()),
            Err(_) => Value::String(format!("[binary {} bytes]", b.len())),
        },
        Field::Group(row) => {
            let obj: Map<String, Value> = row
                .get_column_iter()
                .map(|(k, v)| (k.clone(), field_to_json(v)))
                .collect();
            Value::Object(obj)
        }
        Field::ListInternal(list) => {
            Value::Array(list.elements().iter().map(field_to_json).collect())
        }
        Field::MapInternal(map) => {
            let obj: Map<String, Value> = map
                .entries()
                .iter()
                .map(|(k, v)| {
                    let key = match k {
                        Field::Str(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (key, field_to_json(v))
                })
                .collect();
            Value::Object(obj)
        }
        // Dates, timestamps, decimals, half floats: use the reader's own
        // textual rendering.
        other => Value::String(other.to_string()),
    }
}

fn float(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow_array::types::Int64Type;
    use arrow_array::{ArrayRef, Float64Array, Int64Array, ListArray, RecordBatch, StringArray};
    use arrow_schema::{DataType, Field as ArrowField, Schema};
    use parquet::arrow::ArrowWriter;
    use serde_json::json;

    fn fixture() -> Vec<u8> {
        let schema = Arc::new(Schema::new(vec![
            ArrowField::new("plot_name", DataType::Utf8, true),
            ArrowField::new("value", DataType::Float64, true),
            ArrowField::new(
                "pixel_ids",
                DataType::List(Arc::new(ArrowField::new("item", DataType::Int64, true))),
                true,
            ),
            ArrowField::new("plot_id", DataType::Int64, false),
        ]));
        let cols: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(vec![Some("b"), None, Some("a")])),
            Arc::new(Float64Array::from(vec![Some(1.5), Some(2.0), None])),
            Arc::new(ListArray::from_iter_primitive::<Int64Type, _, _>(vec![
                Some(vec![Some(3), Some(4)]),
                None,
                Some(vec![Some(1)]),
            ])),
            Arc::new(Int64Array::from(vec![30, 10, 20])),
        ];
        let batch = RecordBatch::try_new(schema.clone(), cols).unwrap();

        let mut buf = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buf, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        buf
    }

    #[test]
    fn decodes_rows_in_file_order() {
        let rows = decode_rows(fixture()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec![json!("b"), json!(1.5), json!([3, 4]), json!(30)]);
        assert_eq!(rows[1], vec![json!(null), json!(2.0), json!(null), json!(10)]);
        assert_eq!(rows[2][3], json!(20));
    }

    #[test]
    fn callback_sees_every_row() {
        let mut seen = Vec::new();
        let n = for_each_row(Bytes::from(fixture()), |r| seen.push(r[3].clone())).unwrap();
        assert_eq!(n, 3);
        assert_eq!(seen, vec![json!(30), json!(10), json!(20)]);
    }

    #[test]
    fn garbage_payload_is_a_decode_error() {
        let err = decode_rows(b"definitely not parquet".to_vec()).unwrap_err();
        assert!(err.to_string().starts_with("failed to parse Parquet data"));
    }
}
