//! `.dbf` attribute rows, decoded by the `dbase` crate.

use dbase::FieldValue;
use serde_json::Value;
use std::io::Cursor;

use super::ShapefileError;
use crate::geometry::Properties;

/// Largest magnitude an `f64` holds without losing integer precision.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Decode every row of a `.dbf` table, columns in field order.
pub fn read_rows(dbf: &[u8]) -> Result<Vec<Properties>, ShapefileError> {
    let mut reader =
        dbase::Reader::new(Cursor::new(dbf)).map_err(|e| ShapefileError::Table(e.to_string()))?;
    let fields: Vec<String> = reader
        .fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect();
    let records = reader
        .read()
        .map_err(|e| ShapefileError::Table(e.to_string()))?;

    records
        .into_iter()
        .enumerate()
        .map(|(row, record)| {
            fields
                .iter()
                .map(|name| {
                    let value = record.get(name).ok_or_else(|| ShapefileError::MissingField {
                        row,
                        field: name.clone(),
                    })?;
                    Ok((name.clone(), field_value(value)))
                })
                .collect()
        })
        .collect()
}

/// Blank cells become `null`, dates `YYYY-MM-DD`. Whole numbers are written
/// as integers.
fn field_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Character(text) => text
            .as_deref()
            .map_or(Value::Null, |t| Value::String(t.trim_end().to_string())),
        FieldValue::Memo(text) => Value::String(text.clone()),
        FieldValue::Numeric(n) => n.map_or(Value::Null, number),
        FieldValue::Float(n) => n.map_or(Value::Null, |n| number(f64::from(n))),
        FieldValue::Integer(n) => Value::from(*n),
        FieldValue::Currency(n) | FieldValue::Double(n) => Value::from(*n),
        FieldValue::Logical(b) => b.map_or(Value::Null, Value::Bool),
        FieldValue::Date(date) => date.as_ref().map_or(Value::Null, |d| {
            Value::String(format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day()))
        }),
        FieldValue::DateTime(t) => Value::from(t.to_unix_timestamp()),
    }
}

fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}
