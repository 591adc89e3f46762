//! Encoding of a whole record batch from a row of column descriptors or
//! bare scalars.
//!
//! Each entry becomes one child of a top-level struct. A scalar is a
//! one-row column whose type is sniffed from the value: integers become
//! `int64`, floats `float64`, bytes `string` (or `large_string` past the
//! 32-bit offset limit), booleans `boolean` and nil a one-row `null` column.

use super::Encoder;
use crate::config::CodecConfig;
use crate::error::CodecError;
use crate::ffi::{ArrayBuilder, ArrowArray, ArrowSchema, SchemaBuilder};
use crate::types::{ColumnValue, TypeTag, Value};

pub fn encode_row_batch(values: &[Value]) -> Result<(ArrowSchema, ArrowArray), CodecError> {
    encode_row_batch_with_config(values, &CodecConfig::default())
}

/// Encodes `values` as the children of one struct batch. Every child must
/// have the same number of rows.
pub fn encode_row_batch_with_config(
    values: &[Value],
    config: &CodecConfig,
) -> Result<(ArrowSchema, ArrowArray), CodecError> {
    log::debug!("encoding a record batch of {} columns", values.len());
    let encoder = Encoder { config };

    let mut schema = SchemaBuilder::new("+s", "");
    let mut array: Option<ArrayBuilder> = None;
    let mut length = 0usize;

    for (i, value) in values.iter().enumerate() {
        let (child_schema, child_array) = encode_entry(&encoder, value, i)
            .map_err(|e| e.in_field(format!("column {}", i)))?;
        let rows = child_array.len()?;
        let builder = match array.take() {
            None => {
                length = rows;
                ArrayBuilder::new(rows, 0).buffer(None)
            }
            Some(builder) if rows == length => builder,
            Some(_) => {
                return Err(CodecError::LengthMismatch(length, rows).in_field(format!("column {}", i)));
            }
        };
        array = Some(builder.child(child_array));
        schema = schema.child(child_schema);
    }

    let array = array.unwrap_or_else(|| ArrayBuilder::new(0, 0).buffer(None)).build()?;
    Ok((schema.build()?, array))
}

fn encode_entry(encoder: &Encoder<'_>, value: &Value, index: usize) -> Result<(ArrowSchema, ArrowArray), CodecError> {
    let tag = match value {
        Value::Column(column) => return encoder.encode_node(column),
        Value::Int(_) => TypeTag::Int64,
        Value::Float(_) => TypeTag::Float64,
        Value::Bytes(bytes) if bytes.len() > i32::MAX as usize => TypeTag::LargeUtf8,
        Value::Bytes(_) => TypeTag::Utf8,
        Value::Bool(_) => TypeTag::Boolean,
        Value::Nil => TypeTag::Null,
        other => {
            return Err(CodecError::TypeMismatch(format!(
                "Expected a column descriptor or primitive value at position {}, got {}",
                index,
                other.kind()
            )));
        }
    };
    let nullable = value.is_nil();
    encoder.encode_node(&ColumnValue::values("", tag, vec![value.clone()]).nullable(nullable))
}
