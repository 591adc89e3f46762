//! The encoder: `ColumnValue` → owned `ArrowSchema` + `ArrowArray`.
//!
//! Every node is encoded into an [`ArrayBuilder`] plus the schemas of its
//! children, then frozen together with its own schema. Children are frozen
//! before their parents, so an error at any depth drops (and thereby
//! releases) every struct built so far; a caller never receives a half-built
//! pair.

mod dictionary;
mod infer;
mod nested;
mod primitive;
mod row_batch;
mod temporal;

#[cfg(test)]
mod tests;

use crate::config::CodecConfig;
use crate::error::CodecError;
use crate::ffi::{ArrayBuilder, ArrowArray, ArrowSchema, SchemaBuilder};
use crate::types::{format_of, ColumnData, ColumnValue, IntervalUnit, TypeTag, Value};

pub use row_batch::{encode_row_batch, encode_row_batch_with_config};

//==================================================================================
// 1. Public entry points
//==================================================================================

/// Encodes one column into an owned schema/array pair.
pub fn encode_column(column: &ColumnValue) -> Result<(ArrowSchema, ArrowArray), CodecError> {
    encode_column_with_config(column, &CodecConfig::default())
}

pub fn encode_column_with_config(
    column: &ColumnValue,
    config: &CodecConfig,
) -> Result<(ArrowSchema, ArrowArray), CodecError> {
    log::debug!("encoding column '{}' ({})", column.name, column.tag);
    log_metric!("event" = "encode", "type" = &column.tag, "rows" = column.row_count().unwrap_or(0));
    Encoder { config }.encode_node(column)
}

//==================================================================================
// 2. The recursive core
//==================================================================================

/// The array of one encoded node plus the pieces of its schema that the
/// node's own encoder produced.
pub(crate) struct Parts {
    pub array: ArrayBuilder,
    pub children: Vec<ArrowSchema>,
    pub dictionary: Option<ArrowSchema>,
}

impl Parts {
    pub fn leaf(array: ArrayBuilder) -> Self {
        Self {
            array,
            children: Vec::new(),
            dictionary: None,
        }
    }
}

pub(crate) struct Encoder<'c> {
    pub config: &'c CodecConfig,
}

impl Encoder<'_> {
    pub(crate) fn encode_node(&self, column: &ColumnValue) -> Result<(ArrowSchema, ArrowArray), CodecError> {
        self.encode_named(column, &column.name)
    }

    /// Encodes `column` under `name`, wrapping errors with that name.
    pub(crate) fn encode_named(
        &self,
        column: &ColumnValue,
        name: &str,
    ) -> Result<(ArrowSchema, ArrowArray), CodecError> {
        self.encode_named_inner(column, name).map_err(|e| {
            if name.is_empty() {
                e
            } else {
                e.in_field(name)
            }
        })
    }

    fn encode_named_inner(
        &self,
        column: &ColumnValue,
        name: &str,
    ) -> Result<(ArrowSchema, ArrowArray), CodecError> {
        log::trace!("encoding node '{}' {}", name, column.tag);
        let parts = self.dispatch(column)?;

        let mut schema = SchemaBuilder::new(format_of(&column.tag), name)
            .nullable(column.nullable)
            .metadata(column.metadata.as_ref())?;
        for child in parts.children {
            schema = schema.child(child);
        }
        if let Some(dictionary) = parts.dictionary {
            schema = schema.dictionary(dictionary);
        }
        let array = parts.array.build()?;
        Ok((schema.build()?, array))
    }

    fn dispatch(&self, column: &ColumnValue) -> Result<Parts, CodecError> {
        match (&column.tag, &column.data) {
            (TypeTag::Struct(fields), ColumnData::Struct { fields: children, validity }) => {
                self.encode_struct(fields, children, validity.as_deref(), column.nullable)
            }
            (TypeTag::RunEndEncoded { .. }, ColumnData::RunEndEncoded { length, offset, run_ends, values }) => {
                self.encode_run_end(*length, *offset, run_ends, values)
            }
            (TypeTag::Dictionary { index, .. }, ColumnData::Dictionary { key, value }) => {
                self.encode_dictionary(index, key, value)
            }
            (tag, ColumnData::Values(values)) => self.encode_values(tag, values, column.nullable),
            (_, ColumnData::Handle(_)) => Err(CodecError::UnsupportedType(
                "a column held by an array handle must be decoded before it can be encoded".into(),
            )),
            (_, ColumnData::EndOfSeries) => {
                Err(CodecError::UnsupportedType("the end-of-series marker cannot be encoded".into()))
            }
            (tag, _) => Err(CodecError::TypeMismatch(format!(
                "column data does not match its declared type {}",
                tag
            ))),
        }
    }

    /// Encodes a column whose data is a flat list of values.
    pub(crate) fn encode_values(&self, tag: &TypeTag, values: &[Value], nullable: bool) -> Result<Parts, CodecError> {
        match tag {
            TypeTag::Null => self.encode_null(values),
            TypeTag::Boolean => self.encode_boolean(values, nullable),
            TypeTag::Int8 => self.encode_integers::<i8>(tag, values, nullable),
            TypeTag::Int16 => self.encode_integers::<i16>(tag, values, nullable),
            TypeTag::Int32 => self.encode_integers::<i32>(tag, values, nullable),
            TypeTag::Int64 => self.encode_integers::<i64>(tag, values, nullable),
            TypeTag::UInt8 => self.encode_integers::<u8>(tag, values, nullable),
            TypeTag::UInt16 => self.encode_integers::<u16>(tag, values, nullable),
            TypeTag::UInt32 => self.encode_integers::<u32>(tag, values, nullable),
            TypeTag::UInt64 => self.encode_integers::<u64>(tag, values, nullable),
            TypeTag::Float16 => self.encode_half(values, nullable),
            TypeTag::Float32 => self.encode_fixed::<f32>(tag, values, nullable, |v| match v {
                Value::Float(f) => Some(*f as f32),
                _ => None,
            }),
            TypeTag::Float64 => self.encode_fixed::<f64>(tag, values, nullable, |v| match v {
                Value::Float(f) => Some(*f),
                _ => None,
            }),
            TypeTag::Binary => self.encode_varlen::<i32>(values, nullable, false),
            TypeTag::Utf8 => self.encode_varlen::<i32>(values, nullable, true),
            TypeTag::LargeBinary => self.encode_varlen::<i64>(values, nullable, false),
            TypeTag::LargeUtf8 => self.encode_varlen::<i64>(values, nullable, true),
            TypeTag::FixedSizeBinary(width) => self.encode_fixed_width_bytes(tag, *width, values, nullable),
            TypeTag::Decimal { bits, .. } => self.encode_fixed_width_bytes(tag, i32::from(*bits / 8), values, nullable),
            TypeTag::Date32 => self.encode_date32(values, nullable),
            TypeTag::Date64 => self.encode_date64(values, nullable),
            TypeTag::Time32(unit) => self.encode_time::<i32>(tag, *unit, values, nullable),
            TypeTag::Time64(unit) => self.encode_time::<i64>(tag, *unit, values, nullable),
            TypeTag::Timestamp(unit, _) => self.encode_timestamp(*unit, values, nullable),
            TypeTag::Duration(_) => self.encode_integers::<i64>(tag, values, nullable),
            TypeTag::Interval(IntervalUnit::YearMonth) => self.encode_integers::<i32>(tag, values, nullable),
            TypeTag::Interval(unit) => self.encode_interval(*unit, values, nullable),
            TypeTag::List(item) => self.encode_list::<i32>(item.as_deref(), values, nullable),
            TypeTag::LargeList(item) => self.encode_list::<i64>(item.as_deref(), values, nullable),
            TypeTag::FixedSizeList(size, item) => self.encode_fixed_size_list(*size, item.as_deref(), values, nullable),
            TypeTag::Map { key, value } => self.encode_map(key.as_deref(), value.as_deref(), values, nullable),
            TypeTag::ListView(_) | TypeTag::LargeListView(_) => {
                Err(CodecError::UnsupportedType(format!("encoding {} is not supported", tag)))
            }
            TypeTag::DenseUnion { .. } | TypeTag::SparseUnion { .. } => {
                Err(CodecError::UnsupportedType(format!("encoding {} is not supported", tag)))
            }
            TypeTag::Struct(_) | TypeTag::RunEndEncoded { .. } | TypeTag::Dictionary { .. } => {
                Err(CodecError::TypeMismatch(format!(
                    "{} columns need structured data, not a value list",
                    tag
                )))
            }
        }
    }
}

/// Rejects a nil in a column that was declared non-nullable.
pub(crate) fn check_nil(nullable: bool, index: usize) -> Result<(), CodecError> {
    if nullable {
        Ok(())
    } else {
        Err(CodecError::TypeMismatch(format!(
            "nil at index {} in a non-nullable column",
            index
        )))
    }
}

/// The standard mismatch error for a value the column type cannot hold.
pub(crate) fn mismatch(expected: impl std::fmt::Display, value: &Value, index: usize) -> CodecError {
    CodecError::TypeMismatch(format!(
        "cannot encode {} at index {} as {}",
        value.kind(),
        index,
        expected
    ))
}
