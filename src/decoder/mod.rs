//! The decoder: `ArrowSchema` + `ArrowArray` → `ColumnValue`.
//!
//! The schema tree is first resolved into a fully populated [`Field`] tree.
//! Decoding then walks that tree depth-first, dispatching on the `TypeTag`
//! of each node. Buffers are only ever read inside the window
//! `[offset, offset + count)` of the node, shifted by the array's own
//! `offset` field.

mod nested;
mod primitive;
mod schema;
mod temporal;
mod union;
mod varlen;


use std::ops::Range;

use crate::config::CodecConfig;
use crate::error::CodecError;
use crate::ffi::{ArrowArray, ArrowSchema};
use crate::types::{ColumnData, ColumnValue, Field, TypeTag, Value};

pub use schema::describe_schema;

//==================================================================================
// 1. Public entry points
//==================================================================================

/// Decodes every row of a column.
///
/// # Safety
/// `schema` and `array` must describe valid Arrow C Data Interface structs
/// whose buffers stay alive for the duration of the call.
pub unsafe fn decode_column(schema: &ArrowSchema, array: &ArrowArray) -> Result<ColumnValue, CodecError> {
    decode_column_with_config(schema, array, &CodecConfig::default())
}

/// # Safety
/// Same contract as [`decode_column`].
pub unsafe fn decode_column_with_config(
    schema: &ArrowSchema,
    array: &ArrowArray,
    config: &CodecConfig,
) -> Result<ColumnValue, CodecError> {
    decode_range_with_config(schema, array, 0, -1, 0, config)
}

/// Decodes `count` rows starting at row `offset`. A `count` of `-1` means
/// "through the last row". `depth` is only used for diagnostics and the
/// end-of-stream check, which applies at depth 0.
///
/// # Safety
/// Same contract as [`decode_column`].
pub unsafe fn decode_range(
    schema: &ArrowSchema,
    array: &ArrowArray,
    offset: i64,
    count: i64,
    depth: usize,
) -> Result<ColumnValue, CodecError> {
    decode_range_with_config(schema, array, offset, count, depth, &CodecConfig::default())
}

/// # Safety
/// Same contract as [`decode_column`].
pub unsafe fn decode_range_with_config(
    schema: &ArrowSchema,
    array: &ArrowArray,
    offset: i64,
    count: i64,
    depth: usize,
    config: &CodecConfig,
) -> Result<ColumnValue, CodecError> {
    let field = Field::from_schema(schema)?;
    let offset = usize::try_from(offset)
        .map_err(|_| CodecError::MalformedArray(format!("negative decode offset ({})", offset)))?;
    let count = match count {
        -1 => array.len()?.saturating_sub(offset),
        c => usize::try_from(c)
            .map_err(|_| CodecError::MalformedArray(format!("invalid decode count ({})", c)))?,
    };
    log::debug!(
        "decoding column '{}' ({}) rows {}..{}",
        field.name,
        field.tag,
        offset,
        offset + count
    );
    log_metric!("event" = "decode", "format" = schema.format()?, "rows" = &count);

    let decoder = Decoder { config };
    decoder.decode_node(&field, schema, array, offset, count, depth)
}

//==================================================================================
// 2. The recursive core
//==================================================================================

/// The row window of one node, in the node's logical coordinates, plus the
/// physical shift from `ArrowArray.offset`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Window {
    pub base: usize,
    pub offset: usize,
    pub count: usize,
}

impl Window {
    /// Physical buffer indices covered by the window.
    pub fn physical(&self) -> Range<usize> {
        let start = self.base + self.offset;
        start..start + self.count
    }

    /// Number of buffer slots that must be readable.
    pub fn needed(&self) -> usize {
        self.base + self.offset + self.count
    }
}

pub(crate) struct Decoder<'c> {
    pub config: &'c CodecConfig,
}

impl Decoder<'_> {
    /// Decodes one node and wraps any error with the node's field name.
    pub(crate) unsafe fn decode_node(
        &self,
        field: &Field,
        schema: &ArrowSchema,
        array: &ArrowArray,
        offset: usize,
        count: usize,
        depth: usize,
    ) -> Result<ColumnValue, CodecError> {
        self.decode_node_inner(field, schema, array, offset, count, depth, false)
            .map_err(|e| {
                if field.name.is_empty() {
                    e
                } else {
                    e.in_field(field.name.clone())
                }
            })
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) unsafe fn decode_node_inner(
        &self,
        field: &Field,
        schema: &ArrowSchema,
        array: &ArrowArray,
        offset: usize,
        count: usize,
        depth: usize,
        skip_dictionary_check: bool,
    ) -> Result<ColumnValue, CodecError> {
        if depth == 0 && matches!(field.tag, TypeTag::Struct(_)) && array.is_empty() && array.is_released() {
            log::warn!("top-level struct batch '{}' is released and empty, end of series", field.name);
            return Ok(self.column(field, field.nullable, ColumnData::EndOfSeries));
        }
        if array.is_released() {
            return Err(CodecError::MalformedArray("array has already been released".into()));
        }

        let length = array.len()?;
        if offset.checked_add(count).map_or(true, |end| end > length) {
            return Err(CodecError::MalformedArray(format!(
                "window {}..{} is out of range for an array of length {}",
                offset,
                offset.saturating_add(count),
                length
            )));
        }
        if !skip_dictionary_check {
            let is_dictionary = matches!(field.tag, TypeTag::Dictionary { .. });
            if is_dictionary != array.dictionary().is_some() {
                return Err(CodecError::MalformedArray(
                    "schema and array disagree on the presence of a dictionary".into(),
                ));
            }
        }

        let base = if self.config.honor_array_offset { array.offset()? } else { 0 };
        let window = Window { base, offset, count };
        let nullable = field.nullable || array.null_count > 0;
        log::trace!(
            "depth {} node '{}' {} window {:?} null_count {}",
            depth,
            field.name,
            field.tag,
            window.physical(),
            array.null_count
        );

        let data = self.dispatch(field, schema, array, window, nullable, depth)?;
        Ok(self.column(field, nullable, data))
    }

    fn column(&self, field: &Field, nullable: bool, data: ColumnData) -> ColumnValue {
        ColumnValue {
            name: field.name.clone(),
            tag: field.tag.clone(),
            nullable,
            metadata: field.metadata.clone(),
            data,
        }
    }

    unsafe fn dispatch(
        &self,
        field: &Field,
        schema: &ArrowSchema,
        array: &ArrowArray,
        w: Window,
        nullable: bool,
        depth: usize,
    ) -> Result<ColumnData, CodecError> {
        let format = schema.format()?;
        let values = |v: Vec<Value>| -> Result<ColumnData, CodecError> { Ok(ColumnData::Values(v)) };
        match &field.tag {
            TypeTag::Null => values(self.decode_null(array, w)?),
            TypeTag::Boolean => values(self.decode_boolean(array, w, format)?),
            TypeTag::Int8 => values(self.decode_integers::<i8>(array, w, format)?),
            TypeTag::Int16 => values(self.decode_integers::<i16>(array, w, format)?),
            TypeTag::Int32 => values(self.decode_integers::<i32>(array, w, format)?),
            TypeTag::Int64 => values(self.decode_integers::<i64>(array, w, format)?),
            TypeTag::UInt8 => values(self.decode_integers::<u8>(array, w, format)?),
            TypeTag::UInt16 => values(self.decode_integers::<u16>(array, w, format)?),
            TypeTag::UInt32 => values(self.decode_integers::<u32>(array, w, format)?),
            TypeTag::UInt64 => values(self.decode_integers::<u64>(array, w, format)?),
            TypeTag::Float16 => values(self.decode_half(array, w, format)?),
            TypeTag::Float32 => values(self.decode_fixed::<f32>(array, w, format, |v| Ok(Value::Float(f64::from(v))))?),
            TypeTag::Float64 => values(self.decode_fixed::<f64>(array, w, format, |v| Ok(Value::Float(v)))?),
            TypeTag::Binary | TypeTag::Utf8 => values(self.decode_varlen::<i32>(array, w, format)?),
            TypeTag::LargeBinary | TypeTag::LargeUtf8 => values(self.decode_varlen::<i64>(array, w, format)?),
            TypeTag::FixedSizeBinary(width) => values(self.decode_fixed_width_bytes(array, w, format, *width)?),
            TypeTag::Decimal { bits, .. } => {
                values(self.decode_fixed_width_bytes(array, w, format, i32::from(*bits / 8))?)
            }
            TypeTag::Date32 => values(self.decode_date32(array, w, format)?),
            TypeTag::Date64 => values(self.decode_date64(array, w, format)?),
            TypeTag::Time32(unit) => values(self.decode_time::<i32>(array, w, format, *unit)?),
            TypeTag::Time64(unit) => values(self.decode_time::<i64>(array, w, format, *unit)?),
            TypeTag::Timestamp(unit, _) => values(self.decode_timestamp(array, w, format, *unit)?),
            TypeTag::Duration(_) => values(self.decode_integers::<i64>(array, w, format)?),
            TypeTag::Interval(unit) => values(self.decode_interval(array, w, format, *unit)?),
            TypeTag::Struct(fields) => self.decode_struct(fields, schema, array, w, nullable, depth),
            TypeTag::List(item) => values(self.decode_list::<i32>(slot(item)?, schema, array, w, format, depth)?),
            TypeTag::LargeList(item) => values(self.decode_list::<i64>(slot(item)?, schema, array, w, format, depth)?),
            TypeTag::FixedSizeList(size, item) => {
                values(self.decode_fixed_size_list(slot(item)?, *size, schema, array, w, format, depth)?)
            }
            TypeTag::ListView(item) => self.decode_list_view::<i32>(slot(item)?, schema, array, w, format, depth),
            TypeTag::LargeListView(item) => self.decode_list_view::<i64>(slot(item)?, schema, array, w, format, depth),
            TypeTag::Map { key, value } => {
                values(self.decode_map(slot(key)?, slot(value)?, schema, array, w, format, depth)?)
            }
            TypeTag::DenseUnion { type_ids, variants } => {
                values(self.decode_union(type_ids, variants, schema, array, w, format, true, depth)?)
            }
            TypeTag::SparseUnion { type_ids, variants } => {
                values(self.decode_union(type_ids, variants, schema, array, w, format, false, depth)?)
            }
            TypeTag::RunEndEncoded { run_ends, values } => {
                self.decode_run_end(slot(run_ends)?, slot(values)?, schema, array, w, depth)
            }
            TypeTag::Dictionary { index, value } => {
                self.decode_dictionary(field, index, slot(value)?, schema, array, w, depth)
            }
        }
    }

    /// Decodes `count` elements of a child as individual values.
    ///
    /// Leaf children yield their values directly. Children whose data is not a
    /// flat value list (structs, dictionaries, run-end layouts) are split into
    /// one single-row column per element.
    pub(crate) unsafe fn decode_elements(
        &self,
        field: &Field,
        schema: &ArrowSchema,
        array: &ArrowArray,
        offset: usize,
        count: usize,
        depth: usize,
    ) -> Result<Vec<Value>, CodecError> {
        let column = self.decode_node(field, schema, array, offset, count, depth)?;
        if let ColumnData::Values(values) = column.data {
            return Ok(values);
        }
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            let row = self.decode_node(field, schema, array, offset + i, 1, depth)?;
            out.push(Value::Column(Box::new(row)));
        }
        Ok(out)
    }
}

/// Unwraps a child slot that `Field::from_schema` guarantees to be populated.
fn slot(slot: &Option<Box<Field>>) -> Result<&Field, CodecError> {
    slot.as_deref()
        .ok_or_else(|| CodecError::InternalError("nested type tag without a child field".into()))
}
