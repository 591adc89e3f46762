//! Layouts with child arrays: struct, the list family, map, run-end encoded
//! and dictionary-encoded columns.

use super::{Decoder, Window};
use crate::error::CodecError;
use crate::ffi::{ArrowArray, ArrowSchema};
use crate::null_handling::{is_valid, validity_to_vec};
use crate::traits::NativeInt;
use crate::types::{ensure_unique_keys, ColumnData, ColumnValue, Field, TypeTag, Value};

/// Reads `offsets[j]..offsets[j + 1]` as a checked `(start, len)` pair.
fn offset_range<O: NativeInt>(offsets: &[O], j: usize) -> Result<(usize, usize), CodecError> {
    match (offsets[j].as_index(), offsets[j + 1].as_index()) {
        (Some(start), Some(end)) if start <= end => Ok((start, end - start)),
        _ => Err(CodecError::MalformedArray(format!(
            "invalid offsets {}..{} at index {}",
            offsets[j],
            offsets[j + 1],
            j
        ))),
    }
}

impl Decoder<'_> {
    pub(crate) unsafe fn decode_struct(
        &self,
        fields: &[Field],
        schema: &ArrowSchema,
        array: &ArrowArray,
        w: Window,
        _nullable: bool,
        depth: usize,
    ) -> Result<ColumnData, CodecError> {
        array.expect_buffers(1, "+s")?;
        if array.child_count()? != fields.len() {
            return Err(CodecError::MalformedArray(format!(
                "struct declares {} fields but the array has {} children",
                fields.len(),
                array.n_children
            )));
        }
        let validity = array
            .bit_buffer(0, w.needed())?
            .map(|bits| validity_to_vec(Some(bits), w.base + w.offset, w.count));

        let mut children = Vec::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            // Children share the parent's physical row numbering.
            children.push(self.decode_node(
                field,
                schema.child(i)?,
                array.child(i)?,
                w.base + w.offset,
                w.count,
                depth + 1,
            )?);
        }
        Ok(ColumnData::Struct {
            fields: children,
            validity,
        })
    }

    /// Lists and large lists. Each valid row becomes a nested column over the
    /// child's `offsets[j]..offsets[j + 1]`.
    pub(crate) unsafe fn decode_list<O: NativeInt>(
        &self,
        item: &Field,
        schema: &ArrowSchema,
        array: &ArrowArray,
        w: Window,
        format: &str,
        depth: usize,
    ) -> Result<Vec<Value>, CodecError> {
        array.expect_buffers(2, format)?;
        if w.count == 0 {
            return Ok(Vec::new());
        }
        let validity = array.bit_buffer(0, w.needed())?;
        let offsets = array.required_buffer::<O>(1, w.needed() + 1)?;
        let (child_schema, child_array) = (schema.child(0)?, array.child(0)?);

        let mut out = Vec::new();
        out.try_reserve_exact(w.count)?;
        for j in w.physical() {
            if !is_valid(validity, j) {
                out.push(Value::Nil);
                continue;
            }
            let (start, len) = offset_range(offsets, j)?;
            let element = self.decode_node(item, child_schema, child_array, start, len, depth + 1)?;
            out.push(Value::Column(Box::new(element)));
        }
        Ok(out)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) unsafe fn decode_fixed_size_list(
        &self,
        item: &Field,
        size: i32,
        schema: &ArrowSchema,
        array: &ArrowArray,
        w: Window,
        format: &str,
        depth: usize,
    ) -> Result<Vec<Value>, CodecError> {
        array.expect_buffers(1, format)?;
        let size = usize::try_from(size)
            .map_err(|_| CodecError::MalformedSchema(format!("negative list size in `{}`", format)))?;
        let validity = array.bit_buffer(0, w.needed())?;
        let (child_schema, child_array) = (schema.child(0)?, array.child(0)?);

        let mut out = Vec::new();
        out.try_reserve_exact(w.count)?;
        for j in w.physical() {
            if !is_valid(validity, j) {
                out.push(Value::Nil);
                continue;
            }
            let start = j
                .checked_mul(size)
                .ok_or_else(|| CodecError::MalformedArray(format!("fixed-size list row {} overflows", j)))?;
            let element = self.decode_node(item, child_schema, child_array, start, size, depth + 1)?;
            out.push(Value::Column(Box::new(element)));
        }
        Ok(out)
    }

    /// List views keep their physical layout: validity, offsets and sizes for
    /// the window, plus the whole child column.
    pub(crate) unsafe fn decode_list_view<O: NativeInt + Into<i64>>(
        &self,
        item: &Field,
        schema: &ArrowSchema,
        array: &ArrowArray,
        w: Window,
        format: &str,
        depth: usize,
    ) -> Result<ColumnData, CodecError> {
        array.expect_buffers(3, format)?;
        let bitmap = array.bit_buffer(0, w.needed())?;
        if bitmap.is_none() && array.null_count > 0 {
            return Err(CodecError::MalformedArray(
                "list view reports nulls but has no validity bitmap".into(),
            ));
        }
        let offsets = array.required_buffer::<O>(1, w.needed())?;
        let sizes = array.required_buffer::<O>(2, w.needed())?;
        let range = w.physical();

        let child_array = array.child(0)?;
        let values = self.decode_node(item, schema.child(0)?, child_array, 0, child_array.len()?, depth + 1)?;
        Ok(ColumnData::ListView {
            validity: validity_to_vec(bitmap, range.start, w.count),
            offsets: offsets[range.clone()].iter().map(|o| (*o).into()).collect(),
            sizes: sizes[range].iter().map(|s| (*s).into()).collect(),
            values: Box::new(values),
        })
    }

    /// Maps: one row per offsets range over the `entries` struct, rendered as
    /// ordered key/value pairs. Duplicate keys in a row are an error.
    #[allow(clippy::too_many_arguments)]
    pub(crate) unsafe fn decode_map(
        &self,
        key: &Field,
        value: &Field,
        schema: &ArrowSchema,
        array: &ArrowArray,
        w: Window,
        format: &str,
        depth: usize,
    ) -> Result<Vec<Value>, CodecError> {
        array.expect_buffers(2, format)?;
        if w.count == 0 {
            return Ok(Vec::new());
        }
        let validity = array.bit_buffer(0, w.needed())?;
        let offsets = array.required_buffer::<i32>(1, w.needed() + 1)?;

        let (entries_schema, entries_array) = (schema.child(0)?, array.child(0)?);
        if entries_array.child_count()? != 2 {
            return Err(CodecError::MalformedArray("map entries must have exactly two children".into()));
        }
        let entries_base = if self.config.honor_array_offset { entries_array.offset()? } else { 0 };
        let (key_schema, key_array) = (entries_schema.child(0)?, entries_array.child(0)?);
        let (value_schema, value_array) = (entries_schema.child(1)?, entries_array.child(1)?);

        let mut out = Vec::new();
        out.try_reserve_exact(w.count)?;
        for j in w.physical() {
            if !is_valid(validity, j) {
                out.push(Value::Nil);
                continue;
            }
            let (start, len) = offset_range(offsets, j)?;
            let keys = self.decode_elements(key, key_schema, key_array, entries_base + start, len, depth + 2)?;
            let values = self.decode_elements(value, value_schema, value_array, entries_base + start, len, depth + 2)?;
            let pairs: Vec<(Value, Value)> = keys.into_iter().zip(values).collect();
            ensure_unique_keys(&pairs)?;
            out.push(Value::Map(pairs));
        }
        Ok(out)
    }

    /// Run-end encoded columns keep both children whole; the logical window
    /// travels in `offset`/`length`.
    pub(crate) unsafe fn decode_run_end(
        &self,
        run_ends: &Field,
        values: &Field,
        schema: &ArrowSchema,
        array: &ArrowArray,
        w: Window,
        depth: usize,
    ) -> Result<ColumnData, CodecError> {
        if array.n_buffers != 0 {
            return Err(CodecError::MalformedArray(format!(
                "run-end encoded arrays have no buffers, got {}",
                array.n_buffers
            )));
        }
        if array.child_count()? != 2 {
            return Err(CodecError::MalformedArray("run-end encoded arrays need two children".into()));
        }
        let run_ends_array = array.child(0)?;
        let values_array = array.child(1)?;
        let run_ends_column =
            self.decode_node(run_ends, schema.child(0)?, run_ends_array, 0, run_ends_array.len()?, depth + 1)?;
        let values_column =
            self.decode_node(values, schema.child(1)?, values_array, 0, values_array.len()?, depth + 1)?;
        Ok(ColumnData::RunEndEncoded {
            length: w.count,
            offset: w.base + w.offset,
            run_ends: Box::new(run_ends_column),
            values: Box::new(values_column),
        })
    }

    /// Dictionary columns: the window's indices plus the whole dictionary.
    /// Indices are not resolved against the dictionary.
    #[allow(clippy::too_many_arguments)]
    pub(crate) unsafe fn decode_dictionary(
        &self,
        field: &Field,
        index: &TypeTag,
        value: &Field,
        schema: &ArrowSchema,
        array: &ArrowArray,
        w: Window,
        depth: usize,
    ) -> Result<ColumnData, CodecError> {
        let dictionary_schema = schema
            .dictionary()
            .ok_or_else(|| CodecError::MalformedSchema("dictionary schema is missing".into()))?;
        let dictionary_array = array
            .dictionary()
            .ok_or_else(|| CodecError::MalformedArray("dictionary array is missing".into()))?;

        let key_field = Field {
            name: field.name.clone(),
            tag: index.clone(),
            nullable: field.nullable,
            metadata: None,
        };
        let key: ColumnValue =
            self.decode_node_inner(&key_field, schema, array, w.offset, w.count, depth + 1, true)?;
        let value = self.decode_node(
            value,
            dictionary_schema,
            dictionary_array,
            0,
            dictionary_array.len()?,
            depth + 1,
        )?;
        Ok(ColumnData::Dictionary {
            key: Box::new(key),
            value: Box::new(value),
        })
    }
}
