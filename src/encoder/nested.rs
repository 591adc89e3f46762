//! Encoders for layouts with child arrays: struct, list, fixed-size list,
//! map and run-end encoded columns.

use super::infer::infer_tag;
use super::{check_nil, mismatch, Encoder, Parts};
use crate::error::CodecError;
use crate::ffi::{AlignedBuffer, ArrayBuilder, ArrowSchema, SchemaBuilder};
use crate::null_handling::ValidityBuilder;
use crate::traits::NativeInt;
use crate::types::{ensure_unique_keys, ColumnValue, Field, TypeTag, Value};

/// Builds the child column of a list or map from the flattened values. A
/// declared field keeps its name, type and metadata; otherwise the type is
/// inferred from the values.
fn child_column(declared: Option<&Field>, default_name: &str, values: Vec<Value>) -> Result<ColumnValue, CodecError> {
    let has_nil = values.iter().any(Value::is_nil);
    let column = match declared {
        Some(field) => {
            if matches!(
                field.tag,
                TypeTag::List(_)
                    | TypeTag::LargeList(_)
                    | TypeTag::FixedSizeList(..)
                    | TypeTag::ListView(_)
                    | TypeTag::LargeListView(_)
            ) {
                return Err(CodecError::UnsupportedType(
                    "nested list construction (list of lists) is not supported".into(),
                ));
            }
            ColumnValue::values(field.name.clone(), field.tag.clone(), values)
                .nullable(field.nullable || has_nil)
                .with_metadata(field.metadata.clone())
        }
        None => ColumnValue::values(default_name, infer_tag(&values)?, values).nullable(has_nil),
    };
    Ok(column)
}

/// Flattens the items of one list row.
fn row_items<'v>(value: &'v Value, index: usize) -> Result<&'v [Value], CodecError> {
    match value {
        Value::List(items) => Ok(items),
        Value::Column(column) => column.as_values().ok_or_else(|| {
            CodecError::UnsupportedType(format!(
                "list element at index {} is a {} column; only flat value lists can be encoded",
                index, column.tag
            ))
        }),
        other => Err(mismatch("list", other, index)),
    }
}

impl Encoder<'_> {
    pub(crate) fn encode_struct(
        &self,
        declared: &[Field],
        children: &[ColumnValue],
        validity: Option<&[bool]>,
        nullable: bool,
    ) -> Result<Parts, CodecError> {
        if !declared.is_empty() && declared.len() != children.len() {
            return Err(CodecError::TypeMismatch(format!(
                "struct declares {} fields but {} columns were given",
                declared.len(),
                children.len()
            )));
        }

        let mut schemas = Vec::with_capacity(children.len());
        let mut arrays = Vec::with_capacity(children.len());
        for child in children {
            let (schema, array) = self.encode_node(child)?;
            schemas.push(schema);
            arrays.push(array);
        }

        let length = match (validity, arrays.first()) {
            (Some(v), _) => v.len(),
            (None, Some(first)) => first.len()?,
            (None, None) => 0,
        };
        for (child, array) in children.iter().zip(&arrays) {
            let child_len = array.len()?;
            if child_len != length {
                return Err(CodecError::LengthMismatch(length, child_len).in_field(child.name.clone()));
            }
        }

        let mut bits = ValidityBuilder::with_capacity(length);
        if let Some(validity) = validity {
            for (i, valid) in validity.iter().enumerate() {
                if !valid {
                    check_nil(nullable, i)?;
                }
                bits.append(*valid);
            }
        }
        let (null_count, bitmap) = bits.finish()?;

        let mut array = ArrayBuilder::new(length, null_count).buffer(bitmap);
        for child in arrays {
            array = array.child(child);
        }
        Ok(Parts {
            array,
            children: schemas,
            dictionary: None,
        })
    }

    /// Lists and large lists from per-row item lists.
    pub(crate) fn encode_list<O: NativeInt>(
        &self,
        item: Option<&Field>,
        values: &[Value],
        nullable: bool,
    ) -> Result<Parts, CodecError> {
        let mut validity = ValidityBuilder::with_capacity(values.len());
        let mut offsets: Vec<O> = Vec::new();
        offsets.try_reserve_exact(values.len() + 1)?;
        offsets.push(O::zero());
        let mut flat: Vec<Value> = Vec::new();

        for (i, value) in values.iter().enumerate() {
            if value.is_nil() {
                check_nil(nullable, i)?;
                validity.append(false);
            } else {
                let items = row_items(value, i)?;
                flat.try_reserve(items.len())?;
                flat.extend_from_slice(items);
                validity.append(true);
            }
            offsets.push(O::from_index(flat.len()).ok_or_else(|| {
                CodecError::TypeMismatch(format!("{} list items overflow the offset width", flat.len()))
            })?);
        }

        let (child_schema, child_array) = self.encode_node(&child_column(item, "item", flat)?)?;
        let (null_count, bitmap) = validity.finish()?;
        Ok(Parts {
            array: ArrayBuilder::new(values.len(), null_count)
                .buffer(bitmap)
                .buffer(Some(AlignedBuffer::from_slice(&offsets)?))
                .child(child_array),
            children: vec![child_schema],
            dictionary: None,
        })
    }

    /// Fixed-size lists: every valid row has exactly `size` items; a nil row
    /// occupies `size` nil child slots.
    pub(crate) fn encode_fixed_size_list(
        &self,
        size: i32,
        item: Option<&Field>,
        values: &[Value],
        nullable: bool,
    ) -> Result<Parts, CodecError> {
        let size = usize::try_from(size)
            .map_err(|_| CodecError::MalformedSchema(format!("negative list size {}", size)))?;
        let mut validity = ValidityBuilder::with_capacity(values.len());
        let mut flat: Vec<Value> = Vec::new();
        flat.try_reserve_exact(values.len().saturating_mul(size))?;

        for (i, value) in values.iter().enumerate() {
            if value.is_nil() {
                check_nil(nullable, i)?;
                flat.extend(std::iter::repeat(Value::Nil).take(size));
                validity.append(false);
                continue;
            }
            let items = row_items(value, i)?;
            if items.len() != size {
                return Err(CodecError::LengthMismatch(size, items.len()));
            }
            flat.extend_from_slice(items);
            validity.append(true);
        }

        let (child_schema, child_array) = self.encode_node(&child_column(item, "item", flat)?)?;
        let (null_count, bitmap) = validity.finish()?;
        Ok(Parts {
            array: ArrayBuilder::new(values.len(), null_count).buffer(bitmap).child(child_array),
            children: vec![child_schema],
            dictionary: None,
        })
    }

    /// Maps from per-row ordered key/value pairs. Keys must be unique within
    /// a row and can never be nil.
    pub(crate) fn encode_map(
        &self,
        key: Option<&Field>,
        value: Option<&Field>,
        values: &[Value],
        nullable: bool,
    ) -> Result<Parts, CodecError> {
        let mut validity = ValidityBuilder::with_capacity(values.len());
        let mut offsets: Vec<i32> = Vec::new();
        offsets.try_reserve_exact(values.len() + 1)?;
        offsets.push(0);
        let mut keys: Vec<Value> = Vec::new();
        let mut items: Vec<Value> = Vec::new();

        for (i, row) in values.iter().enumerate() {
            match row {
                Value::Nil => {
                    check_nil(nullable, i)?;
                    validity.append(false);
                }
                Value::Map(pairs) => {
                    ensure_unique_keys(pairs)?;
                    for (k, v) in pairs {
                        if k.is_nil() {
                            return Err(CodecError::TypeMismatch(format!("nil map key in row {}", i)));
                        }
                        keys.push(k.clone());
                        items.push(v.clone());
                    }
                    validity.append(true);
                }
                other => return Err(mismatch("map", other, i)),
            }
            offsets.push(i32::from_index(keys.len()).ok_or_else(|| {
                CodecError::TypeMismatch(format!("{} map entries overflow 32-bit offsets", keys.len()))
            })?);
        }

        let n_entries = keys.len();
        let key_column = child_column(key, "key", keys)?.nullable(false);
        let value_column = child_column(value, "value", items)?;
        let (key_schema, key_array) = self.encode_node(&key_column)?;
        let (value_schema, value_array) = self.encode_node(&value_column)?;

        let entries_schema: ArrowSchema = SchemaBuilder::new("+s", "entries")
            .child(key_schema)
            .child(value_schema)
            .build()?;
        let entries_array = ArrayBuilder::new(n_entries, 0)
            .buffer(None)
            .child(key_array)
            .child(value_array)
            .build()?;

        let (null_count, bitmap) = validity.finish()?;
        Ok(Parts {
            array: ArrayBuilder::new(values.len(), null_count)
                .buffer(bitmap)
                .buffer(Some(AlignedBuffer::from_slice(&offsets)?))
                .child(entries_array),
            children: vec![entries_schema],
            dictionary: None,
        })
    }

    /// Run-end encoded columns from their two child columns. The children are
    /// always exported as `run_ends` and `values`.
    pub(crate) fn encode_run_end(
        &self,
        length: usize,
        offset: usize,
        run_ends: &ColumnValue,
        values: &ColumnValue,
    ) -> Result<Parts, CodecError> {
        if !matches!(run_ends.tag, TypeTag::Int16 | TypeTag::Int32 | TypeTag::Int64) {
            return Err(CodecError::TypeMismatch(format!(
                "run ends must be int16, int32 or int64, got {}",
                run_ends.tag
            )));
        }
        let (run_ends_schema, run_ends_array) = self.encode_named(run_ends, "run_ends")?;
        let (values_schema, values_array) = self.encode_named(values, "values")?;
        Ok(Parts {
            array: ArrayBuilder::new(length, 0)
                .offset(offset)
                .child(run_ends_array)
                .child(values_array),
            children: vec![run_ends_schema, values_schema],
            dictionary: None,
        })
    }
}
