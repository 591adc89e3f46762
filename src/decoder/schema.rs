//! Schema-only description of a result set.
//!
//! A batch arrives as a top-level struct. Describing it returns one
//! [`ColumnValue`] per struct child carrying name, type, nullability and
//! metadata. When the batch array is supplied, each child array is moved
//! into an [`ArrayHandle`] so it can be decoded later, after the batch
//! itself has been released.

use crate::error::CodecError;
use crate::ffi::{ArrayHandle, ArrowArray, ArrowSchema};
use crate::types::{ColumnData, ColumnValue, Field, TypeTag};

/// Describes the columns of a top-level struct schema.
///
/// Without an array, every column's data is an empty value list. With one,
/// the child arrays are moved out of `array` (leaving released structs
/// behind) and parked in handles together with a private schema copy.
///
/// # Safety
/// `schema` and `array` must be valid Arrow C Data Interface structs.
/// `array` must be owned by the caller, since its children are moved out.
pub unsafe fn describe_schema(
    schema: &ArrowSchema,
    array: Option<&mut ArrowArray>,
) -> Result<Vec<ColumnValue>, CodecError> {
    let root = Field::from_schema(schema)?;
    let TypeTag::Struct(fields) = root.tag else {
        return Err(CodecError::MalformedSchema(format!(
            "a result set must be a struct, got {}",
            root.tag
        )));
    };
    log::debug!("describing {} columns", fields.len());

    let Some(array) = array else {
        return Ok(fields
            .into_iter()
            .map(|field| column_of(field, ColumnData::Values(Vec::new())))
            .collect());
    };

    if array.is_released() {
        return Err(CodecError::MalformedArray("array has already been released".into()));
    }
    // Validate everything before the first child is moved, so an error leaves
    // the batch untouched.
    // Handles decode their child from row 0, so a sliced batch cannot be split.
    if array.offset()? != 0 {
        return Err(CodecError::MalformedArray(format!(
            "cannot describe a batch with a non-zero offset ({})",
            array.offset
        )));
    }
    if array.child_count()? != fields.len() {
        return Err(CodecError::MalformedArray(format!(
            "schema has {} columns but the array has {} children",
            fields.len(),
            array.n_children
        )));
    }
    let mut copies = Vec::with_capacity(fields.len());
    for i in 0..fields.len() {
        if array.child(i)?.is_released() {
            return Err(CodecError::MalformedArray(format!("column {} has already been moved out", i))
                .in_field(fields[i].name.clone()));
        }
        copies.push(schema.child(i)?.deep_copy()?);
    }

    let mut columns = Vec::with_capacity(fields.len());
    for (i, (field, copy)) in fields.into_iter().zip(copies).enumerate() {
        let child = ArrowArray::take(array.child_mut(i)?);
        log::trace!("moved column '{}' into a handle", field.name);
        columns.push(column_of(field, ColumnData::Handle(ArrayHandle::new(copy, child))));
    }
    Ok(columns)
}

fn column_of(field: Field, data: ColumnData) -> ColumnValue {
    ColumnValue {
        name: field.name,
        tag: field.tag,
        nullable: field.nullable,
        metadata: field.metadata,
        data,
    }
}
