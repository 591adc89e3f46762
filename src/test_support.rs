//! Helpers shared by the unit tests: moving arrays across the C Data Interface
//! between arrow-rs and this crate's ABI structs.

use std::mem::ManuallyDrop;
use std::ptr;

use arrow::array::{Array, ArrayData};
use arrow::ffi::{FFI_ArrowArray, FFI_ArrowSchema};

use crate::ffi::{AlignedBuffer, ArrayBuilder, ArrowArray, ArrowSchema, SchemaBuilder};
use crate::types::{ColumnValue, Value};

/// Exports an arrow-rs array. The returned structs own the arrow buffers.
pub(crate) fn export(array: &dyn Array) -> (ArrowSchema, ArrowArray) {
    let (ffi_array, ffi_schema) = arrow::ffi::to_ffi(&array.to_data()).unwrap();
    let ffi_array = ManuallyDrop::new(ffi_array);
    let ffi_schema = ManuallyDrop::new(ffi_schema);
    unsafe {
        (
            ptr::read(&*ffi_schema as *const FFI_ArrowSchema as *const ArrowSchema),
            ptr::read(&*ffi_array as *const FFI_ArrowArray as *const ArrowArray),
        )
    }
}

/// Imports an exported pair into arrow-rs, which takes over both structs.
pub(crate) fn import(schema: ArrowSchema, array: ArrowArray) -> ArrayData {
    let schema = ManuallyDrop::new(schema);
    let array = ManuallyDrop::new(array);
    unsafe {
        let ffi_schema = ptr::read(&*schema as *const ArrowSchema as *const FFI_ArrowSchema);
        let ffi_array = ptr::read(&*array as *const ArrowArray as *const FFI_ArrowArray);
        arrow::ffi::from_ffi(ffi_array, &ffi_schema).unwrap()
    }
}

/// A utf8 array built by hand from raw offsets and bytes, without a bitmap.
pub(crate) fn utf8_array(offsets: &[i32], data: &[u8]) -> ArrowArray {
    ArrayBuilder::new(offsets.len() - 1, 0)
        .buffer(None)
        .buffer(Some(AlignedBuffer::from_slice(offsets).unwrap()))
        .buffer(Some(AlignedBuffer::from_bytes(data).unwrap()))
        .build()
        .unwrap()
}

/// A fixed-width array of `values`, without a bitmap.
pub(crate) fn fixed_array<T: bytemuck::Pod>(values: &[T]) -> ArrowArray {
    ArrayBuilder::new(values.len(), 0)
        .buffer(None)
        .buffer(Some(AlignedBuffer::from_slice(values).unwrap()))
        .build()
        .unwrap()
}

pub(crate) fn leaf_schema(format: &str, name: &str) -> ArrowSchema {
    SchemaBuilder::new(format, name).nullable(true).build().unwrap()
}

pub(crate) fn values_of(column: &ColumnValue) -> Vec<Value> {
    column.as_values().expect("column holds plain values").to_vec()
}
