//! Construction of owned `ArrowSchema`/`ArrowArray` structs.
//!
//! Every struct produced here stores its backing memory in a private holder
//! behind `private_data`. The release callback reclaims the holder (which in
//! turn drops and releases any children still owned by it) and then zeroes
//! the struct, marking it released.

use std::ffi::{c_void, CString};
use std::ptr;

use super::abi::{ArrowArray, ArrowSchema, ARROW_FLAG_NULLABLE};
use super::buffer::AlignedBuffer;
use crate::error::CodecError;
use crate::metadata::{self, Metadata};
use crate::utils::to_c_len;

//==================================================================================
// 1. Schema construction
//==================================================================================

/// Keeps the strings and children of an exported schema alive.
struct SchemaHolder {
    _format: CString,
    _name: CString,
    _metadata: Option<Vec<u8>>,
    children: Vec<Box<ArrowSchema>>,
    child_ptrs: Vec<*mut ArrowSchema>,
    dictionary: Option<Box<ArrowSchema>>,
}

/// Releases an exported schema by dropping its holder and zeroing the struct.
///
/// # Safety
/// `schema` must have been produced by [`SchemaBuilder::build`].
unsafe extern "C" fn release_schema(schema: *mut ArrowSchema) {
    if schema.is_null() || (*schema).release.is_none() {
        return;
    }
    let private = (*schema).private_data as *mut SchemaHolder;
    if !private.is_null() {
        drop(Box::from_raw(private));
    }
    ptr::write_bytes(schema, 0, 1);
}

#[derive(Debug)]
pub struct SchemaBuilder {
    format: String,
    name: String,
    flags: i64,
    metadata: Option<Vec<u8>>,
    children: Vec<ArrowSchema>,
    dictionary: Option<ArrowSchema>,
}

impl SchemaBuilder {
    pub fn new(format: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            name: name.into(),
            flags: 0,
            metadata: None,
            children: Vec::new(),
            dictionary: None,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        if nullable {
            self.flags |= ARROW_FLAG_NULLABLE;
        } else {
            self.flags &= !ARROW_FLAG_NULLABLE;
        }
        self
    }

    pub fn flags(mut self, flags: i64) -> Self {
        self.flags = flags;
        self
    }

    /// Attaches metadata. `None` and an empty list both export a null pointer.
    pub fn metadata(mut self, metadata: Option<&Metadata>) -> Result<Self, CodecError> {
        self.metadata = match metadata {
            Some(entries) if !entries.is_empty() => Some(metadata::encode_metadata(entries)?),
            _ => None,
        };
        Ok(self)
    }

    /// Attaches metadata that is already in its binary form.
    pub fn raw_metadata(mut self, bytes: Option<Vec<u8>>) -> Self {
        self.metadata = bytes;
        self
    }

    pub fn child(mut self, child: ArrowSchema) -> Self {
        self.children.push(child);
        self
    }

    pub fn dictionary(mut self, dictionary: ArrowSchema) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    pub fn build(self) -> Result<ArrowSchema, CodecError> {
        let format = CString::new(self.format)
            .map_err(|_| CodecError::MalformedSchema("format contains a NUL byte".into()))?;
        let name = CString::new(self.name)
            .map_err(|_| CodecError::MalformedSchema("name contains a NUL byte".into()))?;

        let mut children: Vec<Box<ArrowSchema>> = self.children.into_iter().map(Box::new).collect();
        let child_ptrs: Vec<*mut ArrowSchema> =
            children.iter_mut().map(|c| c.as_mut() as *mut ArrowSchema).collect();
        let mut dictionary = self.dictionary.map(Box::new);

        let mut holder = Box::new(SchemaHolder {
            _format: format,
            _name: name,
            _metadata: self.metadata,
            children: Vec::new(),
            child_ptrs,
            dictionary: None,
        });

        let schema = ArrowSchema {
            format: holder._format.as_ptr(),
            name: holder._name.as_ptr(),
            metadata: holder
                ._metadata
                .as_ref()
                .map_or(ptr::null(), |m| m.as_ptr() as *const _),
            flags: self.flags,
            n_children: to_c_len(children.len())?,
            children: if holder.child_ptrs.is_empty() {
                ptr::null_mut()
            } else {
                holder.child_ptrs.as_mut_ptr()
            },
            dictionary: dictionary
                .as_mut()
                .map_or(ptr::null_mut(), |d| d.as_mut() as *mut ArrowSchema),
            release: Some(release_schema),
            private_data: ptr::null_mut(),
        };
        holder.children = std::mem::take(&mut children);
        holder.dictionary = dictionary;

        let mut schema = schema;
        schema.private_data = Box::into_raw(holder) as *mut c_void;
        Ok(schema)
    }
}

/// Deep-copies a schema tree, including names, flags, metadata and dictionary.
pub fn copy_schema(schema: &ArrowSchema) -> Result<ArrowSchema, CodecError> {
    let mut builder = SchemaBuilder::new(schema.format()?, schema.name())
        .flags(schema.flags)
        .raw_metadata(unsafe { metadata::raw_metadata(schema.metadata)? });
    for i in 0..schema.child_count()? {
        builder = builder.child(copy_schema(schema.child(i)?)?);
    }
    if let Some(dictionary) = schema.dictionary() {
        builder = builder.dictionary(copy_schema(dictionary)?);
    }
    builder.build()
}

//==================================================================================
// 2. Array construction
//==================================================================================

/// Keeps the buffers and children of an exported array alive.
struct ArrayHolder {
    _buffers: Vec<Option<AlignedBuffer>>,
    buffer_ptrs: Vec<*const c_void>,
    children: Vec<Box<ArrowArray>>,
    child_ptrs: Vec<*mut ArrowArray>,
    dictionary: Option<Box<ArrowArray>>,
}

/// Releases an exported array by dropping its holder and zeroing the struct.
///
/// # Safety
/// `array` must have been produced by [`ArrayBuilder::build`].
unsafe extern "C" fn release_array(array: *mut ArrowArray) {
    if array.is_null() || (*array).release.is_none() {
        return;
    }
    let private = (*array).private_data as *mut ArrayHolder;
    if !private.is_null() {
        drop(Box::from_raw(private));
    }
    ptr::write_bytes(array, 0, 1);
}

/// Collects the pieces of one array node before it is frozen into an `ArrowArray`.
#[derive(Debug, Default)]
pub struct ArrayBuilder {
    length: usize,
    null_count: usize,
    offset: usize,
    buffers: Vec<Option<AlignedBuffer>>,
    children: Vec<ArrowArray>,
    dictionary: Option<ArrowArray>,
}

impl ArrayBuilder {
    pub fn new(length: usize, null_count: usize) -> Self {
        Self {
            length,
            null_count,
            ..Self::default()
        }
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Appends a buffer slot. `None` exports a null pointer (e.g. no validity bitmap).
    pub fn buffer(mut self, buffer: Option<AlignedBuffer>) -> Self {
        self.buffers.push(buffer);
        self
    }

    pub fn child(mut self, child: ArrowArray) -> Self {
        self.children.push(child);
        self
    }

    pub fn dictionary(mut self, dictionary: ArrowArray) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    pub fn build(self) -> Result<ArrowArray, CodecError> {
        let buffer_ptrs: Vec<*const c_void> = self
            .buffers
            .iter()
            .map(|b| b.as_ref().map_or(ptr::null(), |b| b.as_ptr() as *const c_void))
            .collect();
        let mut children: Vec<Box<ArrowArray>> = self.children.into_iter().map(Box::new).collect();
        let child_ptrs: Vec<*mut ArrowArray> =
            children.iter_mut().map(|c| c.as_mut() as *mut ArrowArray).collect();
        let mut dictionary = self.dictionary.map(Box::new);

        let n_buffers = to_c_len(buffer_ptrs.len())?;
        let n_children = to_c_len(children.len())?;
        let mut holder = Box::new(ArrayHolder {
            _buffers: self.buffers,
            buffer_ptrs,
            children: Vec::new(),
            child_ptrs,
            dictionary: None,
        });

        let mut array = ArrowArray {
            length: to_c_len(self.length)?,
            null_count: to_c_len(self.null_count)?,
            offset: to_c_len(self.offset)?,
            n_buffers,
            n_children,
            buffers: if holder.buffer_ptrs.is_empty() {
                ptr::null_mut()
            } else {
                holder.buffer_ptrs.as_mut_ptr()
            },
            children: if holder.child_ptrs.is_empty() {
                ptr::null_mut()
            } else {
                holder.child_ptrs.as_mut_ptr()
            },
            dictionary: dictionary
                .as_mut()
                .map_or(ptr::null_mut(), |d| d.as_mut() as *mut ArrowArray),
            release: Some(release_array),
            private_data: ptr::null_mut(),
        };
        holder.children = std::mem::take(&mut children);
        holder.dictionary = dictionary;
        array.private_data = Box::into_raw(holder) as *mut c_void;
        Ok(array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_zeroes_schema_and_children() {
        let child = SchemaBuilder::new("l", "item").nullable(true).build().unwrap();
        let mut schema = SchemaBuilder::new("+l", "xs").child(child).build().unwrap();
        assert_eq!(schema.format().unwrap(), "+l");
        assert_eq!(schema.child(0).unwrap().name(), "item");
        assert!(schema.child(0).unwrap().is_nullable());

        let release = schema.release.unwrap();
        unsafe { release(&mut schema) };
        assert!(schema.is_released());
        assert!(schema.private_data.is_null());
        // Dropping a released struct is a no-op.
        drop(schema);
    }

    #[test]
    fn test_array_builder_exposes_buffers_and_null_slots() {
        let data = AlignedBuffer::from_slice(&[7i32, 8, 9]).unwrap();
        let array = ArrayBuilder::new(3, 0).buffer(None).buffer(Some(data)).build().unwrap();
        assert_eq!(array.n_buffers, 2);
        assert!(array.buffer_ptr(0).unwrap().is_null());
        let values = unsafe { array.required_buffer::<i32>(1, 3) }.unwrap();
        assert_eq!(values, &[7, 8, 9]);
    }

    #[test]
    fn test_moved_child_survives_parent_release() {
        let child = ArrayBuilder::new(2, 0)
            .buffer(None)
            .buffer(Some(AlignedBuffer::from_slice(&[1i64, 2]).unwrap()))
            .build()
            .unwrap();
        let mut parent = ArrayBuilder::new(2, 0).buffer(None).child(child).build().unwrap();

        let moved = ArrowArray::take(parent.child_mut(0).unwrap());
        drop(parent);

        assert!(!moved.is_released());
        let values = unsafe { moved.required_buffer::<i64>(1, 2) }.unwrap();
        assert_eq!(values, &[1, 2]);
    }

    #[test]
    fn test_copy_schema_is_independent() {
        let md = vec![(b"k".to_vec(), b"v".to_vec())];
        let original = SchemaBuilder::new("i", "n")
            .nullable(true)
            .metadata(Some(&md))
            .unwrap()
            .build()
            .unwrap();
        let copy = copy_schema(&original).unwrap();
        drop(original);
        assert_eq!(copy.format().unwrap(), "i");
        assert_eq!(copy.name(), "n");
        assert!(copy.is_nullable());
        let decoded = unsafe { metadata::metadata_from_ptr(copy.metadata) }.unwrap();
        assert_eq!(decoded, Some(md));
    }
}
