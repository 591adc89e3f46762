//! The two structs of the Arrow C Data Interface, laid out exactly as the ABI
//! requires, plus checked accessors the decoder uses to walk them.
//!
//! Both structs follow the same ownership rule as arrow-rs' `FFI_ArrowSchema`
//! and `FFI_ArrowArray`: a value that still carries a `release` callback owns
//! its resources and releases them on drop. A struct reached through a
//! borrowed pointer is never dropped by this crate.

use std::borrow::Cow;
use std::ffi::{c_char, c_void, CStr};
use std::ptr;

use bitvec::prelude::*;

use crate::error::CodecError;
use crate::utils::{checked_len, safe_bytes_to_typed_slice};

/// Schema flag: the field may contain nulls.
pub const ARROW_FLAG_NULLABLE: i64 = 2;

/// `struct ArrowSchema` from the Arrow C Data Interface.
#[repr(C)]
#[derive(Debug)]
pub struct ArrowSchema {
    pub format: *const c_char,
    pub name: *const c_char,
    pub metadata: *const c_char,
    pub flags: i64,
    pub n_children: i64,
    pub children: *mut *mut ArrowSchema,
    pub dictionary: *mut ArrowSchema,
    pub release: Option<unsafe extern "C" fn(arg1: *mut ArrowSchema)>,
    pub private_data: *mut c_void,
}

/// `struct ArrowArray` from the Arrow C Data Interface.
#[repr(C)]
#[derive(Debug)]
pub struct ArrowArray {
    pub length: i64,
    pub null_count: i64,
    pub offset: i64,
    pub n_buffers: i64,
    pub n_children: i64,
    pub buffers: *mut *const c_void,
    pub children: *mut *mut ArrowArray,
    pub dictionary: *mut ArrowArray,
    pub release: Option<unsafe extern "C" fn(arg1: *mut ArrowArray)>,
    pub private_data: *mut c_void,
}

// The C Data Interface allows a released-by-callback struct to be moved to and
// released from any thread.
unsafe impl Send for ArrowSchema {}
unsafe impl Send for ArrowArray {}

impl Drop for ArrowSchema {
    fn drop(&mut self) {
        if let Some(release) = self.release {
            unsafe { release(self) };
        }
    }
}

impl Drop for ArrowArray {
    fn drop(&mut self) {
        if let Some(release) = self.release {
            unsafe { release(self) };
        }
    }
}

//==================================================================================
// 1. ArrowSchema accessors
//==================================================================================

impl ArrowSchema {
    /// A released, all-null schema. Used as the target of moves.
    pub const fn empty() -> Self {
        Self {
            format: ptr::null(),
            name: ptr::null(),
            metadata: ptr::null(),
            flags: 0,
            n_children: 0,
            children: ptr::null_mut(),
            dictionary: ptr::null_mut(),
            release: None,
            private_data: ptr::null_mut(),
        }
    }

    pub fn is_released(&self) -> bool {
        self.release.is_none()
    }

    /// The format string. A null pointer or non-UTF-8 bytes are malformed.
    pub fn format(&self) -> Result<&str, CodecError> {
        if self.format.is_null() {
            return Err(CodecError::MalformedSchema("format string is null".into()));
        }
        unsafe { CStr::from_ptr(self.format) }
            .to_str()
            .map_err(|_| CodecError::MalformedSchema("format string is not valid UTF-8".into()))
    }

    /// The field name. A null pointer reads as the empty name.
    pub fn name(&self) -> Cow<'_, str> {
        if self.name.is_null() {
            return Cow::Borrowed("");
        }
        unsafe { CStr::from_ptr(self.name) }.to_string_lossy()
    }

    pub fn is_nullable(&self) -> bool {
        self.flags & ARROW_FLAG_NULLABLE != 0
    }

    pub fn child_count(&self) -> Result<usize, CodecError> {
        let n = usize::try_from(self.n_children).map_err(|_| {
            CodecError::MalformedSchema(format!("negative n_children ({})", self.n_children))
        })?;
        if n > 0 && self.children.is_null() {
            return Err(CodecError::MalformedSchema(format!(
                "n_children is {} but the children pointer is null",
                n
            )));
        }
        Ok(n)
    }

    pub fn child(&self, index: usize) -> Result<&ArrowSchema, CodecError> {
        let n = self.child_count()?;
        if index >= n {
            return Err(CodecError::MalformedSchema(format!(
                "child {} requested but schema has {} children",
                index, n
            )));
        }
        let child = unsafe { *self.children.add(index) };
        if child.is_null() {
            return Err(CodecError::MalformedSchema(format!("child schema {} is null", index)));
        }
        Ok(unsafe { &*child })
    }

    /// Owned copy of the whole schema tree, independent of this one's lifetime.
    pub fn deep_copy(&self) -> Result<ArrowSchema, CodecError> {
        super::export::copy_schema(self)
    }

    pub fn dictionary(&self) -> Option<&ArrowSchema> {
        if self.dictionary.is_null() {
            None
        } else {
            Some(unsafe { &*self.dictionary })
        }
    }
}

//==================================================================================
// 2. ArrowArray accessors
//==================================================================================

impl ArrowArray {
    /// A released, all-null array. Used as the target of moves.
    pub const fn empty() -> Self {
        Self {
            length: 0,
            null_count: 0,
            offset: 0,
            n_buffers: 0,
            n_children: 0,
            buffers: ptr::null_mut(),
            children: ptr::null_mut(),
            dictionary: ptr::null_mut(),
            release: None,
            private_data: ptr::null_mut(),
        }
    }

    pub fn is_released(&self) -> bool {
        self.release.is_none()
    }

    /// Moves the array out of `slot`, leaving a released struct behind.
    pub fn take(slot: &mut ArrowArray) -> ArrowArray {
        std::mem::replace(slot, ArrowArray::empty())
    }

    pub fn len(&self) -> Result<usize, CodecError> {
        checked_len(self.length, "ArrowArray.length")
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn offset(&self) -> Result<usize, CodecError> {
        checked_len(self.offset, "ArrowArray.offset")
    }

    /// Checks `n_buffers` against the count the layout of `format` requires.
    pub fn expect_buffers(&self, expected: i64, format: &str) -> Result<(), CodecError> {
        if self.n_buffers != expected {
            return Err(CodecError::MalformedArray(format!(
                "expected {} buffers for format `{}`, got {}",
                expected, format, self.n_buffers
            )));
        }
        if expected > 0 && self.buffers.is_null() {
            return Err(CodecError::MalformedArray("buffers pointer is null".into()));
        }
        Ok(())
    }

    /// Raw pointer to buffer `index`, which may itself be null.
    pub fn buffer_ptr(&self, index: usize) -> Result<*const u8, CodecError> {
        let n = checked_len(self.n_buffers, "ArrowArray.n_buffers")?;
        if index >= n || self.buffers.is_null() {
            return Err(CodecError::MalformedArray(format!(
                "buffer {} requested but array has {} buffers",
                index, n
            )));
        }
        Ok(unsafe { *self.buffers.add(index) } as *const u8)
    }

    /// Typed view over the first `len` elements of buffer `index`.
    ///
    /// Returns `None` for a null buffer pointer.
    ///
    /// # Safety
    /// The producer must guarantee the buffer holds at least `len` elements of `T`.
    pub unsafe fn typed_buffer<T: bytemuck::Pod>(
        &self,
        index: usize,
        len: usize,
    ) -> Result<Option<&[T]>, CodecError> {
        let ptr = self.buffer_ptr(index)?;
        if ptr.is_null() {
            return Ok(None);
        }
        if len == 0 {
            return Ok(Some(&[]));
        }
        let byte_len = len
            .checked_mul(std::mem::size_of::<T>())
            .ok_or_else(|| CodecError::MalformedArray(format!("buffer {} is too large", index)))?;
        let bytes = std::slice::from_raw_parts(ptr, byte_len);
        safe_bytes_to_typed_slice::<T>(bytes).map(Some)
    }

    /// Like [`ArrowArray::typed_buffer`], but a null pointer is an error.
    ///
    /// # Safety
    /// Same contract as [`ArrowArray::typed_buffer`].
    pub unsafe fn required_buffer<T: bytemuck::Pod>(
        &self,
        index: usize,
        len: usize,
    ) -> Result<&[T], CodecError> {
        if len == 0 {
            return Ok(&[]);
        }
        self.typed_buffer::<T>(index, len)?
            .ok_or_else(|| CodecError::MalformedArray(format!("buffer {} is null", index)))
    }

    /// Bit view over the first `bits` bits of buffer `index` (validity or boolean data).
    ///
    /// # Safety
    /// The producer must guarantee the buffer holds at least `ceil(bits / 8)` bytes.
    pub unsafe fn bit_buffer(
        &self,
        index: usize,
        bits: usize,
    ) -> Result<Option<&BitSlice<u8, Lsb0>>, CodecError> {
        let bytes = self.typed_buffer::<u8>(index, bits.div_ceil(8))?;
        Ok(bytes.map(|b| &BitSlice::<u8, Lsb0>::from_slice(b)[..bits]))
    }

    pub fn child_count(&self) -> Result<usize, CodecError> {
        let n = checked_len(self.n_children, "ArrowArray.n_children")?;
        if n > 0 && self.children.is_null() {
            return Err(CodecError::MalformedArray(format!(
                "n_children is {} but the children pointer is null",
                n
            )));
        }
        Ok(n)
    }

    pub fn child(&self, index: usize) -> Result<&ArrowArray, CodecError> {
        let n = self.child_count()?;
        if index >= n {
            return Err(CodecError::MalformedArray(format!(
                "child {} requested but array has {} children",
                index, n
            )));
        }
        let child = unsafe { *self.children.add(index) };
        if child.is_null() {
            return Err(CodecError::MalformedArray(format!("child array {} is null", index)));
        }
        Ok(unsafe { &*child })
    }

    /// Mutable access to a child, used when moving children out of a batch.
    pub fn child_mut(&mut self, index: usize) -> Result<&mut ArrowArray, CodecError> {
        let n = self.child_count()?;
        if index >= n {
            return Err(CodecError::MalformedArray(format!(
                "child {} requested but array has {} children",
                index, n
            )));
        }
        let child = unsafe { *self.children.add(index) };
        if child.is_null() {
            return Err(CodecError::MalformedArray(format!("child array {} is null", index)));
        }
        Ok(unsafe { &mut *child })
    }

    pub fn dictionary(&self) -> Option<&ArrowArray> {
        if self.dictionary.is_null() {
            None
        } else {
            Some(unsafe { &*self.dictionary })
        }
    }
}
