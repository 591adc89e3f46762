//! Stateless helpers over validity bitmaps, built on `bitvec`.
//!
//! A missing bitmap (null pointer) means every slot is valid.

use bitvec::prelude::*;

use crate::error::CodecError;
use crate::ffi::AlignedBuffer;

/// Returns whether slot `index` is valid. Slots past the end of the bitmap
/// are reported as null.
#[inline]
pub fn is_valid(bitmap: Option<&BitSlice<u8, Lsb0>>, index: usize) -> bool {
    match bitmap {
        None => true,
        Some(bits) => bits.get(index).map_or(false, |b| *b),
    }
}

/// Expands `count` validity bits starting at `start` into booleans.
pub fn validity_to_vec(bitmap: Option<&BitSlice<u8, Lsb0>>, start: usize, count: usize) -> Vec<bool> {
    (start..start + count).map(|i| is_valid(bitmap, i)).collect()
}

/// Accumulates a validity bitmap while values are appended.
#[derive(Debug, Default)]
pub struct ValidityBuilder {
    bits: BitVec<u8, Lsb0>,
    null_count: usize,
}

impl ValidityBuilder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: BitVec::with_capacity(capacity),
            null_count: 0,
        }
    }

    #[inline]
    pub fn append(&mut self, valid: bool) {
        if !valid {
            self.null_count += 1;
        }
        self.bits.push(valid);
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.null_count
    }

    /// Freezes the bitmap. Returns `None` when no slot is null, so the
    /// exported buffer pointer can stay null.
    pub fn finish(self) -> Result<(usize, Option<AlignedBuffer>), CodecError> {
        if self.null_count == 0 {
            return Ok((0, None));
        }
        Ok((self.null_count, Some(AlignedBuffer::from_bits(&self.bits)?)))
    }
}
