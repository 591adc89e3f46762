//! Owned, aligned buffers handed to consumers through `ArrowArray.buffers`.
//!
//! Storage is a `Vec<u128>`, so every buffer is at least 16-byte aligned. That
//! satisfies the alignment checks arrow-rs applies on import for every
//! primitive width up to `decimal256`.

use bitvec::prelude::*;

use crate::error::CodecError;

#[derive(Debug, Default)]
pub struct AlignedBuffer {
    words: Vec<u128>,
    len: usize,
}

const WORD: usize = std::mem::size_of::<u128>();

impl AlignedBuffer {
    /// Copies `bytes` into a fresh aligned allocation.
    ///
    /// The allocation always holds at least one word, so even an empty buffer
    /// exports a non-null pointer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let n_words = bytes.len().div_ceil(WORD).max(1);
        let mut words: Vec<u128> = Vec::new();
        words.try_reserve_exact(n_words)?;
        words.resize(n_words, 0);
        bytemuck::cast_slice_mut::<u128, u8>(&mut words)[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            words,
            len: bytes.len(),
        })
    }

    pub fn from_slice<T: bytemuck::Pod>(values: &[T]) -> Result<Self, CodecError> {
        Self::from_bytes(bytemuck::cast_slice(values))
    }

    /// Packs a bit vector (validity or boolean data) into a buffer.
    pub fn from_bits(bits: &BitVec<u8, Lsb0>) -> Result<Self, CodecError> {
        Self::from_bytes(bits.as_raw_slice())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<u128, u8>(&self.words)[..self.len]
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.words.as_ptr() as *const u8
    }
}
