//! Shared, low-level helpers used throughout the codec.
//!
//! Its primary responsibilities include:
//! 1.  Providing safe, validated conversions between raw byte slices and typed slices.
//! 2.  Converting the signed 64-bit counts of the C structs into `usize` with a
//!     descriptive error instead of a silent wrap.

use crate::error::CodecError;

//==================================================================================
// 1. Core Utility Functions
//==================================================================================

/// Safely reinterprets a byte slice as a slice of a plain-old-data type.
///
/// This is the gateway for every typed view the decoder takes over a foreign
/// buffer. Length or alignment problems are returned as `CodecError::PodCast`
/// rather than producing an invalid slice.
pub fn safe_bytes_to_typed_slice<T>(bytes: &[u8]) -> Result<&[T], CodecError>
where
    T: bytemuck::Pod,
{
    bytemuck::try_cast_slice(bytes).map_err(CodecError::from)
}

/// Converts a slice of plain-old-data values into an owned `Vec<u8>` (native endian).
#[cfg(test)]
pub fn typed_slice_to_bytes<T: bytemuck::Pod>(data: &[T]) -> Vec<u8> {
    bytemuck::cast_slice(data).to_vec()
}

/// Converts a count from the C structs into a `usize`, rejecting negative values.
pub fn checked_len(value: i64, what: &str) -> Result<usize, CodecError> {
    usize::try_from(value)
        .map_err(|_| CodecError::MalformedArray(format!("{} must be non-negative, got {}", what, value)))
}

/// Converts a `usize` length back into the `i64` used by the C structs.
pub fn to_c_len(value: usize) -> Result<i64, CodecError> {
    i64::try_from(value)
        .map_err(|_| CodecError::InternalError(format!("length {} does not fit in i64", value)))
}
