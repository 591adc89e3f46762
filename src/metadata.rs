//! The binary key/value metadata block carried by `ArrowSchema.metadata`.
//!
//! Layout (all integers are native-endian `i32`):
//!
//! ```text
//! [count] ([key_len][key bytes][value_len][value bytes]) * count
//! ```
//!
//! Keys and values are arbitrary bytes. Entry order is preserved.

use std::ffi::c_char;
use std::io::{Cursor, Read};

use crate::error::CodecError;

/// Ordered key/value pairs of raw bytes.
pub type Metadata = Vec<(Vec<u8>, Vec<u8>)>;

const PREFIX: usize = std::mem::size_of::<i32>();

fn read_i32(cursor: &mut Cursor<&[u8]>, what: &str) -> Result<i32, CodecError> {
    let mut buf = [0u8; PREFIX];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| CodecError::MalformedSchema(format!("metadata truncated while reading {}", what)))?;
    Ok(i32::from_ne_bytes(buf))
}

fn read_chunk(cursor: &mut Cursor<&[u8]>, what: &str) -> Result<Vec<u8>, CodecError> {
    let len = read_i32(cursor, what)?;
    let len = usize::try_from(len)
        .map_err(|_| CodecError::MalformedSchema(format!("negative {} length ({})", what, len)))?;
    let remaining = cursor.get_ref().len().saturating_sub(cursor.position() as usize);
    if len > remaining {
        return Err(CodecError::MalformedSchema(format!("metadata truncated inside {}", what)));
    }
    let mut bytes = vec![0u8; len];
    cursor
        .read_exact(&mut bytes)
        .map_err(|_| CodecError::MalformedSchema(format!("metadata truncated inside {}", what)))?;
    Ok(bytes)
}

/// Parses a metadata block. An empty slice decodes to no entries.
pub fn decode_metadata(bytes: &[u8]) -> Result<Metadata, CodecError> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    let mut cursor = Cursor::new(bytes);
    let count = read_i32(&mut cursor, "entry count")?;
    let count = usize::try_from(count)
        .map_err(|_| CodecError::MalformedSchema(format!("negative metadata entry count ({})", count)))?;

    let mut entries = Vec::new();
    for _ in 0..count {
        let key = read_chunk(&mut cursor, "key")?;
        let value = read_chunk(&mut cursor, "value")?;
        entries.push((key, value));
    }
    Ok(entries)
}

/// Serializes entries into a metadata block.
pub fn encode_metadata(entries: &[(Vec<u8>, Vec<u8>)]) -> Result<Vec<u8>, CodecError> {
    let encode_len = |len: usize, what: &str| {
        i32::try_from(len)
            .map(i32::to_ne_bytes)
            .map_err(|_| CodecError::TypeMismatch(format!("metadata {} longer than i32::MAX", what)))
    };

    let body: usize = entries.iter().map(|(k, v)| 2 * PREFIX + k.len() + v.len()).sum();
    let mut out = Vec::new();
    out.try_reserve_exact(PREFIX + body)?;
    out.extend_from_slice(&encode_len(entries.len(), "entry count")?);
    for (key, value) in entries {
        out.extend_from_slice(&encode_len(key.len(), "key")?);
        out.extend_from_slice(key);
        out.extend_from_slice(&encode_len(value.len(), "value")?);
        out.extend_from_slice(value);
    }
    Ok(out)
}

/// Copies the raw metadata block a C pointer refers to.
///
/// The block carries no total length, so it is measured by walking the
/// length prefixes. A null pointer yields `None`.
///
/// # Safety
/// `ptr` must be null or point to a well-formed metadata block.
pub(crate) unsafe fn raw_metadata(ptr: *const c_char) -> Result<Option<Vec<u8>>, CodecError> {
    if ptr.is_null() {
        return Ok(None);
    }
    let base = ptr as *const u8;
    let read_at = |pos: usize| -> i32 { std::ptr::read_unaligned(base.add(pos) as *const i32) };
    let to_len = |value: i32, what: &str| {
        usize::try_from(value)
            .map_err(|_| CodecError::MalformedSchema(format!("negative metadata {} ({})", what, value)))
    };

    let count = to_len(read_at(0), "entry count")?;
    let mut pos = PREFIX;
    for _ in 0..count {
        pos += PREFIX + to_len(read_at(pos), "key length")?;
        pos += PREFIX + to_len(read_at(pos), "value length")?;
    }
    Ok(Some(std::slice::from_raw_parts(base, pos).to_vec()))
}

/// Decodes the metadata a C pointer refers to. Null or zero entries yield `None`.
///
/// # Safety
/// Same contract as [`raw_metadata`].
pub(crate) unsafe fn metadata_from_ptr(ptr: *const c_char) -> Result<Option<Metadata>, CodecError> {
    match raw_metadata(ptr)? {
        None => Ok(None),
        Some(bytes) => {
            let entries = decode_metadata(&bytes)?;
            Ok(if entries.is_empty() { None } else { Some(entries) })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(k: &str, v: &str) -> (Vec<u8>, Vec<u8>) {
        (k.as_bytes().to_vec(), v.as_bytes().to_vec())
    }

    #[test]
    fn test_encode_layout_is_native_endian_prefixed() {
        let bytes = encode_metadata(&[entry("ab", "c")]).unwrap();
        let mut expected = Vec::new();
        expected.extend_from_slice(&1i32.to_ne_bytes());
        expected.extend_from_slice(&2i32.to_ne_bytes());
        expected.extend_from_slice(b"ab");
        expected.extend_from_slice(&1i32.to_ne_bytes());
        expected.extend_from_slice(b"c");
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_decode_preserves_order_and_empty_values() {
        let entries = vec![entry("z", ""), entry("a", "1"), entry("", "x")];
        let bytes = encode_metadata(&entries).unwrap();
        assert_eq!(decode_metadata(&bytes).unwrap(), entries);
    }

    #[test]
    fn test_empty_input_decodes_to_nothing() {
        assert!(decode_metadata(&[]).unwrap().is_empty());
        let zero = encode_metadata(&[]).unwrap();
        assert_eq!(zero, 0i32.to_ne_bytes().to_vec());
        assert!(decode_metadata(&zero).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_and_negative_lengths_are_malformed() {
        let mut bytes = encode_metadata(&[entry("key", "value")]).unwrap();
        bytes.truncate(bytes.len() - 2);
        assert!(matches!(decode_metadata(&bytes), Err(CodecError::MalformedSchema(_))));

        let mut negative = Vec::new();
        negative.extend_from_slice(&1i32.to_ne_bytes());
        negative.extend_from_slice(&(-4i32).to_ne_bytes());
        assert!(matches!(decode_metadata(&negative), Err(CodecError::MalformedSchema(_))));
    }

    #[test]
    fn test_raw_metadata_measures_block_from_pointer() {
        let entries = vec![entry("k1", "v1"), entry("k2", "longer value")];
        let mut bytes = encode_metadata(&entries).unwrap();
        let expected_len = bytes.len();
        // Trailing garbage must not be included in the measured block.
        bytes.extend_from_slice(&[0xAA; 8]);

        let raw = unsafe { raw_metadata(bytes.as_ptr() as *const c_char) }.unwrap().unwrap();
        assert_eq!(raw.len(), expected_len);
        let decoded = unsafe { metadata_from_ptr(bytes.as_ptr() as *const c_char) }.unwrap();
        assert_eq!(decoded, Some(entries));
        assert_eq!(unsafe { metadata_from_ptr(std::ptr::null()) }.unwrap(), None);
    }
}
