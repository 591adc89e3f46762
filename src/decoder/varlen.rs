//! Variable-length layouts (string and binary, 32- or 64-bit offsets):
//! validity in buffer 0, offsets in buffer 1, bytes in buffer 2.

use super::{Decoder, Window};
use crate::error::CodecError;
use crate::ffi::ArrowArray;
use crate::null_handling::is_valid;
use crate::traits::NativeInt;
use crate::types::Value;

impl Decoder<'_> {
    pub(crate) unsafe fn decode_varlen<O: NativeInt>(
        &self,
        array: &ArrowArray,
        w: Window,
        format: &str,
    ) -> Result<Vec<Value>, CodecError> {
        array.expect_buffers(3, format)?;
        if w.count == 0 {
            return Ok(Vec::new());
        }
        let validity = array.bit_buffer(0, w.needed())?;
        let offsets = array.required_buffer::<O>(1, w.needed() + 1)?;
        let data_len = offsets[w.needed()]
            .as_index()
            .ok_or_else(|| CodecError::MalformedArray("negative final offset".into()))?;
        let data = array.typed_buffer::<u8>(2, data_len)?.unwrap_or(&[]);
        if data.len() < data_len {
            return Err(CodecError::MalformedArray("data buffer is null but offsets are non-zero".into()));
        }

        let mut out = Vec::new();
        out.try_reserve_exact(w.count)?;
        for j in w.physical() {
            if !is_valid(validity, j) {
                out.push(Value::Nil);
                continue;
            }
            let start = offsets[j].as_index();
            let end = offsets[j + 1].as_index();
            let (start, end) = match (start, end) {
                (Some(s), Some(e)) if s <= e && e <= data_len => (s, e),
                _ => {
                    return Err(CodecError::MalformedArray(format!(
                        "invalid offsets {}..{} at index {}",
                        offsets[j],
                        offsets[j + 1],
                        j
                    )));
                }
            };
            if start == end && self.config.empty_string_as_nil {
                out.push(Value::Nil);
            } else {
                out.push(Value::Bytes(data[start..end].to_vec()));
            }
        }
        Ok(out)
    }
}
