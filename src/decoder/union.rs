//! Union layouts. Buffer 0 holds the `i8` type id of every row; dense unions
//! add an `i32` offset into the selected child in buffer 1, sparse unions
//! index every child with the row number itself.

use super::{Decoder, Window};
use crate::error::CodecError;
use crate::ffi::{ArrowArray, ArrowSchema};
use crate::types::{Field, Value};

impl Decoder<'_> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) unsafe fn decode_union(
        &self,
        type_ids: &[i8],
        variants: &[Field],
        schema: &ArrowSchema,
        array: &ArrowArray,
        w: Window,
        format: &str,
        dense: bool,
        depth: usize,
    ) -> Result<Vec<Value>, CodecError> {
        array.expect_buffers(if dense { 2 } else { 1 }, format)?;
        if array.child_count()? != variants.len() {
            return Err(CodecError::MalformedArray(format!(
                "union declares {} variants but the array has {} children",
                variants.len(),
                array.n_children
            )));
        }
        let ids = array.required_buffer::<i8>(0, w.needed())?;
        let offsets = if dense {
            Some(array.required_buffer::<i32>(1, w.needed())?)
        } else {
            None
        };

        let mut out = Vec::new();
        out.try_reserve_exact(w.count)?;
        for j in w.physical() {
            let type_id = ids[j];
            let child = type_ids.iter().position(|id| *id == type_id).ok_or_else(|| {
                CodecError::MalformedArray(format!(
                    "invalid child type id {} at index {} (declared ids {:?})",
                    type_id, j, type_ids
                ))
            })?;
            let child_index = match offsets {
                Some(offsets) => usize::try_from(offsets[j]).map_err(|_| {
                    CodecError::MalformedArray(format!("negative union offset {} at index {}", offsets[j], j))
                })?,
                None => j,
            };

            let variant = &variants[child];
            let mut decoded = self.decode_elements(
                variant,
                schema.child(child)?,
                array.child(child)?,
                child_index,
                1,
                depth + 1,
            )?;
            let value = decoded
                .pop()
                .ok_or_else(|| CodecError::InternalError("union variant decoded to no value".into()))?;
            out.push(Value::Union {
                variant: variant.name.clone(),
                value: Box::new(value),
            });
        }
        Ok(out)
    }
}
