//! Dictionary-encoded columns: an integer key array whose `dictionary`
//! points at the encoded value column.

use super::{Encoder, Parts};
use crate::error::CodecError;
use crate::types::{ColumnValue, TypeTag};

impl Encoder<'_> {
    pub(crate) fn encode_dictionary(
        &self,
        index: &TypeTag,
        key: &ColumnValue,
        value: &ColumnValue,
    ) -> Result<Parts, CodecError> {
        if !index.is_integer() {
            return Err(CodecError::TypeMismatch(format!(
                "dictionary keys must be one of the integer types, got {}",
                index
            )));
        }
        if key.tag != *index {
            return Err(CodecError::TypeMismatch(format!(
                "dictionary declares {} keys but the key column is {}",
                index, key.tag
            )));
        }
        let keys = key.as_values().ok_or_else(|| {
            CodecError::TypeMismatch("dictionary keys must be a plain value list".into())
        })?;

        // The value column is fully built before the keys, so a bad key drops
        // (and releases) it on the way out.
        let (value_schema, value_array) = self.encode_node(value)?;
        let mut parts = self.encode_values(index, keys, key.nullable)?;
        parts.array = parts.array.dictionary(value_array);
        parts.dictionary = Some(value_schema);
        Ok(parts)
    }
}
