// In: src/config.rs

//! The single source of truth for codec behaviour switches.
//!
//! `CodecConfig` is created once by the caller (directly, or from a JSON
//! document) and passed by reference into the decoder and encoder. All fields
//! default to the behaviour existing consumers of the codec rely on.

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

//==================================================================================
// I. The Unified CodecConfig
//==================================================================================

/// Behaviour switches shared by the decoder and the encoder.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CodecConfig {
    /// If true, a zero-length string or binary element decodes to nil even when
    /// its validity bit is set. Consumers written against the legacy codec
    /// cannot tell an empty string from a null, so this stays on by default.
    #[serde(default = "default_true")]
    pub empty_string_as_nil: bool,

    /// If true, `string`/`large_string` payloads must be valid UTF-8 when encoding.
    #[serde(default)]
    pub validate_utf8: bool,

    /// If true, `ArrowArray.offset` is added to every buffer index. Producers
    /// that hand over pre-sliced arrays need this; turning it off reproduces
    /// the legacy reader, which ignored the field.
    #[serde(default = "default_true")]
    pub honor_array_offset: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            empty_string_as_nil: true,
            validate_utf8: false,
            honor_array_offset: true,
        }
    }
}

impl CodecConfig {
    /// Parses a config from a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Helper for `serde` to default a boolean field to true.
fn default_true() -> bool {
    true
}

//==================================================================================
// II. Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_yields_defaults() {
        let config = CodecConfig::from_json("{}").unwrap();
        assert_eq!(config, CodecConfig::default());
        assert!(config.empty_string_as_nil);
        assert!(config.honor_array_offset);
    }

    #[test]
    fn test_partial_json_overrides_only_named_fields() {
        let config = CodecConfig::from_json(r#"{"empty_string_as_nil": false}"#).unwrap();
        assert!(!config.empty_string_as_nil);
        assert!(!config.validate_utf8);
        assert!(config.honor_array_offset);
    }

    #[test]
    fn test_invalid_json_is_serde_error() {
        let result = CodecConfig::from_json("{not json");
        assert!(matches!(result, Err(CodecError::SerdeJson(_))));
    }
}
