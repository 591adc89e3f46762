// In: src/error.rs

//! This module defines the single, unified error type for the whole codec.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    // =========================================================================
    // === Structural Errors (the C structs handed to us are inconsistent)
    // =========================================================================
    #[error("Malformed ArrowSchema: {0}")]
    MalformedSchema(String),

    #[error("Malformed ArrowArray: {0}")]
    MalformedArray(String),

    #[error("Unsupported format string: `{0}`")]
    UnsupportedFormat(String),

    #[error("Unsupported data type for this operation: {0}")]
    UnsupportedType(String),

    // =========================================================================
    // === Value Errors (the value tree disagrees with its declared type)
    // =========================================================================
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Map contains duplicated keys: {0}")]
    DuplicateKey(String),

    #[error("Length mismatch: expected {0} items, got {1}")]
    LengthMismatch(usize, usize),

    #[error("Calendar validation failed: {0}")]
    CalendarValidation(String),

    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    /// Wraps any error with the name of the field in which it occurred.
    #[error("In field '{field}': {source}")]
    Field {
        field: String,
        #[source]
        source: Box<CodecError>,
    },

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the Arrow library.
    #[error("Arrow operation failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// An error from the underlying I/O subsystem, e.g. opening a log file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically while loading a config.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// An error from a safe byte-casting operation failing.
    #[error("Byte slice casting error: {0}")]
    PodCast(String), // Manual `From` impl is needed as bytemuck::PodCastError doesn't impl Error
}

impl CodecError {
    /// Attaches a field name to this error. Nested calls build a path from the
    /// innermost field outwards.
    pub fn in_field(self, field: impl Into<String>) -> Self {
        CodecError::Field {
            field: field.into(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping any `Field` wrappers.
    pub fn root_cause(&self) -> &CodecError {
        match self {
            CodecError::Field { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

// =============================================================================
// === Manual `From` Implementations ===
// =============================================================================

impl From<bytemuck::PodCastError> for CodecError {
    fn from(err: bytemuck::PodCastError) -> Self {
        CodecError::PodCast(err.to_string())
    }
}

impl From<std::collections::TryReserveError> for CodecError {
    fn from(err: std::collections::TryReserveError) -> Self {
        CodecError::OutOfMemory(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_field_builds_path_and_root_cause() {
        let err = CodecError::DuplicateKey("1".into())
            .in_field("inner")
            .in_field("outer");
        assert_eq!(
            err.to_string(),
            "In field 'outer': In field 'inner': Map contains duplicated keys: 1"
        );
        assert!(matches!(err.root_cause(), CodecError::DuplicateKey(_)));
    }

    #[test]
    fn test_try_reserve_maps_to_out_of_memory() {
        let mut v: Vec<u8> = Vec::new();
        let err: CodecError = v.try_reserve(usize::MAX).unwrap_err().into();
        assert!(matches!(err, CodecError::OutOfMemory(_)));
    }
}
