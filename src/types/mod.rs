//! This module defines the core, strongly-typed representations used
//! throughout the codec.
//!
//! It includes the `TypeTag` enum and its format-string grammar, the `Field`
//! tree built from an `ArrowSchema`, and the generic value tree callers
//! exchange with the decoder and encoder.

pub mod field;
pub mod type_tag;
pub mod value;

// Re-export the main types for easier access.
pub use field::{field_of_schema, Field};
pub use type_tag::{format_of, parse_format, IntervalUnit, TimeUnit, TypeTag};
pub use value::{
    ensure_unique_keys, Calendar, ColumnData, ColumnValue, Date, Microsecond, NaiveDateTime, Time,
    Value,
};
