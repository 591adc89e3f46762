//! This file is the root of the `adbc_column` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`decoder`, `encoder`,
//!     `ffi`, etc.) so the Rust compiler knows they exist.
//! 2.  Re-exporting the handful of functions most callers need, so that
//!     `adbc_column::decode_column` works without knowing the module layout.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
mod observability; // Make macros available throughout the crate

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod ffi;
pub mod kernels;
pub mod metadata;
pub mod types;

mod null_handling;
mod traits;
mod utils;

#[cfg(test)]
mod test_support;

//==================================================================================
// 2. Public API
//==================================================================================
pub use config::CodecConfig;
pub use decoder::{decode_column, decode_column_with_config, decode_range, decode_range_with_config, describe_schema};
pub use encoder::{encode_column, encode_column_with_config, encode_row_batch, encode_row_batch_with_config};
pub use error::CodecError;
pub use ffi::{ArrayHandle, ArrowArray, ArrowSchema};
pub use metadata::{decode_metadata, encode_metadata};
pub use observability::enable_verbose_logging;
pub use types::{format_of, parse_format, ColumnData, ColumnValue, Field, TypeTag, Value};
