//! This module serves as the public API for all validity-bitmap logic.
//!
//! Arrow tracks nulls in a separate LSB-first bitmap next to the data buffers.
//! The decoder reads those bitmaps through borrowed bit slices and the encoder
//! builds them while appending values; both sides go through this module.

//==================================================================================
// 1. Module Declarations
//==================================================================================

/// Reading and building Arrow-compatible validity bitmaps.
pub mod bitmap;


//==================================================================================
// 2. Public API Re-exports
//==================================================================================

pub use self::bitmap::{is_valid, validity_to_vec, ValidityBuilder};
