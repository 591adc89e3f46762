//! This module contains the pure, stateless conversion kernels the decoder
//! and encoder share.
//!
//! Each kernel operates on plain scalars and knows nothing about the C structs.

pub mod calendar;
pub mod half;
