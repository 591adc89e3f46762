//! This module defines shared traits used across the decoder and encoder.

use num_traits::{NumCast, PrimInt};

use crate::types::Value;

/// A fixed-width integer that can live in an Arrow buffer and be converted to
/// and from a generic `Value`.
pub trait NativeInt: bytemuck::Pod + PrimInt + Default + std::fmt::Display {
    /// Signed integers decode to `Value::Int`, unsigned to `Value::UInt`.
    fn to_value(self) -> Value;

    /// Range-checked conversion. `None` when the value is not an integer or
    /// does not fit.
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => NumCast::from(*i),
            Value::UInt(u) => NumCast::from(*u),
            _ => None,
        }
    }

    /// Offset/length view, `None` for negative values.
    fn as_index(self) -> Option<usize> {
        NumCast::from(self)
    }

    fn from_index(n: usize) -> Option<Self> {
        NumCast::from(n)
    }
}

// Implement the trait for all primitive integer types.
macro_rules! impl_native_int {
    ($T:ty, signed) => {
        impl NativeInt for $T {
            fn to_value(self) -> Value {
                Value::Int(<i64 as From<$T>>::from(self))
            }
        }
    };
    ($T:ty, unsigned) => {
        impl NativeInt for $T {
            fn to_value(self) -> Value {
                Value::UInt(<u64 as From<$T>>::from(self))
            }
        }
    };
}

impl_native_int!(i8, signed);
impl_native_int!(i16, signed);
impl_native_int!(i32, signed);
impl_native_int!(i64, signed);
impl_native_int!(u8, unsigned);
impl_native_int!(u16, unsigned);
impl_native_int!(u32, unsigned);
impl_native_int!(u64, unsigned);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_checked_from_value() {
        assert_eq!(i8::from_value(&Value::Int(-128)), Some(-128));
        assert_eq!(i8::from_value(&Value::Int(128)), None);
        assert_eq!(u8::from_value(&Value::Int(-1)), None);
        assert_eq!(u64::from_value(&Value::UInt(u64::MAX)), Some(u64::MAX));
        assert_eq!(i64::from_value(&Value::UInt(u64::MAX)), None);
        assert_eq!(i32::from_value(&Value::Float(1.0)), None);
    }

    #[test]
    fn test_to_value_respects_signedness() {
        assert_eq!((-3i16).to_value(), Value::Int(-3));
        assert_eq!(7u32.to_value(), Value::UInt(7));
    }

    #[test]
    fn test_offset_views() {
        assert_eq!(5i32.as_index(), Some(5));
        assert_eq!((-1i64).as_index(), None);
        assert_eq!(i32::from_index(usize::MAX), None);
    }
}
