//! Leaf encoders: fixed-width slots, booleans, the null layout and
//! variable-length strings/binaries.

use bitvec::prelude::*;
use bytemuck::Pod;

use super::{check_nil, mismatch, Encoder, Parts};
use crate::error::CodecError;
use crate::ffi::{AlignedBuffer, ArrayBuilder, DayTimeSlot, MonthDayNanoSlot};
use crate::kernels::half::f32_to_f16_bits;
use crate::null_handling::ValidityBuilder;
use crate::traits::NativeInt;
use crate::types::{IntervalUnit, TypeTag, Value};

/// Validity bitmap plus one data buffer, the layout of every fixed-width type.
fn fixed_parts(len: usize, validity: ValidityBuilder, data: AlignedBuffer) -> Result<Parts, CodecError> {
    let (null_count, bitmap) = validity.finish()?;
    Ok(Parts::leaf(
        ArrayBuilder::new(len, null_count).buffer(bitmap).buffer(Some(data)),
    ))
}

impl Encoder<'_> {
    /// Appends one `T` per value. Nil slots are zeroed and marked invalid.
    pub(crate) fn encode_slots<T: Pod>(
        &self,
        values: &[Value],
        nullable: bool,
        convert: impl Fn(usize, &Value) -> Result<T, CodecError>,
    ) -> Result<Parts, CodecError> {
        let mut validity = ValidityBuilder::with_capacity(values.len());
        let mut data: Vec<T> = Vec::new();
        data.try_reserve_exact(values.len())?;
        for (i, value) in values.iter().enumerate() {
            if value.is_nil() {
                check_nil(nullable, i)?;
                validity.append(false);
                data.push(T::zeroed());
            } else {
                data.push(convert(i, value)?);
                validity.append(true);
            }
        }
        fixed_parts(values.len(), validity, AlignedBuffer::from_slice(&data)?)
    }

    /// [`Encoder::encode_slots`] with an infallible per-value mapping; `None`
    /// becomes a type mismatch.
    pub(crate) fn encode_fixed<T: Pod>(
        &self,
        tag: &TypeTag,
        values: &[Value],
        nullable: bool,
        convert: impl Fn(&Value) -> Option<T>,
    ) -> Result<Parts, CodecError> {
        self.encode_slots(values, nullable, |i, v| convert(v).ok_or_else(|| mismatch(tag, v, i)))
    }

    pub(crate) fn encode_integers<T: NativeInt>(
        &self,
        tag: &TypeTag,
        values: &[Value],
        nullable: bool,
    ) -> Result<Parts, CodecError> {
        self.encode_fixed::<T>(tag, values, nullable, T::from_value)
    }

    pub(crate) fn encode_half(&self, values: &[Value], nullable: bool) -> Result<Parts, CodecError> {
        self.encode_fixed::<u16>(&TypeTag::Float16, values, nullable, |v| match v {
            Value::Float(f) => Some(f32_to_f16_bits(*f as f32)),
            _ => None,
        })
    }

    pub(crate) fn encode_boolean(&self, values: &[Value], nullable: bool) -> Result<Parts, CodecError> {
        let mut validity = ValidityBuilder::with_capacity(values.len());
        let mut bits: BitVec<u8, Lsb0> = BitVec::with_capacity(values.len());
        for (i, value) in values.iter().enumerate() {
            match value {
                Value::Bool(b) => {
                    bits.push(*b);
                    validity.append(true);
                }
                Value::Nil => {
                    check_nil(nullable, i)?;
                    bits.push(false);
                    validity.append(false);
                }
                other => return Err(mismatch(TypeTag::Boolean, other, i)),
            }
        }
        fixed_parts(values.len(), validity, AlignedBuffer::from_bits(&bits)?)
    }

    /// The null layout carries no buffers at all.
    pub(crate) fn encode_null(&self, values: &[Value]) -> Result<Parts, CodecError> {
        if let Some((i, other)) = values.iter().enumerate().find(|(_, v)| !v.is_nil()) {
            return Err(mismatch(TypeTag::Null, other, i));
        }
        Ok(Parts::leaf(ArrayBuilder::new(values.len(), values.len())))
    }

    /// Strings and binaries with `O`-wide offsets.
    pub(crate) fn encode_varlen<O: NativeInt>(
        &self,
        values: &[Value],
        nullable: bool,
        utf8: bool,
    ) -> Result<Parts, CodecError> {
        let mut validity = ValidityBuilder::with_capacity(values.len());
        let mut offsets: Vec<O> = Vec::new();
        offsets.try_reserve_exact(values.len() + 1)?;
        offsets.push(O::zero());
        let mut data: Vec<u8> = Vec::new();

        for (i, value) in values.iter().enumerate() {
            match value {
                Value::Bytes(bytes) => {
                    if utf8 && self.config.validate_utf8 && std::str::from_utf8(bytes).is_err() {
                        return Err(CodecError::TypeMismatch(format!("invalid UTF-8 at index {}", i)));
                    }
                    data.try_reserve(bytes.len())?;
                    data.extend_from_slice(bytes);
                    validity.append(true);
                }
                Value::Nil => {
                    check_nil(nullable, i)?;
                    validity.append(false);
                }
                other => return Err(mismatch(if utf8 { "string" } else { "binary" }, other, i)),
            }
            let end = O::from_index(data.len()).ok_or_else(|| {
                CodecError::TypeMismatch(format!(
                    "{} bytes do not fit {}-bit offsets at index {}",
                    data.len(),
                    std::mem::size_of::<O>() * 8,
                    i
                ))
            })?;
            offsets.push(end);
        }

        let (null_count, bitmap) = validity.finish()?;
        Ok(Parts::leaf(
            ArrayBuilder::new(values.len(), null_count)
                .buffer(bitmap)
                .buffer(Some(AlignedBuffer::from_slice(&offsets)?))
                .buffer(Some(AlignedBuffer::from_bytes(&data)?)),
        ))
    }

    /// Fixed-size binaries and decimals: every valid value must be exactly
    /// `width` bytes.
    pub(crate) fn encode_fixed_width_bytes(
        &self,
        tag: &TypeTag,
        width: i32,
        values: &[Value],
        nullable: bool,
    ) -> Result<Parts, CodecError> {
        let width = usize::try_from(width)
            .map_err(|_| CodecError::MalformedSchema(format!("negative element width for {}", tag)))?;
        let total = values
            .len()
            .checked_mul(width)
            .ok_or_else(|| CodecError::OutOfMemory(format!("{} values of {} bytes", values.len(), width)))?;
        let mut validity = ValidityBuilder::with_capacity(values.len());
        let mut data: Vec<u8> = Vec::new();
        data.try_reserve_exact(total)?;

        for (i, value) in values.iter().enumerate() {
            match value {
                Value::Bytes(bytes) if bytes.len() == width => {
                    data.extend_from_slice(bytes);
                    validity.append(true);
                }
                Value::Bytes(bytes) => {
                    return Err(CodecError::TypeMismatch(format!(
                        "{} expects {} bytes at index {}, got {}",
                        tag,
                        width,
                        i,
                        bytes.len()
                    )));
                }
                Value::Nil => {
                    check_nil(nullable, i)?;
                    data.resize(data.len() + width, 0);
                    validity.append(false);
                }
                other => return Err(mismatch(tag, other, i)),
            }
        }
        fixed_parts(values.len(), validity, AlignedBuffer::from_bytes(&data)?)
    }

    pub(crate) fn encode_interval(
        &self,
        unit: IntervalUnit,
        values: &[Value],
        nullable: bool,
    ) -> Result<Parts, CodecError> {
        let tag = TypeTag::Interval(unit);
        match unit {
            IntervalUnit::YearMonth => self.encode_integers::<i32>(&tag, values, nullable),
            IntervalUnit::DayTime => self.encode_fixed(&tag, values, nullable, |v| match v {
                Value::IntervalDayTime { days, millis } => Some(DayTimeSlot {
                    days: *days,
                    millis: *millis,
                }),
                _ => None,
            }),
            IntervalUnit::MonthDayNano => self.encode_fixed(&tag, values, nullable, |v| match v {
                Value::IntervalMonthDayNano { months, days, nanos } => Some(MonthDayNanoSlot {
                    months: *months,
                    days: *days,
                    nanos: *nanos,
                }),
                _ => None,
            }),
        }
    }
}
