//! Fixed-width layouts: validity bitmap in buffer 0, packed values in buffer 1.

use super::{Decoder, Window};
use crate::error::CodecError;
use crate::ffi::{ArrowArray, DayTimeSlot, MonthDayNanoSlot};
use crate::kernels::half::f16_bits_to_f32;
use crate::null_handling::is_valid;
use crate::traits::NativeInt;
use crate::types::{IntervalUnit, Value};

impl Decoder<'_> {
    /// Reads each slot of the window as `T` and maps valid slots through `convert`.
    pub(crate) unsafe fn decode_fixed<T: bytemuck::Pod>(
        &self,
        array: &ArrowArray,
        w: Window,
        format: &str,
        convert: impl Fn(T) -> Result<Value, CodecError>,
    ) -> Result<Vec<Value>, CodecError> {
        array.expect_buffers(2, format)?;
        let validity = array.bit_buffer(0, w.needed())?;
        let data = array.required_buffer::<T>(1, w.needed())?;

        let mut out = Vec::new();
        out.try_reserve_exact(w.count)?;
        for j in w.physical() {
            if is_valid(validity, j) {
                out.push(convert(data[j])?);
            } else {
                out.push(Value::Nil);
            }
        }
        Ok(out)
    }

    pub(crate) unsafe fn decode_integers<T: NativeInt>(
        &self,
        array: &ArrowArray,
        w: Window,
        format: &str,
    ) -> Result<Vec<Value>, CodecError> {
        self.decode_fixed::<T>(array, w, format, |v| Ok(v.to_value()))
    }

    pub(crate) unsafe fn decode_half(&self, array: &ArrowArray, w: Window, format: &str) -> Result<Vec<Value>, CodecError> {
        self.decode_fixed::<u16>(array, w, format, |bits| Ok(Value::Float(f64::from(f16_bits_to_f32(bits)))))
    }

    /// The null layout has no buffers; every row is nil.
    pub(crate) unsafe fn decode_null(&self, array: &ArrowArray, w: Window) -> Result<Vec<Value>, CodecError> {
        if array.n_buffers != 0 {
            log::warn!("null-typed array carries {} buffers, ignoring them", array.n_buffers);
        }
        Ok(vec![Value::Nil; w.count])
    }

    pub(crate) unsafe fn decode_boolean(&self, array: &ArrowArray, w: Window, format: &str) -> Result<Vec<Value>, CodecError> {
        array.expect_buffers(2, format)?;
        // Producers may leave both buffers null for an empty window.
        if w.count == 0 {
            return Ok(Vec::new());
        }
        let validity = array.bit_buffer(0, w.needed())?;
        let data = array
            .bit_buffer(1, w.needed())?
            .ok_or_else(|| CodecError::MalformedArray("boolean data buffer is null".into()))?;
        Ok(w.physical()
            .map(|j| if is_valid(validity, j) { Value::Bool(data[j]) } else { Value::Nil })
            .collect())
    }

    /// Fixed-size binary and decimals: each slot is `width` raw bytes.
    pub(crate) unsafe fn decode_fixed_width_bytes(
        &self,
        array: &ArrowArray,
        w: Window,
        format: &str,
        width: i32,
    ) -> Result<Vec<Value>, CodecError> {
        array.expect_buffers(2, format)?;
        let width = usize::try_from(width)
            .map_err(|_| CodecError::MalformedSchema(format!("negative element width in `{}`", format)))?;
        let validity = array.bit_buffer(0, w.needed())?;
        let byte_len = w
            .needed()
            .checked_mul(width)
            .ok_or_else(|| CodecError::MalformedArray("fixed-width buffer size overflows".into()))?;
        let data = array.required_buffer::<u8>(1, byte_len)?;

        let mut out = Vec::new();
        out.try_reserve_exact(w.count)?;
        for j in w.physical() {
            if is_valid(validity, j) {
                out.push(Value::Bytes(data[j * width..(j + 1) * width].to_vec()));
            } else {
                out.push(Value::Nil);
            }
        }
        Ok(out)
    }

    pub(crate) unsafe fn decode_interval(
        &self,
        array: &ArrowArray,
        w: Window,
        format: &str,
        unit: IntervalUnit,
    ) -> Result<Vec<Value>, CodecError> {
        match unit {
            IntervalUnit::YearMonth => self.decode_integers::<i32>(array, w, format),
            IntervalUnit::DayTime => self.decode_fixed::<DayTimeSlot>(array, w, format, |v| {
                Ok(Value::IntervalDayTime {
                    days: v.days,
                    millis: v.millis,
                })
            }),
            IntervalUnit::MonthDayNano => self.decode_fixed::<MonthDayNanoSlot>(array, w, format, |v| {
                Ok(Value::IntervalMonthDayNano {
                    months: v.months,
                    days: v.days,
                    nanos: v.nanos,
                })
            }),
        }
    }
}
