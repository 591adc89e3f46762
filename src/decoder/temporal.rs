//! Temporal layouts. Dates, times and timestamps are rescaled to microseconds
//! and decomposed into calendar structs in UTC; nanosecond values are
//! truncated. Durations are decoded as plain integers by the dispatcher.

use super::{Decoder, Window};
use crate::error::CodecError;
use crate::ffi::ArrowArray;
use crate::kernels::calendar;
use crate::traits::NativeInt;
use crate::types::{TimeUnit, Value};

const MILLIS_PER_DAY: i64 = 86_400_000;

impl Decoder<'_> {
    pub(crate) unsafe fn decode_date32(&self, array: &ArrowArray, w: Window, format: &str) -> Result<Vec<Value>, CodecError> {
        self.decode_fixed::<i32>(array, w, format, |days| {
            Ok(Value::Date(calendar::date_from_epoch_days(i64::from(days))?))
        })
    }

    pub(crate) unsafe fn decode_date64(&self, array: &ArrowArray, w: Window, format: &str) -> Result<Vec<Value>, CodecError> {
        self.decode_fixed::<i64>(array, w, format, |millis| {
            Ok(Value::Date(calendar::date_from_epoch_days(millis.div_euclid(MILLIS_PER_DAY))?))
        })
    }

    pub(crate) unsafe fn decode_time<T: NativeInt + Into<i64>>(
        &self,
        array: &ArrowArray,
        w: Window,
        format: &str,
        unit: TimeUnit,
    ) -> Result<Vec<Value>, CodecError> {
        self.decode_fixed::<T>(array, w, format, |raw| {
            let micros = calendar::ticks_to_micros(raw.into(), unit.nanos_multiplier());
            Ok(Value::Time(calendar::time_from_micros(micros, unit.microsecond_precision())))
        })
    }

    pub(crate) unsafe fn decode_timestamp(
        &self,
        array: &ArrowArray,
        w: Window,
        format: &str,
        unit: TimeUnit,
    ) -> Result<Vec<Value>, CodecError> {
        self.decode_fixed::<i64>(array, w, format, |raw| {
            let micros = calendar::ticks_to_micros(raw, unit.nanos_multiplier());
            Ok(Value::NaiveDateTime(calendar::datetime_from_epoch_micros(
                micros,
                unit.microsecond_precision(),
            )?))
        })
    }
}
