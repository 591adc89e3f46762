//! Temporal encoders. Each accepts either a raw integer already in the
//! column's unit or the matching calendar struct, which is converted in UTC.

use super::{mismatch, Encoder, Parts};
use crate::error::CodecError;
use crate::kernels::calendar;
use crate::traits::NativeInt;
use crate::types::{TimeUnit, TypeTag, Value};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Narrows a tick count to the column's storage width.
fn narrow<T: NativeInt>(tag: &TypeTag, ticks: i64, index: usize) -> Result<T, CodecError> {
    T::from_value(&Value::Int(ticks)).ok_or_else(|| {
        CodecError::TypeMismatch(format!("{} at index {} does not fit {}", ticks, index, tag))
    })
}

impl Encoder<'_> {
    pub(crate) fn encode_date32(&self, values: &[Value], nullable: bool) -> Result<Parts, CodecError> {
        let tag = TypeTag::Date32;
        self.encode_slots::<i32>(values, nullable, |i, v| match v {
            Value::Date(date) => narrow(&tag, calendar::epoch_days_of(date)?, i),
            Value::Int(_) | Value::UInt(_) => i32::from_value(v).ok_or_else(|| mismatch(&tag, v, i)),
            other => Err(mismatch(&tag, other, i)),
        })
    }

    pub(crate) fn encode_date64(&self, values: &[Value], nullable: bool) -> Result<Parts, CodecError> {
        let tag = TypeTag::Date64;
        self.encode_slots::<i64>(values, nullable, |i, v| match v {
            Value::Date(date) => calendar::epoch_days_of(date)?
                .checked_mul(MILLIS_PER_DAY)
                .ok_or_else(|| mismatch(&tag, v, i)),
            Value::Int(_) | Value::UInt(_) => i64::from_value(v).ok_or_else(|| mismatch(&tag, v, i)),
            other => Err(mismatch(&tag, other, i)),
        })
    }

    /// Time of day in `unit` ticks, stored as `T` (`i32` for time32, `i64`
    /// for time64).
    pub(crate) fn encode_time<T: NativeInt>(
        &self,
        tag: &TypeTag,
        unit: TimeUnit,
        values: &[Value],
        nullable: bool,
    ) -> Result<Parts, CodecError> {
        self.encode_slots::<T>(values, nullable, |i, v| match v {
            Value::Time(time) => {
                let (secs, micros) = calendar::seconds_of_day(time)?;
                narrow(tag, calendar::ticks_of(secs, micros, unit.nanos_multiplier())?, i)
            }
            Value::Int(_) | Value::UInt(_) => T::from_value(v).ok_or_else(|| mismatch(tag, v, i)),
            other => Err(mismatch(tag, other, i)),
        })
    }

    pub(crate) fn encode_timestamp(&self, unit: TimeUnit, values: &[Value], nullable: bool) -> Result<Parts, CodecError> {
        let tag = TypeTag::Timestamp(unit, None);
        self.encode_slots::<i64>(values, nullable, |i, v| match v {
            Value::NaiveDateTime(dt) => {
                let (secs, micros) = calendar::epoch_seconds_of(dt)?;
                calendar::ticks_of(secs, micros, unit.nanos_multiplier())
            }
            Value::Int(_) | Value::UInt(_) => i64::from_value(v).ok_or_else(|| mismatch(&tag, v, i)),
            other => Err(mismatch(&tag, other, i)),
        })
    }
}
