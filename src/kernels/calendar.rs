//! Calendar arithmetic between epoch-based integers and the calendar structs.
//!
//! All conversions are done in UTC with `chrono`. Values carry no timezone;
//! a timestamp column's timezone is metadata on its type only.

use chrono::{DateTime, Datelike, NaiveDate, Timelike};

use crate::error::CodecError;
use crate::types::{Calendar, Date, Microsecond, NaiveDateTime, Time};

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;
const SECONDS_PER_DAY: i64 = 86_400;
const MICROS_PER_SECOND: i128 = 1_000_000;

fn require_iso(calendar: &Calendar) -> Result<(), CodecError> {
    match calendar {
        Calendar::Iso => Ok(()),
        Calendar::Other(name) => Err(CodecError::CalendarValidation(format!(
            "Expected Calendar.ISO, got `{}`",
            name
        ))),
    }
}

fn out_of_range(what: &str, value: impl std::fmt::Display) -> CodecError {
    CodecError::CalendarValidation(format!("{} {} is out of the supported range", what, value))
}

/// Days since the Unix epoch to a calendar date.
pub fn date_from_epoch_days(days: i64) -> Result<Date, CodecError> {
    let ce = days
        .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(|d| i32::try_from(d).ok())
        .ok_or_else(|| out_of_range("day count", days))?;
    let date = NaiveDate::from_num_days_from_ce_opt(ce).ok_or_else(|| out_of_range("day count", days))?;
    Ok(Date::new(date.year(), date.month(), date.day()))
}

/// Calendar date to days since the Unix epoch.
pub fn epoch_days_of(date: &Date) -> Result<i64, CodecError> {
    require_iso(&date.calendar)?;
    let naive = NaiveDate::from_ymd_opt(date.year, date.month, date.day).ok_or_else(|| {
        CodecError::CalendarValidation(format!(
            "invalid date {:04}-{:02}-{:02}",
            date.year, date.month, date.day
        ))
    })?;
    Ok(i64::from(naive.num_days_from_ce()) - UNIX_EPOCH_DAYS_FROM_CE)
}

/// Microseconds since the Unix epoch to a calendar date-time.
pub fn datetime_from_epoch_micros(micros: i128, precision: u8) -> Result<NaiveDateTime, CodecError> {
    let secs = i64::try_from(micros.div_euclid(MICROS_PER_SECOND)).map_err(|_| out_of_range("timestamp", micros))?;
    let sub = micros.rem_euclid(MICROS_PER_SECOND) as u32;
    let dt = DateTime::from_timestamp(secs, sub * 1_000)
        .ok_or_else(|| out_of_range("timestamp", micros))?
        .naive_utc();
    Ok(NaiveDateTime {
        calendar: Calendar::Iso,
        year: dt.year(),
        month: dt.month(),
        day: dt.day(),
        hour: dt.hour(),
        minute: dt.minute(),
        second: dt.second(),
        microsecond: (sub, precision),
    })
}

/// Microseconds since midnight to a time of day. Values past one day wrap.
pub fn time_from_micros(micros: i128, precision: u8) -> Time {
    let secs = micros.div_euclid(MICROS_PER_SECOND).rem_euclid(i128::from(SECONDS_PER_DAY)) as u32;
    let sub = micros.rem_euclid(MICROS_PER_SECOND) as u32;
    Time::new(secs / 3600, (secs % 3600) / 60, secs % 60, (sub, precision))
}

fn check_microsecond(microsecond: Microsecond) -> Result<u32, CodecError> {
    if microsecond.0 >= 1_000_000 {
        return Err(CodecError::CalendarValidation(format!(
            "microsecond {} must be below 1_000_000",
            microsecond.0
        )));
    }
    Ok(microsecond.0)
}

/// Time of day to `(seconds since midnight, microseconds)`.
pub fn seconds_of_day(time: &Time) -> Result<(i64, u32), CodecError> {
    require_iso(&time.calendar)?;
    if time.hour > 23 || time.minute > 59 || time.second > 59 {
        return Err(CodecError::CalendarValidation(format!(
            "invalid time {:02}:{:02}:{:02}",
            time.hour, time.minute, time.second
        )));
    }
    let secs = i64::from(time.hour) * 3600 + i64::from(time.minute) * 60 + i64::from(time.second);
    Ok((secs, check_microsecond(time.microsecond)?))
}

/// Calendar date-time (read as UTC) to `(seconds since epoch, microseconds)`.
pub fn epoch_seconds_of(dt: &NaiveDateTime) -> Result<(i64, u32), CodecError> {
    require_iso(&dt.calendar)?;
    let days = epoch_days_of(&dt.date())?;
    let (secs, micros) = seconds_of_day(&dt.time())?;
    Ok((days * SECONDS_PER_DAY + secs, micros))
}

/// Converts a raw temporal integer in `unit_nanos` ticks to microseconds,
/// truncating toward zero.
pub fn ticks_to_micros(value: i64, unit_nanos: i64) -> i128 {
    i128::from(value) * i128::from(unit_nanos) / 1_000
}

/// Converts `(seconds, microseconds)` to ticks of `unit_nanos`, truncating
/// sub-tick precision.
pub fn ticks_of(secs: i64, micros: u32, unit_nanos: i64) -> Result<i64, CodecError> {
    let total_nanos = (i128::from(secs) * MICROS_PER_SECOND + i128::from(micros)) * 1_000;
    i64::try_from(total_nanos / i128::from(unit_nanos))
        .map_err(|_| CodecError::TypeMismatch(format!("{}s does not fit the target unit", secs)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_days_round_trip() {
        for days in [-719_162i64, -1, 0, 1, 19_000, 2_932_896] {
            let date = date_from_epoch_days(days).unwrap();
            assert_eq!(epoch_days_of(&date).unwrap(), days);
        }
        assert_eq!(date_from_epoch_days(0).unwrap(), Date::new(1970, 1, 1));
        assert_eq!(date_from_epoch_days(-1).unwrap(), Date::new(1969, 12, 31));
    }

    #[test]
    fn test_invalid_calendar_and_dates() {
        let mut date = Date::new(2024, 2, 30);
        assert!(matches!(epoch_days_of(&date), Err(CodecError::CalendarValidation(_))));
        date.day = 29;
        date.calendar = Calendar::Other("Calendar.Holocene".into());
        let err = epoch_days_of(&date).unwrap_err();
        assert!(err.to_string().contains("Expected Calendar.ISO"));
    }

    #[test]
    fn test_datetime_from_negative_micros() {
        // 1969-12-31T23:59:59.500000
        let dt = datetime_from_epoch_micros(-500_000, 6).unwrap();
        assert_eq!((dt.year, dt.month, dt.day), (1969, 12, 31));
        assert_eq!((dt.hour, dt.minute, dt.second), (23, 59, 59));
        assert_eq!(dt.microsecond, (500_000, 6));
    }

    #[test]
    fn test_epoch_seconds_of_known_instant() {
        let dt = datetime_from_epoch_micros(1_700_000_000 * 1_000_000 + 123, 6).unwrap();
        assert_eq!(epoch_seconds_of(&dt).unwrap(), (1_700_000_000, 123));
    }

    #[test]
    fn test_time_of_day() {
        let t = time_from_micros(3_723_000_456, 6);
        assert_eq!((t.hour, t.minute, t.second, t.microsecond), (1, 2, 3, (456, 6)));
        assert_eq!(seconds_of_day(&t).unwrap(), (3723, 456));
    }

    #[test]
    fn test_ticks_conversion_truncates() {
        assert_eq!(ticks_to_micros(1_500, 1), 1);
        assert_eq!(ticks_to_micros(-1_500, 1), -1);
        assert_eq!(ticks_to_micros(2, 1_000_000_000), 2_000_000);
        assert_eq!(ticks_of(1, 250_000, 1_000_000).unwrap(), 1_250);
        assert_eq!(ticks_of(1, 250_000, 1_000_000_000).unwrap(), 1);
    }
}
