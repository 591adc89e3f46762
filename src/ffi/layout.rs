//! Fixed-width element layouts that are wider than one primitive.

use bytemuck::{Pod, Zeroable};

/// One `interval[day_time]` slot: days, then milliseconds.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DayTimeSlot {
    pub days: i32,
    pub millis: i32,
}

/// One `interval[month_day_nano]` slot.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct MonthDayNanoSlot {
    pub months: i32,
    pub days: i32,
    pub nanos: i64,
}
