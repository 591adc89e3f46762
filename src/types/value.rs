//! The generic value tree exchanged with callers: scalars, calendar structs,
//! and the `ColumnValue` descriptor that pairs a named, typed column with its
//! data.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use super::type_tag::TypeTag;
use crate::error::CodecError;
use crate::ffi::ArrayHandle;
use crate::metadata::Metadata;

//==================================================================================
// 1. Calendar structs
//==================================================================================

/// The calendar a date/time value claims to be in. Only ISO is encodable.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Calendar {
    #[default]
    Iso,
    Other(String),
}

/// Sub-second part of a time value: `(microseconds, significant digits)`.
pub type Microsecond = (u32, u8);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Date {
    pub calendar: Calendar,
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Time {
    pub calendar: Calendar,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub microsecond: Microsecond,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaiveDateTime {
    pub calendar: Calendar,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub microsecond: Microsecond,
}

impl Date {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self {
            calendar: Calendar::Iso,
            year,
            month,
            day,
        }
    }
}

impl Time {
    pub fn new(hour: u32, minute: u32, second: u32, microsecond: Microsecond) -> Self {
        Self {
            calendar: Calendar::Iso,
            hour,
            minute,
            second,
            microsecond,
        }
    }
}

impl NaiveDateTime {
    pub fn new(date: Date, time: Time) -> Self {
        Self {
            calendar: date.calendar,
            year: date.year,
            month: date.month,
            day: date.day,
            hour: time.hour,
            minute: time.minute,
            second: time.second,
            microsecond: time.microsecond,
        }
    }

    pub fn date(&self) -> Date {
        Date {
            calendar: self.calendar.clone(),
            year: self.year,
            month: self.month,
            day: self.day,
        }
    }

    pub fn time(&self) -> Time {
        Time {
            calendar: self.calendar.clone(),
            hour: self.hour,
            minute: self.minute,
            second: self.second,
            microsecond: self.microsecond,
        }
    }
}

//==================================================================================
// 2. Scalar values
//==================================================================================

/// One element of a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Strings, binaries, fixed-size binaries and raw decimal payloads.
    Bytes(Vec<u8>),
    Date(Date),
    Time(Time),
    NaiveDateTime(NaiveDateTime),
    IntervalDayTime { days: i32, millis: i32 },
    IntervalMonthDayNano { months: i32, days: i32, nanos: i64 },
    List(Vec<Value>),
    /// Ordered key/value pairs of one map row.
    Map(Vec<(Value, Value)>),
    /// One union element: the name of the active variant and its value.
    Union { variant: String, value: Box<Value> },
    /// A nested column, e.g. a struct element of a list.
    Column(Box<ColumnValue>),
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Builds a map row from parallel key and value lists.
    pub fn map_from_keys_values(keys: Vec<Value>, values: Vec<Value>) -> Result<Value, CodecError> {
        if keys.len() != values.len() {
            return Err(CodecError::LengthMismatch(keys.len(), values.len()));
        }
        let pairs: Vec<(Value, Value)> = keys.into_iter().zip(values).collect();
        ensure_unique_keys(&pairs)?;
        Ok(Value::Map(pairs))
    }

    pub fn str(s: &str) -> Value {
        Value::Bytes(s.as_bytes().to_vec())
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::NaiveDateTime(_) => "naive_datetime",
            Value::IntervalDayTime { .. } => "interval_day_time",
            Value::IntervalMonthDayNano { .. } => "interval_month_day_nano",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Union { .. } => "union",
            Value::Column(_) => "column",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::str(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}

/// Borrowed key wrapper giving map keys set semantics. Floats compare by bit
/// pattern so NaN keys are detectable as duplicates.
struct MapKey<'a>(&'a Value);

impl PartialEq for MapKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self.0, other.0) {
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (a, b) => a == b,
        }
    }
}

impl Eq for MapKey<'_> {}

impl Hash for MapKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self.0).hash(state);
        match self.0 {
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::UInt(u) => u.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::Date(d) => d.hash(state),
            Value::Time(t) => t.hash(state),
            Value::NaiveDateTime(dt) => dt.hash(state),
            Value::List(items) => items.len().hash(state),
            Value::Map(pairs) => pairs.len().hash(state),
            _ => {}
        }
    }
}

/// Fails with `DuplicateKey` if any key occurs twice.
pub fn ensure_unique_keys(pairs: &[(Value, Value)]) -> Result<(), CodecError> {
    let mut seen: HashSet<MapKey<'_>> = HashSet::with_capacity(pairs.len());
    for (key, _) in pairs {
        if !seen.insert(MapKey(key)) {
            return Err(CodecError::DuplicateKey(format!("{:?}", key)));
        }
    }
    Ok(())
}

//==================================================================================
// 3. Columns
//==================================================================================

/// A named, typed column and its data.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnValue {
    pub name: String,
    pub tag: TypeTag,
    pub nullable: bool,
    pub metadata: Option<Metadata>,
    pub data: ColumnData,
}

/// The data of a column, shaped by its layout.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// One value per row. Used by every non-struct layout whose rows are
    /// self-contained (primitives, strings, temporal, lists, maps, unions).
    Values(Vec<Value>),
    /// One child column per field. `validity` is present only when the struct
    /// itself carries a null bitmap.
    Struct {
        fields: Vec<ColumnValue>,
        validity: Option<Vec<bool>>,
    },
    /// The index column and the dictionary it points into.
    Dictionary {
        key: Box<ColumnValue>,
        value: Box<ColumnValue>,
    },
    /// Physical run-end layout: logical length/offset plus both children.
    RunEndEncoded {
        length: usize,
        offset: usize,
        run_ends: Box<ColumnValue>,
        values: Box<ColumnValue>,
    },
    /// Physical list-view layout.
    ListView {
        validity: Vec<bool>,
        offsets: Vec<i64>,
        sizes: Vec<i64>,
        values: Box<ColumnValue>,
    },
    /// A column that was described but not decoded.
    Handle(ArrayHandle),
    /// Marks the end of a record batch stream.
    EndOfSeries,
}

impl ColumnValue {
    pub fn new(name: impl Into<String>, tag: TypeTag, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            tag,
            nullable: false,
            metadata: None,
            data,
        }
    }

    /// A column of plain values.
    pub fn values(name: impl Into<String>, tag: TypeTag, values: Vec<Value>) -> Self {
        Self::new(name, tag, ColumnData::Values(values))
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_metadata(mut self, metadata: Option<Metadata>) -> Self {
        self.metadata = metadata;
        self
    }

    /// The plain values, if this column holds any.
    pub fn as_values(&self) -> Option<&[Value]> {
        match &self.data {
            ColumnData::Values(v) => Some(v),
            _ => None,
        }
    }

    /// Number of rows, when it is known without consulting a handle.
    pub fn row_count(&self) -> Option<usize> {
        match &self.data {
            ColumnData::Values(v) => Some(v.len()),
            ColumnData::Struct { fields, validity } => validity
                .as_ref()
                .map(Vec::len)
                .or_else(|| fields.first().and_then(ColumnValue::row_count))
                .or(Some(0)),
            ColumnData::Dictionary { key, .. } => key.row_count(),
            ColumnData::RunEndEncoded { length, .. } => Some(*length),
            ColumnData::ListView { offsets, .. } => Some(offsets.len()),
            ColumnData::Handle(_) => None,
            ColumnData::EndOfSeries => Some(0),
        }
    }
}
