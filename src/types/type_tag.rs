//! This module defines the canonical, type-safe representation of every Arrow
//! type the codec understands, and the two-way mapping between it and the
//! Arrow C format string.

use std::fmt;

use arrow_schema::{
    DataType as ArrowDataType, IntervalUnit as ArrowIntervalUnit, TimeUnit as ArrowTimeUnit,
    UnionFields, UnionMode,
};
use serde::{Deserialize, Serialize};

use super::field::Field;
use crate::error::CodecError;

//==================================================================================
// 1. Units
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl TimeUnit {
    fn from_format_char(c: char) -> Option<Self> {
        match c {
            's' => Some(Self::Second),
            'm' => Some(Self::Millisecond),
            'u' => Some(Self::Microsecond),
            'n' => Some(Self::Nanosecond),
            _ => None,
        }
    }

    fn format_char(self) -> char {
        match self {
            Self::Second => 's',
            Self::Millisecond => 'm',
            Self::Microsecond => 'u',
            Self::Nanosecond => 'n',
        }
    }

    /// Nanoseconds in one tick of this unit.
    pub const fn nanos_multiplier(self) -> i64 {
        match self {
            Self::Second => 1_000_000_000,
            Self::Millisecond => 1_000_000,
            Self::Microsecond => 1_000,
            Self::Nanosecond => 1,
        }
    }

    /// Number of sub-second digits a decoded value carries. Nanoseconds are
    /// truncated to microseconds, so both report 6.
    pub const fn microsecond_precision(self) -> u8 {
        match self {
            Self::Second => 0,
            Self::Millisecond => 3,
            Self::Microsecond | Self::Nanosecond => 6,
        }
    }

    pub fn to_arrow(self) -> ArrowTimeUnit {
        match self {
            Self::Second => ArrowTimeUnit::Second,
            Self::Millisecond => ArrowTimeUnit::Millisecond,
            Self::Microsecond => ArrowTimeUnit::Microsecond,
            Self::Nanosecond => ArrowTimeUnit::Nanosecond,
        }
    }

    pub fn from_arrow(unit: &ArrowTimeUnit) -> Self {
        match unit {
            ArrowTimeUnit::Second => Self::Second,
            ArrowTimeUnit::Millisecond => Self::Millisecond,
            ArrowTimeUnit::Microsecond => Self::Microsecond,
            ArrowTimeUnit::Nanosecond => Self::Nanosecond,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::Second => "s",
            Self::Millisecond => "ms",
            Self::Microsecond => "us",
            Self::Nanosecond => "ns",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalUnit {
    YearMonth,
    DayTime,
    MonthDayNano,
}

//==================================================================================
// 2. The TypeTag enum
//==================================================================================

/// The canonical, internal representation of an Arrow type.
///
/// Nested tags carry their children as `Field`s. [`parse_format`] alone cannot
/// see children, so it leaves those slots empty (`None` or an empty list);
/// [`Field::from_schema`] fills them in from the schema tree.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum TypeTag {
    Null,
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float16,
    Float32,
    Float64,
    Binary,
    LargeBinary,
    Utf8,
    LargeUtf8,
    FixedSizeBinary(i32),
    Decimal { bits: u16, precision: u32, scale: i32 },
    Date32,
    Date64,
    Time32(TimeUnit),
    Time64(TimeUnit),
    Timestamp(TimeUnit, Option<String>),
    Duration(TimeUnit),
    Interval(IntervalUnit),
    List(Option<Box<Field>>),
    LargeList(Option<Box<Field>>),
    FixedSizeList(i32, Option<Box<Field>>),
    ListView(Option<Box<Field>>),
    LargeListView(Option<Box<Field>>),
    Struct(Vec<Field>),
    Map {
        key: Option<Box<Field>>,
        value: Option<Box<Field>>,
    },
    DenseUnion {
        type_ids: Vec<i8>,
        variants: Vec<Field>,
    },
    SparseUnion {
        type_ids: Vec<i8>,
        variants: Vec<Field>,
    },
    RunEndEncoded {
        run_ends: Option<Box<Field>>,
        values: Option<Box<Field>>,
    },
    /// A dictionary-encoded column: `index` is the integer key type, `value`
    /// the field of the dictionary itself.
    Dictionary {
        index: Box<TypeTag>,
        value: Option<Box<Field>>,
    },
}

impl TypeTag {
    pub fn is_signed_int(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    pub fn is_unsigned_int(&self) -> bool {
        matches!(self, Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64)
    }

    pub fn is_integer(&self) -> bool {
        self.is_signed_int() || self.is_unsigned_int()
    }

    /// Child fields in layout order. Empty slots are skipped.
    pub fn children(&self) -> Vec<&Field> {
        match self {
            Self::List(f)
            | Self::LargeList(f)
            | Self::FixedSizeList(_, f)
            | Self::ListView(f)
            | Self::LargeListView(f) => f.iter().map(|b| b.as_ref()).collect(),
            Self::Struct(fields) => fields.iter().collect(),
            Self::Map { key, value } => key.iter().chain(value.iter()).map(|b| b.as_ref()).collect(),
            Self::DenseUnion { variants, .. } | Self::SparseUnion { variants, .. } => {
                variants.iter().collect()
            }
            Self::RunEndEncoded { run_ends, values } => {
                run_ends.iter().chain(values.iter()).map(|b| b.as_ref()).collect()
            }
            Self::Dictionary { value, .. } => value.iter().map(|b| b.as_ref()).collect(),
            _ => Vec::new(),
        }
    }

    /// True when every nested slot this tag requires is populated, recursively.
    pub fn is_well_formed(&self) -> bool {
        let own = match self {
            Self::List(f)
            | Self::LargeList(f)
            | Self::FixedSizeList(_, f)
            | Self::ListView(f)
            | Self::LargeListView(f) => f.is_some(),
            Self::Map { key, value } => key.is_some() && value.is_some(),
            Self::DenseUnion { type_ids, variants } | Self::SparseUnion { type_ids, variants } => {
                type_ids.len() == variants.len()
            }
            Self::RunEndEncoded { run_ends, values } => run_ends.is_some() && values.is_some(),
            Self::Dictionary { index, value } => index.is_integer() && value.is_some(),
            _ => true,
        };
        own && self.children().iter().all(|f| f.tag.is_well_formed())
    }

    /// Converts a tag into an Arrow `DataType`. Nested slots must be populated.
    pub fn to_arrow_type(&self) -> Result<ArrowDataType, CodecError> {
        let child = |slot: &Option<Box<Field>>| -> Result<arrow_schema::FieldRef, CodecError> {
            slot.as_ref()
                .ok_or_else(|| CodecError::UnsupportedType(format!("{} has no child field", self)))?
                .to_arrow_field()
                .map(std::sync::Arc::new)
        };
        Ok(match self {
            Self::Null => ArrowDataType::Null,
            Self::Boolean => ArrowDataType::Boolean,
            Self::Int8 => ArrowDataType::Int8,
            Self::Int16 => ArrowDataType::Int16,
            Self::Int32 => ArrowDataType::Int32,
            Self::Int64 => ArrowDataType::Int64,
            Self::UInt8 => ArrowDataType::UInt8,
            Self::UInt16 => ArrowDataType::UInt16,
            Self::UInt32 => ArrowDataType::UInt32,
            Self::UInt64 => ArrowDataType::UInt64,
            Self::Float16 => ArrowDataType::Float16,
            Self::Float32 => ArrowDataType::Float32,
            Self::Float64 => ArrowDataType::Float64,
            Self::Binary => ArrowDataType::Binary,
            Self::LargeBinary => ArrowDataType::LargeBinary,
            Self::Utf8 => ArrowDataType::Utf8,
            Self::LargeUtf8 => ArrowDataType::LargeUtf8,
            Self::FixedSizeBinary(n) => ArrowDataType::FixedSizeBinary(*n),
            Self::Decimal { bits, precision, scale } => {
                let p = u8::try_from(*precision)
                    .map_err(|_| CodecError::UnsupportedType(format!("decimal precision {}", precision)))?;
                let s = i8::try_from(*scale)
                    .map_err(|_| CodecError::UnsupportedType(format!("decimal scale {}", scale)))?;
                match bits {
                    128 => ArrowDataType::Decimal128(p, s),
                    256 => ArrowDataType::Decimal256(p, s),
                    other => {
                        return Err(CodecError::UnsupportedType(format!("decimal{}", other)));
                    }
                }
            }
            Self::Date32 => ArrowDataType::Date32,
            Self::Date64 => ArrowDataType::Date64,
            Self::Time32(u) => ArrowDataType::Time32(u.to_arrow()),
            Self::Time64(u) => ArrowDataType::Time64(u.to_arrow()),
            Self::Timestamp(u, tz) => ArrowDataType::Timestamp(u.to_arrow(), tz.as_deref().map(Into::into)),
            Self::Duration(u) => ArrowDataType::Duration(u.to_arrow()),
            Self::Interval(IntervalUnit::YearMonth) => ArrowDataType::Interval(ArrowIntervalUnit::YearMonth),
            Self::Interval(IntervalUnit::DayTime) => ArrowDataType::Interval(ArrowIntervalUnit::DayTime),
            Self::Interval(IntervalUnit::MonthDayNano) => {
                ArrowDataType::Interval(ArrowIntervalUnit::MonthDayNano)
            }
            Self::List(f) => ArrowDataType::List(child(f)?),
            Self::LargeList(f) => ArrowDataType::LargeList(child(f)?),
            Self::FixedSizeList(n, f) => ArrowDataType::FixedSizeList(child(f)?, *n),
            Self::ListView(f) => ArrowDataType::ListView(child(f)?),
            Self::LargeListView(f) => ArrowDataType::LargeListView(child(f)?),
            Self::Struct(fields) => ArrowDataType::Struct(
                fields
                    .iter()
                    .map(Field::to_arrow_field)
                    .collect::<Result<Vec<_>, _>>()?
                    .into(),
            ),
            Self::Map { key, value } => {
                let entries = arrow_schema::Field::new(
                    "entries",
                    ArrowDataType::Struct(vec![child(key)?, child(value)?].into()),
                    false,
                );
                ArrowDataType::Map(std::sync::Arc::new(entries), false)
            }
            Self::DenseUnion { type_ids, variants } | Self::SparseUnion { type_ids, variants } => {
                let fields = variants
                    .iter()
                    .map(Field::to_arrow_field)
                    .collect::<Result<Vec<_>, _>>()?;
                let mode = if matches!(self, Self::DenseUnion { .. }) {
                    UnionMode::Dense
                } else {
                    UnionMode::Sparse
                };
                ArrowDataType::Union(UnionFields::new(type_ids.clone(), fields), mode)
            }
            Self::RunEndEncoded { run_ends, values } => {
                ArrowDataType::RunEndEncoded(child(run_ends)?, child(values)?)
            }
            Self::Dictionary { index, value } => {
                let value = value
                    .as_ref()
                    .ok_or_else(|| CodecError::UnsupportedType("dictionary has no value field".into()))?;
                ArrowDataType::Dictionary(Box::new(index.to_arrow_type()?), Box::new(value.tag.to_arrow_type()?))
            }
        })
    }

    /// Converts an Arrow `DataType` into a tag, populating every nested slot.
    pub fn from_arrow_type(arrow_type: &ArrowDataType) -> Result<Self, CodecError> {
        let boxed = |f: &arrow_schema::FieldRef| Field::from_arrow_field(f).map(Box::new);
        Ok(match arrow_type {
            ArrowDataType::Null => Self::Null,
            ArrowDataType::Boolean => Self::Boolean,
            ArrowDataType::Int8 => Self::Int8,
            ArrowDataType::Int16 => Self::Int16,
            ArrowDataType::Int32 => Self::Int32,
            ArrowDataType::Int64 => Self::Int64,
            ArrowDataType::UInt8 => Self::UInt8,
            ArrowDataType::UInt16 => Self::UInt16,
            ArrowDataType::UInt32 => Self::UInt32,
            ArrowDataType::UInt64 => Self::UInt64,
            ArrowDataType::Float16 => Self::Float16,
            ArrowDataType::Float32 => Self::Float32,
            ArrowDataType::Float64 => Self::Float64,
            ArrowDataType::Binary => Self::Binary,
            ArrowDataType::LargeBinary => Self::LargeBinary,
            ArrowDataType::Utf8 => Self::Utf8,
            ArrowDataType::LargeUtf8 => Self::LargeUtf8,
            ArrowDataType::FixedSizeBinary(n) => Self::FixedSizeBinary(*n),
            ArrowDataType::Decimal128(p, s) => Self::Decimal {
                bits: 128,
                precision: u32::from(*p),
                scale: i32::from(*s),
            },
            ArrowDataType::Decimal256(p, s) => Self::Decimal {
                bits: 256,
                precision: u32::from(*p),
                scale: i32::from(*s),
            },
            ArrowDataType::Date32 => Self::Date32,
            ArrowDataType::Date64 => Self::Date64,
            ArrowDataType::Time32(u) => Self::Time32(TimeUnit::from_arrow(u)),
            ArrowDataType::Time64(u) => Self::Time64(TimeUnit::from_arrow(u)),
            ArrowDataType::Timestamp(u, tz) => {
                Self::Timestamp(TimeUnit::from_arrow(u), tz.as_ref().map(|t| t.to_string()))
            }
            ArrowDataType::Duration(u) => Self::Duration(TimeUnit::from_arrow(u)),
            ArrowDataType::Interval(ArrowIntervalUnit::YearMonth) => Self::Interval(IntervalUnit::YearMonth),
            ArrowDataType::Interval(ArrowIntervalUnit::DayTime) => Self::Interval(IntervalUnit::DayTime),
            ArrowDataType::Interval(ArrowIntervalUnit::MonthDayNano) => {
                Self::Interval(IntervalUnit::MonthDayNano)
            }
            ArrowDataType::List(f) => Self::List(Some(boxed(f)?)),
            ArrowDataType::LargeList(f) => Self::LargeList(Some(boxed(f)?)),
            ArrowDataType::FixedSizeList(f, n) => Self::FixedSizeList(*n, Some(boxed(f)?)),
            ArrowDataType::ListView(f) => Self::ListView(Some(boxed(f)?)),
            ArrowDataType::LargeListView(f) => Self::LargeListView(Some(boxed(f)?)),
            ArrowDataType::Struct(fields) => Self::Struct(
                fields
                    .iter()
                    .map(|f| Field::from_arrow_field(f))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            ArrowDataType::Map(entries, _) => match entries.data_type() {
                ArrowDataType::Struct(kv) if kv.len() == 2 => Self::Map {
                    key: Some(boxed(&kv[0])?),
                    value: Some(boxed(&kv[1])?),
                },
                other => {
                    return Err(CodecError::UnsupportedType(format!(
                        "map entries must be a two-field struct, got {:?}",
                        other
                    )));
                }
            },
            ArrowDataType::Union(fields, mode) => {
                let mut type_ids = Vec::with_capacity(fields.len());
                let mut variants = Vec::with_capacity(fields.len());
                for (id, f) in fields.iter() {
                    type_ids.push(id);
                    variants.push(Field::from_arrow_field(f)?);
                }
                match mode {
                    UnionMode::Dense => Self::DenseUnion { type_ids, variants },
                    UnionMode::Sparse => Self::SparseUnion { type_ids, variants },
                }
            }
            ArrowDataType::RunEndEncoded(run_ends, values) => Self::RunEndEncoded {
                run_ends: Some(boxed(run_ends)?),
                values: Some(boxed(values)?),
            },
            ArrowDataType::Dictionary(index, value) => Self::Dictionary {
                index: Box::new(Self::from_arrow_type(index)?),
                value: Some(Box::new(Field::new("", Self::from_arrow_type(value)?, true))),
            },
            dt => {
                return Err(CodecError::UnsupportedType(format!(
                    "Cannot convert Arrow type {:?} to TypeTag",
                    dt
                )));
            }
        })
    }
}

//==================================================================================
// 3. Format string grammar
//==================================================================================

fn parse_width(digits: &str, format: &str) -> Result<i32, CodecError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::UnsupportedFormat(format.to_string()));
    }
    digits
        .parse::<i32>()
        .map_err(|_| CodecError::UnsupportedFormat(format.to_string()))
}

fn parse_decimal(params: &str, format: &str) -> Result<TypeTag, CodecError> {
    let parts: Vec<&str> = params.split(',').collect();
    if parts.len() != 2 && parts.len() != 3 {
        return Err(CodecError::UnsupportedFormat(format.to_string()));
    }
    let precision = parse_width(parts[0], format)? as u32;
    let scale = match parts[1].strip_prefix('-') {
        Some(rest) => -parse_width(rest, format)?,
        None => parse_width(parts[1], format)?,
    };
    let bits = match parts.get(2) {
        Some(b) => parse_width(b, format)?,
        None => 128,
    };
    if bits != 128 && bits != 256 {
        return Err(CodecError::UnsupportedFormat(format.to_string()));
    }
    Ok(TypeTag::Decimal {
        bits: bits as u16,
        precision,
        scale,
    })
}

fn parse_type_ids(ids: &str, format: &str) -> Result<Vec<i8>, CodecError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    ids.split(',')
        .map(|id| {
            let value = parse_width(id, format)?;
            i8::try_from(value).map_err(|_| CodecError::UnsupportedFormat(format.to_string()))
        })
        .collect()
}

/// Maps an Arrow C format string to its tag. Nested slots are left empty.
pub fn parse_format(format: &str) -> Result<TypeTag, CodecError> {
    let tag = match format {
        "n" => TypeTag::Null,
        "b" => TypeTag::Boolean,
        "c" => TypeTag::Int8,
        "C" => TypeTag::UInt8,
        "s" => TypeTag::Int16,
        "S" => TypeTag::UInt16,
        "i" => TypeTag::Int32,
        "I" => TypeTag::UInt32,
        "l" => TypeTag::Int64,
        "L" => TypeTag::UInt64,
        "e" => TypeTag::Float16,
        "f" => TypeTag::Float32,
        "g" => TypeTag::Float64,
        "z" => TypeTag::Binary,
        "Z" => TypeTag::LargeBinary,
        "u" => TypeTag::Utf8,
        "U" => TypeTag::LargeUtf8,
        "tdD" => TypeTag::Date32,
        "tdm" => TypeTag::Date64,
        "tts" => TypeTag::Time32(TimeUnit::Second),
        "ttm" => TypeTag::Time32(TimeUnit::Millisecond),
        "ttu" => TypeTag::Time64(TimeUnit::Microsecond),
        "ttn" => TypeTag::Time64(TimeUnit::Nanosecond),
        "tiM" => TypeTag::Interval(IntervalUnit::YearMonth),
        "tiD" => TypeTag::Interval(IntervalUnit::DayTime),
        "tin" => TypeTag::Interval(IntervalUnit::MonthDayNano),
        "+l" => TypeTag::List(None),
        "+L" => TypeTag::LargeList(None),
        "+vl" => TypeTag::ListView(None),
        "+vL" => TypeTag::LargeListView(None),
        "+s" => TypeTag::Struct(Vec::new()),
        "+m" => TypeTag::Map {
            key: None,
            value: None,
        },
        "+r" => TypeTag::RunEndEncoded {
            run_ends: None,
            values: None,
        },
        _ => {
            if let Some(width) = format.strip_prefix("+w:") {
                TypeTag::FixedSizeList(parse_width(width, format)?, None)
            } else if let Some(width) = format.strip_prefix("w:") {
                TypeTag::FixedSizeBinary(parse_width(width, format)?)
            } else if let Some(params) = format.strip_prefix("d:") {
                parse_decimal(params, format)?
            } else if let Some(ids) = format.strip_prefix("+ud:") {
                TypeTag::DenseUnion {
                    type_ids: parse_type_ids(ids, format)?,
                    variants: Vec::new(),
                }
            } else if let Some(ids) = format.strip_prefix("+us:") {
                TypeTag::SparseUnion {
                    type_ids: parse_type_ids(ids, format)?,
                    variants: Vec::new(),
                }
            } else if let Some(rest) = format.strip_prefix("ts") {
                let mut chars = rest.chars();
                let unit = chars.next().and_then(TimeUnit::from_format_char);
                match (unit, chars.next()) {
                    (Some(unit), Some(':')) => {
                        let tz = chars.as_str();
                        TypeTag::Timestamp(unit, if tz.is_empty() { None } else { Some(tz.to_string()) })
                    }
                    _ => return Err(CodecError::UnsupportedFormat(format.to_string())),
                }
            } else if let Some(rest) = format.strip_prefix("tD") {
                match TimeUnit::from_format_char(rest.chars().next().unwrap_or('?')) {
                    Some(unit) if rest.len() == 1 => TypeTag::Duration(unit),
                    _ => return Err(CodecError::UnsupportedFormat(format.to_string())),
                }
            } else {
                return Err(CodecError::UnsupportedFormat(format.to_string()));
            }
        }
    };
    Ok(tag)
}

/// Maps a tag back to its Arrow C format string. Dictionary tags yield the
/// format of their index type.
pub fn format_of(tag: &TypeTag) -> String {
    match tag {
        TypeTag::Null => "n".into(),
        TypeTag::Boolean => "b".into(),
        TypeTag::Int8 => "c".into(),
        TypeTag::UInt8 => "C".into(),
        TypeTag::Int16 => "s".into(),
        TypeTag::UInt16 => "S".into(),
        TypeTag::Int32 => "i".into(),
        TypeTag::UInt32 => "I".into(),
        TypeTag::Int64 => "l".into(),
        TypeTag::UInt64 => "L".into(),
        TypeTag::Float16 => "e".into(),
        TypeTag::Float32 => "f".into(),
        TypeTag::Float64 => "g".into(),
        TypeTag::Binary => "z".into(),
        TypeTag::LargeBinary => "Z".into(),
        TypeTag::Utf8 => "u".into(),
        TypeTag::LargeUtf8 => "U".into(),
        TypeTag::FixedSizeBinary(n) => format!("w:{}", n),
        TypeTag::Decimal { bits: 128, precision, scale } => format!("d:{},{}", precision, scale),
        TypeTag::Decimal { bits, precision, scale } => format!("d:{},{},{}", precision, scale, bits),
        TypeTag::Date32 => "tdD".into(),
        TypeTag::Date64 => "tdm".into(),
        TypeTag::Time32(u) | TypeTag::Time64(u) => format!("tt{}", u.format_char()),
        TypeTag::Timestamp(u, tz) => format!("ts{}:{}", u.format_char(), tz.as_deref().unwrap_or("")),
        TypeTag::Duration(u) => format!("tD{}", u.format_char()),
        TypeTag::Interval(IntervalUnit::YearMonth) => "tiM".into(),
        TypeTag::Interval(IntervalUnit::DayTime) => "tiD".into(),
        TypeTag::Interval(IntervalUnit::MonthDayNano) => "tin".into(),
        TypeTag::List(_) => "+l".into(),
        TypeTag::LargeList(_) => "+L".into(),
        TypeTag::FixedSizeList(n, _) => format!("+w:{}", n),
        TypeTag::ListView(_) => "+vl".into(),
        TypeTag::LargeListView(_) => "+vL".into(),
        TypeTag::Struct(_) => "+s".into(),
        TypeTag::Map { .. } => "+m".into(),
        TypeTag::DenseUnion { type_ids, .. } => format!("+ud:{}", join_ids(type_ids)),
        TypeTag::SparseUnion { type_ids, .. } => format!("+us:{}", join_ids(type_ids)),
        TypeTag::RunEndEncoded { .. } => "+r".into(),
        TypeTag::Dictionary { index, .. } => format_of(index),
    }
}

fn join_ids(ids: &[i8]) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",")
}

//==================================================================================
// 4. Display
//==================================================================================

fn write_child(f: &mut fmt::Formatter<'_>, slot: &Option<Box<Field>>) -> fmt::Result {
    match slot {
        Some(field) => write!(f, "{}", field.tag),
        None => write!(f, "?"),
    }
}

fn write_fields(f: &mut fmt::Formatter<'_>, fields: &[Field]) -> fmt::Result {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}: {}", field.name, field.tag)?;
    }
    Ok(())
}

/// Provides the canonical human-readable name for a tag.
impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean => write!(f, "boolean"),
            Self::Int8 => write!(f, "int8"),
            Self::Int16 => write!(f, "int16"),
            Self::Int32 => write!(f, "int32"),
            Self::Int64 => write!(f, "int64"),
            Self::UInt8 => write!(f, "uint8"),
            Self::UInt16 => write!(f, "uint16"),
            Self::UInt32 => write!(f, "uint32"),
            Self::UInt64 => write!(f, "uint64"),
            Self::Float16 => write!(f, "float16"),
            Self::Float32 => write!(f, "float32"),
            Self::Float64 => write!(f, "float64"),
            Self::Binary => write!(f, "binary"),
            Self::LargeBinary => write!(f, "large_binary"),
            Self::Utf8 => write!(f, "string"),
            Self::LargeUtf8 => write!(f, "large_string"),
            Self::FixedSizeBinary(n) => write!(f, "fixed_size_binary[{}]", n),
            Self::Decimal { bits, precision, scale } => write!(f, "decimal{}({}, {})", bits, precision, scale),
            Self::Date32 => write!(f, "date32"),
            Self::Date64 => write!(f, "date64"),
            Self::Time32(u) => write!(f, "time32[{}]", u.suffix()),
            Self::Time64(u) => write!(f, "time64[{}]", u.suffix()),
            Self::Timestamp(u, None) => write!(f, "timestamp[{}]", u.suffix()),
            Self::Timestamp(u, Some(tz)) => write!(f, "timestamp[{}, {}]", u.suffix(), tz),
            Self::Duration(u) => write!(f, "duration[{}]", u.suffix()),
            Self::Interval(IntervalUnit::YearMonth) => write!(f, "interval[month]"),
            Self::Interval(IntervalUnit::DayTime) => write!(f, "interval[day_time]"),
            Self::Interval(IntervalUnit::MonthDayNano) => write!(f, "interval[month_day_nano]"),
            Self::List(c) => {
                write!(f, "list<")?;
                write_child(f, c)?;
                write!(f, ">")
            }
            Self::LargeList(c) => {
                write!(f, "large_list<")?;
                write_child(f, c)?;
                write!(f, ">")
            }
            Self::FixedSizeList(n, c) => {
                write!(f, "fixed_size_list<")?;
                write_child(f, c)?;
                write!(f, ">[{}]", n)
            }
            Self::ListView(c) => {
                write!(f, "list_view<")?;
                write_child(f, c)?;
                write!(f, ">")
            }
            Self::LargeListView(c) => {
                write!(f, "large_list_view<")?;
                write_child(f, c)?;
                write!(f, ">")
            }
            Self::Struct(fields) => {
                write!(f, "struct<")?;
                write_fields(f, fields)?;
                write!(f, ">")
            }
            Self::Map { key, value } => {
                write!(f, "map<")?;
                write_child(f, key)?;
                write!(f, ", ")?;
                write_child(f, value)?;
                write!(f, ">")
            }
            Self::DenseUnion { variants, .. } => {
                write!(f, "dense_union<")?;
                write_fields(f, variants)?;
                write!(f, ">")
            }
            Self::SparseUnion { variants, .. } => {
                write!(f, "sparse_union<")?;
                write_fields(f, variants)?;
                write!(f, ">")
            }
            Self::RunEndEncoded { run_ends, values } => {
                write!(f, "run_end_encoded<")?;
                write_child(f, run_ends)?;
                write!(f, ", ")?;
                write_child(f, values)?;
                write!(f, ">")
            }
            Self::Dictionary { index, value } => {
                write!(f, "dictionary<values=")?;
                write_child(f, value)?;
                write!(f, ", indices={}>", index)
            }
        }
    }
}
