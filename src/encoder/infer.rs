//! Element type inference for list and map children that have no declared
//! type.

use crate::error::CodecError;
use crate::types::{IntervalUnit, TimeUnit, TypeTag, Value};

fn tag_of(value: &Value) -> Result<Option<TypeTag>, CodecError> {
    Ok(Some(match value {
        Value::Nil => return Ok(None),
        Value::Bool(_) => TypeTag::Boolean,
        Value::Int(_) => TypeTag::Int64,
        Value::UInt(_) => TypeTag::UInt64,
        Value::Float(_) => TypeTag::Float64,
        Value::Bytes(bytes) => {
            if std::str::from_utf8(bytes).is_ok() {
                TypeTag::Utf8
            } else {
                TypeTag::Binary
            }
        }
        Value::Date(_) => TypeTag::Date32,
        Value::Time(_) => TypeTag::Time64(TimeUnit::Microsecond),
        Value::NaiveDateTime(_) => TypeTag::Timestamp(TimeUnit::Microsecond, None),
        Value::IntervalDayTime { .. } => TypeTag::Interval(IntervalUnit::DayTime),
        Value::IntervalMonthDayNano { .. } => TypeTag::Interval(IntervalUnit::MonthDayNano),
        Value::List(_) | Value::Column(_) => {
            return Err(CodecError::UnsupportedType(
                "nested list construction (list of lists) is not supported".into(),
            ));
        }
        other => {
            return Err(CodecError::UnsupportedType(format!(
                "cannot infer an element type from a {} value",
                other.kind()
            )));
        }
    }))
}

/// Finds the single type shared by every non-nil value.
///
/// An empty or all-nil list infers the null type. Strings widen to binary
/// when any element is not valid UTF-8; any other disagreement is an error.
pub(crate) fn infer_tag(values: &[Value]) -> Result<TypeTag, CodecError> {
    let mut inferred: Option<TypeTag> = None;
    for (i, value) in values.iter().enumerate() {
        let Some(tag) = tag_of(value)? else {
            continue;
        };
        inferred = match inferred {
            None => Some(tag),
            Some(seen) if seen == tag => Some(seen),
            Some(TypeTag::Utf8) if tag == TypeTag::Binary => Some(TypeTag::Binary),
            Some(TypeTag::Binary) if tag == TypeTag::Utf8 => Some(TypeTag::Binary),
            Some(seen) => {
                return Err(CodecError::TypeMismatch(format!(
                    "list elements disagree on their type: {} then {} at index {}",
                    seen, tag, i
                )));
            }
        };
    }
    Ok(inferred.unwrap_or(TypeTag::Null))
}
