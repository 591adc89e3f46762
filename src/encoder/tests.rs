use super::*;
use crate::decoder::decode_column;
use crate::ffi::DayTimeSlot;
use crate::test_support::values_of;
use crate::types::{Calendar, Date, Field, NaiveDateTime, Time, TimeUnit};

fn round_trip(column: &ColumnValue) -> ColumnValue {
    let (schema, array) = encode_column(column).unwrap();
    unsafe { decode_column(&schema, &array) }.unwrap()
}

fn nullable_column(tag: TypeTag, values: Vec<Value>) -> ColumnValue {
    ColumnValue::values("c", tag, values).nullable(true)
}

fn assert_round_trips(tag: TypeTag, values: Vec<Value>) {
    let column = nullable_column(tag.clone(), values.clone());
    let decoded = round_trip(&column);
    assert_eq!(decoded.tag, tag);
    assert_eq!(decoded.name, "c");
    assert_eq!(values_of(&decoded), values, "round trip of {}", tag);
}

//==================================================================================
// Round trips
//==================================================================================

#[test]
fn test_integer_types_round_trip() {
    assert_round_trips(TypeTag::Int8, vec![Value::Int(-128), Value::Nil, Value::Int(127)]);
    assert_round_trips(TypeTag::Int16, vec![Value::Int(-32_768), Value::Int(7)]);
    assert_round_trips(TypeTag::Int32, vec![Value::Int(i64::from(i32::MIN)), Value::Nil]);
    assert_round_trips(TypeTag::Int64, vec![Value::Int(i64::MAX), Value::Int(0)]);
    assert_round_trips(TypeTag::UInt8, vec![Value::UInt(255), Value::Nil]);
    assert_round_trips(TypeTag::UInt16, vec![Value::UInt(65_535)]);
    assert_round_trips(TypeTag::UInt32, vec![Value::UInt(u64::from(u32::MAX))]);
    assert_round_trips(TypeTag::UInt64, vec![Value::UInt(u64::MAX), Value::Nil]);
    assert_round_trips(TypeTag::Duration(TimeUnit::Millisecond), vec![Value::Int(-5), Value::Nil]);
    assert_round_trips(TypeTag::Interval(IntervalUnit::YearMonth), vec![Value::Int(14)]);
}

#[test]
fn test_floats_and_booleans_round_trip() {
    assert_round_trips(TypeTag::Float16, vec![Value::Float(1.5), Value::Nil, Value::Float(-0.25)]);
    assert_round_trips(TypeTag::Float32, vec![Value::Float(3.140625), Value::Float(f64::INFINITY)]);
    assert_round_trips(TypeTag::Float64, vec![Value::Float(f64::MIN_POSITIVE), Value::Nil]);
    assert_round_trips(TypeTag::Boolean, vec![Value::Bool(true), Value::Nil, Value::Bool(false)]);
    assert_round_trips(TypeTag::Null, vec![Value::Nil, Value::Nil]);
}

#[test]
fn test_binary_types_round_trip() {
    assert_round_trips(TypeTag::Utf8, vec![Value::str("héllo"), Value::Nil, Value::str("x")]);
    assert_round_trips(TypeTag::LargeUtf8, vec![Value::str("large")]);
    assert_round_trips(TypeTag::Binary, vec![Value::Bytes(vec![0, 255, 7])]);
    assert_round_trips(TypeTag::LargeBinary, vec![Value::Nil, Value::Bytes(vec![1])]);
    assert_round_trips(TypeTag::FixedSizeBinary(3), vec![Value::Bytes(vec![1, 2, 3]), Value::Nil]);
    assert_round_trips(
        TypeTag::Decimal {
            bits: 256,
            precision: 40,
            scale: -2,
        },
        vec![Value::Bytes(vec![9; 32])],
    );
}

#[test]
fn test_temporal_types_round_trip() {
    assert_round_trips(TypeTag::Date32, vec![Value::Date(Date::new(2024, 2, 29)), Value::Nil]);
    assert_round_trips(TypeTag::Date64, vec![Value::Date(Date::new(1960, 7, 1))]);
    assert_round_trips(
        TypeTag::Time32(TimeUnit::Millisecond),
        vec![Value::Time(Time::new(23, 59, 59, (999_000, 3)))],
    );
    assert_round_trips(
        TypeTag::Time64(TimeUnit::Microsecond),
        vec![Value::Time(Time::new(1, 2, 3, (123_456, 6))), Value::Nil],
    );
    let dt = NaiveDateTime::new(Date::new(2023, 11, 14), Time::new(22, 13, 20, (5, 6)));
    assert_round_trips(
        TypeTag::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
        vec![Value::NaiveDateTime(dt)],
    );
    let before_epoch = NaiveDateTime::new(Date::new(1969, 12, 31), Time::new(23, 59, 59, (0, 0)));
    assert_round_trips(
        TypeTag::Timestamp(TimeUnit::Second, None),
        vec![Value::NaiveDateTime(before_epoch)],
    );
}

#[test]
fn test_intervals_round_trip() {
    assert_round_trips(
        TypeTag::Interval(IntervalUnit::DayTime),
        vec![Value::IntervalDayTime { days: -1, millis: 250 }],
    );
    assert_round_trips(
        TypeTag::Interval(IntervalUnit::MonthDayNano),
        vec![
            Value::IntervalMonthDayNano {
                months: 1,
                days: 2,
                nanos: 3,
            },
            Value::Nil,
        ],
    );
}

#[test]
fn test_raw_integers_are_accepted_for_temporal_columns() {
    let column = ColumnValue::values("t", TypeTag::Timestamp(TimeUnit::Second, None), vec![Value::Int(1_700_000_000)]);
    let decoded = round_trip(&column);
    let Value::NaiveDateTime(dt) = &values_of(&decoded)[0] else {
        panic!("expected a datetime");
    };
    assert_eq!(dt.date(), Date::new(2023, 11, 14));
    assert_eq!((dt.hour, dt.minute, dt.second), (22, 13, 20));
}

#[test]
fn test_metadata_survives_encoding() {
    let md = vec![(b"origin".to_vec(), b"sensor-7".to_vec())];
    let column = ColumnValue::values("m", TypeTag::Int32, vec![Value::Int(1)]).with_metadata(Some(md.clone()));
    assert_eq!(round_trip(&column).metadata, Some(md));

    let empty = ColumnValue::values("m", TypeTag::Int32, vec![Value::Int(1)]).with_metadata(Some(vec![]));
    assert_eq!(round_trip(&empty).metadata, None);
}

//==================================================================================
// Value validation
//==================================================================================

#[test]
fn test_nil_requires_a_nullable_column() {
    let column = ColumnValue::values("strict", TypeTag::Int64, vec![Value::Int(1), Value::Nil]);
    let err = encode_column(&column).unwrap_err();
    assert!(matches!(err.root_cause(), CodecError::TypeMismatch(_)));
    assert!(err.to_string().starts_with("In field 'strict'"));
}

#[test]
fn test_integer_range_is_checked() {
    let column = nullable_column(TypeTag::Int8, vec![Value::Int(128)]);
    assert!(matches!(encode_column(&column).unwrap_err().root_cause(), CodecError::TypeMismatch(_)));
    let column = nullable_column(TypeTag::UInt32, vec![Value::Int(-1)]);
    assert!(matches!(encode_column(&column).unwrap_err().root_cause(), CodecError::TypeMismatch(_)));
}

#[test]
fn test_floats_and_booleans_are_strict() {
    let column = nullable_column(TypeTag::Float64, vec![Value::Int(1)]);
    assert!(matches!(encode_column(&column).unwrap_err().root_cause(), CodecError::TypeMismatch(_)));
    let column = nullable_column(TypeTag::Boolean, vec![Value::Int(1)]);
    assert!(matches!(encode_column(&column).unwrap_err().root_cause(), CodecError::TypeMismatch(_)));
}

#[test]
fn test_decimal_payload_length_is_checked() {
    let tag = TypeTag::Decimal {
        bits: 128,
        precision: 38,
        scale: 10,
    };
    for bad in [15usize, 17] {
        let column = nullable_column(tag.clone(), vec![Value::Bytes(vec![0; bad])]);
        assert!(matches!(encode_column(&column).unwrap_err().root_cause(), CodecError::TypeMismatch(_)));
    }
    let column = nullable_column(tag, vec![Value::Bytes(vec![0; 16])]);
    assert!(encode_column(&column).is_ok());
}

#[test]
fn test_utf8_validation_is_opt_in() {
    let column = nullable_column(TypeTag::Utf8, vec![Value::Bytes(vec![0xff])]);
    assert!(encode_column(&column).is_ok());

    let config = CodecConfig {
        validate_utf8: true,
        ..CodecConfig::default()
    };
    let err = encode_column_with_config(&column, &config).unwrap_err();
    assert!(matches!(err.root_cause(), CodecError::TypeMismatch(_)));
}

#[test]
fn test_non_iso_calendar_is_rejected() {
    let mut date = Date::new(2024, 1, 1);
    date.calendar = Calendar::Other("Calendar.Holocene".into());
    let column = nullable_column(TypeTag::Date32, vec![Value::Date(date)]);
    let err = encode_column(&column).unwrap_err();
    assert!(matches!(err.root_cause(), CodecError::CalendarValidation(msg) if msg.contains("Expected Calendar.ISO")));
}

#[test]
fn test_unsupported_layouts() {
    let item = Field::new("item", TypeTag::Int32, true);
    let view = nullable_column(TypeTag::ListView(Some(Box::new(item))), vec![]);
    assert!(matches!(encode_column(&view).unwrap_err().root_cause(), CodecError::UnsupportedType(_)));

    let union = nullable_column(
        TypeTag::SparseUnion {
            type_ids: vec![0],
            variants: vec![Field::new("a", TypeTag::Int32, true)],
        },
        vec![],
    );
    assert!(matches!(encode_column(&union).unwrap_err().root_cause(), CodecError::UnsupportedType(_)));

    let eos = ColumnValue::new("", TypeTag::Struct(vec![]), ColumnData::EndOfSeries);
    assert!(matches!(encode_column(&eos), Err(CodecError::UnsupportedType(_))));
}

//==================================================================================
// Lists and maps
//==================================================================================

#[test]
fn test_list_item_type_is_inferred() {
    let column = nullable_column(
        TypeTag::List(None),
        vec![Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]), Value::Nil],
    );
    let (schema, _array) = encode_column(&column).unwrap();
    assert_eq!(schema.child(0).unwrap().format().unwrap(), "l");
    assert_eq!(schema.child(0).unwrap().name(), "item");

    let decoded = round_trip(&column);
    let values = values_of(&decoded);
    let Value::Column(first) = &values[0] else {
        panic!("expected a nested column");
    };
    assert_eq!(first.tag, TypeTag::Int64);
    assert_eq!(values_of(first), vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    assert_eq!(values[1], Value::Nil);
}

#[test]
fn test_all_nil_list_infers_null_type() {
    let column = nullable_column(TypeTag::List(None), vec![Value::List(vec![Value::Nil, Value::Nil])]);
    let (schema, array) = encode_column(&column).unwrap();
    assert_eq!(schema.child(0).unwrap().format().unwrap(), "n");
    assert_eq!(array.child(0).unwrap().length, 2);
}

#[test]
fn test_mixed_list_fails() {
    let column = nullable_column(TypeTag::List(None), vec![Value::List(vec![Value::Int(1), Value::str("a")])]);
    assert!(matches!(encode_column(&column).unwrap_err().root_cause(), CodecError::TypeMismatch(_)));
}

#[test]
fn test_list_of_lists_is_unsupported() {
    let inner = Field::new("item", TypeTag::List(None), true);
    let column = nullable_column(
        TypeTag::List(Some(Box::new(inner))),
        vec![Value::List(vec![Value::List(vec![Value::Int(1)])])],
    );
    assert!(matches!(encode_column(&column).unwrap_err().root_cause(), CodecError::UnsupportedType(_)));
}

#[test]
fn test_fixed_size_list_round_trip() {
    let item = Field::new("item", TypeTag::Int16, true);
    let column = nullable_column(
        TypeTag::FixedSizeList(2, Some(Box::new(item))),
        vec![Value::List(vec![Value::Int(1), Value::Int(2)]), Value::Nil],
    );
    let values = values_of(&round_trip(&column));
    let Value::Column(first) = &values[0] else {
        panic!("expected a nested column");
    };
    assert_eq!(values_of(first), vec![Value::Int(1), Value::Int(2)]);
    assert_eq!(values[1], Value::Nil);

    let wrong = nullable_column(TypeTag::FixedSizeList(2, None), vec![Value::List(vec![Value::Int(1)])]);
    assert!(matches!(encode_column(&wrong).unwrap_err().root_cause(), CodecError::LengthMismatch(2, 1)));
}

#[test]
fn test_map_round_trip() {
    let rows = vec![
        Value::Map(vec![(Value::str("a"), Value::Int(1)), (Value::str("b"), Value::Nil)]),
        Value::Nil,
    ];
    let column = nullable_column(TypeTag::Map { key: None, value: None }, rows.clone());
    let decoded = round_trip(&column);
    assert_eq!(values_of(&decoded), rows);
    assert!(matches!(&decoded.tag, TypeTag::Map { key: Some(k), .. } if k.name == "key" && !k.nullable));
}

#[test]
fn test_map_duplicate_keys_are_rejected() {
    let column = nullable_column(
        TypeTag::Map { key: None, value: None },
        vec![Value::Map(vec![(Value::Int(1), Value::str("a")), (Value::Int(1), Value::str("b"))])],
    );
    assert!(matches!(encode_column(&column).unwrap_err().root_cause(), CodecError::DuplicateKey(_)));

    let from_lists =
        Value::map_from_keys_values(vec![Value::Int(1), Value::Int(1)], vec![Value::str("a"), Value::str("b")]);
    assert!(matches!(from_lists, Err(CodecError::DuplicateKey(_))));
}

//==================================================================================
// Struct, run-end encoded, dictionary
//==================================================================================

#[test]
fn test_struct_round_trip_with_validity() {
    let id = ColumnValue::values("id", TypeTag::Int32, vec![Value::Int(1), Value::Int(0)]);
    let name = ColumnValue::values("name", TypeTag::Utf8, vec![Value::str("a"), Value::Nil]).nullable(true);
    let fields = vec![Field::new("id", TypeTag::Int32, false), Field::new("name", TypeTag::Utf8, true)];
    let column = ColumnValue::new(
        "row",
        TypeTag::Struct(fields),
        ColumnData::Struct {
            fields: vec![id, name],
            validity: Some(vec![true, false]),
        },
    )
    .nullable(true);

    let decoded = round_trip(&column);
    let ColumnData::Struct { fields, validity } = &decoded.data else {
        panic!("expected struct data");
    };
    assert_eq!(validity.as_deref(), Some(&[true, false][..]));
    assert_eq!(fields[0].name, "id");
    assert_eq!(values_of(&fields[1]), vec![Value::str("a"), Value::Nil]);
}

#[test]
fn test_struct_children_must_agree_on_length() {
    let a = ColumnValue::values("a", TypeTag::Int32, vec![Value::Int(1)]);
    let b = ColumnValue::values("b", TypeTag::Int32, vec![Value::Int(1), Value::Int(2)]);
    let column = ColumnValue::new(
        "s",
        TypeTag::Struct(vec![]),
        ColumnData::Struct {
            fields: vec![a, b],
            validity: None,
        },
    );
    let err = encode_column(&column).unwrap_err();
    assert!(matches!(err.root_cause(), CodecError::LengthMismatch(1, 2)));
}

#[test]
fn test_run_end_encoded_round_trip() {
    let run_ends = ColumnValue::values("ends", TypeTag::Int32, vec![Value::Int(2), Value::Int(5)]);
    let values = ColumnValue::values("vals", TypeTag::Utf8, vec![Value::str("x"), Value::str("y")]);
    let column = ColumnValue::new(
        "runs",
        TypeTag::RunEndEncoded {
            run_ends: Some(Box::new(Field::new("run_ends", TypeTag::Int32, false))),
            values: Some(Box::new(Field::new("values", TypeTag::Utf8, false))),
        },
        ColumnData::RunEndEncoded {
            length: 5,
            offset: 0,
            run_ends: Box::new(run_ends),
            values: Box::new(values),
        },
    );

    let decoded = round_trip(&column);
    let ColumnData::RunEndEncoded {
        length,
        run_ends,
        values,
        ..
    } = &decoded.data
    else {
        panic!("expected run-end data");
    };
    assert_eq!(*length, 5);
    assert_eq!(run_ends.name, "run_ends");
    assert_eq!(values.name, "values");
    assert_eq!(values_of(values), vec![Value::str("x"), Value::str("y")]);
}

#[test]
fn test_dictionary_round_trip() {
    let key = ColumnValue::values("color", TypeTag::Int8, vec![Value::Int(1), Value::Int(0), Value::Int(1)]);
    let value = ColumnValue::values("", TypeTag::Utf8, vec![Value::str("red"), Value::str("blue")]);
    let tag = TypeTag::Dictionary {
        index: Box::new(TypeTag::Int8),
        value: Some(Box::new(Field::new("", TypeTag::Utf8, false))),
    };
    let column = ColumnValue::new(
        "color",
        tag,
        ColumnData::Dictionary {
            key: Box::new(key),
            value: Box::new(value),
        },
    );

    let (schema, array) = encode_column(&column).unwrap();
    assert_eq!(schema.format().unwrap(), "c");
    assert_eq!(schema.dictionary().unwrap().format().unwrap(), "u");
    assert!(array.dictionary().is_some());

    let decoded = unsafe { decode_column(&schema, &array) }.unwrap();
    let ColumnData::Dictionary { key, value } = &decoded.data else {
        panic!("expected dictionary data");
    };
    assert_eq!(values_of(key), vec![Value::Int(1), Value::Int(0), Value::Int(1)]);
    assert_eq!(values_of(value), vec![Value::str("red"), Value::str("blue")]);
}

#[test]
fn test_dictionary_keys_must_be_integers() {
    let key = ColumnValue::values("k", TypeTag::Float32, vec![Value::Float(0.0)]);
    let value = ColumnValue::values("", TypeTag::Utf8, vec![Value::str("a")]);
    let column = ColumnValue::new(
        "d",
        TypeTag::Dictionary {
            index: Box::new(TypeTag::Float32),
            value: None,
        },
        ColumnData::Dictionary {
            key: Box::new(key),
            value: Box::new(value),
        },
    );
    assert!(matches!(encode_column(&column).unwrap_err().root_cause(), CodecError::TypeMismatch(_)));
}

//==================================================================================
// Row batches
//==================================================================================

#[test]
fn test_row_batch_sniffs_scalar_types() {
    let row = vec![
        Value::Int(1),
        Value::Float(2.5),
        Value::str("x"),
        Value::Bool(true),
        Value::Nil,
    ];
    let (schema, array) = encode_row_batch(&row).unwrap();
    let formats: Vec<&str> = (0..5).map(|i| schema.child(i).unwrap().format().unwrap()).collect();
    assert_eq!(formats, vec!["l", "g", "u", "b", "n"]);
    assert_eq!(array.length, 1);

    let decoded = unsafe { decode_column(&schema, &array) }.unwrap();
    let ColumnData::Struct { fields, .. } = &decoded.data else {
        panic!("expected struct data");
    };
    assert_eq!(values_of(&fields[2]), vec![Value::str("x")]);
    assert_eq!(values_of(&fields[4]), vec![Value::Nil]);
}

#[test]
fn test_row_batch_with_columns() {
    let ids = ColumnValue::values("id", TypeTag::Int32, vec![Value::Int(1), Value::Int(2)]);
    let dates = ColumnValue::values(
        "day",
        TypeTag::Date32,
        vec![Value::Date(Date::new(2024, 1, 1)), Value::Date(Date::new(2024, 1, 2))],
    );
    let row = vec![Value::Column(Box::new(ids)), Value::Column(Box::new(dates))];
    let (schema, array) = encode_row_batch(&row).unwrap();
    assert_eq!(array.length, 2);
    assert_eq!(schema.child(1).unwrap().name(), "day");
}

#[test]
fn test_row_batch_errors_name_the_position() {
    let err = encode_row_batch(&[Value::Int(1), Value::Map(vec![])]).unwrap_err();
    assert!(err.to_string().contains("Expected a column descriptor or primitive value at position 1"));

    let ids = ColumnValue::values("id", TypeTag::Int32, vec![Value::Int(1), Value::Int(2)]);
    let err = encode_row_batch(&[Value::Column(Box::new(ids)), Value::Int(1)]).unwrap_err();
    assert!(matches!(err.root_cause(), CodecError::LengthMismatch(2, 1)));
    assert!(err.to_string().starts_with("In field 'column 1'"));
}

#[test]
fn test_fixed_slots_layout() {
    let column = nullable_column(
        TypeTag::Interval(IntervalUnit::DayTime),
        vec![Value::Nil, Value::IntervalDayTime { days: 3, millis: 4 }],
    );
    let (_schema, array) = encode_column(&column).unwrap();
    assert_eq!(array.null_count, 1);
    let slots = unsafe { array.required_buffer::<DayTimeSlot>(1, 2) }.unwrap();
    assert_eq!(slots[1], DayTimeSlot { days: 3, millis: 4 });
    assert_eq!(slots[0], DayTimeSlot::default());
}
