use std::sync::Arc;

use arrow::array::{
    make_array, Array, DictionaryArray, Int32Array, StringArray, StructArray, TimestampMillisecondArray,
};
use arrow::datatypes::{DataType, Int8Type};

use super::*;
use crate::decoder::decode_column;
use crate::encoder::{encode_column, encode_row_batch};
use crate::error::CodecError;
use crate::test_support::{export, import, values_of};
use crate::types::{ColumnData, ColumnValue, Date, Field, TimeUnit, TypeTag, Value};

//==================================================================================
// Exported columns read by arrow-rs
//==================================================================================

#[test]
fn test_encoded_primitive_imports_into_arrow() {
    let column = ColumnValue::values("n", TypeTag::Int32, vec![Value::Int(7), Value::Nil, Value::Int(-1)]).nullable(true);
    let (schema, array) = encode_column(&column).unwrap();
    let data = import(schema, array);
    assert_eq!(data.data_type(), &DataType::Int32);

    let array = make_array(data);
    let ints = array.as_any().downcast_ref::<Int32Array>().unwrap();
    assert_eq!(ints.len(), 3);
    assert_eq!(ints.value(0), 7);
    assert!(ints.is_null(1));
    assert_eq!(ints.value(2), -1);
}

#[test]
fn test_encoded_row_batch_imports_as_struct() {
    let row = vec![Value::Int(3), Value::str("abc")];
    let (schema, array) = encode_row_batch(&row).unwrap();
    let batch = StructArray::from(import(schema, array));
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.num_columns(), 2);
    let text = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
    assert_eq!(text.value(0), "abc");
}

#[test]
fn test_encoded_dictionary_imports_into_arrow() {
    let key = ColumnValue::values("k", TypeTag::Int8, vec![Value::Int(0), Value::Int(0), Value::Int(1)]);
    let value = ColumnValue::values("", TypeTag::Utf8, vec![Value::str("lo"), Value::str("hi")]);
    let column = ColumnValue::new(
        "level",
        TypeTag::Dictionary {
            index: Box::new(TypeTag::Int8),
            value: Some(Box::new(Field::new("", TypeTag::Utf8, false))),
        },
        ColumnData::Dictionary {
            key: Box::new(key),
            value: Box::new(value),
        },
    );
    let (schema, array) = encode_column(&column).unwrap();
    let dict = DictionaryArray::<Int8Type>::from(import(schema, array));
    assert_eq!(dict.keys().values().to_vec(), vec![0, 0, 1]);
    let values = dict.values().as_any().downcast_ref::<StringArray>().unwrap();
    assert_eq!(values.value(1), "hi");
}

//==================================================================================
// Arrays produced by arrow-rs read by the decoder
//==================================================================================

#[test]
fn test_arrow_timestamp_with_timezone_decodes() {
    let array = TimestampMillisecondArray::from(vec![Some(86_400_001), None]).with_timezone("+01:00");
    let (schema, array) = export(&array);
    assert_eq!(schema.format().unwrap(), "tsm:+01:00");

    let column = unsafe { decode_column(&schema, &array) }.unwrap();
    assert_eq!(column.tag, TypeTag::Timestamp(TimeUnit::Millisecond, Some("+01:00".into())));
    let values = values_of(&column);
    let Value::NaiveDateTime(dt) = &values[0] else {
        panic!("expected a datetime");
    };
    assert_eq!(dt.date(), Date::new(1970, 1, 2));
    assert_eq!(dt.microsecond, (1_000, 3));
    assert_eq!(values[1], Value::Nil);
}

#[test]
fn test_arrow_struct_schema_maps_to_fields() {
    let ids: Arc<dyn Array> = Arc::new(Int32Array::from(vec![1, 2]));
    let names: Arc<dyn Array> = Arc::new(StringArray::from(vec![Some("a"), None]));
    let batch = StructArray::try_from(vec![("id", ids), ("name", names)]).unwrap();
    let (schema, _array) = export(&batch);

    let field = Field::from_schema(&schema).unwrap();
    let TypeTag::Struct(children) = &field.tag else {
        panic!("expected a struct tag");
    };
    assert_eq!(children[0].name, "id");
    assert_eq!(children[1].tag, TypeTag::Utf8);
    assert_eq!(field.to_arrow_field().unwrap().data_type(), batch.data_type());
}

//==================================================================================
// Ownership
//==================================================================================

#[test]
fn test_take_leaves_a_released_slot() {
    let (_schema, mut array) = export(&Int32Array::from(vec![1, 2, 3]));
    let moved = ArrowArray::take(&mut array);
    assert!(array.is_released());
    assert!(!moved.is_released());
    assert_eq!(moved.len().unwrap(), 3);
}

#[test]
fn test_handle_release_is_idempotent() {
    let column = ColumnValue::values("h", TypeTag::Int64, vec![Value::Int(5)]);
    let (schema, array) = encode_column(&column).unwrap();
    let handle = ArrayHandle::new(schema, array);
    let clone = handle.clone();
    assert_eq!(handle, clone);

    assert_eq!(values_of(&clone.decode().unwrap()), vec![Value::Int(5)]);

    handle.release();
    handle.release();
    assert!(clone.is_released());
    assert!(matches!(clone.decode(), Err(CodecError::MalformedArray(_))));
}

#[test]
fn test_copied_schema_outlives_the_original() {
    let column = ColumnValue::values("c", TypeTag::Utf8, vec![Value::str("x")])
        .with_metadata(Some(vec![(b"k".to_vec(), b"v".to_vec())]));
    let (schema, _array) = encode_column(&column).unwrap();
    let copy = schema.deep_copy().unwrap();
    drop(schema);

    let field = Field::from_schema(&copy).unwrap();
    assert_eq!(field.name, "c");
    assert_eq!(field.metadata, Some(vec![(b"k".to_vec(), b"v".to_vec())]));
}
