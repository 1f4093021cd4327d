//! Arithmetic Operator Tests
//!
//! Tests for: Negate, Add, Subtract, Multiply, TrueDivide, FloorDivide,
//! CastToInt, CastToFloat

use ehrql_eval::EvalError;
use ehrql_query_model::Function;
use ehrql_types::{Decimal, Value};
use pretty_assertions::assert_eq;
use rstest::rstest;

use super::{apply, event_column, patient_column};

fn float(mantissa: i64, scale: u32) -> Value {
    Value::Float(Decimal::new(mantissa, scale))
}

#[rstest]
#[case(Function::Add, Value::Int(2), Value::Int(3), Value::Int(5))]
#[case(Function::Subtract, Value::Int(2), Value::Int(3), Value::Int(-1))]
#[case(Function::Multiply, Value::Int(4), Value::Int(3), Value::Int(12))]
#[case(Function::Add, float(15, 1), float(25, 1), float(40, 1))]
#[case(Function::TrueDivide, Value::Int(7), Value::Int(2), float(35, 1))]
#[case(Function::FloorDivide, Value::Int(-7), Value::Int(2), Value::Int(-4))]
#[case(Function::FloorDivide, float(75, 1), float(2, 0), Value::Int(3))]
fn test_binary(
    #[case] op: Function,
    #[case] a: Value,
    #[case] b: Value,
    #[case] expected: Value,
) {
    assert_eq!(apply(op, &[a, b]), expected);
}

#[rstest]
#[case(Function::Add)]
#[case(Function::Multiply)]
#[case(Function::TrueDivide)]
#[case(Function::FloorDivide)]
fn test_null_propagates(#[case] op: Function) {
    assert_eq!(apply(op, &[Value::Null, Value::Int(1)]), Value::Null);
    assert_eq!(apply(op, &[Value::Int(1), Value::Null]), Value::Null);
}

#[test]
fn test_division_by_zero_is_null() {
    assert_eq!(apply(Function::TrueDivide, &[Value::Int(1), Value::Int(0)]), Value::Null);
    assert_eq!(apply(Function::FloorDivide, &[Value::Int(1), Value::Int(0)]), Value::Null);
}

#[test]
fn test_casts() {
    assert_eq!(apply(Function::CastToInt, &[float(-39, 1)]), Value::Int(-3));
    assert_eq!(apply(Function::CastToFloat, &[Value::Int(3)]), float(3, 0));
    assert_eq!(apply(Function::Negate, &[Value::Int(3)]), Value::Int(-3));
}

#[test]
fn test_integer_overflow_is_an_error() {
    let result = ehrql_eval::operators::apply(Function::Add, &[Value::Int(i64::MAX), Value::Int(1)]);
    assert!(matches!(result, Err(EvalError::Overflow { .. })));
}

#[test]
fn test_patient_level_default_is_computed() {
    let a = patient_column(Value::Int(10), &[(1, Value::Int(1))]);
    let b = patient_column(Value::Int(5), &[(2, Value::Int(2))]);
    let result = ehrql_eval::apply_function(Function::Add, &[&a, &b]).unwrap();
    let column = result.as_patient_column().unwrap();
    assert_eq!(column.get(1), &Value::Int(6));
    assert_eq!(column.get(2), &Value::Int(12));
    assert_eq!(column.get(3), &Value::Int(15));
}

#[test]
fn test_patient_value_broadcasts_over_rows() {
    let rows = event_column("events", &[(1, &[(10, Value::Int(1)), (11, Value::Int(2))])]);
    let offset = patient_column(Value::Null, &[(1, Value::Int(100))]);
    let result = ehrql_eval::apply_function(Function::Add, &[&rows, &offset]).unwrap();
    let column = result.as_event_column().unwrap();
    let values: Vec<Value> = column.rows(1).unwrap().values().cloned().collect();
    assert_eq!(values, vec![Value::Int(101), Value::Int(102)]);
}

#[test]
fn test_event_columns_from_different_tables_do_not_mix() {
    let a = event_column("events", &[(1, &[(10, Value::Int(1))])]);
    let b = event_column("other_events", &[(1, &[(20, Value::Int(1))])]);
    let result = ehrql_eval::apply_function(Function::Add, &[&a, &b]);
    assert!(matches!(result, Err(EvalError::LineageMismatch { .. })));
}
