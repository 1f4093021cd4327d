//! Comparison Operator Tests
//!
//! Tests for: Eq, Ne, Lt, Le, Gt, Ge, In, MaximumOf, MinimumOf

use ehrql_query_model::Function;
use ehrql_types::{Code, CodingSystem, Value};
use rstest::rstest;

use super::{apply, patient_column};

#[rstest]
#[case(Function::Eq, Value::Int(1), Value::Int(1), true)]
#[case(Function::Ne, Value::Int(1), Value::Int(1), false)]
#[case(Function::Lt, Value::Int(1), Value::Int(2), true)]
#[case(Function::Le, Value::Int(2), Value::Int(2), true)]
#[case(Function::Gt, Value::date(2020, 1, 2), Value::date(2020, 1, 1), true)]
#[case(Function::Ge, Value::string("a"), Value::string("b"), false)]
fn test_comparisons(
    #[case] op: Function,
    #[case] a: Value,
    #[case] b: Value,
    #[case] expected: bool,
) {
    assert_eq!(apply(op, &[a, b]), Value::Bool(expected));
}

#[rstest]
#[case(Function::Eq)]
#[case(Function::Lt)]
#[case(Function::Ge)]
fn test_null_comparison_is_null(#[case] op: Function) {
    assert_eq!(apply(op, &[Value::Null, Value::Int(1)]), Value::Null);
}

#[test]
fn test_in_set() {
    let code = Code::new(CodingSystem::SnomedCt, "123456");
    let set = Value::set([Value::Code(code.clone())]);
    assert_eq!(apply(Function::In, &[Value::Code(code), set.clone()]), Value::Bool(true));
    assert_eq!(
        apply(Function::In, &[Value::Code(Code::new(CodingSystem::SnomedCt, "999999")), set]),
        Value::Bool(false)
    );
}

#[test]
fn test_maximum_of_ignores_nulls() {
    assert_eq!(
        apply(Function::MaximumOf, &[Value::Int(1), Value::Null, Value::Int(2)]),
        Value::Int(2)
    );
    assert_eq!(apply(Function::MinimumOf, &[Value::Null, Value::Int(3)]), Value::Int(3));
    assert_eq!(apply(Function::MaximumOf, &[Value::Null, Value::Null]), Value::Null);
}

#[test]
fn test_maximum_of_over_patient_columns() {
    let i = patient_column(Value::Null, &[(1, Value::Int(101)), (2, Value::Int(201))]);
    let j = patient_column(Value::Null, &[(1, Value::Int(112)), (2, Value::Int(211))]);
    let k = patient_column(Value::Null, &[(1, Value::Int(111)), (2, Value::Null)]);
    let result = ehrql_eval::apply_function(Function::MaximumOf, &[&i, &j, &k]).unwrap();
    let column = result.as_patient_column().unwrap();
    assert_eq!(column.get(1), &Value::Int(112));
    assert_eq!(column.get(2), &Value::Int(211));
    assert_eq!(column.get(3), &Value::Null);
}
