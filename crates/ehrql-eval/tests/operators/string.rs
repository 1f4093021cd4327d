//! String Operator Tests
//!
//! Tests for: StringContains

use ehrql_query_model::Function;
use ehrql_types::{Code, CodingSystem, Value};

use super::apply;

#[test]
fn test_contains() {
    assert_eq!(
        apply(Function::StringContains, &[Value::string("hello world"), Value::string("o w")]),
        Value::Bool(true)
    );
    assert_eq!(
        apply(Function::StringContains, &[Value::string("hello"), Value::string("x")]),
        Value::Bool(false)
    );
}

#[test]
fn test_contains_on_code_uses_raw_value() {
    let code = Value::Code(Code::new(CodingSystem::Icd10, "E119"));
    assert_eq!(
        apply(Function::StringContains, &[code, Value::string("E11")]),
        Value::Bool(true)
    );
}

#[test]
fn test_contains_null() {
    assert_eq!(
        apply(Function::StringContains, &[Value::Null, Value::string("a")]),
        Value::Null
    );
}
