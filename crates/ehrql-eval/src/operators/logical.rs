//! Logical operators
//!
//! Implements: And, Or, Not, IsNull
//! `And` and `Or` implement SQL three-valued logic.

use ehrql_types::Value;

use crate::error::{EvalError, EvalResult};

/// And with three-valued logic
///
/// Truth table:
/// | A     | B     | A and B |
/// |-------|-------|---------|
/// | true  | true  | true    |
/// | true  | false | false   |
/// | true  | null  | null    |
/// | false | true  | false   |
/// | false | false | false   |
/// | false | null  | false   |
/// | null  | true  | null    |
/// | null  | false | false   |
/// | null  | null  | null    |
pub fn and(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        // If either is false, result is false
        (Value::Bool(false), _) | (_, Value::Bool(false)) => Ok(Value::Bool(false)),
        (Value::Bool(true), Value::Bool(true)) => Ok(Value::Bool(true)),
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        _ => Err(EvalError::type_mismatch("bool", left.type_name())),
    }
}

/// Or with three-valued logic
///
/// Truth table:
/// | A     | B     | A or B  |
/// |-------|-------|---------|
/// | true  | true  | true    |
/// | true  | false | true    |
/// | true  | null  | true    |
/// | false | true  | true    |
/// | false | false | false   |
/// | false | null  | null    |
/// | null  | true  | true    |
/// | null  | false | null    |
/// | null  | null  | null    |
pub fn or(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        // If either is true, result is true
        (Value::Bool(true), _) | (_, Value::Bool(true)) => Ok(Value::Bool(true)),
        (Value::Bool(false), Value::Bool(false)) => Ok(Value::Bool(false)),
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        _ => Err(EvalError::type_mismatch("bool", left.type_name())),
    }
}

/// Not; null stays null
pub fn not(value: &Value) -> EvalResult<Value> {
    match value {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        Value::Null => Ok(Value::Null),
        other => Err(EvalError::type_mismatch("bool", other.type_name())),
    }
}

/// IsNull; never null itself
pub fn is_null(value: &Value) -> Value {
    Value::Bool(value.is_null())
}
