//! Comparison operators
//!
//! Implements: Eq, Ne, Lt, Le, Gt, Ge, In, MaximumOf, MinimumOf
//!
//! Operand types are checked when the query is built, so two operands of a
//! comparison always hold the same variant and compare by value. Code
//! equality includes the coding system.

use ehrql_types::Value;
use std::cmp::Ordering;

use crate::error::{EvalError, EvalResult};

pub fn eq(left: &Value, right: &Value) -> Value {
    Value::Bool(left == right)
}

pub fn ne(left: &Value, right: &Value) -> Value {
    Value::Bool(left != right)
}

pub fn lt(left: &Value, right: &Value) -> Value {
    Value::Bool(left.cmp(right) == Ordering::Less)
}

pub fn le(left: &Value, right: &Value) -> Value {
    Value::Bool(left.cmp(right) != Ordering::Greater)
}

pub fn gt(left: &Value, right: &Value) -> Value {
    Value::Bool(left.cmp(right) == Ordering::Greater)
}

pub fn ge(left: &Value, right: &Value) -> Value {
    Value::Bool(left.cmp(right) != Ordering::Less)
}

/// Set membership
pub fn in_set(item: &Value, set: &Value) -> EvalResult<Value> {
    match set.as_set() {
        Some(items) => Ok(Value::Bool(items.contains(item))),
        None => Err(EvalError::type_mismatch("set", set.type_name())),
    }
}

/// Largest non-null argument; null only if all are null
pub fn maximum_of(args: &[Value]) -> Value {
    args.iter().filter(|v| !v.is_null()).max().cloned().unwrap_or(Value::Null)
}

/// Smallest non-null argument; null only if all are null
pub fn minimum_of(args: &[Value]) -> Value {
    args.iter().filter(|v| !v.is_null()).min().cloned().unwrap_or(Value::Null)
}
