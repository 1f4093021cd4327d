//! Arithmetic operators
//!
//! Implements: Negate, Add, Subtract, Multiply, TrueDivide, FloorDivide,
//! CastToInt, CastToFloat
//!
//! Both operands of a binary operator share one numeric type. Division by
//! zero is null rather than an error.

use ehrql_types::{Decimal, Value};
use rust_decimal::prelude::ToPrimitive;

use crate::error::{EvalError, EvalResult};

// =========================================================================
// Unary
// =========================================================================

pub fn negate(value: &Value) -> EvalResult<Value> {
    match value {
        Value::Int(i) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| EvalError::overflow("Negate")),
        Value::Float(f) => Ok(Value::Float(-f)),
        other => Err(EvalError::type_mismatch("number", other.type_name())),
    }
}

/// Truncate towards zero
pub fn cast_to_int(value: &Value) -> EvalResult<Value> {
    match value {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Float(f) => f
            .trunc()
            .to_i64()
            .map(Value::Int)
            .ok_or_else(|| EvalError::overflow("CastToInt")),
        other => Err(EvalError::type_mismatch("number", other.type_name())),
    }
}

pub fn cast_to_float(value: &Value) -> EvalResult<Value> {
    value
        .as_float()
        .map(Value::Float)
        .ok_or_else(|| EvalError::type_mismatch("number", value.type_name()))
}

// =========================================================================
// Binary
// =========================================================================

pub fn add(left: &Value, right: &Value) -> EvalResult<Value> {
    numeric("Add", left, right, i64::checked_add, Decimal::checked_add)
}

pub fn subtract(left: &Value, right: &Value) -> EvalResult<Value> {
    numeric("Subtract", left, right, i64::checked_sub, Decimal::checked_sub)
}

pub fn multiply(left: &Value, right: &Value) -> EvalResult<Value> {
    numeric("Multiply", left, right, i64::checked_mul, Decimal::checked_mul)
}

/// Exact division; always a float
pub fn true_divide(left: &Value, right: &Value) -> EvalResult<Value> {
    let (a, b) = floats(left, right)?;
    if b.is_zero() {
        return Ok(Value::Null);
    }
    a.checked_div(b)
        .map(Value::Float)
        .ok_or_else(|| EvalError::overflow("TrueDivide"))
}

/// Division rounded towards negative infinity; always an int
pub fn floor_divide(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Int(_), Value::Int(0)) => Ok(Value::Null),
        (Value::Int(a), Value::Int(b)) => {
            let quotient = a.checked_div(*b).ok_or_else(|| EvalError::overflow("FloorDivide"))?;
            let inexact = a % b != 0;
            Ok(Value::Int(if inexact && ((*a < 0) != (*b < 0)) {
                quotient - 1
            } else {
                quotient
            }))
        }
        _ => {
            let (a, b) = floats(left, right)?;
            if b.is_zero() {
                return Ok(Value::Null);
            }
            a.checked_div(b)
                .and_then(|q| q.floor().to_i64())
                .map(Value::Int)
                .ok_or_else(|| EvalError::overflow("FloorDivide"))
        }
    }
}

fn numeric(
    operation: &str,
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(Decimal, Decimal) -> Option<Decimal>,
) -> EvalResult<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int_op(*a, *b)
            .map(Value::Int)
            .ok_or_else(|| EvalError::overflow(operation)),
        (Value::Float(a), Value::Float(b)) => float_op(*a, *b)
            .map(Value::Float)
            .ok_or_else(|| EvalError::overflow(operation)),
        _ => Err(EvalError::type_mismatch(
            left.type_name(),
            right.type_name(),
        )),
    }
}

fn floats(left: &Value, right: &Value) -> EvalResult<(Decimal, Decimal)> {
    match (left.as_float(), right.as_float()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(EvalError::type_mismatch("number", format!("{} and {}", left.type_name(), right.type_name()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(7, 2, 3)]
    #[case(-7, 2, -4)]
    #[case(7, -2, -4)]
    #[case(-7, -2, 3)]
    #[case(6, 3, 2)]
    fn test_floor_divide_ints(#[case] a: i64, #[case] b: i64, #[case] expected: i64) {
        assert_eq!(floor_divide(&Value::Int(a), &Value::Int(b)).unwrap(), Value::Int(expected));
    }

    #[test]
    fn test_division_by_zero_is_null() {
        assert_eq!(true_divide(&Value::Int(1), &Value::Int(0)).unwrap(), Value::Null);
        assert_eq!(floor_divide(&Value::Int(1), &Value::Int(0)).unwrap(), Value::Null);
        assert_eq!(
            floor_divide(&Value::Float(Decimal::ONE), &Value::Float(Decimal::ZERO)).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_cast_to_int_truncates() {
        assert_eq!(cast_to_int(&Value::Float(Decimal::new(-25, 1))).unwrap(), Value::Int(-2));
        assert_eq!(cast_to_int(&Value::Float(Decimal::new(25, 1))).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_overflow() {
        assert!(add(&Value::Int(i64::MAX), &Value::Int(1)).is_err());
    }
}
