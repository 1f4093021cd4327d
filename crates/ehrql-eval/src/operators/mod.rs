//! Operator implementations
//!
//! Operators work on single values. [`apply_function`] lifts them over
//! columns: row by row for event-level arguments, patient by patient
//! otherwise.
//!
//! Null handling is per operator:
//! - most operators return null if any argument is null;
//! - `And` and `Or` follow three-valued logic;
//! - `IsNull` is never null;
//! - `MaximumOf` and `MinimumOf` ignore null arguments;
//! - division by zero and dates outside the supported range are null.

pub mod aggregate;
pub mod arithmetic;
pub mod comparison;
pub mod datetime;
pub mod logical;
pub mod string;

use ehrql_query_model::Function;
use ehrql_types::Value;

use crate::columns::{Evaluated, apply_rowwise};
use crate::error::{EvalError, EvalResult};

/// Apply `op` to columns
pub fn apply_function(op: Function, args: &[&Evaluated]) -> EvalResult<Evaluated> {
    apply_rowwise(args, |values| apply(op, values))
}

/// Apply `op` to single values
pub fn apply(op: Function, args: &[Value]) -> EvalResult<Value> {
    use Function::*;

    match op {
        And => binary(op, args, logical::and),
        Or => binary(op, args, logical::or),
        IsNull => unary(op, args, |v| Ok(logical::is_null(v))),
        MaximumOf => Ok(comparison::maximum_of(args)),
        MinimumOf => Ok(comparison::minimum_of(args)),
        _ if args.iter().any(Value::is_null) => Ok(Value::Null),
        Not => unary(op, args, logical::not),
        Eq => binary(op, args, |a, b| Ok(comparison::eq(a, b))),
        Ne => binary(op, args, |a, b| Ok(comparison::ne(a, b))),
        Lt => binary(op, args, |a, b| Ok(comparison::lt(a, b))),
        Le => binary(op, args, |a, b| Ok(comparison::le(a, b))),
        Gt => binary(op, args, |a, b| Ok(comparison::gt(a, b))),
        Ge => binary(op, args, |a, b| Ok(comparison::ge(a, b))),
        In => binary(op, args, comparison::in_set),
        Negate => unary(op, args, arithmetic::negate),
        Add => binary(op, args, arithmetic::add),
        Subtract => binary(op, args, arithmetic::subtract),
        Multiply => binary(op, args, arithmetic::multiply),
        TrueDivide => binary(op, args, arithmetic::true_divide),
        FloorDivide => binary(op, args, arithmetic::floor_divide),
        CastToInt => unary(op, args, arithmetic::cast_to_int),
        CastToFloat => unary(op, args, arithmetic::cast_to_float),
        StringContains => binary(op, args, string::contains),
        YearFromDate => unary(op, args, datetime::year_from_date),
        MonthFromDate => unary(op, args, datetime::month_from_date),
        DayFromDate => unary(op, args, datetime::day_from_date),
        DateDifferenceInYears => binary(op, args, datetime::difference_in_years),
        DateDifferenceInMonths => binary(op, args, datetime::difference_in_months),
        DateDifferenceInDays => binary(op, args, datetime::difference_in_days),
        DateAddYears => binary(op, args, datetime::add_years),
        DateAddMonths => binary(op, args, datetime::add_months),
        DateAddDays => binary(op, args, datetime::add_days),
        ToFirstOfYear => unary(op, args, datetime::to_first_of_year),
        ToFirstOfMonth => unary(op, args, datetime::to_first_of_month),
    }
}

fn unary(
    op: Function,
    args: &[Value],
    f: impl FnOnce(&Value) -> EvalResult<Value>,
) -> EvalResult<Value> {
    match args {
        [arg] => f(arg),
        _ => Err(arity(op, 1, args.len())),
    }
}

fn binary(
    op: Function,
    args: &[Value],
    f: impl FnOnce(&Value, &Value) -> EvalResult<Value>,
) -> EvalResult<Value> {
    match args {
        [lhs, rhs] => f(lhs, rhs),
        _ => Err(arity(op, 2, args.len())),
    }
}

fn arity(op: Function, expected: usize, found: usize) -> EvalError {
    EvalError::internal(format!("{op} takes {expected} argument(s), got {found}"))
}
