//! Aggregate functions
//!
//! Implements: Sum, Mean, Min, Max, CountDistinct, CombineAsSet
//!
//! Each function receives only the non-null values of one patient, and at
//! least one of them; empty inputs are handled by the caller's default.

use ehrql_query_model::AggregateKind;
use ehrql_types::{Decimal, Value};
use std::collections::BTreeSet;

use crate::error::{EvalError, EvalResult};

/// Reduce one patient's non-null values
pub fn aggregate(kind: AggregateKind, values: &[&Value]) -> EvalResult<Value> {
    match kind {
        AggregateKind::Sum => sum(values),
        AggregateKind::Mean => mean(values),
        AggregateKind::Min => Ok(values.iter().min().map_or(Value::Null, |v| (*v).clone())),
        AggregateKind::Max => Ok(values.iter().max().map_or(Value::Null, |v| (*v).clone())),
        AggregateKind::CountDistinct => Ok(Value::Int(distinct(values).len() as i64)),
        AggregateKind::CombineAsSet => Ok(Value::Set(
            distinct(values).into_iter().cloned().collect(),
        )),
        AggregateKind::Exists | AggregateKind::Count => Err(EvalError::internal(format!(
            "{kind:?} counts rows, not values"
        ))),
    }
}

pub fn sum(values: &[&Value]) -> EvalResult<Value> {
    match values.first() {
        Some(Value::Int(_)) => values
            .iter()
            .try_fold(0i64, |total, v| total.checked_add(v.as_int()?))
            .map(Value::Int)
            .ok_or_else(|| EvalError::overflow("Sum")),
        Some(Value::Float(_)) => floats(values)?
            .into_iter()
            .try_fold(Decimal::ZERO, Decimal::checked_add)
            .map(Value::Float)
            .ok_or_else(|| EvalError::overflow("Sum")),
        Some(other) => Err(EvalError::type_mismatch("number", other.type_name())),
        None => Ok(Value::Null),
    }
}

/// Arithmetic mean, always a float
pub fn mean(values: &[&Value]) -> EvalResult<Value> {
    if values.is_empty() {
        return Ok(Value::Null);
    }
    let total = floats(values)?
        .into_iter()
        .try_fold(Decimal::ZERO, Decimal::checked_add)
        .ok_or_else(|| EvalError::overflow("Mean"))?;
    total
        .checked_div(Decimal::from(values.len()))
        .map(Value::Float)
        .ok_or_else(|| EvalError::overflow("Mean"))
}

fn floats(values: &[&Value]) -> EvalResult<Vec<Decimal>> {
    values
        .iter()
        .map(|v| {
            v.as_float()
                .ok_or_else(|| EvalError::type_mismatch("number", v.type_name()))
        })
        .collect()
}

fn distinct<'a>(values: &[&'a Value]) -> BTreeSet<&'a Value> {
    values.iter().copied().collect()
}
