//! Date operators
//!
//! Implements: YearFromDate, MonthFromDate, DayFromDate,
//! DateDifferenceInYears/Months/Days, DateAddYears/Months/Days,
//! ToFirstOfYear, ToFirstOfMonth
//!
//! Calendar rules live in [`ehrql_types::dates`]; results outside the
//! supported range are null.

use chrono::{Datelike, NaiveDate};
use ehrql_types::{Value, dates};

use crate::error::{EvalError, EvalResult};

pub fn year_from_date(value: &Value) -> EvalResult<Value> {
    Ok(Value::Int(i64::from(date(value)?.year())))
}

pub fn month_from_date(value: &Value) -> EvalResult<Value> {
    Ok(Value::Int(i64::from(date(value)?.month())))
}

pub fn day_from_date(value: &Value) -> EvalResult<Value> {
    Ok(Value::Int(i64::from(date(value)?.day())))
}

pub fn difference_in_years(end: &Value, start: &Value) -> EvalResult<Value> {
    Ok(Value::Int(dates::years_between(date(end)?, date(start)?)))
}

pub fn difference_in_months(end: &Value, start: &Value) -> EvalResult<Value> {
    Ok(Value::Int(dates::months_between(date(end)?, date(start)?)))
}

pub fn difference_in_days(end: &Value, start: &Value) -> EvalResult<Value> {
    Ok(Value::Int(dates::days_between(date(end)?, date(start)?)))
}

pub fn add_years(value: &Value, amount: &Value) -> EvalResult<Value> {
    shift(value, amount, dates::add_years)
}

pub fn add_months(value: &Value, amount: &Value) -> EvalResult<Value> {
    shift(value, amount, dates::add_months)
}

pub fn add_days(value: &Value, amount: &Value) -> EvalResult<Value> {
    shift(value, amount, dates::add_days)
}

pub fn to_first_of_year(value: &Value) -> EvalResult<Value> {
    Ok(Value::Date(dates::to_first_of_year(date(value)?)))
}

pub fn to_first_of_month(value: &Value) -> EvalResult<Value> {
    Ok(Value::Date(dates::to_first_of_month(date(value)?)))
}

fn shift(
    value: &Value,
    amount: &Value,
    f: fn(NaiveDate, i64) -> Option<NaiveDate>,
) -> EvalResult<Value> {
    let amount = amount
        .as_int()
        .ok_or_else(|| EvalError::type_mismatch("int", amount.type_name()))?;
    Ok(f(date(value)?, amount).map_or(Value::Null, Value::Date))
}

fn date(value: &Value) -> EvalResult<NaiveDate> {
    value
        .as_date()
        .ok_or_else(|| EvalError::type_mismatch("date", value.type_name()))
}
