//! Date Operator Tests
//!
//! Tests for: YearFromDate, MonthFromDate, DayFromDate, DateDifferenceIn*,
//! DateAdd*, ToFirstOfYear, ToFirstOfMonth

use ehrql_query_model::Function;
use ehrql_types::Value;
use rstest::rstest;

use super::apply;

#[test]
fn test_date_parts() {
    let date = Value::date(2021, 3, 14);
    assert_eq!(apply(Function::YearFromDate, &[date.clone()]), Value::Int(2021));
    assert_eq!(apply(Function::MonthFromDate, &[date.clone()]), Value::Int(3));
    assert_eq!(apply(Function::DayFromDate, &[date]), Value::Int(14));
}

#[rstest]
#[case(Value::date(2020, 2, 29), Value::date(2000, 2, 29), 20)]
#[case(Value::date(2021, 2, 28), Value::date(2000, 2, 29), 20)]
#[case(Value::date(2021, 3, 1), Value::date(2000, 2, 29), 21)]
#[case(Value::date(1999, 1, 1), Value::date(2000, 1, 1), -1)]
fn test_difference_in_years(#[case] end: Value, #[case] start: Value, #[case] expected: i64) {
    assert_eq!(
        apply(Function::DateDifferenceInYears, &[end, start]),
        Value::Int(expected)
    );
}

#[test]
fn test_difference_in_days() {
    assert_eq!(
        apply(
            Function::DateDifferenceInDays,
            &[Value::date(2020, 3, 1), Value::date(2020, 2, 1)]
        ),
        Value::Int(29)
    );
}

#[test]
fn test_add_rolls_forward() {
    assert_eq!(
        apply(Function::DateAddYears, &[Value::date(2000, 2, 29), Value::Int(1)]),
        Value::date(2001, 3, 1)
    );
    assert_eq!(
        apply(Function::DateAddMonths, &[Value::date(2021, 1, 31), Value::Int(1)]),
        Value::date(2021, 3, 1)
    );
    assert_eq!(
        apply(Function::DateAddDays, &[Value::date(2021, 12, 31), Value::Int(1)]),
        Value::date(2022, 1, 1)
    );
}

#[test]
fn test_add_out_of_range_is_null() {
    assert_eq!(
        apply(Function::DateAddYears, &[Value::date(9999, 1, 1), Value::Int(1)]),
        Value::Null
    );
}

#[test]
fn test_to_first_of() {
    let date = Value::date(2021, 7, 19);
    assert_eq!(apply(Function::ToFirstOfYear, &[date.clone()]), Value::date(2021, 1, 1));
    assert_eq!(apply(Function::ToFirstOfMonth, &[date]), Value::date(2021, 7, 1));
}
