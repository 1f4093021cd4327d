//! Logical Operator Tests
//!
//! Tests for: And, Or, Not, IsNull
//! And/Or implement SQL three-valued logic

use ehrql_query_model::Function;
use ehrql_types::Value;
use rstest::rstest;

use super::apply;

const T: Value = Value::Bool(true);
const F: Value = Value::Bool(false);
const N: Value = Value::Null;

// ============================================================================
// And / Or - Three-Valued Logic
// ============================================================================

#[rstest]
#[case(T, T, T)]
#[case(T, F, F)]
#[case(T, N, N)]
#[case(F, T, F)]
#[case(F, F, F)]
#[case(F, N, F)]
#[case(N, T, N)]
#[case(N, F, F)]
#[case(N, N, N)]
fn test_and_truth_table(#[case] a: Value, #[case] b: Value, #[case] expected: Value) {
    assert_eq!(apply(Function::And, &[a, b]), expected);
}

#[rstest]
#[case(T, T, T)]
#[case(T, F, T)]
#[case(T, N, T)]
#[case(F, T, T)]
#[case(F, F, F)]
#[case(F, N, N)]
#[case(N, T, T)]
#[case(N, F, N)]
#[case(N, N, N)]
fn test_or_truth_table(#[case] a: Value, #[case] b: Value, #[case] expected: Value) {
    assert_eq!(apply(Function::Or, &[a, b]), expected);
}

// ============================================================================
// Not / IsNull
// ============================================================================

#[rstest]
#[case(T, F)]
#[case(F, T)]
#[case(N, N)]
fn test_not(#[case] a: Value, #[case] expected: Value) {
    assert_eq!(apply(Function::Not, &[a]), expected);
}

#[rstest]
#[case(N, T)]
#[case(F, F)]
#[case(Value::Int(0), F)]
fn test_is_null_is_never_null(#[case] a: Value, #[case] expected: Value) {
    assert_eq!(apply(Function::IsNull, &[a]), expected);
}
