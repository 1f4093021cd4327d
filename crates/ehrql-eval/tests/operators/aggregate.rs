//! Aggregate Function Tests
//!
//! Tests for: Sum, Mean, Min, Max, CountDistinct, CombineAsSet over event
//! columns, including patients with no rows

use ehrql_eval::operators::aggregate::aggregate;
use ehrql_query_model::AggregateKind;
use ehrql_types::{Type, Value};
use pretty_assertions::assert_eq;

use super::event_column;

fn run(kind: AggregateKind, ty: &Type) -> ehrql_eval::PatientColumn {
    let column = event_column(
        "events",
        &[
            (1, &[(10, Value::Int(3)), (11, Value::Null), (12, Value::Int(5))]),
            (2, &[(20, Value::Null)]),
        ],
    );
    column
        .as_event_column()
        .unwrap()
        .aggregate_values(|values| aggregate(kind, values), kind.default_value(ty))
        .unwrap()
}

#[test]
fn test_sum_ignores_nulls() {
    let result = run(AggregateKind::Sum, &Type::Int);
    assert_eq!(result.get(1), &Value::Int(8));
    assert_eq!(result.get(2), &Value::Null);
    assert_eq!(result.get(3), &Value::Null);
}

#[test]
fn test_min_max() {
    assert_eq!(run(AggregateKind::Min, &Type::Int).get(1), &Value::Int(3));
    assert_eq!(run(AggregateKind::Max, &Type::Int).get(1), &Value::Int(5));
}

#[test]
fn test_count_distinct_defaults_to_zero() {
    let result = run(AggregateKind::CountDistinct, &Type::Int);
    assert_eq!(result.get(1), &Value::Int(2));
    assert_eq!(result.get(2), &Value::Int(0));
    assert_eq!(result.get(3), &Value::Int(0));
}

#[test]
fn test_combine_as_set_defaults_to_empty() {
    let result = run(AggregateKind::CombineAsSet, &Type::set_of(Type::Int));
    assert_eq!(result.get(1), &Value::set([Value::Int(3), Value::Int(5)]));
    assert_eq!(result.get(3), &Value::Set(Default::default()));
}
