//! Operator integration tests
//!
//! These tests verify operator behavior including:
//! - Correct computation for each value type
//! - Null propagation
//! - Three-valued logic for logical operators
//! - Lifting over patient-level and event-level columns

pub mod aggregate;
pub mod arithmetic;
pub mod comparison;
pub mod datetime;
pub mod logical;
pub mod string;

use ehrql_eval::{EventColumn, Evaluated, Lineage, PatientColumn, Rows};
use ehrql_query_model::Function;
use ehrql_types::Value;

// ============================================================================
// Test Helpers
// ============================================================================

pub fn apply(op: Function, args: &[Value]) -> Value {
    ehrql_eval::operators::apply(op, args).expect("operator failed")
}

pub fn patient_column(default: Value, values: &[(i64, Value)]) -> Evaluated {
    let mut column = PatientColumn::new(default);
    for (patient, value) in values {
        column.insert(*patient, value.clone());
    }
    Evaluated::PatientColumn(column)
}

pub fn event_column(table: &str, values: &[(i64, &[(u64, Value)])]) -> Evaluated {
    let mut column = EventColumn::new(Lineage::new(table));
    for (patient, rows) in values {
        column.insert_rows(*patient, rows.iter().cloned().collect::<Rows>());
    }
    Evaluated::EventColumn(column)
}
