//! Common test utilities
//!
//! Shared fixtures for end-to-end tests:
//! - A table registry with patient, event and registration tables
//! - A database loaded with rows for those tables
//! - Helpers for reading evaluated patient columns

#![allow(dead_code)]

use ehrql::eval::{Evaluated, InputRow};
use ehrql::{
    Column, CodingSystem, InMemoryDatabase, InMemoryQueryEngine, NodeId, QueryGraph, Schema,
    TableKind, TableRegistry, Type, Value,
};

pub fn registry() -> TableRegistry {
    TableRegistry::new()
        .with_table(
            "patients",
            TableKind::Patient,
            Schema::new([
                Column::new("date_of_birth", Type::Date),
                Column::new("sex", Type::Str),
            ])
            .unwrap(),
        )
        .unwrap()
        .with_table(
            "clinical_events",
            TableKind::Event,
            Schema::new([
                Column::new("date", Type::Date),
                Column::new("snomedct_code", Type::Code(CodingSystem::SnomedCt)),
                Column::new("numeric_value", Type::Float),
            ])
            .unwrap(),
        )
        .unwrap()
        .with_table(
            "practice_registrations",
            TableKind::Event,
            Schema::new([
                Column::new("start_date", Type::Date),
                Column::new("end_date", Type::Date),
                Column::new("registration_id", Type::Int),
            ])
            .unwrap(),
        )
        .unwrap()
        .with_table(
            "measurements",
            TableKind::Event,
            Schema::new([Column::new("i1", Type::Int), Column::new("i2", Type::Int)]).unwrap(),
        )
        .unwrap()
}

/// A database holding `rows` for each named table of [`registry`]
pub fn database(tables: Vec<(&str, Vec<InputRow>)>) -> InMemoryDatabase {
    let registry = registry();
    let mut database = InMemoryDatabase::new();
    for (name, rows) in tables {
        database.add_table(&registry, name, rows).unwrap();
    }
    database
}

pub fn select(graph: &mut QueryGraph, table: &str) -> NodeId {
    graph.select_table_from(&registry(), table).unwrap()
}

/// Evaluate `id` and read the value of each of `patients`
pub fn evaluate_for(
    database: &InMemoryDatabase,
    graph: &QueryGraph,
    id: NodeId,
    patients: &[i64],
) -> Vec<Value> {
    let result = InMemoryQueryEngine::new(database).evaluate(graph, id).unwrap();
    let Evaluated::PatientColumn(column) = result else {
        panic!("expected a patient column, got {}", result.shape());
    };
    patients.iter().map(|p| column.get(*p).clone()).collect()
}
