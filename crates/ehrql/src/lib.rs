//! Typed query model and reference engine for electronic health records
//!
//! This crate ties together:
//! - Values, coding systems and date arithmetic (`types`)
//! - The query graph, schemas and datasets (`model`)
//! - The in-memory reference engine (`eval`)
//!
//! # Example
//!
//! ```ignore
//! use ehrql::{Dataset, InMemoryDatabase, InMemoryQueryEngine, QueryGraph};
//!
//! let mut graph = QueryGraph::new();
//! let events = graph.select_table("clinical_events", schema)?;
//! let has_events = graph.exists_for_patient(events)?;
//! let count = graph.count_for_patient(events)?;
//!
//! let dataset = Dataset::new(&graph, has_events)?
//!     .with_variable(&graph, "event_count", count)?;
//!
//! let rows = InMemoryQueryEngine::new(&database).get_results(&graph, &dataset)?;
//! ```

// Re-export all public APIs from internal crates
pub use ehrql_eval as eval;
pub use ehrql_query_model as model;
pub use ehrql_types as types;

// Convenience re-exports
pub use ehrql_eval::{
    EvalError, EvalResult, EvaluationContext, InMemoryDatabase, InMemoryQueryEngine, ResultRow,
};
pub use ehrql_query_model::{
    Column, Constraint, Dataset, Function, NodeId, QueryGraph, Schema, TableKind, TableRegistry,
    TypeValidationError, ValidationReason,
};
pub use ehrql_types::{Code, Codelist, CodingSystem, Type, Value};
