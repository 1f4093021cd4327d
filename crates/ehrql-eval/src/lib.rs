//! ehrQL in-memory engine
//!
//! This crate evaluates query graphs built with `ehrql-query-model` against
//! patient data held in memory. It defines the reference semantics:
//!
//! - **Columns**: patient-level columns with a default, event-level columns
//!   tied to the rows of one table
//! - **Database**: tables loaded from rows and checked against their schema
//!   and column constraints
//! - **Operators**: value-level implementations of every function in the
//!   query model, lifted over columns
//! - **Engine**: memoized evaluation of nodes and whole datasets
//!
//! # Example
//!
//! ```ignore
//! use ehrql_eval::{InMemoryDatabase, InMemoryQueryEngine};
//!
//! let mut database = InMemoryDatabase::new();
//! database.add_patient_table("patients", &schema, rows)?;
//!
//! let engine = InMemoryQueryEngine::new(&database);
//! let rows = engine.get_results(&graph, &dataset)?;
//! ```
//!
//! # Three-Valued Logic
//!
//! Boolean operators follow SQL semantics:
//!
//! - `And`: false dominates (null and false = false)
//! - `Or`: true dominates (null or true = true)
//! - `Filter` keeps only rows whose condition is exactly true

pub mod columns;
pub mod context;
pub mod database;
pub mod engine;
pub mod error;
pub mod operators;

pub use columns::{
    EventColumn, EventTable, Evaluated, Lineage, PatientColumn, PatientTable, Rows,
    apply_rowwise,
};
pub use context::EvaluationContext;
pub use database::{InMemoryDatabase, InputRow, PatientId, RowId};
pub use engine::{InMemoryQueryEngine, ResultRow};
pub use error::{EvalError, EvalResult};
pub use operators::apply_function;
