//! Evaluation errors for the in-memory engine

use ehrql_types::{Type, Value};
use thiserror::Error;

use crate::database::PatientId;

/// Result type for evaluation operations
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors that can occur while loading data or evaluating a query.
///
/// Nulls are values, never errors: a missing patient or an undefined
/// arithmetic result evaluates to `Value::Null`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    /// The query selects a table the database does not hold
    #[error("Unknown table: {name}")]
    UnknownTable { name: String },

    /// Stored data does not have the shape the query or schema expects
    #[error("Schema mismatch in table {table}: {message}")]
    SchemaMismatch { table: String, message: String },

    /// A stored value breaks a column constraint
    #[error("Constraint violation in {table}.{column}: {message}")]
    ConstraintViolation {
        table: String,
        column: String,
        message: String,
    },

    /// More than one row for a patient in a patient-level table
    #[error("Duplicate patient {patient_id} in patient table {table}")]
    DuplicatePatient { table: String, patient_id: PatientId },

    /// Event-level inputs come from different tables
    #[error("Cannot combine rows of {left} with rows of {right}")]
    LineageMismatch { left: String, right: String },

    /// No value was supplied for a parameter
    #[error("Unbound parameter: {name}")]
    UnboundParameter { name: String },

    /// Type mismatch error
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// Arithmetic overflow
    #[error("Arithmetic overflow in {operation}")]
    Overflow { operation: String },

    /// Internal error (should not happen for validated graphs)
    #[error("Internal evaluation error: {message}")]
    Internal { message: String },
}

impl EvalError {
    /// Create a schema mismatch error
    pub fn schema_mismatch(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a constraint violation error
    pub fn constraint_violation(
        table: impl Into<String>,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ConstraintViolation {
            table: table.into(),
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a type mismatch error for a value that does not fit a type
    pub fn value_mismatch(expected: &Type, found: &Value) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            found: found.type_name(),
        }
    }

    /// Create an overflow error
    pub fn overflow(operation: impl Into<String>) -> Self {
        Self::Overflow {
            operation: operation.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
