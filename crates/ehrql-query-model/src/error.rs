//! Construction-time validation errors

use ehrql_types::{CodingSystem, Type};
use thiserror::Error;

use crate::NodeId;

/// Result type for query model construction
pub type ModelResult<T> = Result<T, TypeValidationError>;

/// Raised when a node cannot be added to the query graph.
///
/// This is the only error the query model produces while a query is being
/// built. It is never recovered from locally: the expression being built is
/// invalid and the caller has to fix the query.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid {node}: {reason}")]
pub struct TypeValidationError {
    /// Kind of node that was being constructed
    pub node: &'static str,
    /// Why it was rejected
    pub reason: ValidationReason,
}

impl TypeValidationError {
    /// Create a validation error
    pub fn new(node: &'static str, reason: ValidationReason) -> Self {
        Self { node, reason }
    }
}

/// Why a node was rejected
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationReason {
    /// Two codes from different coding systems were compared
    #[error("cannot compare {left} codes with {right} codes")]
    CodingSystemMismatch {
        left: CodingSystem,
        right: CodingSystem,
    },

    /// A code was compared with a bare string
    #[error("cannot compare {system} codes with plain strings")]
    CodeComparedWithString { system: CodingSystem },

    /// Operand types do not agree
    #[error("expected {expected}, found {found}")]
    IncompatibleTypes { expected: String, found: String },

    /// Operand type is not accepted by the operator
    #[error("{operator} does not accept {found}")]
    UnsupportedType { operator: String, found: Type },

    /// Wrong number of arguments
    #[error("expected {expected} argument(s), found {found}")]
    WrongArity { expected: String, found: usize },

    /// A frame was required
    #[error("expected a frame")]
    NotAFrame,

    /// A series was required
    #[error("expected a series")]
    NotASeries,

    /// An event-level (many rows per patient) input was required
    #[error("expected an event-level frame or series")]
    ExpectedEventLevel,

    /// The column does not exist in the frame's schema
    #[error("no column {column:?} in table {table:?}")]
    MissingColumn { column: String, table: String },

    /// Operands come from different event frames
    #[error("cannot combine rows from {left:?} with rows from {right:?}")]
    DomainMismatch { left: String, right: String },

    /// Picking a row from a frame that was never sorted
    #[error("cannot pick a row before the rows are sorted")]
    PickWithoutSort,

    /// The table schema is malformed
    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    /// No table with this name is registered
    #[error("unknown table {name:?}")]
    UnknownTable { name: String },

    /// The dataset definition is malformed
    #[error("invalid dataset: {message}")]
    InvalidDataset { message: String },

    /// A node id does not belong to this graph
    #[error("unknown node {id}")]
    UnknownNode { id: NodeId },
}

impl ValidationReason {
    /// Create an incompatible types reason
    pub fn incompatible(expected: impl ToString, found: impl ToString) -> Self {
        Self::IncompatibleTypes {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Create an unsupported type reason
    pub fn unsupported(operator: impl Into<String>, found: &Type) -> Self {
        Self::UnsupportedType {
            operator: operator.into(),
            found: found.clone(),
        }
    }

    /// Create an invalid schema reason
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
        }
    }

    /// Create an invalid dataset reason
    pub fn invalid_dataset(message: impl Into<String>) -> Self {
        Self::InvalidDataset {
            message: message.into(),
        }
    }
}
