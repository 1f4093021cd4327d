//! Query model node definitions
//!
//! Nodes are plain data. Children are referenced by [`NodeId`], an index
//! into the [`QueryGraph`](crate::QueryGraph) arena that owns them, so two
//! structurally equal nodes hash and compare equal and collapse to the same
//! id when inserted.

use ehrql_types::{Type, Value};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::schema::Schema;

// ============================================================================
// Node Identity
// ============================================================================

/// Index of a node in its [`QueryGraph`](crate::QueryGraph)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Position of the node in insertion order
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Argument list of a function node
pub type Args = SmallVec<[NodeId; 2]>;

// ============================================================================
// Nodes
// ============================================================================

/// A query model node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    /// Event-level table: zero or more rows per patient
    SelectTable { name: String, schema: Schema },
    /// Patient-level table: at most one row per patient
    SelectPatientTable { name: String, schema: Schema },
    /// One column of a frame
    SelectColumn { source: NodeId, name: String },
    /// Literal value, broadcast to every patient
    Value { value: Value, ty: Type },
    /// Placeholder bound at evaluation time
    Parameter { name: String, ty: Type },
    /// Operator application
    Function { op: Function, args: Args },
    /// First matching `(condition, value)` pair wins
    Case {
        cases: Vec<(NodeId, NodeId)>,
        default: Option<NodeId>,
    },
    /// Rows for which `condition` is true
    Filter { source: NodeId, condition: NodeId },
    /// Rows stably reordered by `sort_by`, ascending, nulls last
    Sort { source: NodeId, sort_by: NodeId },
    /// First or last row per patient of a sorted source
    PickOneRow { source: NodeId, position: Position },
    /// Per-patient reduction of an event-level source
    Aggregate { kind: AggregateKind, source: NodeId },
}

impl Node {
    /// Variant name, used in errors and serialization
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SelectTable { .. } => "SelectTable",
            Self::SelectPatientTable { .. } => "SelectPatientTable",
            Self::SelectColumn { .. } => "SelectColumn",
            Self::Value { .. } => "Value",
            Self::Parameter { .. } => "Parameter",
            Self::Function { .. } => "Function",
            Self::Case { .. } => "Case",
            Self::Filter { .. } => "Filter",
            Self::Sort { .. } => "Sort",
            Self::PickOneRow { .. } => "PickOneRow",
            Self::Aggregate { .. } => "Aggregate",
        }
    }

    /// Direct children, in field order
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Self::SelectTable { .. }
            | Self::SelectPatientTable { .. }
            | Self::Value { .. }
            | Self::Parameter { .. } => Vec::new(),
            Self::SelectColumn { source, .. }
            | Self::PickOneRow { source, .. }
            | Self::Aggregate { source, .. } => vec![*source],
            Self::Function { args, .. } => args.to_vec(),
            Self::Case { cases, default } => cases
                .iter()
                .flat_map(|(condition, value)| [*condition, *value])
                .chain(*default)
                .collect(),
            Self::Filter { source, condition } => vec![*source, *condition],
            Self::Sort { source, sort_by } => vec![*source, *sort_by],
        }
    }
}

/// Which end of a sorted source to pick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    First,
    Last,
}

/// Per-patient aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateKind {
    /// Any row present; false when none
    Exists,
    /// Number of rows; 0 when none
    Count,
    Sum,
    Mean,
    Min,
    Max,
    /// Number of distinct non-null values; 0 when none
    CountDistinct,
    /// Distinct non-null values; the empty set when none
    CombineAsSet,
}

impl AggregateKind {
    /// Value for a patient with no rows
    pub fn default_value(self, ty: &Type) -> Value {
        match self {
            Self::Exists => Value::Bool(false),
            Self::Count | Self::CountDistinct => Value::Int(0),
            Self::CombineAsSet if matches!(ty, Type::Set(_)) => Value::Set(Default::default()),
            _ => Value::Null,
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Operators available to [`Node::Function`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Function {
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And,
    Or,
    Not,
    IsNull,

    // Arithmetic
    Negate,
    Add,
    Subtract,
    Multiply,
    TrueDivide,
    FloorDivide,
    CastToInt,
    CastToFloat,

    // Strings and sets
    StringContains,
    In,

    // Dates
    YearFromDate,
    MonthFromDate,
    DayFromDate,
    DateDifferenceInYears,
    DateDifferenceInMonths,
    DateDifferenceInDays,
    DateAddYears,
    DateAddMonths,
    DateAddDays,
    ToFirstOfYear,
    ToFirstOfMonth,

    // Row-wise extremes
    MaximumOf,
    MinimumOf,
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Shape of a node's result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// One row per patient
    PatientFrame,
    /// Zero or more rows per patient
    EventFrame,
    /// One value per patient
    PatientSeries,
    /// Zero or more values per patient, tied to rows
    EventSeries,
}

impl NodeKind {
    pub const fn is_frame(self) -> bool {
        matches!(self, Self::PatientFrame | Self::EventFrame)
    }

    pub const fn is_series(self) -> bool {
        !self.is_frame()
    }

    pub const fn is_event_level(self) -> bool {
        matches!(self, Self::EventFrame | Self::EventSeries)
    }

    pub const fn is_patient_level(self) -> bool {
        !self.is_event_level()
    }
}

/// Row identity a node's values are attached to.
///
/// Patient-level nodes share one domain. Event-level nodes carry the
/// event table they were selected from; filtering and sorting keep it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Patient,
    Event(NodeId),
}

impl Domain {
    /// Domain of an expression over both operands, or the two
    /// conflicting event tables
    pub fn combine(self, other: Domain) -> Result<Domain, (NodeId, NodeId)> {
        match (self, other) {
            (Self::Patient, d) | (d, Self::Patient) => Ok(d),
            (Self::Event(a), Self::Event(b)) if a == b => Ok(self),
            (Self::Event(a), Self::Event(b)) => Err((a, b)),
        }
    }
}

/// Metadata computed when a node is inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMeta {
    /// Frame or series, patient or event level
    pub kind: NodeKind,
    /// Value type; `None` for frames
    pub ty: Option<Type>,
    /// Row identity
    pub domain: Domain,
}
