//! ehrQL semantic types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::CodingSystem;

/// The semantic type of a column, literal or series.
///
/// Code types are nominal: `Code(SnomedCt)` and `Code(Ctv3)` are different
/// types and nothing converts between them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "of")]
pub enum Type {
    /// Boolean
    Bool,
    /// 64-bit signed integer
    Int,
    /// Exact decimal standing in for a float
    Float,
    /// Unicode string
    Str,
    /// Calendar date
    Date,
    /// Clinical code from one coding system
    Code(CodingSystem),
    /// Set of values of one element type
    Set(Box<Type>),
}

impl Type {
    /// Create a set type
    pub fn set_of(element: Type) -> Self {
        Self::Set(Box::new(element))
    }

    /// Check if this type is numeric
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// Check if this type supports `<`, `<=`, `>` and `>=`
    pub const fn is_orderable(&self) -> bool {
        matches!(self, Self::Int | Self::Float | Self::Str | Self::Date)
    }

    /// Check if this type is a scalar (anything but a set)
    pub const fn is_scalar(&self) -> bool {
        !matches!(self, Self::Set(_))
    }

    /// Element type of a set type
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Self::Set(element) => Some(element),
            _ => None,
        }
    }

    /// Coding system of a code type
    pub const fn coding_system(&self) -> Option<CodingSystem> {
        match self {
            Self::Code(system) => Some(*system),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Str => write!(f, "str"),
            Self::Date => write!(f, "date"),
            Self::Code(system) => write!(f, "{}Code", system.short_name()),
            Self::Set(element) => write!(f, "set[{}]", element),
        }
    }
}
