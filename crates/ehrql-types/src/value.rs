//! Runtime values
//!
//! `Value` is the single representation shared by query literals and the
//! data held by the in-memory engine. Every variant is hashable and totally
//! ordered so that literals can take part in structural node equality.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::{Code, Type};

/// A scalar, code or set value. `Null` is the missing/unknown value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// Missing or unknown
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value, held as an exact decimal
    Float(Decimal),
    /// String value
    Str(String),
    /// Calendar date
    Date(NaiveDate),
    /// Clinical code
    Code(Code),
    /// Set of values, used as the right-hand side of containment tests
    Set(BTreeSet<Value>),
}

impl Value {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this value is exactly `true`
    pub fn is_true(&self) -> bool {
        matches!(self, Self::Bool(true))
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as float; integers widen
    pub fn as_float(&self) -> Option<Decimal> {
        match self {
            Self::Float(d) => Some(*d),
            Self::Int(i) => Some(Decimal::from(*i)),
            _ => None,
        }
    }

    /// Try to get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as date
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Try to get as code
    pub fn as_code(&self) -> Option<&Code> {
        match self {
            Self::Code(c) => Some(c),
            _ => None,
        }
    }

    /// Try to get as set
    pub fn as_set(&self) -> Option<&BTreeSet<Value>> {
        match self {
            Self::Set(s) => Some(s),
            _ => None,
        }
    }

    /// Infer the semantic type of this value.
    ///
    /// Returns `None` for `Null`, for an empty set and for a set whose
    /// elements disagree on their type.
    pub fn infer_type(&self) -> Option<Type> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(Type::Bool),
            Self::Int(_) => Some(Type::Int),
            Self::Float(_) => Some(Type::Float),
            Self::Str(_) => Some(Type::Str),
            Self::Date(_) => Some(Type::Date),
            Self::Code(code) => Some(Type::Code(code.system)),
            Self::Set(items) => {
                let mut types = items.iter().filter(|v| !v.is_null()).map(Value::infer_type);
                let first = types.next()??;
                if types.all(|t| t.as_ref() == Some(&first)) {
                    Some(Type::set_of(first))
                } else {
                    None
                }
            }
        }
    }

    /// Check whether this value may be stored in a slot of type `ty`
    pub fn conforms_to(&self, ty: &Type) -> bool {
        match (self, ty) {
            (Self::Null, _) => true,
            (Self::Bool(_), Type::Bool)
            | (Self::Int(_), Type::Int)
            | (Self::Float(_), Type::Float)
            | (Self::Str(_), Type::Str)
            | (Self::Date(_), Type::Date) => true,
            (Self::Code(code), Type::Code(system)) => code.system == *system,
            (Self::Set(items), Type::Set(element)) => items.iter().all(|v| v.conforms_to(element)),
            _ => false,
        }
    }

    /// Name of the variant, for error messages
    pub fn type_name(&self) -> String {
        match self.infer_type() {
            Some(ty) => ty.to_string(),
            None if self.is_null() => "null".to_string(),
            None => "set".to_string(),
        }
    }

    /// Create a date value from its parts; `Null` for an invalid date
    pub fn date(year: i32, month: u32, day: u32) -> Self {
        NaiveDate::from_ymd_opt(year, month, day).map_or(Self::Null, Self::Date)
    }

    /// Create a string value
    pub fn string(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    /// Create a set value
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        Self::Set(items.into_iter().collect())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(d) => {
                let s = d.to_string();
                if s.contains('.') {
                    write!(f, "{}", s)
                } else {
                    write!(f, "{}.0", s)
                }
            }
            Self::Str(s) => write!(f, "{:?}", s),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Code(c) => write!(f, "{}", c),
            Self::Set(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<Code> for Value {
    fn from(value: Code) -> Self {
        Self::Code(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
