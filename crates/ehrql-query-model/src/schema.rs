//! Table schemas and column constraints

use ehrql_types::{Type, Value};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::error::{ModelResult, TypeValidationError, ValidationReason};

/// Name of the implicit patient identifier column every table carries
pub const PATIENT_ID: &str = "patient_id";

// ============================================================================
// Constraints
// ============================================================================

/// A restriction on the values a column may hold
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    /// Column never holds null
    NotNull,
    /// Values are unique across the table
    Unique,
    /// Values are drawn from a fixed set
    Categorical { values: BTreeSet<Value> },
    /// Values lie in a closed range; a missing bound is open
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<Value>,
    },
    /// String values match a regular expression in full
    Regex { pattern: String },
    /// Date values are always the 1st of a month
    FirstOfMonth,
}

impl Constraint {
    /// Create a categorical constraint
    pub fn categorical(values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::Categorical {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a closed range constraint
    pub fn range(minimum: impl Into<Value>, maximum: impl Into<Value>) -> Self {
        Self::Range {
            minimum: Some(minimum.into()),
            maximum: Some(maximum.into()),
        }
    }

    /// Create a regex constraint
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::Regex {
            pattern: pattern.into(),
        }
    }

    /// Short name used in messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotNull => "not null",
            Self::Unique => "unique",
            Self::Categorical { .. } => "categorical",
            Self::Range { .. } => "range",
            Self::Regex { .. } => "regex",
            Self::FirstOfMonth => "first of month",
        }
    }

    /// Check the constraint makes sense for a column of type `ty`
    fn validate_for(&self, column: &str, ty: &Type) -> Result<(), String> {
        match self {
            Self::NotNull | Self::Unique => Ok(()),
            Self::Categorical { values } => {
                if values.is_empty() {
                    return Err(format!("categorical constraint on {column:?} has no values"));
                }
                match values.iter().find(|v| v.is_null() || !v.conforms_to(ty)) {
                    Some(bad) => Err(format!(
                        "categorical value {bad} does not match type {ty} of {column:?}"
                    )),
                    None => Ok(()),
                }
            }
            Self::Range { minimum, maximum } => {
                if !matches!(ty, Type::Int | Type::Float | Type::Date) {
                    return Err(format!("range constraint on {column:?} of type {ty}"));
                }
                for bound in [minimum, maximum].into_iter().flatten() {
                    if bound.is_null() || !bound.conforms_to(ty) {
                        return Err(format!(
                            "range bound {bound} does not match type {ty} of {column:?}"
                        ));
                    }
                }
                match (minimum, maximum) {
                    (Some(lo), Some(hi)) if lo > hi => {
                        Err(format!("empty range {lo}..={hi} on {column:?}"))
                    }
                    _ => Ok(()),
                }
            }
            Self::Regex { pattern } => {
                if *ty != Type::Str {
                    return Err(format!("regex constraint on {column:?} of type {ty}"));
                }
                Regex::new(pattern)
                    .map(|_| ())
                    .map_err(|e| format!("bad pattern for {column:?}: {e}"))
            }
            Self::FirstOfMonth => {
                if *ty == Type::Date {
                    Ok(())
                } else {
                    Err(format!("first-of-month constraint on {column:?} of type {ty}"))
                }
            }
        }
    }
}

// ============================================================================
// Columns
// ============================================================================

/// A named, typed column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub ty: Type,
    /// Constraints on the stored values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
}

impl Column {
    /// Create an unconstrained column
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            constraints: Vec::new(),
        }
    }

    /// Add a constraint
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Whether the column is declared not-null
    pub fn is_not_null(&self) -> bool {
        self.constraints.contains(&Constraint::NotNull)
    }

    /// Whether the column is declared unique
    pub fn is_unique(&self) -> bool {
        self.constraints.contains(&Constraint::Unique)
    }
}

// ============================================================================
// Schema
// ============================================================================

/// Ordered set of columns of a table.
///
/// The `patient_id` column is implicit and may not be declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Column>", into = "Vec<Column>")]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Create a schema, validating names and constraints
    pub fn new(columns: impl IntoIterator<Item = Column>) -> ModelResult<Self> {
        let columns: Vec<Column> = columns.into_iter().collect();
        let invalid =
            |message: String| TypeValidationError::new("Schema", ValidationReason::invalid_schema(message));

        let mut seen = HashSet::new();
        for column in &columns {
            if column.name.is_empty() {
                return Err(invalid("empty column name".to_string()));
            }
            if column.name == PATIENT_ID {
                return Err(invalid(format!("{PATIENT_ID:?} is a reserved column name")));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(invalid(format!("duplicate column {:?}", column.name)));
            }
            for constraint in &column.constraints {
                constraint.validate_for(&column.name, &column.ty).map_err(invalid)?;
            }
        }
        Ok(Self { columns })
    }

    /// Schema with no columns
    pub fn empty() -> Self {
        Self::default()
    }

    /// All columns in declaration order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Declared type of a column
    pub fn column_type(&self, name: &str) -> Option<&Type> {
        self.column(name).map(|c| &c.ty)
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl TryFrom<Vec<Column>> for Schema {
    type Error = TypeValidationError;

    fn try_from(columns: Vec<Column>) -> Result<Self, Self::Error> {
        Self::new(columns)
    }
}

impl From<Schema> for Vec<Column> {
    fn from(schema: Schema) -> Self {
        schema.columns
    }
}
