//! Table registry
//!
//! Tables are declared up front and handed to whatever needs to resolve a
//! table by name: query construction and deserialization.

use indexmap::IndexMap;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::{ModelResult, TypeValidationError, ValidationReason};
use crate::schema::Schema;

/// Whether a table holds one row or many rows per patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Patient,
    Event,
}

/// A declared table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub kind: TableKind,
    pub schema: Schema,
}

/// Tables known to the query builder, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TableRegistry {
    tables: IndexMap<String, TableDefinition>,
}

impl TableRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a table; a name may only be declared once
    pub fn register(
        &mut self,
        name: impl Into<String>,
        kind: TableKind,
        schema: Schema,
    ) -> ModelResult<()> {
        let name = name.into();
        if name.is_empty() || self.tables.contains_key(&name) {
            return Err(TypeValidationError::new(
                "TableRegistry",
                ValidationReason::invalid_schema(format!("table {name:?} declared twice or unnamed")),
            ));
        }
        self.tables.insert(name, TableDefinition { kind, schema });
        Ok(())
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_table(mut self, name: impl Into<String>, kind: TableKind, schema: Schema) -> ModelResult<Self> {
        self.register(name, kind, schema)?;
        Ok(self)
    }

    /// Look up a table
    pub fn get(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(name)
    }

    /// All tables in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableDefinition)> {
        self.tables.iter().map(|(name, table)| (name.as_str(), table))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Load table declarations from JSON:
    ///
    /// ```json
    /// {"patients": {"kind": "patient", "schema": [{"name": "sex", "type": {"type": "Str"}}]}}
    /// ```
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// Each JSON entry goes through `register`, so repeated or empty names are
// rejected instead of overwriting an earlier declaration.
impl<'de> Deserialize<'de> for TableRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RegistryVisitor;

        impl<'de> Visitor<'de> for RegistryVisitor {
            type Value = TableRegistry;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of table names to table definitions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<TableRegistry, A::Error> {
                let mut registry = TableRegistry::new();
                while let Some((name, table)) = map.next_entry::<String, TableDefinition>()? {
                    registry
                        .register(name, table.kind, table.schema)
                        .map_err(de::Error::custom)?;
                }
                Ok(registry)
            }
        }

        deserializer.deserialize_map(RegistryVisitor)
    }
}
