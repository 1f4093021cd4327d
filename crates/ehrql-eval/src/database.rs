//! In-memory database
//!
//! Tables are loaded from rows of values and checked against their schema,
//! including column constraints, when they are added. Row ids are assigned
//! in load order and are unique across the whole database.

use chrono::Datelike;
use ehrql_query_model::{Column, Constraint, Schema, TableKind, TableRegistry};
use ehrql_types::{Type, Value};
use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::columns::{EventColumn, EventTable, Lineage, PatientColumn, PatientTable, Rows};
use crate::error::{EvalError, EvalResult};

pub use crate::columns::{PatientId, RowId};

/// One input row: the patient and the values in schema column order
pub type InputRow = (PatientId, Vec<Value>);

#[derive(Debug, Clone)]
enum StoredTable {
    Patient { schema: Schema, table: PatientTable },
    Event { schema: Schema, table: EventTable },
}

/// Tables of patient data held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    tables: IndexMap<String, StoredTable>,
    patients: BTreeSet<PatientId>,
    next_row_id: RowId,
}

impl InMemoryDatabase {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a patient-level table; each patient may appear at most once
    pub fn add_patient_table(
        &mut self,
        name: &str,
        schema: &Schema,
        rows: impl IntoIterator<Item = InputRow>,
    ) -> EvalResult<()> {
        let rows = self.check_rows(name, schema, rows)?;
        let mut patients = BTreeSet::new();
        for (patient, _, _) in &rows {
            if !patients.insert(*patient) {
                return Err(EvalError::DuplicatePatient {
                    table: name.to_string(),
                    patient_id: *patient,
                });
            }
        }

        let columns = schema
            .columns()
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let mut values = PatientColumn::new(Value::Null);
                for (patient, _, row) in &rows {
                    values.insert(*patient, row[i].clone());
                }
                (column.name.clone(), values)
            })
            .collect();

        debug!("loaded patient table {name} with {} rows", rows.len());
        self.patients.extend(patients.iter().copied());
        self.tables.insert(
            name.to_string(),
            StoredTable::Patient {
                schema: schema.clone(),
                table: PatientTable::new(patients, columns),
            },
        );
        Ok(())
    }

    /// Load an event-level table
    pub fn add_event_table(
        &mut self,
        name: &str,
        schema: &Schema,
        rows: impl IntoIterator<Item = InputRow>,
    ) -> EvalResult<()> {
        let rows = self.check_rows(name, schema, rows)?;
        let lineage = Lineage::new(name);

        let mut order: BTreeMap<PatientId, Vec<RowId>> = BTreeMap::new();
        for (patient, row_id, _) in &rows {
            order.entry(*patient).or_default().push(*row_id);
        }

        let columns = schema
            .columns()
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let mut per_patient: BTreeMap<PatientId, Rows> = BTreeMap::new();
                for (patient, row_id, row) in &rows {
                    per_patient.entry(*patient).or_default().insert(*row_id, row[i].clone());
                }
                let mut values = EventColumn::new(lineage.clone());
                for (patient, patient_rows) in per_patient {
                    values.insert_rows(patient, patient_rows);
                }
                (column.name.clone(), values)
            })
            .collect();

        debug!("loaded event table {name} with {} rows", rows.len());
        self.patients.extend(order.keys().copied());
        self.tables.insert(
            name.to_string(),
            StoredTable::Event {
                schema: schema.clone(),
                table: EventTable::new(lineage, order, columns),
            },
        );
        Ok(())
    }

    /// Load a table declared in `registry`
    pub fn add_table(
        &mut self,
        registry: &TableRegistry,
        name: &str,
        rows: impl IntoIterator<Item = InputRow>,
    ) -> EvalResult<()> {
        let table = registry.get(name).ok_or_else(|| EvalError::UnknownTable {
            name: name.to_string(),
        })?;
        match table.kind {
            TableKind::Patient => self.add_patient_table(name, &table.schema, rows),
            TableKind::Event => self.add_event_table(name, &table.schema, rows),
        }
    }

    /// Every patient with a row in any table
    pub fn all_patients(&self) -> &BTreeSet<PatientId> {
        &self.patients
    }

    /// Names of the loaded tables
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// A patient-level table whose stored schema covers `schema`
    pub fn patient_table(&self, name: &str, schema: &Schema) -> EvalResult<&PatientTable> {
        match self.tables.get(name) {
            Some(StoredTable::Patient { schema: stored, table }) => {
                check_covers(name, stored, schema)?;
                Ok(table)
            }
            Some(StoredTable::Event { .. }) => Err(EvalError::schema_mismatch(
                name,
                "selected as a patient table but stored as an event table",
            )),
            None => Err(EvalError::UnknownTable {
                name: name.to_string(),
            }),
        }
    }

    /// An event-level table whose stored schema covers `schema`
    pub fn event_table(&self, name: &str, schema: &Schema) -> EvalResult<&EventTable> {
        match self.tables.get(name) {
            Some(StoredTable::Event { schema: stored, table }) => {
                check_covers(name, stored, schema)?;
                Ok(table)
            }
            Some(StoredTable::Patient { .. }) => Err(EvalError::schema_mismatch(
                name,
                "selected as an event table but stored as a patient table",
            )),
            None => Err(EvalError::UnknownTable {
                name: name.to_string(),
            }),
        }
    }

    /// Validate rows against the schema and assign row ids
    fn check_rows(
        &mut self,
        name: &str,
        schema: &Schema,
        rows: impl IntoIterator<Item = InputRow>,
    ) -> EvalResult<Vec<(PatientId, RowId, Vec<Value>)>> {
        if self.tables.contains_key(name) {
            return Err(EvalError::schema_mismatch(name, "table loaded twice"));
        }
        let mut checkers = schema
            .columns()
            .iter()
            .map(|column| ColumnChecker::new(name, column))
            .collect::<EvalResult<Vec<_>>>()?;

        let mut checked = Vec::new();
        for (patient, values) in rows {
            if values.len() != checkers.len() {
                return Err(EvalError::schema_mismatch(
                    name,
                    format!(
                        "row for patient {patient} has {} values, expected {}",
                        values.len(),
                        checkers.len()
                    ),
                ));
            }
            for (checker, value) in checkers.iter_mut().zip(&values) {
                checker.check(value)?;
            }
            let row_id = self.next_row_id;
            self.next_row_id += 1;
            checked.push((patient, row_id, values));
        }
        Ok(checked)
    }
}

/// Every column the query expects must be stored with the same type
fn check_covers(name: &str, stored: &Schema, expected: &Schema) -> EvalResult<()> {
    for column in expected.columns() {
        match stored.column_type(&column.name) {
            Some(ty) if *ty == column.ty => {}
            Some(ty) => {
                return Err(EvalError::schema_mismatch(
                    name,
                    format!("column {} is stored as {ty}, not {}", column.name, column.ty),
                ));
            }
            None => {
                return Err(EvalError::schema_mismatch(
                    name,
                    format!("no column {}", column.name),
                ));
            }
        }
    }
    Ok(())
}

// ============================================================================
// Column Checking
// ============================================================================

/// Checks one column's values against its type and constraints
struct ColumnChecker {
    table: String,
    column: String,
    ty: Type,
    not_null: bool,
    unique: Option<HashSet<Value>>,
    categories: Option<BTreeSet<Value>>,
    range: Option<(Option<Value>, Option<Value>)>,
    pattern: Option<Regex>,
    first_of_month: bool,
}

impl ColumnChecker {
    fn new(table: &str, column: &Column) -> EvalResult<Self> {
        let mut checker = Self {
            table: table.to_string(),
            column: column.name.clone(),
            ty: column.ty.clone(),
            not_null: false,
            unique: None,
            categories: None,
            range: None,
            pattern: None,
            first_of_month: false,
        };
        for constraint in &column.constraints {
            match constraint {
                Constraint::NotNull => checker.not_null = true,
                Constraint::Unique => checker.unique = Some(HashSet::new()),
                Constraint::Categorical { values } => checker.categories = Some(values.clone()),
                Constraint::Range { minimum, maximum } => {
                    checker.range = Some((minimum.clone(), maximum.clone()));
                }
                Constraint::Regex { pattern } => {
                    let anchored = Regex::new(&format!("^(?:{pattern})$"))
                        .map_err(|e| checker.violation(format!("bad pattern: {e}")))?;
                    checker.pattern = Some(anchored);
                }
                Constraint::FirstOfMonth => checker.first_of_month = true,
            }
        }
        Ok(checker)
    }

    fn check(&mut self, value: &Value) -> EvalResult<()> {
        if !value.conforms_to(&self.ty) {
            return Err(EvalError::schema_mismatch(
                &self.table,
                format!("{}: expected {}, found {}", self.column, self.ty, value.type_name()),
            ));
        }
        if value.is_null() {
            return if self.not_null {
                Err(self.violation("null in a not-null column"))
            } else {
                Ok(())
            };
        }
        if let Some(categories) = &self.categories {
            if !categories.contains(value) {
                return Err(self.violation(format!("{value} is not an allowed category")));
            }
        }
        if let Some((minimum, maximum)) = &self.range {
            let below = minimum.as_ref().is_some_and(|lo| value < lo);
            let above = maximum.as_ref().is_some_and(|hi| value > hi);
            if below || above {
                return Err(self.violation(format!("{value} is out of range")));
            }
        }
        if let (Some(pattern), Some(text)) = (&self.pattern, value.as_str()) {
            if !pattern.is_match(text) {
                return Err(self.violation(format!("{value} does not match {}", pattern.as_str())));
            }
        }
        if self.first_of_month && value.as_date().is_some_and(|d| d.day() != 1) {
            return Err(self.violation(format!("{value} is not the first of a month")));
        }
        if let Some(seen) = &mut self.unique {
            if !seen.insert(value.clone()) {
                return Err(self.violation(format!("{value} appears more than once")));
            }
        }
        Ok(())
    }

    fn violation(&self, message: impl Into<String>) -> EvalError {
        EvalError::constraint_violation(&self.table, &self.column, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn schema(column: Column) -> Schema {
        Schema::new([column]).unwrap()
    }

    #[rstest]
    #[case(Column::new("x", Type::Int).with_constraint(Constraint::NotNull), Value::Null)]
    #[case(Column::new("x", Type::Int).with_constraint(Constraint::range(0i64, 10i64)), Value::Int(11))]
    #[case(Column::new("x", Type::Str).with_constraint(Constraint::categorical(["a", "b"])), Value::string("c"))]
    #[case(Column::new("x", Type::Str).with_constraint(Constraint::regex("E[0-9]{3}")), Value::string("E12"))]
    #[case(Column::new("x", Type::Date).with_constraint(Constraint::FirstOfMonth), Value::date(2020, 1, 2))]
    fn test_constraint_violations(#[case] column: Column, #[case] value: Value) {
        let mut db = InMemoryDatabase::new();
        let err = db.add_event_table("t", &schema(column), [(1, vec![value])]).unwrap_err();
        assert!(matches!(err, EvalError::ConstraintViolation { .. }), "{err:?}");
    }

    #[test]
    fn test_unique_constraint() {
        let column = Column::new("x", Type::Int).with_constraint(Constraint::Unique);
        let mut db = InMemoryDatabase::new();
        let rows = [(1, vec![Value::Int(1)]), (2, vec![Value::Int(1)])];
        assert!(matches!(
            db.add_event_table("t", &schema(column), rows),
            Err(EvalError::ConstraintViolation { .. })
        ));
    }

    #[test]
    fn test_type_and_width_checked() {
        let mut db = InMemoryDatabase::new();
        let s = schema(Column::new("x", Type::Int));
        assert!(db.add_event_table("a", &s, [(1, vec![Value::string("1")])]).is_err());
        assert!(db.add_event_table("b", &s, [(1, vec![])]).is_err());
    }

    #[test]
    fn test_duplicate_patient() {
        let mut db = InMemoryDatabase::new();
        let s = schema(Column::new("x", Type::Int));
        let err = db
            .add_patient_table("p", &s, [(1, vec![Value::Int(1)]), (1, vec![Value::Int(2)])])
            .unwrap_err();
        assert_eq!(
            err,
            EvalError::DuplicatePatient {
                table: "p".to_string(),
                patient_id: 1
            }
        );
    }

    #[test]
    fn test_table_loaded_twice_keeps_first() {
        let mut db = InMemoryDatabase::new();
        let s = schema(Column::new("x", Type::Int));
        db.add_event_table("e", &s, [(1, vec![Value::Int(1)])]).unwrap();
        let err = db.add_patient_table("e", &s, [(2, vec![Value::Int(2)])]).unwrap_err();
        assert!(matches!(err, EvalError::SchemaMismatch { .. }));
        assert!(db.event_table("e", &s).is_ok());
        assert_eq!(db.all_patients().iter().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_all_patients_is_union() {
        let mut db = InMemoryDatabase::new();
        let s = schema(Column::new("x", Type::Int));
        db.add_patient_table("p", &s, [(1, vec![Value::Int(1)])]).unwrap();
        db.add_event_table("e", &s, [(2, vec![Value::Null]), (3, vec![Value::Int(3)])])
            .unwrap();
        assert_eq!(db.all_patients().iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_selected_schema_must_be_stored() {
        let mut db = InMemoryDatabase::new();
        let stored = Schema::new([Column::new("x", Type::Int), Column::new("y", Type::Str)]).unwrap();
        db.add_event_table("e", &stored, Vec::<InputRow>::new()).unwrap();
        assert!(db.event_table("e", &schema(Column::new("y", Type::Str))).is_ok());
        assert!(db.event_table("e", &schema(Column::new("y", Type::Int))).is_err());
        assert!(db.patient_table("e", &Schema::empty()).is_err());
        assert!(matches!(
            db.event_table("missing", &Schema::empty()),
            Err(EvalError::UnknownTable { .. })
        ));
    }
}
