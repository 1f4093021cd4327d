//! Materialized columns and tables
//!
//! The engine evaluates every node to one of four shapes: a patient-level or
//! event-level column, or a patient-level or event-level table. Event-level
//! values are keyed by row id so that series derived from the same table can
//! be lined up row by row.

use ehrql_types::Value;
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{EvalError, EvalResult};

/// Patient identifier
pub type PatientId = i64;

/// Row identifier, unique across the database and increasing in load order
pub type RowId = u64;

/// Per-patient row order of an event-level value
pub type RowOrder = BTreeMap<PatientId, Vec<RowId>>;

// ============================================================================
// Lineage
// ============================================================================

/// Name of the event table whose row ids an event-level value carries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lineage(String);

impl Lineage {
    pub fn new(table: impl Into<String>) -> Self {
        Self(table.into())
    }

    pub fn table(&self) -> &str {
        &self.0
    }

    /// Fail unless both values come from the same table
    pub fn check(&self, other: &Lineage) -> EvalResult<()> {
        if self == other {
            Ok(())
        } else {
            Err(EvalError::LineageMismatch {
                left: self.0.clone(),
                right: other.0.clone(),
            })
        }
    }
}

impl fmt::Display for Lineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Rows
// ============================================================================

/// Values of one patient's rows, in row order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rows(IndexMap<RowId, Value>);

impl Rows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, row: RowId, value: Value) {
        self.0.insert(row, value);
    }

    pub fn get(&self, row: RowId) -> Option<&Value> {
        self.0.get(&row)
    }

    pub fn contains(&self, row: RowId) -> bool {
        self.0.contains_key(&row)
    }

    pub fn row_ids(&self) -> impl Iterator<Item = RowId> + '_ {
        self.0.keys().copied()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RowId, &Value)> {
        self.0.iter().map(|(row, value)| (*row, value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether there are any rows
    pub fn exists(&self) -> bool {
        !self.is_empty()
    }

    /// Number of rows, null or not
    pub fn count(&self) -> i64 {
        self.0.len() as i64
    }

    /// Rows whose predicate value is exactly true
    pub fn filter(&self, predicate: &Rows) -> Rows {
        self.iter()
            .filter(|(row, _)| predicate.get(*row).is_some_and(Value::is_true))
            .map(|(row, value)| (row, value.clone()))
            .collect()
    }

    /// Rank of each row when ordered by value: ascending, nulls last, equal
    /// values sharing a rank
    pub fn sort_index(&self) -> IndexMap<RowId, usize> {
        let distinct: BTreeSet<&Value> = self.values().filter(|v| !v.is_null()).collect();
        let ranks: BTreeMap<&Value, usize> =
            distinct.into_iter().enumerate().map(|(rank, v)| (v, rank)).collect();
        let null_rank = ranks.len();
        self.iter()
            .map(|(row, value)| (row, ranks.get(value).copied().unwrap_or(null_rank)))
            .collect()
    }

    /// Rows stably reordered by rank; rows without a rank go last
    pub fn sort(&self, index: &IndexMap<RowId, usize>) -> Rows {
        let order = sorted_row_ids(self.row_ids(), index);
        self.reordered(&order)
    }

    /// Value of the row at `index`, counting from the end when negative;
    /// null when there is no such row
    pub fn pick_at_index(&self, index: isize) -> Value {
        self.row_at(index)
            .and_then(|row| self.get(row))
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Id of the row at `index`, counting from the end when negative
    pub fn row_at(&self, index: isize) -> Option<RowId> {
        let position = if index < 0 {
            self.len().checked_sub(index.unsigned_abs())?
        } else {
            index as usize
        };
        self.0.get_index(position).map(|(row, _)| *row)
    }

    /// Apply `func` to the non-null values; `default` when there are none
    pub fn aggregate_values<F>(&self, func: F, default: Value) -> EvalResult<Value>
    where
        F: FnOnce(&[&Value]) -> EvalResult<Value>,
    {
        let values: Vec<&Value> = self.values().filter(|v| !v.is_null()).collect();
        if values.is_empty() {
            Ok(default)
        } else {
            func(&values)
        }
    }

    /// The given rows, in the given order; unknown ids are skipped
    pub fn reordered(&self, order: &[RowId]) -> Rows {
        order
            .iter()
            .filter_map(|row| self.get(*row).map(|value| (*row, value.clone())))
            .collect()
    }
}

impl FromIterator<(RowId, Value)> for Rows {
    fn from_iter<I: IntoIterator<Item = (RowId, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn sorted_row_ids(rows: impl Iterator<Item = RowId>, index: &IndexMap<RowId, usize>) -> Vec<RowId> {
    let mut rows: Vec<RowId> = rows.collect();
    // `sort_by_key` is stable
    rows.sort_by_key(|row| index.get(row).copied().unwrap_or(usize::MAX));
    rows
}

// ============================================================================
// Columns
// ============================================================================

/// One value per patient; patients not listed take the default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientColumn {
    values: BTreeMap<PatientId, Value>,
    default: Value,
}

impl PatientColumn {
    /// Column with no patients; every lookup yields `default`, so this is also
    /// the constant column
    pub fn new(default: Value) -> Self {
        Self {
            values: BTreeMap::new(),
            default,
        }
    }

    pub fn insert(&mut self, patient: PatientId, value: Value) {
        self.values.insert(patient, value);
    }

    /// Value for a patient, falling back to the default
    pub fn get(&self, patient: PatientId) -> &Value {
        self.values.get(&patient).unwrap_or(&self.default)
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// Patients with an explicit value
    pub fn patients(&self) -> impl Iterator<Item = PatientId> + '_ {
        self.values.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PatientId, &Value)> {
        self.values.iter().map(|(p, v)| (*p, v))
    }

    /// Repeat each patient's value on every row of `order`
    pub fn broadcast(&self, order: &RowOrder, lineage: &Lineage) -> EventColumn {
        let mut column = EventColumn::new(lineage.clone());
        for (&patient, rows) in order {
            let value = self.get(patient);
            column.insert_rows(patient, rows.iter().map(|row| (*row, value.clone())).collect());
        }
        column
    }
}

/// Zero or more values per patient, tied to rows of one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventColumn {
    lineage: Lineage,
    patients: BTreeMap<PatientId, Rows>,
}

impl EventColumn {
    pub fn new(lineage: Lineage) -> Self {
        Self {
            lineage,
            patients: BTreeMap::new(),
        }
    }

    pub fn lineage(&self) -> &Lineage {
        &self.lineage
    }

    pub fn insert_rows(&mut self, patient: PatientId, rows: Rows) {
        self.patients.insert(patient, rows);
    }

    /// Rows of a patient; `None` means no rows
    pub fn rows(&self, patient: PatientId) -> Option<&Rows> {
        self.patients.get(&patient)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PatientId, &Rows)> {
        self.patients.iter().map(|(p, rows)| (*p, rows))
    }

    /// Current row order per patient
    pub fn row_order(&self) -> RowOrder {
        self.iter()
            .map(|(patient, rows)| (patient, rows.row_ids().collect()))
            .collect()
    }

    /// Keep only the given rows, in the given order
    pub fn reordered(&self, order: &RowOrder) -> EventColumn {
        let patients = order
            .iter()
            .map(|(&patient, rows)| {
                let kept = self.rows(patient).map(|r| r.reordered(rows)).unwrap_or_default();
                (patient, kept)
            })
            .collect();
        EventColumn {
            lineage: self.lineage.clone(),
            patients,
        }
    }

    /// Whether each patient has any rows
    pub fn exists(&self) -> PatientColumn {
        self.per_patient(Value::Bool(false), |rows| Value::Bool(rows.exists()))
    }

    /// Number of rows per patient
    pub fn count(&self) -> PatientColumn {
        self.per_patient(Value::Int(0), |rows| Value::Int(rows.count()))
    }

    /// Rows whose predicate value is exactly true
    pub fn filter(&self, predicate: &EventColumn) -> EvalResult<EventColumn> {
        self.reorder_by(predicate, |rows, predicate| {
            rows.row_ids()
                .filter(|row| predicate.and_then(|p| p.get(*row)).is_some_and(Value::is_true))
                .collect()
        })
    }

    /// Rows stably sorted by `key`, ascending, nulls last
    pub fn sort(&self, key: &EventColumn) -> EvalResult<EventColumn> {
        self.reorder_by(key, |rows, key| {
            let index = key.map(Rows::sort_index).unwrap_or_default();
            sorted_row_ids(rows.row_ids(), &index)
        })
    }

    /// One value per patient, picked by position
    pub fn pick_at_index(&self, index: isize) -> PatientColumn {
        self.per_patient(Value::Null, |rows| rows.pick_at_index(index))
    }

    /// Apply `func` to each patient's non-null values
    pub fn aggregate_values<F>(&self, func: F, default: Value) -> EvalResult<PatientColumn>
    where
        F: Fn(&[&Value]) -> EvalResult<Value>,
    {
        let mut result = PatientColumn::new(default.clone());
        for (patient, rows) in self.iter() {
            result.insert(patient, rows.aggregate_values(&func, default.clone())?);
        }
        Ok(result)
    }

    fn per_patient(&self, default: Value, f: impl Fn(&Rows) -> Value) -> PatientColumn {
        let mut result = PatientColumn::new(default);
        for (patient, rows) in self.iter() {
            result.insert(patient, f(rows));
        }
        result
    }

    fn reorder_by(
        &self,
        other: &EventColumn,
        order: impl Fn(&Rows, Option<&Rows>) -> Vec<RowId>,
    ) -> EvalResult<EventColumn> {
        self.lineage.check(&other.lineage)?;
        let order: RowOrder = self
            .iter()
            .map(|(patient, rows)| (patient, order(rows, other.rows(patient))))
            .collect();
        Ok(self.reordered(&order))
    }
}

// ============================================================================
// Tables
// ============================================================================

/// A patient-level frame
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatientTable {
    patients: BTreeSet<PatientId>,
    columns: IndexMap<String, PatientColumn>,
}

impl PatientTable {
    pub fn new(
        patients: BTreeSet<PatientId>,
        columns: IndexMap<String, PatientColumn>,
    ) -> Self {
        Self { patients, columns }
    }

    pub fn column(&self, name: &str) -> Option<&PatientColumn> {
        self.columns.get(name)
    }

    /// Patients that have a row
    pub fn patients(&self) -> &BTreeSet<PatientId> {
        &self.patients
    }

    /// Whether each patient has a row
    pub fn exists(&self) -> PatientColumn {
        let mut result = PatientColumn::new(Value::Bool(false));
        for &patient in &self.patients {
            result.insert(patient, Value::Bool(true));
        }
        result
    }
}

/// An event-level frame: columns sharing one row order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTable {
    lineage: Lineage,
    rows: RowOrder,
    columns: IndexMap<String, EventColumn>,
}

impl EventTable {
    pub fn new(lineage: Lineage, rows: RowOrder, columns: IndexMap<String, EventColumn>) -> Self {
        Self {
            lineage,
            rows,
            columns,
        }
    }

    pub fn lineage(&self) -> &Lineage {
        &self.lineage
    }

    /// Row ids per patient in the current order
    pub fn row_order(&self) -> &RowOrder {
        &self.rows
    }

    /// A column, in the table's row order
    pub fn column(&self, name: &str) -> Option<EventColumn> {
        self.columns.get(name).map(|column| column.reordered(&self.rows))
    }

    /// Whether each patient has any rows
    pub fn exists(&self) -> PatientColumn {
        self.per_patient(Value::Bool(false), |rows| Value::Bool(!rows.is_empty()))
    }

    /// Number of rows per patient
    pub fn count(&self) -> PatientColumn {
        self.per_patient(Value::Int(0), |rows| Value::Int(rows.len() as i64))
    }

    /// Rows whose predicate value is exactly true
    pub fn filter(&self, predicate: &EventColumn) -> EvalResult<EventTable> {
        self.lineage.check(predicate.lineage())?;
        let rows = self
            .rows
            .iter()
            .map(|(&patient, rows)| {
                let keep = predicate.rows(patient);
                let kept = rows
                    .iter()
                    .copied()
                    .filter(|row| keep.and_then(|k| k.get(*row)).is_some_and(Value::is_true))
                    .collect();
                (patient, kept)
            })
            .collect();
        Ok(self.with_rows(rows))
    }

    /// Rows stably sorted by `key`, ascending, nulls last
    pub fn sort(&self, key: &EventColumn) -> EvalResult<EventTable> {
        self.lineage.check(key.lineage())?;
        let rows = self
            .rows
            .iter()
            .map(|(&patient, rows)| {
                let index = key.rows(patient).map(Rows::sort_index).unwrap_or_default();
                (patient, sorted_row_ids(rows.iter().copied(), &index))
            })
            .collect();
        Ok(self.with_rows(rows))
    }

    /// One row per patient, picked by position; patients without rows are
    /// absent from the result
    pub fn pick_at_index(&self, index: isize) -> PatientTable {
        let mut picked: BTreeMap<PatientId, RowId> = BTreeMap::new();
        for (&patient, rows) in &self.rows {
            let position = if index < 0 {
                rows.len().checked_sub(index.unsigned_abs())
            } else {
                Some(index as usize)
            };
            if let Some(row) = position.and_then(|i| rows.get(i)) {
                picked.insert(patient, *row);
            }
        }

        let columns = self
            .columns
            .iter()
            .map(|(name, column)| {
                let mut result = PatientColumn::new(Value::Null);
                for (&patient, &row) in &picked {
                    let value = column
                        .rows(patient)
                        .and_then(|rows| rows.get(row))
                        .cloned()
                        .unwrap_or(Value::Null);
                    result.insert(patient, value);
                }
                (name.clone(), result)
            })
            .collect();
        PatientTable::new(picked.into_keys().collect(), columns)
    }

    fn with_rows(&self, rows: RowOrder) -> EventTable {
        EventTable {
            lineage: self.lineage.clone(),
            rows,
            columns: self.columns.clone(),
        }
    }

    fn per_patient(&self, default: Value, f: impl Fn(&[RowId]) -> Value) -> PatientColumn {
        let mut result = PatientColumn::new(default);
        for (&patient, rows) in &self.rows {
            result.insert(patient, f(rows));
        }
        result
    }
}

// ============================================================================
// Evaluated
// ============================================================================

/// Result of evaluating one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluated {
    PatientColumn(PatientColumn),
    EventColumn(EventColumn),
    PatientTable(PatientTable),
    EventTable(EventTable),
}

impl Evaluated {
    /// Shape name, for error messages
    pub fn shape(&self) -> &'static str {
        match self {
            Self::PatientColumn(_) => "patient column",
            Self::EventColumn(_) => "event column",
            Self::PatientTable(_) => "patient table",
            Self::EventTable(_) => "event table",
        }
    }

    pub fn as_patient_column(&self) -> EvalResult<&PatientColumn> {
        match self {
            Self::PatientColumn(column) => Ok(column),
            other => Err(EvalError::type_mismatch("patient column", other.shape())),
        }
    }

    pub fn as_event_column(&self) -> EvalResult<&EventColumn> {
        match self {
            Self::EventColumn(column) => Ok(column),
            other => Err(EvalError::type_mismatch("event column", other.shape())),
        }
    }

    pub fn into_patient_column(self) -> EvalResult<PatientColumn> {
        match self {
            Self::PatientColumn(column) => Ok(column),
            other => Err(EvalError::type_mismatch("patient column", other.shape())),
        }
    }

    /// Lineage of an event-level result
    pub fn lineage(&self) -> Option<&Lineage> {
        match self {
            Self::EventColumn(column) => Some(column.lineage()),
            Self::EventTable(table) => Some(table.lineage()),
            _ => None,
        }
    }

    /// Row order of an event-level result
    pub fn row_order(&self) -> Option<RowOrder> {
        match self {
            Self::EventColumn(column) => Some(column.row_order()),
            Self::EventTable(table) => Some(table.row_order().clone()),
            _ => None,
        }
    }
}

// ============================================================================
// Row-wise Application
// ============================================================================

/// Apply `f` to the values of `args` row by row.
///
/// With only patient-level arguments the result is patient-level and its
/// default is `f` applied to the argument defaults. Otherwise the result is
/// event-level: rows are those present in every event-level argument, in the
/// order of the first one, with patient-level arguments repeated on each row.
pub fn apply_rowwise<F>(args: &[&Evaluated], f: F) -> EvalResult<Evaluated>
where
    F: Fn(&[Value]) -> EvalResult<Value>,
{
    let event_args: Vec<&EventColumn> = args
        .iter()
        .filter_map(|arg| match arg {
            Evaluated::EventColumn(column) => Some(column),
            _ => None,
        })
        .collect();

    let Some((first, others)) = event_args.split_first() else {
        let columns = args
            .iter()
            .map(|&arg| arg.as_patient_column())
            .collect::<EvalResult<Vec<_>>>()?;
        let defaults: Vec<Value> = columns.iter().map(|c| c.default_value().clone()).collect();
        let mut result = PatientColumn::new(f(&defaults)?);
        let patients: BTreeSet<PatientId> = columns.iter().flat_map(|&c| c.patients()).collect();
        for patient in patients {
            let values: Vec<Value> = columns.iter().map(|c| c.get(patient).clone()).collect();
            result.insert(patient, f(&values)?);
        }
        return Ok(Evaluated::PatientColumn(result));
    };

    for other in others {
        first.lineage().check(other.lineage())?;
    }

    let mut result = EventColumn::new(first.lineage().clone());
    for (patient, rows) in first.iter() {
        let mut out = Rows::new();
        for row in rows.row_ids() {
            let shared = others
                .iter()
                .all(|other| other.rows(patient).is_some_and(|r| r.contains(row)));
            if !shared {
                continue;
            }
            let values = args
                .iter()
                .map(|arg| match arg {
                    Evaluated::PatientColumn(column) => Ok(column.get(patient).clone()),
                    Evaluated::EventColumn(column) => Ok(column
                        .rows(patient)
                        .and_then(|r| r.get(row))
                        .cloned()
                        .unwrap_or(Value::Null)),
                    other => Err(EvalError::type_mismatch("column", other.shape())),
                })
                .collect::<EvalResult<Vec<_>>>()?;
            out.insert(row, f(&values)?);
        }
        result.insert_rows(patient, out);
    }
    Ok(Evaluated::EventColumn(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rows(values: &[(RowId, Value)]) -> Rows {
        values.iter().cloned().collect()
    }

    #[test]
    fn test_sort_index_dense_nulls_last() {
        let r = rows(&[
            (1, Value::Int(3)),
            (2, Value::Null),
            (3, Value::Int(1)),
            (4, Value::Int(3)),
        ]);
        let index = r.sort_index();
        assert_eq!(index.values().copied().collect::<Vec<_>>(), vec![1, 2, 0, 1]);
        assert_eq!(r.sort(&index).row_ids().collect::<Vec<_>>(), vec![3, 1, 4, 2]);
    }

    #[test]
    fn test_pick_at_index() {
        let r = rows(&[(1, Value::Int(10)), (2, Value::Int(20))]);
        assert_eq!(r.pick_at_index(0), Value::Int(10));
        assert_eq!(r.pick_at_index(-1), Value::Int(20));
        assert_eq!(r.pick_at_index(2), Value::Null);
        assert_eq!(r.pick_at_index(-3), Value::Null);
        assert_eq!(Rows::new().pick_at_index(0), Value::Null);
    }

    #[test]
    fn test_filter_keeps_only_true() {
        let r = rows(&[(1, Value::Int(1)), (2, Value::Int(2)), (3, Value::Int(3))]);
        let predicate = rows(&[(1, Value::Bool(true)), (2, Value::Null), (3, Value::Bool(false))]);
        assert_eq!(r.filter(&predicate), rows(&[(1, Value::Int(1))]));
    }

    #[test]
    fn test_aggregate_values_skips_nulls() {
        let r = rows(&[(1, Value::Null), (2, Value::Int(4))]);
        let count = |values: &[&Value]| Ok(Value::Int(values.len() as i64));
        assert_eq!(r.aggregate_values(count, Value::Int(0)).unwrap(), Value::Int(1));
        let empty = rows(&[(1, Value::Null)]);
        assert_eq!(empty.aggregate_values(count, Value::Int(0)).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_lineage_mismatch() {
        let a = EventColumn::new(Lineage::new("events"));
        let b = EventColumn::new(Lineage::new("medications"));
        assert_eq!(
            a.filter(&b).unwrap_err(),
            EvalError::LineageMismatch {
                left: "events".to_string(),
                right: "medications".to_string()
            }
        );
    }

    #[test]
    fn test_rowwise_patient_default() {
        let mut a = PatientColumn::new(Value::Int(0));
        a.insert(1, Value::Int(5));
        let b = PatientColumn::new(Value::Int(1));
        let args = [&Evaluated::PatientColumn(a), &Evaluated::PatientColumn(b)];
        let result = apply_rowwise(&args, |v| {
            Ok(Value::Int(v[0].as_int().unwrap_or(0) + v[1].as_int().unwrap_or(0)))
        })
        .unwrap();
        let result = result.into_patient_column().unwrap();
        assert_eq!(result.get(1), &Value::Int(6));
        assert_eq!(result.get(99), &Value::Int(1));
    }

    #[test]
    fn test_rowwise_intersects_rows() {
        let lineage = Lineage::new("events");
        let mut a = EventColumn::new(lineage.clone());
        a.insert_rows(1, rows(&[(1, Value::Int(1)), (2, Value::Int(2)), (3, Value::Int(3))]));
        let mut b = EventColumn::new(lineage);
        b.insert_rows(1, rows(&[(3, Value::Int(30)), (1, Value::Int(10))]));
        let args = [&Evaluated::EventColumn(a), &Evaluated::EventColumn(b)];
        let result = apply_rowwise(&args, |v| Ok(v[1].clone())).unwrap();
        let result = result.as_event_column().unwrap();
        assert_eq!(
            result.rows(1).unwrap(),
            &rows(&[(1, Value::Int(10)), (3, Value::Int(30))])
        );
    }
}
