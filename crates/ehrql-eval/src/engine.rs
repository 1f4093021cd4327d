//! In-memory query engine
//!
//! This module provides [`InMemoryQueryEngine`], which evaluates nodes of a
//! [`QueryGraph`] against an [`InMemoryDatabase`]. It is the reference
//! semantics other backends are checked against.

use ehrql_query_model::{
    AggregateKind, Dataset, Node, NodeId, NodeMeta, PATIENT_ID, Position, QueryGraph,
};
use ehrql_types::Value;
use indexmap::IndexMap;
use log::{debug, trace};
use std::collections::HashMap;

use crate::columns::{Evaluated, PatientColumn, apply_rowwise};
use crate::context::EvaluationContext;
use crate::database::{InMemoryDatabase, PatientId};
use crate::error::{EvalError, EvalResult};
use crate::operators::{aggregate, apply_function};

/// One output row of a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub patient_id: PatientId,
    /// Variable values in declaration order
    pub values: IndexMap<String, Value>,
}

impl ResultRow {
    /// Value of a variable
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Column names and values, `patient_id` first
    pub fn columns(&self) -> impl Iterator<Item = (&str, Value)> + '_ {
        std::iter::once((PATIENT_ID, Value::Int(self.patient_id)))
            .chain(self.values.iter().map(|(name, value)| (name.as_str(), value.clone())))
    }
}

/// Evaluates query graphs against an in-memory database
pub struct InMemoryQueryEngine<'db> {
    database: &'db InMemoryDatabase,
    context: EvaluationContext,
}

impl<'db> InMemoryQueryEngine<'db> {
    /// Create an engine with no parameters bound
    pub fn new(database: &'db InMemoryDatabase) -> Self {
        Self {
            database,
            context: EvaluationContext::new(),
        }
    }

    /// Use `context` for parameter values
    pub fn with_context(mut self, context: EvaluationContext) -> Self {
        self.context = context;
        self
    }

    pub fn context(&self) -> &EvaluationContext {
        &self.context
    }

    pub fn database(&self) -> &InMemoryDatabase {
        self.database
    }

    /// Evaluate a single node
    pub fn evaluate(&self, graph: &QueryGraph, id: NodeId) -> EvalResult<Evaluated> {
        let mut results = self.evaluate_all(graph, [id])?;
        results
            .remove(&id)
            .ok_or_else(|| EvalError::internal(format!("node {id} was not evaluated")))
    }

    /// Evaluate a dataset: one row per patient in the population, ordered by
    /// patient id
    pub fn get_results(&self, graph: &QueryGraph, dataset: &Dataset) -> EvalResult<Vec<ResultRow>> {
        let roots = dataset.to_roots();
        debug!(
            "Evaluating dataset with {} variable(s) over {} patient(s)",
            dataset.variables().len(),
            self.database.all_patients().len()
        );

        let results = self.evaluate_all(graph, roots.values().copied())?;
        let population = patient_column(&results, dataset.population())?;
        let variables = dataset
            .variables()
            .iter()
            .map(|(name, id)| Ok((name.as_str(), patient_column(&results, *id)?)))
            .collect::<EvalResult<Vec<_>>>()?;

        let rows: Vec<ResultRow> = self
            .database
            .all_patients()
            .iter()
            .filter(|&&patient| population.get(patient).is_true())
            .map(|&patient| ResultRow {
                patient_id: patient,
                values: variables
                    .iter()
                    .map(|(name, column)| (name.to_string(), column.get(patient).clone()))
                    .collect(),
            })
            .collect();
        debug!("Dataset produced {} row(s)", rows.len());
        Ok(rows)
    }

    /// Evaluate `roots` and everything they depend on, children first
    fn evaluate_all(
        &self,
        graph: &QueryGraph,
        roots: impl IntoIterator<Item = NodeId>,
    ) -> EvalResult<HashMap<NodeId, Evaluated>> {
        let mut cache: HashMap<NodeId, Evaluated> = HashMap::new();
        for id in graph.all_nodes(roots) {
            let node = graph.get(id).ok_or_else(|| unknown_node(id))?;
            let meta = graph.meta(id).ok_or_else(|| unknown_node(id))?;
            trace!("Evaluating {id}: {}", node.name());
            let value = self.evaluate_node(node, meta, &cache)?;
            cache.insert(id, value);
        }
        Ok(cache)
    }

    fn evaluate_node(
        &self,
        node: &Node,
        meta: &NodeMeta,
        cache: &HashMap<NodeId, Evaluated>,
    ) -> EvalResult<Evaluated> {
        let input = |id: &NodeId| cache.get(id).ok_or_else(|| unknown_node(*id));

        match node {
            Node::SelectTable { name, schema } => Ok(Evaluated::EventTable(
                self.database.event_table(name, schema)?.clone(),
            )),
            Node::SelectPatientTable { name, schema } => Ok(Evaluated::PatientTable(
                self.database.patient_table(name, schema)?.clone(),
            )),
            Node::SelectColumn { source, name } => select_column(input(source)?, name),
            Node::Value { value, .. } => {
                Ok(Evaluated::PatientColumn(PatientColumn::new(value.clone())))
            }
            Node::Parameter { name, ty } => {
                let value = self
                    .context
                    .get_parameter(name)
                    .ok_or_else(|| EvalError::UnboundParameter { name: name.clone() })?;
                if !value.conforms_to(ty) {
                    return Err(EvalError::value_mismatch(ty, value));
                }
                Ok(Evaluated::PatientColumn(PatientColumn::new(value.clone())))
            }
            Node::Function { op, args } => {
                let args = args.iter().map(input).collect::<EvalResult<Vec<_>>>()?;
                apply_function(*op, &args)
            }
            Node::Case { cases, default } => {
                let mut args = Vec::with_capacity(cases.len() * 2 + 1);
                for (condition, value) in cases {
                    args.push(input(condition)?);
                    args.push(input(value)?);
                }
                if let Some(default) = default {
                    args.push(input(default)?);
                }
                apply_rowwise(&args, |values| Ok(choose_case(values)))
            }
            Node::Filter { source, condition } => filter(input(source)?, input(condition)?),
            Node::Sort { source, sort_by } => {
                let key = input(sort_by)?.as_event_column()?;
                match input(source)? {
                    Evaluated::EventTable(table) => Ok(Evaluated::EventTable(table.sort(key)?)),
                    Evaluated::EventColumn(column) => {
                        Ok(Evaluated::EventColumn(column.sort(key)?))
                    }
                    other => Err(EvalError::type_mismatch("event-level source", other.shape())),
                }
            }
            Node::PickOneRow { source, position } => {
                let index = match position {
                    Position::First => 0,
                    Position::Last => -1,
                };
                match input(source)? {
                    Evaluated::EventTable(table) => {
                        Ok(Evaluated::PatientTable(table.pick_at_index(index)))
                    }
                    Evaluated::EventColumn(column) => {
                        Ok(Evaluated::PatientColumn(column.pick_at_index(index)))
                    }
                    other => Err(EvalError::type_mismatch("event-level source", other.shape())),
                }
            }
            Node::Aggregate { kind, source } => {
                let default = match &meta.ty {
                    Some(ty) => kind.default_value(ty),
                    None => Value::Null,
                };
                aggregate_node(*kind, input(source)?, default)
            }
        }
    }
}

/// Value of the first case whose condition is true; every condition is
/// followed by its value, with an optional trailing default
fn choose_case(values: &[Value]) -> Value {
    let mut chunks = values.chunks(2);
    for chunk in chunks.by_ref() {
        match chunk {
            [condition, value] if condition.is_true() => return value.clone(),
            [default] => return default.clone(),
            _ => {}
        }
    }
    Value::Null
}

fn select_column(source: &Evaluated, name: &str) -> EvalResult<Evaluated> {
    let missing = || EvalError::internal(format!("column {name} missing from evaluated frame"));
    match source {
        Evaluated::PatientTable(table) => Ok(Evaluated::PatientColumn(
            table.column(name).cloned().ok_or_else(missing)?,
        )),
        Evaluated::EventTable(table) => Ok(Evaluated::EventColumn(
            table.column(name).ok_or_else(missing)?,
        )),
        other => Err(EvalError::type_mismatch("frame", other.shape())),
    }
}

fn filter(source: &Evaluated, condition: &Evaluated) -> EvalResult<Evaluated> {
    let broadcast;
    let predicate = match condition {
        Evaluated::EventColumn(column) => column,
        Evaluated::PatientColumn(column) => {
            let (Some(order), Some(lineage)) = (source.row_order(), source.lineage()) else {
                return Err(EvalError::type_mismatch("event-level source", source.shape()));
            };
            broadcast = column.broadcast(&order, lineage);
            &broadcast
        }
        other => return Err(EvalError::type_mismatch("condition column", other.shape())),
    };

    match source {
        Evaluated::EventTable(table) => Ok(Evaluated::EventTable(table.filter(predicate)?)),
        Evaluated::EventColumn(column) => Ok(Evaluated::EventColumn(column.filter(predicate)?)),
        other => Err(EvalError::type_mismatch("event-level source", other.shape())),
    }
}

fn aggregate_node(kind: AggregateKind, source: &Evaluated, default: Value) -> EvalResult<Evaluated> {
    let column = match (kind, source) {
        (AggregateKind::Exists, Evaluated::PatientTable(table)) => table.exists(),
        (AggregateKind::Exists, Evaluated::EventTable(table)) => table.exists(),
        (AggregateKind::Count, Evaluated::EventTable(table)) => table.count(),
        (AggregateKind::Exists, Evaluated::EventColumn(column)) => column.exists(),
        (AggregateKind::Count, Evaluated::EventColumn(column)) => column.count(),
        (_, Evaluated::EventColumn(column)) => {
            column.aggregate_values(|values| aggregate::aggregate(kind, values), default)?
        }
        (_, other) => {
            return Err(EvalError::type_mismatch(
                format!("source for {kind:?}"),
                other.shape(),
            ));
        }
    };
    Ok(Evaluated::PatientColumn(column))
}

fn patient_column(results: &HashMap<NodeId, Evaluated>, id: NodeId) -> EvalResult<&PatientColumn> {
    results
        .get(&id)
        .ok_or_else(|| EvalError::internal(format!("node {id} was not evaluated")))?
        .as_patient_column()
}

fn unknown_node(id: NodeId) -> EvalError {
    EvalError::internal(format!("unknown node {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_case() {
        let t = Value::Bool(true);
        let f = Value::Bool(false);
        assert_eq!(
            choose_case(&[f.clone(), Value::Int(1), t.clone(), Value::Int(2), Value::Int(3)]),
            Value::Int(2)
        );
        assert_eq!(choose_case(&[f.clone(), Value::Int(1), Value::Int(3)]), Value::Int(3));
        assert_eq!(choose_case(&[Value::Null, Value::Int(1)]), Value::Null);
        assert_eq!(choose_case(&[t, Value::Int(1)]), Value::Int(1));
    }
}
