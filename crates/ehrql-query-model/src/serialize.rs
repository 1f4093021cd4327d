//! JSON form of a query graph
//!
//! Nodes are written children first and refer to each other by position in
//! the `nodes` array. Table selectors carry only the table name; schemas come
//! from the [`TableRegistry`] supplied when reading the graph back, and every
//! node is rebuilt through the validating constructors of [`QueryGraph`].

use ehrql_types::{Type, Value};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::error::TypeValidationError;
use crate::graph::QueryGraph;
use crate::model::{AggregateKind, Function, Node, NodeId, Position};
use crate::registry::{TableKind, TableRegistry};

/// Errors reading or writing a serialized graph
#[derive(Debug, Error)]
pub enum SerializeError {
    /// Malformed JSON, unknown node kinds, or unexpected fields such as an
    /// inline table schema
    #[error("invalid serialized query: {0}")]
    Json(#[from] serde_json::Error),

    /// A table selector names a table the registry does not know
    #[error("unknown table {name:?}")]
    UnknownTable { name: String },

    /// A table selector disagrees with the registry on the table kind
    #[error("table {name:?} is declared as a {declared:?} table")]
    TableKindMismatch { name: String, declared: TableKind },

    /// A node refers to a position that is not an earlier node, or a root
    /// to a node that does not exist; roots are reported as the node after
    /// the last one
    #[error("node {node} refers to {reference}, which is not an earlier node")]
    DanglingReference { node: usize, reference: usize },

    /// A node failed validation while being rebuilt
    #[error(transparent)]
    Validation(#[from] TypeValidationError),
}

/// One serialized node; children are positions in [`SerializedGraph::nodes`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", deny_unknown_fields)]
pub enum SerializedNode {
    PatientTable {
        name: String,
    },
    EventTable {
        name: String,
    },
    SelectColumn {
        source: usize,
        name: String,
    },
    Value {
        value: Value,
        #[serde(rename = "type")]
        ty: Type,
    },
    Parameter {
        name: String,
        #[serde(rename = "type")]
        ty: Type,
    },
    Function {
        op: Function,
        args: Vec<usize>,
    },
    Case {
        cases: Vec<(usize, usize)>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<usize>,
    },
    Filter {
        source: usize,
        condition: usize,
    },
    Sort {
        source: usize,
        sort_by: usize,
    },
    PickOneRow {
        source: usize,
        position: Position,
    },
    Aggregate {
        kind: AggregateKind,
        source: usize,
    },
}

/// A graph reduced to the nodes reachable from named roots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SerializedGraph {
    pub nodes: Vec<SerializedNode>,
    pub roots: IndexMap<String, usize>,
}

// ============================================================================
// Writing
// ============================================================================

/// Serialize the part of `graph` reachable from `roots`; every root must be
/// a node of `graph`
pub fn to_serialized(
    graph: &QueryGraph,
    roots: &IndexMap<String, NodeId>,
) -> Result<SerializedGraph, SerializeError> {
    let order = graph.all_nodes(roots.values().copied());
    if let Some(foreign) = roots.values().find(|id| graph.get(**id).is_none()) {
        return Err(SerializeError::DanglingReference {
            node: order.len(),
            reference: foreign.index(),
        });
    }
    let positions: HashMap<NodeId, usize> =
        order.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let at = |id: &NodeId| positions[id];

    let nodes = order
        .iter()
        .filter_map(|id| graph.get(*id))
        .map(|node| match node {
            Node::SelectTable { name, .. } => SerializedNode::EventTable { name: name.clone() },
            Node::SelectPatientTable { name, .. } => {
                SerializedNode::PatientTable { name: name.clone() }
            }
            Node::SelectColumn { source, name } => SerializedNode::SelectColumn {
                source: at(source),
                name: name.clone(),
            },
            Node::Value { value, ty } => SerializedNode::Value {
                value: value.clone(),
                ty: ty.clone(),
            },
            Node::Parameter { name, ty } => SerializedNode::Parameter {
                name: name.clone(),
                ty: ty.clone(),
            },
            Node::Function { op, args } => SerializedNode::Function {
                op: *op,
                args: args.iter().map(at).collect(),
            },
            Node::Case { cases, default } => SerializedNode::Case {
                cases: cases.iter().map(|(c, v)| (at(c), at(v))).collect(),
                default: default.as_ref().map(at),
            },
            Node::Filter { source, condition } => SerializedNode::Filter {
                source: at(source),
                condition: at(condition),
            },
            Node::Sort { source, sort_by } => SerializedNode::Sort {
                source: at(source),
                sort_by: at(sort_by),
            },
            Node::PickOneRow { source, position } => SerializedNode::PickOneRow {
                source: at(source),
                position: *position,
            },
            Node::Aggregate { kind, source } => SerializedNode::Aggregate {
                kind: *kind,
                source: at(source),
            },
        })
        .collect();

    Ok(SerializedGraph {
        nodes,
        roots: roots.iter().map(|(name, id)| (name.clone(), at(id))).collect(),
    })
}

/// Serialize the part of `graph` reachable from `roots` as JSON
pub fn to_json(graph: &QueryGraph, roots: &IndexMap<String, NodeId>) -> Result<String, SerializeError> {
    Ok(serde_json::to_string(&to_serialized(graph, roots)?)?)
}

// ============================================================================
// Reading
// ============================================================================

/// Rebuild a serialized graph into `graph`, returning the root ids by name
pub fn from_serialized(
    serialized: &SerializedGraph,
    registry: &TableRegistry,
    graph: &mut QueryGraph,
) -> Result<IndexMap<String, NodeId>, SerializeError> {
    debug!("rebuilding {} serialized nodes", serialized.nodes.len());
    let mut ids: Vec<NodeId> = Vec::with_capacity(serialized.nodes.len());

    for (position, node) in serialized.nodes.iter().enumerate() {
        let resolve = |reference: usize| {
            ids.get(reference)
                .copied()
                .ok_or(SerializeError::DanglingReference {
                    node: position,
                    reference,
                })
        };

        let id = match node {
            SerializedNode::PatientTable { name } => {
                select_table(graph, registry, name, TableKind::Patient)?
            }
            SerializedNode::EventTable { name } => {
                select_table(graph, registry, name, TableKind::Event)?
            }
            SerializedNode::SelectColumn { source, name } => {
                graph.select_column(resolve(*source)?, name.clone())?
            }
            SerializedNode::Value { value, ty } => graph.typed_value(value.clone(), ty.clone())?,
            SerializedNode::Parameter { name, ty } => graph.parameter(name.clone(), ty.clone())?,
            SerializedNode::Function { op, args } => {
                let args = args
                    .iter()
                    .map(|arg| resolve(*arg))
                    .collect::<Result<Vec<_>, _>>()?;
                graph.function(*op, args)?
            }
            SerializedNode::Case { cases, default } => {
                let cases = cases
                    .iter()
                    .map(|(c, v)| Ok((resolve(*c)?, resolve(*v)?)))
                    .collect::<Result<Vec<_>, SerializeError>>()?;
                let default = default.map(resolve).transpose()?;
                graph.case(cases, default)?
            }
            SerializedNode::Filter { source, condition } => {
                graph.filter(resolve(*source)?, resolve(*condition)?)?
            }
            SerializedNode::Sort { source, sort_by } => {
                graph.sort(resolve(*source)?, resolve(*sort_by)?)?
            }
            SerializedNode::PickOneRow { source, position } => {
                graph.pick_one_row(resolve(*source)?, *position)?
            }
            SerializedNode::Aggregate { kind, source } => {
                graph.aggregate(*kind, resolve(*source)?)?
            }
        };
        ids.push(id);
    }

    serialized
        .roots
        .iter()
        .map(|(name, &position)| {
            let id = ids.get(position).copied().ok_or(SerializeError::DanglingReference {
                node: serialized.nodes.len(),
                reference: position,
            })?;
            Ok((name.clone(), id))
        })
        .collect()
}

/// Parse JSON and rebuild it into `graph`
pub fn from_json(
    json: &str,
    registry: &TableRegistry,
    graph: &mut QueryGraph,
) -> Result<IndexMap<String, NodeId>, SerializeError> {
    let serialized: SerializedGraph = serde_json::from_str(json)?;
    from_serialized(&serialized, registry, graph)
}

fn select_table(
    graph: &mut QueryGraph,
    registry: &TableRegistry,
    name: &str,
    kind: TableKind,
) -> Result<NodeId, SerializeError> {
    let table = registry.get(name).ok_or_else(|| SerializeError::UnknownTable {
        name: name.to_string(),
    })?;
    if table.kind != kind {
        return Err(SerializeError::TableKindMismatch {
            name: name.to_string(),
            declared: table.kind,
        });
    }
    Ok(graph.select_table_from(registry, name)?)
}
