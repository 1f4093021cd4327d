//! Hash-consed query graph with validating constructors
//!
//! Every constructor type-checks its inputs before the node is added, so a
//! [`QueryGraph`] only ever contains well-formed queries. Inserting a node
//! that is structurally equal to one already present returns the existing
//! [`NodeId`].

use ehrql_types::{Codelist, Type, Value};
use log::trace;
use std::collections::HashMap;

use crate::error::{ModelResult, TypeValidationError, ValidationReason};
use crate::model::{AggregateKind, Args, Domain, Function, Node, NodeId, NodeKind, NodeMeta, Position};
use crate::registry::{TableKind, TableRegistry};
use crate::schema::Schema;
use crate::signatures;

/// Arena of query nodes
#[derive(Debug, Clone, Default)]
pub struct QueryGraph {
    nodes: Vec<(Node, NodeMeta)>,
    index: HashMap<Node, NodeId>,
}

impl QueryGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).map(|(node, _)| node)
    }

    /// Look up a node's metadata
    pub fn meta(&self, id: NodeId) -> Option<&NodeMeta> {
        self.nodes.get(id.index()).map(|(_, meta)| meta)
    }

    /// Kind of a node
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.meta(id).map(|meta| meta.kind)
    }

    /// All nodes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, (node, _))| (NodeId(i as u32), node))
    }

    /// Schema of a frame, taken from the table it was selected from
    pub fn schema(&self, frame: NodeId) -> Option<&Schema> {
        match self.get(self.get_root_frame(frame)?)? {
            Node::SelectTable { schema, .. } | Node::SelectPatientTable { schema, .. } => Some(schema),
            _ => None,
        }
    }

    /// Name of the table a node's rows come from, for messages
    pub fn table_name(&self, id: NodeId) -> Option<&str> {
        match self.get(self.get_root_frame(id)?)? {
            Node::SelectTable { name, .. } | Node::SelectPatientTable { name, .. } => Some(name),
            _ => None,
        }
    }

    // ========================================================================
    // Frames
    // ========================================================================

    /// Select an event-level table
    pub fn select_table(&mut self, name: impl Into<String>, schema: Schema) -> ModelResult<NodeId> {
        let node = Node::SelectTable {
            name: name.into(),
            schema,
        };
        if let Some(&id) = self.index.get(&node) {
            return Ok(id);
        }
        // An event table is its own domain
        let id = NodeId(self.nodes.len() as u32);
        Ok(self.push(
            node,
            NodeMeta {
                kind: NodeKind::EventFrame,
                ty: None,
                domain: Domain::Event(id),
            },
        ))
    }

    /// Select a patient-level table
    pub fn select_patient_table(
        &mut self,
        name: impl Into<String>,
        schema: Schema,
    ) -> ModelResult<NodeId> {
        let node = Node::SelectPatientTable {
            name: name.into(),
            schema,
        };
        Ok(self.insert(
            node,
            NodeMeta {
                kind: NodeKind::PatientFrame,
                ty: None,
                domain: Domain::Patient,
            },
        ))
    }

    /// Select a table by name from a registry
    pub fn select_table_from(&mut self, registry: &TableRegistry, name: &str) -> ModelResult<NodeId> {
        let Some(table) = registry.get(name) else {
            return Err(TypeValidationError::new(
                "SelectTable",
                ValidationReason::UnknownTable {
                    name: name.to_string(),
                },
            ));
        };
        match table.kind {
            TableKind::Patient => self.select_patient_table(name, table.schema.clone()),
            TableKind::Event => self.select_table(name, table.schema.clone()),
        }
    }

    /// Select one column of a frame
    pub fn select_column(&mut self, source: NodeId, name: impl Into<String>) -> ModelResult<NodeId> {
        const NODE: &str = "SelectColumn";
        let name = name.into();
        let source_meta = self.require(NODE, source)?.clone();
        let kind = match source_meta.kind {
            NodeKind::PatientFrame => NodeKind::PatientSeries,
            NodeKind::EventFrame => NodeKind::EventSeries,
            _ => return Err(TypeValidationError::new(NODE, ValidationReason::NotAFrame)),
        };
        let ty = self
            .schema(source)
            .and_then(|schema| schema.column_type(&name))
            .cloned()
            .ok_or_else(|| {
                TypeValidationError::new(
                    NODE,
                    ValidationReason::MissingColumn {
                        column: name.clone(),
                        table: self.table_name(source).unwrap_or_default().to_string(),
                    },
                )
            })?;
        Ok(self.insert(
            Node::SelectColumn { source, name },
            NodeMeta {
                kind,
                ty: Some(ty),
                domain: source_meta.domain,
            },
        ))
    }

    // ========================================================================
    // Literals and Parameters
    // ========================================================================

    /// Literal value; its type is inferred
    pub fn value(&mut self, value: impl Into<Value>) -> ModelResult<NodeId> {
        let value = value.into();
        let Some(ty) = value.infer_type() else {
            return Err(TypeValidationError::new(
                "Value",
                ValidationReason::incompatible("a value of known type", value.type_name()),
            ));
        };
        self.typed_value(value, ty)
    }

    /// Literal value of an explicit type, for nulls and empty sets
    pub fn typed_value(&mut self, value: Value, ty: Type) -> ModelResult<NodeId> {
        if !value.conforms_to(&ty) {
            return Err(TypeValidationError::new(
                "Value",
                ValidationReason::incompatible(&ty, value.type_name()),
            ));
        }
        Ok(self.insert(Node::Value { value, ty: ty.clone() }, patient_series(ty)))
    }

    /// Literal set of the codes in a codelist
    pub fn codelist(&mut self, codelist: &Codelist) -> ModelResult<NodeId> {
        let ty = Type::set_of(Type::Code(codelist.system()));
        self.typed_value(codelist.to_value(), ty)
    }

    /// Placeholder bound when the query is evaluated
    pub fn parameter(&mut self, name: impl Into<String>, ty: Type) -> ModelResult<NodeId> {
        Ok(self.insert(
            Node::Parameter {
                name: name.into(),
                ty: ty.clone(),
            },
            patient_series(ty),
        ))
    }

    // ========================================================================
    // Series Expressions
    // ========================================================================

    /// Apply an operator
    pub fn function(
        &mut self,
        op: Function,
        args: impl IntoIterator<Item = NodeId>,
    ) -> ModelResult<NodeId> {
        const NODE: &str = "Function";
        let args: Args = args.into_iter().collect();

        let mut types = Vec::with_capacity(args.len());
        let mut domain = Domain::Patient;
        for &arg in &args {
            let meta = self.require_series(NODE, arg)?;
            types.push(meta.ty.as_ref().ok_or_else(|| {
                TypeValidationError::new(NODE, ValidationReason::NotASeries)
            })?);
            domain = self.combine_domains(NODE, domain, meta.domain)?;
        }
        let ty = signatures::result_type(op, &types)
            .map_err(|reason| TypeValidationError::new(NODE, reason))?;

        Ok(self.insert(Node::Function { op, args }, series(ty, domain)))
    }

    /// Conditional expression; the first true condition selects its value
    pub fn case(
        &mut self,
        cases: impl IntoIterator<Item = (NodeId, NodeId)>,
        default: Option<NodeId>,
    ) -> ModelResult<NodeId> {
        const NODE: &str = "Case";
        let cases: Vec<(NodeId, NodeId)> = cases.into_iter().collect();
        if cases.is_empty() {
            return Err(TypeValidationError::new(
                NODE,
                ValidationReason::WrongArity {
                    expected: "at least 1 case".to_string(),
                    found: 0,
                },
            ));
        }

        let mut domain = Domain::Patient;
        let mut value_type: Option<Type> = None;
        let values = cases.iter().map(|(_, value)| *value).chain(default);
        for (condition, _) in &cases {
            let meta = self.require_series(NODE, *condition)?;
            check_type(NODE, &Type::Bool, meta)?;
            domain = self.combine_domains(NODE, domain, meta.domain)?;
        }
        for value in values {
            let meta = self.require_series(NODE, value)?;
            let Some(ty) = &meta.ty else {
                return Err(TypeValidationError::new(NODE, ValidationReason::NotASeries));
            };
            let expected = value_type.get_or_insert_with(|| ty.clone());
            check_type(NODE, expected, meta)?;
            domain = self.combine_domains(NODE, domain, meta.domain)?;
        }

        let ty = value_type.unwrap_or(Type::Bool);
        Ok(self.insert(Node::Case { cases, default }, series(ty, domain)))
    }

    // ========================================================================
    // Row Operations
    // ========================================================================

    /// Keep rows for which `condition` is true
    pub fn filter(&mut self, source: NodeId, condition: NodeId) -> ModelResult<NodeId> {
        const NODE: &str = "Filter";
        let source_meta = self.require_event_level(NODE, source)?.clone();
        let condition_meta = self.require_series(NODE, condition)?;
        check_type(NODE, &Type::Bool, condition_meta)?;
        self.combine_domains(NODE, source_meta.domain, condition_meta.domain)?;
        Ok(self.insert(Node::Filter { source, condition }, source_meta))
    }

    /// Keep rows for which `condition` is true
    pub fn where_(&mut self, source: NodeId, condition: NodeId) -> ModelResult<NodeId> {
        self.filter(source, condition)
    }

    /// Drop rows for which `condition` is true, keeping rows where it is
    /// false or null
    pub fn except_where(&mut self, source: NodeId, condition: NodeId) -> ModelResult<NodeId> {
        let not = self.function(Function::Not, [condition])?;
        let is_null = self.function(Function::IsNull, [condition])?;
        let keep = self.function(Function::Or, [not, is_null])?;
        self.filter(source, keep)
    }

    /// Stably sort rows by one key, ascending with nulls last
    pub fn sort(&mut self, source: NodeId, sort_by: NodeId) -> ModelResult<NodeId> {
        const NODE: &str = "Sort";
        let source_meta = self.require_event_level(NODE, source)?.clone();
        let key_meta = self.require_event_level(NODE, sort_by)?;
        let Some(key_type) = &key_meta.ty else {
            return Err(TypeValidationError::new(NODE, ValidationReason::NotASeries));
        };
        if !key_type.is_scalar() {
            return Err(TypeValidationError::new(
                NODE,
                ValidationReason::unsupported("sort key", key_type),
            ));
        }
        if key_meta.domain != source_meta.domain {
            return Err(self.domain_mismatch(NODE, source_meta.domain, key_meta.domain));
        }
        Ok(self.insert(Node::Sort { source, sort_by }, source_meta))
    }

    /// Sort by several keys, the first one primary
    pub fn sort_by(&mut self, source: NodeId, keys: &[NodeId]) -> ModelResult<NodeId> {
        if keys.is_empty() {
            return Err(TypeValidationError::new(
                "Sort",
                ValidationReason::WrongArity {
                    expected: "at least 1 key".to_string(),
                    found: 0,
                },
            ));
        }
        // Later sorts are stable, so sorting by the last key first leaves it
        // as the final tie-break.
        keys.iter()
            .rev()
            .try_fold(source, |sorted, &key| self.sort(sorted, key))
    }

    /// Collapse a sorted source to its first or last row per patient
    pub fn pick_one_row(&mut self, source: NodeId, position: Position) -> ModelResult<NodeId> {
        const NODE: &str = "PickOneRow";
        let source_meta = self.require_event_level(NODE, source)?.clone();
        if !self.is_sorted(source) {
            return Err(TypeValidationError::new(NODE, ValidationReason::PickWithoutSort));
        }
        let kind = if source_meta.kind.is_frame() {
            NodeKind::PatientFrame
        } else {
            NodeKind::PatientSeries
        };
        Ok(self.insert(
            Node::PickOneRow { source, position },
            NodeMeta {
                kind,
                ty: source_meta.ty,
                domain: Domain::Patient,
            },
        ))
    }

    pub fn first_for_patient(&mut self, source: NodeId) -> ModelResult<NodeId> {
        self.pick_one_row(source, Position::First)
    }

    pub fn last_for_patient(&mut self, source: NodeId) -> ModelResult<NodeId> {
        self.pick_one_row(source, Position::Last)
    }

    // ========================================================================
    // Aggregation
    // ========================================================================

    /// Reduce an event-level source to one value per patient
    pub fn aggregate(&mut self, kind: AggregateKind, source: NodeId) -> ModelResult<NodeId> {
        const NODE: &str = "Aggregate";
        let source_meta = self.require(NODE, source)?;

        let ty = match kind {
            AggregateKind::Exists if source_meta.kind == NodeKind::PatientFrame => Type::Bool,
            AggregateKind::Exists | AggregateKind::Count => {
                self.require_event_level(NODE, source)?;
                if kind == AggregateKind::Exists { Type::Bool } else { Type::Int }
            }
            _ => {
                let meta = self.require_event_level(NODE, source)?;
                let Some(ty) = meta.ty.clone() else {
                    return Err(TypeValidationError::new(NODE, ValidationReason::NotASeries));
                };
                match kind {
                    AggregateKind::Sum if ty.is_numeric() => ty,
                    AggregateKind::Mean if ty.is_numeric() => Type::Float,
                    AggregateKind::Min | AggregateKind::Max if ty.is_orderable() => ty,
                    AggregateKind::CountDistinct if ty.is_scalar() => Type::Int,
                    AggregateKind::CombineAsSet if ty.is_scalar() => Type::set_of(ty),
                    _ => {
                        return Err(TypeValidationError::new(
                            NODE,
                            ValidationReason::unsupported(format!("{kind:?}"), &ty),
                        ));
                    }
                }
            }
        };
        Ok(self.insert(Node::Aggregate { kind, source }, patient_series(ty)))
    }

    /// Whether each patient has any rows
    pub fn exists_for_patient(&mut self, source: NodeId) -> ModelResult<NodeId> {
        self.aggregate(AggregateKind::Exists, source)
    }

    /// Number of rows per patient
    pub fn count_for_patient(&mut self, source: NodeId) -> ModelResult<NodeId> {
        self.aggregate(AggregateKind::Count, source)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn insert(&mut self, node: Node, meta: NodeMeta) -> NodeId {
        if let Some(&id) = self.index.get(&node) {
            trace!("reusing {id} for {}", node.name());
            return id;
        }
        self.push(node, meta)
    }

    fn push(&mut self, node: Node, meta: NodeMeta) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        trace!("adding {id}: {}", node.name());
        self.index.insert(node.clone(), id);
        self.nodes.push((node, meta));
        id
    }

    pub(crate) fn require(&self, node: &'static str, id: NodeId) -> ModelResult<&NodeMeta> {
        self.meta(id)
            .ok_or_else(|| TypeValidationError::new(node, ValidationReason::UnknownNode { id }))
    }

    fn require_series(&self, node: &'static str, id: NodeId) -> ModelResult<&NodeMeta> {
        let meta = self.require(node, id)?;
        if meta.kind.is_series() {
            Ok(meta)
        } else {
            Err(TypeValidationError::new(node, ValidationReason::NotASeries))
        }
    }

    fn require_event_level(&self, node: &'static str, id: NodeId) -> ModelResult<&NodeMeta> {
        let meta = self.require(node, id)?;
        if meta.kind.is_event_level() {
            Ok(meta)
        } else {
            Err(TypeValidationError::new(node, ValidationReason::ExpectedEventLevel))
        }
    }

    fn combine_domains(&self, node: &'static str, left: Domain, right: Domain) -> ModelResult<Domain> {
        left.combine(right)
            .map_err(|_| self.domain_mismatch(node, left, right))
    }

    fn domain_mismatch(&self, node: &'static str, left: Domain, right: Domain) -> TypeValidationError {
        let describe = |domain: Domain| match domain {
            Domain::Patient => "patient".to_string(),
            Domain::Event(root) => self.table_name(root).unwrap_or_default().to_string(),
        };
        TypeValidationError::new(
            node,
            ValidationReason::DomainMismatch {
                left: describe(left),
                right: describe(right),
            },
        )
    }

    /// Whether the rows of `id` have been put in a defined order
    fn is_sorted(&self, id: NodeId) -> bool {
        match self.get(id) {
            Some(Node::Sort { .. }) => true,
            Some(Node::Filter { source, .. }) | Some(Node::SelectColumn { source, .. }) => {
                self.is_sorted(*source)
            }
            _ => false,
        }
    }
}

fn series(ty: Type, domain: Domain) -> NodeMeta {
    let kind = match domain {
        Domain::Patient => NodeKind::PatientSeries,
        Domain::Event(_) => NodeKind::EventSeries,
    };
    NodeMeta {
        kind,
        ty: Some(ty),
        domain,
    }
}

fn patient_series(ty: Type) -> NodeMeta {
    series(ty, Domain::Patient)
}

fn check_type(node: &'static str, expected: &Type, meta: &NodeMeta) -> ModelResult<()> {
    match &meta.ty {
        Some(ty) if ty == expected => Ok(()),
        Some(ty) => Err(TypeValidationError::new(
            node,
            ValidationReason::incompatible(expected, ty),
        )),
        None => Err(TypeValidationError::new(node, ValidationReason::NotASeries)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Column;
    use ehrql_types::{Code, CodingSystem};
    use pretty_assertions::assert_eq;

    fn events(graph: &mut QueryGraph, name: &str) -> NodeId {
        let schema = Schema::new([
            Column::new("date", Type::Date),
            Column::new("code", Type::Code(CodingSystem::SnomedCt)),
            Column::new("value", Type::Int),
        ])
        .unwrap();
        graph.select_table(name, schema).unwrap()
    }

    fn patients(graph: &mut QueryGraph) -> NodeId {
        let schema = Schema::new([Column::new("date_of_birth", Type::Date)]).unwrap();
        graph.select_patient_table("patients", schema).unwrap()
    }

    #[test]
    fn test_structural_dedup() {
        let mut g = QueryGraph::new();
        let e1 = events(&mut g, "events");
        let e2 = events(&mut g, "events");
        assert_eq!(e1, e2);

        let build = |g: &mut QueryGraph| {
            let value = g.select_column(e1, "value").unwrap();
            let ten = g.value(10i64).unwrap();
            g.function(Function::Gt, [value, ten]).unwrap()
        };
        let first = build(&mut g);
        let len = g.len();
        let second = build(&mut g);
        assert_eq!(first, second);
        assert_eq!(g.len(), len);
    }

    #[test]
    fn test_event_table_domain_is_itself() {
        let mut g = QueryGraph::new();
        let e = events(&mut g, "events");
        assert_eq!(g.meta(e).unwrap().domain, Domain::Event(e));
        let column = g.select_column(e, "date").unwrap();
        assert_eq!(g.meta(column).unwrap().kind, NodeKind::EventSeries);
        assert_eq!(g.meta(column).unwrap().domain, Domain::Event(e));
    }

    #[test]
    fn test_missing_column() {
        let mut g = QueryGraph::new();
        let e = events(&mut g, "events");
        let err = g.select_column(e, "nope").unwrap_err();
        assert_eq!(
            err.reason,
            ValidationReason::MissingColumn {
                column: "nope".to_string(),
                table: "events".to_string()
            }
        );
    }

    #[test]
    fn test_code_system_mismatch_on_eq() {
        let mut g = QueryGraph::new();
        let snomed = g.value(Code::new(CodingSystem::SnomedCt, "123")).unwrap();
        let ctv3 = g.value(Code::new(CodingSystem::Ctv3, "123")).unwrap();
        let err = g.function(Function::Eq, [snomed, ctv3]).unwrap_err();
        assert_eq!(err.node, "Function");
        assert!(matches!(err.reason, ValidationReason::CodingSystemMismatch { .. }));
    }

    #[test]
    fn test_mixing_event_tables_rejected() {
        let mut g = QueryGraph::new();
        let a = events(&mut g, "events");
        let b = events(&mut g, "medications");
        let left = g.select_column(a, "value").unwrap();
        let right = g.select_column(b, "value").unwrap();
        let err = g.function(Function::Add, [left, right]).unwrap_err();
        assert_eq!(
            err.reason,
            ValidationReason::DomainMismatch {
                left: "events".to_string(),
                right: "medications".to_string()
            }
        );
    }

    #[test]
    fn test_patient_series_broadcasts_into_events() {
        let mut g = QueryGraph::new();
        let e = events(&mut g, "events");
        let p = patients(&mut g);
        let date = g.select_column(e, "date").unwrap();
        let dob = g.select_column(p, "date_of_birth").unwrap();
        let age = g.function(Function::DateDifferenceInYears, [date, dob]).unwrap();
        let meta = g.meta(age).unwrap();
        assert_eq!(meta.kind, NodeKind::EventSeries);
        assert_eq!(meta.ty, Some(Type::Int));
    }

    #[test]
    fn test_pick_requires_sort() {
        let mut g = QueryGraph::new();
        let e = events(&mut g, "events");
        let err = g.first_for_patient(e).unwrap_err();
        assert_eq!(err.reason, ValidationReason::PickWithoutSort);

        let date = g.select_column(e, "date").unwrap();
        let sorted = g.sort(e, date).unwrap();
        let value = g.select_column(sorted, "value").unwrap();
        let ten = g.value(10i64).unwrap();
        let big = g.function(Function::Gt, [value, ten]).unwrap();
        let filtered = g.filter(sorted, big).unwrap();
        let first = g.first_for_patient(filtered).unwrap();
        assert_eq!(g.kind(first), Some(NodeKind::PatientFrame));
        assert_eq!(g.schema(first).unwrap().len(), 3);
    }

    #[test]
    fn test_sort_by_first_key_is_outermost() {
        let mut g = QueryGraph::new();
        let e = events(&mut g, "events");
        let date = g.select_column(e, "date").unwrap();
        let value = g.select_column(e, "value").unwrap();
        let sorted = g.sort_by(e, &[date, value]).unwrap();
        let inner = g.sort(e, value).unwrap();
        assert_eq!(
            g.get(sorted),
            Some(&Node::Sort {
                source: inner,
                sort_by: date
            })
        );
    }

    #[test]
    fn test_sort_key_must_share_rows() {
        let mut g = QueryGraph::new();
        let e = events(&mut g, "events");
        let p = patients(&mut g);
        let dob = g.select_column(p, "date_of_birth").unwrap();
        let err = g.sort(e, dob).unwrap_err();
        assert_eq!(err.reason, ValidationReason::ExpectedEventLevel);
    }

    #[test]
    fn test_filter_condition_must_be_bool() {
        let mut g = QueryGraph::new();
        let e = events(&mut g, "events");
        let value = g.select_column(e, "value").unwrap();
        assert!(g.filter(e, value).is_err());
        let p = patients(&mut g);
        let t = g.value(true).unwrap();
        assert_eq!(
            g.filter(p, t).unwrap_err().reason,
            ValidationReason::ExpectedEventLevel
        );
    }

    #[test]
    fn test_aggregate_types() {
        let mut g = QueryGraph::new();
        let e = events(&mut g, "events");
        let value = g.select_column(e, "value").unwrap();
        let code = g.select_column(e, "code").unwrap();

        let sum = g.aggregate(AggregateKind::Sum, value).unwrap();
        assert_eq!(g.meta(sum).unwrap().ty, Some(Type::Int));
        let mean = g.aggregate(AggregateKind::Mean, value).unwrap();
        assert_eq!(g.meta(mean).unwrap().ty, Some(Type::Float));
        let codes = g.aggregate(AggregateKind::CombineAsSet, code).unwrap();
        assert_eq!(
            g.meta(codes).unwrap().ty,
            Some(Type::set_of(Type::Code(CodingSystem::SnomedCt)))
        );
        let count = g.count_for_patient(e).unwrap();
        assert_eq!(g.meta(count).unwrap().kind, NodeKind::PatientSeries);

        assert!(g.aggregate(AggregateKind::Sum, code).is_err());
        assert!(g.aggregate(AggregateKind::Sum, e).is_err());
        let p = patients(&mut g);
        assert!(g.exists_for_patient(p).is_ok());
        assert!(g.count_for_patient(p).is_err());
    }

    #[test]
    fn test_case_values_share_type() {
        let mut g = QueryGraph::new();
        let t = g.value(true).unwrap();
        let one = g.value(1i64).unwrap();
        let text = g.value("x").unwrap();
        assert!(g.case([(t, one)], Some(text)).is_err());
        let null = g.typed_value(Value::Null, Type::Int).unwrap();
        let case = g.case([(t, one)], Some(null)).unwrap();
        assert_eq!(g.meta(case).unwrap().ty, Some(Type::Int));
    }

    #[test]
    fn test_literal_needs_a_type() {
        let mut g = QueryGraph::new();
        assert!(g.value(Value::Null).is_err());
        assert!(g.typed_value(Value::Int(1), Type::Str).is_err());
    }
}
