//! Graph traversal
//!
//! Consumers other than the engine (SQL compilers, dummy data generators,
//! documentation) walk the graph through these helpers.

use ehrql_types::Type;
use indexmap::IndexMap;
use std::collections::HashSet;

use crate::graph::QueryGraph;
use crate::model::{Domain, Node, NodeId};

impl QueryGraph {
    /// Direct children of a node, in field order
    pub fn get_input_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.get(id).map(Node::children).unwrap_or_default()
    }

    /// Table selector a frame or column ultimately reads from.
    ///
    /// Follows `SelectColumn`, `Filter`, `Sort` and `PickOneRow` through their
    /// `source`. Computed series have no single root frame.
    pub fn get_root_frame(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            match self.get(current)? {
                Node::SelectTable { .. } | Node::SelectPatientTable { .. } => return Some(current),
                Node::SelectColumn { source, .. }
                | Node::Filter { source, .. }
                | Node::Sort { source, .. }
                | Node::PickOneRow { source, .. } => current = *source,
                _ => return None,
            }
        }
    }

    /// Every node reachable from `roots`, children before parents, each
    /// once
    pub fn all_nodes(&self, roots: impl IntoIterator<Item = NodeId>) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        for root in roots {
            // Iterative post-order; the bool marks a node whose children
            // have already been pushed.
            let mut stack = vec![(root, false)];
            while let Some((id, expanded)) = stack.pop() {
                if expanded {
                    order.push(id);
                    continue;
                }
                if !seen.insert(id) {
                    continue;
                }
                stack.push((id, true));
                for child in self.get_input_nodes(id).into_iter().rev() {
                    if !seen.contains(&child) {
                        stack.push((child, false));
                    }
                }
            }
        }
        order
    }

    /// Parameters referenced from `roots`, by name
    pub fn get_parameters(&self, roots: impl IntoIterator<Item = NodeId>) -> IndexMap<String, Type> {
        self.all_nodes(roots)
            .into_iter()
            .filter_map(|id| match self.get(id)? {
                Node::Parameter { name, ty } => Some((name.clone(), ty.clone())),
                _ => None,
            })
            .collect()
    }

    /// Row identity of a node
    pub fn get_domain(&self, id: NodeId) -> Option<Domain> {
        self.meta(id).map(|meta| meta.domain)
    }

    /// Value type of a series; `None` for frames
    pub fn get_series_type(&self, id: NodeId) -> Option<&Type> {
        self.meta(id)?.ty.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Function, NodeKind};
    use crate::schema::{Column, Schema};
    use crate::QueryGraph;
    use ehrql_types::Type;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_all_nodes_children_first() {
        let mut g = QueryGraph::new();
        let schema = Schema::new([Column::new("value", Type::Int)]).unwrap();
        let events = g.select_table("events", schema).unwrap();
        let value = g.select_column(events, "value").unwrap();
        let threshold = g.parameter("threshold", Type::Int).unwrap();
        let big = g.function(Function::Gt, [value, threshold]).unwrap();
        let filtered = g.filter(events, big).unwrap();
        let count = g.count_for_patient(filtered).unwrap();

        let order = g.all_nodes([count]);
        assert_eq!(order, vec![events, value, threshold, big, filtered, count]);

        // Shared children appear once
        let again = g.all_nodes([count, big]);
        assert_eq!(again.len(), 6);

        assert_eq!(g.get_input_nodes(big), vec![value, threshold]);
        assert_eq!(g.get_root_frame(value), Some(events));
        assert_eq!(g.get_root_frame(filtered), Some(events));
        assert_eq!(g.get_root_frame(big), None);
        assert_eq!(g.get_series_type(count), Some(&Type::Int));
        assert_eq!(g.get_series_type(filtered), None);
        assert_eq!(g.kind(count), Some(NodeKind::PatientSeries));

        let params = g.get_parameters([count]);
        assert_eq!(params.get("threshold"), Some(&Type::Int));
    }
}
