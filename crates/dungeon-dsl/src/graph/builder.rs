//! Interpretation of dot definitions into task dependency graphs

use std::collections::BTreeMap;

use tracing::debug;

use super::{DependencyType, EdgeKind, TaskDependencyGraph, TaskEdge, TaskNode};
use crate::ast::{DotAttr, DotDef, DotEdgeStmt, DotStmt, EdgeOp, GraphKind, Ident};
use crate::error::{EvalError, GraphError};
use crate::value::Value;

/// Edge attribute naming the dependency type.
const TYPE_ATTRIBUTE: &str = "type";

/// Build a graph from a dot definition.
///
/// `resolve_task` is asked once per node name for the task the identifier
/// refers to; `Ok(None)` makes a name-only node.
///
/// Edge statements chain left to right: `a -> b -> c` yields `a -> b` and
/// `b -> c`, and `a, b -> c` yields `a -> c` and `b -> c`. Declaring the same
/// edge again overwrites the earlier one. All state is local to the call.
pub fn build_graph<F>(def: &DotDef, mut resolve_task: F) -> Result<TaskDependencyGraph, EvalError>
where
    F: FnMut(&Ident) -> Result<Option<Value>, EvalError>,
{
    let mut nodes: BTreeMap<String, TaskNode> = BTreeMap::new();
    let mut edges: BTreeMap<(String, String, EdgeKind), TaskEdge> = BTreeMap::new();

    for stmt in &def.stmts {
        for ident in stmt.idents() {
            if !nodes.contains_key(&ident.name) {
                let mut node = TaskNode::new(ident.name.clone());
                node.task = resolve_task(ident)?;
                nodes.insert(ident.name.clone(), node);
            }
        }

        match stmt {
            DotStmt::Node(node_stmt) => {
                if let Some(node) = nodes.get_mut(&node_stmt.id.name) {
                    for attr in &node_stmt.attrs {
                        node.attributes
                            .insert(attr.key.name.clone(), attr.value.name.clone());
                    }
                }
            }
            DotStmt::Edge(edge_stmt) => {
                let label = statement_label(edge_stmt);
                let dependency = dependency_type(&label, &edge_stmt.attrs)?;
                for (i, op) in edge_stmt.ops.iter().enumerate() {
                    let kind = edge_kind(def, *op, &label)?;
                    let (Some(left), Some(right)) =
                        (edge_stmt.groups.get(i), edge_stmt.groups.get(i + 1))
                    else {
                        continue;
                    };
                    for start in left {
                        for end in right {
                            let edge = new_edge(kind, dependency, &start.name, &end.name);
                            let key = (edge.start.clone(), edge.end.clone(), kind);
                            edges.insert(key, edge);
                        }
                    }
                }
            }
        }
    }

    let graph = TaskDependencyGraph {
        name: def.name.name.clone(),
        nodes: nodes.into_values().collect(),
        edges: edges.into_values().collect(),
    };
    debug!(
        graph = %graph.name,
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "built task dependency graph"
    );
    Ok(graph)
}

fn new_edge(
    kind: EdgeKind,
    dependency: Option<DependencyType>,
    start: &str,
    end: &str,
) -> TaskEdge {
    // Undirected edges are stored with sorted endpoints
    let (start, end) = if kind == EdgeKind::Undirected && end < start {
        (end, start)
    } else {
        (start, end)
    };
    TaskEdge {
        kind,
        dependency,
        start: start.to_string(),
        end: end.to_string(),
    }
}

fn edge_kind(def: &DotDef, op: EdgeOp, label: &str) -> Result<EdgeKind, GraphError> {
    match (def.kind, op) {
        (GraphKind::Digraph, EdgeOp::Arrow) => Ok(EdgeKind::Directed),
        (GraphKind::Graph, EdgeOp::DoubleLine) => Ok(EdgeKind::Undirected),
        _ => Err(GraphError::OperatorMismatch {
            graph: def.name.name.clone(),
            edge: label.to_string(),
        }),
    }
}

fn dependency_type(label: &str, attrs: &[DotAttr]) -> Result<Option<DependencyType>, GraphError> {
    let mut dependency = None;
    for attr in attrs {
        if attr.key.name != TYPE_ATTRIBUTE {
            return Err(GraphError::UnknownEdgeAttribute {
                edge: label.to_string(),
                key: attr.key.name.clone(),
            });
        }
        if dependency.is_some() {
            return Err(GraphError::DuplicateTypeAttribute {
                edge: label.to_string(),
            });
        }
        let ty = DependencyType::from_attribute(&attr.value.name).ok_or_else(|| {
            GraphError::UnknownDependencyType {
                edge: label.to_string(),
                value: attr.value.name.clone(),
            }
        })?;
        dependency = Some(ty);
    }
    Ok(dependency)
}

/// Source-like rendering of an edge statement for error messages.
fn statement_label(stmt: &DotEdgeStmt) -> String {
    let mut label = String::new();
    for (i, group) in stmt.groups.iter().enumerate() {
        if i > 0 {
            let op = stmt.ops.get(i - 1).map_or("?", |op| op.as_str());
            label.push(' ');
            label.push_str(op);
            label.push(' ');
        }
        let names: Vec<&str> = group.iter().map(|id| id.name.as_str()).collect();
        label.push_str(&names.join(", "));
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::DotStmt;

    fn free(_: &Ident) -> Result<Option<Value>, EvalError> {
        Ok(None)
    }

    fn names(graph: &TaskDependencyGraph) -> Vec<&str> {
        graph.nodes.iter().map(|n| n.name.as_str()).collect()
    }

    #[test]
    fn test_chain_creates_consecutive_edges() {
        let def = DotDef::digraph("g", vec![DotStmt::chain(EdgeOp::Arrow, &["a", "b", "c"])]);
        let graph = build_graph(&def, free).unwrap();
        assert_eq!(names(&graph), vec!["a", "b", "c"]);
        let edges: Vec<String> = graph.edges.iter().map(TaskEdge::name).collect();
        assert_eq!(edges, vec!["a -> b", "b -> c"]);
    }

    #[test]
    fn test_id_lists_connect_every_pair() {
        let def = DotDef::digraph(
            "g",
            vec![DotStmt::edge(vec![vec!["a", "b"], vec!["c", "d"]], EdgeOp::Arrow, vec![])],
        );
        let graph = build_graph(&def, free).unwrap();
        let edges: Vec<String> = graph.edges.iter().map(TaskEdge::name).collect();
        assert_eq!(edges, vec!["a -> c", "a -> d", "b -> c", "b -> d"]);
    }

    #[test]
    fn test_undirected_edges_are_canonical() {
        let def = DotDef::graph(
            "g",
            vec![
                DotStmt::chain(EdgeOp::DoubleLine, &["b", "a"]),
                DotStmt::chain(EdgeOp::DoubleLine, &["a", "b"]),
            ],
        );
        let graph = build_graph(&def, free).unwrap();
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].name(), "a -- b");
    }

    #[test]
    fn test_redeclared_edge_overwrites_dependency() {
        let def = DotDef::digraph(
            "g",
            vec![
                DotStmt::chain_with(EdgeOp::Arrow, &["a", "b"], vec![("type", "seq")]),
                DotStmt::chain_with(EdgeOp::Arrow, &["a", "b"], vec![("type", "c_f")]),
            ],
        );
        let graph = build_graph(&def, free).unwrap();
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(
            graph.edges[0].dependency,
            Some(DependencyType::ConditionalFalse)
        );
    }

    #[test]
    fn test_operator_must_match_graph_kind() {
        let def = DotDef::graph("g", vec![DotStmt::chain(EdgeOp::Arrow, &["a", "b"])]);
        let err = build_graph(&def, free).unwrap_err();
        assert!(matches!(
            err,
            EvalError::Graph(GraphError::OperatorMismatch { ref edge, .. }) if edge == "a -> b"
        ));
    }

    #[test]
    fn test_duplicate_type_attribute() {
        let def = DotDef::digraph(
            "g",
            vec![DotStmt::chain_with(
                EdgeOp::Arrow,
                &["a", "b"],
                vec![("type", "seq"), ("type", "st_o")],
            )],
        );
        let err = build_graph(&def, free).unwrap_err();
        assert!(matches!(
            err,
            EvalError::Graph(GraphError::DuplicateTypeAttribute { .. })
        ));
    }

    #[test]
    fn test_unknown_attributes_are_rejected() {
        let def = DotDef::digraph(
            "g",
            vec![DotStmt::chain_with(EdgeOp::Arrow, &["a", "b"], vec![("color", "red")])],
        );
        assert!(matches!(
            build_graph(&def, free).unwrap_err(),
            EvalError::Graph(GraphError::UnknownEdgeAttribute { ref key, .. }) if key == "color"
        ));

        let def = DotDef::digraph(
            "g",
            vec![DotStmt::chain_with(EdgeOp::Arrow, &["a", "b"], vec![("type", "maybe")])],
        );
        assert!(matches!(
            build_graph(&def, free).unwrap_err(),
            EvalError::Graph(GraphError::UnknownDependencyType { ref value, .. }) if value == "maybe"
        ));
    }

    #[test]
    fn test_node_statements_add_isolated_nodes_with_attributes() {
        let def = DotDef::graph(
            "g",
            vec![
                DotStmt::node("z", vec![("label", "end")]),
                DotStmt::chain(EdgeOp::DoubleLine, &["a", "b"]),
            ],
        );
        let graph = build_graph(&def, free).unwrap();
        assert_eq!(names(&graph), vec!["a", "b", "z"]);
        let z = graph.node("z").unwrap();
        assert_eq!(z.attributes.get("label").map(String::as_str), Some("end"));
    }

    #[test]
    fn test_tasks_resolved_once_per_name() {
        let def = DotDef::digraph(
            "g",
            vec![
                DotStmt::chain(EdgeOp::Arrow, &["t1", "t2"]),
                DotStmt::chain(EdgeOp::Arrow, &["t2", "t1"]),
            ],
        );
        let mut calls = 0;
        let graph = build_graph(&def, |id| {
            calls += 1;
            Ok((id.name == "t1").then(|| Value::Int(1)))
        })
        .unwrap();
        assert_eq!(calls, 2);
        assert_eq!(graph.tasks().count(), 1);
    }
}
