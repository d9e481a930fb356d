//! Dot graph interpretation tests

use std::sync::Arc;

use dungeon_dsl::ast::{self, DotDef, DotStmt, EdgeOp, Expr, Item, Program};
use dungeon_dsl::error::GraphError;
use dungeon_dsl::{
    DependencyType, DslError, EdgeKind, EvalError, RuntimeEnvironment, TaskDependencyGraph,
    TypeBuilder, Value,
};
use pretty_assertions::assert_eq;

fn load(items: Vec<Item>) -> Result<Arc<RuntimeEnvironment>, DslError> {
    let registry = Arc::new(TypeBuilder::new().with_prelude().build());
    dungeon_dsl::load(&[Program::new("level.dng", items)], registry)
}

fn load_graph(def: DotDef) -> anyhow::Result<Arc<TaskDependencyGraph>> {
    let name = def.name.name.clone();
    let env = load(vec![ast::graph(def)])?;
    env.graph(&name)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("graph `{name}` was not built"))
}

fn graph_error(items: Vec<Item>) -> GraphError {
    match load(items) {
        Err(DslError::Eval(EvalError::Graph(err))) => err,
        other => panic!("expected a graph error, got {other:?}"),
    }
}

fn edge_names(graph: &TaskDependencyGraph) -> Vec<String> {
    graph.edges.iter().map(|e| e.name()).collect()
}

// ═══════════════════════════════════════════════════════════════════════
// Structure
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_undirected_edges_deduplicate() -> anyhow::Result<()> {
    let graph = load_graph(DotDef::graph(
        "g",
        vec![
            DotStmt::chain(EdgeOp::DoubleLine, &["B", "A"]),
            DotStmt::chain(EdgeOp::DoubleLine, &["A", "B"]),
        ],
    ))?;

    assert_eq!(edge_names(&graph), vec!["A -- B"]);
    let edge = graph.edge("B", "A").unwrap();
    assert_eq!(edge.kind, EdgeKind::Undirected);
    assert_eq!(edge.start, "A");
    Ok(())
}

#[test]
fn test_redeclared_edge_overwrites_dependency() -> anyhow::Result<()> {
    let graph = load_graph(DotDef::graph(
        "g",
        vec![
            DotStmt::chain_with(EdgeOp::DoubleLine, &["A", "B"], vec![("type", "seq")]),
            DotStmt::chain_with(EdgeOp::DoubleLine, &["B", "A"], vec![("type", "st_m")]),
        ],
    ))?;

    assert_eq!(graph.edges.len(), 1);
    assert_eq!(
        graph.edges[0].dependency,
        Some(DependencyType::SubtaskMandatory)
    );
    Ok(())
}

#[test]
fn test_directed_edges_keep_direction() -> anyhow::Result<()> {
    let graph = load_graph(DotDef::digraph(
        "g",
        vec![
            DotStmt::chain(EdgeOp::Arrow, &["a", "b"]),
            DotStmt::chain(EdgeOp::Arrow, &["b", "a"]),
        ],
    ))?;

    assert_eq!(edge_names(&graph), vec!["a -> b", "b -> a"]);
    assert!(graph.edge("a", "b").is_some());
    assert_eq!(graph.successors("a").collect::<Vec<_>>(), vec!["b"]);
    Ok(())
}

#[test]
fn test_id_lists_connect_every_pair() -> anyhow::Result<()> {
    let graph = load_graph(DotDef::digraph(
        "g",
        vec![DotStmt::edge(
            vec![vec!["a", "b"], vec!["c"], vec!["d", "e"]],
            EdgeOp::Arrow,
            vec![],
        )],
    ))?;

    assert_eq!(
        edge_names(&graph),
        vec!["a -> c", "b -> c", "c -> d", "c -> e"]
    );
    let names: Vec<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
    Ok(())
}

#[test]
fn test_node_attributes_override() -> anyhow::Result<()> {
    let graph = load_graph(DotDef::graph(
        "g",
        vec![
            DotStmt::node("start", vec![("label", "Start")]),
            DotStmt::chain(EdgeOp::DoubleLine, &["start", "end"]),
            DotStmt::node("start", vec![("label", "Begin"), ("shape", "box")]),
        ],
    ))?;

    let start = graph.node("start").unwrap();
    let attrs: Vec<(&str, &str)> = start
        .attributes
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    assert_eq!(attrs, vec![("label", "Begin"), ("shape", "box")]);
    assert!(graph.node("end").unwrap().attributes.is_empty());
    Ok(())
}

#[test]
fn test_statement_order_does_not_matter() -> anyhow::Result<()> {
    let stmts = || {
        vec![
            DotStmt::chain_with(EdgeOp::Arrow, &["c", "a"], vec![("type", "c_c")]),
            DotStmt::node("b", vec![("label", "middle")]),
            DotStmt::chain(EdgeOp::Arrow, &["a", "b", "c"]),
        ]
    };
    let forward = load_graph(DotDef::digraph("g", stmts()))?;
    let mut reversed_stmts = stmts();
    reversed_stmts.reverse();
    let reversed = load_graph(DotDef::digraph("g", reversed_stmts))?;

    assert_eq!(
        serde_json::to_string(forward.as_ref())?,
        serde_json::to_string(reversed.as_ref())?
    );
    Ok(())
}

#[test]
fn test_graph_serializes_sorted() -> anyhow::Result<()> {
    let graph = load_graph(DotDef::digraph(
        "g",
        vec![DotStmt::chain_with(
            EdgeOp::Arrow,
            &["b", "a"],
            vec![("type", "seq_or")],
        )],
    ))?;

    let json = serde_json::to_value(graph.as_ref())?;
    assert_eq!(
        json,
        serde_json::json!({
            "name": "g",
            "nodes": [
                { "name": "a", "attributes": {} },
                { "name": "b", "attributes": {} }
            ],
            "edges": [
                { "kind": "directed", "dependency": "sequence_or", "start": "b", "end": "a" }
            ]
        })
    );
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
// Dependency Types
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_dependency_type_aliases() -> anyhow::Result<()> {
    let graph = load_graph(DotDef::digraph(
        "g",
        vec![
            DotStmt::chain_with(EdgeOp::Arrow, &["a", "b"], vec![("type", "seq")]),
            DotStmt::chain_with(EdgeOp::Arrow, &["b", "c"], vec![("type", "sequence_and")]),
            DotStmt::chain_with(EdgeOp::Arrow, &["c", "d"], vec![("type", "c_f")]),
            DotStmt::chain_with(EdgeOp::Arrow, &["d", "e"], vec![("type", "subtask_optional")]),
            DotStmt::chain(EdgeOp::Arrow, &["e", "f"]),
        ],
    ))?;

    let deps: Vec<Option<DependencyType>> = graph.edges.iter().map(|e| e.dependency).collect();
    assert_eq!(
        deps,
        vec![
            Some(DependencyType::Sequence),
            Some(DependencyType::SequenceAnd),
            Some(DependencyType::ConditionalFalse),
            Some(DependencyType::SubtaskOptional),
            None,
        ]
    );
    Ok(())
}

#[test]
fn test_chain_attributes_apply_to_every_edge() -> anyhow::Result<()> {
    let graph = load_graph(DotDef::digraph(
        "g",
        vec![DotStmt::chain_with(
            EdgeOp::Arrow,
            &["a", "b", "c"],
            vec![("type", "st_m")],
        )],
    ))?;

    assert!(graph
        .edges
        .iter()
        .all(|e| e.dependency == Some(DependencyType::SubtaskMandatory)));
    assert_eq!(graph.edges.len(), 2);
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_operator_must_match_graph_kind() {
    let err = graph_error(vec![ast::graph(DotDef::graph(
        "g",
        vec![DotStmt::chain(EdgeOp::Arrow, &["a", "b"])],
    ))]);
    assert_eq!(
        err,
        GraphError::OperatorMismatch {
            graph: "g".into(),
            edge: "a -> b".into(),
        }
    );

    let err = graph_error(vec![ast::graph(DotDef::digraph(
        "d",
        vec![DotStmt::chain(EdgeOp::DoubleLine, &["a", "b"])],
    ))]);
    assert!(matches!(err, GraphError::OperatorMismatch { graph, .. } if graph == "d"));
}

#[test]
fn test_duplicate_type_attribute() {
    let err = graph_error(vec![ast::graph(DotDef::graph(
        "g",
        vec![DotStmt::chain_with(
            EdgeOp::DoubleLine,
            &["a", "b"],
            vec![("type", "seq"), ("type", "st_o")],
        )],
    ))]);
    assert_eq!(
        err,
        GraphError::DuplicateTypeAttribute {
            edge: "a -- b".into()
        }
    );
}

#[test]
fn test_unknown_edge_attribute() {
    let err = graph_error(vec![ast::graph(DotDef::graph(
        "g",
        vec![DotStmt::chain_with(
            EdgeOp::DoubleLine,
            &["a", "b"],
            vec![("color", "red")],
        )],
    ))]);
    assert_eq!(
        err,
        GraphError::UnknownEdgeAttribute {
            edge: "a -- b".into(),
            key: "color".into(),
        }
    );
}

#[test]
fn test_unknown_dependency_type() {
    let err = graph_error(vec![ast::graph(DotDef::digraph(
        "g",
        vec![DotStmt::edge(
            vec![vec!["a", "b"], vec!["c"]],
            EdgeOp::Arrow,
            vec![("type", "maybe")],
        )],
    ))]);
    assert_eq!(
        err,
        GraphError::UnknownDependencyType {
            edge: "a, b -> c".into(),
            value: "maybe".into(),
        }
    );
}

#[test]
fn test_node_naming_a_graph_is_not_a_task() {
    let err = graph_error(vec![
        ast::graph(DotDef::graph(
            "inner",
            vec![DotStmt::chain(EdgeOp::DoubleLine, &["x", "y"])],
        )),
        ast::graph(DotDef::graph(
            "outer",
            vec![DotStmt::chain(EdgeOp::DoubleLine, &["inner", "z"])],
        )),
    ]);
    assert_eq!(
        err,
        GraphError::NotATask {
            name: "inner".into()
        }
    );
}

#[test]
fn test_node_naming_a_non_task_object_is_not_a_task() {
    let err = graph_error(vec![
        ast::object("quest_config", "c", vec![("points", Expr::int(1))]),
        ast::graph(DotDef::graph(
            "g",
            vec![DotStmt::chain(EdgeOp::DoubleLine, &["c", "b"])],
        )),
    ]);
    assert_eq!(err, GraphError::NotATask { name: "c".into() });
}

// ═══════════════════════════════════════════════════════════════════════
// Task Payloads
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_nodes_carry_task_definitions() -> anyhow::Result<()> {
    let env = load(vec![
        ast::graph(DotDef::digraph(
            "quest",
            vec![DotStmt::chain_with(
                EdgeOp::Arrow,
                &["find_key", "open_door"],
                vec![("type", "seq")],
            )],
        )),
        ast::object(
            "task",
            "find_key",
            vec![
                ("description", Expr::string("Find the rusty key")),
                ("points", Expr::int(5)),
            ],
        ),
    ])?;

    let graph = env.graph("quest").unwrap();
    let tasks: Vec<&str> = graph.tasks().map(|(name, _)| name).collect();
    assert_eq!(tasks, vec!["find_key"]);

    let task = graph.node("find_key").unwrap().task.as_ref().unwrap();
    assert_eq!(task.member("points"), Some(&Value::Int(5)));
    assert!(graph.node("open_door").unwrap().task.is_none());
    Ok(())
}

#[test]
fn test_every_graph_definition_is_collected() -> anyhow::Result<()> {
    let env = load(vec![
        ast::graph(DotDef::graph(
            "first",
            vec![DotStmt::chain(EdgeOp::DoubleLine, &["a", "b"])],
        )),
        ast::graph(DotDef::digraph(
            "second",
            vec![DotStmt::node("solo", vec![])],
        )),
    ])?;

    let names: Vec<&str> = env.graphs().iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second"]);
    let second = env.graph("second").unwrap();
    assert_eq!(second.nodes.len(), 1);
    assert!(second.edges.is_empty());
    assert!(matches!(env.global_by_name("first"), Some(Value::Graph(_))));
    Ok(())
}
