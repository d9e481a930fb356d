//! Task dependency graphs
//!
//! A [`TaskDependencyGraph`] is the immutable result of interpreting one dot
//! definition. Nodes are sorted by name and edges by `(start, end, kind)`,
//! so two definitions listing the same statements in a different order
//! produce identical graphs.

mod builder;

pub use builder::build_graph;

use indexmap::IndexMap;
use serde::Serialize;

use crate::value::Value;

/// Whether an edge has a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Declared with `->`
    Directed,
    /// Declared with `--`
    Undirected,
}

impl EdgeKind {
    /// Operator text of this kind.
    pub fn operator(self) -> &'static str {
        match self {
            EdgeKind::Directed => "->",
            EdgeKind::Undirected => "--",
        }
    }
}

/// How the end task of an edge depends on its start task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    /// `seq` / `sequence`
    Sequence,
    /// `st_m` / `subtask_mandatory`
    SubtaskMandatory,
    /// `st_o` / `subtask_optional`
    SubtaskOptional,
    /// `c_c` / `conditional_correct`
    ConditionalCorrect,
    /// `c_f` / `conditional_false`
    ConditionalFalse,
    /// `seq_and` / `sequence_and`
    SequenceAnd,
    /// `seq_or` / `sequence_or`
    SequenceOr,
}

impl DependencyType {
    /// Parse the value of an edge's `type` attribute.
    pub fn from_attribute(value: &str) -> Option<Self> {
        let ty = match value {
            "seq" | "sequence" => DependencyType::Sequence,
            "st_m" | "subtask_mandatory" => DependencyType::SubtaskMandatory,
            "st_o" | "subtask_optional" => DependencyType::SubtaskOptional,
            "c_c" | "conditional_correct" => DependencyType::ConditionalCorrect,
            "c_f" | "conditional_false" => DependencyType::ConditionalFalse,
            "seq_and" | "sequence_and" => DependencyType::SequenceAnd,
            "seq_or" | "sequence_or" => DependencyType::SequenceOr,
            _ => return None,
        };
        Some(ty)
    }
}

/// A graph node, optionally carrying the task it names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskNode {
    /// Node name
    pub name: String,
    /// Attributes from node statements, later statements overriding
    pub attributes: IndexMap<String, String>,
    /// Value of the task definition the name refers to
    #[serde(skip)]
    pub task: Option<Value>,
}

impl TaskNode {
    /// A name-only node.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
            task: None,
        }
    }
}

/// A graph edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskEdge {
    /// Directed or undirected
    pub kind: EdgeKind,
    /// Dependency label from the `type` attribute
    pub dependency: Option<DependencyType>,
    /// Start node name (lower name first for undirected edges)
    pub start: String,
    /// End node name
    pub end: String,
}

impl TaskEdge {
    /// Canonical edge name, e.g. `a -> b`.
    pub fn name(&self) -> String {
        format!("{} {} {}", self.start, self.kind.operator(), self.end)
    }

    /// Whether this edge connects `a` and `b`, honoring direction.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        match self.kind {
            EdgeKind::Directed => self.start == a && self.end == b,
            EdgeKind::Undirected => {
                (self.start == a && self.end == b) || (self.start == b && self.end == a)
            }
        }
    }
}

/// Immutable dependency graph with sorted, de-duplicated nodes and edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDependencyGraph {
    /// Name of the dot definition
    pub name: String,
    /// Nodes sorted by name
    pub nodes: Vec<TaskNode>,
    /// Edges sorted by start, end and kind
    pub edges: Vec<TaskEdge>,
}

impl TaskDependencyGraph {
    /// Look up a node by name.
    pub fn node(&self, name: &str) -> Option<&TaskNode> {
        self.nodes
            .binary_search_by(|node| node.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.nodes[i])
    }

    /// The edge connecting `a` and `b`, if any.
    pub fn edge(&self, a: &str, b: &str) -> Option<&TaskEdge> {
        self.edges.iter().find(|edge| edge.connects(a, b))
    }

    /// Names of the nodes reachable from `name` over one edge.
    pub fn successors<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges.iter().filter_map(move |edge| {
            if edge.start == name {
                Some(edge.end.as_str())
            } else if edge.kind == EdgeKind::Undirected && edge.end == name {
                Some(edge.start.as_str())
            } else {
                None
            }
        })
    }

    /// Nodes that carry a task value.
    pub fn tasks(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.nodes
            .iter()
            .filter_map(|node| node.task.as_ref().map(|task| (node.name.as_str(), task)))
    }
}
