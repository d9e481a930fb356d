//! Dot sub-language nodes

use super::Ident;

/// Kind of a graph definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphKind {
    /// `graph`: undirected edges (`--`)
    Graph,
    /// `digraph`: directed edges (`->`)
    Digraph,
}

/// Edge operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeOp {
    /// `->`
    Arrow,
    /// `--`
    DoubleLine,
}

impl EdgeOp {
    /// Operator text.
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeOp::Arrow => "->",
            EdgeOp::DoubleLine => "--",
        }
    }
}

/// `graph name { stmts }`
#[derive(Debug, Clone)]
pub struct DotDef {
    /// Graph name
    pub name: Ident,
    /// Graph kind
    pub kind: GraphKind,
    /// Node and edge statements in source order
    pub stmts: Vec<DotStmt>,
}

impl DotDef {
    /// Create a graph definition.
    pub fn new(kind: GraphKind, name: &str, stmts: Vec<DotStmt>) -> Self {
        Self {
            name: Ident::new(name),
            kind,
            stmts,
        }
    }

    /// Create an undirected graph definition.
    pub fn graph(name: &str, stmts: Vec<DotStmt>) -> Self {
        Self::new(GraphKind::Graph, name, stmts)
    }

    /// Create a directed graph definition.
    pub fn digraph(name: &str, stmts: Vec<DotStmt>) -> Self {
        Self::new(GraphKind::Digraph, name, stmts)
    }
}

/// A statement inside a graph definition.
#[derive(Debug, Clone)]
pub enum DotStmt {
    /// `A [attrs]`
    Node(DotNodeStmt),
    /// `A -> B -> C [attrs]`
    Edge(DotEdgeStmt),
}

/// A node statement.
#[derive(Debug, Clone)]
pub struct DotNodeStmt {
    /// Node identifier
    pub id: Ident,
    /// Attributes
    pub attrs: Vec<DotAttr>,
}

/// An edge statement.
///
/// `groups[i]` and `groups[i + 1]` are joined by `ops[i]`; every id of the
/// left group is connected to every id of the right group.
#[derive(Debug, Clone)]
pub struct DotEdgeStmt {
    /// Operand id lists (`A, B -> C` has groups `[A, B]` and `[C]`)
    pub groups: Vec<Vec<Ident>>,
    /// Operators between consecutive groups
    pub ops: Vec<EdgeOp>,
    /// Attributes applying to every edge of the statement
    pub attrs: Vec<DotAttr>,
}

/// `key=value`
#[derive(Debug, Clone)]
pub struct DotAttr {
    /// Attribute key
    pub key: Ident,
    /// Attribute value
    pub value: Ident,
}

impl DotAttr {
    /// Create an attribute.
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: Ident::new(key),
            value: Ident::new(value),
        }
    }
}

impl DotStmt {
    /// Node statement.
    pub fn node(id: &str, attrs: Vec<(&str, &str)>) -> Self {
        DotStmt::Node(DotNodeStmt {
            id: Ident::new(id),
            attrs: attrs.into_iter().map(|(k, v)| DotAttr::new(k, v)).collect(),
        })
    }

    /// Edge chain `ids[0] op ids[1] op ...` with one id per operand.
    pub fn chain(op: EdgeOp, ids: &[&str]) -> Self {
        Self::chain_with(op, ids, vec![])
    }

    /// Edge chain with attributes.
    pub fn chain_with(op: EdgeOp, ids: &[&str], attrs: Vec<(&str, &str)>) -> Self {
        let groups = ids.iter().map(|id| vec![*id]).collect();
        Self::edge(groups, op, attrs)
    }

    /// Edge statement over id lists, joined by the same operator.
    pub fn edge(groups: Vec<Vec<&str>>, op: EdgeOp, attrs: Vec<(&str, &str)>) -> Self {
        let ops = vec![op; groups.len().saturating_sub(1)];
        DotStmt::Edge(DotEdgeStmt {
            groups: groups
                .into_iter()
                .map(|group| group.into_iter().map(Ident::new).collect())
                .collect(),
            ops,
            attrs: attrs.into_iter().map(|(k, v)| DotAttr::new(k, v)).collect(),
        })
    }

    /// Identifiers referenced by this statement.
    pub fn idents(&self) -> Vec<&Ident> {
        match self {
            DotStmt::Node(node) => vec![&node.id],
            DotStmt::Edge(edge) => edge.groups.iter().flatten().collect(),
        }
    }
}
