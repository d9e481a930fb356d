//! Abstract syntax tree consumed by the analyzer and the interpreter
//!
//! The tree is produced by an external parser. Every node kind is a closed
//! variant, so the analyzer and the interpreter handle each kind exhaustively.
//! Identifiers carry a [`NodeId`] that the symbol table uses to associate
//! references with the symbols they denote.
//!
//! The constructor functions in this module let hosts and tests build trees
//! without a parser:
//!
//! ```
//! use dungeon_dsl::ast::{self, Expr, Program};
//!
//! let program = Program::new(
//!     "main.dng",
//!     vec![ast::object("quest_config", "c", vec![("points", Expr::int(10))])],
//! );
//! assert_eq!(program.items.len(), 1);
//! ```

mod dot;

pub use dot::{DotAttr, DotDef, DotEdgeStmt, DotNodeStmt, DotStmt, EdgeOp, GraphKind};

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

static NEXT_NODE_ID: AtomicU32 = AtomicU32::new(1);

/// Process-unique identity of an AST node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Allocate a fresh node id.
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// An identifier occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    /// Node identity
    pub id: NodeId,
    /// The identifier text
    pub name: String,
}

impl Ident {
    /// Create an identifier with a fresh node id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NodeId::fresh(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// One source file.
#[derive(Debug, Clone)]
pub struct Program {
    /// Path of the file the program was parsed from
    pub path: PathBuf,
    /// Top-level declarations in source order
    pub items: Vec<Item>,
}

impl Program {
    /// Create a program.
    pub fn new(path: impl Into<PathBuf>, items: Vec<Item>) -> Self {
        Self {
            path: path.into(),
            items,
        }
    }
}

/// A top-level declaration.
#[derive(Debug, Clone)]
pub enum Item {
    /// `quest_config c { ... }`
    Object(Arc<ObjectDef>),
    /// `entity_type monster { component { ... } }`
    Prototype(Arc<PrototypeDef>),
    /// `graph g { ... }`
    Graph(Arc<DotDef>),
    /// `fn name(params) -> ret { ... }`
    Function(Arc<FnDef>),
}

impl Item {
    /// The identifier this item declares.
    pub fn ident(&self) -> &Ident {
        match self {
            Item::Object(def) => &def.name,
            Item::Prototype(def) => &def.name,
            Item::Graph(def) => &def.name,
            Item::Function(def) => &def.name,
        }
    }
}

/// An object definition: a named instance of an aggregate type.
#[derive(Debug, Clone)]
pub struct ObjectDef {
    /// Type specifier
    pub type_name: Ident,
    /// Object name
    pub name: Ident,
    /// Property assignments
    pub properties: Vec<PropertyDef>,
}

/// `name: expr` inside an object or component definition.
#[derive(Debug, Clone)]
pub struct PropertyDef {
    /// Property name
    pub name: Ident,
    /// Assigned expression
    pub value: Expr,
}

/// An `entity_type` definition made of component definitions.
#[derive(Debug, Clone)]
pub struct PrototypeDef {
    /// Prototype name
    pub name: Ident,
    /// Component definitions
    pub components: Vec<ComponentDef>,
}

/// A component inside an `entity_type` definition.
#[derive(Debug, Clone)]
pub struct ComponentDef {
    /// Component type name
    pub type_name: Ident,
    /// Property assignments
    pub properties: Vec<PropertyDef>,
}

/// A user-defined function.
#[derive(Debug, Clone)]
pub struct FnDef {
    /// Function name
    pub name: Ident,
    /// Parameters
    pub params: Vec<Param>,
    /// Return type name, if any
    pub return_type: Option<Ident>,
    /// Body
    pub body: Block,
}

/// A function parameter.
#[derive(Debug, Clone)]
pub struct Param {
    /// Parameter name
    pub name: Ident,
    /// Type name
    pub ty: Ident,
}

/// A braced statement list.
#[derive(Debug, Clone, Default)]
pub struct Block {
    /// Statements
    pub stmts: Vec<Stmt>,
}

/// A statement.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// Expression statement
    Expr(Expr),
    /// `var name: ty = init;`
    Var(VarDecl),
    /// `return expr;`
    Return(Option<Expr>),
    /// Nested block
    Block(Block),
    /// `if cond stmt else stmt`
    If(IfStmt),
}

/// A variable declaration.
#[derive(Debug, Clone)]
pub struct VarDecl {
    /// Variable name
    pub name: Ident,
    /// Declared type name
    pub ty: Option<Ident>,
    /// Initializer
    pub init: Option<Expr>,
}

/// A conditional statement.
#[derive(Debug, Clone)]
pub struct IfStmt {
    /// Condition
    pub cond: Expr,
    /// Taken when the condition is true
    pub then_branch: Box<Stmt>,
    /// Taken otherwise
    pub else_branch: Option<Box<Stmt>>,
}

/// An expression.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Literal value
    Literal(Literal),
    /// Identifier reference
    Ident(Ident),
    /// `callee(args)`
    Call(CallExpr),
    /// `base.member`
    Member(MemberExpr),
    /// `receiver.method(args)`
    MethodCall(MethodCallExpr),
    /// `lhs op rhs`
    Binary(BinaryExpr),
    /// `op operand`
    Unary(UnaryExpr),
    /// `target = value`
    Assign(AssignExpr),
    /// Inline dot graph definition
    Graph(Arc<DotDef>),
    /// `[a, b, c]`
    List(Vec<Expr>),
    /// `<a, b, c>`
    Set(Vec<Expr>),
}

/// A literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// Boolean
    Bool(bool),
    /// String
    Str(String),
}

/// A function call.
#[derive(Debug, Clone)]
pub struct CallExpr {
    /// Called function
    pub callee: Ident,
    /// Arguments
    pub args: Vec<Expr>,
}

/// Member access.
#[derive(Debug, Clone)]
pub struct MemberExpr {
    /// Accessed value
    pub base: Box<Expr>,
    /// Member name
    pub member: Ident,
}

/// Method call.
#[derive(Debug, Clone)]
pub struct MethodCallExpr {
    /// Receiver
    pub receiver: Box<Expr>,
    /// Method name
    pub method: Ident,
    /// Arguments
    pub args: Vec<Expr>,
}

/// Binary operation.
#[derive(Debug, Clone)]
pub struct BinaryExpr {
    /// Operator
    pub op: BinaryOp,
    /// Left operand
    pub lhs: Box<Expr>,
    /// Right operand
    pub rhs: Box<Expr>,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `and`
    And,
    /// `or`
    Or,
}

/// Unary operation.
#[derive(Debug, Clone)]
pub struct UnaryExpr {
    /// Operator
    pub op: UnaryOp,
    /// Operand
    pub operand: Box<Expr>,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `!`
    Not,
}

/// Assignment.
#[derive(Debug, Clone)]
pub struct AssignExpr {
    /// Identifier or member access
    pub target: Box<Expr>,
    /// Assigned value
    pub value: Box<Expr>,
}

// ═══════════════════════════════════════════════════════════════════════
// Constructors
// ═══════════════════════════════════════════════════════════════════════

impl Expr {
    /// Integer literal
    pub fn int(n: i64) -> Self {
        Expr::Literal(Literal::Int(n))
    }

    /// Float literal
    pub fn float(n: f64) -> Self {
        Expr::Literal(Literal::Float(n))
    }

    /// Boolean literal
    pub fn bool(b: bool) -> Self {
        Expr::Literal(Literal::Bool(b))
    }

    /// String literal
    pub fn string(s: impl Into<String>) -> Self {
        Expr::Literal(Literal::Str(s.into()))
    }

    /// Identifier reference
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(Ident::new(name))
    }

    /// Function call
    pub fn call(callee: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call(CallExpr {
            callee: Ident::new(callee),
            args,
        })
    }

    /// Member access
    pub fn member(base: Expr, member: impl Into<String>) -> Self {
        Expr::Member(MemberExpr {
            base: Box::new(base),
            member: Ident::new(member),
        })
    }

    /// Method call
    pub fn method_call(receiver: Expr, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::MethodCall(MethodCallExpr {
            receiver: Box::new(receiver),
            method: Ident::new(method),
            args,
        })
    }

    /// Binary operation
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(BinaryExpr {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    /// Unary operation
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary(UnaryExpr {
            op,
            operand: Box::new(operand),
        })
    }

    /// Assignment
    pub fn assign(target: Expr, value: Expr) -> Self {
        Expr::Assign(AssignExpr {
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    /// List literal
    pub fn list(entries: Vec<Expr>) -> Self {
        Expr::List(entries)
    }

    /// Set literal
    pub fn set(entries: Vec<Expr>) -> Self {
        Expr::Set(entries)
    }
}

impl Stmt {
    /// Expression statement
    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr(expr)
    }

    /// `var name = init;`
    pub fn var(name: impl Into<String>, init: Expr) -> Self {
        Stmt::Var(VarDecl {
            name: Ident::new(name),
            ty: None,
            init: Some(init),
        })
    }

    /// `return expr;`
    pub fn ret(expr: Expr) -> Self {
        Stmt::Return(Some(expr))
    }

    /// `if cond then else otherwise`
    pub fn if_else(cond: Expr, then_branch: Stmt, else_branch: Option<Stmt>) -> Self {
        Stmt::If(IfStmt {
            cond,
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        })
    }
}

impl Block {
    /// Create a block.
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }
}

/// Object definition item.
pub fn object(type_name: &str, name: &str, properties: Vec<(&str, Expr)>) -> Item {
    Item::Object(Arc::new(ObjectDef {
        type_name: Ident::new(type_name),
        name: Ident::new(name),
        properties: property_list(properties),
    }))
}

/// `entity_type` definition item.
pub fn prototype(name: &str, components: Vec<(&str, Vec<(&str, Expr)>)>) -> Item {
    Item::Prototype(Arc::new(PrototypeDef {
        name: Ident::new(name),
        components: components
            .into_iter()
            .map(|(type_name, properties)| ComponentDef {
                type_name: Ident::new(type_name),
                properties: property_list(properties),
            })
            .collect(),
    }))
}

/// Function definition item. Parameters are `(name, type)` pairs.
pub fn function(
    name: &str,
    params: Vec<(&str, &str)>,
    return_type: Option<&str>,
    body: Vec<Stmt>,
) -> Item {
    Item::Function(Arc::new(FnDef {
        name: Ident::new(name),
        params: params
            .into_iter()
            .map(|(name, ty)| Param {
                name: Ident::new(name),
                ty: Ident::new(ty),
            })
            .collect(),
        return_type: return_type.map(Ident::new),
        body: Block::new(body),
    }))
}

/// Graph definition item.
pub fn graph(def: DotDef) -> Item {
    Item::Graph(Arc::new(def))
}

fn property_list(properties: Vec<(&str, Expr)>) -> Vec<PropertyDef> {
    properties
        .into_iter()
        .map(|(name, value)| PropertyDef {
            name: Ident::new(name),
            value,
        })
        .collect()
}
