//! # Dungeon DSL
//!
//! Core of the dungeon quest language: the type system, a type builder that
//! derives DSL types from Rust types, semantic analysis, a tree-walking
//! interpreter and the interop layer that turns interpreted definitions
//! back into Rust objects and callbacks.
//!
//! ## Architecture
//!
//! - **Type Builder**: `#[derive(DslType)]` host types become DSL aggregates
//! - **Semantic Analysis**: builds the symbol table over all source files
//! - **Interpreter**: evaluates declarations into a runtime environment
//! - **Graph Interpreter**: turns `graph`/`digraph` definitions into task
//!   dependency graphs
//! - **Interop**: prototypes instantiate into host objects, DSL functions
//!   become typed callbacks
//!
//! Parsing is out of scope; programs arrive as [`ast`] trees.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use dungeon_dsl::ast::{self, DotDef, DotStmt, EdgeOp, Expr, Program};
//! use dungeon_dsl::prelude::QuestConfig;
//! use dungeon_dsl::TypeBuilder;
//!
//! let registry = Arc::new(TypeBuilder::new().with_prelude().build());
//! let programs = vec![Program::new(
//!     "level.dng",
//!     vec![
//!         ast::graph(DotDef::graph("g", vec![DotStmt::chain(EdgeOp::DoubleLine, &["A", "B"])])),
//!         ast::object("quest_config", "c", vec![("level_graph", Expr::ident("g"))]),
//!     ],
//! )];
//!
//! let env = dungeon_dsl::load(&programs, registry).unwrap();
//! let config: QuestConfig = env.instantiate("c").unwrap();
//! let graph = config.level_graph.unwrap();
//! assert_eq!(graph.nodes.len(), 2);
//! assert_eq!(graph.edges.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Derived code names this crate by its external path
extern crate self as dungeon_dsl;

pub mod ast;
pub mod builder;
pub mod context;
pub mod error;
pub mod eval;
pub mod graph;
pub mod interop;
pub mod memory;
pub mod prelude;
pub mod runtime;
pub mod semantic;
pub mod symbols;
pub mod types;
pub mod value;

use std::sync::Arc;

// Re-export main types
pub use builder::{TypeBuilder, TypeRegistry};
pub use context::{EvalContext, DEFAULT_MAX_CALL_DEPTH};
pub use dungeon_dsl_derive::DslType;
pub use error::{DslError, EvalError, InteropError, Result, SemanticError};
pub use eval::{ControlFlow, Evaluate, Interpreter};
pub use graph::{DependencyType, EdgeKind, TaskDependencyGraph, TaskEdge, TaskNode};
pub use interop::{CallbackAdapter, DslType, HostValue};
pub use memory::{MemorySpace, ScopeGuard};
pub use runtime::RuntimeEnvironment;
pub use semantic::SemanticAnalyzer;
pub use symbols::SymbolTable;
pub use types::Type;
pub use value::{AggregateValue, FunctionValue, NativeFunction, PrototypeValue, Value};

/// Dungeon DSL version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Analyze and interpret programs in one step.
///
/// # Errors
///
/// Returns every semantic error found, or the first evaluation error.
pub fn load(
    programs: &[ast::Program],
    registry: Arc<TypeRegistry>,
) -> std::result::Result<Arc<RuntimeEnvironment>, DslError> {
    let symbols = SemanticAnalyzer::new(&registry)
        .analyze(programs)
        .map_err(DslError::Semantic)?;
    Ok(Interpreter::interpret(programs, symbols, registry)?)
}
