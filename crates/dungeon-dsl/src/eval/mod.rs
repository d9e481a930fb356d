//! Tree-walking interpreter
//!
//! The interpreter turns analyzed programs into a [`RuntimeEnvironment`].
//! Top-level declarations are materialized on demand: the first reference to
//! an object, prototype, graph or function evaluates its definition, and the
//! final walk over every program evaluates whatever nobody referenced.

pub mod assign;
pub mod binary;
pub mod call;
pub mod collection;
pub mod control;
pub mod decl;
pub mod ident;
pub mod literal;
pub mod member;
pub mod stmt;
pub mod unary;

pub use control::ControlFlow;

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::Arc;

use tracing::debug;

use crate::ast::{Expr, Ident, Item, Program};
use crate::builder::TypeRegistry;
use crate::context::EvalContext;
use crate::error::{type_name, EvalError};
use crate::memory::MemorySpace;
use crate::runtime::RuntimeEnvironment;
use crate::symbols::{Symbol, SymbolId, SymbolTable};
use crate::types::Type;
use crate::value::Value;

/// Trait for evaluating AST nodes to values.
///
/// This is the core abstraction for the tree-walking interpreter.
/// Each expression node type implements this trait.
pub trait Evaluate {
    /// Evaluate this node with the given local memory.
    fn eval(&self, interp: &mut Interpreter, memory: &mut MemorySpace) -> Result<Value, EvalError>;
}

// ═══════════════════════════════════════════════════════════════════════
// Main Expression Dispatcher
// ═══════════════════════════════════════════════════════════════════════

impl Evaluate for Expr {
    fn eval(&self, interp: &mut Interpreter, memory: &mut MemorySpace) -> Result<Value, EvalError> {
        match self {
            Expr::Literal(lit) => lit.eval(interp, memory),
            Expr::Ident(ident) => ident.eval(interp, memory),
            Expr::Call(call) => call.eval(interp, memory),
            Expr::Member(expr) => expr.eval(interp, memory),
            Expr::MethodCall(call) => call.eval(interp, memory),
            Expr::Binary(expr) => expr.eval(interp, memory),
            Expr::Unary(expr) => expr.eval(interp, memory),
            Expr::Assign(expr) => expr.eval(interp, memory),
            Expr::Graph(def) => interp.eval_graph(def, memory),
            Expr::List(entries) => interp.eval_list(entries, memory),
            Expr::Set(entries) => interp.eval_set(entries, memory),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Interpreter
// ═══════════════════════════════════════════════════════════════════════

/// Interpreter over a runtime environment.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use dungeon_dsl::ast::{self, Expr, Program};
/// use dungeon_dsl::eval::Interpreter;
/// use dungeon_dsl::semantic::SemanticAnalyzer;
/// use dungeon_dsl::{TypeBuilder, Value};
///
/// let registry = Arc::new(TypeBuilder::new().with_prelude().build());
/// let programs = vec![Program::new(
///     "quest.dng",
///     vec![ast::object("quest_config", "c", vec![("points", Expr::int(10))])],
/// )];
/// let symbols = SemanticAnalyzer::new(&registry).analyze(&programs).unwrap();
///
/// let env = Interpreter::interpret(&programs, symbols, registry).unwrap();
/// let c = env.global_by_name("c").unwrap();
/// assert_eq!(c.member("points"), Some(&Value::Int(10)));
/// ```
pub struct Interpreter {
    env: Arc<RuntimeEnvironment>,
    ctx: EvalContext,
    output: Box<dyn Write + Send>,
    /// Top-level declarations not yet materialized
    decls: HashMap<SymbolId, Item>,
    /// Declarations currently being evaluated
    in_progress: HashSet<SymbolId>,
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("ctx", &self.ctx)
            .field("pending", &self.decls.len())
            .finish_non_exhaustive()
    }
}

impl Interpreter {
    /// Create an interpreter writing to stdout.
    pub fn new(env: Arc<RuntimeEnvironment>) -> Self {
        Self::with_context(env, EvalContext::default())
    }

    /// Create an interpreter with custom limits.
    pub fn with_context(env: Arc<RuntimeEnvironment>, ctx: EvalContext) -> Self {
        Self {
            env,
            ctx,
            output: Box::new(std::io::stdout()),
            decls: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Redirect the output of `print`.
    pub fn with_output(mut self, output: impl Write + Send + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    /// Interpret analyzed programs with default settings.
    pub fn interpret(
        programs: &[Program],
        symbols: SymbolTable,
        registry: Arc<TypeRegistry>,
    ) -> Result<Arc<RuntimeEnvironment>, EvalError> {
        let env = RuntimeEnvironment::with_symbols(symbols, registry);
        Self::new(Arc::new(env)).run(programs)
    }

    /// Evaluate every top-level declaration of `programs`.
    ///
    /// The environment must hold the symbol table the analyzer built for
    /// exactly these programs.
    pub fn run(mut self, programs: &[Program]) -> Result<Arc<RuntimeEnvironment>, EvalError> {
        self.bind_natives();

        let mut order = Vec::new();
        for program in programs {
            for item in &program.items {
                let symbol = self.symbol_of(item.ident())?;
                self.decls.insert(symbol, item.clone());
                order.push(symbol);
            }
        }

        for symbol in order {
            self.global_value(symbol)?;
        }

        debug!(
            prototypes = self.env.prototypes().count(),
            graphs = self.env.graphs().len(),
            "interpretation finished"
        );
        Ok(self.env)
    }

    /// Call a function value with already-evaluated arguments.
    pub fn invoke(&mut self, function: &Value, args: Vec<Value>) -> Result<Value, EvalError> {
        let mut memory = self.memory();
        self.invoke_value(function, args, &mut memory)
    }

    /// The environment being built or run.
    pub fn env(&self) -> &Arc<RuntimeEnvironment> {
        &self.env
    }

    /// Evaluation settings.
    pub fn context(&self) -> &EvalContext {
        &self.ctx
    }

    // ═══════════════════════════════════════════════════════════════════
    // Symbols
    // ═══════════════════════════════════════════════════════════════════

    /// The symbol an identifier was resolved to during analysis.
    pub(crate) fn symbol_of(&self, ident: &Ident) -> Result<SymbolId, EvalError> {
        self.env
            .symbols()
            .symbol_for(ident.id)
            .ok_or_else(|| EvalError::Unresolved {
                name: ident.name.clone(),
            })
    }

    pub(crate) fn symbol(&self, id: SymbolId) -> &Symbol {
        self.env.symbols().symbol(id)
    }

    /// A fresh memory space honoring the configured call depth.
    fn memory(&self) -> MemorySpace {
        MemorySpace::with_max_call_depth(self.ctx.max_call_depth)
    }

    /// Bind every native function symbol to its callable.
    fn bind_natives(&mut self) {
        let global = self.env.symbols().global_scope();
        let bindings: Vec<(SymbolId, Value)> = self
            .env
            .registry()
            .functions()
            .filter_map(|native| {
                self.env
                    .symbols()
                    .resolve_local(global, &native.name)
                    .map(|symbol| (symbol, Value::Native(native.clone())))
            })
            .collect();
        let env = Arc::make_mut(&mut self.env);
        for (symbol, value) in bindings {
            env.set_global(symbol, value);
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Top-Level Declarations
    // ═══════════════════════════════════════════════════════════════════

    /// Value of a top-level symbol, materializing its declaration if needed.
    pub(crate) fn global_value(&mut self, symbol: SymbolId) -> Result<Value, EvalError> {
        if let Some(value) = self.env.global(symbol) {
            return Ok(value.clone());
        }
        let Some(item) = self.decls.get(&symbol).cloned() else {
            return Err(EvalError::UndefinedValue {
                name: self.symbol(symbol).name.clone(),
            });
        };
        if !self.in_progress.insert(symbol) {
            return Err(EvalError::CyclicDefinition {
                name: self.symbol(symbol).name.clone(),
            });
        }

        let mut memory = self.memory();
        let result = self.eval_item(&item, &mut memory);
        self.in_progress.remove(&symbol);
        let value = result?;

        debug!(name = %item.ident(), value = ?value, "materialized declaration");
        self.decls.remove(&symbol);
        Arc::make_mut(&mut self.env).set_global(symbol, value.clone());
        Ok(value)
    }
}

/// Fail unless `value` may be stored where `expected` is declared.
///
/// `none` fits everywhere. Function values stored in callback members are
/// checked later, when a host adapter is built for them.
pub(crate) fn check_type(
    expected: &Type,
    value: &Value,
    what: impl FnOnce() -> String,
) -> Result<(), EvalError> {
    let deferred = value.is_callable() && expected.as_function().is_some();
    if value.is_none() || *expected == Type::NONE || deferred || expected.accepts(&value.ty()) {
        return Ok(());
    }
    Err(EvalError::TypeError {
        message: format!(
            "{} expects `{}`, found `{}`",
            what(),
            expected,
            type_name(value)
        ),
    })
}
