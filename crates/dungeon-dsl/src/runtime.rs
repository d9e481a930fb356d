//! Runtime environment of a loaded program
//!
//! Holds everything interpretation produced: the symbol table from semantic
//! analysis, the shared type registry, the value of every top-level
//! declaration, named prototypes and the graphs built from dot definitions.
//! Hosts use it to instantiate prototypes into Rust objects and to wrap DSL
//! functions into callback adapters.

use std::any::TypeId;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::builder::TypeRegistry;
use crate::error::InteropError;
use crate::graph::TaskDependencyGraph;
use crate::interop::{CallbackAdapter, HostValue};
use crate::symbols::{ScopeId, SymbolId, SymbolTable};
use crate::types::{AggregateType, Type};
use crate::value::{PrototypeValue, Value};

/// Result of interpreting a set of programs.
#[derive(Debug, Clone)]
pub struct RuntimeEnvironment {
    symbols: SymbolTable,
    registry: Arc<TypeRegistry>,
    globals: IndexMap<SymbolId, Value>,
    prototypes: IndexMap<String, Arc<PrototypeValue>>,
    graphs: Vec<Arc<TaskDependencyGraph>>,
}

impl RuntimeEnvironment {
    /// Create an empty environment over a registry.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self::with_symbols(SymbolTable::new(), registry)
    }

    /// Create an environment for an analyzed symbol table.
    pub fn with_symbols(symbols: SymbolTable, registry: Arc<TypeRegistry>) -> Self {
        Self {
            symbols,
            registry,
            globals: IndexMap::new(),
            prototypes: IndexMap::new(),
            graphs: Vec::new(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Symbols and Types
    // ═══════════════════════════════════════════════════════════════════

    /// The symbol table built by semantic analysis.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// The shared type registry.
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// The scope of a source file, or `None` if the file was not loaded.
    pub fn file_scope(&self, path: &Path) -> Option<ScopeId> {
        self.symbols.file_scope(path)
    }

    /// Aggregate definition by DSL name.
    pub fn aggregate(&self, name: &str) -> Option<&AggregateType> {
        self.registry.aggregate(name)
    }

    /// DSL type of a registered host type.
    pub fn dsl_type_of<T: 'static>(&self) -> Option<Type> {
        self.registry.dsl_type_of::<T>()
    }

    /// Host type registered under a DSL name.
    pub fn host_type_of(&self, name: &str) -> Option<TypeId> {
        self.registry.host_type_of(name)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Values
    // ═══════════════════════════════════════════════════════════════════

    /// Value of a top-level declaration.
    pub fn global(&self, symbol: SymbolId) -> Option<&Value> {
        self.globals.get(&symbol)
    }

    /// Value of a top-level declaration by name, searching the global scope
    /// and then every file scope.
    pub fn global_by_name(&self, name: &str) -> Option<&Value> {
        let global = self.symbols.global_scope();
        std::iter::once(global)
            .chain(self.symbols.file_scopes().map(|(_, scope)| scope))
            .filter_map(|scope| self.symbols.resolve_local(scope, name))
            .find_map(|symbol| self.globals.get(&symbol))
    }

    pub(crate) fn set_global(&mut self, symbol: SymbolId, value: Value) {
        self.globals.insert(symbol, value);
    }

    /// Prototype by name, or `None`.
    pub fn lookup_prototype(&self, name: &str) -> Option<&PrototypeValue> {
        self.prototypes.get(name).map(Arc::as_ref)
    }

    /// All prototypes in definition order.
    pub fn prototypes(&self) -> impl Iterator<Item = &PrototypeValue> {
        self.prototypes.values().map(Arc::as_ref)
    }

    /// Register a prototype. Fails if the name is taken.
    pub(crate) fn add_prototype(&mut self, prototype: Arc<PrototypeValue>) -> bool {
        if self.prototypes.contains_key(&prototype.name) {
            return false;
        }
        self.prototypes.insert(prototype.name.clone(), prototype);
        true
    }

    /// Graphs built from dot definitions, in build order.
    pub fn graphs(&self) -> &[Arc<TaskDependencyGraph>] {
        &self.graphs
    }

    /// Graph by definition name.
    pub fn graph(&self, name: &str) -> Option<&Arc<TaskDependencyGraph>> {
        self.graphs.iter().find(|g| g.name == name)
    }

    pub(crate) fn add_graph(&mut self, graph: Arc<TaskDependencyGraph>) {
        self.graphs.push(graph);
    }

    // ═══════════════════════════════════════════════════════════════════
    // Host Interop
    // ═══════════════════════════════════════════════════════════════════

    /// Instantiate a named prototype into a host object.
    pub fn instantiate<T: HostValue>(self: &Arc<Self>, name: &str) -> Result<T, InteropError> {
        let prototype =
            self.prototypes
                .get(name)
                .cloned()
                .ok_or_else(|| InteropError::UnknownPrototype {
                    name: name.to_string(),
                })?;
        T::from_value(&Value::Prototype(prototype), self)
    }

    /// Translate any value into a host object.
    pub fn instantiate_value<T: HostValue>(
        self: &Arc<Self>,
        value: &Value,
    ) -> Result<T, InteropError> {
        T::from_value(value, self)
    }

    /// Wrap a function value into a callback adapter chosen by its signature.
    pub fn build_adapter(self: &Arc<Self>, function: &Value) -> Result<CallbackAdapter, InteropError> {
        CallbackAdapter::build(function, Arc::clone(self))
    }

    /// Wrap a function value for a host slot that always passes three arguments.
    pub fn build_tri_consumer(
        self: &Arc<Self>,
        function: &Value,
    ) -> Result<CallbackAdapter, InteropError> {
        CallbackAdapter::build_tri_consumer(function, Arc::clone(self))
    }
}
