//! Symbol table with hierarchical scopes
//!
//! Symbols and scopes live in arenas owned by the [`SymbolTable`] and are
//! addressed by [`SymbolId`] and [`ScopeId`]. Symbol identity is the id, not
//! the name: two symbols named `x` in different scopes are distinct. A failed
//! lookup yields `None`, which can never be confused with a real symbol.
//!
//! # Example
//!
//! ```
//! use dungeon_dsl::symbols::{SymbolKind, SymbolTable};
//! use dungeon_dsl::types::Type;
//!
//! let mut table = SymbolTable::new();
//! let global = table.global_scope();
//! let outer = table.define(global, "x", SymbolKind::Scalar, Type::INT).unwrap();
//!
//! let inner_scope = table.new_scope(global);
//! let inner = table.define(inner_scope, "x", SymbolKind::Scalar, Type::STRING).unwrap();
//!
//! assert_eq!(table.resolve(inner_scope, "x"), Some(inner));
//! assert_eq!(table.resolve(global, "x"), Some(outer));
//! assert_eq!(table.resolve(global, "y"), None);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::ast::NodeId;
use crate::error::SemanticError;
use crate::types::Type;

/// Handle of a symbol in a [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

/// Handle of a scope in a [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

/// What a symbol denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// A plain value: object, graph, variable, parameter
    Scalar,
    /// A symbol owning a scope of members (aggregate types)
    Scoped,
    /// A user-defined or native function
    Function,
    /// A built-in type name
    Type,
}

/// A declared name.
#[derive(Debug, Clone)]
pub struct Symbol {
    /// Declared name
    pub name: String,
    /// Symbol kind
    pub kind: SymbolKind,
    /// Scope the symbol was declared in
    pub scope: ScopeId,
    /// Type of the symbol (the type itself for type symbols)
    pub ty: Type,
    /// Scope owned by this symbol (members of a type, body of a function)
    pub own_scope: Option<ScopeId>,
}

#[derive(Debug, Clone)]
struct Scope {
    parent: Option<ScopeId>,
    symbols: IndexMap<String, SymbolId>,
}

/// Arena of symbols and scopes plus the AST node associations.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    scopes: Vec<Scope>,
    global: ScopeId,
    file_scopes: IndexMap<PathBuf, ScopeId>,

    /// Identifier node → denoted symbol, in attachment order
    node_symbols: IndexMap<NodeId, SymbolId>,
    /// Reverse index of `node_symbols`
    symbol_nodes: HashMap<SymbolId, Vec<NodeId>>,
    /// Declaring node of each symbol
    creation_nodes: HashMap<SymbolId, NodeId>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Create a table holding only the global scope.
    pub fn new() -> Self {
        Self {
            symbols: Vec::new(),
            scopes: vec![Scope {
                parent: None,
                symbols: IndexMap::new(),
            }],
            global: ScopeId(0),
            file_scopes: IndexMap::new(),
            node_symbols: IndexMap::new(),
            symbol_nodes: HashMap::new(),
            creation_nodes: HashMap::new(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Scopes
    // ═══════════════════════════════════════════════════════════════════

    /// The root scope.
    pub fn global_scope(&self) -> ScopeId {
        self.global
    }

    /// Create a child scope of `parent`.
    pub fn new_scope(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent: Some(parent),
            symbols: IndexMap::new(),
        });
        id
    }

    /// Create (or return the existing) scope of a source file.
    ///
    /// File scopes chain to the global scope.
    pub fn add_file_scope(&mut self, path: impl Into<PathBuf>) -> ScopeId {
        let path = path.into();
        if let Some(&scope) = self.file_scopes.get(&path) {
            return scope;
        }
        let scope = self.new_scope(self.global);
        self.file_scopes.insert(path, scope);
        scope
    }

    /// The scope of a source file, or `None` if no such file was analyzed.
    pub fn file_scope(&self, path: &Path) -> Option<ScopeId> {
        self.file_scopes.get(path).copied()
    }

    /// All file scopes in analysis order.
    pub fn file_scopes(&self) -> impl Iterator<Item = (&Path, ScopeId)> {
        self.file_scopes.iter().map(|(p, s)| (p.as_path(), *s))
    }

    /// The parent of a scope (`None` for the global scope).
    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.0 as usize].parent
    }

    /// Symbols declared directly in a scope, in declaration order.
    pub fn symbols_in(&self, scope: ScopeId) -> impl Iterator<Item = SymbolId> + '_ {
        self.scopes[scope.0 as usize].symbols.values().copied()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Definition and Resolution
    // ═══════════════════════════════════════════════════════════════════

    /// Declare a name in `scope`.
    ///
    /// Fails if the name already exists in that exact scope. Declaring a name
    /// that exists in an enclosing scope shadows it.
    pub fn define(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: SymbolKind,
        ty: Type,
    ) -> Result<SymbolId, SemanticError> {
        if self.scopes[scope.0 as usize].symbols.contains_key(name) {
            return Err(SemanticError::Redeclaration {
                name: name.to_string(),
            });
        }
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol {
            name: name.to_string(),
            kind,
            scope,
            ty,
            own_scope: None,
        });
        self.scopes[scope.0 as usize]
            .symbols
            .insert(name.to_string(), id);
        Ok(id)
    }

    /// Give a symbol its own scope (type members, function body).
    pub fn set_own_scope(&mut self, symbol: SymbolId, scope: ScopeId) {
        self.symbols[symbol.0 as usize].own_scope = Some(scope);
    }

    /// Resolve a name from `scope` outwards through the parent chain.
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id.0 as usize];
            if let Some(&symbol) = scope.symbols.get(name) {
                return Some(symbol);
            }
            current = scope.parent;
        }
        None
    }

    /// Resolve a name in `scope` only.
    pub fn resolve_local(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scopes[scope.0 as usize].symbols.get(name).copied()
    }

    /// Access a symbol.
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    /// Number of symbols in the table.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the table holds no symbols.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    // ═══════════════════════════════════════════════════════════════════
    // AST Associations
    // ═══════════════════════════════════════════════════════════════════

    /// Associate an identifier node with the symbol it denotes.
    ///
    /// A node denotes at most one symbol; attaching it again replaces the
    /// earlier association.
    pub fn attach(&mut self, node: NodeId, symbol: SymbolId) {
        if let Some(previous) = self.node_symbols.insert(node, symbol) {
            if previous == symbol {
                return;
            }
            if let Some(nodes) = self.symbol_nodes.get_mut(&previous) {
                nodes.retain(|n| *n != node);
            }
        }
        self.symbol_nodes.entry(symbol).or_default().push(node);
    }

    /// Record the node that declared a symbol. Also attaches it.
    pub fn set_creation_node(&mut self, symbol: SymbolId, node: NodeId) {
        self.creation_nodes.insert(symbol, node);
        self.attach(node, symbol);
    }

    /// The symbol an identifier node denotes.
    pub fn symbol_for(&self, node: NodeId) -> Option<SymbolId> {
        self.node_symbols.get(&node).copied()
    }

    /// All nodes referring to a symbol, in attachment order.
    pub fn nodes_of(&self, symbol: SymbolId) -> &[NodeId] {
        self.symbol_nodes
            .get(&symbol)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The node that declared a symbol.
    pub fn creation_node(&self, symbol: SymbolId) -> Option<NodeId> {
        self.creation_nodes.get(&symbol).copied()
    }

    /// All node associations in attachment order.
    pub fn associations(&self) -> impl Iterator<Item = (NodeId, SymbolId)> + '_ {
        self.node_symbols.iter().map(|(n, s)| (*n, *s))
    }
}
