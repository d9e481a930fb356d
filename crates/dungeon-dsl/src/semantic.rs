//! Semantic analysis: builds the symbol table for a set of programs
//!
//! The global scope is seeded with the built-in types, every aggregate of the
//! registry (with a member scope) and every native function. Each program
//! gets a file scope. Analysis runs in two passes so declarations can refer
//! to each other in any order:
//!
//! 1. bind every top-level declaration and function parameter,
//! 2. resolve property names, expressions, function bodies and dot node ids.
//!
//! Errors are collected rather than returned on first failure.

use tracing::debug;

use crate::ast::{
    ComponentDef, DotDef, Expr, FnDef, Ident, Item, ObjectDef, Program, PropertyDef, Stmt,
};
use crate::builder::TypeRegistry;
use crate::error::SemanticError;
use crate::symbols::{ScopeId, SymbolId, SymbolKind, SymbolTable};
use crate::types::{BuiltInType, Type};

/// Builds a [`SymbolTable`] from programs.
///
/// # Example
///
/// ```
/// use dungeon_dsl::ast::{self, Expr, Program};
/// use dungeon_dsl::error::SemanticError;
/// use dungeon_dsl::semantic::SemanticAnalyzer;
/// use dungeon_dsl::TypeBuilder;
///
/// let registry = TypeBuilder::new().with_prelude().build();
/// let programs = vec![Program::new(
///     "quest.dng",
///     vec![ast::object("quest_config", "c", vec![("colour", Expr::int(1))])],
/// )];
///
/// let errors = SemanticAnalyzer::new(&registry).analyze(&programs).unwrap_err();
/// assert_eq!(
///     errors,
///     vec![SemanticError::UnknownProperty {
///         property: "colour".into(),
///         type_name: "quest_config".into(),
///     }]
/// );
/// ```
#[derive(Debug)]
pub struct SemanticAnalyzer<'r> {
    registry: &'r TypeRegistry,
    table: SymbolTable,
    errors: Vec<SemanticError>,
}

impl<'r> SemanticAnalyzer<'r> {
    /// Create an analyzer whose global scope reflects `registry`.
    pub fn new(registry: &'r TypeRegistry) -> Self {
        let mut analyzer = Self {
            registry,
            table: SymbolTable::new(),
            errors: Vec::new(),
        };
        analyzer.seed_global_scope();
        analyzer
    }

    /// Analyze programs, returning the symbol table or every error found.
    pub fn analyze(mut self, programs: &[Program]) -> Result<SymbolTable, Vec<SemanticError>> {
        let scopes: Vec<ScopeId> = programs
            .iter()
            .map(|program| self.table.add_file_scope(program.path.clone()))
            .collect();

        for (program, &scope) in programs.iter().zip(&scopes) {
            for item in &program.items {
                self.declare_item(item, scope);
            }
        }
        for (program, &scope) in programs.iter().zip(&scopes) {
            for item in &program.items {
                self.resolve_item(item, scope);
            }
        }

        debug!(
            files = programs.len(),
            symbols = self.table.len(),
            errors = self.errors.len(),
            "semantic analysis finished"
        );
        if self.errors.is_empty() {
            Ok(self.table)
        } else {
            Err(self.errors)
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Global Scope
    // ═══════════════════════════════════════════════════════════════════

    fn seed_global_scope(&mut self) {
        let global = self.table.global_scope();

        for builtin in BuiltInType::ALL {
            self.define(global, builtin.name(), SymbolKind::Type, Type::BuiltIn(builtin));
        }

        let registry = self.registry;
        for aggregate in registry.aggregates() {
            let Some(symbol) =
                self.define(global, &aggregate.name, SymbolKind::Scoped, aggregate.as_type())
            else {
                continue;
            };
            let members = self.table.new_scope(global);
            self.table.set_own_scope(symbol, members);
            for member in aggregate.members.values() {
                self.define(members, &member.name, SymbolKind::Scalar, member.ty.clone());
            }
        }

        for native in registry.functions() {
            self.define(
                global,
                &native.name,
                SymbolKind::Function,
                Type::Function(native.ty.clone()),
            );
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Pass 1: Declarations
    // ═══════════════════════════════════════════════════════════════════

    fn declare_item(&mut self, item: &Item, scope: ScopeId) {
        let (kind, ty) = match item {
            Item::Object(def) => {
                let ty = self
                    .resolve_aggregate(scope, &def.type_name)
                    .map(|(ty, _)| ty)
                    .unwrap_or(Type::NONE);
                (SymbolKind::Scalar, ty)
            }
            Item::Prototype(_) => (SymbolKind::Scalar, Type::ENTITY),
            Item::Graph(_) => (SymbolKind::Scalar, Type::GRAPH),
            Item::Function(def) => (SymbolKind::Function, self.signature(def, scope)),
        };

        let name = item.ident();
        if let Some(symbol) = self.define(scope, &name.name, kind, ty) {
            self.table.set_creation_node(symbol, name.id);
            if let Item::Function(def) = item {
                self.declare_params(symbol, def, scope);
            }
        }
    }

    fn signature(&mut self, def: &FnDef, scope: ScopeId) -> Type {
        let params = def
            .params
            .iter()
            .map(|param| self.resolve_type(scope, &param.ty).unwrap_or(Type::NONE))
            .collect();
        let ret = match &def.return_type {
            Some(ident) => self.resolve_type(scope, ident).unwrap_or(Type::NONE),
            None => Type::NONE,
        };
        Type::function(ret, params)
    }

    fn declare_params(&mut self, function: SymbolId, def: &FnDef, scope: ScopeId) {
        let params = self.table.new_scope(scope);
        self.table.set_own_scope(function, params);
        for param in &def.params {
            let ty = self
                .table
                .symbol_for(param.ty.id)
                .map(|symbol| self.table.symbol(symbol).ty.clone())
                .unwrap_or(Type::NONE);
            if let Some(symbol) = self.define(params, &param.name.name, SymbolKind::Scalar, ty) {
                self.table.set_creation_node(symbol, param.name.id);
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Pass 2: References
    // ═══════════════════════════════════════════════════════════════════

    fn resolve_item(&mut self, item: &Item, scope: ScopeId) {
        match item {
            Item::Object(def) => self.resolve_object(def, scope),
            Item::Prototype(def) => {
                for component in &def.components {
                    self.resolve_component(component, scope);
                }
            }
            Item::Graph(def) => self.resolve_dot(def, scope),
            Item::Function(def) => self.resolve_function(def, scope),
        }
    }

    fn resolve_object(&mut self, def: &ObjectDef, scope: ScopeId) {
        // The type name was resolved while declaring the object
        let members = self
            .table
            .symbol_for(def.type_name.id)
            .and_then(|symbol| self.table.symbol(symbol).own_scope);
        self.resolve_properties(&def.type_name.name, members, &def.properties, scope);
    }

    fn resolve_component(&mut self, component: &ComponentDef, scope: ScopeId) {
        let members = self
            .resolve_aggregate(scope, &component.type_name)
            .and_then(|(_, members)| members);
        self.resolve_properties(
            &component.type_name.name,
            members,
            &component.properties,
            scope,
        );
    }

    /// Resolve property names in the member scope of their type and property
    /// values in the enclosing scope.
    ///
    /// Without a member scope the type was already reported and only the
    /// values are resolved.
    fn resolve_properties(
        &mut self,
        type_name: &str,
        members: Option<ScopeId>,
        properties: &[PropertyDef],
        scope: ScopeId,
    ) {
        for property in properties {
            if let Some(members) = members {
                match self.table.resolve_local(members, &property.name.name) {
                    Some(member) => self.table.attach(property.name.id, member),
                    None => self.errors.push(SemanticError::UnknownProperty {
                        property: property.name.name.clone(),
                        type_name: type_name.to_string(),
                    }),
                }
            }
            self.resolve_expr(&property.value, scope);
        }
    }

    fn resolve_function(&mut self, def: &FnDef, scope: ScopeId) {
        let params = self
            .table
            .symbol_for(def.name.id)
            .and_then(|symbol| self.table.symbol(symbol).own_scope);
        // A redeclared function has no parameter scope; its body is still checked
        let params = params.unwrap_or_else(|| self.table.new_scope(scope));
        let body = self.table.new_scope(params);
        self.resolve_stmts(&def.body.stmts, body);
    }

    fn resolve_stmts(&mut self, stmts: &[Stmt], scope: ScopeId) {
        for stmt in stmts {
            self.resolve_stmt(stmt, scope);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt, scope: ScopeId) {
        match stmt {
            Stmt::Expr(expr) => self.resolve_expr(expr, scope),
            Stmt::Var(decl) => {
                // The initializer cannot see the variable it initializes
                if let Some(init) = &decl.init {
                    self.resolve_expr(init, scope);
                }
                let ty = match &decl.ty {
                    Some(ty) => self.resolve_type(scope, ty).unwrap_or(Type::NONE),
                    None => Type::NONE,
                };
                if let Some(symbol) = self.define(scope, &decl.name.name, SymbolKind::Scalar, ty) {
                    self.table.set_creation_node(symbol, decl.name.id);
                }
            }
            Stmt::Return(expr) => {
                if let Some(expr) = expr {
                    self.resolve_expr(expr, scope);
                }
            }
            Stmt::Block(block) => {
                let inner = self.table.new_scope(scope);
                self.resolve_stmts(&block.stmts, inner);
            }
            Stmt::If(stmt) => {
                self.resolve_expr(&stmt.cond, scope);
                let then_scope = self.table.new_scope(scope);
                self.resolve_stmt(&stmt.then_branch, then_scope);
                if let Some(else_branch) = &stmt.else_branch {
                    let else_scope = self.table.new_scope(scope);
                    self.resolve_stmt(else_branch, else_scope);
                }
            }
        }
    }

    fn resolve_expr(&mut self, expr: &Expr, scope: ScopeId) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Ident(ident) => self.resolve_ident(ident, scope),
            Expr::Call(call) => {
                match self.table.resolve(scope, &call.callee.name) {
                    Some(symbol) => {
                        let callee = self.table.symbol(symbol);
                        if callee.kind == SymbolKind::Function
                            || callee.ty.as_function().is_some()
                        {
                            self.table.attach(call.callee.id, symbol);
                        } else {
                            self.errors.push(SemanticError::NotCallable {
                                name: call.callee.name.clone(),
                            });
                        }
                    }
                    None => self.errors.push(SemanticError::Undefined {
                        name: call.callee.name.clone(),
                    }),
                }
                for arg in &call.args {
                    self.resolve_expr(arg, scope);
                }
            }
            // Members and methods are looked up on the runtime value
            Expr::Member(member) => self.resolve_expr(&member.base, scope),
            Expr::MethodCall(call) => {
                self.resolve_expr(&call.receiver, scope);
                for arg in &call.args {
                    self.resolve_expr(arg, scope);
                }
            }
            Expr::Binary(binary) => {
                self.resolve_expr(&binary.lhs, scope);
                self.resolve_expr(&binary.rhs, scope);
            }
            Expr::Unary(unary) => self.resolve_expr(&unary.operand, scope),
            Expr::Assign(assign) => {
                self.resolve_expr(&assign.target, scope);
                self.resolve_expr(&assign.value, scope);
            }
            Expr::Graph(def) => self.resolve_dot(def, scope),
            Expr::List(entries) | Expr::Set(entries) => {
                for entry in entries {
                    self.resolve_expr(entry, scope);
                }
            }
        }
    }

    fn resolve_ident(&mut self, ident: &Ident, scope: ScopeId) {
        match self.table.resolve(scope, &ident.name) {
            Some(symbol) => self.table.attach(ident.id, symbol),
            None => self.errors.push(SemanticError::Undefined {
                name: ident.name.clone(),
            }),
        }
    }

    /// Attach dot node ids that name values. Other ids are free node names.
    fn resolve_dot(&mut self, def: &DotDef, scope: ScopeId) {
        for stmt in &def.stmts {
            for ident in stmt.idents() {
                if let Some(symbol) = self.table.resolve(scope, &ident.name) {
                    if self.table.symbol(symbol).kind == SymbolKind::Scalar {
                        self.table.attach(ident.id, symbol);
                    }
                }
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Helpers
    // ═══════════════════════════════════════════════════════════════════

    fn define(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: SymbolKind,
        ty: Type,
    ) -> Option<SymbolId> {
        match self.table.define(scope, name, kind, ty) {
            Ok(symbol) => Some(symbol),
            Err(err) => {
                self.errors.push(err);
                None
            }
        }
    }

    /// Resolve a type name and attach it to its type symbol.
    fn resolve_type(&mut self, scope: ScopeId, ident: &Ident) -> Option<Type> {
        match self.type_symbol(scope, &ident.name) {
            Some(symbol) => {
                self.table.attach(ident.id, symbol);
                Some(self.table.symbol(symbol).ty.clone())
            }
            None => {
                self.errors.push(SemanticError::UnknownType {
                    name: ident.name.clone(),
                });
                None
            }
        }
    }

    /// The symbol of a named type.
    ///
    /// `T[]` and `T<>` are bound in the global scope the first time a
    /// program names them.
    fn type_symbol(&mut self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let found = self.table.resolve(scope, name).filter(|&symbol| {
            matches!(
                self.table.symbol(symbol).kind,
                SymbolKind::Type | SymbolKind::Scoped
            )
        });
        if found.is_some() {
            return found;
        }

        let (element, collection): (&str, fn(Type) -> Type) =
            if let Some(element) = name.strip_suffix("[]") {
                (element, Type::list)
            } else if let Some(element) = name.strip_suffix("<>") {
                (element, Type::set)
            } else {
                return None;
            };
        let element = self.type_symbol(scope, element)?;
        let ty = collection(self.table.symbol(element).ty.clone());
        let global = self.table.global_scope();
        debug!(ty = %ty, "bound collection type");
        self.define(global, name, SymbolKind::Type, ty)
    }

    /// Resolve the type of an object or component; it must have members.
    fn resolve_aggregate(
        &mut self,
        scope: ScopeId,
        ident: &Ident,
    ) -> Option<(Type, Option<ScopeId>)> {
        let ty = self.resolve_type(scope, ident)?;
        if ty.aggregate_name().is_none() {
            self.errors.push(SemanticError::NotAggregate {
                name: ident.name.clone(),
            });
            return None;
        }
        let members = self
            .table
            .symbol_for(ident.id)
            .and_then(|symbol| self.table.symbol(symbol).own_scope);
        Some((ty, members))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{self, BinaryOp, DotDef, DotStmt, EdgeOp};
    use crate::builder::TypeBuilder;
    use pretty_assertions::assert_eq;

    fn analyze(items: Vec<Item>) -> Result<SymbolTable, Vec<SemanticError>> {
        let registry = TypeBuilder::new().with_prelude().build();
        let programs = vec![Program::new("test.dng", items)];
        SemanticAnalyzer::new(&registry).analyze(&programs)
    }

    #[test]
    fn test_global_scope_holds_types_and_natives() {
        let table = analyze(vec![]).unwrap();
        let global = table.global_scope();
        for name in ["int", "float", "bool", "string", "graph", "entity", "quest_config", "print"] {
            assert!(table.resolve_local(global, name).is_some(), "{name} missing");
        }
        let config = table.resolve_local(global, "quest_config").unwrap();
        let members = table.symbol(config).own_scope.unwrap();
        assert!(table.resolve_local(members, "level_graph").is_some());
    }

    #[test]
    fn test_forward_reference_between_declarations() {
        let table = analyze(vec![
            ast::object("quest_config", "c", vec![("level_graph", Expr::ident("g"))]),
            ast::graph(DotDef::graph("g", vec![DotStmt::chain(EdgeOp::DoubleLine, &["a", "b"])])),
        ])
        .unwrap();
        let file = table.file_scope(std::path::Path::new("test.dng")).unwrap();
        let g = table.resolve_local(file, "g").unwrap();
        assert_eq!(table.nodes_of(g).len(), 2); // declaration and the reference
    }

    #[test]
    fn test_redeclaration_in_file() {
        let errors = analyze(vec![
            ast::function("f", vec![], None, vec![]),
            ast::function("f", vec![], None, vec![]),
        ])
        .unwrap_err();
        assert_eq!(
            errors,
            vec![SemanticError::Redeclaration { name: "f".into() }]
        );
    }

    #[test]
    fn test_undefined_and_unknown_type() {
        let errors = analyze(vec![ast::function(
            "f",
            vec![("x", "dragon")],
            None,
            vec![Stmt::expr(Expr::binary(BinaryOp::Add, Expr::ident("y"), Expr::int(1)))],
        )])
        .unwrap_err();
        assert_eq!(
            errors,
            vec![
                SemanticError::UnknownType {
                    name: "dragon".into()
                },
                SemanticError::Undefined { name: "y".into() },
            ]
        );
    }

    #[test]
    fn test_object_of_builtin_type_is_rejected() {
        let errors = analyze(vec![ast::object("int", "x", vec![])]).unwrap_err();
        assert_eq!(errors, vec![SemanticError::NotAggregate { name: "int".into() }]);
    }

    #[test]
    fn test_calling_a_value_is_rejected() {
        let errors = analyze(vec![
            ast::object("task", "t", vec![]),
            ast::function("f", vec![], None, vec![Stmt::expr(Expr::call("t", vec![]))]),
        ])
        .unwrap_err();
        assert_eq!(errors, vec![SemanticError::NotCallable { name: "t".into() }]);
    }

    #[test]
    fn test_free_dot_ids_are_not_errors() {
        let table = analyze(vec![
            ast::object("task", "t1", vec![]),
            ast::graph(DotDef::digraph(
                "g",
                vec![DotStmt::chain(EdgeOp::Arrow, &["t1", "free_node"])],
            )),
        ])
        .unwrap();
        let file = table.file_scope(std::path::Path::new("test.dng")).unwrap();
        let t1 = table.resolve_local(file, "t1").unwrap();
        assert_eq!(table.nodes_of(t1).len(), 2);
    }

    #[test]
    fn test_collection_types_are_bound_on_first_use() {
        let table = analyze(vec![
            ast::function("f", vec![("xs", "int[]"), ("ts", "task<>")], Some("int[]"), vec![]),
            ast::function("g", vec![("nested", "int[][]")], None, vec![]),
        ])
        .unwrap();
        let global = table.global_scope();
        let ints = table.resolve_local(global, "int[]").unwrap();
        assert_eq!(table.symbol(ints).ty, Type::list(Type::INT));
        let tasks = table.resolve_local(global, "task<>").unwrap();
        assert_eq!(table.symbol(tasks).ty, Type::set(Type::aggregate("task")));

        let file = table.file_scope(std::path::Path::new("test.dng")).unwrap();
        let g = table.resolve_local(file, "g").unwrap();
        assert_eq!(
            table.symbol(g).ty,
            Type::function(Type::NONE, vec![Type::list(Type::list(Type::INT))])
        );
    }

    #[test]
    fn test_collection_of_unknown_type() {
        let errors = analyze(vec![ast::function("f", vec![("xs", "dragon[]")], None, vec![])])
            .unwrap_err();
        assert_eq!(
            errors,
            vec![SemanticError::UnknownType {
                name: "dragon[]".into()
            }]
        );
    }

    #[test]
    fn test_locals_shadow_and_scope() {
        // fn f(x: int) -> int { var y = x; { var y = 2; } return y; }
        let table = analyze(vec![ast::function(
            "f",
            vec![("x", "int")],
            Some("int"),
            vec![
                Stmt::var("y", Expr::ident("x")),
                Stmt::Block(ast::Block::new(vec![Stmt::var("y", Expr::int(2))])),
                Stmt::ret(Expr::ident("y")),
            ],
        )])
        .unwrap();
        let file = table.file_scope(std::path::Path::new("test.dng")).unwrap();
        let f = table.resolve_local(file, "f").unwrap();
        assert_eq!(
            table.symbol(f).ty,
            Type::function(Type::INT, vec![Type::INT])
        );
    }
}
