//! Top-level declaration evaluation
//!
//! Object definitions become prototypes of their aggregate type,
//! `entity_type` definitions become entity prototypes with one aggregate per
//! component, dot definitions become task graphs and function definitions
//! become function values.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::ast::{DotDef, FnDef, Ident, Item, ObjectDef, PropertyDef, PrototypeDef};
use crate::error::{GraphError, InteropError};
use crate::graph::{build_graph, TaskDependencyGraph};
use crate::interop::{wrap_single_parameter, HostValue};
use crate::memory::MemorySpace;
use crate::prelude::Task;
use crate::types::Type;
use crate::value::{AggregateValue, FunctionValue, PrototypeValue};
use crate::{EvalError, Value};

use super::{check_type, Evaluate, Interpreter};

impl Interpreter {
    /// Evaluate a top-level declaration.
    pub(crate) fn eval_item(
        &mut self,
        item: &Item,
        memory: &mut MemorySpace,
    ) -> Result<Value, EvalError> {
        match item {
            Item::Object(def) => self.eval_object(def, memory),
            Item::Prototype(def) => self.eval_prototype(def, memory),
            Item::Graph(def) => {
                let graph = self.build_task_graph(def, memory)?;
                Arc::make_mut(&mut self.env).add_graph(Arc::clone(&graph));
                Ok(Value::Graph(graph))
            }
            Item::Function(def) => self.eval_function(def),
        }
    }

    /// Evaluate an inline graph expression.
    pub(crate) fn eval_graph(
        &mut self,
        def: &DotDef,
        memory: &mut MemorySpace,
    ) -> Result<Value, EvalError> {
        self.build_task_graph(def, memory).map(Value::Graph)
    }

    fn eval_object(&mut self, def: &ObjectDef, memory: &mut MemorySpace) -> Result<Value, EvalError> {
        let type_name = self.aggregate_name(&def.type_name)?;
        let defaults = self.eval_properties(&type_name, &def.properties, memory)?;
        let prototype = Arc::new(PrototypeValue {
            name: def.name.name.clone(),
            ty: Type::aggregate(&type_name),
            defaults,
        });
        self.register_prototype(Arc::clone(&prototype))?;
        Ok(Value::Prototype(prototype))
    }

    fn eval_prototype(
        &mut self,
        def: &PrototypeDef,
        memory: &mut MemorySpace,
    ) -> Result<Value, EvalError> {
        let mut prototype = PrototypeValue::new(def.name.name.clone(), Type::ENTITY);
        for component in &def.components {
            let type_name = self.aggregate_name(&component.type_name)?;
            let members = self.eval_properties(&type_name, &component.properties, memory)?;
            let aggregate = AggregateValue {
                type_name: type_name.clone(),
                members,
            };
            prototype.defaults.insert(type_name, Value::aggregate(aggregate));
        }

        let prototype = Arc::new(prototype);
        self.register_prototype(Arc::clone(&prototype))?;
        Ok(Value::Prototype(prototype))
    }

    fn eval_function(&mut self, def: &Arc<FnDef>) -> Result<Value, EvalError> {
        let symbol = self.symbol_of(&def.name)?;
        let ty = self
            .symbol(symbol)
            .ty
            .as_function()
            .cloned()
            .ok_or_else(|| EvalError::TypeError {
                message: format!("`{}` was not analyzed as a function", def.name),
            })?;
        let function = FunctionValue::new(symbol, ty, Arc::clone(def));
        Ok(Value::Function(Arc::new(function)))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Helpers
    // ═══════════════════════════════════════════════════════════════════

    /// DSL name of the aggregate type an identifier denotes.
    fn aggregate_name(&self, ident: &Ident) -> Result<String, EvalError> {
        let symbol = self.symbol_of(ident)?;
        self.symbol(symbol)
            .ty
            .aggregate_name()
            .map(str::to_string)
            .ok_or_else(|| EvalError::TypeError {
                message: format!("`{}` is not an aggregate type", ident),
            })
    }

    /// Evaluate property assignments against the members of `type_name`.
    ///
    /// Values are promoted to the declared member types. A bare value where
    /// a single-parameter adapted type is expected stands for an object of
    /// that type.
    fn eval_properties(
        &mut self,
        type_name: &str,
        properties: &[PropertyDef],
        memory: &mut MemorySpace,
    ) -> Result<IndexMap<String, Value>, EvalError> {
        let mut members = IndexMap::new();
        for property in properties {
            let name = &property.name.name;
            let descriptor = self
                .env
                .aggregate(type_name)
                .and_then(|ty| ty.member(name))
                .cloned()
                .ok_or_else(|| EvalError::UndefinedMember {
                    member: name.clone(),
                    type_name: type_name.to_string(),
                })?;
            if !descriptor.settable {
                return Err(InteropError::MemberNotSettable {
                    type_name: type_name.to_string(),
                    member: name.clone(),
                }
                .into());
            }

            let value = property.value.eval(self, memory)?;
            let value = self
                .adapt_value(&descriptor.ty, value)
                .coerce_to(&descriptor.ty);
            check_type(&descriptor.ty, &value, || {
                format!("property `{}` of `{}`", name, type_name)
            })?;
            members.insert(name.clone(), value);
        }
        Ok(members)
    }

    fn adapt_value(&self, ty: &Type, value: Value) -> Value {
        match ty.aggregate_name().and_then(|name| self.env.aggregate(name)) {
            Some(adapted) => wrap_single_parameter(adapted, value),
            None => value,
        }
    }

    fn register_prototype(&mut self, prototype: Arc<PrototypeValue>) -> Result<(), EvalError> {
        let name = prototype.name.clone();
        if !Arc::make_mut(&mut self.env).add_prototype(prototype) {
            return Err(EvalError::DuplicatePrototype { name });
        }
        debug!(prototype = %name, "registered prototype");
        Ok(())
    }

    fn build_task_graph(
        &mut self,
        def: &DotDef,
        memory: &mut MemorySpace,
    ) -> Result<Arc<TaskDependencyGraph>, EvalError> {
        let graph = build_graph(def, |ident| self.resolve_task(ident, memory))?;
        Ok(Arc::new(graph))
    }

    /// Payload of a graph node.
    ///
    /// Identifiers analysis left unresolved are plain node names. A resolved
    /// identifier must name a `task` object.
    fn resolve_task(
        &mut self,
        ident: &Ident,
        memory: &mut MemorySpace,
    ) -> Result<Option<Value>, EvalError> {
        let Some(symbol) = self.env.symbols().symbol_for(ident.id) else {
            return Ok(None);
        };
        let value = match memory.get(symbol) {
            Some(value) => value.clone(),
            None => self.global_value(symbol)?,
        };
        match value {
            Value::Prototype(_) | Value::Aggregate(_) if value.ty() == Task::dsl_type() => {
                Ok(Some(value))
            }
            _ => Err(GraphError::NotATask {
                name: ident.name.clone(),
            }
            .into()),
        }
    }
}
