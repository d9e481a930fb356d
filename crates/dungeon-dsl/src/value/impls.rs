//! Value trait implementations: constructors, predicates, extractors, From traits, PartialEq

use std::sync::Arc;

use super::*;
use crate::types::Type;

// ═══════════════════════════════════════════════════════════════════
// Convenience Constructors
// ═══════════════════════════════════════════════════════════════════

impl Value {
    /// Create a string value
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(Arc::new(s.into()))
    }

    /// Create an aggregate value
    pub fn aggregate(a: AggregateValue) -> Self {
        Value::Aggregate(Arc::new(a))
    }

    /// Create a prototype value
    pub fn prototype(p: PrototypeValue) -> Self {
        Value::Prototype(Arc::new(p))
    }

    /// Create a graph value
    pub fn graph(g: TaskDependencyGraph) -> Self {
        Value::Graph(Arc::new(g))
    }

    /// Create a list value
    pub fn list(element: Type, entries: Vec<Value>) -> Self {
        Value::List(Arc::new(ListValue::new(element, entries)))
    }

    /// Create a set value, dropping repeated entries
    pub fn set(element: Type, entries: impl IntoIterator<Item = Value>) -> Self {
        let mut set = SetValue::new(element);
        for entry in entries {
            set.insert(entry);
        }
        Value::Set(Arc::new(set))
    }

    /// Wrap a host object built by a type adapter
    pub fn host<T: std::any::Any + Send + Sync>(type_name: &str, object: T) -> Self {
        Value::Host(HostObject::new(type_name, object))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Type Descriptor
    // ═══════════════════════════════════════════════════════════════════

    /// The DSL type of this value.
    pub fn ty(&self) -> Type {
        match self {
            Value::None => Type::NONE,
            Value::Int(_) => Type::INT,
            Value::Float(_) => Type::FLOAT,
            Value::Bool(_) => Type::BOOL,
            Value::Entity(_) => Type::ENTITY,
            Value::String(_) => Type::STRING,
            Value::Graph(_) => Type::GRAPH,
            Value::Aggregate(a) => Type::aggregate(&a.type_name),
            Value::Prototype(p) => p.ty.clone(),
            Value::List(l) => Type::list(l.element.clone()),
            Value::Set(s) => Type::set(s.element.clone()),
            Value::Host(h) => Type::aggregate(&h.type_name),
            Value::Function(f) => Type::Function(f.ty.clone()),
            Value::Native(n) => Type::Function(n.ty.clone()),
        }
    }

    /// Promote this value to `ty` where the type system allows it.
    ///
    /// Only `int` → `float` changes the payload, for scalars and for the
    /// entries of lists and sets; other values are returned unchanged.
    pub fn coerce_to(self, ty: &Type) -> Value {
        match (self, ty) {
            (Value::Int(n), _) if *ty == Type::FLOAT => Value::Float(n as f64),
            (Value::List(list), Type::List(element)) if list.element != **element => {
                if !element.accepts(&list.element) {
                    return Value::List(list);
                }
                let entries = list
                    .entries
                    .iter()
                    .map(|entry| entry.clone().coerce_to(element))
                    .collect();
                Value::list((**element).clone(), entries)
            }
            (Value::Set(set), Type::Set(element)) if set.element != **element => {
                if !element.accepts(&set.element) {
                    return Value::Set(set);
                }
                let entries: Vec<Value> =
                    set.iter().map(|entry| entry.clone().coerce_to(element)).collect();
                Value::set((**element).clone(), entries)
            }
            (value, _) => value,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Type Predicates
    // ═══════════════════════════════════════════════════════════════════
    /// Check if value is `none`
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Check if value is numeric (integer or float)
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Check if value is callable (user function or native)
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Native(_))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Extractors (return Option for safe access)
    // ═══════════════════════════════════════════════════════════════════
    /// Extract boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract integer value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Extract as f64 (promotes integers)
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Extract string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Extract entity reference
    pub fn as_entity(&self) -> Option<EntityId> {
        match self {
            Value::Entity(id) => Some(*id),
            _ => None,
        }
    }

    /// Extract graph
    pub fn as_graph(&self) -> Option<&Arc<TaskDependencyGraph>> {
        match self {
            Value::Graph(g) => Some(g),
            _ => None,
        }
    }

    /// Extract aggregate instance
    pub fn as_aggregate(&self) -> Option<&AggregateValue> {
        match self {
            Value::Aggregate(a) => Some(a),
            _ => None,
        }
    }

    /// Extract prototype
    pub fn as_prototype(&self) -> Option<&PrototypeValue> {
        match self {
            Value::Prototype(p) => Some(p),
            _ => None,
        }
    }

    /// Extract list
    pub fn as_list(&self) -> Option<&ListValue> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Extract set
    pub fn as_set(&self) -> Option<&SetValue> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }

    /// Extract adapted host object
    pub fn as_host(&self) -> Option<&HostObject> {
        match self {
            Value::Host(h) => Some(h),
            _ => None,
        }
    }

    /// Extract user-defined function
    pub fn as_function(&self) -> Option<&Arc<FunctionValue>> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Read a member of an aggregate or a default of a prototype.
    pub fn member(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Aggregate(a) => a.get(name),
            Value::Prototype(p) => p.get(name),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// PartialEq Implementation
// ═══════════════════════════════════════════════════════════════════

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,

            // Scalars
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Entity(a), Value::Entity(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,

            // Compound values compare by content
            (Value::Graph(a), Value::Graph(b)) => a == b,
            (Value::Aggregate(a), Value::Aggregate(b)) => a == b,
            (Value::Prototype(a), Value::Prototype(b)) => a == b,
            (Value::List(a), Value::List(b)) => a.entries == b.entries,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Host(a), Value::Host(b)) => a == b,

            // Functions are equal if they were declared as the same symbol
            (Value::Function(a), Value::Function(b)) => a.symbol == b.symbol,

            // Natives are equal if same name (identity)
            (Value::Native(a), Value::Native(b)) => a.name == b.name,

            // Different types are never equal
            _ => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// From Trait Implementations
// ═══════════════════════════════════════════════════════════════════

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<EntityId> for Value {
    fn from(id: EntityId) -> Self {
        Value::Entity(id)
    }
}

impl From<AggregateValue> for Value {
    fn from(a: AggregateValue) -> Self {
        Value::aggregate(a)
    }
}

impl From<TaskDependencyGraph> for Value {
    fn from(g: TaskDependencyGraph) -> Self {
        Value::graph(g)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::None)
    }
}
