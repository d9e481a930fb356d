//! Compound value types: aggregate instances, prototypes, collections and
//! adapted host objects

use std::any::Any;
use std::sync::Arc;

use indexmap::IndexMap;

use super::Value;
use crate::types::Type;

/// An instance of an aggregate type with named members.
///
/// Uses IndexMap to preserve member order for predictable iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateValue {
    /// The aggregate's DSL type name (e.g., "quest_config")
    pub type_name: String,

    /// Members that have been set, in assignment order
    pub members: IndexMap<String, Value>,
}

impl AggregateValue {
    /// Create an instance without members
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            members: IndexMap::new(),
        }
    }

    /// Add a member (builder pattern)
    pub fn with_member(mut self, name: impl Into<String>, value: Value) -> Self {
        self.members.insert(name.into(), value);
        self
    }

    /// Get a member by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.members.get(name)
    }

    /// Set a member, replacing an earlier value
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.members.insert(name.into(), value);
    }
}

/// A named, evaluated definition ready for instantiation.
///
/// Object definitions (`quest_config c { ... }`) carry the aggregate type
/// they instantiate; `entity_type` definitions carry `entity` and one
/// default per component.
#[derive(Debug, Clone, PartialEq)]
pub struct PrototypeValue {
    /// Prototype name
    pub name: String,

    /// Type the prototype instantiates
    pub ty: Type,

    /// Explicitly set members, already promoted to their declared types
    pub defaults: IndexMap<String, Value>,
}

impl PrototypeValue {
    /// Create a prototype without defaults
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            defaults: IndexMap::new(),
        }
    }

    /// Add a default (builder pattern)
    pub fn with_default(mut self, name: impl Into<String>, value: Value) -> Self {
        self.defaults.insert(name.into(), value);
        self
    }

    /// Get a default by member name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.defaults.get(name)
    }

    /// The aggregate value this prototype stands for.
    pub fn to_aggregate(&self) -> AggregateValue {
        AggregateValue {
            type_name: self.ty.to_string(),
            members: self.defaults.clone(),
        }
    }
}

/// An ordered list of values of one element type.
#[derive(Debug, Clone, PartialEq)]
pub struct ListValue {
    /// Element type (`none` for an empty literal)
    pub element: Type,

    /// Entries in order
    pub entries: Vec<Value>,
}

impl ListValue {
    /// Create a list
    pub fn new(element: Type, entries: Vec<Value>) -> Self {
        Self { element, entries }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A set of distinct values of one element type.
///
/// Entries keep insertion order; equality ignores it.
#[derive(Debug, Clone)]
pub struct SetValue {
    /// Element type (`none` for an empty literal)
    pub element: Type,

    entries: Vec<Value>,
}

impl SetValue {
    /// Create an empty set
    pub fn new(element: Type) -> Self {
        Self {
            element,
            entries: Vec::new(),
        }
    }

    /// Add a value; returns false if it was already present.
    pub fn insert(&mut self, value: Value) -> bool {
        if self.contains(&value) {
            return false;
        }
        self.entries.push(value);
        true
    }

    /// Whether `value` is in the set
    pub fn contains(&self, value: &Value) -> bool {
        self.entries.contains(value)
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for SetValue {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|value| other.contains(value))
    }
}

/// A host object built by a type adapter.
///
/// The DSL cannot look inside; hosts get the object back with
/// [`HostObject::downcast_ref`].
#[derive(Clone)]
pub struct HostObject {
    /// DSL type name of the adapted type
    pub type_name: String,

    object: Arc<dyn Any + Send + Sync>,
}

impl HostObject {
    /// Wrap a host object
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<String>, object: T) -> Self {
        Self {
            type_name: type_name.into(),
            object: Arc::new(object),
        }
    }

    /// The wrapped object, if it is a `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.object.downcast_ref()
    }
}

impl PartialEq for HostObject {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }
}

impl std::fmt::Debug for HostObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<host {}>", self.type_name)
    }
}
