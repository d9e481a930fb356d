//! Structural type descriptors
//!
//! Types are independent of Rust's own types: built-in scalars, function
//! signatures, aggregate "record" types and list or set types over an element
//! type. An aggregate [`Type`] is a handle
//! carrying only the type's name; the member layout lives in an
//! [`AggregateType`] stored by the type registry. Comparing by name keeps
//! self-referential member types finite.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::interop::ExtensionProperty;
use crate::value::NativeFunction;

/// Built-in scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltInType {
    /// 64-bit integer
    Int,
    /// 64-bit float
    Float,
    /// Boolean
    Bool,
    /// String
    String,
    /// Task dependency graph
    Graph,
    /// Reference to a host entity
    Entity,
    /// Accepts a value of any type
    Any,
    /// The type of "no value"
    None,
}

impl BuiltInType {
    /// All built-in types, in the order they are bound in the global scope.
    pub const ALL: [BuiltInType; 8] = [
        BuiltInType::Int,
        BuiltInType::Float,
        BuiltInType::Bool,
        BuiltInType::String,
        BuiltInType::Graph,
        BuiltInType::Entity,
        BuiltInType::Any,
        BuiltInType::None,
    ];

    /// The DSL name of this type.
    pub fn name(self) -> &'static str {
        match self {
            BuiltInType::Int => "int",
            BuiltInType::Float => "float",
            BuiltInType::Bool => "bool",
            BuiltInType::String => "string",
            BuiltInType::Graph => "graph",
            BuiltInType::Entity => "entity",
            BuiltInType::Any => "any",
            BuiltInType::None => "none",
        }
    }

    /// Look up a built-in type by DSL name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.name() == name)
    }
}

/// A type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Built-in scalar
    BuiltIn(BuiltInType),
    /// Function signature
    Function(Arc<FunctionType>),
    /// Aggregate type, by name
    Aggregate(Arc<str>),
    /// `T[]`: ordered list of `T`
    List(Arc<Type>),
    /// `T<>`: set of distinct `T`
    Set(Arc<Type>),
}

impl Type {
    /// `int`
    pub const INT: Type = Type::BuiltIn(BuiltInType::Int);
    /// `float`
    pub const FLOAT: Type = Type::BuiltIn(BuiltInType::Float);
    /// `bool`
    pub const BOOL: Type = Type::BuiltIn(BuiltInType::Bool);
    /// `string`
    pub const STRING: Type = Type::BuiltIn(BuiltInType::String);
    /// `graph`
    pub const GRAPH: Type = Type::BuiltIn(BuiltInType::Graph);
    /// `entity`
    pub const ENTITY: Type = Type::BuiltIn(BuiltInType::Entity);
    /// `any`
    pub const ANY: Type = Type::BuiltIn(BuiltInType::Any);
    /// `none`
    pub const NONE: Type = Type::BuiltIn(BuiltInType::None);

    /// Aggregate type handle.
    pub fn aggregate(name: &str) -> Self {
        Type::Aggregate(Arc::from(name))
    }

    /// Function type.
    pub fn function(return_type: Type, param_types: Vec<Type>) -> Self {
        Type::Function(Arc::new(FunctionType::new(return_type, param_types)))
    }

    /// List type over `element`.
    pub fn list(element: Type) -> Self {
        Type::List(Arc::new(element))
    }

    /// Set type over `element`.
    pub fn set(element: Type) -> Self {
        Type::Set(Arc::new(element))
    }

    /// Element type of a list or set type.
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::List(element) | Type::Set(element) => Some(element),
            _ => None,
        }
    }

    /// The function signature, if this is a function type.
    pub fn as_function(&self) -> Option<&FunctionType> {
        match self {
            Type::Function(f) => Some(f),
            _ => None,
        }
    }

    /// The aggregate name, if this is an aggregate type.
    pub fn aggregate_name(&self) -> Option<&str> {
        match self {
            Type::Aggregate(name) => Some(name),
            _ => None,
        }
    }

    /// Whether a value of type `other` may be stored where `self` is expected.
    ///
    /// Integers are promoted to floats, also as list or set elements, and
    /// `any` takes everything. A collection whose element type is `none` is
    /// an empty literal and fits every collection of the same kind.
    pub fn accepts(&self, other: &Type) -> bool {
        if self == other || *self == Type::ANY {
            return true;
        }
        match (self, other) {
            (Type::BuiltIn(BuiltInType::Float), Type::BuiltIn(BuiltInType::Int)) => true,
            (Type::List(expected), Type::List(found)) | (Type::Set(expected), Type::Set(found)) => {
                **found == Type::NONE || expected.accepts(found)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::BuiltIn(ty) => f.write_str(ty.name()),
            Type::Function(func) => write!(f, "{}", func),
            Type::Aggregate(name) => f.write_str(name),
            Type::List(element) => write!(f, "{}[]", element),
            Type::Set(element) => write!(f, "{}<>", element),
        }
    }
}

/// A function signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionType {
    /// Return type (`none` for no result)
    pub return_type: Type,
    /// Parameter types in order
    pub param_types: Vec<Type>,
}

impl FunctionType {
    /// Create a function signature.
    pub fn new(return_type: Type, param_types: Vec<Type>) -> Self {
        Self {
            return_type,
            param_types,
        }
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.param_types.len()
    }

    /// Whether calling the function yields a value.
    pub fn returns_value(&self) -> bool {
        self.return_type != Type::NONE
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn(")?;
        for (i, param) in self.param_types.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ")")?;
        if self.returns_value() {
            write!(f, " -> {}", self.return_type)?;
        }
        Ok(())
    }
}

/// A member of an aggregate type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDescriptor {
    /// DSL name
    pub name: String,
    /// Member type
    pub ty: Type,
    /// Whether DSL code may set the member
    pub settable: bool,
    /// Whether DSL code may read the member
    pub gettable: bool,
}

/// An aggregate "record" type definition.
#[derive(Debug, Clone)]
pub struct AggregateType {
    /// DSL name
    pub name: String,
    /// Members in declaration order
    pub members: IndexMap<String, MemberDescriptor>,
    /// Native methods callable on values of this type
    pub extension_methods: IndexMap<String, NativeFunction>,
    /// Computed members; each also appears in `members`
    pub properties: IndexMap<String, ExtensionProperty>,
    /// Native building the host value, for adapted types
    pub adapter: Option<NativeFunction>,
    /// The host type this aggregate mirrors, if any
    pub host: Option<TypeId>,
}

impl AggregateType {
    /// Create an aggregate without members.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: IndexMap::new(),
            extension_methods: IndexMap::new(),
            properties: IndexMap::new(),
            adapter: None,
            host: None,
        }
    }

    /// Add a member (builder pattern)
    pub fn with_member(mut self, member: MemberDescriptor) -> Self {
        self.members.insert(member.name.clone(), member);
        self
    }

    /// Look up a member by name.
    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.get(name)
    }

    /// Look up an extension method by name.
    pub fn method(&self, name: &str) -> Option<&NativeFunction> {
        self.extension_methods.get(name)
    }

    /// Look up an extension property by name.
    pub fn property(&self, name: &str) -> Option<&ExtensionProperty> {
        self.properties.get(name)
    }

    /// Type handle for this aggregate.
    pub fn as_type(&self) -> Type {
        Type::aggregate(&self.name)
    }
}

impl PartialEq for AggregateType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for AggregateType {}
