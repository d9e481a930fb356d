//! Bridge between DSL values and host Rust types
//!
//! Host types become DSL aggregates by implementing [`DslType`], normally
//! through `#[derive(DslType)]`:
//!
//! ```
//! use dungeon_dsl::types::Type;
//! use dungeon_dsl::{DslType, HostValue};
//!
//! #[derive(Debug, Default, DslType)]
//! struct Chest {
//!     #[dsl(member)]
//!     gold: i64,
//!     #[dsl(member, name = "locked", readonly)]
//!     is_locked: bool,
//!     cache: Vec<u8>,
//! }
//!
//! assert_eq!(Chest::DSL_NAME, "chest");
//! assert_eq!(Chest::dsl_type(), Type::aggregate("chest"));
//! let names: Vec<_> = Chest::members().iter().map(|m| m.name).collect();
//! assert_eq!(names, vec!["gold", "locked"]);
//! ```
//!
//! [`HostValue`] converts single values in both directions. Conversions of
//! aggregates need the [`RuntimeEnvironment`] so that function values can be
//! wrapped into callback adapters.

mod adapter;
mod native;
mod property;
mod type_adapter;

pub use adapter::{
    AdapterKind, BiConsumer, BiFunction, CallbackAdapter, Consumer, Function, Runnable, Supplier,
    TriConsumer,
};
pub use native::{call_native, CallContext};
pub use property::ExtensionProperty;
pub use type_adapter::{adapted_from_value, wrap_single_parameter};

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::InteropError;
use crate::graph::TaskDependencyGraph;
use crate::runtime::RuntimeEnvironment;
use crate::types::Type;
use crate::value::{AggregateValue, EntityId, Value};

/// A host type visible to the DSL as an aggregate.
pub trait DslType: Default + Sized + 'static {
    /// DSL name of the type
    const DSL_NAME: &'static str;

    /// Members visible to the DSL, in declaration order.
    fn members() -> Vec<HostMember<Self>>;
}

/// Reads a member of a host object as a DSL value.
pub type MemberGetter<T> = fn(&T) -> Value;

/// Stores a DSL value into a member of a host object.
pub type MemberSetter<T> = fn(&mut T, &Value, &Arc<RuntimeEnvironment>) -> Result<(), InteropError>;

/// Accessor table entry for one member of a host type.
pub struct HostMember<T> {
    /// DSL member name
    pub name: &'static str,
    /// DSL type of the member
    pub ty: fn() -> Type,
    /// Whether DSL code may set the member
    pub settable: bool,
    /// Whether DSL code may read the member
    pub gettable: bool,
    /// Getter
    pub get: MemberGetter<T>,
    /// Setter
    pub set: MemberSetter<T>,
}

impl<T> std::fmt::Debug for HostMember<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostMember")
            .field("name", &self.name)
            .field("settable", &self.settable)
            .field("gettable", &self.gettable)
            .finish()
    }
}

/// Conversion of a host value to and from a DSL [`Value`].
pub trait HostValue: Sized {
    /// DSL type of the converted value.
    fn dsl_type() -> Type;

    /// Convert into a DSL value.
    fn to_value(&self) -> Value;

    /// Convert from a DSL value.
    fn from_value(value: &Value, env: &Arc<RuntimeEnvironment>) -> Result<Self, InteropError>;
}

fn mismatch(expected: &Type, found: &Value) -> InteropError {
    InteropError::TypeMismatch {
        expected: expected.to_string(),
        found: found.ty().to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Aggregates
// ═══════════════════════════════════════════════════════════════════════

/// Convert a host object into an aggregate value holding its gettable members.
pub fn aggregate_to_value<T: DslType>(host: &T) -> Value {
    let mut aggregate = AggregateValue::new(T::DSL_NAME);
    for member in T::members() {
        if member.gettable {
            aggregate.set(member.name, (member.get)(host));
        }
    }
    Value::aggregate(aggregate)
}

/// Build a host object from an aggregate or prototype value.
///
/// Starts from `T::default()` and copies every settable member present in the
/// value. Members the DSL cannot set are left at their defaults. Extension
/// properties registered for `T` are set last.
pub fn aggregate_from_value<T: DslType>(
    value: &Value,
    env: &Arc<RuntimeEnvironment>,
) -> Result<T, InteropError> {
    let (type_name, members) = match value {
        Value::Aggregate(a) => (a.type_name.clone(), &a.members),
        Value::Prototype(p) => (p.ty.to_string(), &p.defaults),
        other => return Err(mismatch(&Type::aggregate(T::DSL_NAME), other)),
    };
    if type_name != T::DSL_NAME {
        return Err(InteropError::TypeMismatch {
            expected: T::DSL_NAME.to_string(),
            found: type_name,
        });
    }

    let accessors = T::members();
    let aggregate = env.aggregate(T::DSL_NAME);
    let mut host = T::default();
    let mut properties = Vec::new();
    for (name, member_value) in members {
        if let Some(accessor) = accessors.iter().find(|m| m.name == name.as_str()) {
            if accessor.settable {
                (accessor.set)(&mut host, member_value, env)?;
            }
            continue;
        }
        let property = aggregate
            .and_then(|aggregate| aggregate.property(name))
            .ok_or_else(|| InteropError::UnknownMember {
                type_name: T::DSL_NAME.to_string(),
                member: name.clone(),
            })?;
        if property.descriptor.settable {
            properties.push((property, member_value));
        }
    }
    for (property, member_value) in properties {
        property.set(&mut host, member_value, env)?;
    }
    Ok(host)
}

// ═══════════════════════════════════════════════════════════════════════
// Scalars
// ═══════════════════════════════════════════════════════════════════════

impl HostValue for i64 {
    fn dsl_type() -> Type {
        Type::INT
    }

    fn to_value(&self) -> Value {
        Value::Int(*self)
    }

    fn from_value(value: &Value, _env: &Arc<RuntimeEnvironment>) -> Result<Self, InteropError> {
        value.as_int().ok_or_else(|| mismatch(&Type::INT, value))
    }
}

macro_rules! narrow_int_host_value {
    ($($ty:ty),*) => {
        $(
            impl HostValue for $ty {
                fn dsl_type() -> Type {
                    Type::INT
                }

                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }

                fn from_value(value: &Value, _env: &Arc<RuntimeEnvironment>) -> Result<Self, InteropError> {
                    value
                        .as_int()
                        .and_then(|n| <$ty>::try_from(n).ok())
                        .ok_or_else(|| InteropError::TypeMismatch {
                            expected: format!("int ({})", stringify!($ty)),
                            found: value.ty().to_string(),
                        })
                }
            }
        )*
    };
}

narrow_int_host_value!(i32, u32);

impl HostValue for f64 {
    fn dsl_type() -> Type {
        Type::FLOAT
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: &Value, _env: &Arc<RuntimeEnvironment>) -> Result<Self, InteropError> {
        value.as_float().ok_or_else(|| mismatch(&Type::FLOAT, value))
    }
}

impl HostValue for f32 {
    fn dsl_type() -> Type {
        Type::FLOAT
    }

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    fn from_value(value: &Value, _env: &Arc<RuntimeEnvironment>) -> Result<Self, InteropError> {
        value
            .as_float()
            .map(|n| n as f32)
            .ok_or_else(|| mismatch(&Type::FLOAT, value))
    }
}

impl HostValue for bool {
    fn dsl_type() -> Type {
        Type::BOOL
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: &Value, _env: &Arc<RuntimeEnvironment>) -> Result<Self, InteropError> {
        value.as_bool().ok_or_else(|| mismatch(&Type::BOOL, value))
    }
}

impl HostValue for String {
    fn dsl_type() -> Type {
        Type::STRING
    }

    fn to_value(&self) -> Value {
        Value::string(self.clone())
    }

    fn from_value(value: &Value, _env: &Arc<RuntimeEnvironment>) -> Result<Self, InteropError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch(&Type::STRING, value))
    }
}

impl HostValue for EntityId {
    fn dsl_type() -> Type {
        Type::ENTITY
    }

    fn to_value(&self) -> Value {
        Value::Entity(*self)
    }

    fn from_value(value: &Value, _env: &Arc<RuntimeEnvironment>) -> Result<Self, InteropError> {
        value.as_entity().ok_or_else(|| mismatch(&Type::ENTITY, value))
    }
}

impl HostValue for TaskDependencyGraph {
    fn dsl_type() -> Type {
        Type::GRAPH
    }

    fn to_value(&self) -> Value {
        Value::graph(self.clone())
    }

    fn from_value(value: &Value, _env: &Arc<RuntimeEnvironment>) -> Result<Self, InteropError> {
        value
            .as_graph()
            .map(|g| g.as_ref().clone())
            .ok_or_else(|| mismatch(&Type::GRAPH, value))
    }
}

/// `none` maps to `Option::None`; anything else converts as `T`.
impl<T: HostValue> HostValue for Option<T> {
    fn dsl_type() -> Type {
        T::dsl_type()
    }

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::None,
        }
    }

    fn from_value(value: &Value, env: &Arc<RuntimeEnvironment>) -> Result<Self, InteropError> {
        match value {
            Value::None => Ok(None),
            other => T::from_value(other, env).map(Some),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Collections
// ═══════════════════════════════════════════════════════════════════════

impl<T: HostValue> HostValue for Vec<T> {
    fn dsl_type() -> Type {
        Type::list(T::dsl_type())
    }

    fn to_value(&self) -> Value {
        Value::list(T::dsl_type(), self.iter().map(HostValue::to_value).collect())
    }

    fn from_value(value: &Value, env: &Arc<RuntimeEnvironment>) -> Result<Self, InteropError> {
        let list = value
            .as_list()
            .ok_or_else(|| mismatch(&Self::dsl_type(), value))?;
        list.entries
            .iter()
            .map(|entry| T::from_value(entry, env))
            .collect()
    }
}

impl<T: HostValue + Eq + Hash> HostValue for HashSet<T> {
    fn dsl_type() -> Type {
        Type::set(T::dsl_type())
    }

    fn to_value(&self) -> Value {
        let entries: Vec<Value> = self.iter().map(HostValue::to_value).collect();
        Value::set(T::dsl_type(), entries)
    }

    fn from_value(value: &Value, env: &Arc<RuntimeEnvironment>) -> Result<Self, InteropError> {
        let set = value
            .as_set()
            .ok_or_else(|| mismatch(&Self::dsl_type(), value))?;
        set.iter().map(|entry| T::from_value(entry, env)).collect()
    }
}
