//! Type adapters: host types built by a native from DSL object definitions
//!
//! Some host types cannot expose settable members, e.g. types whose fields
//! must be validated together. A type adapter is a native whose parameters
//! become the members of a DSL type; an object definition of that type is
//! turned into the host value by calling the native with the members in
//! parameter order. An adapter with a single parameter also accepts a bare
//! value of the parameter's type where the adapted type is expected.
//!
//! ```
//! use std::sync::Arc;
//! use dungeon_dsl::ast::{self, Expr, Program};
//! use dungeon_dsl::types::{FunctionType, Type};
//! use dungeon_dsl::{adapted_host_value, HostValue, NativeFunction, TypeBuilder};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Range {
//!     low: i64,
//!     high: i64,
//! }
//!
//! adapted_host_value!(Range, "range");
//!
//! let build = NativeFunction::new(
//!     "range",
//!     FunctionType::new(Type::aggregate("range"), vec![Type::INT, Type::INT]),
//!     |_, args| {
//!         let low = args[0].as_int().unwrap_or(0);
//!         let high = args[1].as_int().unwrap_or(low);
//!         Ok(Range { low: low.min(high), high: low.max(high) }.to_value())
//!     },
//! );
//! let registry = Arc::new(
//!     TypeBuilder::new()
//!         .register_adapter::<Range>(&["low", "high"], build)
//!         .build(),
//! );
//! let programs = vec![Program::new(
//!     "loot.dng",
//!     vec![ast::object("range", "r", vec![("low", Expr::int(9)), ("high", Expr::int(3))])],
//! )];
//!
//! let env = dungeon_dsl::load(&programs, registry).unwrap();
//! let range: Range = env.instantiate("r").unwrap();
//! assert_eq!(range, Range { low: 3, high: 9 });
//! ```

use std::any::type_name;
use std::sync::Arc;

use tracing::debug;

use super::{call_native, CallContext};
use crate::error::InteropError;
use crate::runtime::RuntimeEnvironment;
use crate::types::AggregateType;
use crate::value::{AggregateValue, Value};

/// Implement [`HostValue`](crate::interop::HostValue) for a host type built
/// by a type adapter registered under the given DSL name.
#[macro_export]
macro_rules! adapted_host_value {
    ($ty:ty, $name:expr) => {
        impl $crate::interop::HostValue for $ty {
            fn dsl_type() -> $crate::types::Type {
                $crate::types::Type::aggregate($name)
            }

            fn to_value(&self) -> $crate::value::Value {
                $crate::value::Value::host($name, ::std::clone::Clone::clone(self))
            }

            fn from_value(
                value: &$crate::value::Value,
                env: &::std::sync::Arc<$crate::runtime::RuntimeEnvironment>,
            ) -> ::std::result::Result<Self, $crate::error::InteropError> {
                $crate::interop::adapted_from_value(value, env)
            }
        }
    };
}

/// Build a host object of an adapted type from a DSL value.
///
/// Accepts an object already built by the adapter, an object definition or
/// aggregate of the adapted type, or, for single-parameter adapters, a value
/// of the parameter's type.
pub fn adapted_from_value<T: Clone + Send + Sync + 'static>(
    value: &Value,
    env: &Arc<RuntimeEnvironment>,
) -> Result<T, InteropError> {
    let adapted = adapted_type::<T>(env)?;
    if let Value::Host(object) = value {
        return object
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| InteropError::TypeMismatch {
                expected: adapted.name.clone(),
                found: object.type_name.clone(),
            });
    }

    let args = adapter_args(adapted, value).ok_or_else(|| InteropError::TypeMismatch {
        expected: adapted.name.clone(),
        found: value.ty().to_string(),
    })?;
    let built = build(adapted, args, env)?;
    built
        .as_host()
        .and_then(|object| object.downcast_ref::<T>())
        .cloned()
        .ok_or_else(|| InteropError::Adapter {
            type_name: adapted.name.clone(),
            message: format!("expected a `{}`, got `{}`", type_name::<T>(), built.ty()),
        })
}

/// Wrap a value of a single-parameter adapter's parameter type into an
/// aggregate of the adapted type. Other values are returned unchanged.
pub fn wrap_single_parameter(adapted: &AggregateType, value: Value) -> Value {
    if adapted.adapter.is_none() || value.is_none() || adapted.members.len() != 1 {
        return value;
    }
    let Some(param) = adapted.members.values().next() else {
        return value;
    };
    if !param.ty.accepts(&value.ty()) || value.ty() == adapted.as_type() {
        return value;
    }
    let value = value.coerce_to(&param.ty);
    Value::aggregate(AggregateValue::new(adapted.name.clone()).with_member(param.name.clone(), value))
}

fn adapted_type<T: 'static>(env: &Arc<RuntimeEnvironment>) -> Result<&AggregateType, InteropError> {
    env.dsl_type_of::<T>()
        .and_then(|ty| env.aggregate(ty.aggregate_name()?))
        .filter(|aggregate| aggregate.adapter.is_some())
        .ok_or(InteropError::UnregisteredHostType {
            rust_type: type_name::<T>(),
        })
}

/// Adapter arguments in parameter order; members never set pass `none`.
fn adapter_args(adapted: &AggregateType, value: &Value) -> Option<Vec<Value>> {
    let members = match value {
        Value::Aggregate(a) if a.type_name == adapted.name => &a.members,
        Value::Prototype(p) if p.ty == adapted.as_type() => &p.defaults,
        other => {
            return match wrap_single_parameter(adapted, other.clone()) {
                Value::Aggregate(a) if a.type_name == adapted.name => {
                    Some(a.members.values().cloned().collect())
                }
                _ => None,
            };
        }
    };
    let args = adapted
        .members
        .keys()
        .map(|name| members.get(name).cloned().unwrap_or(Value::None))
        .collect();
    Some(args)
}

fn build(
    adapted: &AggregateType,
    args: Vec<Value>,
    env: &Arc<RuntimeEnvironment>,
) -> Result<Value, InteropError> {
    let Some(adapter) = &adapted.adapter else {
        return Err(InteropError::Adapter {
            type_name: adapted.name.clone(),
            message: "no adapter registered".to_string(),
        });
    };
    debug!(dsl_type = %adapted.name, args = ?args, "building adapted host object");
    let mut sink = std::io::sink();
    let mut ctx = CallContext {
        env,
        output: &mut sink,
        receiver: None,
    };
    call_native(adapter, &mut ctx, args).map_err(|err| InteropError::Adapter {
        type_name: adapted.name.clone(),
        message: err.to_string(),
    })
}
