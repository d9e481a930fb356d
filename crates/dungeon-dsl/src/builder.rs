//! Type builder: DSL types derived from host types
//!
//! Host types are registered once at startup. [`TypeBuilder::build`] freezes
//! the result into an immutable [`TypeRegistry`] that interpreters share
//! through an `Arc` without locking.
//!
//! A registration that fails (a malformed name, two members with the same
//! name) only drops the type concerned. The failure is logged and kept in
//! [`TypeRegistry::build_errors`].
//!
//! # Example
//!
//! ```
//! use dungeon_dsl::builder::TypeBuilder;
//! use dungeon_dsl::types::Type;
//! use dungeon_dsl::DslType;
//!
//! #[derive(Debug, Default, DslType)]
//! struct Door {
//!     #[dsl(member)]
//!     open: bool,
//! }
//!
//! let registry = TypeBuilder::new().register::<Door>().build();
//! assert_eq!(registry.dsl_type_of::<Door>(), Some(Type::aggregate("door")));
//! assert!(registry.aggregate("door").is_some());
//! ```

use std::any::{type_name, TypeId};
use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::TypeBuildError;
use crate::interop::{DslType, ExtensionProperty, HostMember};
use crate::types::{AggregateType, BuiltInType, MemberDescriptor, Type};
use crate::value::NativeFunction;

/// Collects host types, type adapters, extension methods and properties, and
/// native functions.
#[derive(Debug, Default)]
pub struct TypeBuilder {
    aggregates: IndexMap<String, AggregateType>,
    host_to_dsl: HashMap<TypeId, String>,
    functions: IndexMap<String, NativeFunction>,
    errors: Vec<TypeBuildError>,
}

impl TypeBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a host type as a DSL aggregate.
    ///
    /// On failure the type is skipped and the error recorded.
    pub fn register<T: DslType>(mut self) -> Self {
        if let Err(err) = self.try_register::<T>() {
            warn!(rust_type = type_name::<T>(), error = %err, "skipping host type");
            self.errors.push(err);
        }
        self
    }

    /// Register a host type, reporting failure to the caller.
    pub fn try_register<T: DslType>(&mut self) -> Result<Type, TypeBuildError> {
        let name = T::DSL_NAME;
        self.check_type_name::<T>(name)?;

        let mut aggregate = AggregateType::new(name);
        aggregate.host = Some(TypeId::of::<T>());
        for member in T::members() {
            check_name(name, member.name)?;
            if aggregate.members.contains_key(member.name) {
                return Err(TypeBuildError::DuplicateMember {
                    type_name: name.to_string(),
                    member: member.name.to_string(),
                });
            }
            aggregate = aggregate.with_member(MemberDescriptor {
                name: member.name.to_string(),
                ty: (member.ty)(),
                settable: member.settable,
                gettable: member.gettable,
            });
        }

        debug!(
            dsl_type = name,
            rust_type = type_name::<T>(),
            members = aggregate.members.len(),
            "registered host type"
        );
        let ty = aggregate.as_type();
        self.host_to_dsl.insert(TypeId::of::<T>(), name.to_string());
        self.aggregates.insert(name.to_string(), aggregate);
        Ok(ty)
    }

    /// Register a type adapter: `adapter` builds a `T` from DSL values.
    ///
    /// The DSL type is named after the adapter. Its members are the adapter's
    /// parameters, named by `params` in order. On failure the adapter is
    /// skipped and the error recorded.
    pub fn register_adapter<T: Send + Sync + 'static>(
        mut self,
        params: &[&str],
        adapter: NativeFunction,
    ) -> Self {
        if let Err(err) = self.try_register_adapter::<T>(params, adapter) {
            warn!(rust_type = type_name::<T>(), error = %err, "skipping type adapter");
            self.errors.push(err);
        }
        self
    }

    /// Register a type adapter, reporting failure to the caller.
    pub fn try_register_adapter<T: Send + Sync + 'static>(
        &mut self,
        params: &[&str],
        adapter: NativeFunction,
    ) -> Result<Type, TypeBuildError> {
        let name = adapter.name.clone();
        self.check_type_name::<T>(&name)?;
        if params.is_empty() {
            return Err(TypeBuildError::EmptyAdapter { type_name: name });
        }
        if params.len() != adapter.arity() {
            return Err(TypeBuildError::AdapterSignature {
                type_name: name,
                names: params.len(),
                arity: adapter.arity(),
            });
        }

        let mut aggregate = AggregateType::new(name.clone());
        for (param, ty) in params.iter().zip(&adapter.ty.param_types) {
            check_name(&name, param)?;
            if aggregate.members.contains_key(*param) {
                return Err(TypeBuildError::DuplicateMember {
                    type_name: name,
                    member: param.to_string(),
                });
            }
            aggregate = aggregate.with_member(MemberDescriptor {
                name: param.to_string(),
                ty: ty.clone(),
                settable: true,
                gettable: true,
            });
        }
        aggregate.host = Some(TypeId::of::<T>());
        aggregate.adapter = Some(adapter);

        debug!(
            dsl_type = %name,
            rust_type = type_name::<T>(),
            params = params.len(),
            "registered type adapter"
        );
        let ty = aggregate.as_type();
        self.host_to_dsl.insert(TypeId::of::<T>(), name.clone());
        self.aggregates.insert(name, aggregate);
        Ok(ty)
    }

    /// Attach a computed member to a registered host type.
    ///
    /// The member's getter and setter work on the host object; it is not
    /// backed by a field.
    pub fn register_property<T: DslType>(mut self, property: HostMember<T>) -> Self {
        if let Err(err) = self.try_register_property::<T>(property) {
            warn!(rust_type = type_name::<T>(), error = %err, "skipping extension property");
            self.errors.push(err);
        }
        self
    }

    /// Attach a computed member, reporting failure to the caller.
    pub fn try_register_property<T: DslType>(
        &mut self,
        property: HostMember<T>,
    ) -> Result<(), TypeBuildError> {
        let aggregate = self.host_aggregate_mut::<T>()?;
        check_name(&aggregate.name, property.name)?;
        if aggregate.members.contains_key(property.name)
            || aggregate.extension_methods.contains_key(property.name)
        {
            return Err(TypeBuildError::ExtensionClash {
                type_name: aggregate.name.clone(),
                method: property.name.to_string(),
            });
        }
        let property = ExtensionProperty::new(property);
        debug!(dsl_type = %aggregate.name, property = property.name(), "registered extension property");
        aggregate.members.insert(
            property.name().to_string(),
            property.descriptor.clone(),
        );
        aggregate
            .properties
            .insert(property.name().to_string(), property);
        Ok(())
    }

    /// Attach a native method to a registered host type.
    ///
    /// The method receives the receiver through its call context.
    pub fn register_extension_method<T: DslType>(mut self, method: NativeFunction) -> Self {
        if let Err(err) = self.try_register_extension_method::<T>(method) {
            warn!(rust_type = type_name::<T>(), error = %err, "skipping extension method");
            self.errors.push(err);
        }
        self
    }

    /// Attach a native method, reporting failure to the caller.
    pub fn try_register_extension_method<T: DslType>(
        &mut self,
        method: NativeFunction,
    ) -> Result<(), TypeBuildError> {
        let aggregate = self.host_aggregate_mut::<T>()?;
        check_name(&aggregate.name, &method.name)?;
        if aggregate.members.contains_key(&method.name)
            || aggregate.extension_methods.contains_key(&method.name)
        {
            return Err(TypeBuildError::ExtensionClash {
                type_name: aggregate.name.clone(),
                method: method.name.clone(),
            });
        }
        debug!(dsl_type = %aggregate.name, method = %method.name, "registered extension method");
        aggregate
            .extension_methods
            .insert(method.name.clone(), method);
        Ok(())
    }

    /// Add a native function callable from DSL code.
    pub fn register_function(mut self, function: NativeFunction) -> Self {
        if let Err(err) = self.try_register_function(function) {
            warn!(error = %err, "skipping native function");
            self.errors.push(err);
        }
        self
    }

    /// Add a native function, reporting failure to the caller.
    pub fn try_register_function(&mut self, function: NativeFunction) -> Result<(), TypeBuildError> {
        check_name(&function.name, &function.name)?;
        if self.functions.contains_key(&function.name)
            || self.aggregates.contains_key(&function.name)
        {
            return Err(TypeBuildError::DuplicateFunction {
                name: function.name.clone(),
            });
        }
        debug!(function = %function.name, "registered native function");
        self.functions.insert(function.name.clone(), function);
        Ok(())
    }

    /// A DSL type name must be a free identifier and the host type must not
    /// be registered yet.
    fn check_type_name<T: 'static>(&self, name: &str) -> Result<(), TypeBuildError> {
        check_name(name, name)?;
        if self.aggregates.contains_key(name)
            || BuiltInType::from_name(name).is_some()
            || self.functions.contains_key(name)
            || self.host_to_dsl.contains_key(&TypeId::of::<T>())
        {
            return Err(TypeBuildError::DuplicateType {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn host_aggregate_mut<T: 'static>(&mut self) -> Result<&mut AggregateType, TypeBuildError> {
        self.host_to_dsl
            .get(&TypeId::of::<T>())
            .and_then(|name| self.aggregates.get_mut(name))
            .ok_or(TypeBuildError::UnregisteredHostType {
                rust_type: type_name::<T>(),
            })
    }

    /// Errors recorded so far.
    pub fn errors(&self) -> &[TypeBuildError] {
        &self.errors
    }

    /// Freeze the builder into a registry.
    pub fn build(self) -> TypeRegistry {
        let dsl_to_host = self
            .host_to_dsl
            .iter()
            .map(|(id, name)| (name.clone(), *id))
            .collect();
        TypeRegistry {
            aggregates: self.aggregates,
            host_to_dsl: self.host_to_dsl,
            dsl_to_host,
            functions: self.functions,
            errors: self.errors,
        }
    }
}

/// A DSL identifier: ASCII letter or `_`, then letters, digits or `_`.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_name(type_name: &str, name: &str) -> Result<(), TypeBuildError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(TypeBuildError::InvalidName {
            type_name: type_name.to_string(),
            name: name.to_string(),
        })
    }
}

/// Immutable registry of host-derived types and native functions.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    aggregates: IndexMap<String, AggregateType>,
    host_to_dsl: HashMap<TypeId, String>,
    dsl_to_host: HashMap<String, TypeId>,
    functions: IndexMap<String, NativeFunction>,
    errors: Vec<TypeBuildError>,
}

impl TypeRegistry {
    /// Aggregate type by DSL name.
    pub fn aggregate(&self, name: &str) -> Option<&AggregateType> {
        self.aggregates.get(name)
    }

    /// All aggregate types in registration order.
    pub fn aggregates(&self) -> impl Iterator<Item = &AggregateType> {
        self.aggregates.values()
    }

    /// Native function by name.
    pub fn function(&self, name: &str) -> Option<&NativeFunction> {
        self.functions.get(name)
    }

    /// All native functions in registration order.
    pub fn functions(&self) -> impl Iterator<Item = &NativeFunction> {
        self.functions.values()
    }

    /// Extension method of an aggregate type.
    pub fn method(&self, type_name: &str, method: &str) -> Option<&NativeFunction> {
        self.aggregates.get(type_name)?.method(method)
    }

    /// Type adapter of an adapted type.
    pub fn adapter(&self, type_name: &str) -> Option<&NativeFunction> {
        self.aggregates.get(type_name)?.adapter.as_ref()
    }

    /// DSL type of a registered host type.
    pub fn dsl_type_of<T: 'static>(&self) -> Option<Type> {
        self.host_to_dsl
            .get(&TypeId::of::<T>())
            .map(|name| Type::aggregate(name))
    }

    /// Host type registered under a DSL name.
    pub fn host_type_of(&self, name: &str) -> Option<TypeId> {
        self.dsl_to_host.get(name).copied()
    }

    /// Registration failures.
    pub fn build_errors(&self) -> &[TypeBuildError] {
        &self.errors
    }
}
