//! Extension properties: computed members attached to registered host types
//!
//! An extension property is a [`HostMember`] that is not backed by a field.
//! DSL code sees it as an ordinary member: object definitions may set it if
//! it is settable, and reading it runs the getter on the host object the
//! value stands for. Setters run when a value is instantiated, after every
//! field member has been set.

use std::any::{type_name, Any};
use std::sync::Arc;

use super::{aggregate_from_value, DslType, HostMember};
use crate::error::InteropError;
use crate::runtime::RuntimeEnvironment;
use crate::types::MemberDescriptor;
use crate::value::Value;

type ErasedGetter =
    Arc<dyn Fn(&Value, &Arc<RuntimeEnvironment>) -> Result<Value, InteropError> + Send + Sync>;
type ErasedSetter = Arc<
    dyn Fn(&mut dyn Any, &Value, &Arc<RuntimeEnvironment>) -> Result<(), InteropError>
        + Send
        + Sync,
>;

/// A registered extension property with its host type erased.
#[derive(Clone)]
pub struct ExtensionProperty {
    /// Member as the DSL sees it
    pub descriptor: MemberDescriptor,
    get: ErasedGetter,
    set: ErasedSetter,
}

impl ExtensionProperty {
    /// Erase the host type of a computed member.
    pub fn new<T: DslType>(member: HostMember<T>) -> Self {
        let HostMember {
            name,
            ty,
            settable,
            gettable,
            get,
            set,
        } = member;
        let descriptor = MemberDescriptor {
            name: name.to_string(),
            ty: ty(),
            settable,
            gettable,
        };
        Self {
            descriptor,
            get: Arc::new(move |value, env| {
                let host: T = aggregate_from_value(value, env)?;
                Ok(get(&host))
            }),
            set: Arc::new(move |host, value, env| {
                let host = host
                    .downcast_mut::<T>()
                    .ok_or(InteropError::UnregisteredHostType {
                        rust_type: type_name::<T>(),
                    })?;
                set(host, value, env)
            }),
        }
    }

    /// Property name
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Read the property of the host object `value` stands for.
    pub fn get(
        &self,
        type_name: &str,
        value: &Value,
        env: &Arc<RuntimeEnvironment>,
    ) -> Result<Value, InteropError> {
        if !self.descriptor.gettable {
            return Err(InteropError::MemberNotGettable {
                type_name: type_name.to_string(),
                member: self.descriptor.name.clone(),
            });
        }
        (self.get)(value, env)
    }

    /// Store `value` into the property of `host`.
    pub(crate) fn set(
        &self,
        host: &mut dyn Any,
        value: &Value,
        env: &Arc<RuntimeEnvironment>,
    ) -> Result<(), InteropError> {
        (self.set)(host, value, env)
    }
}

impl std::fmt::Debug for ExtensionProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionProperty")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
