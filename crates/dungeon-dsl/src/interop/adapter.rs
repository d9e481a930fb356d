//! Callback adapters: interpreted functions behind host callback slots
//!
//! [`CallbackAdapter::build`] picks an [`AdapterKind`] from the function's
//! arity and whether it returns a value. The typed slots ([`Consumer`],
//! [`BiFunction`], ...) check that the function fits the host's expected
//! signature when they are created and translate arguments and results with
//! [`HostValue`].

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::trace;

use super::HostValue;
use crate::context::EvalContext;
use crate::error::InteropError;
use crate::eval::Interpreter;
use crate::runtime::RuntimeEnvironment;
use crate::types::{FunctionType, Type};
use crate::value::Value;

/// Host calling contract an adapter satisfies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    /// No arguments, no result
    Runnable,
    /// No arguments, a result
    Supplier,
    /// One argument, no result
    Consumer,
    /// One argument, a result
    Function,
    /// Two arguments, no result
    BiConsumer,
    /// Two arguments, a result
    BiFunction,
    /// Always three arguments, no result; extra arguments are dropped
    TriConsumer,
}

impl AdapterKind {
    /// The kind matching a function signature.
    pub fn for_signature(ty: &FunctionType) -> Option<Self> {
        let kind = match (ty.arity(), ty.returns_value()) {
            (0, false) => AdapterKind::Runnable,
            (0, true) => AdapterKind::Supplier,
            (1, false) => AdapterKind::Consumer,
            (1, true) => AdapterKind::Function,
            (2, false) => AdapterKind::BiConsumer,
            (2, true) => AdapterKind::BiFunction,
            (3, false) => AdapterKind::TriConsumer,
            _ => return None,
        };
        Some(kind)
    }

    /// Number of arguments the host passes.
    pub fn arity(self) -> usize {
        match self {
            AdapterKind::Runnable | AdapterKind::Supplier => 0,
            AdapterKind::Consumer | AdapterKind::Function => 1,
            AdapterKind::BiConsumer | AdapterKind::BiFunction => 2,
            AdapterKind::TriConsumer => 3,
        }
    }
}

/// An interpreted (or native) function wrapped for host invocation.
///
/// Every call runs on a fresh interpreter over the shared environment.
#[derive(Clone)]
pub struct CallbackAdapter {
    function: Value,
    name: String,
    ty: Arc<FunctionType>,
    kind: AdapterKind,
    env: Arc<RuntimeEnvironment>,
    ctx: EvalContext,
}

impl std::fmt::Debug for CallbackAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackAdapter")
            .field("function", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

fn signature_of(function: &Value) -> Result<(String, Arc<FunctionType>), InteropError> {
    match function {
        Value::Function(f) => Ok((f.name.clone(), f.ty.clone())),
        Value::Native(n) => Ok((n.name.clone(), n.ty.clone())),
        other => Err(InteropError::NotCallable {
            found: other.ty().to_string(),
        }),
    }
}

impl CallbackAdapter {
    /// Wrap a function value, choosing the adapter kind from its signature.
    pub fn build(function: &Value, env: Arc<RuntimeEnvironment>) -> Result<Self, InteropError> {
        let (name, ty) = signature_of(function)?;
        let kind =
            AdapterKind::for_signature(&ty).ok_or_else(|| InteropError::SignatureMismatch {
                function: name.clone(),
                expected: "at most three parameters".to_string(),
                found: ty.to_string(),
            })?;
        Ok(Self::with_kind(function.clone(), name, ty, kind, env))
    }

    /// Wrap a function for a host slot that always passes three arguments.
    ///
    /// The function may declare up to three parameters; extra arguments are
    /// dropped from the end.
    pub fn build_tri_consumer(
        function: &Value,
        env: Arc<RuntimeEnvironment>,
    ) -> Result<Self, InteropError> {
        let (name, ty) = signature_of(function)?;
        if ty.arity() > 3 || ty.returns_value() {
            return Err(InteropError::SignatureMismatch {
                function: name,
                expected: "at most three parameters and no result".to_string(),
                found: ty.to_string(),
            });
        }
        Ok(Self::with_kind(
            function.clone(),
            name,
            ty,
            AdapterKind::TriConsumer,
            env,
        ))
    }

    /// Wrap a function for a slot of a given kind.
    pub fn for_kind(
        kind: AdapterKind,
        function: &Value,
        env: Arc<RuntimeEnvironment>,
    ) -> Result<Self, InteropError> {
        match kind {
            AdapterKind::TriConsumer => Self::build_tri_consumer(function, env),
            _ => Self::build(function, env),
        }
    }

    fn with_kind(
        function: Value,
        name: String,
        ty: Arc<FunctionType>,
        kind: AdapterKind,
        env: Arc<RuntimeEnvironment>,
    ) -> Self {
        Self {
            function,
            name,
            ty,
            kind,
            env,
            ctx: EvalContext::default(),
        }
    }

    /// Use a custom evaluation context for calls.
    pub fn with_context(mut self, ctx: EvalContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// The wrapped function value.
    pub fn function(&self) -> &Value {
        &self.function
    }

    /// Name of the wrapped function.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared signature of the wrapped function.
    pub fn signature(&self) -> &FunctionType {
        &self.ty
    }

    /// Calling contract of this adapter.
    pub fn kind(&self) -> AdapterKind {
        self.kind
    }

    /// Environment the function runs in.
    pub fn env(&self) -> &Arc<RuntimeEnvironment> {
        &self.env
    }

    /// Check the wrapped function against a host slot signature.
    pub fn check_signature(
        &self,
        kind: AdapterKind,
        params: &[Type],
        ret: &Type,
    ) -> Result<(), InteropError> {
        let declared = &self.ty.param_types;
        let params_fit = declared.len() <= params.len()
            && (kind == AdapterKind::TriConsumer || declared.len() == params.len())
            && declared.iter().zip(params).all(|(p, a)| p.accepts(a));
        let ret_fits = !kind_returns(kind) || ret.accepts(&self.ty.return_type);

        if self.kind == kind && params_fit && ret_fits {
            Ok(())
        } else {
            Err(InteropError::SignatureMismatch {
                function: self.name.clone(),
                expected: FunctionType::new(ret.clone(), params.to_vec()).to_string(),
                found: self.ty.to_string(),
            })
        }
    }

    /// Call the function with host-side arguments already translated to values.
    pub fn call(&self, args: Vec<Value>) -> Result<Value, InteropError> {
        let mut args = args;
        if self.kind == AdapterKind::TriConsumer {
            args.truncate(self.ty.arity());
        }
        trace!(function = %self.name, kind = ?self.kind, "calling callback");

        let mut interpreter = Interpreter::with_context(self.env.clone(), self.ctx.clone());
        interpreter
            .invoke(&self.function, args)
            .map_err(|source| InteropError::Callback {
                function: self.name.clone(),
                source: Box::new(source),
            })
    }
}

fn kind_returns(kind: AdapterKind) -> bool {
    matches!(
        kind,
        AdapterKind::Supplier | AdapterKind::Function | AdapterKind::BiFunction
    )
}

impl HostValue for () {
    fn dsl_type() -> Type {
        Type::NONE
    }

    fn to_value(&self) -> Value {
        Value::None
    }

    fn from_value(_value: &Value, _env: &Arc<RuntimeEnvironment>) -> Result<Self, InteropError> {
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Typed Host Slots
// ═══════════════════════════════════════════════════════════════════════

macro_rules! callback_slot {
    (
        $(#[$meta:meta])*
        $slot:ident<$($param:ident),*>: $kind:ident, fn($($arg:ident),*) -> $ret:ty
    ) => {
        $(#[$meta])*
        pub struct $slot<$($param),*> {
            adapter: CallbackAdapter,
            _marker: PhantomData<fn($($arg),*) -> $ret>,
        }

        impl<$($param: HostValue),*> $slot<$($param),*> {
            /// Wrap an adapter, checking the function against the slot signature.
            pub fn new(adapter: CallbackAdapter) -> Result<Self, InteropError> {
                adapter.check_signature(
                    AdapterKind::$kind,
                    &[$(<$arg as HostValue>::dsl_type()),*],
                    &<$ret as HostValue>::dsl_type(),
                )?;
                Ok(Self {
                    adapter,
                    _marker: PhantomData,
                })
            }

            /// The underlying adapter.
            pub fn adapter(&self) -> &CallbackAdapter {
                &self.adapter
            }
        }

        impl<$($param),*> Clone for $slot<$($param),*> {
            fn clone(&self) -> Self {
                Self {
                    adapter: self.adapter.clone(),
                    _marker: PhantomData,
                }
            }
        }

        impl<$($param),*> std::fmt::Debug for $slot<$($param),*> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($slot), self.adapter.name)
            }
        }

        impl<$($param: HostValue),*> HostValue for $slot<$($param),*> {
            fn dsl_type() -> Type {
                Type::function(
                    <$ret as HostValue>::dsl_type(),
                    vec![$(<$arg as HostValue>::dsl_type()),*],
                )
            }

            fn to_value(&self) -> Value {
                self.adapter.function.clone()
            }

            fn from_value(value: &Value, env: &Arc<RuntimeEnvironment>) -> Result<Self, InteropError> {
                Self::new(CallbackAdapter::for_kind(AdapterKind::$kind, value, env.clone())?)
            }
        }
    };
}

callback_slot! {
    /// Host slot for `fn()`.
    Runnable<>: Runnable, fn() -> ()
}

callback_slot! {
    /// Host slot for `fn() -> R`.
    Supplier<R>: Supplier, fn() -> R
}

callback_slot! {
    /// Host slot for `fn(A)`.
    Consumer<A>: Consumer, fn(A) -> ()
}

callback_slot! {
    /// Host slot for `fn(A) -> R`.
    Function<A, R>: Function, fn(A) -> R
}

callback_slot! {
    /// Host slot for `fn(A, B)`.
    BiConsumer<A, B>: BiConsumer, fn(A, B) -> ()
}

callback_slot! {
    /// Host slot for `fn(A, B) -> R`.
    BiFunction<A, B, R>: BiFunction, fn(A, B) -> R
}

callback_slot! {
    /// Host slot that always passes three arguments.
    TriConsumer<A, B, C>: TriConsumer, fn(A, B, C) -> ()
}

impl Runnable {
    /// Run the callback.
    pub fn run(&self) -> Result<(), InteropError> {
        self.adapter.call(vec![]).map(|_| ())
    }
}

impl<R: HostValue> Supplier<R> {
    /// Call the callback and translate its result.
    pub fn get(&self) -> Result<R, InteropError> {
        let result = self.adapter.call(vec![])?;
        R::from_value(&result, &self.adapter.env)
    }
}

impl<A: HostValue> Consumer<A> {
    /// Call the callback with one argument.
    pub fn accept(&self, a: &A) -> Result<(), InteropError> {
        self.adapter.call(vec![a.to_value()]).map(|_| ())
    }
}

impl<A: HostValue, R: HostValue> Function<A, R> {
    /// Call the callback with one argument and translate its result.
    pub fn apply(&self, a: &A) -> Result<R, InteropError> {
        let result = self.adapter.call(vec![a.to_value()])?;
        R::from_value(&result, &self.adapter.env)
    }
}

impl<A: HostValue, B: HostValue> BiConsumer<A, B> {
    /// Call the callback with two arguments.
    pub fn accept(&self, a: &A, b: &B) -> Result<(), InteropError> {
        self.adapter
            .call(vec![a.to_value(), b.to_value()])
            .map(|_| ())
    }
}

impl<A: HostValue, B: HostValue, R: HostValue> BiFunction<A, B, R> {
    /// Call the callback with two arguments and translate its result.
    pub fn apply(&self, a: &A, b: &B) -> Result<R, InteropError> {
        let result = self.adapter.call(vec![a.to_value(), b.to_value()])?;
        R::from_value(&result, &self.adapter.env)
    }
}

impl<A: HostValue, B: HostValue, C: HostValue> TriConsumer<A, B, C> {
    /// Call the callback with three arguments.
    pub fn accept(&self, a: &A, b: &B, c: &C) -> Result<(), InteropError> {
        self.adapter
            .call(vec![a.to_value(), b.to_value(), c.to_value()])
            .map(|_| ())
    }
}
