//! Callable value types: user functions and natives

use std::sync::Arc;

use super::Value;
use crate::ast::FnDef;
use crate::error::NativeError;
use crate::interop::CallContext;
use crate::symbols::SymbolId;
use crate::types::FunctionType;

/// Type alias for native function pointers to reduce complexity
pub type NativeFnPtr =
    Arc<dyn Fn(&mut CallContext<'_>, &[Value]) -> Result<Value, NativeError> + Send + Sync>;

/// A user-defined function.
///
/// Stores the AST directly for interpretation.
#[derive(Debug, Clone)]
pub struct FunctionValue {
    /// Function name
    pub name: String,

    /// Symbol the function was declared as
    pub symbol: SymbolId,

    /// Declared signature
    pub ty: Arc<FunctionType>,

    /// The function definition
    pub def: Arc<FnDef>,
}

impl FunctionValue {
    /// Create a new function value
    pub fn new(symbol: SymbolId, ty: FunctionType, def: Arc<FnDef>) -> Self {
        Self {
            name: def.name.name.clone(),
            symbol,
            ty: Arc::new(ty),
            def,
        }
    }
}

/// A native function or extension method.
///
/// Natives receive already-evaluated arguments; extension methods find
/// their receiver in the [`CallContext`].
#[derive(Clone)]
pub struct NativeFunction {
    /// Function name (for display/debugging)
    pub name: String,

    /// Signature, without the receiver for methods
    pub ty: Arc<FunctionType>,

    /// The actual function pointer
    pub func: NativeFnPtr,
}

impl NativeFunction {
    /// Wrap a Rust closure as a native function.
    pub fn new<F>(name: impl Into<String>, ty: FunctionType, func: F) -> Self
    where
        F: Fn(&mut CallContext<'_>, &[Value]) -> Result<Value, NativeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            ty: Arc::new(ty),
            func: Arc::new(func),
        }
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.ty.arity()
    }
}

impl std::fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}
