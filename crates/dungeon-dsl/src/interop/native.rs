//! Native function invocation

use std::io::Write;
use std::sync::Arc;

use tracing::warn;

use crate::error::{EvalError, NativeError};
use crate::runtime::RuntimeEnvironment;
use crate::value::{NativeFunction, Value};

/// What a native function can reach while it runs.
pub struct CallContext<'a> {
    /// Environment of the running program
    pub env: &'a Arc<RuntimeEnvironment>,
    /// Output sink of the interpreter
    pub output: &'a mut dyn Write,
    /// Receiver of an extension method call
    pub receiver: Option<&'a Value>,
}

impl CallContext<'_> {
    /// The receiver of an extension method, or a shape error.
    pub fn receiver(&self) -> Result<&Value, NativeError> {
        self.receiver.ok_or(NativeError::Shape {
            expected: "a method receiver",
            found: "none".to_string(),
        })
    }
}

/// Call a native with already-evaluated arguments.
///
/// Arguments are promoted to the declared parameter types. A shape error
/// from the native means a value of an unexpected type slipped past the
/// type system; it is logged and the call yields `none`.
pub fn call_native(
    native: &NativeFunction,
    ctx: &mut CallContext<'_>,
    args: Vec<Value>,
) -> Result<Value, EvalError> {
    if args.len() != native.arity() {
        return Err(EvalError::ArityMismatch {
            name: native.name.clone(),
            expected: native.arity(),
            got: args.len(),
        });
    }

    let args: Vec<Value> = args
        .into_iter()
        .zip(native.ty.param_types.iter())
        .map(|(arg, ty)| arg.coerce_to(ty))
        .collect();

    match (native.func)(ctx, &args) {
        Ok(value) => Ok(value),
        Err(err @ NativeError::Shape { .. }) => {
            warn!(native = %native.name, error = %err, "native call recovered with no result");
            Ok(Value::None)
        }
        Err(NativeError::Failed(message)) => Err(EvalError::Native {
            name: native.name.clone(),
            message,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TypeBuilder;
    use crate::types::{FunctionType, Type};

    fn double() -> NativeFunction {
        NativeFunction::new(
            "double",
            FunctionType::new(Type::FLOAT, vec![Type::FLOAT]),
            |_ctx, args| match &args[0] {
                Value::Float(n) => Ok(Value::Float(n * 2.0)),
                other => Err(NativeError::shape("float", other)),
            },
        )
    }

    fn with_ctx<R>(f: impl FnOnce(&mut CallContext<'_>) -> R) -> R {
        let env = Arc::new(RuntimeEnvironment::new(Arc::new(TypeBuilder::new().build())));
        let mut out = Vec::new();
        let mut ctx = CallContext {
            env: &env,
            output: &mut out,
            receiver: None,
        };
        f(&mut ctx)
    }

    #[test]
    fn test_arguments_are_promoted() {
        let result = with_ctx(|ctx| call_native(&double(), ctx, vec![Value::Int(2)])).unwrap();
        assert_eq!(result, Value::Float(4.0));
    }

    #[test]
    fn test_arity_is_checked() {
        let err = with_ctx(|ctx| call_native(&double(), ctx, vec![])).unwrap_err();
        assert!(matches!(err, EvalError::ArityMismatch { expected: 1, got: 0, .. }));
    }

    #[test]
    fn test_shape_error_yields_none() {
        let result = with_ctx(|ctx| call_native(&double(), ctx, vec![Value::string("x")])).unwrap();
        assert_eq!(result, Value::None);
    }

    #[test]
    fn test_failure_propagates() {
        let failing = NativeFunction::new("fail", FunctionType::new(Type::NONE, vec![]), |_, _| {
            Err(NativeError::Failed("boom".to_string()))
        });
        let err = with_ctx(|ctx| call_native(&failing, ctx, vec![])).unwrap_err();
        assert_eq!(err.to_string(), "native function `fail` failed: boom");
    }

    #[test]
    fn test_missing_receiver_is_shape_error() {
        with_ctx(|ctx| {
            assert!(matches!(ctx.receiver(), Err(NativeError::Shape { .. })));
        });
    }
}
