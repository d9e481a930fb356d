//! Function and method call evaluation

use tracing::debug;

use crate::ast::{CallExpr, Expr, MethodCallExpr};
use crate::error::type_name;
use crate::eval::control::ControlFlow;
use crate::interop::{call_native, CallContext};
use crate::memory::MemorySpace;
use crate::value::{FunctionValue, NativeFunction};
use crate::{EvalError, Value};

use super::collection::collection_method;
use super::{check_type, stmt, Evaluate, Interpreter};

impl Evaluate for CallExpr {
    fn eval(&self, interp: &mut Interpreter, memory: &mut MemorySpace) -> Result<Value, EvalError> {
        let callee = self.callee.eval(interp, memory)?;
        if !callee.is_callable() {
            return Err(EvalError::NotCallable {
                name: self.callee.name.clone(),
            });
        }

        // Arguments evaluate left to right
        let args = eval_args(&self.args, interp, memory)?;
        interp.invoke_value(&callee, args, memory)
    }
}

impl Evaluate for MethodCallExpr {
    fn eval(&self, interp: &mut Interpreter, memory: &mut MemorySpace) -> Result<Value, EvalError> {
        let receiver = self.receiver.eval(interp, memory)?;
        let args = eval_args(&self.args, interp, memory)?;
        interp.call_method(&receiver, &self.method.name, args, memory)
    }
}

fn eval_args(
    args: &[Expr],
    interp: &mut Interpreter,
    memory: &mut MemorySpace,
) -> Result<Vec<Value>, EvalError> {
    args.iter().map(|arg| arg.eval(interp, memory)).collect()
}

impl Interpreter {
    /// Call a Value as a function.
    ///
    /// # Errors
    ///
    /// Returns `NotCallable` if the value is not a function.
    /// Returns `ArityMismatch` if the argument count doesn't match.
    pub(crate) fn invoke_value(
        &mut self,
        function: &Value,
        args: Vec<Value>,
        memory: &mut MemorySpace,
    ) -> Result<Value, EvalError> {
        match function {
            Value::Function(f) => self.call_function(f, args, memory),
            Value::Native(native) => self.call_native(native, None, args),
            other => Err(EvalError::NotCallable {
                name: type_name(other),
            }),
        }
    }

    /// Call a user-defined function.
    ///
    /// Parameters are bound in a fresh call frame that is popped on every
    /// exit path, including `return` and errors.
    fn call_function(
        &mut self,
        function: &FunctionValue,
        args: Vec<Value>,
        memory: &mut MemorySpace,
    ) -> Result<Value, EvalError> {
        if args.len() != function.ty.arity() {
            return Err(EvalError::ArityMismatch {
                name: function.name.clone(),
                expected: function.ty.arity(),
                got: args.len(),
            });
        }
        if self.ctx.trace {
            debug!(function = %function.name, args = ?args, "call");
        }

        let params = function
            .def
            .params
            .iter()
            .map(|param| self.symbol_of(&param.name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut call = memory.call_guard()?;
        for ((symbol, arg), ty) in params.into_iter().zip(args).zip(&function.ty.param_types) {
            let arg = arg.coerce_to(ty);
            check_type(ty, &arg, || {
                format!("argument `{}` of `{}`", self.symbol(symbol).name, function.name)
            })?;
            call.define(symbol, arg);
        }

        let result = match stmt::exec_stmts(&function.def.body.stmts, self, &mut call) {
            Ok(()) => Value::None,
            Err(EvalError::ControlFlow(ControlFlow::Return { value })) => value,
            Err(e) => return Err(e),
        };

        let result = result.coerce_to(&function.ty.return_type);
        check_type(&function.ty.return_type, &result, || {
            format!("result of `{}`", function.name)
        })?;
        if self.ctx.trace {
            debug!(function = %function.name, result = ?result, "return");
        }
        Ok(result)
    }

    /// Call a native with evaluated arguments and an optional receiver.
    fn call_native(
        &mut self,
        native: &NativeFunction,
        receiver: Option<&Value>,
        args: Vec<Value>,
    ) -> Result<Value, EvalError> {
        if self.ctx.trace {
            debug!(native = %native.name, args = ?args, "native call");
        }
        let mut ctx = CallContext {
            env: &self.env,
            output: self.output.as_mut(),
            receiver,
        };
        call_native(native, &mut ctx, args)
    }

    /// Dispatch `receiver.method(args)`.
    ///
    /// Lists and sets have built-in methods. For other values, extension
    /// methods registered for the receiver's type win; otherwise a member
    /// holding a function is called.
    pub(crate) fn call_method(
        &mut self,
        receiver: &Value,
        method: &str,
        args: Vec<Value>,
        memory: &mut MemorySpace,
    ) -> Result<Value, EvalError> {
        if let Some(result) = collection_method(receiver, method, &args) {
            return result;
        }

        let type_name = type_name(receiver);
        let extension = self.env.registry().method(&type_name, method).cloned();
        if let Some(native) = extension {
            return self.call_native(&native, Some(receiver), args);
        }

        match receiver.member(method) {
            Some(member) if member.is_callable() => {
                let member = member.clone();
                self.invoke_value(&member, args, memory)
            }
            Some(_) => Err(EvalError::NotCallable {
                name: format!("{}.{}", type_name, method),
            }),
            None => Err(EvalError::UndefinedMember {
                member: method.to_string(),
                type_name,
            }),
        }
    }
}
