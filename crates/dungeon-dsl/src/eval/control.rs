//! Control flow mechanism for return

use crate::Value;

/// Control flow signal for non-local jumps.
///
/// When `return` is evaluated, it doesn't return a normal
/// `Result<Value, EvalError>`. Instead, it returns an `Err(EvalError::ControlFlow(...))`
/// that propagates up until caught by the enclosing function call.
#[derive(Debug, Clone)]
pub enum ControlFlow {
    /// Return from a function with a value.
    Return {
        /// Value to return from the function
        value: Value,
    },
}

impl ControlFlow {
    /// Create a return.
    pub fn return_with(value: Value) -> Self {
        ControlFlow::Return { value }
    }
}

impl From<ControlFlow> for crate::EvalError {
    fn from(cf: ControlFlow) -> Self {
        crate::EvalError::ControlFlow(cf)
    }
}
