//! Unary operation evaluation

use crate::ast::{UnaryExpr, UnaryOp};
use crate::error::type_name;
use crate::memory::MemorySpace;
use crate::{EvalError, Value};

use super::{Evaluate, Interpreter};

impl Evaluate for UnaryExpr {
    fn eval(&self, interp: &mut Interpreter, memory: &mut MemorySpace) -> Result<Value, EvalError> {
        let operand = self.operand.eval(interp, memory)?;
        match self.op {
            UnaryOp::Neg => eval_neg(operand),
            UnaryOp::Not => eval_not(operand),
        }
    }
}

/// Evaluate unary negation (`-x`).
pub(crate) fn eval_neg(operand: Value) -> Result<Value, EvalError> {
    match operand {
        Value::Int(n) => n.checked_neg().map(Value::Int).ok_or(EvalError::IntegerOverflow),
        Value::Float(n) => Ok(Value::Float(-n)),
        other => Err(EvalError::InvalidUnaryOperand {
            op: "-".to_string(),
            operand_type: type_name(&other),
        }),
    }
}

/// Evaluate logical NOT (`!x`).
fn eval_not(operand: Value) -> Result<Value, EvalError> {
    match operand {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        other => Err(EvalError::InvalidUnaryOperand {
            op: "!".to_string(),
            operand_type: type_name(&other),
        }),
    }
}
