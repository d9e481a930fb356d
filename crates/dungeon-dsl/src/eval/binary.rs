//! Binary operation evaluation

use std::cmp::Ordering;

use crate::ast::{BinaryExpr, BinaryOp, Expr};
use crate::error::type_name;
use crate::memory::MemorySpace;
use crate::{EvalError, Value};

use super::{Evaluate, Interpreter};

impl Evaluate for BinaryExpr {
    fn eval(&self, interp: &mut Interpreter, memory: &mut MemorySpace) -> Result<Value, EvalError> {
        // Short-circuit evaluation for `and` and `or`
        match self.op {
            BinaryOp::And => return eval_and(&self.lhs, &self.rhs, interp, memory),
            BinaryOp::Or => return eval_or(&self.lhs, &self.rhs, interp, memory),
            _ => {}
        }

        let left = self.lhs.eval(interp, memory)?;
        let right = self.rhs.eval(interp, memory)?;
        apply(self.op, left, right)
    }
}

/// Apply a non-short-circuiting operator to evaluated operands.
pub fn apply(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    match op {
        // Arithmetic
        BinaryOp::Add => eval_add(left, right),
        BinaryOp::Sub => eval_arith(op, left, right, i64::checked_sub, |a, b| a - b),
        BinaryOp::Mul => eval_arith(op, left, right, i64::checked_mul, |a, b| a * b),
        BinaryOp::Div => eval_div(left, right),

        // Comparison
        BinaryOp::Eq => Ok(Value::Bool(values_equal(&left, &right))),
        BinaryOp::Ne => Ok(Value::Bool(!values_equal(&left, &right))),
        BinaryOp::Lt => compare(op, &left, &right, Ordering::is_lt),
        BinaryOp::Le => compare(op, &left, &right, Ordering::is_le),
        BinaryOp::Gt => compare(op, &left, &right, Ordering::is_gt),
        BinaryOp::Ge => compare(op, &left, &right, Ordering::is_ge),

        BinaryOp::And | BinaryOp::Or => {
            let l = expect_bool(op, &left, &right)?;
            let r = expect_bool(op, &right, &left)?;
            Ok(Value::Bool(if op == BinaryOp::And { l && r } else { l || r }))
        }
    }
}

fn symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
    }
}

fn invalid(op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    EvalError::InvalidBinaryOperands {
        op: symbol(op).to_string(),
        left_type: type_name(left),
        right_type: type_name(right),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Arithmetic
// ═══════════════════════════════════════════════════════════════════════

/// `+`: numeric addition, or concatenation when either side is a string.
fn eval_add(left: Value, right: Value) -> Result<Value, EvalError> {
    match (&left, &right) {
        (Value::String(a), Value::String(b)) => Ok(Value::string(format!("{}{}", a, b))),
        (Value::String(a), other) => Ok(Value::string(format!("{}{}", a, other))),
        (other, Value::String(b)) => Ok(Value::string(format!("{}{}", other, b))),
        _ => eval_arith(BinaryOp::Add, left, right, i64::checked_add, |a, b| a + b),
    }
}

fn eval_arith(
    op: BinaryOp,
    left: Value,
    right: Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => int_op(*a, *b)
            .map(Value::Int)
            .ok_or(EvalError::IntegerOverflow),
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => Ok(Value::Float(float_op(a, b))),
            _ => Err(invalid(op, &left, &right)),
        },
    }
}

fn eval_div(left: Value, right: Value) -> Result<Value, EvalError> {
    match (&left, &right) {
        (Value::Int(_), Value::Int(0)) => Err(EvalError::DivisionByZero),
        (Value::Int(a), Value::Int(b)) => a
            .checked_div(*b)
            .map(Value::Int)
            .ok_or(EvalError::IntegerOverflow),
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => Ok(Value::Float(a / b)),
            _ => Err(invalid(BinaryOp::Div, &left, &right)),
        },
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Comparison
// ═══════════════════════════════════════════════════════════════════════

/// Equality with int/float promotion.
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(_), Value::Float(_)) | (Value::Float(_), Value::Int(_)) => {
            left.as_float() == right.as_float()
        }
        _ => left == right,
    }
}

fn compare(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    test: fn(Ordering) -> bool,
) -> Result<Value, EvalError> {
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => return Err(invalid(op, left, right)),
        },
    };
    // NaN compares false
    Ok(Value::Bool(ordering.is_some_and(test)))
}

// ═══════════════════════════════════════════════════════════════════════
// Logic
// ═══════════════════════════════════════════════════════════════════════

fn expect_bool(op: BinaryOp, value: &Value, other: &Value) -> Result<bool, EvalError> {
    value.as_bool().ok_or_else(|| invalid(op, value, other))
}

fn eval_and(
    lhs: &Expr,
    rhs: &Expr,
    interp: &mut Interpreter,
    memory: &mut MemorySpace,
) -> Result<Value, EvalError> {
    let left = lhs.eval(interp, memory)?;
    if !expect_bool(BinaryOp::And, &left, &Value::Bool(false))? {
        return Ok(Value::Bool(false));
    }
    let right = rhs.eval(interp, memory)?;
    Ok(Value::Bool(expect_bool(BinaryOp::And, &right, &left)?))
}

fn eval_or(
    lhs: &Expr,
    rhs: &Expr,
    interp: &mut Interpreter,
    memory: &mut MemorySpace,
) -> Result<Value, EvalError> {
    let left = lhs.eval(interp, memory)?;
    if expect_bool(BinaryOp::Or, &left, &Value::Bool(false))? {
        return Ok(Value::Bool(true));
    }
    let right = rhs.eval(interp, memory)?;
    Ok(Value::Bool(expect_bool(BinaryOp::Or, &right, &left)?))
}
