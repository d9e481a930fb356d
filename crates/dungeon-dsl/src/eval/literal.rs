//! Literal evaluation

use crate::ast::Literal;
use crate::memory::MemorySpace;
use crate::{EvalError, Value};

use super::{Evaluate, Interpreter};

impl Evaluate for Literal {
    fn eval(&self, _interp: &mut Interpreter, _memory: &mut MemorySpace) -> Result<Value, EvalError> {
        Ok(eval_lit(self))
    }
}

/// Evaluate a literal to a Value.
pub fn eval_lit(lit: &Literal) -> Value {
    match lit {
        Literal::Int(n) => Value::Int(*n),
        Literal::Float(n) => Value::Float(*n),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Str(s) => Value::string(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_literals() {
        assert_eq!(eval_lit(&Literal::Int(42)), Value::Int(42));
        assert_eq!(eval_lit(&Literal::Float(1.5)), Value::Float(1.5));
        assert_eq!(eval_lit(&Literal::Bool(true)), Value::Bool(true));
        assert_eq!(eval_lit(&Literal::Str("hi".into())), Value::string("hi"));
    }
}
