//! Identifier evaluation (variable and declaration lookup)

use crate::ast::Ident;
use crate::memory::MemorySpace;
use crate::{EvalError, Value};

use super::{Evaluate, Interpreter};

impl Evaluate for Ident {
    fn eval(&self, interp: &mut Interpreter, memory: &mut MemorySpace) -> Result<Value, EvalError> {
        let symbol = interp.symbol_of(self)?;

        // Locals of the current call shadow top-level declarations
        if let Some(value) = memory.get(symbol) {
            return Ok(value.clone());
        }
        interp.global_value(symbol)
    }
}
