//! Member access evaluation

use crate::ast::MemberExpr;
use crate::error::type_name;
use crate::memory::MemorySpace;
use crate::{EvalError, Value};

use super::{Evaluate, Interpreter};

impl Evaluate for MemberExpr {
    fn eval(&self, interp: &mut Interpreter, memory: &mut MemorySpace) -> Result<Value, EvalError> {
        let base = self.base.eval(interp, memory)?;
        interp.member_of(&base, &self.member.name)
    }
}

impl Interpreter {
    /// Read a member of an aggregate or prototype value.
    ///
    /// Extension properties are computed from the host object the value
    /// stands for. A member the type declares but the value never set reads
    /// as `none`.
    ///
    /// # Errors
    ///
    /// Returns `UndefinedMember` if the type has no such member.
    pub(crate) fn member_of(&self, base: &Value, member: &str) -> Result<Value, EvalError> {
        let type_name = type_name(base);
        let aggregate = self.env.aggregate(&type_name);
        if let Some(property) = aggregate.and_then(|aggregate| aggregate.property(member)) {
            return Ok(property.get(&type_name, base, &self.env)?);
        }
        if let Some(value) = base.member(member) {
            return Ok(value.clone());
        }

        let declared = aggregate
            .and_then(|aggregate| aggregate.member(member))
            .is_some();
        if declared {
            Ok(Value::None)
        } else {
            Err(EvalError::UndefinedMember {
                member: member.to_string(),
                type_name,
            })
        }
    }
}
