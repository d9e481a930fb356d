//! Assignment expression evaluation

use std::sync::Arc;

use crate::ast::{AssignExpr, Expr, Ident};
use crate::error::{type_name, InteropError};
use crate::memory::MemorySpace;
use crate::{EvalError, Value};

use super::{check_type, Evaluate, Interpreter};

impl Evaluate for AssignExpr {
    /// Evaluates to the assigned value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAssignment` if the target is not a local variable or a
    /// member of one.
    fn eval(&self, interp: &mut Interpreter, memory: &mut MemorySpace) -> Result<Value, EvalError> {
        let value = self.value.eval(interp, memory)?;

        match self.target.as_ref() {
            Expr::Ident(ident) => {
                let symbol = interp.symbol_of(ident)?;
                let ty = interp.symbol(symbol).ty.clone();
                let value = value.coerce_to(&ty);
                check_type(&ty, &value, || format!("variable `{}`", ident))?;
                if !memory.assign(symbol, value.clone()) {
                    return Err(not_local(ident));
                }
                Ok(value)
            }
            Expr::Member(_) => {
                let mut path = Vec::new();
                let root = member_path(&self.target, &mut path)?;
                let symbol = interp.symbol_of(root)?;
                let slot = memory.get_mut(symbol).ok_or_else(|| not_local(root))?;
                interp.assign_member(slot, &path, value.clone())?;
                Ok(value)
            }
            _ => Err(EvalError::InvalidAssignment {
                message: "left side must be a variable or a member".to_string(),
            }),
        }
    }
}

fn not_local(ident: &Ident) -> EvalError {
    EvalError::InvalidAssignment {
        message: format!("`{}` is not a local variable", ident),
    }
}

/// Collect `a.b.c` into root `a` and path `[b, c]`.
fn member_path<'a>(expr: &'a Expr, path: &mut Vec<&'a str>) -> Result<&'a Ident, EvalError> {
    match expr {
        Expr::Ident(ident) => Ok(ident),
        Expr::Member(member) => {
            let root = member_path(&member.base, path)?;
            path.push(&member.member.name);
            Ok(root)
        }
        _ => Err(EvalError::InvalidAssignment {
            message: "member assignment must start at a variable".to_string(),
        }),
    }
}

impl Interpreter {
    /// Store `value` at `path` inside `slot`.
    ///
    /// Aggregates are shared, so each one on the path is cloned before it is
    /// modified if anything else still holds it.
    pub(crate) fn assign_member(
        &self,
        slot: &mut Value,
        path: &[&str],
        value: Value,
    ) -> Result<(), EvalError> {
        let Some((first, rest)) = path.split_first() else {
            *slot = value;
            return Ok(());
        };

        let Value::Aggregate(aggregate) = slot else {
            return Err(EvalError::InvalidAssignment {
                message: format!("cannot set member `{}` of `{}`", first, type_name(slot)),
            });
        };

        if !rest.is_empty() {
            let type_name = aggregate.type_name.clone();
            let inner = Arc::make_mut(aggregate)
                .members
                .get_mut(*first)
                .ok_or_else(|| EvalError::UndefinedMember {
                    member: first.to_string(),
                    type_name,
                })?;
            return self.assign_member(inner, rest, value);
        }

        let descriptor = self
            .env
            .aggregate(&aggregate.type_name)
            .and_then(|ty| ty.member(first))
            .cloned()
            .ok_or_else(|| EvalError::UndefinedMember {
                member: first.to_string(),
                type_name: aggregate.type_name.clone(),
            })?;
        if !descriptor.settable {
            return Err(InteropError::MemberNotSettable {
                type_name: aggregate.type_name.clone(),
                member: first.to_string(),
            }
            .into());
        }

        let value = value.coerce_to(&descriptor.ty);
        check_type(&descriptor.ty, &value, || {
            format!("member `{}` of `{}`", first, aggregate.type_name)
        })?;
        Arc::make_mut(aggregate).set(*first, value);
        Ok(())
    }
}
