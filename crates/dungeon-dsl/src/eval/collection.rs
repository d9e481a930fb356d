//! List and set literals and the methods every collection has
//!
//! A literal takes the type of its entries: `[1, 2]` is an `int[]`, `<"a">`
//! a `string<>`. Mixing `int` and `float` entries yields `float` elements;
//! an empty literal has element type `none` and fits any collection of the
//! same kind.

use crate::ast::Expr;
use crate::error::type_name;
use crate::memory::MemorySpace;
use crate::types::Type;
use crate::value::{ListValue, SetValue};
use crate::{EvalError, Value};

use super::{Evaluate, Interpreter};

impl Interpreter {
    /// Evaluate a `[...]` literal.
    pub(crate) fn eval_list(
        &mut self,
        entries: &[Expr],
        memory: &mut MemorySpace,
    ) -> Result<Value, EvalError> {
        let entries = self.eval_entries(entries, memory)?;
        let element = element_type(&entries, "list")?;
        let entries = entries
            .into_iter()
            .map(|entry| entry.coerce_to(&element))
            .collect();
        Ok(Value::list(element, entries))
    }

    /// Evaluate a `<...>` literal. Repeated entries are dropped.
    pub(crate) fn eval_set(
        &mut self,
        entries: &[Expr],
        memory: &mut MemorySpace,
    ) -> Result<Value, EvalError> {
        let entries = self.eval_entries(entries, memory)?;
        let element = element_type(&entries, "set")?;
        let entries: Vec<Value> = entries
            .into_iter()
            .map(|entry| entry.coerce_to(&element))
            .collect();
        Ok(Value::set(element, entries))
    }

    fn eval_entries(
        &mut self,
        entries: &[Expr],
        memory: &mut MemorySpace,
    ) -> Result<Vec<Value>, EvalError> {
        entries.iter().map(|entry| entry.eval(self, memory)).collect()
    }
}

/// The type every entry fits into, `none` for no entries.
fn element_type(entries: &[Value], kind: &str) -> Result<Type, EvalError> {
    let mut element = Type::NONE;
    for entry in entries.iter().filter(|entry| !entry.is_none()) {
        let ty = entry.ty();
        if element == Type::NONE || ty.accepts(&element) {
            element = ty;
        } else if !element.accepts(&ty) {
            return Err(EvalError::TypeError {
                message: format!("{} entry expects `{}`, found `{}`", kind, element, ty),
            });
        }
    }
    Ok(element)
}

/// Call a built-in collection method, or `None` if `receiver` is no
/// collection or has no such method.
///
/// Lists have `size()` and `get(index)`; sets have `size()` and
/// `contains(value)`.
pub(crate) fn collection_method(
    receiver: &Value,
    method: &str,
    args: &[Value],
) -> Option<Result<Value, EvalError>> {
    let result = match (receiver, method) {
        (Value::List(list), "size") => {
            expect_args(receiver, method, args, 0).map(|()| size(list.len()))
        }
        (Value::Set(set), "size") => expect_args(receiver, method, args, 0).map(|()| size(set.len())),
        (Value::List(list), "get") => {
            expect_args(receiver, method, args, 1).and_then(|()| list_get(list, &args[0]))
        }
        (Value::Set(set), "contains") => {
            expect_args(receiver, method, args, 1).map(|()| set_contains(set, &args[0]))
        }
        _ => return None,
    };
    Some(result)
}

fn size(len: usize) -> Value {
    Value::Int(i64::try_from(len).unwrap_or(i64::MAX))
}

fn list_get(list: &ListValue, index: &Value) -> Result<Value, EvalError> {
    let index = index.as_int().ok_or_else(|| EvalError::TypeError {
        message: format!("list index expects `int`, found `{}`", type_name(index)),
    })?;
    usize::try_from(index)
        .ok()
        .and_then(|i| list.entries.get(i))
        .cloned()
        .ok_or(EvalError::IndexOutOfRange {
            index,
            len: list.len(),
        })
}

fn set_contains(set: &SetValue, value: &Value) -> Value {
    Value::Bool(set.contains(&value.clone().coerce_to(&set.element)))
}

fn expect_args(
    receiver: &Value,
    method: &str,
    args: &[Value],
    expected: usize,
) -> Result<(), EvalError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::ArityMismatch {
            name: format!("{}.{}", type_name(receiver), method),
            expected,
            got: args.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ints(values: &[i64]) -> Value {
        Value::list(Type::INT, values.iter().copied().map(Value::Int).collect())
    }

    #[test]
    fn test_element_type_widens_to_float() {
        let entries = [Value::Int(1), Value::Float(2.5), Value::None];
        assert_eq!(element_type(&entries, "list").unwrap(), Type::FLOAT);
        assert_eq!(element_type(&[], "list").unwrap(), Type::NONE);
    }

    #[test]
    fn test_mixed_entries_are_rejected() {
        let err = element_type(&[Value::Int(1), Value::string("x")], "set").unwrap_err();
        assert_eq!(
            err.to_string(),
            "type error: set entry expects `int`, found `string`"
        );
    }

    #[test]
    fn test_list_methods() {
        let list = ints(&[4, 5, 6]);
        assert_eq!(collection_method(&list, "size", &[]).unwrap().unwrap(), Value::Int(3));
        assert_eq!(
            collection_method(&list, "get", &[Value::Int(1)]).unwrap().unwrap(),
            Value::Int(5)
        );
        let err = collection_method(&list, "get", &[Value::Int(3)]).unwrap().unwrap_err();
        assert!(matches!(err, EvalError::IndexOutOfRange { index: 3, len: 3 }));
        let err = collection_method(&list, "get", &[Value::Int(-1)]).unwrap().unwrap_err();
        assert!(matches!(err, EvalError::IndexOutOfRange { index: -1, .. }));
        assert!(collection_method(&list, "contains", &[Value::Int(4)]).is_none());
    }

    #[test]
    fn test_set_methods() {
        let set = Value::set(Type::FLOAT, vec![Value::Float(1.0), Value::Float(2.0)]);
        assert_eq!(collection_method(&set, "size", &[]).unwrap().unwrap(), Value::Int(2));
        // The argument is promoted like the entries were
        assert_eq!(
            collection_method(&set, "contains", &[Value::Int(2)]).unwrap().unwrap(),
            Value::Bool(true)
        );
        let err = collection_method(&set, "size", &[Value::Int(1)]).unwrap().unwrap_err();
        assert!(matches!(err, EvalError::ArityMismatch { ref name, .. } if name == "float<>.size"));
    }

    #[test]
    fn test_other_values_have_no_collection_methods() {
        assert!(collection_method(&Value::Int(1), "size", &[]).is_none());
    }
}
