//! Statement evaluation

use crate::ast::{Block, IfStmt, Stmt, VarDecl};
use crate::eval::control::ControlFlow;
use crate::memory::MemorySpace;
use crate::{EvalError, Value};

use super::{check_type, Evaluate, Interpreter};

/// Execute a statement.
///
/// # Errors
///
/// Returns errors from statement evaluation. `return` surfaces as
/// `EvalError::ControlFlow` until the enclosing call catches it.
pub fn exec_stmt(
    stmt: &Stmt,
    interp: &mut Interpreter,
    memory: &mut MemorySpace,
) -> Result<(), EvalError> {
    match stmt {
        Stmt::Expr(expr) => {
            expr.eval(interp, memory)?;
            Ok(())
        }
        Stmt::Var(decl) => exec_var(decl, interp, memory),
        Stmt::Return(expr) => {
            let value = match expr {
                Some(expr) => expr.eval(interp, memory)?,
                None => Value::None,
            };
            Err(ControlFlow::return_with(value).into())
        }
        Stmt::Block(block) => exec_block(block, interp, memory),
        Stmt::If(stmt) => exec_if(stmt, interp, memory),
    }
}

/// Execute a block, managing scope.
///
/// The frame is popped on every exit path.
pub fn exec_block(
    block: &Block,
    interp: &mut Interpreter,
    memory: &mut MemorySpace,
) -> Result<(), EvalError> {
    let mut scope = memory.scope_guard();
    exec_stmts(&block.stmts, interp, &mut scope)
}

/// Execute statements in the current scope.
pub fn exec_stmts(
    stmts: &[Stmt],
    interp: &mut Interpreter,
    memory: &mut MemorySpace,
) -> Result<(), EvalError> {
    for stmt in stmts {
        exec_stmt(stmt, interp, memory)?;
    }
    Ok(())
}

fn exec_var(decl: &VarDecl, interp: &mut Interpreter, memory: &mut MemorySpace) -> Result<(), EvalError> {
    let symbol = interp.symbol_of(&decl.name)?;
    let value = match &decl.init {
        Some(init) => init.eval(interp, memory)?,
        None => Value::None,
    };

    let ty = interp.symbol(symbol).ty.clone();
    let value = value.coerce_to(&ty);
    if decl.ty.is_some() {
        check_type(&ty, &value, || format!("variable `{}`", decl.name))?;
    }
    memory.define(symbol, value);
    Ok(())
}

fn exec_if(stmt: &IfStmt, interp: &mut Interpreter, memory: &mut MemorySpace) -> Result<(), EvalError> {
    let cond = stmt.cond.eval(interp, memory)?;
    let taken = cond.as_bool().ok_or_else(|| EvalError::TypeError {
        message: format!(
            "`if` condition must be `bool`, found `{}`",
            crate::error::type_name(&cond)
        ),
    })?;

    if taken {
        exec_stmt(&stmt.then_branch, interp, memory)
    } else if let Some(else_branch) = &stmt.else_branch {
        exec_stmt(else_branch, interp, memory)
    } else {
        Ok(())
    }
}
