//! RAII guards for automatic frame cleanup

use super::MemorySpace;
use crate::error::EvalError;

/// RAII guard that pops a block frame when dropped.
pub struct ScopeGuard<'a> {
    memory: &'a mut MemorySpace,
}

/// RAII guard for a function call: a call frame plus a block frame.
///
/// Dropping the guard pops both, whether the call returned normally, through
/// `return`, or with an error.
pub struct CallGuard<'a> {
    memory: &'a mut MemorySpace,
}

impl MemorySpace {
    /// Create a scope guard that pushes a frame now and pops it on drop.
    pub fn scope_guard(&mut self) -> ScopeGuard<'_> {
        self.push_frame();
        ScopeGuard { memory: self }
    }

    /// Enter a call and return a guard that exits it on drop.
    pub fn call_guard(&mut self) -> Result<CallGuard<'_>, EvalError> {
        self.enter_call()?;
        self.push_frame();
        Ok(CallGuard { memory: self })
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.memory.pop_frame();
    }
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.memory.pop_frame();
        self.memory.exit_call();
    }
}

impl std::ops::Deref for ScopeGuard<'_> {
    type Target = MemorySpace;

    fn deref(&self) -> &Self::Target {
        self.memory
    }
}

impl std::ops::DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.memory
    }
}

impl std::ops::Deref for CallGuard<'_> {
    type Target = MemorySpace;

    fn deref(&self) -> &Self::Target {
        self.memory
    }
}

impl std::ops::DerefMut for CallGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.memory
    }
}
