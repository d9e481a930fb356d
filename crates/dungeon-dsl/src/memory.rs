//! Memory space: the interpreter's stack of local scopes

mod guard;

pub use guard::{CallGuard, ScopeGuard};

use crate::context::DEFAULT_MAX_CALL_DEPTH;
use crate::error::EvalError;
use crate::symbols::SymbolId;
use crate::value::Value;

/// A local binding.
#[derive(Debug, Clone)]
pub struct Binding {
    /// Symbol the binding belongs to
    pub symbol: SymbolId,

    /// The bound value
    pub value: Value,
}

/// Local bindings of the running program.
///
/// Uses a flat binding array with frame boundaries for cheap scope entry and
/// exit. Every function call starts a call frame; lookups never see past the
/// start of the current call, so a callee cannot read its caller's locals.
/// Top-level declarations are not stored here; they live in the runtime
/// environment.
///
/// # Example
///
/// ```
/// use dungeon_dsl::memory::MemorySpace;
/// use dungeon_dsl::symbols::{SymbolKind, SymbolTable};
/// use dungeon_dsl::types::Type;
/// use dungeon_dsl::Value;
///
/// let mut table = SymbolTable::new();
/// let x = table.define(table.global_scope(), "x", SymbolKind::Scalar, Type::INT).unwrap();
///
/// let mut memory = MemorySpace::new();
/// memory.define(x, Value::Int(1));
/// {
///     let mut call = memory.call_guard().unwrap();
///     assert_eq!(call.get(x), None); // caller's locals are hidden
///     call.define(x, Value::Int(2));
///     assert_eq!(call.get(x), Some(&Value::Int(2)));
/// }
/// assert_eq!(memory.get(x), Some(&Value::Int(1)));
/// ```
#[derive(Debug, Clone)]
pub struct MemorySpace {
    /// All bindings in a flat array (most recent at end)
    bindings: Vec<Binding>,

    /// Frame boundaries (indices into bindings)
    /// Each entry marks where a scope begins
    frames: Vec<usize>,

    /// Binding index where each active call begins
    calls: Vec<usize>,

    /// Maximum allowed call depth
    max_call_depth: usize,
}

impl Default for MemorySpace {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySpace {
    /// Create an empty memory space.
    pub fn new() -> Self {
        Self::with_max_call_depth(DEFAULT_MAX_CALL_DEPTH)
    }

    /// Create a memory space with a custom call depth limit.
    pub fn with_max_call_depth(max_depth: usize) -> Self {
        Self {
            bindings: Vec::new(),
            frames: vec![0], // Start with one frame (top level)
            calls: Vec::new(),
            max_call_depth: max_depth,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Frame Management (Scope Entry/Exit)
    // ═══════════════════════════════════════════════════════════════════

    /// Enter a new scope (push a frame).
    pub fn push_frame(&mut self) {
        self.frames.push(self.bindings.len());
    }

    /// Exit the current scope (pop a frame).
    ///
    /// Removes all bindings defined since the matching `push_frame()`.
    /// Does nothing at the top-level frame.
    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            if let Some(boundary) = self.frames.pop() {
                self.bindings.truncate(boundary);
            }
        }
    }

    /// Get the current scope depth (number of frames).
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Call Tracking (Stack Overflow Protection)
    // ═══════════════════════════════════════════════════════════════════

    /// Enter a function call. Returns error if max depth exceeded.
    pub fn enter_call(&mut self) -> Result<(), EvalError> {
        if self.calls.len() >= self.max_call_depth {
            return Err(EvalError::StackOverflow {
                depth: self.calls.len(),
                max: self.max_call_depth,
            });
        }
        self.calls.push(self.bindings.len());
        Ok(())
    }

    /// Exit a function call.
    pub fn exit_call(&mut self) {
        self.calls.pop();
    }

    /// Get current call depth.
    pub fn call_depth(&self) -> usize {
        self.calls.len()
    }

    /// First binding visible from the current call.
    fn visible_start(&self) -> usize {
        self.calls.last().copied().unwrap_or(0)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Bindings
    // ═══════════════════════════════════════════════════════════════════

    /// Bind a symbol in the current scope.
    pub fn define(&mut self, symbol: SymbolId, value: Value) {
        self.bindings.push(Binding { symbol, value });
    }

    /// Look up the innermost visible binding of a symbol.
    pub fn get(&self, symbol: SymbolId) -> Option<&Value> {
        self.bindings[self.visible_start()..]
            .iter()
            .rev()
            .find(|b| b.symbol == symbol)
            .map(|b| &b.value)
    }

    /// Look up a mutable reference to a visible binding.
    pub fn get_mut(&mut self, symbol: SymbolId) -> Option<&mut Value> {
        let start = self.visible_start();
        self.bindings[start..]
            .iter_mut()
            .rev()
            .find(|b| b.symbol == symbol)
            .map(|b| &mut b.value)
    }

    /// Replace the value of a visible binding.
    ///
    /// Returns `false` if the symbol has no visible binding.
    pub fn assign(&mut self, symbol: SymbolId, value: Value) -> bool {
        match self.get_mut(symbol) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if there are no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{SymbolKind, SymbolTable};
    use crate::types::Type;

    fn symbols(n: usize) -> Vec<SymbolId> {
        let mut table = SymbolTable::new();
        let global = table.global_scope();
        (0..n)
            .map(|i| {
                table
                    .define(global, &format!("s{}", i), SymbolKind::Scalar, Type::INT)
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_frames_remove_bindings() {
        let s = symbols(2);
        let mut memory = MemorySpace::new();
        memory.define(s[0], Value::Int(1));
        memory.push_frame();
        memory.define(s[1], Value::Int(2));
        assert_eq!(memory.depth(), 2);
        memory.pop_frame();
        assert_eq!(memory.get(s[1]), None);
        assert_eq!(memory.get(s[0]), Some(&Value::Int(1)));
    }

    #[test]
    fn test_top_level_frame_is_never_popped() {
        let s = symbols(1);
        let mut memory = MemorySpace::new();
        memory.define(s[0], Value::Int(1));
        memory.pop_frame();
        assert_eq!(memory.depth(), 1);
        assert_eq!(memory.get(s[0]), Some(&Value::Int(1)));
    }

    #[test]
    fn test_inner_binding_shadows_outer() {
        let s = symbols(1);
        let mut memory = MemorySpace::new();
        memory.define(s[0], Value::Int(1));
        memory.push_frame();
        memory.define(s[0], Value::Int(2));
        assert_eq!(memory.get(s[0]), Some(&Value::Int(2)));
        memory.pop_frame();
        assert_eq!(memory.get(s[0]), Some(&Value::Int(1)));
    }

    #[test]
    fn test_assign_updates_innermost() {
        let s = symbols(2);
        let mut memory = MemorySpace::new();
        memory.define(s[0], Value::Int(1));
        assert!(memory.assign(s[0], Value::Int(5)));
        assert!(!memory.assign(s[1], Value::Int(5)));
        assert_eq!(memory.get(s[0]), Some(&Value::Int(5)));
    }

    #[test]
    fn test_call_depth_limit() {
        let mut memory = MemorySpace::with_max_call_depth(2);
        memory.enter_call().unwrap();
        memory.enter_call().unwrap();
        let err = memory.enter_call().unwrap_err();
        assert!(matches!(err, EvalError::StackOverflow { depth: 2, max: 2 }));
        memory.exit_call();
        assert_eq!(memory.call_depth(), 1);
    }
}
