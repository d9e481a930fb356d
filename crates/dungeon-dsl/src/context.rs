//! Evaluation context configuration

/// Default limit on nested DSL calls.
///
/// Each DSL call nests several interpreter frames on the native stack. The
/// limit keeps the deepest allowed recursion inside a 2 MiB thread stack,
/// the size of spawned threads and test threads, in unoptimized builds.
/// Hosts running the interpreter on a larger stack can raise it with
/// [`EvalContext::with_max_call_depth`].
pub const DEFAULT_MAX_CALL_DEPTH: usize = 128;

/// Configuration for evaluation.
///
/// Passed to the interpreter and to every callback adapter it creates.
#[derive(Debug, Clone)]
pub struct EvalContext {
    /// Maximum call depth (stack overflow protection)
    pub max_call_depth: usize,

    /// Whether to trace function calls (for debugging)
    pub trace: bool,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            trace: false,
        }
    }
}

impl EvalContext {
    /// Create a new context with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with a custom call depth limit.
    pub fn with_max_call_depth(max_depth: usize) -> Self {
        Self {
            max_call_depth: max_depth,
            ..Default::default()
        }
    }

    /// Enable call tracing.
    pub fn traced(mut self) -> Self {
        self.trace = true;
        self
    }
}
