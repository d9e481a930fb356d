//! Value representation for runtime values

mod callable;
mod compound;
mod display;
mod impls;

pub use callable::{FunctionValue, NativeFnPtr, NativeFunction};
pub use compound::{AggregateValue, HostObject, ListValue, PrototypeValue, SetValue};

use std::sync::Arc;

use crate::graph::TaskDependencyGraph;

/// Reference to an entity owned by the host game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// Runtime value representation for the DSL interpreter.
///
/// Values are organized into three tiers:
/// - Tier 1: Inline scalars (no allocation)
/// - Tier 2: Heap-allocated compound values (Arc-wrapped, copy-on-write)
/// - Tier 3: Callables (user-defined and native functions)
#[derive(Clone)]
pub enum Value {
    // ═══════════════════════════════════════════════════════════════════
    // Tier 1: Inline Scalars
    // ═══════════════════════════════════════════════════════════════════
    /// No value
    None,

    /// 64-bit integer
    Int(i64),

    /// 64-bit floating point
    Float(f64),

    /// Boolean: `true` or `false`
    Bool(bool),

    /// Reference to a host entity
    Entity(EntityId),

    // ═══════════════════════════════════════════════════════════════════
    // Tier 2: Heap-Allocated Compound Values
    // ═══════════════════════════════════════════════════════════════════
    /// Heap-allocated string
    String(Arc<String>),

    /// Task dependency graph built from a dot definition
    Graph(Arc<TaskDependencyGraph>),

    /// Instance of an aggregate type
    Aggregate(Arc<AggregateValue>),

    /// Named definition ready to be instantiated
    Prototype(Arc<PrototypeValue>),

    /// List literal or converted host list
    List(Arc<ListValue>),

    /// Set literal or converted host set
    Set(Arc<SetValue>),

    /// Host object built by a type adapter
    Host(HostObject),

    // ═══════════════════════════════════════════════════════════════════
    // Tier 3: Callables
    // ═══════════════════════════════════════════════════════════════════
    /// User-defined function
    Function(Arc<FunctionValue>),

    /// Native host function or extension method
    Native(NativeFunction),
}
