//! Error types for analysis, type building and evaluation

use thiserror::Error;

use crate::eval::ControlFlow;
use crate::value::Value;

/// Errors found while building the symbol table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    /// A name was declared twice in the same scope
    #[error("`{name}` is already defined in this scope")]
    Redeclaration {
        /// The duplicated name
        name: String,
    },

    /// An identifier could not be resolved
    #[error("reference to undefined identifier `{name}`")]
    Undefined {
        /// The unresolved name
        name: String,
    },

    /// A type name could not be resolved
    #[error("unknown type `{name}`")]
    UnknownType {
        /// The unresolved type name
        name: String,
    },

    /// An object definition uses a type that has no members
    #[error("type `{name}` cannot be used to define an object")]
    NotAggregate {
        /// The offending type name
        name: String,
    },

    /// An object definition sets a property its type does not have
    #[error("type `{type_name}` has no property `{property}`")]
    UnknownProperty {
        /// Property name
        property: String,
        /// Type being defined
        type_name: String,
    },

    /// Something other than a function was called
    #[error("`{name}` is not a function")]
    NotCallable {
        /// The called name
        name: String,
    },
}

/// Errors raised while deriving a DSL type from a host type.
///
/// A failure only affects the type being registered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeBuildError {
    /// Two members map to the same DSL name
    #[error("type `{type_name}` declares member `{member}` more than once")]
    DuplicateMember {
        /// DSL type name
        type_name: String,
        /// Conflicting member name
        member: String,
    },

    /// A type or member name is not a valid DSL identifier
    #[error("`{name}` in type `{type_name}` is not a valid DSL identifier")]
    InvalidName {
        /// DSL type name
        type_name: String,
        /// The rejected name
        name: String,
    },

    /// Two host types map to the same DSL name
    #[error("DSL type `{name}` is already registered")]
    DuplicateType {
        /// DSL type name
        name: String,
    },

    /// An extension method clashes with a member or another method
    #[error("type `{type_name}` already has a member or method named `{method}`")]
    ExtensionClash {
        /// DSL type name
        type_name: String,
        /// Method name
        method: String,
    },

    /// A native function name is registered twice
    #[error("native function `{name}` is already registered")]
    DuplicateFunction {
        /// Function name
        name: String,
    },

    /// An operation referenced a host type that was never registered
    #[error("host type `{rust_type}` is not registered with the DSL")]
    UnregisteredHostType {
        /// Rust type name
        rust_type: &'static str,
    },

    /// A type adapter takes no parameters
    #[error("type adapter for `{type_name}` takes no parameters")]
    EmptyAdapter {
        /// DSL type name
        type_name: String,
    },

    /// A type adapter names a different number of parameters than it takes
    #[error("type adapter for `{type_name}` names {names} parameter(s) but takes {arity}")]
    AdapterSignature {
        /// DSL type name
        type_name: String,
        /// Number of parameter names
        names: usize,
        /// Number of declared parameters
        arity: usize,
    },
}

/// Structural errors in a dot graph definition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// An edge statement carries more than one `type` attribute
    #[error("edge `{edge}` has more than one `type` attribute")]
    DuplicateTypeAttribute {
        /// Canonical edge name
        edge: String,
    },

    /// The `type` attribute names no known dependency kind
    #[error("edge `{edge}` has unknown dependency type `{value}`")]
    UnknownDependencyType {
        /// Canonical edge name
        edge: String,
        /// Attribute value
        value: String,
    },

    /// An edge attribute other than `type`
    #[error("edge `{edge}` has unsupported attribute `{key}`")]
    UnknownEdgeAttribute {
        /// Canonical edge name
        edge: String,
        /// Attribute key
        key: String,
    },

    /// Edge operator does not match the graph kind
    #[error("edge `{edge}` does not match the kind of graph `{graph}`")]
    OperatorMismatch {
        /// Graph name
        graph: String,
        /// Canonical edge name
        edge: String,
    },

    /// A node identifier refers to a definition that is not a task
    #[error("`{name}` does not refer to a task definition")]
    NotATask {
        /// Node name
        name: String,
    },
}

/// Errors crossing the boundary between DSL values and host objects.
#[derive(Error, Debug)]
pub enum InteropError {
    /// No prototype with this name exists
    #[error("no prototype named `{name}`")]
    UnknownPrototype {
        /// Prototype name
        name: String,
    },

    /// The host type was never registered with the type builder
    #[error("host type `{rust_type}` is not registered with the DSL")]
    UnregisteredHostType {
        /// Rust type name
        rust_type: &'static str,
    },

    /// A value has a different type than the host slot expects
    #[error("expected a value of type `{expected}`, found `{found}`")]
    TypeMismatch {
        /// Expected DSL type
        expected: String,
        /// Actual DSL type
        found: String,
    },

    /// The host type has no member with this name
    #[error("type `{type_name}` has no member `{member}`")]
    UnknownMember {
        /// DSL type name
        type_name: String,
        /// Member name
        member: String,
    },

    /// The member is read-only for the DSL
    #[error("member `{member}` of type `{type_name}` cannot be set")]
    MemberNotSettable {
        /// DSL type name
        type_name: String,
        /// Member name
        member: String,
    },

    /// The member is write-only for the DSL
    #[error("member `{member}` of type `{type_name}` cannot be read")]
    MemberNotGettable {
        /// DSL type name
        type_name: String,
        /// Member name
        member: String,
    },

    /// A function does not fit the host callback slot
    #[error("function `{function}` has signature `{found}`, host slot expects `{expected}`")]
    SignatureMismatch {
        /// Function name
        function: String,
        /// Slot signature
        expected: String,
        /// Declared signature
        found: String,
    },

    /// A callback slot was given a value that is not a function
    #[error("expected a function, found `{found}`")]
    NotCallable {
        /// Actual DSL type
        found: String,
    },

    /// A type adapter could not build the host object
    #[error("type adapter for `{type_name}` failed: {message}")]
    Adapter {
        /// DSL type name
        type_name: String,
        /// Failure message
        message: String,
    },

    /// The interpreted callback failed
    #[error("callback `{function}` failed: {source}")]
    Callback {
        /// Function name
        function: String,
        /// Underlying evaluation error
        source: Box<EvalError>,
    },
}

/// Errors returned by native functions and methods.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NativeError {
    /// An argument has an unexpected payload shape
    #[error("expected {expected}, found `{found}`")]
    Shape {
        /// Expected shape
        expected: &'static str,
        /// Actual DSL type
        found: String,
    },

    /// The native operation failed
    #[error("{0}")]
    Failed(String),
}

impl NativeError {
    /// Create a shape error for an argument.
    pub fn shape(expected: &'static str, found: &Value) -> Self {
        NativeError::Shape {
            expected,
            found: type_name(found),
        }
    }
}

/// Errors raised while interpreting a program.
#[derive(Error, Debug)]
pub enum EvalError {
    /// An identifier resolved to no symbol; semantic analysis should have caught this
    #[error("internal error: identifier `{name}` has no symbol")]
    Unresolved {
        /// Identifier name
        name: String,
    },

    /// A symbol has no value in the current memory space
    #[error("`{name}` has no value")]
    UndefinedValue {
        /// Symbol name
        name: String,
    },

    /// Operation applied to a value of the wrong type
    #[error("type error: {message}")]
    TypeError {
        /// Description
        message: String,
    },

    /// Member access on a value without that member
    #[error("`{type_name}` has no member `{member}`")]
    UndefinedMember {
        /// Member name
        member: String,
        /// DSL type name
        type_name: String,
    },

    /// Call of a non-function value
    #[error("`{name}` is not callable")]
    NotCallable {
        /// Callee name
        name: String,
    },

    /// Wrong number of arguments
    #[error("`{name}` expects {expected} argument(s), got {got}")]
    ArityMismatch {
        /// Function name
        name: String,
        /// Declared parameter count
        expected: usize,
        /// Passed argument count
        got: usize,
    },

    /// Call depth limit reached
    #[error("stack overflow: call depth {depth} exceeds maximum {max}")]
    StackOverflow {
        /// Depth reached
        depth: usize,
        /// Configured limit
        max: usize,
    },

    /// List index outside the list
    #[error("index {index} is out of range for a list of length {len}")]
    IndexOutOfRange {
        /// Requested index
        index: i64,
        /// List length
        len: usize,
    },

    /// A declaration refers to itself while being evaluated
    #[error("definition of `{name}` depends on itself")]
    CyclicDefinition {
        /// Declaration name
        name: String,
    },

    /// Integer division by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Integer arithmetic overflowed
    #[error("integer overflow")]
    IntegerOverflow,

    /// Unary operator applied to an unsupported operand
    #[error("cannot apply `{op}` to `{operand_type}`")]
    InvalidUnaryOperand {
        /// Operator
        op: String,
        /// DSL type of the operand
        operand_type: String,
    },

    /// Binary operator applied to unsupported operands
    #[error("cannot apply `{op}` to `{left_type}` and `{right_type}`")]
    InvalidBinaryOperands {
        /// Operator
        op: String,
        /// DSL type of the left operand
        left_type: String,
        /// DSL type of the right operand
        right_type: String,
    },

    /// Assignment to something that is not assignable
    #[error("invalid assignment: {message}")]
    InvalidAssignment {
        /// Description
        message: String,
    },

    /// Native function failure
    #[error("native function `{name}` failed: {message}")]
    Native {
        /// Function name
        name: String,
        /// Failure message
        message: String,
    },

    /// Two prototypes share a name
    #[error("prototype `{name}` is defined more than once")]
    DuplicatePrototype {
        /// Prototype name
        name: String,
    },

    /// Dot graph structure error
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Host translation error
    #[error(transparent)]
    Interop(#[from] InteropError),

    /// Non-local control flow (return), caught by the enclosing call
    #[error("control flow escaped its function")]
    ControlFlow(ControlFlow),
}

/// Error returned by the analyze-and-interpret pipeline.
#[derive(Error, Debug)]
pub enum DslError {
    /// Semantic analysis reported errors
    #[error("semantic analysis failed: {}", join_errors(.0))]
    Semantic(Vec<SemanticError>),

    /// Interpretation failed
    #[error(transparent)]
    Eval(#[from] EvalError),
}

fn join_errors(errors: &[SemanticError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for evaluation
pub type Result<T> = std::result::Result<T, EvalError>;

/// DSL type name of a value, for error messages.
pub fn type_name(value: &Value) -> String {
    value.ty().to_string()
}
