//! Interpreter tests: declarations, functions, control flow and errors

use std::io::Write;
use std::sync::{Arc, Mutex};

use dungeon_dsl::ast::{self, BinaryOp, Block, Expr, Item, Program, Stmt, UnaryOp};
use dungeon_dsl::error::NativeError;
use dungeon_dsl::types::{FunctionType, Type};
use dungeon_dsl::{
    DslError, EvalContext, EvalError, Interpreter, NativeFunction, RuntimeEnvironment,
    SemanticAnalyzer, TypeBuilder, TypeRegistry, Value, DEFAULT_MAX_CALL_DEPTH,
};
use pretty_assertions::assert_eq;

/// Output sink shared between the interpreter and the test.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Route `tracing` output through the test harness; `RUST_LOG` selects levels.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn registry() -> Arc<TypeRegistry> {
    Arc::new(TypeBuilder::new().with_prelude().build())
}

fn run_with(
    programs: &[Program],
    registry: Arc<TypeRegistry>,
    ctx: EvalContext,
) -> anyhow::Result<(Result<Arc<RuntimeEnvironment>, EvalError>, String)> {
    let symbols = SemanticAnalyzer::new(&registry)
        .analyze(programs)
        .map_err(DslError::Semantic)?;
    let out = SharedBuffer::default();
    let env = Arc::new(RuntimeEnvironment::with_symbols(symbols, registry));
    let result = Interpreter::with_context(env, ctx)
        .with_output(out.clone())
        .run(programs);
    Ok((result, out.contents()))
}

fn run(items: Vec<Item>) -> anyhow::Result<(Arc<RuntimeEnvironment>, String)> {
    let programs = [Program::new("main.dng", items)];
    let (result, output) = run_with(&programs, registry(), EvalContext::default())?;
    Ok((result?, output))
}

fn run_err(items: Vec<Item>) -> EvalError {
    let programs = [Program::new("main.dng", items)];
    match run_with(&programs, registry(), EvalContext::default()) {
        Ok((Err(err), _)) => err,
        Ok((Ok(_), _)) => panic!("expected an evaluation error"),
        Err(err) => panic!("analysis failed: {err}"),
    }
}

/// `task <name> { points: <expr> }`
fn points(name: &str, expr: Expr) -> Item {
    ast::object("task", name, vec![("points", expr)])
}

fn points_of(env: &RuntimeEnvironment, name: &str) -> Option<Value> {
    env.lookup_prototype(name)?.get("points").cloned()
}

fn bin(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::binary(op, lhs, rhs)
}

// ═══════════════════════════════════════════════════════════════════════
// Output
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_print_writes_to_output() -> anyhow::Result<()> {
    let (env, output) = run(vec![
        ast::function(
            "shout",
            vec![("s", "string")],
            Some("string"),
            vec![
                Stmt::expr(Expr::call("print", vec![Expr::ident("s")])),
                Stmt::expr(Expr::call("print", vec![Expr::int(42)])),
                Stmt::ret(bin(BinaryOp::Add, Expr::ident("s"), Expr::string("!"))),
            ],
        ),
        ast::object(
            "task",
            "t",
            vec![("description", Expr::call("shout", vec![Expr::string("run")]))],
        ),
    ])?;

    assert_eq!(output, "run\n42\n");
    let task = env.lookup_prototype("t").unwrap();
    assert_eq!(task.get("description"), Some(&Value::string("run!")));
    Ok(())
}

#[test]
fn test_string_concatenation_formats_values() -> anyhow::Result<()> {
    let (_, output) = run(vec![
        ast::function(
            "report",
            vec![],
            None,
            vec![Stmt::expr(Expr::call(
                "print",
                vec![bin(
                    BinaryOp::Add,
                    bin(BinaryOp::Add, Expr::string("score: "), Expr::int(7)),
                    bin(BinaryOp::Add, Expr::string(", done: "), Expr::bool(true)),
                )],
            ))],
        ),
        points("t", Expr::call("report", vec![])),
    ])?;
    assert_eq!(output, "score: 7, done: true\n");
    Ok(())
}

#[test]
fn test_print_accepts_any_value() -> anyhow::Result<()> {
    let print = |arg| Stmt::expr(Expr::call("print", vec![arg]));
    let (_, output) = run(vec![
        ast::function(
            "dump",
            vec![],
            None,
            vec![
                print(Expr::bool(false)),
                print(Expr::float(1.5)),
                print(Expr::list(vec![Expr::int(1), Expr::int(2)])),
                print(Expr::set(vec![Expr::string("a")])),
            ],
        ),
        points("t", Expr::call("dump", vec![])),
    ])?;
    assert_eq!(output, "false\n1.5\n[1, 2]\n<\"a\">\n");

    let registry = registry();
    let print = registry.function("print").unwrap();
    assert_eq!(print.ty.to_string(), "fn(any)");
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
// Functions
// ═══════════════════════════════════════════════════════════════════════

fn factorial() -> Item {
    // if n <= 1 { return 1; } return n * fact(n - 1);
    ast::function(
        "fact",
        vec![("n", "int")],
        Some("int"),
        vec![
            Stmt::if_else(
                bin(BinaryOp::Le, Expr::ident("n"), Expr::int(1)),
                Stmt::Block(Block::new(vec![Stmt::ret(Expr::int(1))])),
                None,
            ),
            Stmt::ret(bin(
                BinaryOp::Mul,
                Expr::ident("n"),
                Expr::call("fact", vec![bin(BinaryOp::Sub, Expr::ident("n"), Expr::int(1))]),
            )),
        ],
    )
}

fn sum() -> Item {
    // if n == 0 { return 0; } return n + sum(n - 1);
    ast::function(
        "sum",
        vec![("n", "int")],
        Some("int"),
        vec![
            Stmt::if_else(
                bin(BinaryOp::Eq, Expr::ident("n"), Expr::int(0)),
                Stmt::Block(Block::new(vec![Stmt::ret(Expr::int(0))])),
                None,
            ),
            Stmt::ret(bin(
                BinaryOp::Add,
                Expr::ident("n"),
                Expr::call("sum", vec![bin(BinaryOp::Sub, Expr::ident("n"), Expr::int(1))]),
            )),
        ],
    )
}

#[test]
fn test_recursion() -> anyhow::Result<()> {
    let (env, _) = run(vec![
        factorial(),
        points("t", Expr::call("fact", vec![Expr::int(5)])),
    ])?;
    assert_eq!(points_of(&env, "t"), Some(Value::Int(120)));
    Ok(())
}

#[test]
fn test_return_skips_remaining_statements() -> anyhow::Result<()> {
    let (env, output) = run(vec![
        ast::function(
            "early",
            vec![("flag", "bool")],
            Some("int"),
            vec![
                Stmt::if_else(
                    Expr::ident("flag"),
                    Stmt::ret(Expr::int(1)),
                    Some(Stmt::expr(Expr::call("print", vec![Expr::string("else")]))),
                ),
                Stmt::expr(Expr::call("print", vec![Expr::string("after")])),
                Stmt::ret(Expr::int(2)),
            ],
        ),
        points("yes", Expr::call("early", vec![Expr::bool(true)])),
        points("no", Expr::call("early", vec![Expr::bool(false)])),
    ])?;

    assert_eq!(points_of(&env, "yes"), Some(Value::Int(1)));
    assert_eq!(points_of(&env, "no"), Some(Value::Int(2)));
    assert_eq!(output, "else\nafter\n");
    Ok(())
}

#[test]
fn test_locals_and_assignment() -> anyhow::Result<()> {
    // var total = 1; { var step = 2; total = total + step; } return -total;
    let (env, _) = run(vec![
        ast::function(
            "compute",
            vec![],
            Some("int"),
            vec![
                Stmt::var("total", Expr::int(1)),
                Stmt::Block(Block::new(vec![
                    Stmt::var("step", Expr::int(2)),
                    Stmt::expr(Expr::assign(
                        Expr::ident("total"),
                        bin(BinaryOp::Add, Expr::ident("total"), Expr::ident("step")),
                    )),
                ])),
                Stmt::ret(Expr::unary(UnaryOp::Neg, Expr::ident("total"))),
            ],
        ),
        points("t", Expr::call("compute", vec![])),
    ])?;
    assert_eq!(points_of(&env, "t"), Some(Value::Int(-3)));
    Ok(())
}

#[test]
fn test_parameters_promote_to_float() -> anyhow::Result<()> {
    let (env, _) = run(vec![
        ast::function(
            "half",
            vec![("x", "float")],
            Some("float"),
            vec![Stmt::ret(bin(BinaryOp::Div, Expr::ident("x"), Expr::float(2.0)))],
        ),
        ast::object(
            "task",
            "t",
            vec![(
                "explanation",
                bin(
                    BinaryOp::Add,
                    Expr::string("half is "),
                    Expr::call("half", vec![Expr::int(3)]),
                ),
            )],
        ),
    ])?;
    let task = env.lookup_prototype("t").unwrap();
    assert_eq!(task.get("explanation"), Some(&Value::string("half is 1.5")));
    Ok(())
}

#[test]
fn test_stack_overflow() -> anyhow::Result<()> {
    init_tracing();
    let programs = [Program::new(
        "main.dng",
        vec![
            ast::function(
                "forever",
                vec![("n", "int")],
                Some("int"),
                vec![Stmt::ret(Expr::call(
                    "forever",
                    vec![bin(BinaryOp::Add, Expr::ident("n"), Expr::int(1))],
                ))],
            ),
            points("t", Expr::call("forever", vec![Expr::int(0)])),
        ],
    )];
    let (result, _) = run_with(&programs, registry(), EvalContext::with_max_call_depth(32))?;
    assert!(matches!(
        result.unwrap_err(),
        EvalError::StackOverflow { depth: 32, max: 32 }
    ));
    Ok(())
}

#[test]
fn test_call_depth_limit_allows_deep_enough_recursion() -> anyhow::Result<()> {
    let programs = [Program::new(
        "main.dng",
        vec![
            factorial(),
            points("t", Expr::call("fact", vec![Expr::int(10)])),
        ],
    )];
    let (result, _) = run_with(&programs, registry(), EvalContext::with_max_call_depth(10))?;
    assert_eq!(points_of(&*result?, "t"), Some(Value::Int(3_628_800)));
    Ok(())
}

#[test]
fn test_default_call_depth_fits_the_native_stack() -> anyhow::Result<()> {
    // sum(n) nests n + 1 calls
    let n = i64::try_from(DEFAULT_MAX_CALL_DEPTH)? - 1;
    let (env, _) = run(vec![sum(), points("t", Expr::call("sum", vec![Expr::int(n)]))])?;
    assert_eq!(points_of(&env, "t"), Some(Value::Int(n * (n + 1) / 2)));
    assert_eq!(EvalContext::default().max_call_depth, DEFAULT_MAX_CALL_DEPTH);
    Ok(())
}

#[test]
fn test_default_call_depth_stops_unbounded_recursion() -> anyhow::Result<()> {
    let err = run_err(vec![
        ast::function(
            "forever",
            vec![("n", "int")],
            Some("int"),
            vec![Stmt::ret(Expr::call(
                "forever",
                vec![bin(BinaryOp::Add, Expr::ident("n"), Expr::int(1))],
            ))],
        ),
        points("t", Expr::call("forever", vec![Expr::int(0)])),
    ]);
    match err {
        EvalError::StackOverflow { depth, max } => {
            assert_eq!(depth, DEFAULT_MAX_CALL_DEPTH);
            assert_eq!(max, DEFAULT_MAX_CALL_DEPTH);
        }
        other => panic!("expected a stack overflow, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_default_call_depth_one_past_the_limit() {
    let n = i64::try_from(DEFAULT_MAX_CALL_DEPTH).unwrap_or(i64::MAX);
    let err = run_err(vec![sum(), points("t", Expr::call("sum", vec![Expr::int(n)]))]);
    assert!(matches!(err, EvalError::StackOverflow { .. }));
}

// ═══════════════════════════════════════════════════════════════════════
// Declarations
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_forward_references() -> anyhow::Result<()> {
    let (env, _) = run(vec![
        points("first", Expr::member(Expr::ident("second"), "points")),
        points("second", Expr::int(4)),
    ])?;
    assert_eq!(points_of(&env, "first"), Some(Value::Int(4)));

    // Prototypes are registered in evaluation order
    let names: Vec<&str> = env.prototypes().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["second", "first"]);
    Ok(())
}

#[test]
fn test_cyclic_definition() {
    let err = run_err(vec![
        points("a", Expr::member(Expr::ident("b"), "points")),
        points("b", Expr::member(Expr::ident("a"), "points")),
    ]);
    assert!(matches!(err, EvalError::CyclicDefinition { name } if name == "a"));
}

#[test]
fn test_duplicate_prototype_across_files() -> anyhow::Result<()> {
    let programs = [
        Program::new("a.dng", vec![points("shared", Expr::int(1))]),
        Program::new("b.dng", vec![points("shared", Expr::int(2))]),
    ];
    let (result, _) = run_with(&programs, registry(), EvalContext::default())?;
    assert!(matches!(
        result.unwrap_err(),
        EvalError::DuplicatePrototype { name } if name == "shared"
    ));
    Ok(())
}

#[test]
fn test_unset_member_reads_as_none() -> anyhow::Result<()> {
    let (env, _) = run(vec![
        ast::object("task", "blank", vec![]),
        ast::object(
            "task",
            "copy",
            vec![("description", Expr::member(Expr::ident("blank"), "description"))],
        ),
    ])?;
    let copy = env.lookup_prototype("copy").unwrap();
    assert_eq!(copy.get("description"), Some(&Value::None));
    Ok(())
}

#[test]
fn test_entity_type_components() -> anyhow::Result<()> {
    let (env, _) = run(vec![ast::prototype(
        "goblin",
        vec![(
            "task",
            vec![
                ("description", Expr::string("Defeat the goblin")),
                ("points", Expr::int(3)),
            ],
        )],
    )])?;

    let goblin = env.lookup_prototype("goblin").unwrap();
    assert_eq!(goblin.ty, Type::ENTITY);
    let component = goblin.get("task").unwrap().as_aggregate().unwrap();
    assert_eq!(component.type_name, "task");
    assert_eq!(component.get("points"), Some(&Value::Int(3)));
    Ok(())
}

#[test]
fn test_member_assignment_copies_on_write() -> anyhow::Result<()> {
    // var copy = goblin.task; copy.points = 10; return copy.points;
    let (env, _) = run(vec![
        ast::prototype("goblin", vec![("task", vec![("points", Expr::int(3))])]),
        ast::function(
            "probe",
            vec![],
            Some("int"),
            vec![
                Stmt::var("copy", Expr::member(Expr::ident("goblin"), "task")),
                Stmt::expr(Expr::assign(
                    Expr::member(Expr::ident("copy"), "points"),
                    Expr::int(10),
                )),
                Stmt::ret(Expr::member(Expr::ident("copy"), "points")),
            ],
        ),
        points("result", Expr::call("probe", vec![])),
    ])?;

    assert_eq!(points_of(&env, "result"), Some(Value::Int(10)));
    let goblin = env.lookup_prototype("goblin").unwrap();
    assert_eq!(
        goblin.get("task").and_then(|t| t.member("points")),
        Some(&Value::Int(3))
    );
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
// Collections
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_list_parameter_and_methods() -> anyhow::Result<()> {
    // fn second(xs: int[]) -> int { return xs.get(1) + xs.size(); }
    let (env, _) = run(vec![
        ast::function(
            "second",
            vec![("xs", "int[]")],
            Some("int"),
            vec![Stmt::ret(bin(
                BinaryOp::Add,
                Expr::method_call(Expr::ident("xs"), "get", vec![Expr::int(1)]),
                Expr::method_call(Expr::ident("xs"), "size", vec![]),
            ))],
        ),
        points(
            "t",
            Expr::call(
                "second",
                vec![Expr::list(vec![Expr::int(10), Expr::int(20), Expr::int(30)])],
            ),
        ),
    ])?;
    assert_eq!(points_of(&env, "t"), Some(Value::Int(23)));
    Ok(())
}

#[test]
fn test_empty_list_fits_any_list_parameter() -> anyhow::Result<()> {
    let (env, _) = run(vec![
        ast::function(
            "count",
            vec![("xs", "string[]")],
            Some("int"),
            vec![Stmt::ret(Expr::method_call(Expr::ident("xs"), "size", vec![]))],
        ),
        points("t", Expr::call("count", vec![Expr::list(vec![])])),
    ])?;
    assert_eq!(points_of(&env, "t"), Some(Value::Int(0)));
    Ok(())
}

#[test]
fn test_list_literal_promotes_ints_to_float() -> anyhow::Result<()> {
    let (env, _) = run(vec![
        ast::function(
            "first",
            vec![("xs", "float[]")],
            Some("float"),
            vec![Stmt::ret(Expr::method_call(Expr::ident("xs"), "get", vec![Expr::int(0)]))],
        ),
        ast::object(
            "task",
            "u",
            vec![(
                "explanation",
                bin(
                    BinaryOp::Add,
                    Expr::string("first is "),
                    Expr::call("first", vec![Expr::list(vec![Expr::int(2), Expr::float(0.5)])]),
                ),
            )],
        ),
    ])?;
    let task = env.lookup_prototype("u").unwrap();
    assert_eq!(task.get("explanation"), Some(&Value::string("first is 2.0")));
    Ok(())
}

#[test]
fn test_set_contains() -> anyhow::Result<()> {
    let (env, _) = run(vec![
        ast::function(
            "has_key",
            vec![("items", "string<>")],
            Some("bool"),
            vec![Stmt::ret(Expr::method_call(
                Expr::ident("items"),
                "contains",
                vec![Expr::string("key")],
            ))],
        ),
        ast::function(
            "distinct",
            vec![("items", "string<>")],
            Some("int"),
            vec![Stmt::ret(Expr::method_call(Expr::ident("items"), "size", vec![]))],
        ),
        ast::object(
            "task",
            "t",
            vec![(
                "explanation",
                bin(
                    BinaryOp::Add,
                    Expr::string("has key: "),
                    Expr::call(
                        "has_key",
                        vec![Expr::set(vec![Expr::string("map"), Expr::string("key")])],
                    ),
                ),
            )],
        ),
        points(
            "u",
            Expr::call(
                "distinct",
                vec![Expr::set(vec![
                    Expr::string("map"),
                    Expr::string("map"),
                    Expr::string("key"),
                ])],
            ),
        ),
    ])?;
    let task = env.lookup_prototype("t").unwrap();
    assert_eq!(task.get("explanation"), Some(&Value::string("has key: true")));
    assert_eq!(points_of(&env, "u"), Some(Value::Int(2)));
    Ok(())
}

#[test]
fn test_list_index_out_of_range() {
    let err = run_err(vec![
        ast::function(
            "at",
            vec![("xs", "int[]"), ("i", "int")],
            Some("int"),
            vec![Stmt::ret(Expr::method_call(
                Expr::ident("xs"),
                "get",
                vec![Expr::ident("i")],
            ))],
        ),
        points(
            "t",
            Expr::call("at", vec![Expr::list(vec![Expr::int(1)]), Expr::int(5)]),
        ),
    ]);
    assert!(matches!(err, EvalError::IndexOutOfRange { index: 5, len: 1 }));
}

#[test]
fn test_mixed_list_entries_are_a_type_error() {
    let err = run_err(vec![points(
        "t",
        Expr::method_call(
            Expr::list(vec![Expr::int(1), Expr::string("two")]),
            "size",
            vec![],
        ),
    )]);
    match err {
        EvalError::TypeError { message } => {
            assert_eq!(message, "list entry expects `int`, found `string`");
        }
        other => panic!("expected a type error, got {other:?}"),
    }
}

#[test]
fn test_list_argument_of_wrong_element_type() {
    let err = run_err(vec![
        ast::function(
            "count",
            vec![("xs", "int[]")],
            Some("int"),
            vec![Stmt::ret(Expr::method_call(Expr::ident("xs"), "size", vec![]))],
        ),
        points("t", Expr::call("count", vec![Expr::list(vec![Expr::bool(true)])])),
    ]);
    assert!(matches!(err, EvalError::TypeError { .. }));
}

// ═══════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_argument_type_error() {
    let err = run_err(vec![
        ast::function(
            "id",
            vec![("x", "int")],
            Some("int"),
            vec![Stmt::ret(Expr::ident("x"))],
        ),
        points("t", Expr::call("id", vec![Expr::string("seven")])),
    ]);
    assert!(matches!(err, EvalError::TypeError { .. }));
}

#[test]
fn test_property_type_error() {
    let err = run_err(vec![points("t", Expr::string("many"))]);
    match err {
        EvalError::TypeError { message } => {
            assert_eq!(message, "property `points` of `task` expects `int`, found `string`")
        }
        other => panic!("expected a type error, got {other:?}"),
    }
}

#[test]
fn test_division_by_zero() {
    let err = run_err(vec![points(
        "t",
        bin(BinaryOp::Div, Expr::int(1), Expr::int(0)),
    )]);
    assert!(matches!(err, EvalError::DivisionByZero));
}

#[test]
fn test_arity_mismatch() {
    let err = run_err(vec![
        factorial(),
        points("t", Expr::call("fact", vec![])),
    ]);
    assert!(matches!(
        err,
        EvalError::ArityMismatch { name, expected: 1, got: 0 } if name == "fact"
    ));
}

#[test]
fn test_condition_must_be_bool() {
    let err = run_err(vec![
        ast::function(
            "f",
            vec![],
            Some("int"),
            vec![
                Stmt::if_else(Expr::int(1), Stmt::ret(Expr::int(1)), None),
                Stmt::ret(Expr::int(0)),
            ],
        ),
        points("t", Expr::call("f", vec![])),
    ]);
    assert!(matches!(err, EvalError::TypeError { .. }));
}

#[test]
fn test_globals_are_not_assignable() {
    let err = run_err(vec![
        points("target", Expr::int(1)),
        ast::function(
            "f",
            vec![],
            None,
            vec![Stmt::expr(Expr::assign(
                Expr::ident("target"),
                Expr::ident("target"),
            ))],
        ),
        points("t", Expr::call("f", vec![])),
    ]);
    assert!(matches!(err, EvalError::InvalidAssignment { .. }));
}

#[test]
fn test_native_shape_error_yields_none() -> anyhow::Result<()> {
    init_tracing();
    let registry = TypeBuilder::new()
        .with_prelude()
        .register_function(NativeFunction::new(
            "strict",
            FunctionType::new(Type::INT, vec![Type::INT]),
            |_ctx, args| match args {
                [Value::Int(n)] => Ok(Value::Int(*n)),
                [other] => Err(NativeError::shape("an int", other)),
                _ => Err(NativeError::Failed("strict takes one argument".into())),
            },
        ))
        .build();
    let programs = [Program::new(
        "main.dng",
        vec![
            points("good", Expr::call("strict", vec![Expr::int(5)])),
            points("bad", Expr::call("strict", vec![Expr::string("five")])),
        ],
    )];

    let (result, _) = run_with(&programs, Arc::new(registry), EvalContext::default())?;
    let env = result?;
    assert_eq!(points_of(&env, "good"), Some(Value::Int(5)));
    assert_eq!(points_of(&env, "bad"), Some(Value::None));
    Ok(())
}
