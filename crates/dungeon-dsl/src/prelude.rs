//! Host types and natives every dungeon program can use
//!
//! [`TypeBuilder::with_prelude`] registers:
//!
//! - `quest_config`: the quest a level file configures
//! - `task`: a node payload in a quest's task graph
//! - `print(value)`: writes a value and a newline to the interpreter output
//! - `quest_config.task_count()`: number of nodes in the level graph

use crate::builder::TypeBuilder;
use crate::error::NativeError;
use crate::graph::TaskDependencyGraph;
use crate::types::{FunctionType, Type};
use crate::value::{NativeFunction, Value};
use crate::DslType;

/// Configuration of a quest.
#[derive(Debug, Clone, Default, PartialEq, DslType)]
#[dsl(name = "quest_config")]
pub struct QuestConfig {
    /// Task graph of the level
    #[dsl(member)]
    pub level_graph: Option<TaskDependencyGraph>,

    /// Description shown to the player
    #[dsl(member)]
    pub quest_desc: String,

    /// Password unlocking the quest
    #[dsl(member)]
    pub password: String,

    /// Points awarded on completion
    #[dsl(member, name = "points")]
    pub quest_points: i64,
}

/// A single task of a quest.
#[derive(Debug, Clone, Default, PartialEq, DslType)]
pub struct Task {
    /// What the player has to do
    #[dsl(member)]
    pub description: String,

    /// Points awarded for the task
    #[dsl(member)]
    pub points: i64,

    /// Shown after the task is solved
    #[dsl(member)]
    pub explanation: String,
}

impl TypeBuilder {
    /// Register the prelude types and natives.
    pub fn with_prelude(self) -> Self {
        self.register::<QuestConfig>()
            .register::<Task>()
            .register_function(print())
            .register_extension_method::<QuestConfig>(task_count())
    }
}

fn print() -> NativeFunction {
    NativeFunction::new(
        "print",
        FunctionType::new(Type::NONE, vec![Type::ANY]),
        |ctx, args| {
            let [value] = args else {
                return Err(NativeError::Failed(format!(
                    "print takes one argument, got {}",
                    args.len()
                )));
            };
            writeln!(ctx.output, "{}", value).map_err(|err| NativeError::Failed(err.to_string()))?;
            Ok(Value::None)
        },
    )
}

fn task_count() -> NativeFunction {
    NativeFunction::new(
        "task_count",
        FunctionType::new(Type::INT, vec![]),
        |ctx, _args| {
            let receiver = ctx.receiver()?;
            match receiver.member("level_graph") {
                Some(Value::Graph(graph)) => Ok(Value::Int(graph.nodes.len() as i64)),
                Some(Value::None) | None => Ok(Value::Int(0)),
                Some(other) => Err(NativeError::shape("a graph", other)),
            }
        },
    )
}
