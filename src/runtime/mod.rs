//! Runtime execution for Sprig programs using tree-walking evaluation

mod builtins;
mod config;
mod environment;
mod evaluator;
mod value;

pub use builtins::{
    Builtin, BuiltinRegistry, LenBuiltin, PrintBuiltin, StrBuiltin, TypeBuiltin,
};
pub use config::EvaluatorConfig;
pub use environment::{Env, Environment};
pub use evaluator::Evaluator;
pub use value::{Closure, Value};
