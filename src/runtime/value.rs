use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result, RuntimeErrorKind};
use crate::parser::{Expression, Literal};
use crate::runtime::{Builtin, Env};

/// Runtime value representation
#[derive(Debug, Clone)]
pub enum Value {
    /// Nil / unit value
    Nil,
    /// Boolean value
    Bool(bool),
    /// Number value (64-bit float)
    Number(f64),
    /// String value
    String(String),
    /// User-defined function closing over its defining environment
    Function(Arc<Closure>),
    /// Native function installed in the global environment
    Builtin(Arc<dyn Builtin>),
}

/// A function value: parameters, shared body and captured environment
pub struct Closure {
    /// Name from `fn name(...)`, if any
    pub name: Option<String>,
    /// Parameter names
    pub params: Vec<String>,
    /// Body expression shared with the syntax tree
    pub body: Arc<Expression>,
    /// Environment active when the function was created
    pub env: Env,
}

impl fmt::Debug for Closure {
    // The captured environment can reach this closure again, so it is not printed
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Value {
    /// Creates a string value
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Returns the type name as a string
    pub fn type_name(&self) -> String {
        match self {
            Value::Nil => "nil".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Number(_) => "number".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Function(_) => "function".to_string(),
            Value::Builtin(_) => "builtin".to_string(),
        }
    }

    /// True when both values are the same kind of value
    pub fn same_kind(&self, other: &Value) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// True for functions and built-ins
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Builtin(_))
    }

    /// Get as boolean, failing with a type mismatch otherwise
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(type_mismatch("bool", other)),
        }
    }

    /// Get as number, failing with a type mismatch otherwise
    pub fn as_number(&self) -> Result<f64> {
        match self {
            Value::Number(n) => Ok(*n),
            other => Err(type_mismatch("number", other)),
        }
    }

    /// Get as string slice, failing with a type mismatch otherwise
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(type_mismatch("string", other)),
        }
    }
}

/// Builds a `TypeMismatch` error for a value of the wrong kind
pub(crate) fn type_mismatch(expected: &str, got: &Value) -> Error {
    Error::runtime(RuntimeErrorKind::TypeMismatch {
        expected: expected.to_string(),
        got: got.type_name(),
    })
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::String(s.clone()),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Nil => Value::Nil,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Function(closure) => match &closure.name {
                Some(name) => write!(f, "<fn {}>", name),
                None => write!(f, "<fn>"),
            },
            Value::Builtin(builtin) => write!(f, "<builtin {}>", builtin.name()),
        }
    }
}

/// Same-kind comparison: by value for data, by identity for functions.
/// Values of different kinds are never equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
