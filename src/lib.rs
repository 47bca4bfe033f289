//! # Sprig - A Small Expression Language
//!
//! An embeddable interpreter for a small, dynamically typed, expression-oriented
//! language with first-class functions and lexical closures.
//!
//! ## Features
//!
//! - **Lazy lexing** - The scanner is an iterator the parser pulls from
//! - **Pratt parsing** - Binding-power expression parsing with one token of lookahead
//! - **Lexical closures** - Functions capture the environment they are created in
//! - **Positioned errors** - Every failure carries a line and column
//! - **Bounded recursion** - Runaway recursion reports an error instead of crashing
//!
//! ## Quick Start
//!
//! ```rust
//! use sprig::{Evaluator, Parser, Scanner, Value};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let code = r#"
//!     fn fact(n) {
//!         if n <= 1 { 1 } else { n * fact(n - 1) }
//!     }
//!     fact(5)
//! "#;
//!
//! // The parser pulls tokens from the scanner on demand
//! let mut parser = Parser::new(Scanner::new(code));
//! let program = parser.parse()?;
//!
//! let mut evaluator = Evaluator::with_output(Vec::new());
//! let result = evaluator.execute(&program)?;
//!
//! assert_eq!(result, Value::Number(120.0));
//! # Ok(())
//! # }
//! ```
//!
//! ## Language Overview
//!
//! ### Data Types
//!
//! - **Primitives**: numbers (64-bit floats), strings, `true`/`false`, `nil`
//! - **Functions**: `(x, y) => x + y`, `fn(x) { x }`, `fn name(x) { x }`
//!
//! ### Bindings
//!
//! - `let x = 1` - introduces a new binding for the rest of the enclosing block;
//!   re-binding a name shadows it and never changes what earlier closures see
//! - `x = 2` - updates the nearest existing binding in place
//!
//! ### Control Flow
//!
//! - `if cond { ... } else { ... }` - conditional expression (`nil` without `else`)
//! - `while cond { ... }` - loop, evaluates to `nil`
//! - `{ a; b; c }` - block, evaluates to its last statement
//! - `&&` / `||` - short-circuit logic over booleans
//!
//! ### Built-in Functions
//!
//! - `print(v...)` - write values separated by spaces plus a newline
//! - `str(v)` - render a value as a string
//! - `len(s)` - number of characters in a string
//! - `type(v)` - name of a value's kind
//!
//! ## Architecture
//!
//! ```text
//! Source Code → Scanner → Tokens → Parser → AST → Evaluator → Value
//! ```
//!
//! - [`Scanner`] - Lazily turns source text into tokens
//! - [`Parser`] - Builds the [`Program`] syntax tree
//! - [`Evaluator`] - Walks the tree and produces a [`Value`]
//! - [`Environment`] - Chained, shared frames of bindings
//! - [`BuiltinRegistry`] - Native functions installed in the global frame
//!
//! ## Error Handling
//!
//! Every stage reports a positioned [`Error`]:
//!
//! ```rust
//! use sprig::{Error, ErrorSeverity};
//!
//! let err = sprig::parse("(1 + ").unwrap_err();
//! assert!(matches!(err, Error::Parse { .. }));
//! assert_eq!(err.classify(), ErrorSeverity::Recoverable);
//! assert_eq!(err.to_string(), "Parse error at line 1, column 6: expected expression");
//! ```

pub mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;

/// Version of the Sprig interpreter
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export main types
pub use error::{Error, ErrorSeverity, LexErrorKind, ParseErrorKind, Result, RuntimeErrorKind};
pub use lexer::{tokenize, Position, Scanner, Token, TokenKind};
pub use parser::{
    BinaryOp, Expression, Literal, LogicalOp, Parser, ParserConfig, Program, Statement, UnaryOp,
};
pub use runtime::{
    Builtin, BuiltinRegistry, Closure, Env, Environment, Evaluator, EvaluatorConfig, Value,
};

/// Parses source text into a [`Program`]
pub fn parse(source: &str) -> Result<Program> {
    Parser::new(tokenize(source)).parse()
}

/// Parses and executes source text with a fresh evaluator printing to stdout
///
/// ```rust
/// let value = sprig::run("let double = (x) => x * 2; double(21)").unwrap();
/// assert_eq!(value, sprig::Value::Number(42.0));
/// ```
pub fn run(source: &str) -> Result<Value> {
    let program = parse(source)?;
    Evaluator::new().execute(&program)
}
