//! Error types for the Sprig interpreter

use thiserror::Error;

use crate::lexer::Position;

/// Sprig interpreter errors, one variant per pipeline stage
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Source text contained something the scanner has no rule for
    ///
    /// **Triggered by:** stray characters, unterminated strings or comments
    /// **Example:** `1 @ 2`
    #[error("Lex error at line {}, column {}: {kind}", .position.line, .position.column)]
    Lex {
        /// What went wrong
        kind: LexErrorKind,
        /// Where it went wrong
        position: Position,
    },

    /// Token stream does not match the grammar
    ///
    /// **Triggered by:** missing operands, unbalanced delimiters, bad assignment targets
    /// **Example:** `(1 + ` (expression expected at end of input)
    #[error("Parse error at line {}, column {}: {kind}", .position.line, .position.column)]
    Parse {
        /// What went wrong
        kind: ParseErrorKind,
        /// Where it went wrong
        position: Position,
    },

    /// Evaluation failed
    ///
    /// **Triggered by:** unbound names, operand kind mismatches, bad calls
    /// **Example:** `1 + true`
    #[error("{}", render_runtime(.kind, .position))]
    Runtime {
        /// What went wrong
        kind: RuntimeErrorKind,
        /// Position of the expression being evaluated, when known
        position: Option<Position>,
    },
}

fn render_runtime(kind: &RuntimeErrorKind, position: &Option<Position>) -> String {
    match position {
        Some(pos) => format!(
            "Runtime error at line {}, column {}: {}",
            pos.line, pos.column, kind
        ),
        None => format!("Runtime error: {}", kind),
    }
}

/// Scanner failure kinds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexErrorKind {
    /// No token rule matches this character
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),

    /// String literal runs into end of input
    #[error("unterminated string literal")]
    UnterminatedString,

    /// Unknown `\x` escape inside a string literal
    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(char),

    /// `/*` without a matching `*/`
    #[error("unterminated block comment")]
    UnterminatedComment,

    /// Digits that do not form a valid number
    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),
}

/// Parser failure kinds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    /// A specific token was required here
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        /// Description of what the grammar wanted
        expected: String,
        /// Description of the token actually present
        found: String,
    },

    /// `(` never closed
    #[error("unclosed '('")]
    UnclosedParen,

    /// `{` never closed
    #[error("unclosed '{{'")]
    UnclosedBrace,

    /// Operand position holds something that cannot start an expression
    #[error("expected expression")]
    ExpectedExpression,

    /// A name was required (after `let`, `fn`, ...)
    #[error("expected identifier")]
    ExpectedIdentifier,

    /// Left of `=` is not a plain name
    #[error("invalid assignment target")]
    InvalidAssignmentTarget,

    /// Arrow-function parameter list holds something other than a name
    #[error("function parameters must be plain identifiers")]
    InvalidParameter,

    /// Same parameter name listed twice
    #[error("duplicate parameter '{0}'")]
    DuplicateParameter(String),

    /// Expressions nested deeper than the parser allows
    #[error("expression nesting exceeds limit of {0}")]
    NestingTooDeep(usize),
}

/// Evaluator failure kinds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeErrorKind {
    /// Name not bound in any enclosing environment
    ///
    /// **Prevention:** bind names with `let` before use
    #[error("unbound identifier '{name}'")]
    UnboundIdentifier {
        /// Missing name
        name: String,
    },

    /// Operand or condition of the wrong kind
    ///
    /// **Example:** `-"a"`, `if 1 { 2 }`, `1 == "1"`
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Kind the operation needs
        expected: String,
        /// Kind it received
        got: String,
    },

    /// Call on a value that is not a function
    #[error("value of type {type_name} is not callable")]
    NotCallable {
        /// Kind of the callee
        type_name: String,
    },

    /// Argument count differs from parameter count
    #[error("expected {expected} argument(s), got {got}")]
    ArityMismatch {
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// `/` or `%` with a zero right operand
    #[error("division by zero")]
    DivisionByZero,

    /// Call or evaluation depth exceeded its configured limit
    #[error("stack overflow: depth limit of {limit} exceeded")]
    StackOverflow {
        /// The limit that tripped
        limit: usize,
    },

    /// Built-in rejected its arguments
    #[error("invalid argument for {builtin}: {reason}")]
    InvalidArgument {
        /// Built-in name
        builtin: String,
        /// Why the argument was rejected
        reason: String,
    },

    /// Writing to the output channel failed
    #[error("output failed: {message}")]
    Output {
        /// Underlying I/O error text
        message: String,
    },
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The host should stop feeding input
    Fatal,
    /// Only the current unit of work failed; later input can still run
    Recoverable,
}

impl Error {
    /// Create a lex error
    pub fn lex(kind: LexErrorKind, position: Position) -> Self {
        Error::Lex { kind, position }
    }

    /// Create a parse error
    pub fn parse(kind: ParseErrorKind, position: Position) -> Self {
        Error::Parse { kind, position }
    }

    /// Create a runtime error without position
    pub fn runtime(kind: RuntimeErrorKind) -> Self {
        Error::Runtime {
            kind,
            position: None,
        }
    }

    /// Attach a position to a runtime error that does not have one yet
    pub fn at(self, pos: Position) -> Self {
        match self {
            Error::Runtime {
                kind,
                position: None,
            } => Error::Runtime {
                kind,
                position: Some(pos),
            },
            other => other,
        }
    }

    /// Source position of the error, if known
    pub fn position(&self) -> Option<Position> {
        match self {
            Error::Lex { position, .. } | Error::Parse { position, .. } => Some(*position),
            Error::Runtime { position, .. } => *position,
        }
    }

    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self {
            Error::Runtime {
                kind: RuntimeErrorKind::StackOverflow { .. } | RuntimeErrorKind::Output { .. },
                ..
            } => ErrorSeverity::Fatal,
            _ => ErrorSeverity::Recoverable,
        }
    }
}

/// Result type for Sprig operations
pub type Result<T> = std::result::Result<T, Error>;
