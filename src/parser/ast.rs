use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::lexer::Position;

/// Complete Sprig program (the root of the syntax tree)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Top-level statements in the program
    pub statements: Vec<Statement>,
}

/// Statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Binding: `let name = value`
    ///
    /// Introduces a fresh binding that shadows any outer one for the rest of
    /// the enclosing sequence. `fn name(...) { ... }` desugars to this.
    Let {
        /// Name being bound
        name: String,
        /// Initializer expression
        value: Expression,
        /// Position of the `let`/`fn` keyword
        position: Position,
    },

    /// Expression statement
    Expression(Expression),
}

/// Literal values that appear directly in source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// Number literal
    Number(f64),
    /// String literal
    String(String),
    /// `true` / `false`
    Bool(bool),
    /// `nil`
    Nil,
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Literal expression
    Literal {
        /// The literal value
        value: Literal,
        /// Source position
        position: Position,
    },

    /// Variable reference expression
    Identifier {
        /// Referenced name
        name: String,
        /// Source position
        position: Position,
    },

    /// Binary operation expression
    Binary {
        /// Binary operator to apply
        op: BinaryOp,
        /// Left operand expression
        left: Box<Expression>,
        /// Right operand expression
        right: Box<Expression>,
        /// Position of the operator
        position: Position,
    },

    /// Short-circuiting `&&` / `||`
    Logical {
        /// Logical operator to apply
        op: LogicalOp,
        /// Left operand expression (always evaluated)
        left: Box<Expression>,
        /// Right operand expression (evaluated only when needed)
        right: Box<Expression>,
        /// Position of the operator
        position: Position,
    },

    /// Unary operation expression
    Unary {
        /// Unary operator to apply
        op: UnaryOp,
        /// Operand expression
        operand: Box<Expression>,
        /// Position of the operator
        position: Position,
    },

    /// Function call
    Call {
        /// Expression producing the function
        callee: Box<Expression>,
        /// Arguments, evaluated left to right at call time
        args: Vec<Expression>,
        /// Position of the opening parenthesis
        position: Position,
    },

    /// Function definition (arrow function or `fn`)
    Function {
        /// Name, when defined through `fn name(...)`
        name: Option<String>,
        /// Parameter names
        params: Vec<String>,
        /// Body, shared by every closure created from this definition
        body: Arc<Expression>,
        /// Source position
        position: Position,
    },

    /// Conditional expression
    If {
        /// Condition expression to evaluate (must be a boolean)
        condition: Box<Expression>,
        /// Branch taken when the condition is true
        then_branch: Box<Expression>,
        /// Branch taken when the condition is false (`nil` when absent)
        else_branch: Option<Box<Expression>>,
        /// Position of the `if` keyword
        position: Position,
    },

    /// While loop
    While {
        /// Loop condition expression
        condition: Box<Expression>,
        /// Loop body
        body: Box<Expression>,
        /// Position of the `while` keyword
        position: Position,
    },

    /// Assignment to an existing binding: `name = value`
    Assign {
        /// Target name
        name: String,
        /// New value
        value: Box<Expression>,
        /// Position of the target
        position: Position,
    },

    /// Block `{ ... }`; runs in its own scope, yields its last statement
    Block {
        /// Statements in order
        statements: Vec<Statement>,
        /// Position of the opening brace
        position: Position,
    },
}

impl Expression {
    /// Source position of the expression
    pub fn position(&self) -> Position {
        match self {
            Expression::Literal { position, .. }
            | Expression::Identifier { position, .. }
            | Expression::Binary { position, .. }
            | Expression::Logical { position, .. }
            | Expression::Unary { position, .. }
            | Expression::Call { position, .. }
            | Expression::Function { position, .. }
            | Expression::If { position, .. }
            | Expression::While { position, .. }
            | Expression::Assign { position, .. }
            | Expression::Block { position, .. } => *position,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    /// Addition / string concatenation operator
    Add,
    /// Subtraction operator
    Sub,
    /// Multiplication operator
    Mul,
    /// Division operator
    Div,
    /// Remainder operator
    Mod,

    // Comparison
    /// Equality operator
    Eq,
    /// Inequality operator
    NotEq,
    /// Less than operator
    Lt,
    /// Greater than operator
    Gt,
    /// Less than or equal operator
    LtEq,
    /// Greater than or equal operator
    GtEq,
}

/// Logical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Negation operator (-)
    Neg,
    /// Logical NOT operator (!)
    Not,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LogicalOp::And => write!(f, "&&"),
            LogicalOp::Or => write!(f, "||"),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Not => write!(f, "!"),
        }
    }
}
