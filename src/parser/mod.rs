//! Sprig Parser Module
//!
//! Parses the token stream into an Abstract Syntax Tree (AST).

mod ast;
mod pratt;

pub use ast::{BinaryOp, Expression, Literal, LogicalOp, Program, Statement, UnaryOp};
pub use pratt::{Parser, ParserConfig};
