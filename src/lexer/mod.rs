//! Lexical analysis for Sprig
//!
//! Converts source text into a lazy stream of tokens.

mod scanner;
mod token;

pub use scanner::{tokenize, Scanner};
pub use token::{Position, Token, TokenKind};
