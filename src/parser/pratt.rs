use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use super::ast::{BinaryOp, Expression, Literal, LogicalOp, Program, Statement, UnaryOp};
use crate::error::{Error, ParseErrorKind, Result};
use crate::lexer::{Position, Token, TokenKind};

/// Binding power of prefix `-` and `!`
const PREFIX_BP: u8 = 15;

/// Parser limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum nesting depth of expressions, blocks and `else if` arms
    pub max_nesting: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig { max_nesting: 128 }
    }
}

impl ParserConfig {
    /// Sets the maximum nesting depth
    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }
}

/// Recursive-descent parser with a Pratt loop for operators
///
/// Pulls tokens lazily from any token iterator, looks at most one token
/// ahead and never backtracks.
pub struct Parser<I>
where
    I: Iterator<Item = Result<Token>>,
{
    tokens: I,
    /// One token of lookahead, filled on demand
    lookahead: Option<Token>,
    /// Position handed to the synthetic `Eof` once the iterator runs dry
    last_position: Position,
    /// Current expression nesting
    depth: usize,
    config: ParserConfig,
}

impl<I> Parser<I>
where
    I: Iterator<Item = Result<Token>>,
{
    /// Creates a new parser over a token stream
    pub fn new(tokens: I) -> Self {
        Self::with_config(tokens, ParserConfig::default())
    }

    /// Creates a parser with custom limits
    pub fn with_config(tokens: I, config: ParserConfig) -> Self {
        Parser {
            tokens,
            lookahead: None,
            last_position: Position::start(),
            depth: 0,
            config,
        }
    }

    /// Parses the tokens into an AST
    pub fn parse(&mut self) -> Result<Program> {
        let mut statements = Vec::new();

        loop {
            while self.match_kind(&TokenKind::Semicolon)? {}
            if self.check(&TokenKind::Eof)? {
                break;
            }
            statements.push(self.parse_statement()?);
        }

        tracing::debug!(statements = statements.len(), "parsed program");

        Ok(Program { statements })
    }

    // =========================================================================
    // STATEMENTS
    // =========================================================================

    fn parse_statement(&mut self) -> Result<Statement> {
        let kind = self.peek()?.kind.clone();
        let statement = match kind {
            TokenKind::Let => self.parse_let()?,
            TokenKind::Fn => self.parse_fn_statement()?,
            // A leading block, `if` or `while` ends at its closing brace
            TokenKind::LeftBrace | TokenKind::If | TokenKind::While => {
                Statement::Expression(self.nested(|parser| parser.parse_prefix())?)
            }
            _ => Statement::Expression(self.parse_expression()?),
        };

        self.match_kind(&TokenKind::Semicolon)?;
        Ok(statement)
    }

    /// `let name = expression`
    fn parse_let(&mut self) -> Result<Statement> {
        let keyword = self.advance()?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::Assign, "'=' after binding name")?;
        let value = self.parse_expression()?;

        Ok(Statement::Let {
            name,
            value,
            position: keyword.position,
        })
    }

    /// `fn name(params) { ... }`, or an anonymous `fn` used as an expression statement
    fn parse_fn_statement(&mut self) -> Result<Statement> {
        let keyword = self.advance()?;

        if let TokenKind::Identifier(name) = self.peek()?.kind.clone() {
            self.advance()?;
            let value = self.finish_fn(Some(name.clone()), keyword.position)?;
            return Ok(Statement::Let {
                name,
                value,
                position: keyword.position,
            });
        }

        let function = self.finish_fn(None, keyword.position)?;
        Ok(Statement::Expression(self.parse_infix(function, 0)?))
    }

    // =========================================================================
    // EXPRESSIONS
    // =========================================================================

    fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_precedence(0)
    }

    fn parse_precedence(&mut self, min_bp: u8) -> Result<Expression> {
        self.nested(|parser| {
            let left = parser.parse_prefix()?;
            parser.parse_infix(left, min_bp)
        })
    }

    /// Runs `parse` one nesting level deeper, failing once the limit is reached
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= self.config.max_nesting {
            let position = self.peek()?.position;
            return Err(Error::parse(
                ParseErrorKind::NestingTooDeep(self.config.max_nesting),
                position,
            ));
        }

        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Operator loop: folds infix and postfix operators onto `left`
    fn parse_infix(&mut self, mut left: Expression, min_bp: u8) -> Result<Expression> {
        loop {
            let token = self.peek()?.clone();
            let (left_bp, right_bp) = match infix_binding_power(&token.kind) {
                Some(bp) => bp,
                None => break,
            };
            if left_bp < min_bp {
                break;
            }
            self.advance()?;

            left = match token.kind {
                TokenKind::LeftParen => {
                    let args = self.parse_arguments()?;
                    Expression::Call {
                        callee: Box::new(left),
                        args,
                        position: token.position,
                    }
                }
                TokenKind::Assign => {
                    let name = match left {
                        Expression::Identifier { name, .. } => name,
                        other => {
                            return Err(Error::parse(
                                ParseErrorKind::InvalidAssignmentTarget,
                                other.position(),
                            ))
                        }
                    };
                    let value = self.parse_precedence(right_bp)?;
                    Expression::Assign {
                        name,
                        value: Box::new(value),
                        position: token.position,
                    }
                }
                TokenKind::And | TokenKind::Or => {
                    let op = if token.kind == TokenKind::And {
                        LogicalOp::And
                    } else {
                        LogicalOp::Or
                    };
                    let right = self.parse_precedence(right_bp)?;
                    Expression::Logical {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                        position: token.position,
                    }
                }
                ref kind => {
                    let op = binary_op(kind).ok_or_else(|| {
                        Error::parse(
                            ParseErrorKind::UnexpectedToken {
                                expected: "binary operator".to_string(),
                                found: kind.describe(),
                            },
                            token.position,
                        )
                    })?;
                    let right = self.parse_precedence(right_bp)?;
                    Expression::Binary {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                        position: token.position,
                    }
                }
            };
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expression> {
        let token = self.peek()?.clone();

        let literal = |value| Expression::Literal {
            value,
            position: token.position,
        };

        let expr = match token.kind {
            TokenKind::Number(n) => literal(Literal::Number(n)),
            TokenKind::String(ref s) => literal(Literal::String(s.clone())),
            TokenKind::True => literal(Literal::Bool(true)),
            TokenKind::False => literal(Literal::Bool(false)),
            TokenKind::Nil => literal(Literal::Nil),
            TokenKind::Identifier(ref name) => Expression::Identifier {
                name: name.clone(),
                position: token.position,
            },
            TokenKind::Minus | TokenKind::Not => {
                self.advance()?;
                let op = if token.kind == TokenKind::Minus {
                    UnaryOp::Neg
                } else {
                    UnaryOp::Not
                };
                let operand = self.parse_precedence(PREFIX_BP)?;
                return Ok(Expression::Unary {
                    op,
                    operand: Box::new(operand),
                    position: token.position,
                });
            }
            TokenKind::LeftParen => {
                self.advance()?;
                return self.parse_paren(token.position);
            }
            TokenKind::LeftBrace => {
                self.advance()?;
                return self.finish_block(token.position);
            }
            TokenKind::If => {
                self.advance()?;
                return self.finish_if(token.position);
            }
            TokenKind::While => {
                self.advance()?;
                return self.finish_while(token.position);
            }
            TokenKind::Fn => {
                self.advance()?;
                return self.finish_fn(None, token.position);
            }
            _ => {
                return Err(Error::parse(
                    ParseErrorKind::ExpectedExpression,
                    token.position,
                ))
            }
        };

        self.advance()?;
        Ok(expr)
    }

    /// After `(`: a parenthesized expression or an arrow function's parameter list
    fn parse_paren(&mut self, open: Position) -> Result<Expression> {
        // `()` can only start an arrow function
        if self.match_kind(&TokenKind::RightParen)? {
            self.expect(TokenKind::FatArrow, "'=>' after '()'")?;
            return self.finish_arrow(Vec::new(), open);
        }

        let first = self.parse_list_item()?;

        if self.check(&TokenKind::Comma)? {
            let mut items = vec![first];
            while self.match_kind(&TokenKind::Comma)? {
                items.push(self.parse_list_item()?);
            }
            self.expect_closing_paren()?;
            self.expect(TokenKind::FatArrow, "'=>' after parameter list")?;
            let params = params_from(items)?;
            return self.finish_arrow(params, open);
        }

        self.expect_closing_paren()?;

        if self.match_kind(&TokenKind::FatArrow)? {
            let params = params_from(vec![first])?;
            return self.finish_arrow(params, open);
        }

        Ok(first.expr)
    }

    /// One element of a parenthesized list, remembering whether it was itself
    /// wrapped in parentheses
    fn parse_list_item(&mut self) -> Result<ListItem> {
        let start = self.peek()?.clone();
        let expr = self.parse_expression()?;
        Ok(ListItem {
            expr,
            parenthesized: start.kind == TokenKind::LeftParen,
            start: start.position,
        })
    }

    fn finish_arrow(&mut self, params: Vec<String>, position: Position) -> Result<Expression> {
        let body = self.parse_expression()?;
        Ok(Expression::Function {
            name: None,
            params,
            body: Arc::new(body),
            position,
        })
    }

    /// After `fn` (and its optional name): `(params) { body }`
    fn finish_fn(&mut self, name: Option<String>, position: Position) -> Result<Expression> {
        self.expect(TokenKind::LeftParen, "'(' to start parameter list")?;

        let mut params = Vec::new();
        let mut seen = HashSet::new();
        if !self.match_kind(&TokenKind::RightParen)? {
            loop {
                let param_position = self.peek()?.position;
                let param = self.expect_identifier()?;
                if !seen.insert(param.clone()) {
                    return Err(Error::parse(
                        ParseErrorKind::DuplicateParameter(param),
                        param_position,
                    ));
                }
                params.push(param);
                if !self.match_kind(&TokenKind::Comma)? {
                    break;
                }
            }
            self.expect_closing_paren()?;
        }

        let brace = self.expect(TokenKind::LeftBrace, "'{' to start function body")?;
        let body = self.finish_block(brace.position)?;

        Ok(Expression::Function {
            name,
            params,
            body: Arc::new(body),
            position,
        })
    }

    /// After `{`: statements up to the matching `}`
    fn finish_block(&mut self, open: Position) -> Result<Expression> {
        self.nested(|parser| parser.parse_block_body(open))
    }

    fn parse_block_body(&mut self, open: Position) -> Result<Expression> {
        let mut statements = Vec::new();

        loop {
            while self.match_kind(&TokenKind::Semicolon)? {}
            let token = self.peek()?.clone();
            match token.kind {
                TokenKind::RightBrace => {
                    self.advance()?;
                    break;
                }
                TokenKind::Eof => {
                    return Err(Error::parse(ParseErrorKind::UnclosedBrace, token.position))
                }
                _ => statements.push(self.parse_statement()?),
            }
        }

        Ok(Expression::Block {
            statements,
            position: open,
        })
    }

    /// After `if`: `condition { ... } (else ({ ... } | if ...))?`
    fn finish_if(&mut self, position: Position) -> Result<Expression> {
        let condition = self.parse_expression()?;
        let brace = self.expect(TokenKind::LeftBrace, "'{' after if condition")?;
        let then_branch = self.finish_block(brace.position)?;

        let else_branch = if self.match_kind(&TokenKind::Else)? {
            let token = self.advance()?;
            let branch = match token.kind {
                TokenKind::If => self.nested(|parser| parser.finish_if(token.position))?,
                TokenKind::LeftBrace => self.finish_block(token.position)?,
                other => {
                    return Err(Error::parse(
                        ParseErrorKind::UnexpectedToken {
                            expected: "'{' or 'if' after else".to_string(),
                            found: other.describe(),
                        },
                        token.position,
                    ))
                }
            };
            Some(Box::new(branch))
        } else {
            None
        };

        Ok(Expression::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch,
            position,
        })
    }

    /// After `while`: `condition { ... }`
    fn finish_while(&mut self, position: Position) -> Result<Expression> {
        let condition = self.parse_expression()?;
        let brace = self.expect(TokenKind::LeftBrace, "'{' after while condition")?;
        let body = self.finish_block(brace.position)?;

        Ok(Expression::While {
            condition: Box::new(condition),
            body: Box::new(body),
            position,
        })
    }

    /// After a call's `(`: comma-separated arguments up to `)`
    fn parse_arguments(&mut self) -> Result<Vec<Expression>> {
        let mut args = Vec::new();

        if self.match_kind(&TokenKind::RightParen)? {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);
            if !self.match_kind(&TokenKind::Comma)? {
                break;
            }
        }
        self.expect_closing_paren()?;

        Ok(args)
    }

    // =========================================================================
    // TOKEN HELPERS
    // =========================================================================

    fn pull(&mut self) -> Result<Token> {
        match self.tokens.next() {
            Some(token) => {
                let token = token?;
                self.last_position = token.position;
                Ok(token)
            }
            None => Ok(Token::new(TokenKind::Eof, String::new(), self.last_position)),
        }
    }

    fn peek(&mut self) -> Result<&Token> {
        let token = match self.lookahead.take() {
            Some(token) => token,
            None => self.pull()?,
        };
        let token: &Token = self.lookahead.insert(token);
        Ok(token)
    }

    fn advance(&mut self) -> Result<Token> {
        match self.lookahead.take() {
            Some(token) => Ok(token),
            None => self.pull(),
        }
    }

    fn check(&mut self, kind: &TokenKind) -> Result<bool> {
        Ok(&self.peek()?.kind == kind)
    }

    fn match_kind(&mut self, kind: &TokenKind) -> Result<bool> {
        if self.check(kind)? {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        let token = self.advance()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(Error::parse(
                ParseErrorKind::UnexpectedToken {
                    expected: expected.to_string(),
                    found: token.kind.describe(),
                },
                token.position,
            ))
        }
    }

    fn expect_closing_paren(&mut self) -> Result<()> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::RightParen => Ok(()),
            TokenKind::Eof => Err(Error::parse(ParseErrorKind::UnclosedParen, token.position)),
            other => Err(Error::parse(
                ParseErrorKind::UnexpectedToken {
                    expected: "')'".to_string(),
                    found: other.describe(),
                },
                token.position,
            )),
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::Identifier(name) => Ok(name),
            _ => Err(Error::parse(
                ParseErrorKind::ExpectedIdentifier,
                token.position,
            )),
        }
    }
}

impl Parser<std::iter::Map<std::vec::IntoIter<Token>, fn(Token) -> Result<Token>>> {
    /// Creates a parser over an already scanned token vector
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        let ok: fn(Token) -> Result<Token> = Ok;
        Parser::new(tokens.into_iter().map(ok))
    }
}

/// (left, right) binding powers; higher binds tighter
fn infix_binding_power(kind: &TokenKind) -> Option<(u8, u8)> {
    let bp = match kind {
        TokenKind::Assign => (2, 1),
        TokenKind::Or => (3, 4),
        TokenKind::And => (5, 6),
        TokenKind::Eq | TokenKind::NotEq => (7, 8),
        TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq => (9, 10),
        TokenKind::Plus | TokenKind::Minus => (11, 12),
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => (13, 14),
        TokenKind::LeftParen => (17, 0),
        _ => return None,
    };
    Some(bp)
}

fn binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::Eq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::NotEq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::LtEq => BinaryOp::LtEq,
        TokenKind::GtEq => BinaryOp::GtEq,
        _ => return None,
    };
    Some(op)
}

/// Element of a parenthesized list that may turn out to be a parameter list
struct ListItem {
    expr: Expression,
    /// Starts with `(`, so it can never be a bare parameter name
    parenthesized: bool,
    start: Position,
}

/// Turns the expressions of a parenthesized list into arrow-function parameters
fn params_from(items: Vec<ListItem>) -> Result<Vec<String>> {
    let mut params = Vec::with_capacity(items.len());
    let mut seen = HashSet::new();

    for item in items {
        if item.parenthesized {
            return Err(Error::parse(ParseErrorKind::InvalidParameter, item.start));
        }
        match item.expr {
            Expression::Identifier { name, position } => {
                if !seen.insert(name.clone()) {
                    return Err(Error::parse(
                        ParseErrorKind::DuplicateParameter(name),
                        position,
                    ));
                }
                params.push(name);
            }
            other => {
                return Err(Error::parse(
                    ParseErrorKind::InvalidParameter,
                    other.position(),
                ))
            }
        }
    }

    Ok(params)
}
