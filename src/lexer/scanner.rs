use super::token::{Position, Token, TokenKind};
use crate::error::{Error, LexErrorKind, Result};

/// Lazy scanner for Sprig source text
///
/// Implements `Iterator<Item = Result<Token>>`: tokens are produced on demand,
/// exactly one `Eof` token ends the sequence, and the first error also ends it.
pub struct Scanner {
    /// Source code as character vector
    source: Vec<char>,
    /// Start position of current token
    start: usize,
    /// Line/column of the start of the current token
    start_position: Position,
    /// Current position in source
    current: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    column: usize,
    /// Set once `Eof` or an error has been yielded
    finished: bool,
}

impl Scanner {
    /// Creates a new scanner over source code
    pub fn new(source: &str) -> Self {
        Scanner {
            source: source.chars().collect(),
            start: 0,
            start_position: Position::start(),
            current: 0,
            line: 1,
            column: 1,
            finished: false,
        }
    }

    /// Scans all remaining tokens (including `Eof`) and returns them as a vector
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        for token in self.by_ref() {
            tokens.push(token?);
        }
        Ok(tokens)
    }

    fn scan_token(&mut self) -> Result<Token> {
        self.skip_trivia()?;

        self.start = self.current;
        self.start_position = self.current_position();

        if self.is_at_end() {
            return Ok(self.make_token(TokenKind::Eof));
        }

        let c = self.advance();

        let kind = match c {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,

            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,

            '=' => {
                if self.match_char('=') {
                    TokenKind::Eq
                } else if self.match_char('>') {
                    TokenKind::FatArrow
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.match_char('=') {
                    TokenKind::NotEq
                } else {
                    TokenKind::Not
                }
            }
            '<' => {
                if self.match_char('=') {
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.match_char('=') {
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            '&' if self.match_char('&') => TokenKind::And,
            '|' if self.match_char('|') => TokenKind::Or,

            '"' => self.scan_string()?,

            c if c.is_ascii_digit() => self.scan_number()?,

            c if c.is_alphabetic() || c == '_' => self.scan_identifier_or_keyword(),

            _ => {
                return Err(Error::lex(
                    LexErrorKind::UnexpectedCharacter(c),
                    self.start_position,
                ));
            }
        };

        Ok(self.make_token(kind))
    }

    /// Skips whitespace, `// line` and `/* block */` comments
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                ' ' | '\r' | '\t' | '\n' => {
                    self.advance();
                }
                '/' if self.peek_next() == '/' => {
                    while !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                }
                '/' if self.peek_next() == '*' => {
                    let opened_at = self.current_position();
                    self.advance();
                    self.advance();
                    loop {
                        if self.is_at_end() {
                            return Err(Error::lex(LexErrorKind::UnterminatedComment, opened_at));
                        }
                        if self.peek() == '*' && self.peek_next() == '/' {
                            self.advance();
                            self.advance();
                            break;
                        }
                        self.advance();
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn scan_string(&mut self) -> Result<TokenKind> {
        let mut value = String::new();

        while !self.is_at_end() && self.peek() != '"' {
            if self.peek() == '\\' {
                let escape_at = self.current_position();
                self.advance();
                if self.is_at_end() {
                    break;
                }
                let escaped = self.advance();
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '\\' => value.push('\\'),
                    '"' => value.push('"'),
                    other => {
                        return Err(Error::lex(LexErrorKind::InvalidEscape(other), escape_at));
                    }
                }
            } else {
                value.push(self.advance());
            }
        }

        if self.is_at_end() {
            return Err(Error::lex(
                LexErrorKind::UnterminatedString,
                self.start_position,
            ));
        }

        self.advance(); // Closing "

        Ok(TokenKind::String(value))
    }

    fn scan_number(&mut self) -> Result<TokenKind> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance(); // consume .
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text = self.lexeme();
        let value: f64 = text.parse().map_err(|_| {
            Error::lex(LexErrorKind::InvalidNumber(text.clone()), self.start_position)
        })?;

        Ok(TokenKind::Number(value))
    }

    fn scan_identifier_or_keyword(&mut self) -> TokenKind {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = self.lexeme();
        TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier(text))
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn current_position(&self) -> Position {
        Position::new(self.current, self.line, self.column)
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source[self.current]
        }
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.source.len() {
            '\0'
        } else {
            self.source[self.current + 1]
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    fn lexeme(&self) -> String {
        self.source[self.start..self.current].iter().collect()
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.lexeme(), self.start_position)
    }
}

impl Iterator for Scanner {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = self.scan_token();
        match &result {
            Ok(token) => {
                tracing::trace!(kind = ?token.kind, offset = token.position.offset, "token");
                if token.kind == TokenKind::Eof {
                    self.finished = true;
                }
            }
            Err(_) => self.finished = true,
        }
        Some(result)
    }
}

/// Tokenizes source text lazily
pub fn tokenize(source: &str) -> Scanner {
    Scanner::new(source)
}
