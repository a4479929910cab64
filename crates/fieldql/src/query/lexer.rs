//! Lexer (tokenizer) for query expressions.
//!
//! The lexer is a lazy, single-pass iterator over the query text. It yields
//! one `Result<Token, LexError>` per token, ends with exactly one
//! [`TokenKind::Eof`] token, and stops after the first error.

use std::fmt;
use std::iter::FusedIterator;
use std::str::Chars;

use super::ast::Comparator;
use crate::error::{LexError, LexResult};

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A field name or dotted path (`author.email`).
    Name,
    /// Integer literal.
    Int,
    /// Floating point literal.
    Float,
    /// Quoted string literal.
    String,
    /// `true` / `false`, any case.
    Bool,
    /// `null`, any case.
    Null,
    /// `and`
    And,
    /// `or`
    Or,
    /// `not`
    Not,
    /// A comparison operator, including `in`.
    Comparator(Comparator),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `,`
    Comma,
    /// End of input.
    Eof,
}

/// A token with its text and position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The token kind.
    pub kind: TokenKind,
    /// Source text; for strings, the unescaped content.
    pub text: String,
    /// Character offset (0-indexed) where the token starts.
    pub offset: usize,
}

impl Token {
    /// Creates a token.
    pub fn new(kind: TokenKind, text: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            offset,
        }
    }

    /// Creates an end-of-input token.
    pub fn eof(offset: usize) -> Self {
        Self::new(TokenKind::Eof, "", offset)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("end of input"),
            TokenKind::String => write!(f, "string {}", super::ast::quote(&self.text)),
            _ => write!(f, "'{}'", self.text),
        }
    }
}

/// Tokenizes a query string.
///
/// # Example
///
/// ```
/// use fieldql_rs::{tokenize, TokenKind};
///
/// let kinds: Vec<TokenKind> = tokenize("age >= 18")
///     .map(|t| t.unwrap().kind)
///     .collect();
/// assert_eq!(kinds.len(), 4); // name, comparator, int, eof
/// assert_eq!(kinds[3], TokenKind::Eof);
/// ```
pub fn tokenize(input: &str) -> Lexer<'_> {
    Lexer::new(input)
}

/// Lexer for tokenizing query expressions.
pub struct Lexer<'a> {
    chars: Chars<'a>,
    /// Current character position in the input string.
    position: usize,
    /// Set once EOF or an error has been produced.
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars(),
            position: 0,
            finished: false,
        }
    }

    /// Peeks at the next character without consuming it.
    fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    /// Peeks `n` characters past the next one.
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n)
    }

    /// Consumes and returns the next character, updating position.
    fn next_char(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c.is_some() {
            self.position += 1;
        }
        c
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.next_char();
        }
    }

    /// Consumes one character and returns a token of the given kind.
    fn single(&mut self, kind: TokenKind, start: usize) -> Token {
        let c = self.next_char().map(String::from).unwrap_or_default();
        Token::new(kind, c, start)
    }

    /// Consumes a one- or two-character operator.
    ///
    /// If the character after the first one is `second`, both are consumed
    /// and `long` is produced; otherwise only the first one and `short`.
    fn operator(
        &mut self,
        second: char,
        long: Comparator,
        short: Comparator,
        start: usize,
    ) -> Token {
        self.next_char();
        if self.peek() == Some(second) {
            self.next_char();
            Token::new(TokenKind::Comparator(long), long.symbol(), start)
        } else {
            Token::new(TokenKind::Comparator(short), short.symbol(), start)
        }
    }

    /// Returns the next token, or an error for malformed input.
    fn next_token(&mut self) -> LexResult<Token> {
        self.skip_whitespace();

        let start = self.position;
        let Some(c) = self.peek() else {
            return Ok(Token::eof(start));
        };

        match c {
            '(' => Ok(self.single(TokenKind::LParen, start)),
            ')' => Ok(self.single(TokenKind::RParen, start)),
            '[' => Ok(self.single(TokenKind::LBracket, start)),
            ']' => Ok(self.single(TokenKind::RBracket, start)),
            ',' => Ok(self.single(TokenKind::Comma, start)),
            '=' => Ok(self.single(TokenKind::Comparator(Comparator::Eq), start)),
            '~' => Ok(self.single(TokenKind::Comparator(Comparator::Contains), start)),
            '>' => Ok(self.operator('=', Comparator::Gte, Comparator::Gt, start)),
            '<' => Ok(self.operator('=', Comparator::Lte, Comparator::Lt, start)),
            '!' => match self.peek_nth(1) {
                Some('=') => Ok(self.operator('=', Comparator::Ne, Comparator::Ne, start)),
                Some('~') => Ok(self.operator(
                    '~',
                    Comparator::NotContains,
                    Comparator::NotContains,
                    start,
                )),
                _ => Err(LexError::new(
                    start,
                    "unexpected character '!' (did you mean '!=' or '!~'?)",
                )),
            },
            '"' | '\'' => self.read_string(c, start),
            '-' | '0'..='9' => self.read_number(start),
            c if c.is_ascii_alphabetic() || c == '_' => Ok(self.read_name(start)),
            other => Err(LexError::new(
                start,
                format!("unexpected character '{other}'"),
            )),
        }
    }

    /// Reads a name or keyword.
    fn read_name(&mut self, start: usize) -> Token {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                name.push(c);
                self.next_char();
            } else {
                break;
            }
        }

        let kind = if name.contains('.') {
            TokenKind::Name
        } else {
            match name.to_ascii_lowercase().as_str() {
                "and" => TokenKind::And,
                "or" => TokenKind::Or,
                "not" => TokenKind::Not,
                "in" => TokenKind::Comparator(Comparator::In),
                "true" | "false" => TokenKind::Bool,
                "null" => TokenKind::Null,
                _ => TokenKind::Name,
            }
        };
        Token::new(kind, name, start)
    }

    /// Appends consecutive ASCII digits to `text`.
    fn read_digits(&mut self, text: &mut String) {
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            text.push(c);
            self.next_char();
        }
    }

    /// Reads an integer or float literal with an optional leading minus.
    fn read_number(&mut self, start: usize) -> LexResult<Token> {
        let mut text = String::new();

        if self.peek() == Some('-') {
            self.next_char();
            text.push('-');
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return Err(LexError::new(start, "expected a digit after '-'"));
            }
        }
        self.read_digits(&mut text);

        let mut is_float = false;
        if self.peek() == Some('.') {
            if !self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
                return Err(LexError::new(
                    self.position,
                    format!("malformed number '{text}.'"),
                ));
            }
            self.next_char();
            text.push('.');
            self.read_digits(&mut text);
            is_float = true;
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let exponent_digit_at = match self.peek_nth(1) {
                Some('+' | '-') => 2,
                _ => 1,
            };
            if self
                .peek_nth(exponent_digit_at)
                .is_some_and(|c| c.is_ascii_digit())
            {
                for _ in 0..exponent_digit_at {
                    if let Some(c) = self.next_char() {
                        text.push(c);
                    }
                }
                self.read_digits(&mut text);
                is_float = true;
            }
        }

        let kind = if is_float {
            TokenKind::Float
        } else {
            TokenKind::Int
        };
        Ok(Token::new(kind, text, start))
    }

    /// Reads a quoted string (single or double quotes) with escapes.
    fn read_string(&mut self, quote: char, start: usize) -> LexResult<Token> {
        // Consume the opening quote
        self.next_char();

        let mut value = String::new();
        loop {
            let escape_at = self.position;
            match self.next_char() {
                None => return Err(LexError::new(start, "unterminated string literal")),
                Some(c) if c == quote => break,
                Some('\\') => {
                    let escaped = match self.next_char() {
                        None => {
                            return Err(LexError::new(start, "unterminated string literal"))
                        }
                        Some(c @ ('"' | '\'' | '\\' | '/')) => c,
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('b') => '\u{8}',
                        Some('f') => '\u{c}',
                        Some('u') => self.read_unicode_escape(escape_at)?,
                        Some(other) => {
                            return Err(LexError::new(
                                escape_at,
                                format!("invalid escape sequence '\\{other}'"),
                            ))
                        }
                    };
                    value.push(escaped);
                }
                Some(c) => value.push(c),
            }
        }

        Ok(Token::new(TokenKind::String, value, start))
    }

    /// Reads the four hex digits of a `\uXXXX` escape.
    fn read_unicode_escape(&mut self, escape_at: usize) -> LexResult<char> {
        let mut hex = String::with_capacity(4);
        for _ in 0..4 {
            match self.peek().filter(char::is_ascii_hexdigit) {
                Some(c) => {
                    hex.push(c);
                    self.next_char();
                }
                None => break,
            }
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .filter(|_| hex.len() == 4)
            .and_then(char::from_u32)
            .ok_or_else(|| {
                LexError::new(escape_at, format!("invalid unicode escape '\\u{hex}'"))
            })
    }
}

impl Iterator for Lexer<'_> {
    type Item = LexResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        if !matches!(&result, Ok(token) if token.kind != TokenKind::Eof) {
            self.finished = true;
        }
        Some(result)
    }
}

impl FusedIterator for Lexer<'_> {}
