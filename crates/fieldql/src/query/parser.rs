//! Recursive descent parser for query expressions.

use super::ast::{Comparator, Comparison, Expr, Literal, LiteralValue, NamePath, Operand};
use super::lexer::{tokenize, Lexer, Token, TokenKind};
use crate::error::{LexResult, ParseError, QueryResult};

/// Maximum nesting of parentheses and `not` before parsing gives up.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Maximum number of comparisons in one query.
///
/// `and`/`or` chains become left-deep trees, so this also bounds how deep
/// the translator and evaluator recurse.
pub const MAX_TERMS: usize = 256;

/// Parser for query expressions.
///
/// The parser pulls tokens lazily from any token iterator, so lexer errors
/// surface at the point the bad token is reached.
///
/// # Grammar
///
/// ```text
/// query      ::= or_expr EOF
/// or_expr    ::= and_expr ("or" and_expr)*
/// and_expr   ::= not_expr ("and" not_expr)*
/// not_expr   ::= "not" not_expr | primary
/// primary    ::= "(" or_expr ")" | comparison
/// comparison ::= name_path comparator operand
///              | name_path "not" "in" operand
/// operand    ::= literal | name_path | list
/// list       ::= "[" (literal ("," literal)* ","?)? "]"
///              | "(" (literal ("," literal)* ","?)? ")"
/// ```
///
/// # Operator Precedence (highest to lowest)
///
/// 1. comparisons
/// 2. `not` - unary, applies to a whole sub-expression
/// 3. `and` - binary, left-associative
/// 4. `or` - binary, left-associative
///
/// # Example
///
/// ```
/// use fieldql_rs::{Expr, LogicalOp, QueryParser};
///
/// let expr = QueryParser::parse("a = 1 or b = 2 and c = 3").unwrap();
/// assert!(matches!(expr, Expr::Logical { op: LogicalOp::Or, .. }));
/// ```
pub struct QueryParser<I> {
    tokens: I,
    current: Token,
    depth: usize,
    terms: usize,
}

impl<'a> QueryParser<Lexer<'a>> {
    /// Parses a query string into an expression tree.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Lex`](crate::QueryError::Lex) for malformed
    /// tokens and [`QueryError::Parse`](crate::QueryError::Parse) when the
    /// tokens do not match the grammar, including for empty input.
    pub fn parse(input: &'a str) -> QueryResult<Expr> {
        QueryParser::new(tokenize(input))?.parse_query()
    }
}

impl<I> QueryParser<I>
where
    I: Iterator<Item = LexResult<Token>>,
{
    /// Creates a parser over a token stream, reading the first token.
    pub fn new(mut tokens: I) -> QueryResult<Self> {
        let current = Self::pull(&mut tokens, 0)?;
        Ok(Self {
            tokens,
            current,
            depth: 0,
            terms: 0,
        })
    }

    /// Parses a complete query; tokens left after the expression are an error.
    pub fn parse_query(mut self) -> QueryResult<Expr> {
        let expr = self.parse_or_expr()?;

        if !self.check(TokenKind::Eof) {
            return Err(ParseError::new(
                self.current.offset,
                format!("unexpected {}, expected 'and', 'or' or end of input", self.current),
            )
            .into());
        }

        Ok(expr)
    }

    /// Reads the next token, synthesizing EOF if the stream ends early.
    fn pull(tokens: &mut I, offset: usize) -> LexResult<Token> {
        tokens.next().unwrap_or_else(|| Ok(Token::eof(offset)))
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> &Token {
        &self.current
    }

    /// Consumes and returns the current token.
    fn advance(&mut self) -> QueryResult<Token> {
        let next = Self::pull(&mut self.tokens, self.current.offset)?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    /// Checks if the current token has the expected kind.
    fn check(&self, expected: TokenKind) -> bool {
        self.peek().kind == expected
    }

    /// Consumes the current token if it has the expected kind.
    fn expect(&mut self, expected: TokenKind, description: &str) -> QueryResult<Token> {
        if !self.check(expected) {
            return Err(ParseError::new(
                self.current.offset,
                format!("unexpected {}, expected {description}", self.current),
            )
            .into());
        }
        self.advance()
    }

    /// Enters a nested construct, failing if nesting is too deep.
    fn enter(&mut self, offset: usize) -> QueryResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(ParseError::new(
                offset,
                format!("expression is nested more than {MAX_NESTING_DEPTH} levels deep"),
            )
            .into());
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Consumes an `and`/`or`, failing if the query already has too many terms.
    fn connective(&mut self) -> QueryResult<()> {
        let token = self.advance()?;
        if self.terms >= MAX_TERMS {
            return Err(ParseError::new(
                token.offset,
                format!("query has more than {MAX_TERMS} comparisons"),
            )
            .into());
        }
        Ok(())
    }

    /// Parses OR expressions: `and_expr ("or" and_expr)*`
    fn parse_or_expr(&mut self) -> QueryResult<Expr> {
        let mut left = self.parse_and_expr()?;

        while self.check(TokenKind::Or) {
            self.connective()?;
            let right = self.parse_and_expr()?;
            left = Expr::or(left, right);
        }

        Ok(left)
    }

    /// Parses AND expressions: `not_expr ("and" not_expr)*`
    fn parse_and_expr(&mut self) -> QueryResult<Expr> {
        let mut left = self.parse_not_expr()?;

        while self.check(TokenKind::And) {
            self.connective()?;
            let right = self.parse_not_expr()?;
            left = Expr::and(left, right);
        }

        Ok(left)
    }

    /// Parses NOT expressions: `"not" not_expr | primary`
    fn parse_not_expr(&mut self) -> QueryResult<Expr> {
        if self.check(TokenKind::Not) {
            let not = self.advance()?;
            self.enter(not.offset)?;
            let operand = self.parse_not_expr()?;
            self.leave();
            return Ok(Expr::negate(operand, not.offset));
        }

        self.parse_primary()
    }

    /// Parses primary expressions: `"(" or_expr ")" | comparison`
    fn parse_primary(&mut self) -> QueryResult<Expr> {
        match self.peek().kind {
            TokenKind::LParen => {
                let open = self.advance()?;
                self.enter(open.offset)?;
                let inner = self.parse_or_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                self.leave();
                Ok(inner)
            }
            TokenKind::Name => self.parse_comparison(),
            _ => Err(ParseError::new(
                self.current.offset,
                format!("unexpected {}, expected a field name or '('", self.current),
            )
            .into()),
        }
    }

    /// Parses `name_path comparator operand`.
    fn parse_comparison(&mut self) -> QueryResult<Expr> {
        let name = self.advance()?;
        let field = name_path(&name)?;
        self.terms += 1;

        let op_token = self.advance()?;
        let op = match op_token.kind {
            TokenKind::Comparator(op) => op,
            TokenKind::Not => {
                let in_token = self.advance()?;
                if in_token.kind != TokenKind::Comparator(Comparator::In) {
                    return Err(ParseError::new(
                        in_token.offset,
                        format!("unexpected {in_token}, expected 'in' after 'not'"),
                    )
                    .into());
                }
                Comparator::NotIn
            }
            _ => {
                return Err(ParseError::new(
                    op_token.offset,
                    format!("unexpected {op_token}, expected a comparison operator after '{field}'"),
                )
                .into())
            }
        };

        let value = match self.peek().kind {
            TokenKind::LBracket | TokenKind::LParen => self.parse_list()?,
            TokenKind::Name => {
                let other = self.advance()?;
                Operand::Name(name_path(&other)?)
            }
            _ if is_literal(self.peek().kind) => Operand::Literal(self.parse_literal()?),
            _ => {
                return Err(ParseError::new(
                    self.current.offset,
                    format!("unexpected {}, expected a value after '{op}'", self.current),
                )
                .into())
            }
        };

        let offset = field.offset;
        Ok(Expr::Comparison(Comparison {
            field,
            op,
            value,
            offset,
        }))
    }

    /// Parses a bracketed (or parenthesized) list of literals.
    fn parse_list(&mut self) -> QueryResult<Operand> {
        let open = self.advance()?;
        let (close, close_text) = if open.kind == TokenKind::LBracket {
            (TokenKind::RBracket, "']'")
        } else {
            (TokenKind::RParen, "')'")
        };

        let mut items = Vec::new();
        loop {
            if self.check(close) {
                self.advance()?;
                break;
            }
            if !is_literal(self.peek().kind) {
                return Err(ParseError::new(
                    self.current.offset,
                    format!("unexpected {}, expected a value or {close_text}", self.current),
                )
                .into());
            }
            items.push(self.parse_literal()?);

            if self.check(TokenKind::Comma) {
                self.advance()?;
            } else {
                self.expect(close, &format!("',' or {close_text}"))?;
                break;
            }
        }

        Ok(Operand::List {
            items,
            offset: open.offset,
        })
    }

    /// Parses a single literal token into a value.
    fn parse_literal(&mut self) -> QueryResult<Literal> {
        let token = self.advance()?;
        let value = match token.kind {
            TokenKind::Int => token.text.parse::<i64>().map(LiteralValue::Int).map_err(|_| {
                ParseError::new(
                    token.offset,
                    format!("integer literal '{}' is out of range", token.text),
                )
            })?,
            TokenKind::Float => token
                .text
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(LiteralValue::Float)
                .ok_or_else(|| {
                    ParseError::new(
                        token.offset,
                        format!("number literal '{}' is out of range", token.text),
                    )
                })?,
            TokenKind::String => LiteralValue::String(token.text),
            TokenKind::Bool => LiteralValue::Bool(token.text.eq_ignore_ascii_case("true")),
            TokenKind::Null => LiteralValue::Null,
            _ => {
                return Err(ParseError::new(
                    token.offset,
                    format!("unexpected {token}, expected a value"),
                )
                .into())
            }
        };
        Ok(Literal::new(value, token.offset))
    }
}

/// Returns true for token kinds that start a literal value.
fn is_literal(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Int | TokenKind::Float | TokenKind::String | TokenKind::Bool | TokenKind::Null
    )
}

/// Splits a NAME token into path segments.
fn name_path(token: &Token) -> QueryResult<NamePath> {
    let segments: Vec<&str> = token.text.split('.').collect();
    if let Some(index) = segments.iter().position(|s| s.is_empty()) {
        let offset = token.offset
            + segments[..index]
                .iter()
                .map(|s| s.chars().count() + 1)
                .sum::<usize>();
        return Err(ParseError::new(
            offset,
            format!("invalid field name '{}': empty path segment", token.text),
        )
        .into());
    }
    Ok(NamePath::new(segments, token.offset))
}
