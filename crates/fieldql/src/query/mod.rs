//! Query language front end: tokens, expression tree and parser.
//!
//! # Syntax
//!
//! ## Comparisons
//! - `name = "Ada"`, `age >= 30`, `price < 9.99`
//! - `name ~ "ada"` / `name !~ "ada"` - substring match
//! - `status in ["open", "closed"]` / `status not in ("open",)`
//! - `deleted_at = null` / `deleted_at != null` - null checks
//! - `updated_at > created_at` - field-to-field comparison
//!
//! ## Field Paths
//! - `author.email` - follows the `author` relation
//!
//! ## Boolean Operators
//! - `and`, `or`, `not` (case-insensitive)
//! - `()` - Grouping
//!
//! # Example
//!
//! ```
//! use fieldql_rs::{Comparator, Expr, QueryParser};
//!
//! let expr = QueryParser::parse(r#"author.email = "ada@example.com""#).unwrap();
//! let Expr::Comparison(comparison) = expr else { panic!("expected a comparison") };
//! assert_eq!(comparison.field.segments, ["author", "email"]);
//! assert_eq!(comparison.op, Comparator::Eq);
//! ```

mod ast;
mod lexer;
mod parser;

pub(crate) use ast::quote;
pub use ast::{Comparator, Comparison, Expr, Literal, LiteralValue, LogicalOp, NamePath, Operand};
pub use lexer::{tokenize, Lexer, Token, TokenKind};
pub use parser::{QueryParser, MAX_NESTING_DEPTH, MAX_TERMS};

#[cfg(test)]
mod tests;
