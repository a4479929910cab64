//! Search-engine style queries over relational models.
//!
//! A query such as `author.email = "ada@example.com" and pages > 10` goes
//! through three stages:
//!
//! 1. [`tokenize`] turns the text into tokens with character offsets.
//! 2. [`QueryParser`] builds an [`Expr`] tree by recursive descent.
//! 3. [`translate`] resolves field paths against a [`Schema`], checks
//!    operators and coerces values, producing a [`Predicate`].
//!
//! [`QueryEngine`] wraps the pipeline for hosts, mapping blank queries to "no
//! filter" and errors to an empty result with a warning. [`Schema::as_introspection`]
//! describes the searchable fields for client-side autocomplete.
//!
//! # Example
//!
//! ```
//! use fieldql_rs::{search, FieldDef, ModelDef, ModelRegistry, Schema};
//!
//! let registry = ModelRegistry::new()
//!     .with_model("user", ModelDef::new([FieldDef::text("email")]))
//!     .with_model("payment", ModelDef::new([
//!         FieldDef::number("amount"),
//!         FieldDef::relation("user", "user"),
//!     ]));
//! let schema = Schema::new(registry, "payment").unwrap();
//!
//! let predicate = search(r#"user.email = "x@y.com" and amount > 10"#, &schema)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(predicate.to_string(), r#"(user.email = "x@y.com" and amount > 10)"#);
//! ```

mod error;
mod evaluator;
mod predicate;
mod query;
mod schema;
mod search;
mod translator;

pub use error::{
    LexError, LexResult, ParseError, QueryError, QueryResult, SchemaError, SchemaResult,
    TranslationError,
};
pub use evaluator::PredicateEvaluator;
pub use predicate::{
    FieldRef, Predicate, PredicateValue, ScalarValue, DATETIME_FORMAT, DATE_FORMAT,
};
pub use query::{
    tokenize, Comparator, Comparison, Expr, Lexer, Literal, LiteralValue, LogicalOp, NamePath,
    Operand, QueryParser, Token, TokenKind, MAX_NESTING_DEPTH, MAX_TERMS,
};
pub use schema::{
    Field, FieldDef, FieldDescription, FieldType, Introspection, ModelDef, ModelRegistry, Schema,
    SchemaCache, SchemaOptions, Suggestion, DEFAULT_MAX_DEPTH,
};
pub use search::{search, QueryEngine, SearchOutcome};
pub use translator::{translate, Translator};
