//! Error types for the query pipeline.
//!
//! Each stage has its own error type so callers can tell a malformed token
//! from an unknown field. [`QueryError`] wraps all four for callers that only
//! need a message and, where one exists, the character offset of the problem.

use thiserror::Error;

/// A specialized Result type for the lexer.
pub type LexResult<T> = Result<T, LexError>;

/// A specialized Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// A specialized Result type for the whole query pipeline.
pub type QueryResult<T> = Result<T, QueryError>;

/// A malformed token: an unrecognized character or an unterminated string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} at position {offset}")]
pub struct LexError {
    /// Character offset (0-indexed column) of the offending input.
    pub offset: usize,
    /// Human-readable description.
    pub message: String,
}

impl LexError {
    /// Creates a lexer error at the given offset.
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// A token sequence that does not match the grammar.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} at position {offset}")]
pub struct ParseError {
    /// Character offset of the token that could not be parsed.
    pub offset: usize,
    /// Human-readable description.
    pub message: String,
}

impl ParseError {
    /// Creates a parse error at the given offset.
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// An invalid field path, or an invalid schema definition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct SchemaError {
    /// Human-readable description.
    pub message: String,
    /// The dotted field path involved, if any.
    pub path: Option<String>,
    /// Offset of the field name in the query, when raised during translation.
    pub offset: Option<usize>,
}

impl SchemaError {
    /// Creates a schema error without a path.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            offset: None,
        }
    }

    /// Attaches the dotted field path this error is about.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attaches the query offset of the field name.
    pub fn at(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// A type mismatch, unsupported operator or invalid literal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TranslationError {
    /// Human-readable description.
    pub message: String,
    /// The dotted field path involved, if any.
    pub path: Option<String>,
    /// Offset of the offending part of the query.
    pub offset: Option<usize>,
}

impl TranslationError {
    /// Creates a translation error at the given offset.
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            path: None,
            offset: Some(offset),
        }
    }

    /// Attaches the dotted field path this error is about.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Any failure of the query pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// The query text could not be tokenized.
    #[error(transparent)]
    Lex(#[from] LexError),

    /// The tokens do not form a valid expression.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A field path could not be resolved.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A comparison is not valid for the resolved field.
    #[error(transparent)]
    Translation(#[from] TranslationError),
}

impl QueryError {
    /// Returns the character offset of the problem, if known.
    pub fn offset(&self) -> Option<usize> {
        match self {
            QueryError::Lex(e) => Some(e.offset),
            QueryError::Parse(e) => Some(e.offset),
            QueryError::Schema(e) => e.offset,
            QueryError::Translation(e) => e.offset,
        }
    }

    /// Returns a short stable name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::Lex(_) => "lex",
            QueryError::Parse(_) => "parse",
            QueryError::Schema(_) => "schema",
            QueryError::Translation(_) => "translation",
        }
    }
}
