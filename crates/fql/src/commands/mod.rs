//! Command implementations for the fql CLI.
//!
//! This module contains the actual command handlers that are invoked by the CLI.

pub mod check;
pub mod completions;
pub mod config;
pub mod filter;
pub mod introspect;
pub mod parse;
pub mod schema;

use fieldql_rs::{QueryError, SchemaError};

use crate::cli::Cli;
use config::Config;

/// Error type for command execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The query was rejected by the lexer, parser or translator.
    #[error("{source}")]
    Query {
        /// The query text, kept for caret rendering.
        query: String,
        #[source]
        source: QueryError,
    },

    /// The schema definition is invalid or does not contain the model.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A records file is not an array of JSON values.
    #[error("invalid data: {0}")]
    Data(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML schema definition error.
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

impl CommandError {
    /// Wraps a query failure together with the query text.
    pub fn query(query: &str, source: QueryError) -> Self {
        Self::Query {
            query: query.to_string(),
            source,
        }
    }

    /// Returns the character offset of the problem, for query errors.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Query { source, .. } => source.offset(),
            Self::Schema(e) => e.offset,
            _ => None,
        }
    }
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Context for command execution, containing common dependencies.
pub struct CommandContext {
    /// Whether to output JSON.
    pub json_output: bool,
    /// Whether to use colors.
    pub use_colors: bool,
    /// Whether to be quiet (errors only).
    pub quiet: bool,
    /// Whether to be verbose.
    pub verbose: bool,
}

impl CommandContext {
    /// Creates a new command context from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            json_output: cli.json,
            use_colors: !cli.no_color,
            quiet: cli.quiet,
            verbose: cli.verbose,
        }
    }

    /// Applies settings from the config file that the flags did not override.
    pub fn apply_config(&mut self, config: &Config) {
        if config.output.color == Some(false) {
            self.use_colors = false;
        }
    }
}
