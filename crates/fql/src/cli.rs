//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the fql CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// fql - Search-engine style queries checked against a model schema
#[derive(Parser, Debug)]
#[command(name = "fql")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (show debug information)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Schema definition file, .toml or .json (default: from config)
    #[arg(short, long, global = true, env = "FQL_SCHEMA", value_name = "FILE")]
    pub schema: Option<PathBuf>,

    /// Model to search (default: from config, or the only model defined)
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Maximum number of relation hops a field path may take
    #[arg(long, global = true, value_name = "N")]
    pub max_depth: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a query and print its expression tree
    #[command(alias = "p")]
    Parse {
        /// Query text (e.g., 'author.name ~ "ada" and pages > 100')
        query: String,
    },

    /// Check a query against the schema and print the resulting predicate
    #[command(alias = "c")]
    Check {
        /// Query text
        query: String,
    },

    /// Print the searchable models and fields
    Introspect,

    /// Filter JSON records with a query
    #[command(alias = "f")]
    Filter {
        /// Query text (blank matches every record)
        query: String,

        /// JSON file holding an array of records
        #[arg(short, long, value_name = "FILE")]
        data: PathBuf,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Shell types for completions
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., schema.path, output.color)
        key: String,

        /// Configuration value
        value: String,
    },

    /// Show config file path
    Path,
}
