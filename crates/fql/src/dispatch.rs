//! Command dispatch module for routing CLI commands to their handlers.
//!
//! Commands split into those that run on their own and those that need a
//! loaded [`Schema`], so the schema file is only read when a command uses it.

use std::path::Path;

use fieldql_rs::Schema;

use crate::cli::{Cli, Commands, ConfigCommands, Shell};
use crate::commands::{self, CommandContext, CommandError, Result};

/// Trait for commands that run without a schema.
pub trait StandaloneCommand {
    /// Execute the command.
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// Trait for commands that check queries against a schema.
pub trait SchemaCommand {
    /// Execute the command against `schema`.
    fn execute(&self, ctx: &CommandContext, schema: &Schema) -> Result<()>;
}

/// Commands that don't need a schema.
pub enum StandaloneDispatch<'a> {
    Parse(&'a str),
    Config(&'a Option<ConfigCommands>),
    Completions(&'a Shell),
    Help,
}

impl<'a> StandaloneDispatch<'a> {
    /// Try to create a standalone dispatch from the CLI command.
    /// Returns None if the command needs a schema.
    pub fn try_from_cli(cli: &'a Cli) -> Option<Self> {
        match &cli.command {
            Some(Commands::Parse { query }) => Some(Self::Parse(query)),
            Some(Commands::Config { command }) => Some(Self::Config(command)),
            Some(Commands::Completions { shell }) => Some(Self::Completions(shell)),
            None => Some(Self::Help),
            _ => None,
        }
    }
}

impl StandaloneCommand for StandaloneDispatch<'_> {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            Self::Parse(query) => commands::parse::execute(ctx, query),
            Self::Config(command) => dispatch_config(ctx, command),
            Self::Completions(shell) => {
                commands::completions::execute(shell).map_err(CommandError::Io)
            }
            Self::Help => {
                if !ctx.quiet {
                    println!("fql - search-engine style queries over model schemas");
                    println!("Use --help for usage information");
                }
                Ok(())
            }
        }
    }
}

/// Dispatch config subcommands.
fn dispatch_config(ctx: &CommandContext, command: &Option<ConfigCommands>) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::execute_show(ctx),
        Some(ConfigCommands::Set { key, value }) => {
            let opts = commands::config::ConfigSetOptions {
                key: key.clone(),
                value: value.clone(),
            };
            commands::config::execute_set(ctx, &opts)
        }
        Some(ConfigCommands::Path) => commands::config::execute_path(ctx),
    }
}

/// Commands that need a schema.
pub enum SchemaDispatch<'a> {
    Check(&'a str),
    Introspect,
    Filter { query: &'a str, data: &'a Path },
}

impl<'a> SchemaDispatch<'a> {
    /// Create a schema dispatch from the CLI command.
    /// Returns None for commands that run standalone.
    pub fn from_cli(cli: &'a Cli) -> Option<Self> {
        match &cli.command {
            Some(Commands::Check { query }) => Some(Self::Check(query)),
            Some(Commands::Introspect) => Some(Self::Introspect),
            Some(Commands::Filter { query, data }) => Some(Self::Filter { query, data }),
            _ => None,
        }
    }
}

impl SchemaCommand for SchemaDispatch<'_> {
    fn execute(&self, ctx: &CommandContext, schema: &Schema) -> Result<()> {
        match self {
            Self::Check(query) => commands::check::execute(ctx, schema, query),
            Self::Introspect => commands::introspect::execute(ctx, schema),
            Self::Filter { query, data } => commands::filter::execute(ctx, schema, query, data),
        }
    }
}
