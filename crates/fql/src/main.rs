use clap::Parser;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod dispatch;
mod output;

use cli::Cli;
use commands::config::load_config;
use commands::schema::SchemaSource;
use commands::{CommandContext, CommandError};
use dispatch::{SchemaCommand, SchemaDispatch, StandaloneCommand, StandaloneDispatch};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "FQL_LOG";

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                eprintln!("{:#}", error_json(&e));
            } else {
                eprintln!("Error: {e}");
                if let (CommandError::Query { query, .. }, Some(offset)) = (&e, e.offset()) {
                    eprintln!("{}", output::render_caret(query, offset, !cli.no_color));
                }
            }
            error_exit_code(&e)
        }
    }
}

/// Installs the stderr log subscriber.
///
/// `--verbose` forces debug output; otherwise `FQL_LOG` is honored and
/// warnings are shown by default.
fn init_tracing(cli: &Cli) {
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
            EnvFilter::new(if cli.quiet { "error" } else { "warn" })
        })
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> commands::Result<()> {
    let mut ctx = CommandContext::from_cli(cli);

    if let Some(dispatch) = StandaloneDispatch::try_from_cli(cli) {
        return dispatch.execute(&ctx);
    }

    let config = load_config()?;
    ctx.apply_config(&config);

    let schema = SchemaSource::resolve(cli, &config)?.load()?;
    match SchemaDispatch::from_cli(cli) {
        Some(dispatch) => dispatch.execute(&ctx, &schema),
        None => Ok(()),
    }
}

/// Builds the JSON error object printed with `--json`.
fn error_json(e: &CommandError) -> serde_json::Value {
    let mut error = serde_json::json!({
        "code": error_code(e),
        "message": e.to_string(),
    });
    if let Some(offset) = e.offset() {
        error["offset"] = offset.into();
    }
    serde_json::json!({ "error": error })
}

/// Returns the error code string for JSON output.
fn error_code(e: &CommandError) -> &'static str {
    match e {
        CommandError::Query { source, .. } => match source.kind() {
            "lex" => "LEX_ERROR",
            "parse" => "PARSE_ERROR",
            "schema" => "FIELD_ERROR",
            _ => "TRANSLATION_ERROR",
        },
        CommandError::Schema(_) => "SCHEMA_ERROR",
        CommandError::Config(_) => "CONFIG_ERROR",
        CommandError::Data(_) => "DATA_ERROR",
        CommandError::Io(_) => "IO_ERROR",
        CommandError::Json(_) => "JSON_ERROR",
        CommandError::Toml(_) => "TOML_ERROR",
    }
}

/// Returns the exit code for an error.
fn error_exit_code(e: &CommandError) -> ExitCode {
    match e {
        CommandError::Query { .. } => ExitCode::from(1),
        CommandError::Data(_) | CommandError::Json(_) => ExitCode::from(1),
        CommandError::Io(_) => ExitCode::from(3),
        CommandError::Schema(_) | CommandError::Toml(_) => ExitCode::from(4),
        CommandError::Config(_) => ExitCode::from(5),
    }
}
