//! Filter command implementation.
//!
//! Applies a query to records from a JSON file. An invalid query is not a
//! failure: it matches nothing and a warning is shown instead.

use std::fs;
use std::path::Path;

use fieldql_rs::{QueryEngine, Schema, SearchOutcome};
use owo_colors::OwoColorize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{CommandContext, CommandError, Result};

/// Executes the filter command.
pub fn execute(ctx: &CommandContext, schema: &Schema, query: &str, data: &Path) -> Result<()> {
    let records = read_records(data)?;
    let outcome = QueryEngine::new(schema).apply(query);
    let matched = outcome.filter(&records);
    debug!(total = records.len(), matched = matched.len(), "filtered records");

    if let Some(warning) = outcome.warning() {
        warn!(query, warning, "query rejected");
    }

    if ctx.json_output {
        let output = json!({
            "search": outcome,
            "count": matched.len(),
            "records": matched,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if let SearchOutcome::NoResults { warning, .. } = &outcome {
        if ctx.use_colors {
            eprintln!("{} {}", "Warning:".yellow().bold(), warning);
        } else {
            eprintln!("Warning: {warning}");
        }
    }
    for record in &matched {
        println!("{}", serde_json::to_string(record)?);
    }
    if !ctx.quiet {
        eprintln!("{} of {} records matched", matched.len(), records.len());
    }
    Ok(())
}

/// Reads a JSON array of records.
fn read_records(path: &Path) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path)?;
    match serde_json::from_str(&content)? {
        Value::Array(records) => Ok(records),
        other => Err(CommandError::Data(format!(
            "{} must hold a JSON array of records, found {}",
            path.display(),
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
