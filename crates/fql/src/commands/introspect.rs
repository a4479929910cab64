//! Introspect command implementation.
//!
//! Prints the models and fields reachable from the searched model, as the
//! JSON document autocomplete clients consume or as a text listing.

use fieldql_rs::Schema;

use super::{CommandContext, Result};
use crate::output::format_introspection;

/// Executes the introspect command.
pub fn execute(ctx: &CommandContext, schema: &Schema) -> Result<()> {
    let doc = schema.as_introspection();

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else if !ctx.quiet {
        print!("{}", format_introspection(&doc, ctx.use_colors));
    }
    Ok(())
}
