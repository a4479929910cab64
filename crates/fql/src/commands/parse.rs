//! Parse command implementation.
//!
//! Prints the expression tree of a query without consulting a schema.

use fieldql_rs::{Expr, QueryParser};
use tracing::debug;

use super::{CommandContext, CommandError, Result};

/// Executes the parse command.
pub fn execute(ctx: &CommandContext, query: &str) -> Result<()> {
    let expr = QueryParser::parse(query).map_err(|e| CommandError::query(query, e))?;
    debug!(query, "parsed query");

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&expr)?);
    } else if !ctx.quiet {
        println!("{}", format_expr(&expr, ctx.verbose));
    }
    Ok(())
}

/// Formats an expression; verbose mode shows the full tree.
fn format_expr(expr: &Expr, verbose: bool) -> String {
    if verbose {
        format!("{expr:#?}")
    } else {
        expr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_shows_grouping() {
        let expr = QueryParser::parse("a = 1 or b = 2 and not c ~ 'x'").unwrap();
        assert_eq!(
            format_expr(&expr, false),
            r#"(a = 1 or (b = 2 and not c ~ "x"))"#
        );
    }

    #[test]
    fn test_verbose_format_is_the_tree() {
        let expr = QueryParser::parse("a = 1").unwrap();
        let tree = format_expr(&expr, true);
        assert!(tree.contains("Comparison"));
    }

    #[test]
    fn test_parse_failure_keeps_query() {
        let err = execute(
            &CommandContext {
                json_output: false,
                use_colors: false,
                quiet: true,
                verbose: false,
            },
            "a = ",
        )
        .unwrap_err();
        match err {
            CommandError::Query { query, source } => {
                assert_eq!(query, "a = ");
                assert_eq!(source.kind(), "parse");
            }
            other => panic!("expected a query error, got {other:?}"),
        }
    }
}
