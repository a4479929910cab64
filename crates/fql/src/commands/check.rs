//! Check command implementation.
//!
//! Translates a query against the schema and prints the resulting predicate.

use std::collections::HashSet;

use fieldql_rs::{Predicate, QueryEngine, Schema};
use serde_json::json;
use tracing::debug;

use super::{CommandContext, CommandError, Result};

/// Text shown for a blank query.
const NO_FILTER: &str = "(no filter: every record matches)";

/// Executes the check command.
pub fn execute(ctx: &CommandContext, schema: &Schema, query: &str) -> Result<()> {
    let predicate = QueryEngine::new(schema)
        .search(query)
        .map_err(|e| CommandError::query(query, e))?;
    debug!(model = schema.root(), blank = predicate.is_none(), "query is valid");

    if ctx.json_output {
        let output = json!({
            "model": schema.root(),
            "query": query,
            "predicate": predicate,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("{}", format_predicate(predicate.as_ref(), ctx.verbose));
    }
    Ok(())
}

/// Formats a predicate; verbose mode adds the storage lookup of each field.
fn format_predicate(predicate: Option<&Predicate>, verbose: bool) -> String {
    let Some(predicate) = predicate else {
        return NO_FILTER.to_string();
    };
    if !verbose {
        return predicate.to_string();
    }

    let mut lookups = Vec::new();
    collect_lookups(predicate, &mut lookups);
    let mut seen = HashSet::new();
    lookups.retain(|lookup| seen.insert(lookup.clone()));
    format!("{predicate}\n\nlookups: {}", lookups.join(", "))
}

fn collect_lookups(predicate: &Predicate, out: &mut Vec<String>) {
    match predicate {
        Predicate::Compare { field, .. } | Predicate::IsNull { field, .. } => {
            out.push(field.lookup());
        }
        Predicate::Nothing => {}
        Predicate::And(left, right) | Predicate::Or(left, right) => {
            collect_lookups(left, out);
            collect_lookups(right, out);
        }
        Predicate::Not(inner) => collect_lookups(inner, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldql_rs::{search, FieldDef, ModelDef, ModelRegistry};

    fn schema() -> Schema {
        let registry = ModelRegistry::new()
            .with_model(
                "book",
                ModelDef::new([
                    FieldDef::number("pages"),
                    FieldDef::relation("author", "author"),
                ]),
            )
            .with_model("author", ModelDef::new([FieldDef::text("name")]));
        Schema::new(registry, "book").unwrap()
    }

    #[test]
    fn test_blank_query_means_no_filter() {
        assert_eq!(format_predicate(None, false), NO_FILTER);
    }

    #[test]
    fn test_predicate_text() {
        let predicate = search("pages >= 100", &schema()).unwrap();
        assert_eq!(format_predicate(predicate.as_ref(), false), "pages >= 100");
    }

    #[test]
    fn test_verbose_lists_lookups() {
        let predicate = search("author.name ~ 'a' and pages > 1", &schema()).unwrap();
        let text = format_predicate(predicate.as_ref(), true);
        assert!(text.ends_with("lookups: author__name, pages"));
    }

    #[test]
    fn test_verbose_lookups_are_listed_once_in_first_use_order() {
        let predicate =
            search("pages = 1 and author.name ~ 'b' and pages = 3 or author.name = 'c'", &schema())
                .unwrap();
        let text = format_predicate(predicate.as_ref(), true);
        assert!(text.ends_with("lookups: pages, author__name"), "{text}");
    }

    #[test]
    fn test_translation_failure_keeps_query() {
        let ctx = CommandContext {
            json_output: false,
            use_colors: false,
            quiet: true,
            verbose: false,
        };
        let err = execute(&ctx, &schema(), "pages ~ 'x'").unwrap_err();
        assert_eq!(err.offset(), Some(0));
        assert!(matches!(err, CommandError::Query { .. }));
    }
}
