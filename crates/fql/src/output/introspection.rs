//! Text listing of an introspection document.

use fieldql_rs::{FieldDescription, Introspection};
use owo_colors::OwoColorize;

/// Formats the models and fields a query may reference.
///
/// The searched model comes first; the rest follow in name order.
pub fn format_introspection(doc: &Introspection, use_colors: bool) -> String {
    let mut models: Vec<_> = doc.models.iter().collect();
    models.sort_by_key(|(name, _)| *name != &doc.current_model);

    let mut out = String::new();
    for (i, (model, fields)) in models.into_iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let header = if *model == doc.current_model {
            format!("{model} (searched)")
        } else {
            model.clone()
        };
        if use_colors {
            out.push_str(&header.green().bold().to_string());
        } else {
            out.push_str(&header);
        }
        out.push('\n');

        let width = fields.keys().map(|name| name.chars().count()).max().unwrap_or(0);
        for (name, field) in fields {
            out.push_str(&format!("  {:<width$}  {}\n", name, describe(field, use_colors)));
        }
    }
    out
}

fn describe(field: &FieldDescription, use_colors: bool) -> String {
    let mut text = field.field_type.to_string();
    if let Some(target) = &field.relation {
        let arrow = format!("-> {target}");
        text.push(' ');
        if use_colors {
            text.push_str(&arrow.cyan().to_string());
        } else {
            text.push_str(&arrow);
        }
    }
    if let Some(suggestions) = &field.suggestions {
        let values: Vec<&str> = suggestions.iter().map(|s| s.value.as_str()).collect();
        text.push_str(&format!(" [{}]", values.join(", ")));
    }
    if field.nullable {
        if use_colors {
            text.push_str(&format!(" {}", "nullable".dimmed()));
        } else {
            text.push_str(" nullable");
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldql_rs::{FieldDef, ModelDef, ModelRegistry, Schema, Suggestion};

    fn introspection() -> Introspection {
        let registry = ModelRegistry::new()
            .with_model(
                "author",
                ModelDef::new([FieldDef::text("name"), FieldDef::date("born").nullable()]),
            )
            .with_model(
                "book",
                ModelDef::new([
                    FieldDef::text("title"),
                    FieldDef::choice(
                        "status",
                        [Suggestion::new("draft"), Suggestion::new("published")],
                    ),
                    FieldDef::relation("author", "author"),
                ]),
            );
        Schema::new(registry, "book").unwrap().as_introspection()
    }

    #[test]
    fn test_searched_model_comes_first() {
        let text = format_introspection(&introspection(), false);
        assert!(text.starts_with("book (searched)\n"));
        assert!(text.contains("\nauthor\n"));
    }

    #[test]
    fn test_field_descriptions() {
        let text = format_introspection(&introspection(), false);
        assert!(text.contains("  author  relation -> author\n"));
        assert!(text.contains("  status  choice [draft, published]\n"));
        assert!(text.contains("  born  date nullable\n"));
        assert!(text.contains("  name  text\n"));
    }
}
