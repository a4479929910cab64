//! Introspection document consumed by client-side autocomplete.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{FieldType, Schema, Suggestion};

/// Machine-readable description of the searchable models.
///
/// Serializes as:
///
/// ```json
/// {
///   "current_model": "book",
///   "models": {
///     "book": {
///       "title": {"type": "text", "nullable": false},
///       "author": {"type": "relation", "nullable": false, "relation": "author"}
///     },
///     "author": {"email": {"type": "text", "nullable": true}}
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Introspection {
    /// The root model identifier.
    pub current_model: String,
    /// Fields of every model reachable from the root.
    pub models: BTreeMap<String, BTreeMap<String, FieldDescription>>,
}

/// One field in an introspection document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescription {
    /// Semantic type name.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the field may hold null.
    pub nullable: bool,
    /// Valid values, for fields that declare them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<Suggestion>>,
    /// Target model, for relation fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
}

impl Schema {
    /// Describes every model reachable within `max_depth` relation hops.
    ///
    /// Relation fields are listed only when their target model is itself
    /// part of the document.
    pub fn as_introspection(&self) -> Introspection {
        let reachable: BTreeSet<&str> = std::iter::once(self.root())
            .chain(self.fields().map(|f| f.model.as_str()))
            .collect();

        let mut models: BTreeMap<String, BTreeMap<String, FieldDescription>> = reachable
            .iter()
            .map(|model| (model.to_string(), BTreeMap::new()))
            .collect();

        for field in self.fields() {
            if let Some(target) = &field.relation {
                if !reachable.contains(target.as_str()) {
                    continue;
                }
            }
            let description = FieldDescription {
                field_type: field.field_type,
                nullable: field.nullable,
                suggestions: (!field.suggestions.is_empty()).then(|| field.suggestions.clone()),
                relation: field.relation.clone(),
            };
            models
                .entry(field.model.clone())
                .or_default()
                .insert(field.name().to_string(), description);
        }

        Introspection {
            current_model: self.root().to_string(),
            models,
        }
    }
}
