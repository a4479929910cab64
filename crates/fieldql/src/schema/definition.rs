//! Model definitions supplied by the host application.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::query::Comparator;

const TEXT_OPERATORS: &[Comparator] = &[
    Comparator::Eq,
    Comparator::Ne,
    Comparator::Gt,
    Comparator::Gte,
    Comparator::Lt,
    Comparator::Lte,
    Comparator::Contains,
    Comparator::NotContains,
    Comparator::In,
    Comparator::NotIn,
];

const ORDERED_OPERATORS: &[Comparator] = &[
    Comparator::Eq,
    Comparator::Ne,
    Comparator::Gt,
    Comparator::Gte,
    Comparator::Lt,
    Comparator::Lte,
    Comparator::In,
    Comparator::NotIn,
];

const BOOLEAN_OPERATORS: &[Comparator] = &[Comparator::Eq, Comparator::Ne];

const CHOICE_OPERATORS: &[Comparator] = &[
    Comparator::Eq,
    Comparator::Ne,
    Comparator::In,
    Comparator::NotIn,
];

/// The comparison-relevant classification of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text.
    Text,
    /// Integer or decimal number.
    Number,
    /// `true` / `false`.
    Boolean,
    /// Calendar date.
    Date,
    /// Date with a time of day.
    DateTime,
    /// One of a declared set of values.
    Choice,
    /// A link to another model; must be followed by one of its fields.
    Relation,
}

impl FieldType {
    /// Returns the operators a field of this type may be compared with.
    pub fn operators(self) -> &'static [Comparator] {
        match self {
            FieldType::Text => TEXT_OPERATORS,
            FieldType::Number | FieldType::Date | FieldType::DateTime => ORDERED_OPERATORS,
            FieldType::Boolean => BOOLEAN_OPERATORS,
            FieldType::Choice => CHOICE_OPERATORS,
            FieldType::Relation => &[],
        }
    }

    /// Returns the lowercase type name used in introspection documents.
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Choice => "choice",
            FieldType::Relation => "relation",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A valid value for a choice field, with an optional display label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Suggestion {
    /// The stored value.
    pub value: String,
    /// Human-readable label; users may type it instead of the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Suggestion {
    /// Creates a suggestion without a label.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: None,
        }
    }

    /// Creates a suggestion with a display label.
    pub fn labeled(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: Some(label.into()),
        }
    }
}

/// A single field declared on a model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name; must not contain dots.
    pub name: String,
    /// Semantic type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Display name; defaults to the field name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Whether the field may hold null.
    #[serde(default)]
    pub nullable: bool,
    /// Valid values, required for choice fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<Suggestion>,
    /// Target model, required for relation fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Field of the target model that a bare relation name compares against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_field: Option<String>,
}

impl FieldDef {
    fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            label: None,
            nullable: false,
            suggestions: Vec::new(),
            model: None,
            default_field: None,
        }
    }

    /// Creates a text field.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    /// Creates a number field.
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number)
    }

    /// Creates a boolean field.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    /// Creates a date field.
    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Date)
    }

    /// Creates a datetime field.
    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::DateTime)
    }

    /// Creates a choice field with the given valid values.
    pub fn choice(name: impl Into<String>, suggestions: impl IntoIterator<Item = Suggestion>) -> Self {
        Self::new(name, FieldType::Choice).with_suggestions(suggestions)
    }

    /// Creates a relation to another model.
    pub fn relation(name: impl Into<String>, model: impl Into<String>) -> Self {
        let mut field = Self::new(name, FieldType::Relation);
        field.model = Some(model.into());
        field
    }

    /// Marks the field as nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Sets the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the suggestion list.
    pub fn with_suggestions(mut self, suggestions: impl IntoIterator<Item = Suggestion>) -> Self {
        self.suggestions = suggestions.into_iter().collect();
        self
    }

    /// Sets the field a bare relation name resolves to.
    pub fn with_default_field(mut self, field: impl Into<String>) -> Self {
        self.default_field = Some(field.into());
        self
    }
}

/// The fields of one model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelDef {
    /// Fields in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl ModelDef {
    /// Creates a model from its fields.
    pub fn new(fields: impl IntoIterator<Item = FieldDef>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// All models known to the host, keyed by model identifier.
///
/// # Example
///
/// ```
/// use fieldql_rs::{FieldDef, ModelDef, ModelRegistry};
///
/// let registry = ModelRegistry::new()
///     .with_model("author", ModelDef::new([FieldDef::text("name")]))
///     .with_model("book", ModelDef::new([
///         FieldDef::text("title"),
///         FieldDef::relation("author", "author"),
///     ]));
/// assert!(registry.model("book").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelRegistry {
    /// Model definitions.
    #[serde(default)]
    pub models: BTreeMap<String, ModelDef>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a model.
    pub fn with_model(mut self, id: impl Into<String>, model: ModelDef) -> Self {
        self.models.insert(id.into(), model);
        self
    }

    /// Looks up a model by identifier.
    pub fn model(&self, id: &str) -> Option<&ModelDef> {
        self.models.get(id)
    }

    /// Returns a hash of the whole registry, used to detect definition changes.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_serde_names() {
        assert_eq!(
            serde_json::to_string(&FieldType::DateTime).unwrap(),
            "\"datetime\""
        );
        let parsed: FieldType = serde_json::from_str("\"choice\"").unwrap();
        assert_eq!(parsed, FieldType::Choice);
    }

    #[test]
    fn test_operator_sets() {
        assert!(FieldType::Text.operators().contains(&Comparator::Contains));
        assert!(!FieldType::Number.operators().contains(&Comparator::Contains));
        assert!(FieldType::Date.operators().contains(&Comparator::Gte));
        assert_eq!(
            FieldType::Boolean.operators(),
            &[Comparator::Eq, Comparator::Ne]
        );
        assert!(!FieldType::Choice.operators().contains(&Comparator::Gt));
        assert!(FieldType::Choice.operators().contains(&Comparator::NotIn));
        assert!(FieldType::Relation.operators().is_empty());
    }

    #[test]
    fn test_field_def_deserialize_defaults() {
        let def: FieldDef = serde_json::from_str(r#"{"name": "title", "type": "text"}"#).unwrap();
        assert_eq!(def, FieldDef::text("title"));
    }

    #[test]
    fn test_fingerprint_changes_with_definitions() {
        let a = ModelRegistry::new().with_model("book", ModelDef::new([FieldDef::text("title")]));
        let b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let c = a
            .clone()
            .with_model("book", ModelDef::new([FieldDef::text("title").nullable()]));
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
