//! Schema: the searchable fields reachable from one root model.
//!
//! A [`Schema`] is built from a [`ModelRegistry`] and a root model. Relation
//! fields are followed up to [`SchemaOptions::max_depth`] hops, so
//! self-referential and mutually-referential models terminate.
//!
//! # Example
//!
//! ```
//! use fieldql_rs::{FieldDef, FieldType, ModelDef, ModelRegistry, Schema};
//!
//! let registry = ModelRegistry::new()
//!     .with_model("author", ModelDef::new([FieldDef::text("email")]))
//!     .with_model("book", ModelDef::new([
//!         FieldDef::text("title"),
//!         FieldDef::relation("author", "author"),
//!     ]));
//!
//! let schema = Schema::new(registry, "book").unwrap();
//! let field = schema.resolve(&["author", "email"]).unwrap();
//! assert_eq!(field.field_type, FieldType::Text);
//! assert!(schema.resolve(&["ghost", "field"]).is_err());
//! ```

mod cache;
mod definition;
mod introspection;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, OnceLock};

use strsim::levenshtein;

use crate::error::{SchemaError, SchemaResult};
use crate::query::Comparator;

pub use cache::SchemaCache;
pub use definition::{FieldDef, FieldType, ModelDef, ModelRegistry, Suggestion};
pub use introspection::{FieldDescription, Introspection};

/// Default number of relation hops a field path may take.
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// Maximum Levenshtein distance to consider a name as a suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Options controlling which fields a schema exposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaOptions {
    /// Maximum number of relation hops in a field path.
    pub max_depth: usize,
    /// If set, relations may only enter these models.
    pub include: Option<BTreeSet<String>>,
    /// Relations may never enter these models.
    pub exclude: BTreeSet<String>,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            include: None,
            exclude: BTreeSet::new(),
        }
    }
}

impl SchemaOptions {
    /// Sets the maximum relation depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Restricts relations to the given models.
    pub fn include_models<S: Into<String>>(mut self, models: impl IntoIterator<Item = S>) -> Self {
        self.include = Some(models.into_iter().map(Into::into).collect());
        self
    }

    /// Hides relations into the given model.
    pub fn exclude_model(mut self, model: impl Into<String>) -> Self {
        self.exclude.insert(model.into());
        self
    }

    /// Returns true if relations may enter `model`.
    pub fn allows(&self, model: &str) -> bool {
        !self.exclude.contains(model)
            && self.include.as_ref().map_or(true, |set| set.contains(model))
    }
}

/// A searchable field, resolved from the root model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Path segments from the root model.
    pub path: Vec<String>,
    /// Display name.
    pub label: String,
    /// Semantic type.
    pub field_type: FieldType,
    /// Whether the field may hold null.
    pub nullable: bool,
    /// Valid values (choice fields) or hints.
    pub suggestions: Vec<Suggestion>,
    /// The model this field is declared on.
    pub model: String,
    /// Target model, for relation fields.
    pub relation: Option<String>,
    /// Field a bare relation name resolves to.
    pub default_field: Option<String>,
    /// Number of relation hops taken to reach this field.
    pub depth: usize,
}

impl Field {
    /// Returns the field's own name (the last path segment).
    pub fn name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }

    /// Returns the path joined with dots.
    pub fn dotted(&self) -> String {
        self.path.join(".")
    }

    /// Returns true for relation fields.
    pub fn is_relation(&self) -> bool {
        self.field_type == FieldType::Relation
    }

    /// Maps user input to a declared choice value, matching either the value
    /// or the label exactly.
    pub fn choice_value(&self, input: &str) -> Option<&str> {
        self.suggestions
            .iter()
            .find(|s| s.value == input)
            .or_else(|| {
                self.suggestions
                    .iter()
                    .find(|s| s.label.as_deref() == Some(input))
            })
            .map(|s| s.value.as_str())
    }
}

/// The searchable fields of one root model.
#[derive(Debug)]
pub struct Schema {
    registry: Arc<ModelRegistry>,
    root: String,
    options: SchemaOptions,
    fields: OnceLock<BTreeMap<String, Field>>,
}

impl Schema {
    /// Creates a schema rooted at `root` with default options.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if the root model is unknown or the registry is
    /// inconsistent (dangling relations, choice fields without values,
    /// duplicate or dotted field names, invalid default fields).
    pub fn new(registry: impl Into<Arc<ModelRegistry>>, root: &str) -> SchemaResult<Self> {
        Self::with_options(registry, root, SchemaOptions::default())
    }

    /// Creates a schema with explicit options.
    pub fn with_options(
        registry: impl Into<Arc<ModelRegistry>>,
        root: &str,
        options: SchemaOptions,
    ) -> SchemaResult<Self> {
        let registry = registry.into();
        if registry.model(root).is_none() {
            let suggestion = find_similar_name(root, registry.models.keys().map(String::as_str));
            return Err(SchemaError::new(with_suggestion(
                format!("unknown model '{root}'"),
                suggestion,
            )));
        }
        validate_registry(&registry)?;

        Ok(Self {
            registry,
            root: root.to_string(),
            options,
            fields: OnceLock::new(),
        })
    }

    /// Returns the root model identifier.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Returns the options this schema was built with.
    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    /// Returns the underlying model registry.
    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Iterates over every reachable field, ordered by dotted path.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.field_map().values()
    }

    /// Resolves a field path to a comparable field.
    ///
    /// A relation at the end of the path resolves to its default field when
    /// it declares one.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when a segment does not exist, a non-terminal
    /// segment is not a relation, the path takes more than `max_depth`
    /// relation hops, or the path ends at a relation without a default field.
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> SchemaResult<&Field> {
        if path.is_empty() {
            return Err(SchemaError::new("empty field path"));
        }
        let dotted = join(path);

        let Some(field) = self.field_map().get(&dotted) else {
            return Err(self.explain_unresolved(path).with_path(dotted));
        };

        if !field.is_relation() {
            return Ok(field);
        }

        let target = field.relation.as_deref().unwrap_or_default();
        match &field.default_field {
            Some(default) => {
                let full = format!("{dotted}.{default}");
                self.field_map().get(&full).ok_or_else(|| {
                    SchemaError::new(format!(
                        "'{dotted}' exceeds the maximum relation depth of {}",
                        self.options.max_depth
                    ))
                    .with_path(dotted.clone())
                })
            }
            None => Err(SchemaError::new(format!(
                "'{dotted}' is a relation to '{target}'; choose one of its fields, e.g. '{dotted}.{}'",
                self.first_field_name(target)
            ))
            .with_path(dotted)),
        }
    }

    /// Returns the operators valid for a field.
    pub fn comparable_types(&self, field: &Field) -> &'static [Comparator] {
        field.field_type.operators()
    }

    fn field_map(&self) -> &BTreeMap<String, Field> {
        self.fields.get_or_init(|| {
            let mut fields = BTreeMap::new();
            self.collect_fields(&self.root, &[], &mut fields);
            fields
        })
    }

    fn collect_fields(&self, model: &str, prefix: &[String], out: &mut BTreeMap<String, Field>) {
        let Some(def) = self.registry.model(model) else {
            return;
        };
        let depth = prefix.len();

        for field_def in &def.fields {
            let target = field_def.model.as_deref();
            if field_def.field_type == FieldType::Relation
                && !target.is_some_and(|t| self.options.allows(t))
            {
                continue;
            }

            let mut path = prefix.to_vec();
            path.push(field_def.name.clone());

            let field = Field {
                path: path.clone(),
                label: field_def.label.clone().unwrap_or_else(|| field_def.name.clone()),
                field_type: field_def.field_type,
                nullable: field_def.nullable,
                suggestions: field_def.suggestions.clone(),
                model: model.to_string(),
                relation: target.map(str::to_string),
                default_field: field_def.default_field.clone(),
                depth,
            };
            out.insert(path.join("."), field);

            if let Some(target) = target {
                if depth < self.options.max_depth {
                    self.collect_fields(target, &path, out);
                }
            }
        }
    }

    /// Walks the path segment by segment to say why it did not resolve.
    fn explain_unresolved<S: AsRef<str>>(&self, path: &[S]) -> SchemaError {
        let mut model = self.root.as_str();

        for (index, segment) in path.iter().enumerate() {
            let segment = segment.as_ref();
            let is_last = index + 1 == path.len();
            let prefix = join(&path[..=index]);

            let Some(def) = self.registry.model(model) else {
                break;
            };
            let Some(field_def) = def.field(segment) else {
                let suggestion =
                    find_similar_name(segment, def.fields.iter().map(|f| f.name.as_str()));
                return SchemaError::new(with_suggestion(
                    format!("unknown field '{segment}' on model '{model}'"),
                    suggestion,
                ));
            };

            let Some(target) = field_def.model.as_deref() else {
                if is_last {
                    break;
                }
                return SchemaError::new(format!(
                    "'{prefix}' is not a relation, so it cannot be followed by '{}'",
                    path[index + 1].as_ref()
                ));
            };

            if !self.options.allows(target) {
                return SchemaError::new(format!(
                    "'{prefix}' leads to model '{target}', which is not searchable"
                ));
            }
            if !is_last && index >= self.options.max_depth {
                return SchemaError::new(format!(
                    "'{}' exceeds the maximum relation depth of {}",
                    join(path),
                    self.options.max_depth
                ));
            }
            model = target;
        }

        SchemaError::new(format!("unknown field '{}'", join(path)))
    }

    fn first_field_name(&self, model: &str) -> &str {
        self.registry
            .model(model)
            .and_then(|m| {
                m.fields
                    .iter()
                    .find(|f| f.field_type != FieldType::Relation)
                    .or(m.fields.first())
            })
            .map(|f| f.name.as_str())
            .unwrap_or("id")
    }
}

/// Checks every model in the registry for internal consistency.
fn validate_registry(registry: &ModelRegistry) -> SchemaResult<()> {
    for (model_id, model) in &registry.models {
        let mut seen = HashSet::new();

        for field in &model.fields {
            let path = format!("{model_id}.{}", field.name);
            let fail = |message: String| -> SchemaResult<()> {
                Err(SchemaError::new(message).with_path(path.clone()))
            };

            if field.name.is_empty() || field.name.contains('.') {
                return fail(format!(
                    "invalid field name '{}' on model '{model_id}'",
                    field.name
                ));
            }
            if !seen.insert(field.name.as_str()) {
                return fail(format!(
                    "duplicate field '{}' on model '{model_id}'",
                    field.name
                ));
            }

            match (field.field_type, field.model.as_deref()) {
                (FieldType::Relation, None) => {
                    return fail(format!("relation '{path}' does not name a target model"));
                }
                (FieldType::Relation, Some(target)) => {
                    let Some(target_def) = registry.model(target) else {
                        return fail(format!("relation '{path}' targets unknown model '{target}'"));
                    };
                    if let Some(default) = &field.default_field {
                        match target_def.field(default) {
                            Some(f) if f.field_type != FieldType::Relation => {}
                            Some(_) => {
                                return fail(format!(
                                    "default field '{default}' of relation '{path}' is itself a relation"
                                ));
                            }
                            None => {
                                return fail(format!(
                                    "default field '{default}' of relation '{path}' does not exist on model '{target}'"
                                ));
                            }
                        }
                    }
                }
                (_, Some(_)) => {
                    return fail(format!("only relation fields may name a target model ('{path}')"));
                }
                (_, None) if field.default_field.is_some() => {
                    return fail(format!("only relation fields may declare a default field ('{path}')"));
                }
                (FieldType::Choice, None) if field.suggestions.is_empty() => {
                    return fail(format!("choice field '{path}' declares no values"));
                }
                _ => {}
            }
        }
    }
    Ok(())
}

/// Finds the best matching name from a list of candidates using Levenshtein distance.
///
/// Returns the best match if its edit distance is within the threshold,
/// otherwise returns `None`.
pub(crate) fn find_similar_name<'a>(
    query: &str,
    candidates: impl Iterator<Item = &'a str>,
) -> Option<String> {
    let query_lower = query.to_lowercase();

    let (best_match, best_distance) = candidates
        .filter(|name| !name.is_empty())
        .map(|name| (name, levenshtein(&query_lower, &name.to_lowercase())))
        .min_by_key(|(_, d)| *d)?;

    (best_match != query && best_distance <= MAX_SUGGESTION_DISTANCE).then(|| best_match.to_string())
}

fn with_suggestion(message: String, suggestion: Option<String>) -> String {
    match suggestion {
        Some(s) => format!("{message}. Did you mean '{s}'?"),
        None => message,
    }
}

fn join<S: AsRef<str>>(path: &[S]) -> String {
    path.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(".")
}
