//! Query string to predicate, with the host's "no results" policy.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{QueryError, QueryResult};
use crate::evaluator::PredicateEvaluator;
use crate::predicate::Predicate;
use crate::query::QueryParser;
use crate::schema::Schema;
use crate::translator::Translator;

/// Turns query strings into predicates for one schema.
///
/// # Example
///
/// ```
/// use fieldql_rs::{FieldDef, ModelDef, ModelRegistry, QueryEngine, Schema, SearchOutcome};
///
/// let registry = ModelRegistry::new()
///     .with_model("book", ModelDef::new([FieldDef::boolean("in_print")]));
/// let schema = Schema::new(registry, "book").unwrap();
/// let engine = QueryEngine::new(&schema);
///
/// assert!(matches!(engine.apply("   "), SearchOutcome::All));
/// assert!(matches!(engine.apply("in_print = true"), SearchOutcome::Matching(_)));
/// assert_eq!(
///     engine.apply("in_print = \"yes\"").warning(),
///     Some("boolean field 'in_print' expects true or false, got \"yes\"")
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct QueryEngine<'s> {
    schema: &'s Schema,
}

impl<'s> QueryEngine<'s> {
    /// Creates an engine for `schema`.
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema }
    }

    /// Returns the schema queries are checked against.
    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Lexes, parses and translates a query.
    ///
    /// A blank query means "no filter" and returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns the first [`QueryError`] raised by any stage.
    pub fn search(&self, query: &str) -> QueryResult<Option<Predicate>> {
        if query.trim().is_empty() {
            return Ok(None);
        }
        let expr = QueryParser::parse(query)?;
        Translator::new(self.schema).translate(&expr).map(Some)
    }

    /// Runs [`search`](Self::search) and applies the host policy: errors become
    /// an empty result with a warning instead of a failure.
    pub fn apply(&self, query: &str) -> SearchOutcome {
        SearchOutcome::from_result(self.search(query))
    }
}

/// Searches `schema` with `query`; see [`QueryEngine::search`].
pub fn search(query: &str, schema: &Schema) -> QueryResult<Option<Predicate>> {
    QueryEngine::new(schema).search(query)
}

/// What a host should do with a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// No filter: return every record.
    All,
    /// Return the records matching the predicate.
    Matching(#[serde(serialize_with = "predicate_entry")] Predicate),
    /// The query was invalid: return nothing and show the warning.
    NoResults {
        /// User-facing message.
        warning: String,
        /// The underlying error.
        #[serde(skip)]
        error: QueryError,
    },
}

impl SearchOutcome {
    /// Maps a search result onto the host policy.
    pub fn from_result(result: QueryResult<Option<Predicate>>) -> Self {
        match result {
            Ok(None) => SearchOutcome::All,
            Ok(Some(predicate)) => SearchOutcome::Matching(predicate),
            Err(error) => SearchOutcome::NoResults {
                warning: error.to_string(),
                error,
            },
        }
    }

    /// Returns the warning, if the query was rejected.
    pub fn warning(&self) -> Option<&str> {
        match self {
            SearchOutcome::NoResults { warning, .. } => Some(warning),
            _ => None,
        }
    }

    /// Returns the predicate, if the query produced one.
    pub fn predicate(&self) -> Option<&Predicate> {
        match self {
            SearchOutcome::Matching(predicate) => Some(predicate),
            _ => None,
        }
    }

    /// Applies the outcome to in-memory records.
    pub fn filter<'r>(&self, records: &'r [Value]) -> Vec<&'r Value> {
        match self {
            SearchOutcome::All => records.iter().collect(),
            SearchOutcome::Matching(predicate) => {
                PredicateEvaluator::new(predicate).filter_records(records)
            }
            SearchOutcome::NoResults { .. } => Vec::new(),
        }
    }
}

/// Nests the predicate under a `predicate` key so the `outcome` tag has a map
/// to live in.
fn predicate_entry<S: Serializer>(predicate: &Predicate, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry("predicate", predicate)?;
    map.end()
}
