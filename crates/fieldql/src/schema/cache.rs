//! Process-wide cache of built schemas.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::debug;

use super::{ModelRegistry, Schema, SchemaOptions};
use crate::error::SchemaResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    model: String,
    options: SchemaOptions,
}

#[derive(Debug)]
struct CacheEntry {
    fingerprint: u64,
    schema: Arc<Schema>,
}

/// Cache of schemas keyed by root model and options.
///
/// Each entry remembers the fingerprint of the registry it was built from;
/// a lookup with a changed registry rebuilds the entry. Entries can also be
/// dropped explicitly with [`invalidate`](Self::invalidate) and
/// [`clear`](Self::clear).
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use fieldql_rs::{FieldDef, ModelDef, ModelRegistry, SchemaCache, SchemaOptions};
///
/// let registry = Arc::new(
///     ModelRegistry::new().with_model("book", ModelDef::new([FieldDef::text("title")])),
/// );
/// let cache = SchemaCache::new();
/// let first = cache.get_or_build(&registry, "book", &SchemaOptions::default()).unwrap();
/// let second = cache.get_or_build(&registry, "book", &SchemaOptions::default()).unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl SchemaCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide cache.
    pub fn global() -> &'static SchemaCache {
        static GLOBAL: OnceLock<SchemaCache> = OnceLock::new();
        GLOBAL.get_or_init(SchemaCache::new)
    }

    /// Returns the cached schema for `model`, building it if it is missing or
    /// was built from a different version of the registry.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`](crate::SchemaError) if the schema cannot be
    /// built. Failed builds are not cached.
    pub fn get_or_build(
        &self,
        registry: &Arc<ModelRegistry>,
        model: &str,
        options: &SchemaOptions,
    ) -> SchemaResult<Arc<Schema>> {
        let key = CacheKey {
            model: model.to_string(),
            options: options.clone(),
        };
        let fingerprint = registry.fingerprint();

        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = entries.get(&key) {
                if entry.fingerprint == fingerprint {
                    debug!(model, "schema cache hit");
                    return Ok(Arc::clone(&entry.schema));
                }
                debug!(model, "registry changed, rebuilding schema");
            }
        }

        let schema = Arc::new(Schema::with_options(
            Arc::clone(registry),
            model,
            options.clone(),
        )?);

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            key,
            CacheEntry {
                fingerprint,
                schema: Arc::clone(&schema),
            },
        );
        debug!(model, cached = entries.len(), "built schema");

        Ok(schema)
    }

    /// Drops every entry rooted at `model`, returning how many were removed.
    pub fn invalidate(&self, model: &str) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|key, _| key.model != model);
        let removed = before - entries.len();
        debug!(model, removed, "invalidated schema cache entries");
        removed
    }

    /// Drops every entry.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
        debug!("cleared schema cache");
    }

    /// Returns the number of cached schemas.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
