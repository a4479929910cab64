//! Locating and loading schema definitions.
//!
//! Flags win over the config file. Definitions are read as TOML or JSON based
//! on the file extension, and the built schema goes through the process-wide
//! [`SchemaCache`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fieldql_rs::{ModelRegistry, Schema, SchemaCache, SchemaOptions, DEFAULT_MAX_DEPTH};
use tracing::{debug, info};

use super::config::Config;
use super::{CommandError, Result};
use crate::cli::Cli;

/// Where a schema comes from, after merging flags and config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSource {
    /// Definition file.
    pub path: PathBuf,
    /// Requested model, if any.
    pub model: Option<String>,
    /// Maximum relation hops.
    pub max_depth: usize,
}

impl SchemaSource {
    /// Merges `--schema`, `--model` and `--max-depth` with the config file.
    pub fn resolve(cli: &Cli, config: &Config) -> Result<Self> {
        let path = cli
            .schema
            .clone()
            .or_else(|| config.schema.path.clone())
            .ok_or_else(|| {
                CommandError::Config(
                    "No schema file. Pass --schema <FILE> or run 'fql config set schema.path <FILE>'"
                        .to_string(),
                )
            })?;

        Ok(Self {
            path,
            model: cli.model.clone().or_else(|| config.schema.model.clone()),
            max_depth: cli
                .max_depth
                .or(config.schema.max_depth)
                .unwrap_or(DEFAULT_MAX_DEPTH),
        })
    }

    /// Reads the definitions and builds (or reuses) the schema.
    pub fn load(&self) -> Result<Arc<Schema>> {
        let registry = Arc::new(read_registry(&self.path)?);
        let model = pick_model(&registry, self.model.as_deref(), &self.path)?;
        let options = SchemaOptions::default().with_max_depth(self.max_depth);

        let schema = SchemaCache::global().get_or_build(&registry, &model, &options)?;
        info!(model = %model, max_depth = self.max_depth, "schema ready");
        Ok(schema)
    }
}

/// Reads a model registry from a `.toml` or `.json` file.
pub fn read_registry(path: &Path) -> Result<ModelRegistry> {
    let content = fs::read_to_string(path).map_err(|e| {
        io::Error::new(e.kind(), format!("Failed to read schema file {}: {}", path.display(), e))
    })?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let registry: ModelRegistry = match extension.as_deref() {
        Some("toml") => toml::from_str(&content)?,
        Some("json") => serde_json::from_str(&content)?,
        _ => {
            return Err(CommandError::Config(format!(
                "Unsupported schema file {}: expected a .toml or .json extension",
                path.display()
            )))
        }
    };

    debug!(path = %path.display(), models = registry.models.len(), "read schema definitions");
    Ok(registry)
}

/// Picks the model to search: the requested one, or the only one defined.
fn pick_model(registry: &ModelRegistry, requested: Option<&str>, path: &Path) -> Result<String> {
    if let Some(model) = requested {
        return Ok(model.to_string());
    }

    let mut ids = registry.models.keys();
    match (ids.next(), ids.next()) {
        (Some(only), None) => Ok(only.clone()),
        (None, _) => Err(CommandError::Config(format!(
            "{} defines no models",
            path.display()
        ))),
        _ => Err(CommandError::Config(format!(
            "{} defines several models; choose one with --model ({})",
            path.display(),
            registry.models.keys().cloned().collect::<Vec<_>>().join(", ")
        ))),
    }
}
