//! Catalog loading with graceful degradation.
//!
//! A catalog that cannot be read never stops a run from starting: the loader
//! error is recorded in [`CatalogSource::Fallback`] and the built-in single
//! phase catalog takes its place.
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::CatalogLoader;
use crate::data::Catalog;

const BUNDLED_CATALOG: &str = include_str!("../assets/phases.json");

/// Failures that prevent a catalog document from being used at all.
#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("catalog file {path} could not be read: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog has no `phases` array")]
    MissingPhases,
    #[error("catalog contains no usable phase")]
    Empty,
}

/// A phase or option record dropped during parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    /// Position of the phase record in the source document.
    pub phase_index: usize,
    /// Position of the option record inside its phase; `None` for a whole phase.
    pub option_index: Option<usize>,
    pub reason: String,
}

impl SkippedRecord {
    #[must_use]
    pub fn phase(phase_index: usize, reason: impl Into<String>) -> Self {
        Self {
            phase_index,
            option_index: None,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn option(phase_index: usize, option_index: usize, reason: impl Into<String>) -> Self {
        Self {
            phase_index,
            option_index: Some(option_index),
            reason: reason.into(),
        }
    }
}

/// Where the active catalog came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogSource {
    Loaded,
    Fallback { reason: String },
}

/// Result of [`Catalog::load_or_fallback`].
#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub catalog: Arc<Catalog>,
    pub source: CatalogSource,
    pub skipped: Vec<SkippedRecord>,
}

impl LoadedCatalog {
    #[must_use]
    pub const fn used_fallback(&self) -> bool {
        matches!(self.source, CatalogSource::Fallback { .. })
    }
}

impl Catalog {
    /// Load through `loader`, substituting [`Catalog::fallback`] on failure.
    pub fn load_or_fallback<L: CatalogLoader>(loader: &L) -> LoadedCatalog {
        match loader.load_catalog() {
            Ok((catalog, skipped)) => {
                for record in &skipped {
                    log::warn!(
                        "catalog record skipped | phase {} option {:?}: {}",
                        record.phase_index,
                        record.option_index,
                        record.reason
                    );
                }
                LoadedCatalog {
                    catalog: Arc::new(catalog),
                    source: CatalogSource::Loaded,
                    skipped,
                }
            }
            Err(err) => {
                log::warn!("catalog unavailable, using fallback: {err}");
                LoadedCatalog {
                    catalog: Arc::new(Self::fallback()),
                    source: CatalogSource::Fallback {
                        reason: err.to_string(),
                    },
                    skipped: Vec::new(),
                }
            }
        }
    }
}

/// Reads a catalog document from disk.
#[derive(Debug, Clone)]
pub struct FileCatalogLoader {
    path: PathBuf,
}

impl FileCatalogLoader {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogLoader for FileCatalogLoader {
    type Error = CatalogLoadError;

    fn load_catalog(&self) -> Result<(Catalog, Vec<SkippedRecord>), Self::Error> {
        let json = std::fs::read_to_string(&self.path).map_err(|source| CatalogLoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        Catalog::from_json(&json)
    }
}

/// Parses a catalog held in memory; [`JsonCatalogLoader::bundled`] serves the
/// catalog shipped with the crate.
#[derive(Debug, Clone)]
pub struct JsonCatalogLoader {
    json: String,
}

impl JsonCatalogLoader {
    #[must_use]
    pub fn new(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }

    #[must_use]
    pub fn bundled() -> Self {
        Self::new(BUNDLED_CATALOG)
    }
}

impl CatalogLoader for JsonCatalogLoader {
    type Error = CatalogLoadError;

    fn load_catalog(&self) -> Result<(Catalog, Vec<SkippedRecord>), Self::Error> {
        Catalog::from_json(&self.json)
    }
}
