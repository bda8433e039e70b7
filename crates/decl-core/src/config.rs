//! Reconciler configuration

use crate::store::FsResourceStore;
use crate::{Reconciler, Result};
use decl_fs::{ConfigStore, DocumentFormat, NormalizedPath};
use decl_meta::MetadataRegistry;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Settings for a filesystem-backed reconciler.
///
/// ```toml
/// repository_dir = "resources"
/// resource_format = "yaml"
/// metadata_file = "metadata.yaml"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Root of the local resource repository
    pub repository_dir: PathBuf,
    #[serde(default)]
    pub resource_format: DocumentFormat,
    /// Selector metadata document, in any supported config format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_file: Option<PathBuf>,
}

impl ReconcilerConfig {
    pub fn new(repository_dir: impl Into<PathBuf>) -> Self {
        Self {
            repository_dir: repository_dir.into(),
            resource_format: DocumentFormat::default(),
            metadata_file: None,
        }
    }

    pub fn load(path: &NormalizedPath) -> Result<Self> {
        Ok(ConfigStore::new().load(path)?)
    }

    pub fn save(&self, path: &NormalizedPath) -> Result<()> {
        Ok(ConfigStore::new().save(path, self)?)
    }
}

impl Reconciler {
    /// Reconciler with a filesystem store and, when configured, a metadata
    /// registry. Remote and secret collaborators are attached separately.
    pub fn from_config(config: &ReconcilerConfig) -> Result<Self> {
        let store = FsResourceStore::new(config.repository_dir.as_path(), config.resource_format);
        let mut reconciler = Reconciler::new()
            .with_store(Arc::new(store))
            .with_resource_format(config.resource_format);

        if let Some(metadata_file) = &config.metadata_file {
            let registry = MetadataRegistry::load(&NormalizedPath::new(metadata_file))?;
            tracing::debug!(selectors = registry.len(), "Loaded metadata registry");
            reconciler = reconciler.with_metadata(Arc::new(registry));
        }
        Ok(reconciler)
    }
}
