//! Format-agnostic configuration loading and saving

use crate::{DocumentFormat, NormalizedPath, Result, io};
use serde::{Serialize, de::DeserializeOwned};

/// Loads and saves serde types, picking the format from the file extension:
/// `.toml`, `.json`, `.yaml` or `.yml`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigStore;

impl ConfigStore {
    pub fn new() -> Self {
        Self
    }

    pub fn load<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<T> {
        let format = DocumentFormat::from_path(path)?;
        let content = io::read_text(path)?;
        tracing::debug!(%path, %format, "loading config");
        format.decode(path, &content)
    }

    /// Save configuration atomically.
    pub fn save<T: Serialize>(&self, path: &NormalizedPath, value: &T) -> Result<()> {
        let format = DocumentFormat::from_path(path)?;
        let content = format.encode(path, value)?;
        io::write_atomic(path, content.as_bytes())
    }
}
