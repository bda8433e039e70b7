//! Filesystem-backed local store
//!
//! Each resource lives in its own directory named after its logical path:
//!
//! ```text
//! <root>/admin/realms/acme/resource.json
//! <root>/admin/realms/acme/clients/web/resource.json
//! ```
//!
//! A directory without a resource file is a collection.

use crate::traits::{ListPolicy, LocalStore};
use crate::{Error, Result};
use async_trait::async_trait;
use decl_fs::{DocumentFormat, NormalizedPath, io};
use decl_meta::ResourceDescriptor;
use decl_meta::path::{join_logical_path, normalize_logical_path};
use serde_json::Value;

const RESOURCE_FILE_STEM: &str = "resource";

/// [`LocalStore`] over a repository directory.
#[derive(Debug, Clone)]
pub struct FsResourceStore {
    root: NormalizedPath,
    format: DocumentFormat,
}

impl FsResourceStore {
    pub fn new(root: impl Into<NormalizedPath>, format: DocumentFormat) -> Self {
        Self {
            root: root.into(),
            format,
        }
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    fn directory_for(&self, logical_path: &str) -> NormalizedPath {
        self.root.join(logical_path)
    }

    fn file_for(&self, logical_path: &str, format: DocumentFormat) -> NormalizedPath {
        self.directory_for(logical_path)
            .join(&format!("{}.{}", RESOURCE_FILE_STEM, format.extension()))
    }

    /// The existing resource file for a path, preferring the configured
    /// format.
    fn existing_file(&self, logical_path: &str) -> Option<(NormalizedPath, DocumentFormat)> {
        let alternatives = [DocumentFormat::Json, DocumentFormat::Yaml];
        std::iter::once(self.format)
            .chain(alternatives.into_iter().filter(|f| *f != self.format))
            .map(|format| (self.file_for(logical_path, format), format))
            .find(|(file, _)| file.is_file())
    }

    fn collect(
        &self,
        collection_path: &str,
        recursive: bool,
        items: &mut Vec<ResourceDescriptor>,
    ) -> Result<()> {
        for name in io::list_dirs(&self.directory_for(collection_path))? {
            let Ok(child) = join_logical_path(collection_path, &name) else {
                tracing::debug!(collection = collection_path, name = %name, "Skipping directory");
                continue;
            };
            if self.existing_file(&child).is_some() {
                items.push(ResourceDescriptor::listed(child.clone(), name));
            }
            if recursive {
                self.collect(&child, true, items)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LocalStore for FsResourceStore {
    async fn get(&self, logical_path: &str) -> Result<Value> {
        let logical_path = normalize_logical_path(logical_path)?;
        let Some((file, format)) = self.existing_file(&logical_path) else {
            return Err(Error::not_found(format!("local resource {:?}", logical_path)));
        };
        let content = io::read_text(&file)?;
        Ok(format.decode(&file, &content)?)
    }

    async fn list(
        &self,
        collection_path: &str,
        policy: ListPolicy,
    ) -> Result<Vec<ResourceDescriptor>> {
        let collection_path = normalize_logical_path(collection_path)?;
        let mut items = Vec::new();
        self.collect(&collection_path, policy.recursive, &mut items)?;
        items.sort_by(|a, b| a.logical_path.cmp(&b.logical_path));
        Ok(items)
    }

    async fn exists(&self, logical_path: &str) -> Result<bool> {
        let logical_path = normalize_logical_path(logical_path)?;
        Ok(self.directory_for(&logical_path).is_dir())
    }

    async fn save(&self, logical_path: &str, value: &Value) -> Result<()> {
        let logical_path = normalize_logical_path(logical_path)?;
        let file = self.file_for(&logical_path, self.format);
        let content = self.format.encode(&file, value)?;
        io::write_atomic(&file, content.as_bytes())?;
        tracing::debug!(path = %logical_path, file = %file, "Saved local resource");
        Ok(())
    }

    async fn delete(&self, logical_path: &str) -> Result<()> {
        let logical_path = normalize_logical_path(logical_path)?;
        match self.existing_file(&logical_path) {
            Some((file, _)) => Ok(io::remove_file(&file)?),
            None => Err(Error::not_found(format!("local resource {:?}", logical_path))),
        }
    }
}
