//! Selector-based metadata registry
//!
//! Selectors are logical paths in which `_` matches any single segment,
//! e.g. `/admin/realms/_/clients`. Metadata registered for a selector
//! applies to every path at or below the paths it matches.

use crate::path::{RESERVED_SEGMENT, clean_path, normalize_logical_path, split_segments};
use crate::{Error, ResourceMetadata, Result};
use decl_fs::{ConfigStore, NormalizedPath};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// On-disk shape of a metadata document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataDocument {
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceMetadata>,
}

/// Metadata entries keyed by selector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataRegistry {
    entries: BTreeMap<String, ResourceMetadata>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a registry from a `.toml`, `.json` or `.yaml` document.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        let document: MetadataDocument = ConfigStore::new().load(path)?;
        let mut registry = Self::new();
        for (selector, metadata) in document.resources {
            registry.insert(&selector, metadata)?;
        }
        tracing::debug!(%path, entries = registry.len(), "loaded metadata registry");
        Ok(registry)
    }

    /// Persist the registry.
    pub fn save(&self, path: &NormalizedPath) -> Result<()> {
        let document = MetadataDocument {
            resources: self.entries.clone(),
        };
        Ok(ConfigStore::new().save(path, &document)?)
    }

    /// Register metadata for a selector, merging over an existing entry.
    pub fn insert(&mut self, selector: &str, metadata: ResourceMetadata) -> Result<()> {
        let selector = normalize_selector(selector)?;
        let merged = match self.entries.remove(&selector) {
            Some(existing) => existing.merge(&metadata),
            None => metadata,
        };
        self.entries.insert(selector, merged);
        Ok(())
    }

    pub fn get(&self, selector: &str) -> Option<&ResourceMetadata> {
        self.entries.get(selector)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Effective metadata for a logical path.
    ///
    /// Merges the root entry first, then for each depth the selectors that
    /// match the path prefix of that depth: wildcard-bearing selectors
    /// before fully literal ones, then lexicographically.
    pub fn resolve(&self, logical_path: &str) -> Result<ResourceMetadata> {
        let target = normalize_logical_path(logical_path)?;
        let segments = split_segments(&target);

        let mut merged = ResourceMetadata::default();
        if let Some(root) = self.entries.get("/") {
            merged = merged.merge(root);
        }

        for depth in 1..=segments.len() {
            let prefix = &segments[..depth];
            let mut matching: Vec<(&String, &ResourceMetadata)> = self
                .entries
                .iter()
                .filter(|(selector, _)| selector_matches(selector, prefix))
                .collect();
            matching.sort_by(|(a, _), (b, _)| {
                literal_count(a)
                    .cmp(&literal_count(b))
                    .then_with(|| a.cmp(b))
            });
            for (selector, metadata) in matching {
                tracing::trace!(%target, %selector, "applying metadata selector");
                merged = merged.merge(metadata);
            }
        }
        Ok(merged)
    }
}

fn normalize_selector(selector: &str) -> Result<String> {
    let slashed = selector.trim().replace('\\', "/");
    if !slashed.starts_with('/') {
        return Err(Error::InvalidSelector {
            selector: selector.to_string(),
            reason: "selector must be absolute".into(),
        });
    }
    if slashed.split('/').any(|segment| segment == "..") {
        return Err(Error::InvalidSelector {
            selector: selector.to_string(),
            reason: "selector must not contain traversal segments".into(),
        });
    }
    Ok(clean_path(&slashed))
}

fn selector_matches(selector: &str, prefix: &[&str]) -> bool {
    let selector_segments = split_segments(selector);
    selector_segments.len() == prefix.len()
        && selector_segments
            .iter()
            .zip(prefix)
            .all(|(s, p)| *s == RESERVED_SEGMENT || s == p)
}

fn literal_count(selector: &str) -> usize {
    split_segments(selector)
        .into_iter()
        .filter(|segment| *segment != RESERVED_SEGMENT)
        .count()
}
