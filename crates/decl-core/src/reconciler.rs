//! The reconciler and its collaborator wiring

use crate::remote::LookupState;
use crate::traits::{LocalStore, MetadataService, RemoteService, SecretProvider};
use crate::{Error, Result};
use decl_fs::DocumentFormat;
use decl_meta::ResourceMetadata;
use std::fmt;
use std::sync::Arc;

/// Reconciles desired local state with actual remote state.
///
/// Holds only shared collaborator handles; every operation takes `&self`
/// and the reconciler can be shared across tasks.
///
/// ```ignore
/// let reconciler = Reconciler::new()
///     .with_store(Arc::new(store))
///     .with_remote(Arc::new(remote))
///     .with_metadata(Arc::new(registry));
/// let drift = reconciler.diff("/admin/realms/acme").await?;
/// ```
#[derive(Clone, Default)]
pub struct Reconciler {
    pub(crate) store: Option<Arc<dyn LocalStore>>,
    pub(crate) remote: Option<Arc<dyn RemoteService>>,
    pub(crate) metadata: Option<Arc<dyn MetadataService>>,
    pub(crate) secrets: Option<Arc<dyn SecretProvider>>,
    pub(crate) resource_format: DocumentFormat,
    /// Set only on the copies that serve `resource()` lookups, so nested
    /// listings share one cache and cycle guard.
    pub(crate) lookups: Option<Arc<LookupState>>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(mut self, store: Arc<dyn LocalStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteService>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataService>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_secrets(mut self, secrets: Arc<dyn SecretProvider>) -> Self {
        self.secrets = Some(secrets);
        self
    }

    /// Format local resources are stored in; exposed to templates as
    /// `resourceFormat`.
    pub fn with_resource_format(mut self, format: DocumentFormat) -> Self {
        self.resource_format = format;
        self
    }

    pub fn resource_format(&self) -> DocumentFormat {
        self.resource_format
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub(crate) fn require_store(&self) -> Result<&dyn LocalStore> {
        self.store
            .as_deref()
            .ok_or_else(|| Error::validation("local store is not configured"))
    }

    pub(crate) fn require_remote(&self) -> Result<&dyn RemoteService> {
        self.remote
            .as_deref()
            .ok_or_else(|| Error::validation("remote service is not configured"))
    }

    /// Effective metadata for a normalized path. A missing metadata service
    /// or a `NotFound` answer yields empty metadata.
    pub(crate) async fn resolve_metadata(&self, logical_path: &str) -> Result<ResourceMetadata> {
        let Some(service) = self.metadata.as_deref() else {
            return Ok(ResourceMetadata::default());
        };
        match service.resolve_for_path(logical_path).await {
            Ok(metadata) => Ok(metadata),
            Err(e) if e.is_not_found() => {
                tracing::debug!(path = logical_path, "No metadata for path, using empty metadata");
                Ok(ResourceMetadata::default())
            }
            Err(e) => Err(e),
        }
    }
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("store", &self.store.is_some())
            .field("remote", &self.remote.is_some())
            .field("metadata", &self.metadata.is_some())
            .field("secrets", &self.secrets.is_some())
            .field("resource_format", &self.resource_format)
            .finish()
    }
}
