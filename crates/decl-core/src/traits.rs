//! Collaborator interfaces
//!
//! The reconciler owns no I/O. Storage, the remote service, metadata
//! resolution and secret handling are injected behind these traits.

use crate::Result;
use async_trait::async_trait;
use decl_meta::{ResourceDescriptor, ResourceMetadata};
use serde_json::Value;

/// Listing options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListPolicy {
    /// Include every descendant instead of direct children only
    pub recursive: bool,
}

impl ListPolicy {
    pub fn recursive() -> Self {
        Self { recursive: true }
    }
}

/// Local, version-controlled resource storage.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Payload stored at a logical path, or `NotFound`.
    async fn get(&self, logical_path: &str) -> Result<Value>;

    /// Resources under a collection. Payloads may be left `Null`.
    async fn list(
        &self,
        collection_path: &str,
        policy: ListPolicy,
    ) -> Result<Vec<ResourceDescriptor>>;

    /// Whether anything (resource or collection) exists at the path.
    async fn exists(&self, logical_path: &str) -> Result<bool>;

    async fn save(&self, logical_path: &str, value: &Value) -> Result<()>;

    async fn delete(&self, logical_path: &str) -> Result<()>;
}

/// The remote REST-like resource service.
///
/// Implementations own request construction, authentication, response
/// decoding and any compiled filter-expression caching.
#[async_trait]
pub trait RemoteService: Send + Sync {
    async fn get(&self, resource: &ResourceDescriptor) -> Result<Value>;

    async fn create(&self, resource: &ResourceDescriptor) -> Result<Value>;

    async fn update(&self, resource: &ResourceDescriptor) -> Result<Value>;

    async fn delete(&self, resource: &ResourceDescriptor) -> Result<()>;

    /// Items of a remote collection with identity already resolved.
    ///
    /// `resolver` answers the `resource("<path>")` lookups a list filter
    /// expression makes. Returns `Conflict` when two items share an alias
    /// and `PayloadShape` when the response is not a list.
    async fn list(
        &self,
        collection_path: &str,
        metadata: &ResourceMetadata,
        resolver: &dyn ResourceResolver,
    ) -> Result<Vec<ResourceDescriptor>>;

    async fn exists(&self, resource: &ResourceDescriptor) -> Result<bool>;

    /// The service's OpenAPI document, when it publishes one.
    async fn openapi_spec(&self) -> Result<Option<Value>> {
        Ok(None)
    }
}

/// Remote values for other logical paths, as referenced by list filter
/// expressions through `resource("<path>")`.
#[async_trait]
pub trait ResourceResolver: Send + Sync {
    async fn resolve_resource(&self, logical_path: &str) -> Result<Value>;
}

/// Resolves effective metadata for logical paths.
#[async_trait]
pub trait MetadataService: Send + Sync {
    /// Effective metadata; `NotFound` is treated as empty metadata.
    async fn resolve_for_path(&self, logical_path: &str) -> Result<ResourceMetadata>;

    /// Metadata inferred from an OpenAPI document for a path or selector.
    /// A trailing `/` asks for the collection at that path.
    async fn infer_from_openapi(
        &self,
        selector: &str,
        document: &Value,
    ) -> Result<ResourceMetadata> {
        Ok(decl_meta::openapi::infer_from_openapi(selector, document)?)
    }
}

/// Secret placeholder resolution and masking.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Replace secret placeholders with real values before a mutation or
    /// comparison.
    async fn resolve_payload(&self, logical_path: &str, value: Value) -> Result<Value>;

    /// Replace secret values with placeholders before a local save.
    async fn mask_payload(&self, value: Value) -> Result<Value>;
}

#[async_trait]
impl MetadataService for decl_meta::MetadataRegistry {
    async fn resolve_for_path(&self, logical_path: &str) -> Result<ResourceMetadata> {
        Ok(self.resolve(logical_path)?)
    }
}
