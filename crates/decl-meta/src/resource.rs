//! Resource descriptors

use crate::ResourceMetadata;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A resource addressed by logical path, with its derived identity.
///
/// `local_alias` and `remote_id` are always derived from the path, the
/// payload and the metadata; they are never stored on their own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub logical_path: String,
    pub collection_path: String,
    pub local_alias: String,
    #[serde(rename = "remoteID")]
    pub remote_id: String,
    #[serde(default)]
    pub metadata: ResourceMetadata,
    #[serde(default)]
    pub payload: Value,
}

impl ResourceDescriptor {
    /// Descriptor for a listed item whose payload has not been fetched yet.
    pub fn listed(logical_path: impl Into<String>, local_alias: impl Into<String>) -> Self {
        let logical_path = logical_path.into();
        let local_alias = local_alias.into();
        Self {
            collection_path: crate::path::collection_path_for(&logical_path),
            remote_id: local_alias.clone(),
            logical_path,
            local_alias,
            metadata: ResourceMetadata::default(),
            payload: Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_remote_id(mut self, remote_id: impl Into<String>) -> Self {
        self.remote_id = remote_id.into();
        self
    }
}
