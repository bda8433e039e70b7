//! Resource descriptor construction

use crate::Reconciler;
use crate::Result;
use crate::identity::resolve_alias_and_remote_id;
use decl_meta::path::{collection_path_for, last_segment, normalize_logical_path};
use decl_meta::{ResourceDescriptor, derive_path_template_fields};
use serde_json::{Map, Value};

impl Reconciler {
    /// Descriptor for a resource whose payload is known.
    pub(crate) async fn describe(
        &self,
        logical_path: &str,
        payload: Value,
    ) -> Result<ResourceDescriptor> {
        let logical_path = normalize_logical_path(logical_path)?;
        let metadata = self.resolve_metadata(&logical_path).await?;
        let (local_alias, remote_id) =
            resolve_alias_and_remote_id(&logical_path, &metadata, &payload);
        Ok(ResourceDescriptor {
            collection_path: collection_path_for(&logical_path),
            logical_path,
            local_alias,
            remote_id,
            metadata,
            payload,
        })
    }

    /// Descriptor for reading a resource that has no payload yet.
    ///
    /// Alias and remote id are both the last path segment. The synthetic
    /// payload carries them under the configured identity attribute names,
    /// plus whatever the path templates bind, so templates can render.
    pub(crate) async fn describe_for_remote_read(
        &self,
        logical_path: &str,
    ) -> Result<ResourceDescriptor> {
        let logical_path = normalize_logical_path(logical_path)?;
        let metadata = self.resolve_metadata(&logical_path).await?;
        let segment = last_segment(&logical_path);

        let mut payload = Map::new();
        if let Some(attr) = metadata.alias_attribute() {
            payload.insert(attr.to_string(), Value::String(segment.clone()));
        }
        if let Some(attr) = metadata.id_attribute() {
            payload.insert(attr.to_string(), Value::String(segment.clone()));
        }
        for (key, value) in derive_path_template_fields(&logical_path, &metadata) {
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() || payload.contains_key(key) {
                continue;
            }
            payload.insert(key.to_string(), Value::String(value.to_string()));
        }

        Ok(ResourceDescriptor {
            collection_path: collection_path_for(&logical_path),
            logical_path,
            local_alias: segment.clone(),
            remote_id: segment,
            metadata,
            payload: Value::Object(payload),
        })
    }
}
