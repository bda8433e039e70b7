//! Collection-vs-resource disambiguation
//!
//! Some APIs answer 404 for an empty collection. When a path looks like a
//! collection, a missing direct lookup is answered by listing it instead.

use crate::traits::RemoteService;
use crate::{ErrorKind, Reconciler, Result};
use decl_meta::path::{collection_path_for, split_segments};
use decl_meta::openapi::{has_openapi_path, infer_from_openapi, path_looks_like_resource};
use decl_meta::{Operation, ResourceDescriptor, ResourceMetadata, derive_path_template_fields};
use serde_json::Value;

impl Reconciler {
    /// `None` when the path is not a collection or the listing does not
    /// return a list; the caller moves on to the next fallback.
    pub(super) async fn fetch_as_collection(
        &self,
        remote: &dyn RemoteService,
        descriptor: &ResourceDescriptor,
    ) -> Option<Result<Value>> {
        if !self.looks_like_collection(remote, descriptor).await {
            return None;
        }

        match self
            .list_remote_resources(remote, &descriptor.logical_path, &descriptor.metadata)
            .await
        {
            Ok(mut items) => {
                items.sort_by(|a, b| a.logical_path.cmp(&b.logical_path));
                let payloads = items.into_iter().map(|item| item.payload).collect();
                Some(Ok(Value::Array(payloads)))
            }
            Err(e) if e.is_not_found() => {
                if self.parent_is_missing(remote, &descriptor.logical_path).await {
                    Some(Err(e))
                } else {
                    tracing::debug!(
                        path = %descriptor.logical_path,
                        "Collection listing returned not found, treating as empty"
                    );
                    Some(Ok(Value::Array(Vec::new())))
                }
            }
            Err(e) if e.kind() == ErrorKind::PayloadShape => None,
            Err(e) => Some(Err(e)),
        }
    }

    async fn looks_like_collection(
        &self,
        remote: &dyn RemoteService,
        descriptor: &ResourceDescriptor,
    ) -> bool {
        self.collection_hint_from_store(&descriptor.logical_path).await
            || self.collection_hint_from_openapi(remote, descriptor).await
    }

    /// The store has a directory at the path but no resource in it.
    async fn collection_hint_from_store(&self, logical_path: &str) -> bool {
        let Some(store) = self.store.as_deref() else {
            return false;
        };
        if !matches!(store.exists(logical_path).await, Ok(true)) {
            return false;
        }
        matches!(store.get(logical_path).await, Err(e) if e.is_not_found())
    }

    async fn collection_hint_from_openapi(
        &self,
        remote: &dyn RemoteService,
        descriptor: &ResourceDescriptor,
    ) -> bool {
        let document = match remote.openapi_spec().await {
            Ok(Some(document)) => document,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!(error = %e, "OpenAPI document unavailable");
                return false;
            }
        };
        let logical_path = descriptor.logical_path.as_str();
        if !has_openapi_path(&document, logical_path) {
            return false;
        }

        if self.inference_hints_collection(descriptor, logical_path, &document).await {
            return true;
        }

        if path_looks_like_resource(&document, logical_path) || logical_path == "/" {
            return false;
        }

        let selector = format!("{}/", logical_path.trim_end_matches('/'));
        self.inference_hints_collection(descriptor, &selector, &document).await
    }

    async fn inference_hints_collection(
        &self,
        descriptor: &ResourceDescriptor,
        selector: &str,
        document: &Value,
    ) -> bool {
        let inferred = match self.metadata.as_deref() {
            Some(service) => service.infer_from_openapi(selector, document).await,
            None => infer_from_openapi(selector, document).map_err(crate::Error::from),
        };
        let Ok(inferred) = inferred else {
            return false;
        };

        let hint = ResourceDescriptor {
            payload: hint_payload(&descriptor.payload, &descriptor.logical_path, &inferred),
            metadata: inferred,
            ..descriptor.clone()
        };

        if self.rendered_operation_path(&hint, Operation::List).as_deref()
            != Some(hint.logical_path.as_str())
        {
            return false;
        }
        if self.rendered_operation_path(&hint, Operation::Create).as_deref()
            == Some(hint.logical_path.as_str())
        {
            return true;
        }
        self.rendered_operation_path(&hint, Operation::Get)
            .is_some_and(|get_path| is_collection_item_path(&hint.logical_path, &get_path))
    }

    /// A 404 on a collection listing means "missing" rather than "empty"
    /// when the owning resource is also gone.
    async fn parent_is_missing(&self, remote: &dyn RemoteService, logical_path: &str) -> bool {
        let parent = collection_path_for(logical_path);
        if parent == "/" {
            return false;
        }
        let Ok(parent_info) = self.describe_for_remote_read(&parent).await else {
            return false;
        };
        matches!(remote.get(&parent_info).await, Err(e) if e.is_not_found())
    }
}

/// Read payload augmented with bindings the inferred templates derive from
/// the path.
fn hint_payload(base: &Value, logical_path: &str, inferred: &ResourceMetadata) -> Value {
    let mut scope = match base {
        Value::Object(map) => map.clone(),
        _ => serde_json::Map::new(),
    };
    for (key, value) in derive_path_template_fields(logical_path, inferred) {
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() || scope.contains_key(key) {
            continue;
        }
        scope.insert(key.to_string(), Value::String(value.to_string()));
    }
    if scope.is_empty() {
        base.clone()
    } else {
        Value::Object(scope)
    }
}

fn is_collection_item_path(collection_path: &str, resource_path: &str) -> bool {
    if collection_path == "/" {
        return resource_path != "/" && split_segments(resource_path).len() == 1;
    }
    resource_path.starts_with(&format!("{}/", collection_path.trim_end_matches('/')))
}
