//! Local resolution with identity fallback
//!
//! A literal lookup is tried first. When it misses and the resource kind
//! has identity attributes, the parent collection is scanned for a resource
//! whose alias, remote id or identity attribute equals the requested
//! segment. This lets `/clients/<client-id>` find a resource stored as
//! `/clients/web`.

use crate::identity::{matches_fallback_identity, requested_segment, resolve_resource_identity};
use crate::traits::{ListPolicy, LocalStore};
use crate::{Error, Reconciler, Result};
use decl_meta::ResourceDescriptor;
use decl_meta::path::{collection_path_for, last_segment, normalize_logical_path};

impl Reconciler {
    pub(crate) async fn resolve_local_for_read(
        &self,
        logical_path: &str,
    ) -> Result<ResourceDescriptor> {
        let store = self.require_store()?;
        let logical_path = normalize_logical_path(logical_path)?;

        let original_err = match store.get(&logical_path).await {
            Ok(payload) => {
                let segment = last_segment(&logical_path);
                return Ok(ResourceDescriptor {
                    collection_path: collection_path_for(&logical_path),
                    local_alias: segment.clone(),
                    remote_id: segment,
                    logical_path,
                    payload,
                    ..Default::default()
                });
            }
            Err(e) if e.is_not_found() => e,
            Err(e) => return Err(e),
        };

        let requested = self.describe_for_remote_read(&logical_path).await?;
        if !requested.metadata.has_identity_attribute() {
            return Err(original_err);
        }

        let candidates = store
            .list(&requested.collection_path, ListPolicy::default())
            .await?;
        let segment = requested_segment(&requested.logical_path, &requested.remote_id);

        let mut alias_matches = candidates
            .iter()
            .filter(|candidate| listed_alias(candidate) == segment);
        if let (Some(only), None) = (alias_matches.next(), alias_matches.next()) {
            tracing::debug!(
                path = %logical_path,
                candidate = %only.logical_path,
                "Local alias fallback matched"
            );
            return hydrate_candidate(store, &requested, only).await;
        }

        let mut matches = Vec::new();
        for candidate in &candidates {
            let hydrated = hydrate_candidate(store, &requested, candidate).await?;
            if matches_fallback_identity(
                &segment,
                &requested.metadata,
                &hydrated.local_alias,
                &hydrated.remote_id,
                &hydrated.payload,
            ) {
                matches.push(hydrated);
            }
        }

        match matches.len() {
            0 => Err(original_err),
            1 => {
                let found = matches.remove(0);
                tracing::debug!(
                    path = %logical_path,
                    candidate = %found.logical_path,
                    "Local identity fallback matched"
                );
                Ok(found)
            }
            _ => Err(Error::conflict(format!(
                "local fallback for {:?} is ambiguous",
                logical_path
            ))),
        }
    }
}

/// Alias of a listed item, or its path segment when the store left it blank.
fn listed_alias(item: &ResourceDescriptor) -> String {
    match item.local_alias.trim() {
        "" | "/" => last_segment(&item.logical_path),
        alias => alias.to_string(),
    }
}

async fn hydrate_candidate(
    store: &dyn LocalStore,
    requested: &ResourceDescriptor,
    candidate: &ResourceDescriptor,
) -> Result<ResourceDescriptor> {
    let payload = store.get(&candidate.logical_path).await?;
    let (local_alias, remote_id) =
        resolve_resource_identity(&candidate.logical_path, &requested.metadata, &payload);
    Ok(ResourceDescriptor {
        logical_path: candidate.logical_path.clone(),
        collection_path: collection_path_for(&candidate.logical_path),
        local_alias,
        remote_id,
        metadata: requested.metadata.clone(),
        payload,
    })
}
