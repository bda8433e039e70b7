//! Remote resolution
//!
//! The remote API may address a resource by an identifier that differs from
//! its local alias, anywhere along its path. A direct lookup is tried first;
//! when it misses, the resolver falls back in order to:
//!
//! 1. rewriting path segments to remote identifiers found by listing each
//!    ancestor collection ([`fallback`]),
//! 2. treating the path as a possibly empty collection ([`collection`]),
//! 3. scanning the parent collection for a matching alias or id.

mod collection;
mod fallback;
mod lookup;

pub(crate) use lookup::LookupState;

use crate::traits::RemoteService;
use crate::{Error, Reconciler, Result};
use lookup::ListResourceResolver;
use decl_meta::path::split_segments;
use decl_meta::{ResourceDescriptor, ResourceMetadata};
use serde_json::Value;

impl Reconciler {
    pub(crate) async fn fetch_remote_value(&self, descriptor: &ResourceDescriptor) -> Result<Value> {
        let remote = self.require_remote()?;

        let original_err = match remote.get(descriptor).await {
            Ok(value) => {
                self.check_identity_ambiguity(remote, descriptor).await?;
                return Ok(value);
            }
            Err(e) if e.is_not_found() => e,
            Err(e) => return Err(e),
        };

        if let Some(outcome) = self.fetch_via_metadata_fallback(remote, descriptor).await {
            return outcome;
        }

        if let Some(outcome) = self.fetch_as_collection(remote, descriptor).await {
            return outcome;
        }

        let candidates = match self
            .list_remote_resources(remote, &descriptor.collection_path, &descriptor.metadata)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) if e.is_inapplicable_probe() => {
                tracing::debug!(
                    path = %descriptor.logical_path,
                    error = %e,
                    "Collection list fallback not applicable"
                );
                return Err(original_err);
            }
            Err(e) => return Err(e),
        };

        let mut matched: Vec<&ResourceDescriptor> = candidates
            .iter()
            .filter(|candidate| matches_remote_candidate(descriptor, candidate))
            .collect();

        match matched.len() {
            0 if allows_singleton_fallback(&descriptor.logical_path, &descriptor.metadata, &candidates) => {
                tracing::debug!(
                    path = %descriptor.logical_path,
                    "Using the only filtered list item as the resource"
                );
                Ok(candidates[0].payload.clone())
            }
            0 => Err(original_err),
            1 => Ok(matched.remove(0).payload.clone()),
            _ => Err(ambiguous(&descriptor.logical_path)),
        }
    }

    /// After a successful direct lookup, make sure the requested identifier
    /// does not name several remote resources at once.
    async fn check_identity_ambiguity(
        &self,
        remote: &dyn RemoteService,
        descriptor: &ResourceDescriptor,
    ) -> Result<()> {
        if !should_check_identity_ambiguity(descriptor) {
            return Ok(());
        }

        let candidates = match self
            .list_remote_resources(remote, &descriptor.collection_path, &descriptor.metadata)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) if e.is_conflict() => return Err(e),
            Err(e) => {
                tracing::warn!(
                    path = %descriptor.logical_path,
                    error = %e,
                    "Ambiguity check skipped"
                );
                return Ok(());
            }
        };

        let count = candidates
            .iter()
            .filter(|candidate| matches_remote_candidate(descriptor, candidate))
            .count();
        if count > 1 {
            return Err(ambiguous(&descriptor.logical_path));
        }
        Ok(())
    }

    pub(crate) async fn list_remote_resources(
        &self,
        remote: &dyn RemoteService,
        collection_path: &str,
        metadata: &ResourceMetadata,
    ) -> Result<Vec<ResourceDescriptor>> {
        let resolver = ListResourceResolver::new(self);
        remote.list(collection_path, metadata, &resolver).await
    }
}

fn should_check_identity_ambiguity(descriptor: &ResourceDescriptor) -> bool {
    if descriptor.metadata.id_attribute().is_none() || descriptor.metadata.alias_attribute().is_none() {
        return false;
    }
    let alias = descriptor.local_alias.trim();
    let remote_id = descriptor.remote_id.trim();
    !alias.is_empty() && !remote_id.is_empty() && alias != remote_id
}

fn matches_remote_candidate(descriptor: &ResourceDescriptor, candidate: &ResourceDescriptor) -> bool {
    candidate.local_alias == descriptor.local_alias
        || (!descriptor.remote_id.is_empty() && candidate.remote_id == descriptor.remote_id)
}

/// A filtered listing that returns exactly one item may stand in for an
/// unmatched identifier, but only at or above the collection template depth.
fn allows_singleton_fallback(
    logical_path: &str,
    metadata: &ResourceMetadata,
    candidates: &[ResourceDescriptor],
) -> bool {
    candidates.len() == 1
        && within_selector_depth(logical_path, metadata)
        && metadata.has_list_filter_expression()
}

fn within_selector_depth(logical_path: &str, metadata: &ResourceMetadata) -> bool {
    let template_depth = split_segments(&metadata.collection_path).len();
    let logical_depth = split_segments(logical_path).len();
    template_depth == 0 || logical_depth == 0 || logical_depth <= template_depth
}

fn ambiguous(logical_path: &str) -> Error {
    Error::conflict(format!("remote fallback for {:?} is ambiguous", logical_path))
}
