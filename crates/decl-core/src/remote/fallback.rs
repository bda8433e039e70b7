//! Ancestor identity substitution
//!
//! Rewrites path segments, deepest first, to the identifiers the remote
//! API uses, then retries the direct lookup. Each rewrite may reveal that a
//! shallower segment also needs rewriting, so candidates are explored
//! breadth-first from the requested path with a visited set.

use super::{allows_singleton_fallback, ambiguous};
use crate::identity::{identity_attribute_candidates, matches_fallback_identity, requested_segment};
use crate::traits::RemoteService;
use crate::{Reconciler, Result};
use decl_content::lookup_scalar_attribute;
use decl_meta::path::{normalize_logical_path, split_segments};
use decl_meta::{ResourceDescriptor, ResourceMetadata};
use serde_json::Value;
use std::collections::{HashSet, VecDeque};

impl Reconciler {
    /// `None` when no rewritten path was found; the caller moves on to the
    /// next fallback.
    pub(super) async fn fetch_via_metadata_fallback(
        &self,
        remote: &dyn RemoteService,
        descriptor: &ResourceDescriptor,
    ) -> Option<Result<Value>> {
        let original = descriptor.logical_path.as_str();
        let mut visited: HashSet<String> = HashSet::from([original.to_string()]);
        let mut queue: VecDeque<String> = VecDeque::from([original.to_string()]);

        while let Some(current) = queue.pop_front() {
            if current != original {
                match self.describe_for_remote_read(&current).await {
                    Ok(current_descriptor) => match remote.get(&current_descriptor).await {
                        Ok(value) => {
                            tracing::debug!(
                                path = original,
                                resolved = %current,
                                "Remote path resolved through ancestor identities"
                            );
                            return Some(Ok(value));
                        }
                        Err(e) if e.is_conflict() => return Some(Err(e)),
                        Err(_) => {}
                    },
                    Err(e) if e.is_conflict() => return Some(Err(e)),
                    Err(_) => continue,
                }
            }

            let next_paths = match self.next_fallback_paths(remote, &current).await {
                Ok(next_paths) => next_paths,
                Err(e) => return Some(Err(e)),
            };
            for next in next_paths {
                if visited.insert(next.clone()) {
                    queue.push_back(next);
                }
            }
        }

        None
    }

    /// Successors of `logical_path`: the path with its deepest resolvable
    /// segment replaced by the matching remote identifier.
    async fn next_fallback_paths(
        &self,
        remote: &dyn RemoteService,
        logical_path: &str,
    ) -> Result<Vec<String>> {
        let segments = split_segments(logical_path);

        for index in (0..segments.len()).rev() {
            let segment_path = format!("/{}", segments[..=index].join("/"));
            let segment_info = match self.describe_for_remote_read(&segment_path).await {
                Ok(segment_info) => segment_info,
                Err(e) if e.is_conflict() => return Err(e),
                Err(e) => {
                    tracing::debug!(
                        path = %segment_path,
                        error = %e,
                        "Skipping segment, descriptor unavailable"
                    );
                    continue;
                }
            };
            if !segment_info.metadata.has_identity_attribute() {
                continue;
            }

            let candidates = match self
                .list_remote_resources(remote, &segment_info.collection_path, &segment_info.metadata)
                .await
            {
                Ok(candidates) => candidates,
                Err(e) if e.is_conflict() => return Err(e),
                Err(e) => {
                    tracing::debug!(
                        path = %segment_path,
                        error = %e,
                        "Skipping segment, collection listing failed"
                    );
                    continue;
                }
            };

            let requested = requested_segment(&segment_info.logical_path, &segment_info.remote_id);
            let matched: Vec<&ResourceDescriptor> = candidates
                .iter()
                .filter(|candidate| {
                    matches_fallback_identity(
                        &requested,
                        &segment_info.metadata,
                        &candidate.local_alias,
                        &candidate.remote_id,
                        &candidate.payload,
                    )
                })
                .collect();

            let chosen = match matched.as_slice() {
                [] if allows_singleton_fallback(&segment_path, &segment_info.metadata, &candidates) => {
                    &candidates[0]
                }
                [] => continue,
                [only] => *only,
                _ => return Err(ambiguous(logical_path)),
            };

            let replacement = fallback_segment_value(chosen, &segment_info.metadata);
            if let Some(next) = replace_segment(&segments, index, &replacement) {
                tracing::debug!(from = logical_path, to = %next, "Rewrote path segment");
                return Ok(vec![next]);
            }
        }

        Ok(Vec::new())
    }
}

/// The identifier to put in place of a segment: the candidate's remote id,
/// else its first identity attribute value, else its alias.
fn fallback_segment_value(candidate: &ResourceDescriptor, metadata: &ResourceMetadata) -> String {
    let remote_id = candidate.remote_id.trim();
    if !remote_id.is_empty() {
        return remote_id.to_string();
    }
    if candidate.payload.is_object() {
        let from_attribute = identity_attribute_candidates(metadata)
            .iter()
            .filter_map(|attr| lookup_scalar_attribute(&candidate.payload, attr))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty());
        if let Some(value) = from_attribute {
            return value;
        }
    }
    candidate.local_alias.trim().to_string()
}

/// `None` when the replacement is blank, unchanged, or does not form a
/// valid logical path (`_`, `..`).
fn replace_segment(segments: &[&str], index: usize, replacement: &str) -> Option<String> {
    let replacement = replacement.trim();
    if replacement.is_empty() || replacement == segments[index] {
        return None;
    }
    let mut next: Vec<&str> = segments.to_vec();
    next[index] = replacement;
    let candidate = format!("/{}", next.join("/"));
    match normalize_logical_path(&candidate) {
        Ok(next) => Some(next),
        Err(e) => {
            tracing::debug!(path = %candidate, error = %e, "Skipping unusable replacement segment");
            None
        }
    }
}
