//! Identity resolution
//!
//! A resource has a local alias (its directory name in the repository) and
//! a remote id (the identifier the remote API addresses it by). Both come
//! from metadata-configured payload attributes and fall back to the last
//! logical path segment.

use crate::{Error, Result};
use decl_content::lookup_scalar_attribute;
use decl_meta::ResourceMetadata;
use decl_meta::path::last_segment;
use serde_json::Value;

/// Attribute names tried when matching fallback candidates, beyond the
/// configured ones.
const FALLBACK_IDENTITY_ATTRIBUTES: [&str; 7] =
    ["id", "clientId", "name", "alias", "key", "uuid", "uid"];

/// Derive `(alias, remote_id)` for a resource at `logical_path`.
///
/// ```
/// use decl_core::identity::resolve_alias_and_remote_id;
/// use decl_meta::ResourceMetadata;
/// use serde_json::json;
///
/// let md = ResourceMetadata {
///     id_from_attribute: "id".into(),
///     alias_from_attribute: "name".into(),
///     ..Default::default()
/// };
/// let (alias, id) = resolve_alias_and_remote_id("/c/x", &md, &json!({"id": 7, "name": "acme"}));
/// assert_eq!((alias.as_str(), id.as_str()), ("acme", "7"));
/// ```
pub fn resolve_alias_and_remote_id(
    logical_path: &str,
    metadata: &ResourceMetadata,
    payload: &Value,
) -> (String, String) {
    let fallback = last_segment(logical_path);
    if !payload.is_object() {
        return (fallback.clone(), fallback);
    }

    let alias = metadata
        .alias_attribute()
        .and_then(|attr| trimmed_attribute(payload, attr))
        .unwrap_or_else(|| fallback.clone());

    let remote_id = match metadata.id_attribute() {
        Some(attr) => trimmed_attribute(payload, attr).unwrap_or_else(|| fallback.clone()),
        None => alias.clone(),
    };

    (alias, remote_id)
}

/// Derive `(alias, remote_id)` for an item returned by a remote listing.
///
/// The alias comes from the alias attribute, else the id attribute. An item
/// with neither is rejected.
pub fn resolve_list_item_identity(
    payload: &Value,
    metadata: &ResourceMetadata,
) -> Result<(String, String)> {
    let alias = metadata
        .alias_attribute()
        .and_then(|attr| lookup_scalar_attribute(payload, attr))
        .or_else(|| {
            metadata
                .id_attribute()
                .and_then(|attr| lookup_scalar_attribute(payload, attr))
        })
        .ok_or_else(|| {
            Error::validation("list item alias could not be resolved from metadata attributes")
        })?;

    let remote_id = metadata
        .id_attribute()
        .and_then(|attr| trimmed_attribute(payload, attr))
        .unwrap_or_else(|| alias.clone());

    Ok((alias, remote_id))
}

/// Like [`resolve_alias_and_remote_id`], with blank results replaced by the
/// path fallback.
pub(crate) fn resolve_resource_identity(
    logical_path: &str,
    metadata: &ResourceMetadata,
    payload: &Value,
) -> (String, String) {
    let (alias, remote_id) = resolve_alias_and_remote_id(logical_path, metadata, payload);
    let alias = match alias.trim() {
        "" => last_segment(logical_path),
        trimmed => trimmed.to_string(),
    };
    let remote_id = match remote_id.trim() {
        "" => alias.clone(),
        trimmed => trimmed.to_string(),
    };
    (alias, remote_id)
}

/// Configured identity attributes followed by common identifier names,
/// without duplicates.
pub fn identity_attribute_candidates(metadata: &ResourceMetadata) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::with_capacity(9);
    let configured = [
        metadata.id_from_attribute.as_str(),
        metadata.alias_from_attribute.as_str(),
    ];
    for attr in configured.into_iter().chain(FALLBACK_IDENTITY_ATTRIBUTES) {
        let trimmed = attr.trim();
        if !trimmed.is_empty() && !candidates.iter().any(|c| c == trimmed) {
            candidates.push(trimmed.to_string());
        }
    }
    candidates
}

/// The segment a fallback search looks for: the requested remote id, else
/// the last path segment.
pub(crate) fn requested_segment(logical_path: &str, remote_id: &str) -> String {
    match remote_id.trim() {
        "" => last_segment(logical_path),
        trimmed => trimmed.to_string(),
    }
}

/// Whether a candidate is the resource requested as `requested`.
///
/// Matches on the candidate's alias, its remote id, or any identity
/// attribute value in its payload.
pub(crate) fn matches_fallback_identity(
    requested: &str,
    metadata: &ResourceMetadata,
    candidate_alias: &str,
    candidate_remote_id: &str,
    candidate_payload: &Value,
) -> bool {
    if requested.is_empty() {
        return false;
    }
    if candidate_remote_id.trim() == requested || candidate_alias.trim() == requested {
        return true;
    }
    if !candidate_payload.is_object() {
        return false;
    }
    identity_attribute_candidates(metadata)
        .iter()
        .filter_map(|attr| trimmed_attribute(candidate_payload, attr))
        .any(|value| value == requested)
}

fn trimmed_attribute(payload: &Value, attribute: &str) -> Option<String> {
    lookup_scalar_attribute(payload, attribute)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
