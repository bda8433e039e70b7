//! Metadata inference from OpenAPI documents
//!
//! Only the `paths` table is consulted. A documented path like
//! `/admin/realms/{realm}/clients` matches any logical path with the same
//! number of segments whose literal segments agree.

use crate::path::split_segments;
use crate::{Error, Operation, OperationSpec, ResourceMetadata, Result};
use serde_json::Value;
use std::collections::BTreeSet;

/// A documented path split into segments with its lower-cased methods.
struct DocumentedPath<'a> {
    segments: Vec<&'a str>,
    methods: BTreeSet<String>,
}

impl DocumentedPath<'_> {
    fn has(&self, method: &str) -> bool {
        self.methods.contains(method)
    }
}

fn documented_paths(document: &Value) -> Vec<DocumentedPath<'_>> {
    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };
    paths
        .iter()
        .map(|(raw, item)| DocumentedPath {
            segments: split_segments(raw),
            methods: item
                .as_object()
                .map(|methods| methods.keys().map(|m| m.trim().to_lowercase()).collect())
                .unwrap_or_default(),
        })
        .collect()
}

fn parameter_name(segment: &str) -> Option<&str> {
    let segment = segment.trim();
    segment
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

/// Segment-wise match; `{param}` matches any non-empty segment.
pub fn matches_segments(template: &[&str], target: &[&str]) -> bool {
    template.len() == target.len()
        && template.iter().zip(target).all(|(candidate, actual)| {
            let (candidate, actual) = (candidate.trim(), actual.trim());
            candidate == actual || (parameter_name(candidate).is_some() && !actual.is_empty())
        })
}

/// Whether any documented path matches `logical_path`.
pub fn has_openapi_path(document: &Value, logical_path: &str) -> bool {
    let target = split_segments(logical_path);
    documented_paths(document)
        .iter()
        .any(|path| matches_segments(&path.segments, &target))
}

/// The documented path closest to `target`: fewest `{param}` segments,
/// so an exact literal path wins over any template.
fn closest_documented_path<'a>(document: &'a Value, target: &[&str]) -> Option<DocumentedPath<'a>> {
    documented_paths(document)
        .into_iter()
        .filter(|path| matches_segments(&path.segments, target))
        .min_by_key(|path| parameter_count(&path.segments))
}

fn parameter_count(segments: &[&str]) -> usize {
    segments
        .iter()
        .filter(|segment| parameter_name(segment).is_some())
        .count()
}

/// Whether the documented path matching `logical_path` reads and mutates a
/// single resource without accepting `post`.
pub fn path_looks_like_resource(document: &Value, logical_path: &str) -> bool {
    let target = split_segments(logical_path);
    if target.is_empty() {
        return false;
    }
    closest_documented_path(document, &target)
        .is_some_and(|path| {
            path.has("get")
                && ["put", "patch", "delete"].iter().any(|m| path.has(m))
                && !path.has("post")
        })
}

/// Infer metadata for a selector from a document's paths.
///
/// A selector ending in `/` names a collection; otherwise it names a
/// resource inside its parent collection. The collection template becomes
/// `collectionPath`, with `{param}` rewritten to `{{.param}}`, and the
/// documented methods become operations. Item operations address the item
/// as `./{{.id}}` and `id` becomes the identity attribute.
pub fn infer_from_openapi(selector: &str, document: &Value) -> Result<ResourceMetadata> {
    let trimmed = selector.trim();
    let segments = split_segments(trimmed);
    let is_collection = trimmed.ends_with('/') && !segments.is_empty();

    let collection_segments: &[&str] = match (is_collection, segments.split_last()) {
        (true, _) => &segments,
        (false, Some((_, parents))) => parents,
        (false, None) => {
            return Err(Error::OpenApiPathNotFound {
                selector: selector.to_string(),
            });
        }
    };

    let paths = documented_paths(document);
    let collection = paths
        .iter()
        .filter(|path| matches_segments(&path.segments, collection_segments))
        .min_by_key(|path| parameter_count(&path.segments));
    let item = paths
        .iter()
        .filter(|path| {
            path.segments.split_last().is_some_and(|(last, prefix)| {
                parameter_name(last).is_some() && matches_segments(prefix, collection_segments)
            })
        })
        .min_by_key(|path| parameter_count(&path.segments));

    let template_segments: Vec<&str> = match (collection, item) {
        (Some(collection), _) => collection.segments.clone(),
        (None, Some(item)) => item.segments[..item.segments.len() - 1].to_vec(),
        (None, None) => {
            return Err(Error::OpenApiPathNotFound {
                selector: selector.to_string(),
            });
        }
    };

    let mut metadata = ResourceMetadata {
        collection_path: to_metadata_template(&template_segments),
        ..Default::default()
    };

    if let Some(collection) = collection {
        if collection.has("get") {
            metadata.operations.insert(Operation::List, operation("GET", "."));
        }
        if collection.has("post") {
            metadata.operations.insert(Operation::Create, operation("POST", "."));
        }
    }

    if let Some(item) = item {
        metadata.id_from_attribute = "id".to_string();
        let item_path = "./{{.id}}";
        if item.has("get") {
            metadata.operations.insert(Operation::Get, operation("GET", item_path));
        }
        if item.has("put") {
            metadata.operations.insert(Operation::Update, operation("PUT", item_path));
        } else if item.has("patch") {
            metadata.operations.insert(Operation::Update, operation("PATCH", item_path));
        }
        if item.has("delete") {
            metadata.operations.insert(Operation::Delete, operation("DELETE", item_path));
        }
    }

    Ok(metadata)
}

fn operation(method: &str, path: &str) -> OperationSpec {
    OperationSpec {
        method: method.to_string(),
        path: path.to_string(),
        ..Default::default()
    }
}

fn to_metadata_template(segments: &[&str]) -> String {
    let rendered: Vec<String> = segments
        .iter()
        .map(|segment| match parameter_name(segment) {
            Some(name) => format!("{{{{.{}}}}}", template_identifier(name)),
            None => segment.to_string(),
        })
        .collect();
    format!("/{}", rendered.join("/"))
}

fn template_identifier(name: &str) -> String {
    let mut identifier: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if identifier.starts_with(|c: char| c.is_ascii_digit()) {
        identifier.insert(0, '_');
    }
    identifier
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "paths": {
                "/admin/realms/{realm}": {"get": {}, "put": {}, "delete": {}},
                "/admin/realms/{realm}/organizations": {"get": {}, "post": {}},
                "/admin/realms/{realm}/organizations/{org-id}": {"get": {}, "patch": {}, "delete": {}}
            }
        })
    }

    #[rstest]
    #[case("/admin/realms/acme", true)]
    #[case("/admin/realms/acme/organizations", true)]
    #[case("/admin/realms/acme/organizations/o1", true)]
    #[case("/admin/realms", false)]
    #[case("/admin/users/acme", false)]
    fn documented_paths_match_by_segments(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(has_openapi_path(&document(), path), expected);
    }

    #[test]
    fn resource_shaped_paths_have_no_post() {
        assert!(path_looks_like_resource(&document(), "/admin/realms/acme"));
        assert!(!path_looks_like_resource(&document(), "/admin/realms/acme/organizations"));
        assert!(!path_looks_like_resource(&document(), "/"));
    }

    #[test]
    fn exact_documented_path_wins_over_template() {
        let document = json!({
            "paths": {
                "/admin/realms/{realm}": {"get": {}, "post": {}},
                "/admin/realms/ñandu": {"get": {}, "put": {}, "delete": {}}
            }
        });
        assert!(path_looks_like_resource(&document, "/admin/realms/ñandu"));
        assert!(!path_looks_like_resource(&document, "/admin/realms/acme"));
    }

    #[test]
    fn collection_selector_infers_list_create_and_item_ops() {
        let md = infer_from_openapi("/admin/realms/acme/organizations/", &document()).unwrap();
        assert_eq!(md.collection_path, "/admin/realms/{{.realm}}/organizations");
        assert_eq!(md.id_from_attribute, "id");
        assert_eq!(md.operation(Operation::List).unwrap().path, ".");
        assert_eq!(md.operation(Operation::Create).unwrap().method, "POST");
        assert_eq!(md.operation(Operation::Update).unwrap().method, "PATCH");
        assert_eq!(md.operation(Operation::Delete).unwrap().path, "./{{.id}}");
    }

    #[test]
    fn resource_selector_uses_item_prefix_when_collection_is_undocumented() {
        let md = infer_from_openapi("/admin/realms/acme", &document()).unwrap();
        assert_eq!(md.collection_path, "/admin/realms");
        assert!(md.operation(Operation::List).is_none());
        assert_eq!(md.operation(Operation::Get).unwrap().method, "GET");
    }

    #[test]
    fn unmatched_selector_is_an_error() {
        let err = infer_from_openapi("/nothing/here/", &document()).unwrap_err();
        assert!(matches!(err, Error::OpenApiPathNotFound { .. }));
    }

    #[test]
    fn parameter_names_become_identifiers() {
        assert_eq!(to_metadata_template(&["a", "{org-id}"]), "/a/{{.org_id}}");
    }
}
