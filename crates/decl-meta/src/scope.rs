//! Template scopes
//!
//! A scope maps template variable names to values for one resolution. It
//! is seeded from a resource descriptor and enriched with bindings derived
//! by matching the logical path against the configured path templates.

use crate::path::{collection_path_for, join_paths, split_segments};
use crate::{ResourceDescriptor, ResourceMetadata};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static PLACEHOLDER_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{\{\s*\.([a-zA-Z_][a-zA-Z0-9_]*)\s*\}\}$").unwrap());

static RESOURCE_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"resource\(\s*"((?:[^"\\]|\\.)*)"\s*\)"#).unwrap());

/// Variable bindings for template rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateScope {
    vars: Map<String, Value>,
}

impl TemplateScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope for rendering against a bare value: its top-level keys plus
    /// `payload` and `value`.
    pub fn from_value(value: &Value) -> Self {
        let mut scope = Self::new();
        if let Value::Object(map) = value {
            scope.vars.extend(map.clone());
        }
        scope.insert("payload", value.clone());
        scope.insert("value", value.clone());
        scope
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.vars.get(key).and_then(Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(key.into(), value.into());
    }

    /// The scope as a JSON object.
    pub fn into_value(self) -> Value {
        Value::Object(self.vars)
    }
}

/// Seed a scope from the identity and payload of a resource.
///
/// Top-level payload keys are flattened into the scope and shadow the
/// seeded names.
pub fn build_operation_scope(
    logical_path: &str,
    collection_path: &str,
    alias: &str,
    remote_id: &str,
    payload: &Value,
) -> TemplateScope {
    let mut scope = TemplateScope::new();
    scope.insert("logicalPath", logical_path);
    scope.insert("collectionPath", collection_path);
    scope.insert("alias", alias);
    scope.insert("remoteID", remote_id);
    scope.insert("payload", payload.clone());
    scope.insert("value", payload.clone());
    if !remote_id.trim().is_empty() {
        scope.insert("id", remote_id);
    }
    if let Value::Object(map) = payload {
        scope.vars.extend(map.clone());
        scope.insert("payload", payload.clone());
        scope.insert("value", payload.clone());
    }
    scope
}

/// Full scope for a resource, including path-template bindings.
///
/// Derived bindings never replace existing keys. They are also added to
/// the `payload` and `value` objects when the payload is an object.
pub fn build_resource_scope(descriptor: &ResourceDescriptor) -> TemplateScope {
    let collection_path = if descriptor.collection_path.trim().is_empty() {
        collection_path_for(&descriptor.logical_path)
    } else {
        descriptor.collection_path.clone()
    };
    let mut scope = build_operation_scope(
        &descriptor.logical_path,
        &collection_path,
        &descriptor.local_alias,
        &descriptor.remote_id,
        &descriptor.payload,
    );

    let derived = derive_path_template_fields(&descriptor.logical_path, &descriptor.metadata);
    for (key, value) in derived {
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() || scope.contains(key) {
            continue;
        }
        scope.insert(key, value);
        for name in ["payload", "value"] {
            if let Some(Value::Object(map)) = scope.vars.get_mut(name) {
                map.insert(key.to_string(), Value::String(value.to_string()));
            }
        }
    }
    scope
}

/// Bindings obtained by positionally matching `logical_path` against the
/// metadata's templates.
///
/// Sources, first binding wins: the collection template (or the parent
/// path), every operation path in operation name order, then logical paths
/// passed to `resource("...")` inside filter expressions.
pub fn derive_path_template_fields(
    logical_path: &str,
    metadata: &ResourceMetadata,
) -> BTreeMap<String, String> {
    let mut derived = BTreeMap::new();

    let collection_template = match metadata.collection_path.trim() {
        "" => collection_path_for(logical_path),
        trimmed => trimmed.to_string(),
    };
    merge_first_wins(&mut derived, match_path_template(&collection_template, logical_path));

    for spec in metadata.operations.values() {
        let template = spec.path.trim();
        if template.is_empty() {
            continue;
        }
        let template = if template.starts_with('/') {
            template.to_string()
        } else {
            join_paths(&collection_template, template)
        };
        merge_first_wins(&mut derived, match_path_template(&template, logical_path));
    }

    let expressions = std::iter::once(metadata.jq.as_str())
        .chain(metadata.operations.values().map(|spec| spec.jq.as_str()));
    for expression in expressions {
        merge_first_wins(&mut derived, match_filter_expression(expression, logical_path));
    }

    derived
}

fn match_filter_expression(expression: &str, logical_path: &str) -> BTreeMap<String, String> {
    let mut derived = BTreeMap::new();
    let expression = expression.trim();
    if !expression.contains("{{") || !expression.contains("resource(") {
        return derived;
    }
    for caps in RESOURCE_CALL.captures_iter(expression) {
        let quoted = format!("\"{}\"", &caps[1]);
        let Ok(template) = serde_json::from_str::<String>(&quoted) else {
            continue;
        };
        merge_first_wins(&mut derived, match_path_template(template.trim(), logical_path));
    }
    derived
}

/// Bind placeholder segments of `template` to the segments of `logical_path`.
///
/// A literal segment that differs, or a name bound to two different values,
/// voids the whole template.
fn match_path_template(template: &str, logical_path: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    if !template.contains("{{") {
        return fields;
    }

    let template_segments = split_segments(template);
    let logical_segments = split_segments(logical_path);
    for (template_segment, logical_segment) in template_segments.iter().zip(&logical_segments) {
        match PLACEHOLDER_SEGMENT.captures(template_segment) {
            Some(caps) => {
                let name = caps[1].to_string();
                match fields.get(&name) {
                    Some(existing) if existing != logical_segment => return BTreeMap::new(),
                    _ => {
                        fields.insert(name, logical_segment.to_string());
                    }
                }
            }
            None if template_segment != logical_segment => return BTreeMap::new(),
            None => {}
        }
    }
    fields
}

fn merge_first_wins(destination: &mut BTreeMap<String, String>, source: BTreeMap<String, String>) {
    for (key, value) in source {
        destination.entry(key).or_insert(value);
    }
}
