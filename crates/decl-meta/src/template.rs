//! `{{.name}}` template rendering and operation spec resolution

use crate::path::{clean_path, join_paths};
use crate::{Error, Operation, OperationSpec, ResourceMetadata, Result, TemplateScope};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static ACTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{(-?)\s*(.*?)\s*(-?)\}\}").unwrap());

static FIELD_CHAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\.([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)$").unwrap()
});

/// Render `raw`, replacing each `{{ .a.b }}` action with the scalar found in
/// `scope`.
///
/// Text without `{{` is returned as is. `{{-` and `-}}` trim the whitespace
/// before and after the action. Missing keys, non-scalar values and anything
/// other than a field chain are errors.
///
/// ```
/// use decl_meta::{TemplateScope, render_template};
/// use serde_json::json;
///
/// let scope = TemplateScope::from_value(&json!({"realm": "acme", "spec": {"port": 8080}}));
/// let rendered = render_template("path", "/realms/{{.realm}}:{{ .spec.port }}", &scope).unwrap();
/// assert_eq!(rendered, "/realms/acme:8080");
/// ```
pub fn render_template(field: &str, raw: &str, scope: &TemplateScope) -> Result<String> {
    if !raw.contains("{{") {
        return Ok(raw.to_string());
    }

    let mut rendered = String::with_capacity(raw.len());
    let mut last = 0;
    let mut trim_next = false;
    for caps in ACTION.captures_iter(raw) {
        let Some(whole) = caps.get(0) else { continue };
        let mut literal = &raw[last..whole.start()];
        if trim_next {
            literal = literal.trim_start();
        }
        if !caps[1].is_empty() {
            literal = literal.trim_end();
        }
        push_literal(field, &mut rendered, literal)?;
        rendered.push_str(&evaluate(field, &caps[2], scope)?);
        trim_next = !caps[3].is_empty();
        last = whole.end();
    }
    let tail = &raw[last..];
    push_literal(field, &mut rendered, if trim_next { tail.trim_start() } else { tail })?;
    Ok(rendered)
}

fn push_literal(field: &str, out: &mut String, literal: &str) -> Result<()> {
    if literal.contains("{{") {
        return Err(Error::template(field, "unclosed action"));
    }
    out.push_str(literal);
    Ok(())
}

fn evaluate(field: &str, expression: &str, scope: &TemplateScope) -> Result<String> {
    let Some(caps) = FIELD_CHAIN.captures(expression) else {
        return Err(Error::template(
            field,
            format!("unsupported expression {:?}", expression),
        ));
    };

    let mut keys = caps[1].split('.');
    let first = keys.next().unwrap_or_default();
    let mut current = scope
        .get(first)
        .ok_or_else(|| Error::template(field, format!("map has no entry for key {:?}", first)))?;
    for key in keys {
        current = match current {
            Value::Object(map) => map.get(key).ok_or_else(|| {
                Error::template(field, format!("map has no entry for key {:?}", key))
            })?,
            _ => {
                return Err(Error::template(
                    field,
                    format!("cannot access {:?} on a non-object", key),
                ));
            }
        };
    }

    match current {
        Value::String(s) => Ok(s.clone()),
        Value::Number(_) | Value::Bool(_) => {
            Ok(decl_content::scalar_string(current).unwrap_or_default())
        }
        _ => Err(Error::template(
            field,
            format!("{:?} does not render to a scalar", expression),
        )),
    }
}

/// Render the effective collection path: the metadata template, else the
/// scope's `collectionPath`. Empty when neither is set.
pub fn resolve_collection_path(raw: &str, scope: &TemplateScope) -> Result<String> {
    let candidate = match raw.trim() {
        "" => scope.get_str("collectionPath").unwrap_or_default().trim(),
        trimmed => trimmed,
    };
    if candidate.is_empty() {
        return Ok(String::new());
    }
    let rendered = render_template("collectionPath", candidate, scope)?;
    Ok(normalize_rendered_path(&rendered))
}

/// Resolve the fully rendered spec for `operation`.
///
/// Resource-level filter, suppress and filter expression form the base; the
/// operation's own spec overlays it. A missing path falls back to the
/// operation default, and `.`-relative paths are joined onto the rendered
/// collection path.
pub fn resolve_operation_spec(
    metadata: &ResourceMetadata,
    operation: Operation,
    scope: &TemplateScope,
) -> Result<OperationSpec> {
    let mut scope = scope.clone();
    let collection_path = resolve_collection_path(&metadata.collection_path, &scope)?;
    scope.insert("collectionPath", collection_path.clone());

    let base = OperationSpec {
        filter: metadata.filter.clone(),
        suppress: metadata.suppress.clone(),
        jq: metadata.jq.clone(),
        ..Default::default()
    };
    let mut spec = match metadata.operation(operation) {
        Some(op_spec) => base.merge(op_spec),
        None => base,
    };
    if spec.path.trim().is_empty() {
        spec.path = operation.default_path_template().to_string();
    }

    let mut rendered = render_spec(&spec, &scope)?;
    rendered.path = resolve_rendered_path(&rendered.path, &collection_path)?;
    if rendered.path.trim().is_empty() {
        return Err(Error::EmptyOperationPath {
            operation: operation.to_string(),
        });
    }
    Ok(rendered)
}

fn render_spec(spec: &OperationSpec, scope: &TemplateScope) -> Result<OperationSpec> {
    let mut rendered = spec.clone();
    rendered.method = render_template("method", &spec.method, scope)?;
    rendered.path = render_template("path", &spec.path, scope)?;
    rendered.accept = render_template("accept", &spec.accept, scope)?;
    rendered.content_type = render_template("contentType", &spec.content_type, scope)?;
    rendered.jq = render_template("jq", &spec.jq, scope)?;
    if let Some(query) = rendered.query.as_mut() {
        for (key, value) in query.iter_mut() {
            *value = render_template(&format!("query.{}", key), value, scope)?;
        }
    }
    if let Some(headers) = rendered.headers.as_mut() {
        for (key, value) in headers.iter_mut() {
            *value = render_template(&format!("headers.{}", key), value, scope)?;
        }
    }
    Ok(rendered)
}

fn resolve_rendered_path(raw: &str, collection_path: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if !trimmed.starts_with('.') {
        return Ok(normalize_rendered_path(trimmed));
    }
    if collection_path.trim().is_empty() {
        return Err(Error::MissingCollectionContext {
            path: trimmed.to_string(),
        });
    }
    Ok(join_paths(collection_path, trimmed))
}

fn normalize_rendered_path(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        clean_path(trimmed)
    }
}
