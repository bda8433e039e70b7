//! Scalar extraction from payload trees

use serde_json::Value;

/// Canonical string form of a scalar value.
///
/// Integral numbers render without a fraction, other numbers in their
/// shortest decimal form, booleans as `true`/`false`. Empty strings,
/// null and containers yield `None`.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().map(|f| f.to_string())
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Look up a scalar under a dotted attribute path such as `spec.nested.slug`.
///
/// Every step must traverse an object. Blank attributes or blank segments
/// never match.
///
/// ```
/// use decl_content::lookup_scalar_attribute;
/// use serde_json::json;
///
/// let payload = json!({"spec": {"id": 42, "slug": "acme"}});
/// assert_eq!(lookup_scalar_attribute(&payload, "spec.slug"), Some("acme".into()));
/// assert_eq!(lookup_scalar_attribute(&payload, "spec.id"), Some("42".into()));
/// assert_eq!(lookup_scalar_attribute(&payload, "spec"), None);
/// ```
pub fn lookup_scalar_attribute(payload: &Value, attribute: &str) -> Option<String> {
    let attribute = attribute.trim();
    if attribute.is_empty() {
        return None;
    }

    let mut current = payload;
    for segment in attribute.split('.') {
        let segment = segment.trim();
        if segment.is_empty() {
            return None;
        }
        current = match current {
            Value::Object(map) => map.get(segment)?,
            _ => return None,
        };
    }
    scalar_string(current)
}
