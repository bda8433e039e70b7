//! Allow-list and deny-list pointer transforms applied before comparison

use crate::pointer::{self, array_index};
use crate::Result;
use serde_json::{Map, Value};

/// Keep only the locations named by `pointers`.
///
/// Matched values are grafted into a fresh tree that mirrors the input's
/// container kinds along each path; skipped array slots become null. A root
/// pointer keeps the whole value. When nothing matches the result is an
/// empty container of the input's kind, or null for scalars.
pub fn apply_filter_pointers<S: AsRef<str>>(value: &Value, pointers: &[S]) -> Result<Value> {
    let mut result: Option<Value> = None;

    for pointer in pointer::normalize_pointers(pointers)? {
        let tokens = pointer::parse_pointer(&pointer)?;
        if tokens.is_empty() {
            return Ok(value.clone());
        }
        let Some(found) = pointer::lookup(value, &tokens) else {
            continue;
        };
        let target = result.get_or_insert(Value::Null);
        graft(target, value, &tokens, found.clone());
    }

    Ok(match result {
        Some(result) => result,
        None => match value {
            Value::Array(_) => Value::Array(Vec::new()),
            Value::Object(_) => Value::Object(Map::new()),
            _ => Value::Null,
        },
    })
}

/// Delete the locations named by `pointers`. A root pointer yields null.
pub fn apply_suppress_pointers<S: AsRef<str>>(value: &Value, pointers: &[S]) -> Result<Value> {
    let mut working = value.clone();
    for pointer in pointer::normalize_pointers(pointers)? {
        let tokens = pointer::parse_pointer(&pointer)?;
        if tokens.is_empty() {
            return Ok(Value::Null);
        }
        pointer::remove(&mut working, &tokens);
    }
    Ok(working)
}

/// Filter, then suppress. Empty lists are skipped.
pub fn apply_compare_transforms<S: AsRef<str>>(
    value: &Value,
    filter: &[S],
    suppress: &[S],
) -> Result<Value> {
    let filtered = if filter.is_empty() {
        value.clone()
    } else {
        apply_filter_pointers(value, filter)?
    };
    if suppress.is_empty() {
        return Ok(filtered);
    }
    apply_suppress_pointers(&filtered, suppress)
}

// `source` must contain `tokens`; it decides the container kind at each level.
fn graft(target: &mut Value, source: &Value, tokens: &[String], found: Value) {
    let Some((head, rest)) = tokens.split_first() else {
        *target = found;
        return;
    };

    match source {
        Value::Array(items) => {
            let Some(idx) = array_index(head) else { return };
            let Some(child) = items.get(idx) else { return };
            if !target.is_array() {
                *target = Value::Array(Vec::new());
            }
            if let Value::Array(slots) = target {
                if slots.len() <= idx {
                    slots.resize(idx + 1, Value::Null);
                }
                graft(&mut slots[idx], child, rest, found);
            }
        }
        Value::Object(fields) => {
            let Some(child) = fields.get(head) else { return };
            if !target.is_object() {
                *target = Value::Object(Map::new());
            }
            if let Value::Object(map) = target {
                let slot = map.entry(head.clone()).or_insert(Value::Null);
                graft(slot, child, rest, found);
            }
        }
        _ => {}
    }
}
