//! Slash pointers into payload trees
//!
//! A pointer is `/`-separated, absolute, with `~` escaped as `~0` and `/`
//! escaped as `~1` inside a token. The empty pointer and `/` both address
//! the root.
//!
//! ```
//! use decl_content::pointer::{lookup, parse_pointer};
//! use serde_json::json;
//!
//! let value = json!({"spec": {"a/b": [10, 20]}});
//! let tokens = parse_pointer("/spec/a~1b/1").unwrap();
//! assert_eq!(lookup(&value, &tokens), Some(&json!(20)));
//! ```

use crate::{Error, Result};
use serde_json::Value;
use std::collections::BTreeSet;

/// Escape a single token for inclusion in a pointer.
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

pub fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Split a pointer into unescaped tokens. Root yields no tokens.
pub fn parse_pointer(pointer: &str) -> Result<Vec<String>> {
    let trimmed = pointer.trim();
    if trimmed.is_empty() || trimmed == "/" {
        return Ok(Vec::new());
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Err(Error::invalid_pointer(pointer));
    };
    Ok(rest.split('/').map(unescape_token).collect())
}

/// Trim, default blanks to `/`, reject relative pointers, dedupe and sort.
pub fn normalize_pointers<S: AsRef<str>>(pointers: &[S]) -> Result<Vec<String>> {
    let mut normalized = BTreeSet::new();
    for pointer in pointers {
        let raw = pointer.as_ref();
        let value = match raw.trim() {
            "" => "/",
            trimmed => trimmed,
        };
        if !value.starts_with('/') {
            return Err(Error::invalid_pointer(raw));
        }
        normalized.insert(value.to_string());
    }
    Ok(normalized.into_iter().collect())
}

/// Parse a token as an array index. Only plain ASCII digits qualify.
pub fn array_index(token: &str) -> Option<usize> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Resolve tokens against a value.
pub fn lookup<'a>(value: &'a Value, tokens: &[String]) -> Option<&'a Value> {
    tokens.iter().try_fold(value, |current, token| match current {
        Value::Object(map) => map.get(token),
        Value::Array(items) => array_index(token).and_then(|idx| items.get(idx)),
        _ => None,
    })
}

/// Remove the location addressed by non-empty tokens.
///
/// Missing locations and type mismatches leave the value untouched.
/// Returns whether something was removed.
pub fn remove(value: &mut Value, tokens: &[String]) -> bool {
    let Some((last, parents)) = tokens.split_last() else {
        return false;
    };

    let mut current = value;
    for token in parents {
        let next = match current {
            Value::Object(map) => map.get_mut(token),
            Value::Array(items) => array_index(token).and_then(|idx| items.get_mut(idx)),
            _ => None,
        };
        match next {
            Some(next) => current = next,
            None => return false,
        }
    }

    match current {
        Value::Object(map) => map.remove(last).is_some(),
        Value::Array(items) => match array_index(last) {
            Some(idx) if idx < items.len() => {
                items.remove(idx);
                true
            }
            _ => false,
        },
        _ => false,
    }
}

/// Join escaped tokens onto a parent pointer.
pub fn child_pointer(parent: &str, token: &str) -> String {
    format!("{}/{}", parent, escape_token(token))
}
