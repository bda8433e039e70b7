//! Logical path handling
//!
//! Logical paths address resources independently of the remote URL shape:
//! `/admin/realms/acme/clients/web`. They are always absolute, slash
//! separated, and never end with a slash except for the root `/`.

use crate::{Error, Result};

/// Segment reserved for metadata selectors; never valid in a resource path.
pub const RESERVED_SEGMENT: &str = "_";

/// Validate and clean a logical path.
///
/// ```
/// use decl_meta::path::normalize_logical_path;
///
/// assert_eq!(normalize_logical_path("/a//b/./c/").unwrap(), "/a/b/c");
/// assert_eq!(normalize_logical_path("\\a\\b").unwrap(), "/a/b");
/// assert!(normalize_logical_path("/a/../b").is_err());
/// assert!(normalize_logical_path("/a/_/b").is_err());
/// assert!(normalize_logical_path("a/b").is_err());
/// ```
pub fn normalize_logical_path(value: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(Error::invalid_path(value, "logical path must not be empty"));
    }
    let slashed = value.replace('\\', "/");
    if !slashed.starts_with('/') {
        return Err(Error::invalid_path(value, "logical path must be absolute"));
    }
    for segment in slashed.split('/') {
        if segment == ".." {
            return Err(Error::invalid_path(
                value,
                "logical path must not contain traversal segments",
            ));
        }
        if segment == RESERVED_SEGMENT {
            return Err(Error::invalid_path(
                value,
                "logical path must not contain reserved metadata segment \"_\"",
            ));
        }
    }
    Ok(clean_path(&slashed))
}

/// Lexically clean a slash path into absolute form.
///
/// Empty and `.` segments are dropped and `..` pops the previous segment
/// without climbing above the root.
pub fn clean_path(raw: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for segment in raw.trim().split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }
    format!("/{}", stack.join("/"))
}

/// Join a relative path onto a base and clean the result.
pub fn join_paths(base: &str, relative: &str) -> String {
    let base = match base.trim() {
        "" => "/",
        trimmed => trimmed,
    };
    clean_path(&format!("{}/{}", base, relative.trim()))
}

/// Non-empty segments of a path, ignoring surrounding slashes.
pub fn split_segments(value: &str) -> Vec<&str> {
    let trimmed = value.trim().trim_matches('/');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

/// Parent path of a logical path; the root is its own parent.
pub fn collection_path_for(logical_path: &str) -> String {
    let segments = split_segments(logical_path);
    match segments.split_last() {
        Some((_, parents)) if !parents.is_empty() => format!("/{}", parents.join("/")),
        _ => "/".to_string(),
    }
}

/// Trailing segment of a logical path; `/` for the root.
pub fn last_segment(logical_path: &str) -> String {
    split_segments(logical_path)
        .last()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "/".to_string())
}

/// Join a single child segment onto a collection path.
pub fn join_logical_path(collection_path: &str, segment: &str) -> Result<String> {
    let segment = segment.trim();
    if segment.is_empty() {
        return Err(Error::invalid_path(
            collection_path,
            "logical path segment must not be empty",
        ));
    }
    normalize_logical_path(&join_paths(collection_path, segment))
}

/// The direct child segment of `parent` named by `candidate`, if any.
pub fn child_segment(parent: &str, candidate: &str) -> Option<String> {
    let parent = normalize_logical_path(parent).ok()?;
    let candidate = normalize_logical_path(candidate).ok()?;
    let remaining = if parent == "/" {
        candidate.strip_prefix('/')?
    } else {
        candidate.strip_prefix(&format!("{}/", parent))?
    };
    if remaining.is_empty() || remaining.contains('/') {
        return None;
    }
    Some(remaining.to_string())
}
