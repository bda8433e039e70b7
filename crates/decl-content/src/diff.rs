//! Pointer-addressed structural diff between local and remote trees

use crate::pointer::child_pointer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Kind of change needed to turn the local tree into the remote tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffOperation {
    /// Present only remotely
    Add,
    /// Present only locally
    Remove,
    /// Present on both sides with different values
    Replace,
}

impl DiffOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Replace => "replace",
        }
    }
}

impl fmt::Display for DiffOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One difference between the desired and the actual state of a resource.
///
/// An empty `pointer` means the whole value differs. The absent side of an
/// add or remove is `Value::Null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub resource_path: String,
    pub pointer: String,
    pub operation: DiffOperation,
    pub local: Value,
    pub remote: Value,
}

/// Compute the diff entries for `resource_path`.
///
/// Objects are compared over the sorted union of their keys, arrays by
/// index up to the longer length. Any other mismatch, including a type
/// change, is a single replace at the current pointer.
pub fn build_diff_entries(resource_path: &str, local: &Value, remote: &Value) -> Vec<DiffEntry> {
    let mut entries = Vec::new();
    collect(&mut entries, resource_path, String::new(), local, remote);
    entries
}

/// Order entries by resource path, then pointer, then operation.
pub fn sort_diff_entries(entries: &mut [DiffEntry]) {
    entries.sort_by(|a, b| {
        a.resource_path
            .cmp(&b.resource_path)
            .then_with(|| a.pointer.cmp(&b.pointer))
            .then_with(|| a.operation.cmp(&b.operation))
    });
}

fn collect(
    entries: &mut Vec<DiffEntry>,
    resource_path: &str,
    pointer: String,
    local: &Value,
    remote: &Value,
) {
    if local == remote {
        return;
    }

    match (local, remote) {
        (Value::Object(local_obj), Value::Object(remote_obj)) => {
            let keys: BTreeSet<&String> = local_obj.keys().chain(remote_obj.keys()).collect();
            for key in keys {
                let next = child_pointer(&pointer, key);
                match (local_obj.get(key), remote_obj.get(key)) {
                    (Some(l), Some(r)) => collect(entries, resource_path, next, l, r),
                    (Some(l), None) => {
                        push(entries, resource_path, next, DiffOperation::Remove, l, &Value::Null)
                    }
                    (None, Some(r)) => {
                        push(entries, resource_path, next, DiffOperation::Add, &Value::Null, r)
                    }
                    (None, None) => {}
                }
            }
        }
        (Value::Array(local_arr), Value::Array(remote_arr)) => {
            let max_len = local_arr.len().max(remote_arr.len());
            for idx in 0..max_len {
                let next = format!("{}/{}", pointer, idx);
                match (local_arr.get(idx), remote_arr.get(idx)) {
                    (Some(l), Some(r)) => collect(entries, resource_path, next, l, r),
                    (Some(l), None) => {
                        push(entries, resource_path, next, DiffOperation::Remove, l, &Value::Null)
                    }
                    (None, Some(r)) => {
                        push(entries, resource_path, next, DiffOperation::Add, &Value::Null, r)
                    }
                    (None, None) => {}
                }
            }
        }
        _ => push(entries, resource_path, pointer, DiffOperation::Replace, local, remote),
    }
}

fn push(
    entries: &mut Vec<DiffEntry>,
    resource_path: &str,
    pointer: String,
    operation: DiffOperation,
    local: &Value,
    remote: &Value,
) {
    entries.push(DiffEntry {
        resource_path: resource_path.to_string(),
        pointer,
        operation,
        local: local.clone(),
        remote: remote.clone(),
    });
}
