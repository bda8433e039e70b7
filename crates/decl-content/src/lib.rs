//! Tree-value helpers for declarative resource sync
//!
//! Resource payloads are `serde_json::Value` trees. This crate addresses
//! locations inside them with slash pointers (`/spec/items/0`), narrows
//! them with allow-list and deny-list pointer transforms, and computes
//! pointer-addressed structural diffs between a local and a remote tree.

pub mod diff;
pub mod error;
pub mod pointer;
pub mod transform;
pub mod value;

pub use diff::{DiffEntry, DiffOperation, build_diff_entries, sort_diff_entries};
pub use error::{Error, Result};
pub use transform::{apply_compare_transforms, apply_filter_pointers, apply_suppress_pointers};
pub use value::{lookup_scalar_attribute, scalar_string};
