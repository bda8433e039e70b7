//! Shared test utilities for the declarative resource sync workspace.
//!
//! Dev-dependency only; never published.
//!
//! # Modules
//!
//! - [`fakes`]: in-memory recording collaborators for the reconciler
//! - [`repo`]: [`TestRepository`] temporary resource repository

pub mod fakes;
pub mod repo;

pub use fakes::{FakeMetadata, FakeRemote, FakeSecrets, FakeStore};
pub use repo::TestRepository;

use decl_meta::ResourceDescriptor;
use serde_json::Value;

/// A listed resource with its identity and payload already resolved, as a
/// remote listing returns it.
pub fn listed(logical_path: &str, alias: &str, remote_id: &str, payload: Value) -> ResourceDescriptor {
    ResourceDescriptor::listed(logical_path, alias)
        .with_remote_id(remote_id)
        .with_payload(payload)
}
