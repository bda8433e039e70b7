//! Reconciliation engine for declarative resource sync
//!
//! Compares resources kept as files in a local repository with their live
//! counterparts behind a REST-like API and pushes changes between them.
//!
//! - **Identity**: alias and remote id derivation from payloads
//! - **Local resolution**: literal lookup with identity fallback
//! - **Remote resolution**: direct lookup, ancestor identity rewriting,
//!   collection detection and collection-list fallback
//! - **Operations**: get, apply, create, update, delete, diff and listing
//!
//! # Architecture
//!
//! ```text
//!                  Reconciler
//!                      |
//!      +---------------+----------------+
//!      |               |                |
//!  LocalStore    RemoteService    MetadataService    (injected traits)
//!      |
//!  decl-core ---> decl-meta ---> decl-content
//!            \--> decl-fs
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod store;
pub mod traits;

mod describe;
mod local;
mod operations;
mod reconciler;
mod remote;
mod render;

pub use config::ReconcilerConfig;
pub use error::{Error, ErrorKind, Result};
pub use reconciler::Reconciler;
pub use store::FsResourceStore;
pub use traits::{
    ListPolicy, LocalStore, MetadataService, RemoteService, ResourceResolver, SecretProvider,
};

pub use decl_content::{DiffEntry, DiffOperation};
pub use decl_meta::{Operation, OperationSpec, ResourceDescriptor, ResourceMetadata};
