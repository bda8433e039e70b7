//! Resource addressing and metadata for declarative resource sync
//!
//! # Layers
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │ registry   selector -> ResourceMetadata     │
//! ├────────────────────────────────────────────┤
//! │ scope      logical path + payload -> vars   │
//! │ template   {{.var}} rendering, op specs     │
//! ├────────────────────────────────────────────┤
//! │ openapi    documented-path inference        │
//! │ model      ResourceMetadata, OperationSpec  │
//! │ resource   ResourceDescriptor               │
//! │ path       logical path normalization       │
//! └────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod model;
pub mod openapi;
pub mod path;
pub mod registry;
pub mod resource;
pub mod scope;
pub mod template;

pub use error::{Error, Result};
pub use model::{Operation, OperationSpec, ResourceMetadata, ValidationSpec};
pub use registry::MetadataRegistry;
pub use resource::ResourceDescriptor;
pub use scope::{TemplateScope, build_resource_scope, derive_path_template_fields};
pub use template::{render_template, resolve_operation_spec};
