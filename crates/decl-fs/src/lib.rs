//! Filesystem primitives for declarative resource sync
//!
//! Provides slash-normalized paths, locked atomic writes and
//! extension-driven document encoding for resource and config files.

pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use format::DocumentFormat;
pub use path::NormalizedPath;
