//! Error types for decl-meta

/// Result type for decl-meta operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in decl-meta operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Logical path failed normalization
    #[error("Invalid logical path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Unsupported metadata operation {0:?}")]
    UnsupportedOperation(String),

    /// Template text could not be parsed or evaluated
    #[error("Invalid metadata template for {field}: {message}")]
    Template { field: String, message: String },

    #[error("Relative metadata path {path:?} requires a collection path")]
    MissingCollectionContext { path: String },

    #[error("Metadata operation {operation} path is required")]
    EmptyOperationPath { operation: String },

    #[error("Invalid metadata selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// No documented OpenAPI path matches a selector
    #[error("No OpenAPI path matches {selector:?}")]
    OpenApiPathNotFound { selector: String },

    #[error(transparent)]
    Fs(#[from] decl_fs::Error),
}

impl Error {
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn template(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            field: field.into(),
            message: message.into(),
        }
    }
}
