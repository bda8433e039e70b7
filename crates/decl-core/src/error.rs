//! Error types for decl-core

/// Result type for decl-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Classification used by the resolution fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    PayloadShape,
    Other,
}

/// Errors that can occur in decl-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Nothing matched after every fallback was exhausted
    #[error("Not found: {0}")]
    NotFound(String),

    /// More than one candidate matched an identifier
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Malformed input or missing collaborator
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A listing response was not a list of resources
    #[error("Unexpected list payload shape: {0}")]
    PayloadShape(String),

    /// Opaque failure raised by a collaborator
    #[error("Collaborator error: {0}")]
    Collaborator(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Fs(#[from] decl_fs::Error),

    #[error(transparent)]
    Content(#[from] decl_content::Error),

    #[error(transparent)]
    Meta(#[from] decl_meta::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn payload_shape(message: impl Into<String>) -> Self {
        Self::PayloadShape(message.into())
    }

    pub fn collaborator(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Collaborator(source.into())
    }

    /// Build an error of the given kind. `Other` becomes a collaborator error.
    pub fn of_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::PayloadShape => Self::PayloadShape(message),
            ErrorKind::Other => Self::collaborator(message),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Validation(_) | Self::Content(_) | Self::Meta(_) | Self::Json(_) => {
                ErrorKind::Validation
            }
            Self::PayloadShape(_) => ErrorKind::PayloadShape,
            Self::Fs(decl_fs::Error::Io { .. } | decl_fs::Error::LockFailed { .. }) => {
                ErrorKind::Other
            }
            Self::Fs(_) => ErrorKind::Validation,
            Self::Collaborator(_) => ErrorKind::Other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// Errors a best-effort probe may swallow. Conflicts never qualify.
    pub fn is_inapplicable_probe(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NotFound | ErrorKind::PayloadShape | ErrorKind::Validation
        )
    }
}
