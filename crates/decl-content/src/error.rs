//! Error types for decl-content

/// Result type for decl-content operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in decl-content operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Pointer is not absolute
    #[error("Invalid compare pointer {pointer:?}")]
    InvalidPointer { pointer: String },

    /// Pointer walks into a container of the wrong kind
    #[error("Compare pointer {pointer:?} expects {expected} segment")]
    PointerShape { pointer: String, expected: String },
}

impl Error {
    pub fn invalid_pointer(pointer: impl Into<String>) -> Self {
        Self::InvalidPointer {
            pointer: pointer.into(),
        }
    }
}
