//! Error types for flag resolution and storage.

/// Result type for flag operations.
pub type FlagResult<T> = Result<T, FlagError>;

/// Flag resolution and storage errors
#[derive(Debug, thiserror::Error)]
pub enum FlagError {
    /// Override attempted with neither a customer nor a user scope.
    /// Global state goes through `set_global_default` instead.
    #[error("override requires a customer or user scope")]
    InvalidScope,

    /// Feature has never been defined.
    #[error("feature not found: {0}")]
    NotFound(String),

    /// Rename target already exists; merging two defaults is never implicit.
    #[error("feature already exists: {0}")]
    Conflict(String),

    /// Underlying store failure.
    #[error("storage error: {0}")]
    Storage(String),
}
