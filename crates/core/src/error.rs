#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Transient, retryable unavailability of the generation backend.
    #[error("{0}")]
    Overloaded(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<crate::simulator::OverloadError> for CoreError {
    fn from(err: crate::simulator::OverloadError) -> Self {
        CoreError::Overloaded(err.to_string())
    }
}

impl From<crate::artifact::StorageError> for CoreError {
    fn from(err: crate::artifact::StorageError) -> Self {
        CoreError::Storage(err.to_string())
    }
}
