use thiserror::Error;

/// Error taxonomy shared by the storage ports and the services built on
/// top of them. Handlers map these onto HTTP status codes; the quiz
/// runtime decides per call whether a failure is fatal or advisory.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A required field is missing or malformed. The operation was not
    /// attempted and no partial write happened.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An id did not resolve to a known session, module, question or group.
    #[error("{0} not found")]
    NotFound(String),

    /// The underlying store cannot be reached. Never retried inside the
    /// core; the caller decides.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A mutation was attempted against a read-only source.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        StoreError::NotFound(what.into())
    }

    pub fn unsupported(what: impl Into<String>) -> Self {
        StoreError::Unsupported(what.into())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::StorageUnavailable(err.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::StorageUnavailable(err.to_string())
    }
}
