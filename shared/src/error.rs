use thiserror::Error;

/// Failures of the content read pipeline and its write helpers.
///
/// A missing article is not an error: lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum ContentError {
    /// Content store endpoint or credentials are absent or unusable.
    #[error("content store is not configured: {0}")]
    Configuration(String),
    /// Input rejected on the write path.
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("content store query failed: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("content store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("failed to decode content fixture: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ContentError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ContentError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Whether the failure comes from missing configuration rather than the store.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ContentError::Configuration(_))
    }
}
