//! Repository error types.

/// Errors raised by leg and station collaborators.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The backing store could not be reached
    #[error("repository unavailable: {0}")]
    Unavailable(String),

    /// Stored data could not be interpreted
    #[error("malformed timetable data: {message}")]
    Malformed { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
