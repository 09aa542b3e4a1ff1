//! Crate-level error types.
//!
//! [`DipwatchError`] unifies every error source (configuration, HTTP,
//! JSON, snapshot storage) behind a single enum so callers can match on the
//! variant they care about while still using the `?` operator for easy
//! propagation.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DipwatchError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum DipwatchError {
    /// An environment variable held a value that could not be used.
    #[error("configuration error: {0}")]
    Config(String),

    /// The HTTP request could not be sent or its body could not be read.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The ticker endpoint answered with a non-success status code.
    #[error("ticker endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The exchange reported an error code in an otherwise valid response.
    #[error("exchange error {code}: {message}")]
    Api { code: String, message: String },

    /// The response parsed as JSON but lacked the expected structure.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Terminal or process I/O failed.
    #[error("io error: {0}")]
    Io(String),

    /// The snapshot store could not be read or written.
    #[error("snapshot storage error: {0}")]
    Storage(String),
}

impl DipwatchError {
    /// Returns `true` for failures caused by an unexpected response body,
    /// as opposed to transport or status failures.
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            DipwatchError::Json(_) | DipwatchError::Api { .. } | DipwatchError::MalformedResponse(_)
        )
    }
}
