//! Error types for the doclist crate.

use thiserror::Error;

/// Errors that can occur when talking to the documents service.
///
/// "Nothing found" outcomes (an empty search, a download of a missing
/// resource, a failed upload or delete) are not errors: the client reports
/// them as `None`, `false` or an empty list. Everything here means the
/// operation could not be completed.
#[derive(Error, Debug)]
pub enum DocsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed ({status}): {body}")]
    Auth { status: u16, body: String },

    /// Connection, TLS or timeout failure from any [`Transport`](crate::Transport).
    #[error("HTTP request failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Unsupported upload format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid export format {format:?} for {kind}")]
    InvalidFormat { format: String, kind: String },

    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse credentials JSON: {0}")]
    CredentialsParse(#[from] serde_json::Error),
}

/// Result type alias for DocsError.
pub type Result<T> = std::result::Result<T, DocsError>;

impl DocsError {
    /// Wrap a transport-level failure.
    pub fn transport(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        DocsError::Transport(err.into())
    }
}

impl From<reqwest::Error> for DocsError {
    fn from(err: reqwest::Error) -> Self {
        DocsError::Transport(Box::new(err))
    }
}
