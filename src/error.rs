//! Error handling for cookie-inspector

use thiserror::Error;

/// Main error type for cookie operations
#[derive(Error, Debug)]
pub enum CookieError {
    /// Input rejected before any host call was attempted.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Clipboard or file content is not valid JSON.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The cookie API cannot be reached from the current context.
    #[error("Cookie API is unavailable in this context")]
    HostUnavailable,

    #[error("Write rejected: {0}")]
    WriteRejected(String),

    #[error("Host error: {0}")]
    Host(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

impl CookieError {
    /// Whether the error was raised before any host call took place.
    pub fn is_input_error(&self) -> bool {
        matches!(self, CookieError::Validation(_) | CookieError::Parse(_))
    }
}

/// Result type alias for cookie operations
pub type Result<T> = std::result::Result<T, CookieError>;
