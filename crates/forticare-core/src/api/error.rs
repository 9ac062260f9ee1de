use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Caller-fixable setup problem: missing credentials, or no token while
    /// auto-login is disabled.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Authentication failed (HTTP {status}): {description}")]
    Authentication { status: u16, description: String },

    #[error("Session expired (HTTP {status}): {message}")]
    SessionExpired { status: u16, message: String },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Unexpected response from {endpoint}: missing `{key}`")]
    UnexpectedResponse { endpoint: String, key: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// True for the only failure the executor recovers from on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::SessionExpired { .. })
    }

    /// HTTP status carried by the error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Authentication { status, .. }
            | ApiError::SessionExpired { status, .. }
            | ApiError::Http { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
