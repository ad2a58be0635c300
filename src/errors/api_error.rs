use thiserror::Error;

/// Result type for service API calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by the request/response service API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Request could not be sent or the response body could not be read
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client could not be constructed
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl ApiError {
    /// HTTP status for service-side failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
