use thiserror::Error;

use super::ApiError;

/// Errors raised while loading [`Settings`](crate::config::Settings).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("Failed to parse YAML config: {0}")]
    ParseFailed(String),

    #[error("Invalid value for {name}: {message}")]
    InvalidValue { name: &'static str, message: String },

    #[error("API key is required (set ASSEMBLYAI_API_KEY or assemblyai.api_key)")]
    MissingApiKey,

    #[error(transparent)]
    Api(#[from] ApiError),
}
