//! Request and response bodies for the REST API.

use serde::{Deserialize, Serialize};

/// Response from `POST /v2/upload`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedFile {
    /// Private URL of the uploaded media, usable as a transcription input
    pub upload_url: String,
}

/// Body of `POST /v2/realtime/token`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CreateTemporaryTokenParams {
    /// Token lifetime in seconds
    pub expires_in: u64,
}

/// Response from `POST /v2/realtime/token`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemporaryTokenResponse {
    pub token: String,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
