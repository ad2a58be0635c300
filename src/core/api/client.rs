use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;
use zeroize::Zeroize;

use super::types::{ApiErrorBody, CreateTemporaryTokenParams, TemporaryTokenResponse, UploadedFile};
use crate::errors::{ApiError, ApiResult};
use crate::utils::tls::ensure_crypto_provider;

// =============================================================================
// Constants
// =============================================================================

/// Default REST endpoint
pub const DEFAULT_API_URL: &str = "https://api.assemblyai.com";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// User-Agent header value for API requests.
const USER_AGENT: &str = concat!("streamscribe/", env!("CARGO_PKG_VERSION"));

const UPLOAD_PATH: &str = "v2/upload";
const REALTIME_TOKEN_PATH: &str = "v2/realtime/token";

// =============================================================================
// ApiClient
// =============================================================================

/// HTTP client for the REST API.
pub struct ApiClient {
    http_client: Client,
    /// Always ends with `/` so relative paths join under it
    base_url: Url,
    api_key: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(api_key: impl Into<String>) -> ApiResult<Self> {
        Self::with_base_url(api_key, DEFAULT_API_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: &str) -> ApiResult<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ApiError::ConfigurationError(
                "API key is required".to_string(),
            ));
        }

        let mut base_url = Url::parse(base_url).map_err(|e| {
            ApiError::ConfigurationError(format!("Invalid API base URL '{base_url}': {e}"))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ApiError::ConfigurationError(format!(
                "API base URL must be http or https, got {}",
                base_url.scheme()
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        ensure_crypto_provider();

        let http_client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                ApiError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            http_client,
            base_url,
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Upload raw media and return the private URL it is stored under.
    pub async fn upload(&self, data: impl Into<Bytes>) -> ApiResult<String> {
        let data = data.into();
        let len = data.len();

        let response = self
            .http_client
            .post(self.endpoint(UPLOAD_PATH)?)
            .header(AUTHORIZATION, &self.api_key)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(data)
            .send()
            .await
            .map_err(|e| ApiError::NetworkError(format!("Upload request failed: {e}")))?;

        let uploaded: UploadedFile = read_json(response).await?;
        debug!("Uploaded {} bytes", len);
        Ok(uploaded.upload_url)
    }

    /// Mint a temporary token valid for `expires_in` seconds.
    ///
    /// The token authenticates a real-time session without exposing the API key.
    pub async fn create_temporary_token(&self, expires_in: u64) -> ApiResult<String> {
        let params = CreateTemporaryTokenParams { expires_in };

        let response = self
            .http_client
            .post(self.endpoint(REALTIME_TOKEN_PATH)?)
            .header(AUTHORIZATION, &self.api_key)
            .json(&params)
            .send()
            .await
            .map_err(|e| ApiError::NetworkError(format!("Token request failed: {e}")))?;

        let issued: TemporaryTokenResponse = read_json(response).await?;
        debug!("Issued temporary token valid for {}s", expires_in);
        Ok(issued.token)
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base_url.join(path).map_err(|e| {
            ApiError::ConfigurationError(format!("Invalid endpoint path '{path}': {e}"))
        })
    }
}

impl Drop for ApiClient {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

/// Decode a success body, or turn a failure status into [`ApiError::Api`].
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ApiError::NetworkError(format!("Failed to read response: {e}")))?;

    if !status.is_success() {
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| {
                if body.is_empty() {
                    status.canonical_reason().unwrap_or("unknown error").to_string()
                } else {
                    body.clone()
                }
            });

        warn!("API request failed with {}: {}", status, message);
        return Err(ApiError::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body)
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {e}")))
}
