//! Configuration types for real-time streaming sessions.
//!
//! - Audio encoding selection
//! - Credential resolution (API key header or temporary token query parameter)
//! - Connection URL and query parameter construction

use std::str::FromStr;
use std::time::Duration;

use url::Url;

use super::transcriber::RealtimeTranscriber;
use crate::errors::RealtimeError;

/// Default real-time endpoint
pub const DEFAULT_REALTIME_URL: &str = "wss://api.assemblyai.com/v2/realtime/ws";

/// Minimum supported sample rate (8kHz for telephony)
pub const MIN_SAMPLE_RATE: u32 = 8_000;

/// Maximum supported sample rate
pub const MAX_SAMPLE_RATE: u32 = 48_000;

/// Default bound on dialing plus the handshake read
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Audio Encoding
// =============================================================================

/// Audio encodings accepted by the real-time API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RealtimeEncoding {
    /// PCM signed 16-bit little-endian (default)
    #[default]
    PcmS16le,
    /// PCM mu-law (telephony)
    PcmMulaw,
}

impl RealtimeEncoding {
    /// Convert to the API query parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PcmS16le => "pcm_s16le",
            Self::PcmMulaw => "pcm_mulaw",
        }
    }
}

impl FromStr for RealtimeEncoding {
    type Err = RealtimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pcm_s16le" | "linear16" | "s16le" | "pcm" => Ok(Self::PcmS16le),
            "pcm_mulaw" | "mulaw" | "ulaw" => Ok(Self::PcmMulaw),
            other => Err(RealtimeError::ConfigurationError(format!(
                "Unsupported encoding: {other}. Supported encodings: pcm_s16le, pcm_mulaw"
            ))),
        }
    }
}

// =============================================================================
// Credentials
// =============================================================================

/// How a session authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential<'a> {
    /// Long-lived key sent as the raw `Authorization` header
    ApiKey(&'a str),
    /// Short-lived token sent as the `token` query parameter
    Token(&'a str),
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Connection parameters for one real-time session.
///
/// Read-only once a session connects; the client keeps its own copy. The API
/// key and token are zeroized on drop.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// Endpoint to dial. Only overridden in tests.
    pub base_url: String,

    /// Long-lived API key.
    pub api_key: Option<String>,

    /// Temporary token. Takes precedence over `api_key` when both are set.
    pub token: Option<String>,

    /// Sample rate of the audio that will be sent, in Hz. The parameter is
    /// omitted when `None` and the service assumes 16 kHz.
    pub sample_rate: Option<u32>,

    /// Audio encoding. The parameter is omitted when `None` and the service
    /// assumes `pcm_s16le`.
    pub encoding: Option<RealtimeEncoding>,

    /// Words or phrases to boost recognition of.
    pub word_boost: Vec<String>,

    /// Explicit partial transcript switch. `None` enables partial transcripts
    /// only when a partial transcript callback is registered.
    pub partial_transcripts: Option<bool>,

    /// Explicit extra session information switch. `None` enables it only when
    /// a session information callback is registered.
    pub extra_session_information: Option<bool>,

    /// Upper bound on dialing and the handshake read.
    pub handshake_timeout: Duration,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REALTIME_URL.to_string(),
            api_key: None,
            token: None,
            sample_rate: None,
            encoding: None,
            word_boost: Vec::new(),
            partial_transcripts: None,
            extra_session_information: None,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

impl RealtimeConfig {
    /// Configuration authenticated with a long-lived API key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.api_key = Some(api_key.into());
        config
    }

    /// Configuration authenticated with a temporary token.
    pub fn with_token(token: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.token = Some(token.into());
        config
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    pub fn encoding(mut self, encoding: RealtimeEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn word_boost<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.word_boost = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn partial_transcripts(mut self, enabled: bool) -> Self {
        self.partial_transcripts = Some(enabled);
        self
    }

    pub fn extra_session_information(mut self, enabled: bool) -> Self {
        self.extra_session_information = Some(enabled);
        self
    }

    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Resolve the credential. A token wins over an API key; empty strings
    /// count as absent.
    pub fn credential(&self) -> Option<Credential<'_>> {
        if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
            return Some(Credential::Token(token));
        }
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .map(Credential::ApiKey)
    }

    /// Whether partial transcripts will be requested for this transcriber.
    pub fn partial_transcripts_enabled(&self, transcriber: &RealtimeTranscriber) -> bool {
        self.partial_transcripts
            .unwrap_or_else(|| transcriber.has_partial_transcript_handler())
    }

    /// Whether extra session information will be requested for this transcriber.
    pub fn extra_session_information_enabled(&self, transcriber: &RealtimeTranscriber) -> bool {
        self.extra_session_information
            .unwrap_or_else(|| transcriber.has_session_information_handler())
    }

    /// Check ranges before dialing.
    pub fn validate(&self) -> Result<(), RealtimeError> {
        if self.credential().is_none() {
            return Err(RealtimeError::ConfigurationError(
                "An API key or temporary token is required".to_string(),
            ));
        }

        if let Some(rate) = self
            .sample_rate
            .filter(|rate| !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(rate))
        {
            return Err(RealtimeError::ConfigurationError(format!(
                "Sample rate {} Hz is outside supported range ({}-{} Hz)",
                rate, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE
            )));
        }

        if self.word_boost.iter().any(|w| w.trim().is_empty()) {
            return Err(RealtimeError::ConfigurationError(
                "Word boost entries must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Query parameters for the connection, sorted by key.
    ///
    /// Parameters without a value are left out rather than sent empty.
    pub fn query_params(&self, transcriber: &RealtimeTranscriber) -> Vec<(&'static str, String)> {
        let mut params: Vec<(&'static str, String)> = Vec::with_capacity(6);

        if !self.partial_transcripts_enabled(transcriber) {
            params.push(("disable_partial_transcripts", "true".to_string()));
        }

        if self.extra_session_information_enabled(transcriber) {
            params.push(("enable_extra_session_information", "true".to_string()));
        }

        if let Some(encoding) = self.encoding {
            params.push(("encoding", encoding.as_str().to_string()));
        }

        if let Some(rate) = self.sample_rate {
            params.push(("sample_rate", rate.to_string()));
        }

        if let Some(Credential::Token(token)) = self.credential() {
            params.push(("token", token.to_string()));
        }

        if !self.word_boost.is_empty() {
            // serializing a Vec<String> cannot fail
            if let Ok(json) = serde_json::to_string(&self.word_boost) {
                params.push(("word_boost", json));
            }
        }

        params.sort_by_key(|(key, _)| *key);
        params
    }

    /// Build the WebSocket URL to dial.
    ///
    /// An `http`/`https` base URL is mapped onto `ws`/`wss`.
    pub fn build_url(&self, transcriber: &RealtimeTranscriber) -> Result<Url, RealtimeError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            RealtimeError::ConfigurationError(format!("Invalid base URL {}: {e}", self.base_url))
        })?;

        let scheme = match url.scheme() {
            "ws" | "http" => "ws",
            "wss" | "https" => "wss",
            other => {
                return Err(RealtimeError::ConfigurationError(format!(
                    "Unsupported URL scheme: {other}"
                )));
            }
        };
        if url.scheme() != scheme && url.set_scheme(scheme).is_err() {
            return Err(RealtimeError::ConfigurationError(format!(
                "Cannot use scheme {scheme} with {}",
                self.base_url
            )));
        }

        let params = self.query_params(transcriber);
        url.set_query(None);
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        }

        Ok(url)
    }
}

impl Drop for RealtimeConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.api_key {
            key.zeroize();
        }
        if let Some(ref mut token) = self.token {
            token.zeroize();
        }
    }
}
