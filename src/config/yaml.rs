use serde::Deserialize;
use std::path::Path;

use crate::errors::ConfigError;

/// YAML configuration file.
///
/// Every field is optional; values present here override the environment.
///
/// # Example YAML structure
/// ```yaml
/// assemblyai:
///   api_key: "your-api-key"
///   realtime_url: "wss://api.assemblyai.com/v2/realtime/ws"
///   api_url: "https://api.assemblyai.com"
///
/// realtime:
///   sample_rate: 8000
///   encoding: "pcm_mulaw"
///   word_boost: ["AssemblyAI", "WebSocket"]
///   partial_transcripts: false
///   extra_session_information: true
///   handshake_timeout_secs: 5
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub assemblyai: Option<ServiceYaml>,
    pub realtime: Option<RealtimeYaml>,
}

/// Endpoints and credentials
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServiceYaml {
    pub api_key: Option<String>,
    pub realtime_url: Option<String>,
    pub api_url: Option<String>,
}

/// Session defaults
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RealtimeYaml {
    pub sample_rate: Option<u32>,
    /// Encoding name or alias, e.g. `pcm_s16le` or `mulaw`
    pub encoding: Option<String>,
    pub word_boost: Option<Vec<String>>,
    pub partial_transcripts: Option<bool>,
    pub extra_session_information: Option<bool>,
    pub handshake_timeout_secs: Option<u64>,
}

impl YamlConfig {
    /// Load and parse a YAML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::from_str(&contents)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(contents).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }
}
