//! Client settings from `.env` files, environment variables, and YAML.
//!
//! Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable names and parsing
//!
//! # Example
//! ```rust,no_run
//! use streamscribe::config::Settings;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Environment only
//! let settings = Settings::from_env()?;
//!
//! // Environment with YAML overrides
//! let settings = Settings::from_file(Path::new("streamscribe.yaml"))?;
//! let config = settings.realtime_config();
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

mod env;
pub mod yaml;

pub use env::{
    ENV_API_KEY, ENV_API_URL, ENV_ENCODING, ENV_REALTIME_URL, ENV_SAMPLE_RATE, ENV_WORD_BOOST,
};
pub use yaml::YamlConfig;

use crate::core::api::{ApiClient, DEFAULT_API_URL};
use crate::core::realtime::{
    DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_REALTIME_URL, RealtimeConfig, RealtimeEncoding,
};
use crate::errors::ConfigError;

/// Resolved client settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub realtime_url: String,
    pub api_url: String,

    pub sample_rate: Option<u32>,
    pub encoding: Option<RealtimeEncoding>,
    pub word_boost: Vec<String>,
    pub partial_transcripts: Option<bool>,
    pub extra_session_information: Option<bool>,
    pub handshake_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            realtime_url: DEFAULT_REALTIME_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            sample_rate: None,
            encoding: None,
            word_boost: Vec::new(),
            partial_transcripts: None,
            extra_session_information: None,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

impl Drop for Settings {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.api_key {
            key.zeroize();
        }
    }
}

impl Settings {
    /// Load settings from the environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let mut settings = Self::default();
        settings.apply_env()?;
        Ok(settings)
    }

    /// Load settings from the environment, then apply YAML overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let yaml_config = YamlConfig::from_file(path)?;

        let mut settings = Self::from_env()?;
        settings.apply_yaml(yaml_config)?;
        Ok(settings)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(api_key) = env::env_var(ENV_API_KEY) {
            self.api_key = Some(api_key);
        }
        if let Some(url) = env::env_var(ENV_REALTIME_URL) {
            self.realtime_url = url;
        }
        if let Some(url) = env::env_var(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(rate) = env::env_var(ENV_SAMPLE_RATE) {
            self.sample_rate = Some(env::parse_sample_rate(ENV_SAMPLE_RATE, &rate)?);
        }
        if let Some(encoding) = env::env_var(ENV_ENCODING) {
            self.encoding = Some(env::parse_encoding(ENV_ENCODING, &encoding)?);
        }
        if let Some(words) = env::env_var(ENV_WORD_BOOST) {
            self.word_boost = env::parse_word_list(&words);
        }
        Ok(())
    }

    fn apply_yaml(&mut self, yaml: YamlConfig) -> Result<(), ConfigError> {
        if let Some(service) = yaml.assemblyai {
            if let Some(api_key) = service.api_key.filter(|k| !k.is_empty()) {
                self.api_key = Some(api_key);
            }
            if let Some(url) = service.realtime_url {
                self.realtime_url = url;
            }
            if let Some(url) = service.api_url {
                self.api_url = url;
            }
        }

        if let Some(realtime) = yaml.realtime {
            if realtime.sample_rate.is_some() {
                self.sample_rate = realtime.sample_rate;
            }
            if let Some(encoding) = realtime.encoding {
                self.encoding = Some(env::parse_encoding("realtime.encoding", &encoding)?);
            }
            if let Some(words) = realtime.word_boost {
                self.word_boost = words;
            }
            if realtime.partial_transcripts.is_some() {
                self.partial_transcripts = realtime.partial_transcripts;
            }
            if realtime.extra_session_information.is_some() {
                self.extra_session_information = realtime.extra_session_information;
            }
            if let Some(secs) = realtime.handshake_timeout_secs {
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        name: "realtime.handshake_timeout_secs",
                        message: "must be greater than zero".to_string(),
                    });
                }
                self.handshake_timeout = Duration::from_secs(secs);
            }
        }

        Ok(())
    }

    /// Session configuration authenticated with the API key.
    pub fn realtime_config(&self) -> RealtimeConfig {
        let mut config = RealtimeConfig::default();
        config.api_key = self.api_key.clone();
        self.apply_session_defaults(&mut config);
        config
    }

    /// Session configuration authenticated with a temporary token.
    pub fn realtime_config_with_token(&self, token: impl Into<String>) -> RealtimeConfig {
        let mut config = RealtimeConfig::with_token(token);
        self.apply_session_defaults(&mut config);
        config
    }

    fn apply_session_defaults(&self, config: &mut RealtimeConfig) {
        config.base_url = self.realtime_url.clone();
        config.sample_rate = self.sample_rate;
        config.encoding = self.encoding;
        config.word_boost = self.word_boost.clone();
        config.partial_transcripts = self.partial_transcripts;
        config.extra_session_information = self.extra_session_information;
        config.handshake_timeout = self.handshake_timeout;
    }

    /// REST client for uploads and temporary tokens.
    pub fn api_client(&self) -> Result<ApiClient, ConfigError> {
        let api_key = self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)?;
        Ok(ApiClient::with_base_url(api_key, &self.api_url)?)
    }
}
