//! Environment variable loading.

use std::str::FromStr;

use crate::core::realtime::RealtimeEncoding;
use crate::errors::ConfigError;

pub const ENV_API_KEY: &str = "ASSEMBLYAI_API_KEY";
pub const ENV_REALTIME_URL: &str = "ASSEMBLYAI_REALTIME_URL";
pub const ENV_API_URL: &str = "ASSEMBLYAI_API_URL";
pub const ENV_SAMPLE_RATE: &str = "ASSEMBLYAI_SAMPLE_RATE";
pub const ENV_ENCODING: &str = "ASSEMBLYAI_ENCODING";
/// Comma-separated list of words
pub const ENV_WORD_BOOST: &str = "ASSEMBLYAI_WORD_BOOST";

/// Non-empty value of an environment variable.
pub(super) fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(super) fn parse_sample_rate(name: &'static str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|e| ConfigError::InvalidValue {
        name,
        message: format!("'{value}' is not a sample rate: {e}"),
    })
}

pub(super) fn parse_encoding(
    name: &'static str,
    value: &str,
) -> Result<RealtimeEncoding, ConfigError> {
    RealtimeEncoding::from_str(value).map_err(|e| ConfigError::InvalidValue {
        name,
        message: e.to_string(),
    })
}

/// Split `"foo, bar,,baz"` into `["foo", "bar", "baz"]`.
pub(super) fn parse_word_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect()
}
