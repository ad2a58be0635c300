//! REST API client.
//!
//! Covers the two calls a streaming session depends on: uploading media and
//! minting short-lived tokens for [`RealtimeConfig::with_token`](crate::RealtimeConfig::with_token).

mod client;
mod types;

pub use client::{ApiClient, DEFAULT_API_URL, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS};
pub use types::{CreateTemporaryTokenParams, TemporaryTokenResponse, UploadedFile};
