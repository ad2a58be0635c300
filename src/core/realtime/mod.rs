//! Real-time streaming transcription over WebSocket.
//!
//! A session is opened with [`RealtimeClient::connect`], fed raw audio with
//! [`RealtimeClient::send`], and ended with [`RealtimeClient::disconnect`].
//! Results arrive on a background task and are delivered through the async
//! callbacks registered on a [`RealtimeTranscriber`].
//!
//! # Architecture
//!
//! - [`config`]: Connection settings, credential handling and URL building
//! - [`messages`]: Wire types for incoming events and outgoing control messages
//! - [`transcriber`]: Callback registrations
//! - [`state`]: Open flag and termination signal shared with the reader
//! - [`client`]: The [`RealtimeClient`] itself
//!
//! # Session Lifecycle
//!
//! ```text
//! connect ──▶ SessionBegins ──▶ open ──▶ send / control ...
//!                                 │
//!        disconnect ──▶ terminate_session ──▶ SessionTerminated ──▶ closed
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use streamscribe::core::realtime::{RealtimeClient, RealtimeConfig, RealtimeEncoding, RealtimeTranscriber};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transcriber = RealtimeTranscriber::new()
//!         .on_partial_transcript(|t| async move { println!("... {}", t.text()) })
//!         .on_final_transcript(|t| async move { println!("{}", t.text()) });
//!
//!     let config = RealtimeConfig::with_api_key("your-api-key")
//!         .sample_rate(8_000)
//!         .encoding(RealtimeEncoding::PcmMulaw);
//!
//!     let mut client = RealtimeClient::new(config, transcriber);
//!     let cancel = CancellationToken::new();
//!     client.connect(&cancel).await?;
//!
//!     client.send(&cancel, vec![0xffu8; 1600]).await?;
//!     client.force_end_utterance(&cancel).await?;
//!
//!     client.disconnect(&cancel, true).await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod messages;
pub mod state;
pub mod transcriber;


pub use client::RealtimeClient;
pub use config::{
    Credential, DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_REALTIME_URL, MAX_SAMPLE_RATE,
    MIN_SAMPLE_RATE, RealtimeConfig, RealtimeEncoding,
};
pub use messages::{
    ControlMessage, FinalTranscript, MessageType, PartialTranscript, SessionBegins,
    SessionInformation, SessionTerminated, Transcript, Word,
};
pub use state::{SessionState, TerminationSignal};
pub use transcriber::{EventCallback, RealtimeTranscriber};
