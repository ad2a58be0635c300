//! Mock service endpoints for integration tests.
//!
//! - WebSocket real-time transcription service with scripted behavior
//!
//! The REST API is mocked with `wiremock` directly in its test file.

#![allow(dead_code)]

pub mod realtime_mock;

pub use realtime_mock::{HandshakeBehavior, MockRealtimeServer, MockScript, Recorded, TerminateBehavior};
