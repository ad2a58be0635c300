//! WebSocket message types for the real-time transcription API.
//!
//! - **Incoming messages**: JSON text frames discriminated by `message_type`
//!   - [`SessionBegins`]: Session id and expiry, sent once as the handshake
//!   - [`PartialTranscript`] / [`FinalTranscript`]: Recognition results
//!   - [`SessionInformation`]: Cumulative audio duration
//!   - [`SessionTerminated`]: Acknowledges a terminate request
//!   - [`ErrorEnvelope`]: Undiscriminated `{"error": "..."}` payload
//!
//! - **Outgoing messages**:
//!   - Binary audio data (sent directly, no JSON wrapper)
//!   - [`ControlMessage`]: terminate, force end of utterance, silence threshold

use serde::{Deserialize, Serialize};

// =============================================================================
// Discriminator
// =============================================================================

/// Value of the `message_type` field on incoming messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    SessionBegins,
    SessionTerminated,
    PartialTranscript,
    FinalTranscript,
    SessionInformation,
    /// Any discriminator this client does not know about
    #[serde(other)]
    Unknown,
}

impl MessageType {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionBegins => "SessionBegins",
            Self::SessionTerminated => "SessionTerminated",
            Self::PartialTranscript => "PartialTranscript",
            Self::FinalTranscript => "FinalTranscript",
            Self::SessionInformation => "SessionInformation",
            Self::Unknown => "Unknown",
        }
    }
}

/// Partial decode of an incoming message: only the fields needed to route it.
///
/// `message_type` is absent on error envelopes, which carry `error` instead.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEnvelope {
    #[serde(default)]
    pub message_type: Option<MessageType>,
    #[serde(default)]
    pub error: Option<String>,
}

impl MessageEnvelope {
    /// Decode just the routing fields of a text frame.
    pub fn peek(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

// =============================================================================
// Incoming Messages (Server to Client)
// =============================================================================

/// Error payload sent by the service instead of `SessionBegins` when a session
/// cannot be opened (bad credentials, insufficient balance, ...).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorEnvelope {
    /// The error text, if present and non-empty.
    pub fn message(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }
}

/// First message of every session.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionBegins {
    pub message_type: MessageType,
    /// Unique identifier for the established session
    #[serde(default)]
    pub session_id: String,
    /// Timestamp when this session will expire
    #[serde(default)]
    pub expires_at: String,
}

/// Sent once the service has processed a terminate request.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionTerminated {
    pub message_type: MessageType,
}

/// Sent periodically when extra session information is enabled.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionInformation {
    pub message_type: MessageType,
    /// Duration of audio processed so far, in seconds
    #[serde(default)]
    pub audio_duration_seconds: f64,
}

/// Timing and confidence for one recognised word.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Word {
    #[serde(default)]
    pub confidence: f64,
    /// Start time in milliseconds
    #[serde(default)]
    pub start: i64,
    /// End time in milliseconds
    #[serde(default)]
    pub end: i64,
    #[serde(default)]
    pub text: String,
}

/// Fields shared by partial and final transcripts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Transcript {
    /// Start of the audio span relative to session start, in milliseconds
    #[serde(default)]
    pub audio_start: i64,
    /// End of the audio span relative to session start, in milliseconds
    #[serde(default)]
    pub audio_end: i64,
    /// Confidence of the whole transcript, between 0 and 1
    #[serde(default)]
    pub confidence: f64,
    /// Creation timestamp as sent by the service
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub words: Vec<Word>,
}

/// Interim result for in-progress speech. Later messages may revise it.
#[derive(Debug, Clone, Deserialize)]
pub struct PartialTranscript {
    pub message_type: MessageType,
    #[serde(flatten)]
    pub transcript: Transcript,
}

/// Stable result for a completed utterance.
#[derive(Debug, Clone, Deserialize)]
pub struct FinalTranscript {
    pub message_type: MessageType,
    #[serde(flatten)]
    pub transcript: Transcript,
    /// Whether the text is punctuated and cased
    #[serde(default)]
    pub punctuated: bool,
    /// Whether the text is formatted, for example "Dollar" -> "$"
    #[serde(default)]
    pub text_formatted: bool,
}

impl PartialTranscript {
    #[inline]
    pub fn text(&self) -> &str {
        &self.transcript.text
    }
}

impl FinalTranscript {
    #[inline]
    pub fn text(&self) -> &str {
        &self.transcript.text
    }
}

// =============================================================================
// Outgoing Messages (Client to Server)
// =============================================================================

/// JSON control messages. Audio is never wrapped; it goes out as binary frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ControlMessage {
    /// Ends the session; the service answers with `SessionTerminated`
    TerminateSession { terminate_session: bool },
    /// Flushes the current utterance as a final transcript
    ForceEndUtterance { force_end_utterance: bool },
    /// Silence, in milliseconds, after which an utterance is considered ended
    EndUtteranceSilenceThreshold { end_utterance_silence_threshold: u64 },
}

impl ControlMessage {
    pub fn terminate_session() -> Self {
        Self::TerminateSession {
            terminate_session: true,
        }
    }

    pub fn force_end_utterance() -> Self {
        Self::ForceEndUtterance {
            force_end_utterance: true,
        }
    }

    pub fn end_utterance_silence_threshold(milliseconds: u64) -> Self {
        Self::EndUtteranceSilenceThreshold {
            end_utterance_silence_threshold: milliseconds,
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TerminateSession { .. } => "terminate_session",
            Self::ForceEndUtterance { .. } => "force_end_utterance",
            Self::EndUtteranceSilenceThreshold { .. } => "end_utterance_silence_threshold",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_discriminator() {
        let envelope =
            MessageEnvelope::peek(r#"{"message_type":"FinalTranscript","text":"hi"}"#).unwrap();
        assert_eq!(envelope.message_type, Some(MessageType::FinalTranscript));
        assert!(envelope.error.is_none());
    }

    #[test]
    fn test_peek_unknown_discriminator() {
        let envelope = MessageEnvelope::peek(r#"{"message_type":"SomethingNew"}"#).unwrap();
        assert_eq!(envelope.message_type, Some(MessageType::Unknown));
    }

    #[test]
    fn test_peek_error_envelope() {
        let envelope = MessageEnvelope::peek(r#"{"error":"Audio too short"}"#).unwrap();
        assert!(envelope.message_type.is_none());
        assert_eq!(envelope.error.as_deref(), Some("Audio too short"));
    }

    #[test]
    fn test_peek_rejects_non_object() {
        assert!(MessageEnvelope::peek("[1,2,3]").is_err());
        assert!(MessageEnvelope::peek("not json").is_err());
    }

    #[test]
    fn test_error_envelope_message() {
        let env: ErrorEnvelope = serde_json::from_str(r#"{"error":"Invalid API key"}"#).unwrap();
        assert_eq!(env.message(), Some("Invalid API key"));

        let env: ErrorEnvelope = serde_json::from_str(r#"{"error":""}"#).unwrap();
        assert_eq!(env.message(), None);

        let env: ErrorEnvelope =
            serde_json::from_str(r#"{"message_type":"SessionBegins"}"#).unwrap();
        assert_eq!(env.message(), None);
    }

    #[test]
    fn test_parse_session_begins() {
        let json = r#"{
            "message_type": "SessionBegins",
            "session_id": "b7e0e4c1-2d0a-4f6b-9c49-3a1c2bb0f00d",
            "expires_at": "2024-01-01T00:05:00.000000"
        }"#;
        let msg: SessionBegins = serde_json::from_str(json).unwrap();
        assert_eq!(msg.message_type, MessageType::SessionBegins);
        assert_eq!(msg.session_id, "b7e0e4c1-2d0a-4f6b-9c49-3a1c2bb0f00d");
        assert_eq!(msg.expires_at, "2024-01-01T00:05:00.000000");
    }

    #[test]
    fn test_parse_session_begins_minimal() {
        let msg: SessionBegins =
            serde_json::from_str(r#"{"message_type":"SessionBegins"}"#).unwrap();
        assert!(msg.session_id.is_empty());
    }

    #[test]
    fn test_parse_final_transcript() {
        let json = r#"{
            "message_type": "FinalTranscript",
            "audio_start": 0,
            "audio_end": 1500,
            "confidence": 0.97,
            "created": "2024-01-01T00:00:01.500000",
            "text": "Hello world.",
            "words": [
                {"start": 0, "end": 500, "confidence": 0.95, "text": "Hello"},
                {"start": 600, "end": 1500, "confidence": 0.99, "text": "world."}
            ],
            "punctuated": true,
            "text_formatted": true
        }"#;
        let msg: FinalTranscript = serde_json::from_str(json).unwrap();
        assert_eq!(msg.text(), "Hello world.");
        assert_eq!(msg.transcript.audio_end, 1500);
        assert_eq!(msg.transcript.words.len(), 2);
        assert_eq!(msg.transcript.words[1].start, 600);
        assert!(msg.punctuated);
        assert!(msg.text_formatted);
    }

    #[test]
    fn test_parse_partial_transcript_defaults() {
        let msg: PartialTranscript =
            serde_json::from_str(r#"{"message_type":"PartialTranscript","text":"hel"}"#).unwrap();
        assert_eq!(msg.text(), "hel");
        assert!(msg.transcript.words.is_empty());
        assert_eq!(msg.transcript.confidence, 0.0);
    }

    #[test]
    fn test_parse_transcript_with_bad_words_fails() {
        let json = r#"{"message_type":"FinalTranscript","text":"x","words":"nope"}"#;
        assert!(serde_json::from_str::<FinalTranscript>(json).is_err());
    }

    #[test]
    fn test_parse_session_information() {
        let msg: SessionInformation = serde_json::from_str(
            r#"{"message_type":"SessionInformation","audio_duration_seconds":12.5}"#,
        )
        .unwrap();
        assert!((msg.audio_duration_seconds - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_control_message_serialization() {
        assert_eq!(
            ControlMessage::terminate_session().to_json().unwrap(),
            r#"{"terminate_session":true}"#
        );
        assert_eq!(
            ControlMessage::force_end_utterance().to_json().unwrap(),
            r#"{"force_end_utterance":true}"#
        );
        assert_eq!(
            ControlMessage::end_utterance_silence_threshold(350)
                .to_json()
                .unwrap(),
            r#"{"end_utterance_silence_threshold":350}"#
        );
    }
}
