pub mod api;
pub mod realtime;

// Re-export commonly used types for convenience
pub use api::{ApiClient, CreateTemporaryTokenParams, TemporaryTokenResponse, UploadedFile};

pub use realtime::{
    ControlMessage, Credential, FinalTranscript, MessageType, PartialTranscript, RealtimeClient,
    RealtimeConfig, RealtimeEncoding, RealtimeTranscriber, SessionBegins, SessionInformation,
    SessionTerminated, Transcript, Word,
};
