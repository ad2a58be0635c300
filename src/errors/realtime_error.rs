use thiserror::Error;

/// Result type for real-time session operations
pub type RealtimeResult<T> = Result<T, RealtimeError>;

/// Errors raised by the streaming transcription session.
///
/// Caller-facing operations (`connect`, `send`, `disconnect`) return these
/// directly. Failures observed by the background reader are never returned to
/// the caller; they are delivered through the registered error callback.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Configuration is incomplete or out of range
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The service rejected the session or answered the handshake with an
    /// unexpected payload
    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    /// Attempted to write to a session that is closed or was never opened
    #[error("session closed")]
    SessionClosed,

    /// Attempted to disconnect a client that has no transport
    #[error("client is disconnected")]
    Disconnected,

    /// Read or write failure on the underlying WebSocket
    #[error("Transport error: {0}")]
    TransportError(String),

    /// A message body could not be decoded for its discriminator
    #[error("Failed to decode message: {0}")]
    DecodeError(String),

    /// Error envelope sent by the service during an open session
    #[error("Service error: {0}")]
    ServiceError(String),

    /// The supplied cancellation token fired before the operation completed
    #[error("operation cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(RealtimeError::SessionClosed.to_string(), "session closed");
        assert_eq!(
            RealtimeError::Disconnected.to_string(),
            "client is disconnected"
        );
        assert_eq!(
            RealtimeError::HandshakeFailed("Invalid API key".into()).to_string(),
            "Handshake failed: Invalid API key"
        );
    }
}
