//! Event callbacks for a real-time session.
//!
//! Each session event has its own optional async callback slot. Whether a slot
//! is filled also affects what the service is asked to send: with no partial
//! transcript callback the session disables partial transcripts, and a
//! session information callback turns on extra session information. That
//! decision is made once, when [`RealtimeConfig`](super::RealtimeConfig)
//! resolves into the connection URL.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, error};

use super::messages::{
    FinalTranscript, PartialTranscript, SessionBegins, SessionInformation, SessionTerminated,
};
use crate::errors::RealtimeError;

/// Async callback invoked with one session event.
pub type EventCallback<T> =
    Arc<dyn Fn(T) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

fn boxed<T, F, Fut>(callback: F) -> EventCallback<T>
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |event| Box::pin(callback(event)))
}

/// Callback registrations for one client.
///
/// # Example
///
/// ```rust
/// use streamscribe::RealtimeTranscriber;
///
/// let transcriber = RealtimeTranscriber::new()
///     .on_final_transcript(|t| async move { println!("{}", t.text()) })
///     .on_error(|e| async move { eprintln!("{e}") });
///
/// assert!(!transcriber.has_partial_transcript_handler());
/// ```
#[derive(Clone, Default)]
pub struct RealtimeTranscriber {
    on_session_begins: Option<EventCallback<SessionBegins>>,
    on_session_terminated: Option<EventCallback<SessionTerminated>>,
    on_session_information: Option<EventCallback<SessionInformation>>,
    on_partial_transcript: Option<EventCallback<PartialTranscript>>,
    on_final_transcript: Option<EventCallback<FinalTranscript>>,
    on_error: Option<EventCallback<RealtimeError>>,
}

impl std::fmt::Debug for RealtimeTranscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeTranscriber")
            .field("on_session_begins", &self.on_session_begins.is_some())
            .field("on_session_terminated", &self.on_session_terminated.is_some())
            .field("on_session_information", &self.on_session_information.is_some())
            .field("on_partial_transcript", &self.on_partial_transcript.is_some())
            .field("on_final_transcript", &self.on_final_transcript.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl RealtimeTranscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_session_begins<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(SessionBegins) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_session_begins = Some(boxed(callback));
        self
    }

    pub fn on_session_terminated<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(SessionTerminated) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_session_terminated = Some(boxed(callback));
        self
    }

    /// Registering this callback enables extra session information.
    pub fn on_session_information<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(SessionInformation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_session_information = Some(boxed(callback));
        self
    }

    /// Registering this callback keeps partial transcripts enabled.
    pub fn on_partial_transcript<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(PartialTranscript) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_partial_transcript = Some(boxed(callback));
        self
    }

    pub fn on_final_transcript<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(FinalTranscript) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_final_transcript = Some(boxed(callback));
        self
    }

    /// Receives every failure observed by the background reader.
    pub fn on_error<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(RealtimeError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_error = Some(boxed(callback));
        self
    }

    #[inline]
    pub fn has_partial_transcript_handler(&self) -> bool {
        self.on_partial_transcript.is_some()
    }

    #[inline]
    pub fn has_session_information_handler(&self) -> bool {
        self.on_session_information.is_some()
    }

    pub(crate) async fn session_begins(&self, event: SessionBegins) {
        if let Some(callback) = &self.on_session_begins {
            callback(event).await;
        }
    }

    pub(crate) async fn session_terminated(&self, event: SessionTerminated) {
        if let Some(callback) = &self.on_session_terminated {
            callback(event).await;
        }
    }

    pub(crate) async fn session_information(&self, event: SessionInformation) {
        if let Some(callback) = &self.on_session_information {
            callback(event).await;
        }
    }

    pub(crate) async fn partial_transcript(&self, event: PartialTranscript) {
        if let Some(callback) = &self.on_partial_transcript {
            callback(event).await;
        }
    }

    pub(crate) async fn final_transcript(&self, event: FinalTranscript) {
        if let Some(callback) = &self.on_final_transcript {
            callback(event).await;
        } else {
            debug!("Final transcript (no callback): {}", event.text());
        }
    }

    pub(crate) async fn error(&self, err: RealtimeError) {
        if let Some(callback) = &self.on_error {
            callback(err).await;
        } else {
            error!("Real-time session error (no callback registered): {}", err);
        }
    }
}
