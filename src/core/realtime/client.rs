//! Real-time WebSocket client implementation.
//!
//! One [`RealtimeClient`] drives one session at a time:
//!
//! ```text
//! ┌──────────────┐  binary / control   ┌──────────────────┐
//! │   caller     │────────────────────▶│  WebSocket sink  │───▶ service
//! │ send()/...   │                     └──────────────────┘
//! └──────┬───────┘
//!        │ open flag, termination signal (SessionState)
//! ┌──────▼───────┐     JSON events     ┌──────────────────┐
//! │  dispatcher  │◀────────────────────│ WebSocket stream │◀─── service
//! │    task      │────▶ callbacks      └──────────────────┘
//! └──────────────┘
//! ```
//!
//! The caller owns the write half and the dispatcher task owns the read half,
//! so the two directions never contend for the same lock.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::SplitSink;
use futures::{SinkExt, Stream, StreamExt};
use http::HeaderValue;
use http::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::{Credential, RealtimeConfig};
use super::messages::{
    ControlMessage, ErrorEnvelope, FinalTranscript, MessageEnvelope, MessageType,
    PartialTranscript, SessionBegins, SessionInformation, SessionTerminated,
};
use super::state::SessionState;
use super::transcriber::RealtimeTranscriber;
use crate::errors::{RealtimeError, RealtimeResult};
use crate::utils::tls::ensure_crypto_provider;

/// Bound on sending the close frame during disconnect.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

// =============================================================================
// RealtimeClient
// =============================================================================

/// Streaming transcription client.
///
/// # Example
///
/// ```rust,no_run
/// use streamscribe::{RealtimeClient, RealtimeConfig, RealtimeTranscriber};
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let transcriber = RealtimeTranscriber::new()
///         .on_final_transcript(|t| async move { println!("{}", t.text()) });
///
///     let mut client = RealtimeClient::new(RealtimeConfig::with_api_key("key"), transcriber);
///     let cancel = CancellationToken::new();
///
///     client.connect(&cancel).await?;
///     client.send(&cancel, vec![0u8; 3200]).await?;
///     client.disconnect(&cancel, true).await?;
///     Ok(())
/// }
/// ```
pub struct RealtimeClient {
    config: RealtimeConfig,
    transcriber: Arc<RealtimeTranscriber>,

    /// Replaced on every successful connect
    state: Arc<SessionState>,

    /// Write half of the transport; `None` before connect and after disconnect
    sink: Mutex<Option<WsSink>>,

    session: Option<SessionBegins>,
    dispatcher: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeClient")
            .field("base_url", &self.config.base_url)
            .field("session_open", &self.state.is_open())
            .field("session_id", &self.session_id())
            .finish()
    }
}

impl RealtimeClient {
    pub fn new(config: RealtimeConfig, transcriber: RealtimeTranscriber) -> Self {
        Self {
            config,
            transcriber: Arc::new(transcriber),
            state: Arc::new(SessionState::new()),
            sink: Mutex::new(None),
            session: None,
            dispatcher: None,
        }
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// Whether the current session is open for writes.
    pub fn is_session_open(&self) -> bool {
        self.state.is_open()
    }

    /// Session id assigned by the service in `SessionBegins`.
    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.session_id.as_str())
    }

    /// Expiry timestamp from `SessionBegins`.
    pub fn expires_at(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.expires_at.as_str())
    }

    /// Open the transport, wait for `SessionBegins`, and start the dispatcher.
    ///
    /// The dispatcher runs under a child of `cancel`; cancelling it ends the
    /// session ungracefully. No task is spawned when the handshake fails.
    pub async fn connect(&mut self, cancel: &CancellationToken) -> RealtimeResult<()> {
        if self.state.is_open() {
            return Err(RealtimeError::ConfigurationError(
                "A session is already open; disconnect first".to_string(),
            ));
        }

        self.config.validate()?;
        let url = self.config.build_url(&self.transcriber)?;
        let request = build_request(&self.config, url.as_str())?;

        ensure_crypto_provider();

        debug!("Dialing real-time endpoint {}{}", url.origin().ascii_serialization(), url.path());

        let handshake_timeout = self.config.handshake_timeout;
        let (stream, begins) = tokio::select! {
            _ = cancel.cancelled() => return Err(RealtimeError::Cancelled),
            result = timeout(handshake_timeout, open_session(request)) => match result {
                Ok(opened) => opened?,
                Err(_) => {
                    return Err(RealtimeError::HandshakeFailed(format!(
                        "Timed out after {handshake_timeout:?} waiting for SessionBegins"
                    )));
                }
            },
        };

        info!(
            "Real-time session started: {} (expires at: {})",
            begins.session_id, begins.expires_at
        );

        if let Some(previous) = self.dispatcher.take() {
            previous.abort();
        }

        let (sink, source) = stream.split();
        let state = Arc::new(SessionState::new());
        state.mark_open();

        self.state = state.clone();
        *self.sink.get_mut() = Some(sink);
        self.session = Some(begins.clone());

        self.transcriber.session_begins(begins).await;

        self.dispatcher = Some(tokio::spawn(run_dispatcher(
            source,
            state,
            self.transcriber.clone(),
            cancel.child_token(),
        )));

        Ok(())
    }

    /// Send one frame of raw audio.
    ///
    /// Frames are written in call order, one binary WebSocket frame per call.
    pub async fn send(
        &self,
        cancel: &CancellationToken,
        audio: impl Into<Bytes>,
    ) -> RealtimeResult<()> {
        let audio = audio.into();
        let len = audio.len();
        self.write(cancel, Message::Binary(audio)).await?;
        debug!("Sent {} bytes of audio", len);
        Ok(())
    }

    /// Flush the current utterance as a final transcript.
    pub async fn force_end_utterance(&self, cancel: &CancellationToken) -> RealtimeResult<()> {
        self.send_control(cancel, ControlMessage::force_end_utterance())
            .await
    }

    /// Set how long a silence, in milliseconds, ends an utterance.
    pub async fn set_end_utterance_silence_threshold(
        &self,
        cancel: &CancellationToken,
        milliseconds: u64,
    ) -> RealtimeResult<()> {
        self.send_control(
            cancel,
            ControlMessage::end_utterance_silence_threshold(milliseconds),
        )
        .await
    }

    /// Terminate the session and close the transport.
    ///
    /// With `wait_for_termination`, blocks until the dispatcher sees
    /// `SessionTerminated` or `cancel` fires. There is no internal timeout on
    /// that wait. The transport is closed either way and the session is
    /// marked closed, so the client can [`connect`](Self::connect) again.
    pub async fn disconnect(
        &self,
        cancel: &CancellationToken,
        wait_for_termination: bool,
    ) -> RealtimeResult<()> {
        let mut sink = self
            .sink
            .lock()
            .await
            .take()
            .ok_or(RealtimeError::Disconnected)?;

        let terminate_result = send_terminate(&mut sink, cancel).await;

        let wait_result = match terminate_result {
            Ok(()) if wait_for_termination => {
                self.state.termination().wait_or_cancel(cancel).await
            }
            other => other,
        };

        if let Err(e) = &wait_result {
            warn!("Session did not terminate cleanly: {}", e);
        }

        // The dispatcher reports nothing after this point.
        self.state.mark_closed();
        let close_result = close_transport(&mut sink).await;

        info!("Disconnected from real-time session");
        wait_result.and(close_result)
    }

    async fn send_control(
        &self,
        cancel: &CancellationToken,
        message: ControlMessage,
    ) -> RealtimeResult<()> {
        let kind = message.kind();
        self.write(cancel, control_frame(message)?).await?;
        debug!("Sent {} control message", kind);
        Ok(())
    }

    /// Single write path. Fails without writing when the session is not open.
    async fn write(&self, cancel: &CancellationToken, message: Message) -> RealtimeResult<()> {
        if !self.state.is_open() {
            return Err(RealtimeError::SessionClosed);
        }

        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(RealtimeError::SessionClosed)?;

        tokio::select! {
            _ = cancel.cancelled() => Err(RealtimeError::Cancelled),
            result = sink.send(message) => result.map_err(|e| {
                RealtimeError::TransportError(format!("Failed to write to WebSocket: {e}"))
            }),
        }
    }
}

impl Drop for RealtimeClient {
    fn drop(&mut self) {
        if let Some(handle) = self.dispatcher.take() {
            handle.abort();
        }
    }
}

// =============================================================================
// Connector
// =============================================================================

/// Build the upgrade request. API keys travel in the `Authorization` header;
/// tokens are already part of the URL.
pub(crate) fn build_request(config: &RealtimeConfig, url: &str) -> RealtimeResult<Request> {
    let mut request = url.into_client_request().map_err(|e| {
        RealtimeError::ConfigurationError(format!("Failed to create WebSocket request: {e}"))
    })?;

    if let Some(Credential::ApiKey(api_key)) = config.credential() {
        let mut value = HeaderValue::from_str(api_key).map_err(|_| {
            RealtimeError::ConfigurationError(
                "API key contains characters not allowed in a header".to_string(),
            )
        })?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);
    }

    Ok(request)
}

/// Dial and read exactly one handshake message.
async fn open_session(request: Request) -> RealtimeResult<(WsStream, SessionBegins)> {
    let (mut stream, _response) = connect_async(request).await.map_err(|e| match e {
        WsError::Http(response) => RealtimeError::HandshakeFailed(format!(
            "Upgrade rejected with HTTP {}",
            response.status()
        )),
        other => RealtimeError::TransportError(format!("Failed to connect: {other}")),
    })?;

    let handshake = match read_handshake_text(&mut stream).await {
        Ok(text) => parse_handshake(&text),
        Err(e) => Err(e),
    };

    match handshake {
        Ok(begins) => Ok((stream, begins)),
        Err(e) => {
            error!("Real-time handshake failed: {}", e);
            let _ = stream.close(None).await;
            Err(e)
        }
    }
}

async fn read_handshake_text(stream: &mut WsStream) -> RealtimeResult<String> {
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => return Ok(text.as_str().to_owned()),
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
            Some(Ok(Message::Binary(_))) => {
                return Err(RealtimeError::HandshakeFailed(
                    "Expected a JSON text message, got binary".to_string(),
                ));
            }
            Some(Ok(Message::Close(frame))) => {
                return Err(RealtimeError::HandshakeFailed(format!(
                    "Connection closed during handshake: {}",
                    describe_close(frame.as_ref())
                )));
            }
            Some(Err(e)) => {
                return Err(RealtimeError::TransportError(format!(
                    "Failed to read handshake: {e}"
                )));
            }
            None => {
                return Err(RealtimeError::TransportError(
                    "Connection closed during handshake".to_string(),
                ));
            }
        }
    }
}

/// Decode the first message. An error envelope wins over anything else in
/// the payload.
pub(crate) fn parse_handshake(text: &str) -> RealtimeResult<SessionBegins> {
    let envelope: ErrorEnvelope = serde_json::from_str(text).map_err(|e| {
        RealtimeError::HandshakeFailed(format!("Invalid handshake message: {e}"))
    })?;

    if let Some(message) = envelope.message() {
        return Err(RealtimeError::HandshakeFailed(message.to_string()));
    }

    let begins: SessionBegins = serde_json::from_str(text).map_err(|e| {
        RealtimeError::HandshakeFailed(format!("Invalid SessionBegins message: {e}"))
    })?;

    if begins.message_type != MessageType::SessionBegins {
        return Err(RealtimeError::HandshakeFailed(format!(
            "Expected SessionBegins, got {}",
            begins.message_type.as_str()
        )));
    }

    Ok(begins)
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Read loop. Exits on `SessionTerminated`, on any read failure, or when
/// `cancel` fires. Every exit leaves the session closed; only the
/// `SessionTerminated` path fires the termination signal.
pub(crate) async fn run_dispatcher<S>(
    mut source: S,
    state: Arc<SessionState>,
    transcriber: Arc<RealtimeTranscriber>,
    cancel: CancellationToken,
) where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    loop {
        if !state.is_open() {
            debug!("Session no longer open; dispatcher exiting");
            break;
        }

        let next = tokio::select! {
            _ = cancel.cancelled() => {
                end_session(&state, &transcriber, RealtimeError::Cancelled).await;
                break;
            }
            next = source.next() => next,
        };

        let text = match next {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
            Some(Ok(Message::Binary(data))) => {
                transcriber
                    .error(RealtimeError::DecodeError(format!(
                        "Unexpected binary message ({} bytes)",
                        data.len()
                    )))
                    .await;
                continue;
            }
            Some(Ok(Message::Close(frame))) => {
                let err = RealtimeError::TransportError(format!(
                    "Connection closed by server: {}",
                    describe_close(frame.as_ref())
                ));
                end_session(&state, &transcriber, err).await;
                break;
            }
            Some(Err(e)) => {
                let err = RealtimeError::TransportError(format!("WebSocket error: {e}"));
                end_session(&state, &transcriber, err).await;
                break;
            }
            None => {
                let err =
                    RealtimeError::TransportError("WebSocket stream ended unexpectedly".into());
                end_session(&state, &transcriber, err).await;
                break;
            }
        };

        if handle_message(text.as_str(), &state, &transcriber)
            .await
            .is_break()
        {
            break;
        }
    }

    info!("Real-time dispatcher stopped");
}

/// Close the session after an ungraceful stop. The error is only reported
/// while the session was still open; after a local disconnect it is logged.
async fn end_session(state: &SessionState, transcriber: &RealtimeTranscriber, err: RealtimeError) {
    if state.mark_closed() {
        warn!("Real-time session ended: {}", err);
        transcriber.error(err).await;
    } else {
        debug!("Transport ended after local close: {}", err);
    }
}

/// Route one text frame to its callback.
///
/// Decode failures are reported and skipped. Returns `Break` only after a
/// `SessionTerminated` has been handled.
pub(crate) async fn handle_message(
    text: &str,
    state: &SessionState,
    transcriber: &RealtimeTranscriber,
) -> ControlFlow<()> {
    debug!("Received real-time message: {}", text);

    let envelope = match MessageEnvelope::peek(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Failed to parse real-time message: {}", e);
            transcriber
                .error(RealtimeError::DecodeError(format!("Invalid message: {e}")))
                .await;
            return ControlFlow::Continue(());
        }
    };

    let Some(message_type) = envelope.message_type else {
        let err = match envelope.error.filter(|e| !e.is_empty()) {
            Some(message) => RealtimeError::ServiceError(message),
            None => RealtimeError::DecodeError("Message has no message_type".to_string()),
        };
        warn!("{}", err);
        transcriber.error(err).await;
        return ControlFlow::Continue(());
    };

    match message_type {
        MessageType::FinalTranscript => {
            match decode::<FinalTranscript>(text, message_type) {
                Ok(transcript) if transcript.text().is_empty() => {
                    debug!("Skipping empty final transcript");
                }
                Ok(transcript) => transcriber.final_transcript(transcript).await,
                Err(e) => transcriber.error(e).await,
            }
        }

        MessageType::PartialTranscript => {
            match decode::<PartialTranscript>(text, message_type) {
                Ok(transcript) if transcript.text().is_empty() => {
                    debug!("Skipping empty partial transcript");
                }
                Ok(transcript) => transcriber.partial_transcript(transcript).await,
                Err(e) => transcriber.error(e).await,
            }
        }

        MessageType::SessionTerminated => {
            match decode::<SessionTerminated>(text, message_type) {
                Ok(terminated) => {
                    state.mark_closed();
                    info!("Real-time session terminated");
                    transcriber.session_terminated(terminated).await;
                    state.termination().fire();
                    return ControlFlow::Break(());
                }
                // A malformed acknowledgement leaves the session open.
                Err(e) => transcriber.error(e).await,
            }
        }

        MessageType::SessionInformation => {
            match decode::<SessionInformation>(text, message_type) {
                Ok(info) => {
                    debug!("Audio processed so far: {:.2}s", info.audio_duration_seconds);
                    transcriber.session_information(info).await;
                }
                Err(e) => transcriber.error(e).await,
            }
        }

        MessageType::SessionBegins => {
            debug!("Ignoring SessionBegins received mid-session");
        }

        MessageType::Unknown => {
            debug!("Ignoring unknown real-time message type: {}", text);
        }
    }

    ControlFlow::Continue(())
}

fn decode<T: DeserializeOwned>(text: &str, message_type: MessageType) -> RealtimeResult<T> {
    serde_json::from_str(text).map_err(|e| {
        warn!("Failed to decode {}: {}", message_type.as_str(), e);
        RealtimeError::DecodeError(format!("{}: {e}", message_type.as_str()))
    })
}

// =============================================================================
// Helpers
// =============================================================================

async fn send_terminate(sink: &mut WsSink, cancel: &CancellationToken) -> RealtimeResult<()> {
    let terminate = control_frame(ControlMessage::terminate_session())?;
    tokio::select! {
        _ = cancel.cancelled() => Err(RealtimeError::Cancelled),
        result = sink.send(terminate) => {
            result.map_err(|e| {
                RealtimeError::TransportError(format!("Failed to send terminate_session: {e}"))
            })?;
            debug!("Sent terminate_session");
            Ok(())
        }
    }
}

fn control_frame(message: ControlMessage) -> RealtimeResult<Message> {
    let json = message.to_json().map_err(|e| {
        RealtimeError::TransportError(format!("Failed to serialize {}: {e}", message.kind()))
    })?;
    Ok(Message::Text(json.into()))
}

/// Send a normal-closure frame. A transport the peer already closed counts
/// as closed.
async fn close_transport(sink: &mut WsSink) -> RealtimeResult<()> {
    let frame = CloseFrame {
        code: CloseCode::Normal,
        reason: "".into(),
    };

    match timeout(CLOSE_TIMEOUT, sink.send(Message::Close(Some(frame)))).await {
        Ok(Ok(())) | Ok(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => Ok(()),
        Ok(Err(e)) => Err(RealtimeError::TransportError(format!(
            "Failed to close WebSocket: {e}"
        ))),
        Err(_) => Err(RealtimeError::TransportError(
            "Timed out sending close frame".to_string(),
        )),
    }
}

fn describe_close(frame: Option<&CloseFrame>) -> String {
    match frame {
        Some(frame) if frame.reason.as_str().is_empty() => format!("code {}", u16::from(frame.code)),
        Some(frame) => format!("{} (code {})", frame.reason.as_str(), u16::from(frame.code)),
        None => "no close frame".to_string(),
    }
}
