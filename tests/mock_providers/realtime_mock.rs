//! WebSocket mock of the real-time transcription service.
//!
//! Each accepted connection:
//! 1. Records the query string and `Authorization` header of the upgrade
//! 2. Answers the handshake per [`HandshakeBehavior`]
//! 3. Replays the next scripted batch of messages after every audio frame
//! 4. Handles `terminate_session` per [`TerminateBehavior`]
//! 5. Optionally drops the connection mid-stream after a number of audio frames

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

pub const MOCK_SESSION_ID: &str = "d7a8b3c2-0f2e-4a1b-9c3d-5e6f7a8b9c0d";
pub const MOCK_EXPIRES_AT: &str = "2024-01-01T00:05:00.000000";

/// What the server sends first.
#[derive(Debug, Clone)]
pub enum HandshakeBehavior {
    /// Standard `SessionBegins`
    Begins,
    /// `{"error": ...}` instead of `SessionBegins`
    Error(String),
    /// `SessionBegins` fields plus a non-empty `error`
    BeginsWithError(String),
    /// Arbitrary first text frame
    Raw(String),
    /// Refuse the upgrade with this HTTP status
    RejectUpgrade(u16),
    /// Never answer
    Silent,
}

/// How the server reacts to `terminate_session`.
#[derive(Debug, Clone)]
pub enum TerminateBehavior {
    /// Send `SessionTerminated` after the given delay
    Acknowledge(Duration),
    /// Drop the TCP connection without a close handshake
    DropConnection,
    /// Keep the session running
    Ignore,
}

#[derive(Debug, Clone)]
pub struct MockScript {
    pub handshake: HandshakeBehavior,
    /// One batch of messages per received audio frame, in order
    pub audio_responses: VecDeque<Vec<String>>,
    /// Messages sent when `force_end_utterance` arrives
    pub force_end_responses: Vec<String>,
    pub terminate: TerminateBehavior,
    /// Drop the TCP connection without a close handshake after this many
    /// audio frames
    pub drop_after_audio: Option<usize>,
}

impl Default for MockScript {
    fn default() -> Self {
        Self {
            handshake: HandshakeBehavior::Begins,
            audio_responses: VecDeque::new(),
            force_end_responses: Vec::new(),
            terminate: TerminateBehavior::Acknowledge(Duration::ZERO),
            drop_after_audio: None,
        }
    }
}

impl MockScript {
    pub fn with_handshake(mut self, handshake: HandshakeBehavior) -> Self {
        self.handshake = handshake;
        self
    }

    pub fn respond_to_audio(mut self, messages: Vec<Value>) -> Self {
        self.audio_responses
            .push_back(messages.into_iter().map(|m| m.to_string()).collect());
        self
    }

    pub fn respond_to_force_end(mut self, messages: Vec<Value>) -> Self {
        self.force_end_responses = messages.into_iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn on_terminate(mut self, terminate: TerminateBehavior) -> Self {
        self.terminate = terminate;
        self
    }

    pub fn drop_after_audio(mut self, frames: usize) -> Self {
        self.drop_after_audio = Some(frames);
        self
    }
}

/// Everything the server observed on the most recent connection.
#[derive(Debug, Clone, Default)]
pub struct Recorded {
    pub connections: usize,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub audio_frames: Vec<Vec<u8>>,
    pub text_frames: Vec<String>,
    pub close_code: Option<u16>,
}

impl Recorded {
    /// Decoded query parameters in wire order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let query = self.query.clone().unwrap_or_default();
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }
}

pub fn partial(text: &str) -> Value {
    json!({
        "message_type": "PartialTranscript",
        "audio_start": 0,
        "audio_end": 500,
        "confidence": 0.8,
        "created": "2024-01-01T00:00:00.500000",
        "text": text,
        "words": []
    })
}

pub fn final_transcript(text: &str) -> Value {
    json!({
        "message_type": "FinalTranscript",
        "audio_start": 0,
        "audio_end": 1000,
        "confidence": 0.95,
        "created": "2024-01-01T00:00:01.000000",
        "text": text,
        "words": [],
        "punctuated": true,
        "text_formatted": true
    })
}

pub struct MockRealtimeServer {
    addr: SocketAddr,
    recorded: Arc<Mutex<Recorded>>,
    handle: JoinHandle<()>,
}

impl MockRealtimeServer {
    pub async fn start(script: MockScript) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let recorded = Arc::new(Mutex::new(Recorded::default()));

        let handle = {
            let recorded = recorded.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let script = script.clone();
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, script, recorded).await {
                            eprintln!("Mock real-time connection error: {e}");
                        }
                    });
                }
            })
        };

        Self {
            addr,
            recorded,
            handle,
        }
    }

    /// Base URL to hand to `RealtimeConfig::base_url`.
    pub fn url(&self) -> String {
        format!("ws://{}/v2/realtime/ws", self.addr)
    }

    pub fn recorded(&self) -> Recorded {
        self.recorded.lock().unwrap().clone()
    }

    /// Poll until `predicate` holds or a second passes.
    pub async fn wait_for(&self, predicate: impl Fn(&Recorded) -> bool) -> Recorded {
        for _ in 0..100 {
            let recorded = self.recorded();
            if predicate(&recorded) {
                return recorded;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.recorded()
    }
}

impl Drop for MockRealtimeServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle_connection(
    stream: TcpStream,
    mut script: MockScript,
    recorded: Arc<Mutex<Recorded>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let reject = match script.handshake {
        HandshakeBehavior::RejectUpgrade(status) => Some(status),
        _ => None,
    };

    let callback = {
        let recorded = recorded.clone();
        move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
            {
                let mut rec = recorded.lock().unwrap();
                rec.connections += 1;
                rec.query = request.uri().query().map(String::from);
                rec.authorization = request
                    .headers()
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(String::from);
            }

            match reject {
                Some(status) => {
                    let mut error = ErrorResponse::new(Some("Unauthorized".to_string()));
                    *error.status_mut() = http::StatusCode::from_u16(status).unwrap();
                    Err(error)
                }
                None => Ok(response),
            }
        }
    };

    let ws_stream = accept_hdr_async(stream, callback).await?;
    let (mut write, mut read) = ws_stream.split();

    match &script.handshake {
        HandshakeBehavior::Begins => {
            let begins = json!({
                "message_type": "SessionBegins",
                "session_id": MOCK_SESSION_ID,
                "expires_at": MOCK_EXPIRES_AT,
            });
            write.send(Message::Text(begins.to_string().into())).await?;
        }
        HandshakeBehavior::Error(message) => {
            let error = json!({ "error": message });
            write.send(Message::Text(error.to_string().into())).await?;
        }
        HandshakeBehavior::BeginsWithError(message) => {
            let mixed = json!({
                "message_type": "SessionBegins",
                "session_id": MOCK_SESSION_ID,
                "expires_at": MOCK_EXPIRES_AT,
                "error": message,
            });
            write.send(Message::Text(mixed.to_string().into())).await?;
        }
        HandshakeBehavior::Raw(text) => {
            write.send(Message::Text(text.clone().into())).await?;
        }
        HandshakeBehavior::RejectUpgrade(_) => return Ok(()),
        HandshakeBehavior::Silent => {}
    }

    let mut audio_received = 0;
    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Binary(audio)) => {
                recorded.lock().unwrap().audio_frames.push(audio.to_vec());
                audio_received += 1;
                if let Some(batch) = script.audio_responses.pop_front() {
                    for text in batch {
                        write.send(Message::Text(text.into())).await?;
                    }
                }
                if script.drop_after_audio == Some(audio_received) {
                    return Ok(());
                }
            }
            Ok(Message::Text(text)) => {
                recorded.lock().unwrap().text_frames.push(text.to_string());
                let control: Value = serde_json::from_str(&text)?;

                if control.get("force_end_utterance").is_some() {
                    for text in script.force_end_responses.clone() {
                        write.send(Message::Text(text.into())).await?;
                    }
                }

                if control.get("terminate_session").is_some() {
                    match &script.terminate {
                        TerminateBehavior::Acknowledge(delay) => {
                            tokio::time::sleep(*delay).await;
                            let terminated = json!({ "message_type": "SessionTerminated" });
                            write.send(Message::Text(terminated.to_string().into())).await?;
                        }
                        TerminateBehavior::DropConnection => return Ok(()),
                        TerminateBehavior::Ignore => {}
                    }
                }
            }
            Ok(Message::Close(frame)) => {
                recorded.lock().unwrap().close_code = frame.map(|f| u16::from(f.code));
                break;
            }
            Ok(Message::Ping(data)) => {
                write.send(Message::Pong(data)).await?;
            }
            Err(_) => break,
            _ => {}
        }
    }

    Ok(())
}
