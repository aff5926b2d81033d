use super::state::AppState;
use crate::protocol::{ControlMessage, ServerEvent};
use crate::recognizer::RecognizerBridge;
use crate::session::Session;
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// GET /stt
/// Upgrade to the transcription session protocol
pub async fn stt_handler(
    State(state): State<AppState>,
    upgrade: WebSocketUpgrade,
) -> impl IntoResponse {
    upgrade.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: AppState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<ServerEvent>(64);

    // Outbound side: serialize events to JSON text frames.
    let send_task = tokio::spawn(async move {
        while let Some(event) = out_rx.recv().await {
            let payload = match serde_json::to_string(&event) {
                Ok(payload) => payload,
                Err(err) => {
                    error!(error = %err, "failed to serialize server event");
                    continue;
                }
            };
            if sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    let dispatcher = Dispatcher::connect(state, out_tx).await;
    info!(session_id = %dispatcher.session_id(), "websocket connected");

    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Binary(data) => dispatcher.handle_binary(data).await,
            Message::Text(text) => dispatcher.handle_text(&text).await,
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    dispatcher.disconnect().await;
    send_task.abort();
}

/// Per-connection protocol state machine layered over a [`Session`].
///
/// Parses inbound control/binary frames and drives the recognizer bridge
/// and the session registry. Tested directly, without a live socket.
pub struct Dispatcher {
    state: AppState,
    session: Arc<Session>,
    bridge: Arc<RecognizerBridge>,
    out: mpsc::Sender<ServerEvent>,
    pump: JoinHandle<()>,
}

impl Dispatcher {
    /// Create and register a session for a freshly accepted connection, and
    /// emit its identity event to the peer.
    pub async fn connect(state: AppState, out: mpsc::Sender<ServerEvent>) -> Self {
        let session_id = uuid::Uuid::new_v4().to_string();

        let (session, audio_rx) =
            Session::new(session_id.clone(), state.options.queue_capacity);
        let session = Arc::new(session);

        let (transcript_tx, mut transcript_rx) = mpsc::channel(64);
        let bridge = Arc::new(RecognizerBridge::new(
            Arc::clone(&state.recognizer),
            audio_rx,
            session.audio_sender(),
            transcript_tx,
            session.closed_flag(),
            state.options.bridge_options(),
        ));

        state.register_session(Arc::clone(&session)).await;

        let _ = out
            .send(ServerEvent::Session {
                session_id: session_id.clone(),
            })
            .await;

        // Transcript events flow to the client in recognizer emission order.
        let pump = {
            let out = out.clone();
            let session_id = session_id.clone();
            tokio::spawn(async move {
                while let Some(event) = transcript_rx.recv().await {
                    let sent = out
                        .send(ServerEvent::Transcript {
                            text: event.text,
                            is_partial: event.is_partial,
                            session_id: session_id.clone(),
                        })
                        .await;
                    if sent.is_err() {
                        break;
                    }
                }
            })
        };

        Self {
            state,
            session,
            bridge,
            out,
            pump,
        }
    }

    pub fn session_id(&self) -> &str {
        self.session.id()
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn bridge(&self) -> &Arc<RecognizerBridge> {
        &self.bridge
    }

    /// One binary audio frame.
    ///
    /// Lazy start: the recognizer stream is not opened until the first audio
    /// frame arrives with a language selected; a connection that only sends
    /// control messages never opens a recognizer stream. Frames that arrive
    /// before any language selection are buffered, not dropped; recognition
    /// starts retroactively once a language is chosen and the next frame
    /// arrives.
    pub async fn handle_binary(&self, data: Vec<u8>) {
        if self.session.is_closed() {
            return;
        }

        if !self.bridge.is_active() {
            if let Some(language) = self.session.pending_language() {
                self.bridge.start(&language);
            }
        }

        self.session.push_chunk(data);
    }

    /// One text frame: a control message, or noise to be ignored.
    pub async fn handle_text(&self, text: &str) {
        if self.session.is_closed() {
            return;
        }

        if text.is_empty() {
            warn!(session_id = %self.session.id(), "empty text frame, ignoring");
            return;
        }

        let message: ControlMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(err) => {
                warn!(
                    session_id = %self.session.id(),
                    error = %err,
                    "malformed control frame, ignoring"
                );
                return;
            }
        };

        match message {
            ControlMessage::Lang { language } => {
                info!(session_id = %self.session.id(), %language, "language selected");
                self.session.set_pending_language(language.clone());
                let _ = self.out.send(ServerEvent::LangAck { language }).await;
            }
            ControlMessage::Stop => {
                // End-of-audio lets the stream drain and finalize; the
                // connection stays open for another lang/start cycle.
                info!(session_id = %self.session.id(), "stop requested");
                self.session.push_end();
            }
        }
    }

    /// Connection close or error: mark the session closed, signal
    /// end-of-audio, and remove the session from the registry.
    pub async fn disconnect(&self) {
        if self.session.mark_closed() {
            info!(session_id = %self.session.id(), "websocket disconnected");
        }
        self.bridge.stop();
        self.state.remove_session(self.session.id()).await;
        self.pump.abort();
    }
}
