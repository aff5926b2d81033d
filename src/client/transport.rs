use crate::protocol::{ControlMessage, ServerEvent, SESSION_ENDED_REASON};
use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite, MaybeTlsStream, WebSocketStream};
use tracing::{info, warn};

type WsSink =
    futures::stream::SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, tungstenite::Message>;

/// One duplex connection to the gateway.
///
/// Sends control messages and binary audio frames; server events arrive on
/// the receiver returned by [`ClientTransport::connect`]. The transport does
/// not auto-reconnect: after a drop the caller re-invokes capture start.
pub struct ClientTransport {
    sink: Mutex<WsSink>,
    open: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

impl ClientTransport {
    /// Open the duplex connection and start the inbound event reader.
    pub async fn connect(url: &str) -> Result<(Self, mpsc::Receiver<ServerEvent>)> {
        let (ws, _) = connect_async(url)
            .await
            .with_context(|| format!("failed to connect to {url}"))?;

        info!(%url, "transport connected");

        let (sink, mut stream) = ws.split();
        let (events_tx, events_rx) = mpsc::channel(64);
        let open = Arc::new(AtomicBool::new(true));

        let reader = {
            let open = Arc::clone(&open);
            tokio::spawn(async move {
                while let Some(message) = stream.next().await {
                    match message {
                        Ok(tungstenite::Message::Text(text)) => {
                            match serde_json::from_str::<ServerEvent>(&text) {
                                Ok(event) => {
                                    if events_tx.send(event).await.is_err() {
                                        break;
                                    }
                                }
                                Err(err) => {
                                    warn!(error = %err, "unparseable server event, ignoring");
                                }
                            }
                        }
                        Ok(tungstenite::Message::Close(_)) | Err(_) => break,
                        Ok(_) => {}
                    }
                }
                open.store(false, Ordering::SeqCst);
            })
        };

        let transport = Self {
            sink: Mutex::new(sink),
            open,
            reader,
        };

        Ok((transport, events_rx))
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Send one PCM16LE audio frame.
    pub async fn send_audio(&self, frame: Vec<u8>) -> Result<()> {
        let mut sink = self.sink.lock().await;
        sink.send(tungstenite::Message::Binary(frame))
            .await
            .context("failed to send audio frame")
    }

    /// Send a control message as a JSON text frame.
    pub async fn send_control(&self, message: &ControlMessage) -> Result<()> {
        let payload = serde_json::to_string(message).context("failed to encode control message")?;
        let mut sink = self.sink.lock().await;
        sink.send(tungstenite::Message::Text(payload))
            .await
            .context("failed to send control message")
    }

    /// Close the connection with a normal session-end frame (code 1000).
    pub async fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            let mut sink = self.sink.lock().await;
            let frame = tungstenite::protocol::CloseFrame {
                code: tungstenite::protocol::frame::coding::CloseCode::Normal,
                reason: Cow::from(SESSION_ENDED_REASON),
            };
            let _ = sink.send(tungstenite::Message::Close(Some(frame))).await;
            let _ = sink.close().await;
        }
        self.reader.abort();
    }
}
