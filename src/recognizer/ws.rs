use super::service::{
    results_channel, AudioStream, RecognizerError, RecognizerResult, ResultStream,
    SpeechRecognizer,
};
use crate::audio::TARGET_SAMPLE_RATE;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_tungstenite::{connect_async, tungstenite};
use tracing::{info, warn};

/// Connection settings for a WebSocket-fronted streaming recognizer.
#[derive(Debug, Clone)]
pub struct WsRecognizerConfig {
    /// Recognizer endpoint, e.g. `ws://localhost:5003/asr`
    pub url: String,
}

/// Start request sent as the first text frame of a recognizer stream.
#[derive(Debug, Serialize)]
struct StartRequest<'a> {
    language: &'a str,
    sample_rate: u32,
    encoding: &'a str,
}

/// Result payload shape emitted by the recognizer service.
#[derive(Debug, Deserialize)]
struct ResultsPayload {
    results: Vec<RecognizerResult>,
}

/// Streaming recognizer backend reached over a WebSocket.
///
/// Each `open_stream` call opens a fresh connection, announces the language
/// and fixed media format, relays the audio source as binary frames, and
/// parses incremental JSON result payloads until the service closes the
/// stream.
pub struct WsRecognizer {
    config: WsRecognizerConfig,
}

impl WsRecognizer {
    pub fn new(config: WsRecognizerConfig) -> Self {
        Self { config }
    }

    fn classify(message: &str) -> RecognizerError {
        let lowered = message.to_lowercase();
        if lowered.contains("timeout") || lowered.contains("timed out") {
            RecognizerError::IdleTimeout(message.to_string())
        } else {
            RecognizerError::Transport(message.to_string())
        }
    }
}

#[async_trait::async_trait]
impl SpeechRecognizer for WsRecognizer {
    async fn open_stream(
        &self,
        language: &str,
        mut audio: AudioStream,
    ) -> Result<ResultStream, RecognizerError> {
        let (ws, _) = connect_async(&self.config.url)
            .await
            .map_err(|err| RecognizerError::Transport(err.to_string()))?;

        info!(url = %self.config.url, language, "recognizer stream opened");

        let (mut sink, mut stream) = ws.split();

        let start = StartRequest {
            language,
            sample_rate: TARGET_SAMPLE_RATE,
            encoding: "pcm",
        };
        let start = serde_json::to_string(&start)
            .map_err(|err| RecognizerError::Protocol(err.to_string()))?;
        sink.send(tungstenite::Message::Text(start))
            .await
            .map_err(|err| RecognizerError::Transport(err.to_string()))?;

        // Audio side: relay frames until the source ends, then close so the
        // service can finalize.
        tokio::spawn(async move {
            while let Some(frame) = audio.next().await {
                if sink.send(tungstenite::Message::Binary(frame)).await.is_err() {
                    return;
                }
            }
            let _ = sink.close().await;
        });

        // Result side: parse payloads on a background task; a mid-stream
        // error terminates the result stream with its classification.
        let (results_tx, results) = results_channel(64);
        tokio::spawn(async move {
            while let Some(message) = stream.next().await {
                match message {
                    Ok(tungstenite::Message::Text(text)) => {
                        match serde_json::from_str::<ResultsPayload>(&text) {
                            Ok(payload) => {
                                for result in payload.results {
                                    if results_tx.send(Ok(result)).await.is_err() {
                                        return;
                                    }
                                }
                            }
                            Err(err) => {
                                warn!(error = %err, "unparseable recognizer payload, ignoring");
                            }
                        }
                    }
                    Ok(tungstenite::Message::Close(frame)) => {
                        if let Some(frame) = frame {
                            if frame.code != tungstenite::protocol::frame::coding::CloseCode::Normal
                            {
                                let _ = results_tx
                                    .send(Err(Self::classify(frame.reason.as_ref())))
                                    .await;
                            }
                        }
                        return;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        let _ = results_tx.send(Err(Self::classify(&err.to_string()))).await;
                        return;
                    }
                }
            }
        });

        Ok(results)
    }

    fn name(&self) -> &str {
        "ws-recognizer"
    }
}
