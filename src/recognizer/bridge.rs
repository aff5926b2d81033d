use super::service::{
    resolve_locale, AudioStream, RecognizerError, RecognizerResult, SpeechRecognizer,
};
use crate::protocol::TranscriptEvent;
use crate::session::AudioMessage;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Recognizer bridge lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// No live recognizer stream
    Stopped,
    /// A stream is running
    Active,
    /// Waiting out the backoff after a provider idle timeout
    Restarting,
}

const STOPPED: u8 = 0;
const ACTIVE: u8 = 1;
const RESTARTING: u8 = 2;

/// Tuning knobs for the bridge's restart path.
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Fixed backoff before reopening after an idle timeout
    pub restart_backoff: Duration,
    /// Locale used for unmapped language codes
    pub fallback_locale: String,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            restart_backoff: Duration::from_millis(100),
            fallback_locale: super::service::DEFAULT_FALLBACK_LOCALE.to_string(),
        }
    }
}

/// Adapts one session's buffered audio into a live recognizer stream and
/// forwards each result's top alternative to the transcript callback.
///
/// State machine: `Stopped → Active → Stopped`, with `Restarting` as a
/// transient state for provider idle timeouts. A session has at most one
/// live recognizer stream; `start` is idempotent while not `Stopped`.
pub struct RecognizerBridge {
    recognizer: Arc<dyn SpeechRecognizer>,
    audio_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<AudioMessage>>>,
    audio_tx: mpsc::Sender<AudioMessage>,
    transcripts: mpsc::Sender<TranscriptEvent>,
    state: Arc<AtomicU8>,
    closed: Arc<AtomicBool>,
    options: BridgeOptions,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RecognizerBridge {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        audio_rx: mpsc::Receiver<AudioMessage>,
        audio_tx: mpsc::Sender<AudioMessage>,
        transcripts: mpsc::Sender<TranscriptEvent>,
        closed: Arc<AtomicBool>,
        options: BridgeOptions,
    ) -> Self {
        Self {
            recognizer,
            audio_rx: Arc::new(tokio::sync::Mutex::new(audio_rx)),
            audio_tx,
            transcripts,
            state: Arc::new(AtomicU8::new(STOPPED)),
            closed,
            options,
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> BridgeState {
        match self.state.load(Ordering::SeqCst) {
            ACTIVE => BridgeState::Active,
            RESTARTING => BridgeState::Restarting,
            _ => BridgeState::Stopped,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() != BridgeState::Stopped
    }

    /// Open a recognizer stream for `language`. No-op unless `Stopped`.
    pub fn start(&self, language: &str) {
        if self
            .state
            .compare_exchange(STOPPED, ACTIVE, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let locale = resolve_locale(language, &self.options.fallback_locale);
        info!(language, %locale, "starting recognizer stream");

        let handle = tokio::spawn(Self::run(
            Arc::clone(&self.recognizer),
            Arc::clone(&self.audio_rx),
            self.transcripts.clone(),
            Arc::clone(&self.state),
            Arc::clone(&self.closed),
            self.options.restart_backoff,
            locale,
        ));

        let mut task = self.task.lock().unwrap();
        *task = Some(handle);
    }

    /// Force `Stopped` and signal end-of-audio. Safe when already stopped.
    pub fn stop(&self) {
        self.state.store(STOPPED, Ordering::SeqCst);
        let _ = self.audio_tx.try_send(AudioMessage::End);
    }

    async fn run(
        recognizer: Arc<dyn SpeechRecognizer>,
        audio_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<AudioMessage>>>,
        transcripts: mpsc::Sender<TranscriptEvent>,
        state: Arc<AtomicU8>,
        closed: Arc<AtomicBool>,
        backoff: Duration,
        locale: String,
    ) {
        // Each stream attempt gets an epoch; bumping it cuts the previous
        // attempt's audio consumer so a dead backend relay cannot keep
        // draining the shared queue.
        let (epoch_tx, epoch_rx) = watch::channel(0u64);
        let mut attempt = 0u64;

        loop {
            let audio = Self::pull_audio(Arc::clone(&audio_rx), epoch_rx.clone(), attempt);

            let outcome = match recognizer.open_stream(&locale, audio).await {
                Ok(mut results) => loop {
                    match results.next().await {
                        Some(Ok(result)) => Self::forward(result, &transcripts).await,
                        Some(Err(err)) => break Err(err),
                        None => break Ok(()),
                    }
                },
                Err(err) => Err(err),
            };

            match outcome {
                Ok(()) => {
                    info!(%locale, "recognizer stream drained");
                    break;
                }
                Err(err) if err.is_timeout() && !closed.load(Ordering::SeqCst) => {
                    // Provider-imposed idle timeout: recoverable. Frames that
                    // arrive during the gap stay queued and reach the next
                    // stream in order.
                    warn!(%locale, error = %err, "recognizer idle timeout, restarting");
                    attempt += 1;
                    let _ = epoch_tx.send(attempt);
                    state.store(RESTARTING, Ordering::SeqCst);
                    tokio::time::sleep(backoff).await;
                    if closed.load(Ordering::SeqCst) {
                        break;
                    }
                    state.store(ACTIVE, Ordering::SeqCst);
                }
                Err(err) => {
                    error!(%locale, error = %err, "recognizer stream failed");
                    break;
                }
            }
        }

        state.store(STOPPED, Ordering::SeqCst);
    }

    /// Lazy pull-based audio source over the shared sink receiver,
    /// terminated by the end-of-audio sentinel, sender drop, or an epoch
    /// change.
    ///
    /// The epoch gate is checked ahead of every receive: once `attempt` is
    /// superseded the stream ends without consuming a frame, even if the
    /// backend keeps polling it, so queued frames stay for the next attempt.
    fn pull_audio(
        audio_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<AudioMessage>>>,
        epoch: watch::Receiver<u64>,
        attempt: u64,
    ) -> AudioStream {
        stream::unfold((audio_rx, epoch), move |(audio_rx, mut epoch)| async move {
            if *epoch.borrow() != attempt {
                return None;
            }
            let next = tokio::select! {
                biased;
                _ = epoch.wait_for(|current| *current != attempt) => None,
                next = async { audio_rx.lock().await.recv().await } => next,
            };
            match next {
                Some(AudioMessage::Chunk(data)) => Some((data, (audio_rx, epoch))),
                Some(AudioMessage::End) | None => None,
            }
        })
        .boxed()
    }

    /// Deliver one result's top alternative, unconditionally and exactly
    /// once, if its text is non-empty.
    async fn forward(result: RecognizerResult, transcripts: &mpsc::Sender<TranscriptEvent>) {
        let Some(text) = result.top_transcript() else {
            return;
        };
        if text.is_empty() {
            return;
        }

        let event = TranscriptEvent {
            text: text.to_string(),
            is_partial: result.is_partial,
        };
        let _ = transcripts.send(event).await;
    }
}
