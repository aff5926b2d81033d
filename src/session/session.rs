use super::stats::SessionStats;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::warn;

/// One unit on the session's audio sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioMessage {
    /// An immutable PCM16LE mono frame, in arrival order.
    Chunk(Vec<u8>),
    /// End-of-audio sentinel; the recognizer stream drains and finalizes.
    End,
}

/// Server-side state for one duplex connection's transcription lifecycle.
pub struct Session {
    id: String,
    started_at: chrono::DateTime<Utc>,

    /// Bounded audio sink, consumed by the recognizer bridge.
    audio_tx: mpsc::Sender<AudioMessage>,

    /// Language requested by the latest `lang` control message. Takes effect
    /// on the next stream start, never restarts an active stream.
    pending_language: Mutex<Option<String>>,

    /// Set exactly once when the owning connection ends.
    closed: Arc<AtomicBool>,

    // Diagnostics only, not correctness-bearing.
    chunks_received: AtomicU64,
    bytes_received: AtomicU64,
}

impl Session {
    /// Create a session with a bounded audio queue. Returns the receiving
    /// half for the recognizer bridge.
    pub fn new(id: String, queue_capacity: usize) -> (Self, mpsc::Receiver<AudioMessage>) {
        let (audio_tx, audio_rx) = mpsc::channel(queue_capacity);

        let session = Self {
            id,
            started_at: Utc::now(),
            audio_tx,
            pending_language: Mutex::new(None),
            closed: Arc::new(AtomicBool::new(false)),
            chunks_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
        };

        (session, audio_rx)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Sender half of the audio sink, for the bridge's end-of-audio signal.
    pub fn audio_sender(&self) -> mpsc::Sender<AudioMessage> {
        self.audio_tx.clone()
    }

    pub fn set_pending_language(&self, language: String) {
        let mut pending = self.pending_language.lock().unwrap();
        *pending = Some(language);
    }

    pub fn pending_language(&self) -> Option<String> {
        self.pending_language.lock().unwrap().clone()
    }

    /// Append an audio frame to the sink in arrival order.
    ///
    /// The queue is bounded; when it is full the frame is dropped with a
    /// warning rather than blocking the socket read loop, which must stay
    /// responsive to control messages.
    pub fn push_chunk(&self, data: Vec<u8>) {
        let chunk = self.chunks_received.fetch_add(1, Ordering::SeqCst) + 1;
        let bytes = self
            .bytes_received
            .fetch_add(data.len() as u64, Ordering::SeqCst)
            + data.len() as u64;

        if let Err(mpsc::error::TrySendError::Full(_)) =
            self.audio_tx.try_send(AudioMessage::Chunk(data))
        {
            warn!(
                session_id = %self.id,
                chunk, bytes, "audio queue full, dropping frame"
            );
        }
    }

    /// Signal end-of-audio without closing the connection.
    pub fn push_end(&self) {
        if self.audio_tx.try_send(AudioMessage::End).is_err() {
            warn!(session_id = %self.id, "could not queue end-of-audio sentinel");
        }
    }

    /// Mark the session closed. Idempotent; returns whether this call was
    /// the one that closed it.
    pub fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Shared closed flag, observed by the recognizer bridge across its
    /// restart path.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }

    pub fn chunks_received(&self) -> u64 {
        self.chunks_received.load(Ordering::SeqCst)
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received.load(Ordering::SeqCst)
    }

    /// Current diagnostic stats for this session.
    pub fn stats(&self) -> SessionStats {
        let duration = Utc::now().signed_duration_since(self.started_at);

        SessionStats {
            session_id: self.id.clone(),
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            language: self.pending_language(),
            chunks_received: self.chunks_received(),
            bytes_received: self.bytes_received(),
        }
    }
}
