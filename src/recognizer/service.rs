use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio::sync::mpsc;

/// Locale used when a requested language code has no mapping and no
/// region separator.
pub const DEFAULT_FALLBACK_LOCALE: &str = "en-US";

/// Lazy pull-based audio source handed to a recognizer stream. Yields
/// PCM16LE frames in arrival order and terminates at end-of-audio.
pub type AudioStream = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;

/// Incremental results from a live recognizer stream. A mid-stream error
/// terminates the stream.
pub type ResultStream = Pin<Box<dyn Stream<Item = Result<RecognizerResult, RecognizerError>> + Send>>;

/// One incremental recognition result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizerResult {
    pub is_partial: bool,
    pub alternatives: Vec<Alternative>,
}

/// A candidate transcription; the first alternative is the best one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alternative {
    pub transcript: String,
}

impl RecognizerResult {
    pub fn partial(text: impl Into<String>) -> Self {
        Self::with_text(text, true)
    }

    pub fn final_result(text: impl Into<String>) -> Self {
        Self::with_text(text, false)
    }

    fn with_text(text: impl Into<String>, is_partial: bool) -> Self {
        Self {
            is_partial,
            alternatives: vec![Alternative {
                transcript: text.into(),
            }],
        }
    }

    /// Trimmed text of the top alternative, if any.
    pub fn top_transcript(&self) -> Option<&str> {
        self.alternatives.first().map(|alt| alt.transcript.trim())
    }
}

/// Errors raised by a recognizer stream.
///
/// `IdleTimeout` is the known provider behavior for idle long-lived streams
/// and is recovered locally by the bridge; everything else is fatal for the
/// session.
#[derive(Debug, thiserror::Error)]
pub enum RecognizerError {
    #[error("recognizer stream idle timeout: {0}")]
    IdleTimeout(String),

    #[error("recognizer transport failure: {0}")]
    Transport(String),

    #[error("recognizer protocol failure: {0}")]
    Protocol(String),
}

impl RecognizerError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RecognizerError::IdleTimeout(_))
    }
}

/// Opaque streaming speech recognizer.
///
/// `open_stream` configures a live session for a resolved locale and a fixed
/// encoding (16-bit PCM at 16 kHz, matching `audio::pcm`), consumes `audio`
/// lazily, and emits incremental results until the audio side ends.
#[async_trait::async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn open_stream(
        &self,
        language: &str,
        audio: AudioStream,
    ) -> Result<ResultStream, RecognizerError>;

    /// Implementation name for logging
    fn name(&self) -> &str;
}

/// Resolve a UI language code to a recognizer locale tag.
///
/// Known two-letter codes map through a static table; codes already carrying
/// a region separator pass through unchanged; anything else falls back.
pub fn resolve_locale(language: &str, fallback: &str) -> String {
    match language {
        "en" => "en-US".to_string(),
        "hi" => "hi-IN".to_string(),
        code if code.contains('-') => code.to_string(),
        _ => fallback.to_string(),
    }
}

/// Channel-backed `ResultStream`, for recognizer implementations that read
/// results on a background task.
pub fn results_channel(
    capacity: usize,
) -> (
    mpsc::Sender<Result<RecognizerResult, RecognizerError>>,
    ResultStream,
) {
    let (tx, rx) = mpsc::channel(capacity);
    let stream = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    })
    .boxed();
    (tx, stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_mapping() {
        assert_eq!(resolve_locale("en", DEFAULT_FALLBACK_LOCALE), "en-US");
        assert_eq!(resolve_locale("hi", DEFAULT_FALLBACK_LOCALE), "hi-IN");
        assert_eq!(resolve_locale("fr-CA", DEFAULT_FALLBACK_LOCALE), "fr-CA");
        assert_eq!(resolve_locale("zz", DEFAULT_FALLBACK_LOCALE), "en-US");
        assert_eq!(resolve_locale("zz", "hi-IN"), "hi-IN");
    }

    #[test]
    fn top_transcript_is_trimmed() {
        let result = RecognizerResult::final_result("  hello world ");
        assert_eq!(result.top_transcript(), Some("hello world"));

        let empty = RecognizerResult {
            is_partial: false,
            alternatives: vec![],
        };
        assert_eq!(empty.top_transcript(), None);
    }
}
