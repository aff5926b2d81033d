//! Streaming speech recognition
//!
//! This module adapts a session's buffered audio into the input contract of
//! an external streaming recognizer and adapts the recognizer's event stream
//! into transcript callbacks:
//! - `SpeechRecognizer` is the seam to the external service
//! - `RecognizerBridge` owns the start/stop/restart state machine
//! - `WsRecognizer` speaks to a recognizer service over WebSocket

mod bridge;
mod service;
mod ws;

pub use bridge::{BridgeOptions, BridgeState, RecognizerBridge};
pub use service::{
    resolve_locale, results_channel, Alternative, AudioStream, RecognizerError, RecognizerResult,
    ResultStream, SpeechRecognizer, DEFAULT_FALLBACK_LOCALE,
};
pub use ws::{WsRecognizer, WsRecognizerConfig};
