pub mod audio;
pub mod capture;
pub mod client;
pub mod config;
pub mod protocol;
pub mod recognizer;
pub mod server;
pub mod session;

pub use audio::{resample_to_pcm16, to_le_bytes, TARGET_SAMPLE_RATE};
pub use capture::{CaptureBlock, CaptureController, CaptureDevice, CaptureState, WavCapture};
pub use client::ClientTransport;
pub use config::Config;
pub use protocol::{ControlMessage, ServerEvent, TranscriptEvent};
pub use recognizer::{
    BridgeOptions, BridgeState, RecognizerBridge, RecognizerError, RecognizerResult,
    SpeechRecognizer, WsRecognizer, WsRecognizerConfig,
};
pub use server::{create_router, AppState, Dispatcher, SessionOptions};
pub use session::{AudioMessage, Session, SessionStats};
