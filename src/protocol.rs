//! Wire protocol for the `/stt` duplex channel
//!
//! Inbound (client → server): binary frames carry raw PCM16LE mono audio at
//! 16 kHz; text frames carry JSON control messages. Outbound (server →
//! client): JSON text frames only. Control messages are a closed tagged
//! union; anything outside the set fails deserialization and is ignored by
//! the dispatcher.

use serde::{Deserialize, Serialize};

/// Control message sent by the client as a JSON text frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlMessage {
    /// Select the recognition language for the next stream start.
    Lang { language: String },
    /// Signal end-of-audio; the active stream drains and finalizes.
    Stop,
}

/// Event sent by the server as a JSON text frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Emitted once per connection, immediately after accept.
    Session { session_id: String },
    /// Acknowledges each language control message.
    LangAck { language: String },
    /// One recognizer result with non-empty text.
    Transcript {
        text: String,
        is_partial: bool,
        session_id: String,
    },
}

/// A single transcript callback payload, before it is tagged with a session.
///
/// Partial events are superseded by later events for the same utterance and
/// are never retried; final events are terminal for that utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEvent {
    pub text: String,
    pub is_partial: bool,
}

/// Close reason used for a normal session end (code 1000).
pub const SESSION_ENDED_REASON: &str = "Session ended";
