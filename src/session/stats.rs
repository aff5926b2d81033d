use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Diagnostic statistics for one session, served by `GET /sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Opaque session id assigned at connect time
    pub session_id: String,

    /// When the connection was accepted
    pub started_at: DateTime<Utc>,

    /// Connection age in seconds
    pub duration_secs: f64,

    /// Latest requested language, if any
    pub language: Option<String>,

    /// Audio frames received so far
    pub chunks_received: u64,

    /// Cumulative audio bytes received
    pub bytes_received: u64,
}
