use crate::config::Config;
use crate::recognizer::{BridgeOptions, SpeechRecognizer, DEFAULT_FALLBACK_LOCALE};
use crate::session::Session;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Per-session tuning derived from configuration.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Bounded audio queue capacity, in frames
    pub queue_capacity: usize,
    /// Backoff before reopening a timed-out recognizer stream
    pub restart_backoff: Duration,
    /// Locale used for unmapped language codes
    pub fallback_locale: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            restart_backoff: Duration::from_millis(100),
            fallback_locale: DEFAULT_FALLBACK_LOCALE.to_string(),
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            queue_capacity: config.audio.queue_capacity,
            restart_backoff: Duration::from_millis(config.recognizer.restart_backoff_ms),
            fallback_locale: config.recognizer.fallback_locale.clone(),
        }
    }

    pub fn bridge_options(&self) -> BridgeOptions {
        BridgeOptions {
            restart_backoff: self.restart_backoff,
            fallback_locale: self.fallback_locale.clone(),
        }
    }
}

/// Shared application state: the session registry and the recognizer
/// backend.
///
/// The registry is owned by the composition root and passed by reference to
/// every dispatcher; entries are inserted on connect and removed on close,
/// never cleared except at shutdown.
#[derive(Clone)]
pub struct AppState {
    /// Active sessions (session_id → session)
    pub sessions: Arc<RwLock<HashMap<String, Arc<Session>>>>,

    /// External streaming recognizer
    pub recognizer: Arc<dyn SpeechRecognizer>,

    pub options: SessionOptions,
}

impl AppState {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>, options: SessionOptions) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            recognizer,
            options,
        }
    }

    pub async fn register_session(&self, session: Arc<Session>) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id().to_string(), session);
    }

    /// Remove a session from the registry. Returns it if this call removed
    /// it; a second removal of the same id yields `None`.
    pub async fn remove_session(&self, session_id: &str) -> Option<Arc<Session>> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id)
    }

    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }
}
