// Shared test fixtures: a scripted recognizer mock and a gateway spawner.

#![allow(dead_code)]

use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stt_gateway::recognizer::{
    results_channel, AudioStream, RecognizerError, RecognizerResult, ResultStream,
    SpeechRecognizer,
};
use stt_gateway::server::{create_router, AppState, SessionOptions};

/// Scripted in-process recognizer.
///
/// Successful attempts drain the audio source into `received` and then emit
/// the script. The first `timeout_failures` attempts fail with an idle
/// timeout instead, but keep polling the audio source afterwards the way a
/// live transport relay does; anything such a dead attempt manages to pull
/// lands in `stale`.
pub struct MockRecognizer {
    calls: AtomicUsize,
    timeout_failures: usize,
    fatal: bool,
    script: Mutex<Vec<RecognizerResult>>,
    received: Arc<Mutex<Vec<Vec<u8>>>>,
    stale: Arc<Mutex<Vec<Vec<u8>>>>,
    languages: Mutex<Vec<String>>,
}

impl MockRecognizer {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            timeout_failures: 0,
            fatal: false,
            script: Mutex::new(Vec::new()),
            received: Arc::new(Mutex::new(Vec::new())),
            stale: Arc::new(Mutex::new(Vec::new())),
            languages: Mutex::new(Vec::new()),
        }
    }

    pub fn with_script(self, script: Vec<RecognizerResult>) -> Self {
        *self.script.lock().unwrap() = script;
        self
    }

    pub fn with_timeout_failures(mut self, failures: usize) -> Self {
        self.timeout_failures = failures;
        self
    }

    pub fn with_fatal(mut self) -> Self {
        self.fatal = true;
        self
    }

    /// Number of upstream streams opened so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Audio frames drained by successful attempts, in arrival order.
    pub fn received(&self) -> Vec<Vec<u8>> {
        self.received.lock().unwrap().clone()
    }

    /// Audio frames pulled by already-failed attempts. Anything here was
    /// stolen from a later attempt.
    pub fn stale_frames(&self) -> Vec<Vec<u8>> {
        self.stale.lock().unwrap().clone()
    }

    /// Locales requested per attempt.
    pub fn languages(&self) -> Vec<String> {
        self.languages.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SpeechRecognizer for MockRecognizer {
    async fn open_stream(
        &self,
        language: &str,
        mut audio: AudioStream,
    ) -> Result<ResultStream, RecognizerError> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
        self.languages.lock().unwrap().push(language.to_string());

        if self.fatal {
            return Err(RecognizerError::Transport("mock transport failure".into()));
        }

        if attempt < self.timeout_failures {
            let stale = Arc::clone(&self.stale);
            let (tx, stream) = results_channel(4);
            tokio::spawn(async move {
                let _ = tx
                    .send(Err(RecognizerError::IdleTimeout(
                        "no new audio was received for 15 seconds".into(),
                    )))
                    .await;
                // A live transport relay keeps pulling audio after the
                // result side has failed, until the source is cut.
                while let Some(chunk) = audio.next().await {
                    stale.lock().unwrap().push(chunk);
                }
            });
            return Ok(stream);
        }

        let received = Arc::clone(&self.received);
        let script: Vec<RecognizerResult> = self.script.lock().unwrap().clone();
        let (tx, stream) = results_channel(16);
        tokio::spawn(async move {
            while let Some(chunk) = audio.next().await {
                received.lock().unwrap().push(chunk);
            }
            for result in script {
                if tx.send(Ok(result)).await.is_err() {
                    break;
                }
            }
        });

        Ok(stream)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Bind a gateway on an ephemeral port. Returns the `/stt` URL and the
/// shared state for registry assertions.
pub async fn spawn_gateway(recognizer: Arc<dyn SpeechRecognizer>) -> (String, AppState) {
    let options = SessionOptions {
        restart_backoff: Duration::from_millis(50),
        ..Default::default()
    };
    let state = AppState::new(recognizer, options);
    let router = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("ws://{}/stt", addr), state)
}

/// Poll `check` until it returns true or the timeout elapses.
pub async fn wait_for<F>(mut check: F, timeout: Duration) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
