use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub recognizer: RecognizerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Bounded per-session audio queue, in frames
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecognizerConfig {
    /// Streaming recognizer WebSocket endpoint
    pub url: String,
    /// Backoff before reopening a timed-out stream
    pub restart_backoff_ms: u64,
    /// Locale used for unmapped language codes
    pub fallback_locale: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
