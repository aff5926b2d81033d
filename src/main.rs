use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use stt_gateway::recognizer::{WsRecognizer, WsRecognizerConfig};
use stt_gateway::server::{create_router, AppState, SessionOptions};
use stt_gateway::Config;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "stt-gateway", about = "Real-time speech transcription gateway")]
struct Args {
    /// Configuration file (without extension)
    #[arg(long, default_value = "config/stt-gateway")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v0.1.0", cfg.service.name);
    info!(
        "Gateway will bind to {}:{}",
        cfg.service.http.bind, cfg.service.http.port
    );
    info!("Recognizer backend: {}", cfg.recognizer.url);

    let recognizer = Arc::new(WsRecognizer::new(WsRecognizerConfig {
        url: cfg.recognizer.url.clone(),
    }));

    let state = AppState::new(recognizer, SessionOptions::from_config(&cfg));
    let router = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Listening on {}", addr);
    axum::serve(listener, router).await.context("server error")?;

    Ok(())
}
