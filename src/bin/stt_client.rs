// Streams a WAV file through the capture pipeline to a running gateway and
// prints live transcripts: partials overwrite the current line, finals are
// committed with a newline.
//
// Usage: cargo run --bin stt-client -- --wav path/to/audio.wav

use anyhow::Result;
use clap::Parser;
use std::io::Write;
use stt_gateway::capture::{CaptureController, WavCapture};
use stt_gateway::protocol::ServerEvent;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "stt-client", about = "Live transcription client")]
struct Args {
    /// Gateway WebSocket endpoint
    #[arg(long, default_value = "ws://localhost:3000/stt")]
    server: String,

    /// WAV file to stream
    #[arg(long)]
    wav: String,

    /// Language code for this session
    #[arg(long, default_value = "en")]
    language: String,

    /// Capture block size in samples
    #[arg(long, default_value_t = 4096)]
    block_size: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let device = WavCapture::new(&args.wav, args.block_size);
    let mut controller = CaptureController::new(Box::new(device));

    let mut events = controller.start(&args.server, &args.language).await?;

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(ServerEvent::Session { session_id }) => {
                        info!(%session_id, "session established");
                    }
                    Some(ServerEvent::LangAck { language }) => {
                        info!(%language, "language acknowledged");
                    }
                    Some(ServerEvent::Transcript { text, is_partial, .. }) => {
                        if is_partial {
                            print!("\r{}", text);
                            std::io::stdout().flush().ok();
                        } else {
                            println!("\n{}", text);
                        }
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    controller.stop().await?;
    Ok(())
}
