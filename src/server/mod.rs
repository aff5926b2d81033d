//! WebSocket gateway server
//!
//! This module provides the duplex `/stt` endpoint and its supporting
//! pieces:
//! - GET /stt - upgrade to the transcription session protocol
//! - GET /sessions - diagnostic stats for active sessions
//! - GET /health - health check

mod handlers;
mod routes;
mod socket;
mod state;

pub use routes::create_router;
pub use socket::Dispatcher;
pub use state::{AppState, SessionOptions};
