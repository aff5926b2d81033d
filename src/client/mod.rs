//! Client-side transport for the `/stt` protocol

mod transport;

pub use transport::ClientTransport;
