//! Per-connection session state
//!
//! A `Session` is created when a duplex connection is accepted and removed
//! from the registry when that connection closes or errors. It owns the
//! bounded audio sink feeding the recognizer bridge and the bookkeeping the
//! dispatcher needs: the pending language selection, the closed flag, and
//! diagnostic counters.

mod session;
mod stats;

pub use session::{AudioMessage, Session};
pub use stats::SessionStats;
