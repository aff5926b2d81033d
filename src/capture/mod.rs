//! Audio capture and the recording state machine
//!
//! The capture device is a trait seam: implementations yield floating-point
//! sample blocks with a per-block sample rate. The controller owns the
//! device lifecycle and wires captured blocks through the PCM encoder to the
//! client transport.

mod controller;
mod device;

pub use controller::{CaptureController, CaptureState};
pub use device::{CaptureBlock, CaptureDevice, WavCapture};
