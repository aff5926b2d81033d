pub mod pcm;

pub use pcm::{resample_to_pcm16, to_le_bytes, TARGET_SAMPLE_RATE};
