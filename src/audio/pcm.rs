//! PCM16 encoding and box-filter downsampling
//!
//! Converts captured floating-point sample blocks at an arbitrary device
//! rate into the fixed 16 kHz, 16-bit signed little-endian mono format the
//! recognizer expects. These functions are pure and stateless; they are
//! invoked once per captured block.

/// Sample rate the recognizer is configured for. The recognizer has no
/// independent means of detecting sample rate, so every audio frame on the
/// wire must already be at this rate.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Convert a float sample in [-1, 1] to signed 16-bit PCM.
///
/// The scale is asymmetric (32767 for positives, 32768 for negatives) to
/// match the two's-complement signed 16-bit range exactly.
fn float_to_pcm16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Resample a block of float samples from `from_rate` to `to_rate` and
/// encode as PCM16.
///
/// Equal rates is the identity length transform: each sample is clamped and
/// scaled. Differing rates use box-filter downsampling: the output length is
/// `round(len / ratio)` with `ratio = from_rate / to_rate`, and each output
/// sample is the arithmetic mean of the input samples in its
/// boundary-rounded, non-overlapping window. An empty window yields 0.
/// Empty input yields an empty frame.
pub fn resample_to_pcm16(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if samples.is_empty() {
        return Vec::new();
    }

    if from_rate == to_rate {
        return samples.iter().copied().map(float_to_pcm16).collect();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = (samples.len() as f64 / ratio).round() as usize;
    let mut out = Vec::with_capacity(out_len);

    let mut window_start = 0usize;
    for i in 0..out_len {
        let window_end = (((i + 1) as f64) * ratio).round() as usize;
        let window_end = window_end.min(samples.len());
        let window = &samples[window_start.min(window_end)..window_end];

        let mean = if window.is_empty() {
            0.0
        } else {
            window.iter().sum::<f32>() / window.len() as f32
        };

        out.push(float_to_pcm16(mean));
        window_start = window_end;
    }

    out
}

/// Serialize PCM16 samples as little-endian bytes for the wire.
pub fn to_le_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}
