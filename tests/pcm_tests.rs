// Unit tests for the PCM16 encoder and box-filter downsampler.

use stt_gateway::audio::{resample_to_pcm16, to_le_bytes};

#[test]
fn equal_rates_preserve_length() {
    let samples = vec![0.25_f32; 1000];
    let out = resample_to_pcm16(&samples, 16_000, 16_000);
    assert_eq!(out.len(), 1000);
}

#[test]
fn downsample_length_is_rounded_ratio() {
    let samples = vec![0.1_f32; 4096];
    let out = resample_to_pcm16(&samples, 48_000, 16_000);
    // round(4096 / 3)
    assert_eq!(out.len(), 1365);

    let samples = vec![0.1_f32; 1000];
    let out = resample_to_pcm16(&samples, 44_100, 16_000);
    // round(1000 / 2.75625)
    assert_eq!(out.len(), 363);
}

#[test]
fn downsampled_output_stays_in_pcm16_range() {
    // Values outside [-1, 1] must clamp, not wrap.
    let mut samples = vec![2.0_f32; 300];
    samples.extend(vec![-2.0_f32; 300]);
    let out = resample_to_pcm16(&samples, 48_000, 16_000);
    assert!(!out.is_empty());
    for sample in &out {
        assert!((i16::MIN..=i16::MAX).contains(sample));
    }
    assert_eq!(out[0], i16::MAX);
    assert_eq!(*out.last().unwrap(), i16::MIN);
}

#[test]
fn scaling_is_asymmetric() {
    let out = resample_to_pcm16(&[1.0, -1.0, 0.5], 16_000, 16_000);
    assert_eq!(out, vec![32767, -32768, 16383]);
}

#[test]
fn zero_input_yields_zero_output() {
    for len in [1usize, 17, 480, 1000] {
        let samples = vec![0.0_f32; len];
        let out = resample_to_pcm16(&samples, 44_100, 16_000);
        let expected_len = (len as f64 / (44_100.0 / 16_000.0)).round() as usize;
        assert_eq!(out.len(), expected_len);
        assert!(out.iter().all(|&s| s == 0));
    }
}

#[test]
fn empty_input_yields_empty_frame() {
    assert!(resample_to_pcm16(&[], 48_000, 16_000).is_empty());
    assert!(resample_to_pcm16(&[], 16_000, 16_000).is_empty());
}

#[test]
fn downsample_averages_windows() {
    // Ratio 2: each output sample is the mean of two inputs.
    let samples = vec![0.5, 0.5, -0.5, -0.5, 0.0, 1.0];
    let out = resample_to_pcm16(&samples, 32_000, 16_000);
    assert_eq!(out.len(), 3);
    assert_eq!(out[0], 16383); // mean 0.5
    assert_eq!(out[1], -16384); // mean -0.5
    assert_eq!(out[2], 16383); // mean 0.5
}

#[test]
fn little_endian_byte_order() {
    let bytes = to_le_bytes(&[0x0102, -2]);
    assert_eq!(bytes, vec![0x02, 0x01, 0xFE, 0xFF]);
}
