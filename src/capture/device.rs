use anyhow::{Context, Result};
use hound::WavReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

/// One captured block of floating-point samples in [-1, 1], mono, with the
/// rate the device produced it at.
#[derive(Debug, Clone)]
pub struct CaptureBlock {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Audio capture device seam.
///
/// Implementations deliver blocks on the returned channel until stopped or
/// exhausted; no block may arrive after `stop` returns.
#[async_trait::async_trait]
pub trait CaptureDevice: Send {
    /// Begin capturing audio
    ///
    /// Returns a channel receiver that will receive capture blocks
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureBlock>>;

    /// Stop capturing audio
    async fn stop(&mut self) -> Result<()>;

    /// Device name for logging
    fn name(&self) -> &str;
}

/// Capture device backed by a WAV file, delivered in fixed-size blocks at
/// roughly real-time pace. Stereo input is averaged down to mono.
pub struct WavCapture {
    path: PathBuf,
    block_size: usize,
    capturing: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl WavCapture {
    pub fn new(path: impl AsRef<Path>, block_size: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            block_size: block_size.max(1),
            capturing: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    fn read_mono_f32(path: &Path) -> Result<(Vec<f32>, u32)> {
        let reader = WavReader::open(path).context("failed to open WAV file")?;
        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("failed to read audio samples")?;

        let mono: Vec<f32> = if spec.channels == 2 {
            samples
                .chunks_exact(2)
                .map(|pair| (pair[0] as f32 + pair[1] as f32) / 2.0 / 32768.0)
                .collect()
        } else {
            samples.iter().map(|&s| s as f32 / 32768.0).collect()
        };

        Ok((mono, spec.sample_rate))
    }
}

#[async_trait::async_trait]
impl CaptureDevice for WavCapture {
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureBlock>> {
        let (samples, sample_rate) = Self::read_mono_f32(&self.path)?;

        info!(
            path = %self.path.display(),
            sample_rate,
            samples = samples.len(),
            "WAV capture started"
        );

        let (tx, rx) = mpsc::channel(16);
        let block_size = self.block_size;
        let capturing = Arc::clone(&self.capturing);
        capturing.store(true, Ordering::SeqCst);

        let block_duration =
            std::time::Duration::from_secs_f64(block_size as f64 / sample_rate as f64);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(block_duration);
            for block in samples.chunks(block_size) {
                ticker.tick().await;
                if !capturing.load(Ordering::SeqCst) {
                    break;
                }
                let sent = tx
                    .send(CaptureBlock {
                        samples: block.to_vec(),
                        sample_rate,
                    })
                    .await;
                if sent.is_err() {
                    break;
                }
            }
        });

        self.task = Some(task);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.capturing.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "wav-file"
    }
}
