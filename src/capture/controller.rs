use super::device::CaptureDevice;
use crate::audio::{resample_to_pcm16, to_le_bytes, TARGET_SAMPLE_RATE};
use crate::client::ClientTransport;
use crate::protocol::{ControlMessage, ServerEvent};
use anyhow::{bail, Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

/// Capture lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Starting,
    Recording,
    Stopping,
}

/// Owns the capture device lifecycle and forwards encoded frames to the
/// transport.
///
/// Start order matters: the transport is opened before the capture device,
/// so a connection failure never opens the device; a device failure releases
/// the transport and returns to `Idle`. There is no timer-based auto-stop;
/// recording ends only on explicit stop or disconnect.
pub struct CaptureController {
    device: Box<dyn CaptureDevice>,
    transport: Option<Arc<ClientTransport>>,
    state: CaptureState,
    recording: Arc<AtomicBool>,
    forward_task: Option<JoinHandle<()>>,
}

impl CaptureController {
    pub fn new(device: Box<dyn CaptureDevice>) -> Self {
        Self {
            device,
            transport: None,
            state: CaptureState::Idle,
            recording: Arc::new(AtomicBool::new(false)),
            forward_task: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Connect, select the language, open the capture device, and start
    /// forwarding encoded frames. Returns the server event receiver.
    pub async fn start(
        &mut self,
        server_url: &str,
        language: &str,
    ) -> Result<mpsc::Receiver<ServerEvent>> {
        if self.state != CaptureState::Idle {
            bail!("capture already in progress");
        }
        self.state = CaptureState::Starting;

        // Transport first: a connection failure must abort without ever
        // opening the capture device.
        let (transport, events) = match ClientTransport::connect(server_url).await {
            Ok(connected) => connected,
            Err(err) => {
                self.state = CaptureState::Idle;
                return Err(err).context("could not reach the transcription server");
            }
        };
        let transport = Arc::new(transport);

        if let Err(err) = transport
            .send_control(&ControlMessage::Lang {
                language: language.to_string(),
            })
            .await
        {
            transport.close().await;
            self.state = CaptureState::Idle;
            return Err(err).context("could not select language");
        }

        let mut blocks = match self.device.start().await {
            Ok(blocks) => blocks,
            Err(err) => {
                transport.close().await;
                self.state = CaptureState::Idle;
                return Err(err)
                    .with_context(|| format!("capture device {} unavailable", self.device.name()));
            }
        };

        self.recording.store(true, Ordering::SeqCst);

        let forward = {
            let transport = Arc::clone(&transport);
            let recording = Arc::clone(&self.recording);
            tokio::spawn(async move {
                while let Some(block) = blocks.recv().await {
                    if !recording.load(Ordering::SeqCst) {
                        break;
                    }
                    let pcm =
                        resample_to_pcm16(&block.samples, block.sample_rate, TARGET_SAMPLE_RATE);
                    if pcm.is_empty() {
                        continue;
                    }
                    if !transport.is_open() {
                        continue;
                    }
                    if transport.send_audio(to_le_bytes(&pcm)).await.is_err() {
                        break;
                    }
                }
            })
        };

        self.transport = Some(transport);
        self.forward_task = Some(forward);
        self.state = CaptureState::Recording;
        info!(device = self.device.name(), language, "recording started");

        Ok(events)
    }

    /// Tear down capture, then signal end-of-audio, then close the
    /// transport. Safe to call when not recording.
    pub async fn stop(&mut self) -> Result<()> {
        if self.state != CaptureState::Recording {
            return Ok(());
        }
        self.state = CaptureState::Stopping;
        self.recording.store(false, Ordering::SeqCst);

        // Device teardown comes first so no capture callback can fire once
        // teardown begins. A teardown failure still releases the forward
        // task and the transport and returns to Idle; a wedged device must
        // not leave the controller unusable.
        let device_result = self.device.stop().await;

        if let Some(task) = self.forward_task.take() {
            if device_result.is_err() {
                task.abort();
            }
            let _ = task.await;
        }

        if let Some(transport) = self.transport.take() {
            if transport.is_open() {
                let _ = transport.send_control(&ControlMessage::Stop).await;
            }
            transport.close().await;
        }

        self.state = CaptureState::Idle;
        match device_result {
            Ok(()) => {
                info!(device = self.device.name(), "recording stopped");
                Ok(())
            }
            Err(err) => Err(err)
                .with_context(|| format!("capture device {} teardown failed", self.device.name())),
        }
    }
}
