//! Serial inference scheduler.
//!
//! Candle devices are not safe to share across threads on every backend, so
//! a single dedicated OS thread owns the compute device and the CLIP model
//! and processes all encode requests serially. Async callers talk to it over
//! an mpsc channel and get their result back on a oneshot.
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │  Async Callers  │────▶│  MPSC Channel   │────▶│  Worker Thread  │
//! │  (tokio tasks)  │     │  (FIFO)         │     │  (owns device)  │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! Serialization also bounds memory: at most one inference pass is resident
//! at a time regardless of how many requests arrive concurrently.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use async_trait::async_trait;
use candle_core::Device;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::embedding::{ClipImageEncoder, ImageEncoder};
use crate::error::SchedulerError;
use crate::image::CroppedImage;

/// Async interface to an embedding backend.
///
/// The pipeline holds this instead of a concrete scheduler so tests can
/// substitute a deterministic stub.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Encodes a cropped coin image into an L2-normalized embedding.
    async fn embed(&self, image: CroppedImage) -> Result<Vec<f32>, SchedulerError>;
}

/// Internal message type for worker thread communication.
enum SchedulerMessage {
    LoadModel {
        model_bytes: Vec<u8>,
        response: oneshot::Sender<Result<(), SchedulerError>>,
    },
    Encode {
        image: CroppedImage,
        response: oneshot::Sender<Result<Vec<f32>, SchedulerError>>,
    },
    Shutdown,
}

/// Serial encoder scheduler - single thread owns the device and model.
///
/// Requests are processed strictly in arrival order. Obverse and reverse
/// encodes submitted concurrently by the pipeline therefore run one after
/// the other, which is the intended behavior.
pub struct EncoderScheduler {
    /// Channel to send requests to the worker thread
    tx: mpsc::Sender<SchedulerMessage>,
    /// Atomic flag indicating the model is loaded and encoding can proceed
    ready: Arc<AtomicBool>,
}

impl EncoderScheduler {
    /// Create a new scheduler with an idle worker thread.
    ///
    /// The thread runs until the scheduler is dropped; dropping the last
    /// sender disconnects the channel and the worker exits.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::ThreadSpawnFailed` if thread creation fails.
    pub fn new() -> Result<Self, SchedulerError> {
        let (tx, rx) = mpsc::channel();
        let ready = Arc::new(AtomicBool::new(false));

        let ready_clone = ready.clone();
        thread::Builder::new()
            .name("encoder-scheduler".to_string())
            .spawn(move || {
                Self::worker_loop(rx, ready_clone);
            })
            .map_err(|e| SchedulerError::ThreadSpawnFailed(e.to_string()))?;

        info!("Encoder scheduler initialized with dedicated worker thread");

        Ok(Self { tx, ready })
    }

    /// Worker thread main loop.
    fn worker_loop(rx: mpsc::Receiver<SchedulerMessage>, ready: Arc<AtomicBool>) {
        info!("Encoder scheduler worker thread started");

        // Compute device is owned by this thread only
        let device = Self::select_device();

        let mut encoder: Option<ClipImageEncoder> = None;

        while let Ok(message) = rx.recv() {
            match message {
                SchedulerMessage::LoadModel {
                    model_bytes,
                    response,
                } => {
                    let result = if encoder.is_some() {
                        Err(SchedulerError::ModelAlreadyLoaded)
                    } else {
                        match ClipImageEncoder::from_safetensors_bytes(model_bytes, &device) {
                            Ok(model) => {
                                encoder = Some(model);
                                ready.store(true, Ordering::Release);
                                Ok(())
                            }
                            Err(e) => Err(SchedulerError::ModelLoadFailed(e.to_string())),
                        }
                    };
                    let _ = response.send(result);
                }
                SchedulerMessage::Encode { image, response } => {
                    debug!("Processing encode request");
                    let result = match &encoder {
                        Some(model) => model.encode(&image).map_err(SchedulerError::Encoding),
                        None => Err(SchedulerError::ModelNotLoaded),
                    };
                    let _ = response.send(result);
                }
                SchedulerMessage::Shutdown => {
                    info!("Encoder scheduler received shutdown signal");
                    return;
                }
            }
        }

        info!("Encoder scheduler channel disconnected, shutting down");
    }

    /// Select the best available compute device.
    fn select_device() -> Device {
        if let Ok(cuda_device) = Device::new_cuda(0) {
            info!("Encoder scheduler using CUDA device");
            return cuda_device;
        }

        if let Ok(metal_device) = Device::new_metal(0) {
            info!("Encoder scheduler using Metal device");
            return metal_device;
        }

        info!("Encoder scheduler using CPU device");
        Device::Cpu
    }

    /// Loads CLIP weights onto the worker's device.
    ///
    /// # Errors
    ///
    /// Returns `ModelAlreadyLoaded` on a second call and `ModelLoadFailed`
    /// when the weights are unusable; a failed load leaves the scheduler
    /// not ready.
    pub async fn load_model(&self, model_bytes: Vec<u8>) -> Result<(), SchedulerError> {
        let (response_tx, response_rx) = oneshot::channel();

        self.tx
            .send(SchedulerMessage::LoadModel {
                model_bytes,
                response: response_tx,
            })
            .map_err(|_| SchedulerError::ChannelDisconnected)?;

        response_rx
            .await
            .map_err(|e| SchedulerError::ResponseFailed(e.to_string()))?
    }

    /// Whether a model is loaded and encode requests will be served.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Asks the worker to exit after draining already-queued requests.
    /// Requests submitted after this fail with `ResponseFailed`.
    pub fn shutdown(&self) {
        let _ = self.tx.send(SchedulerMessage::Shutdown);
    }
}

#[async_trait]
impl EmbeddingBackend for EncoderScheduler {
    async fn embed(&self, image: CroppedImage) -> Result<Vec<f32>, SchedulerError> {
        let (response_tx, response_rx) = oneshot::channel();

        self.tx
            .send(SchedulerMessage::Encode {
                image,
                response: response_tx,
            })
            .map_err(|_| SchedulerError::ChannelDisconnected)?;

        response_rx
            .await
            .map_err(|e| SchedulerError::ResponseFailed(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn test_image() -> CroppedImage {
        CroppedImage::new(RgbImage::from_pixel(16, 16, Rgb([90, 80, 60])), 16, 16).unwrap()
    }

    #[tokio::test]
    async fn test_starts_not_ready() {
        let scheduler = EncoderScheduler::new().unwrap();
        assert!(!scheduler.is_ready());
    }

    #[tokio::test]
    async fn test_encode_before_load_fails() {
        let scheduler = EncoderScheduler::new().unwrap();
        let result = scheduler.embed(test_image()).await;
        assert!(matches!(result, Err(SchedulerError::ModelNotLoaded)));
    }

    #[tokio::test]
    async fn test_requests_after_shutdown_fail() {
        let scheduler = EncoderScheduler::new().unwrap();
        scheduler.shutdown();
        let result = scheduler.embed(test_image()).await;
        assert!(matches!(
            result,
            Err(SchedulerError::ResponseFailed(_) | SchedulerError::ChannelDisconnected)
        ));
    }

    #[tokio::test]
    async fn test_invalid_weights_rejected() {
        let scheduler = EncoderScheduler::new().unwrap();
        let result = scheduler.load_model(vec![0u8; 64]).await;
        assert!(matches!(result, Err(SchedulerError::ModelLoadFailed(_))));
        assert!(!scheduler.is_ready());
    }
}
