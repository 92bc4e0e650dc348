//! Error types for coinmatch-core.
//!
//! Each pipeline concern gets its own error enum so callers can map failures
//! to distinct responses. Fallback-eligible detector failures are not errors
//! at all — they are modeled as [`crate::detect::DetectionOutcome`] variants
//! and never surface past the cropper.

use thiserror::Error;

/// Errors from image decoding and pixel-level processing.
#[derive(Debug, Clone, Error)]
pub enum ImageError {
    /// Image bytes could not be decoded. Fatal, no fallback.
    #[error("Failed to decode image: {0}")]
    Decode(String),
    /// Re-encoding a processed image failed.
    #[error("Failed to encode image: {0}")]
    Encode(String),
    /// A produced buffer does not have the dimensions it promised.
    #[error("Unexpected image dimensions: expected {expected_width}x{expected_height}, got {actual_width}x{actual_height}")]
    UnexpectedDimensions {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },
}

/// Errors from the embedding encoder (model load and inference).
///
/// All of these are fatal: a request whose image cannot be embedded has no
/// meaningful match result.
#[derive(Debug, Clone, Error)]
pub enum EncoderError {
    /// Failed to load model weights
    #[error("Failed to load model: {0}")]
    ModelLoad(String),
    /// Failed to build the input tensor
    #[error("Failed to create tensor: {0}")]
    TensorCreation(String),
    /// Forward pass through the model failed
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    /// The raw output vector has zero norm and cannot be normalized
    #[error("Degenerate embedding: raw vector norm is zero")]
    DegenerateEmbedding,
}

/// Errors building the detector adapter.
///
/// Runtime detection failures are not errors; they are
/// [`crate::detect::DetectionOutcome`] variants.
#[derive(Debug, Clone, Error)]
pub enum DetectorError {
    /// HTTP client construction failed
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// Errors from the serial inference scheduler.
#[derive(Debug, Clone, Error)]
pub enum SchedulerError {
    /// No model has been loaded yet
    #[error("Encoder model not loaded")]
    ModelNotLoaded,
    /// A model is already loaded
    #[error("Encoder model already loaded")]
    ModelAlreadyLoaded,
    /// Worker thread could not be spawned
    #[error("Failed to spawn scheduler thread: {0}")]
    ThreadSpawnFailed(String),
    /// Worker thread has shut down
    #[error("Scheduler channel disconnected")]
    ChannelDisconnected,
    /// Worker dropped the response channel
    #[error("Failed to receive scheduler response: {0}")]
    ResponseFailed(String),
    /// Model load failed on the worker thread
    #[error("Model load failed: {0}")]
    ModelLoadFailed(String),
    /// Encoding failed on the worker thread; the inner error keeps the
    /// inference failure kind inspectable
    #[error("Encoding failed: {0}")]
    Encoding(#[source] EncoderError),
}

/// Errors from similarity matching.
#[derive(Debug, Clone, Error)]
pub enum MatchError {
    /// Stored and query embeddings differ in length. Indicates a model
    /// version mismatch between indexed and query data; comparing truncated
    /// vectors would silently corrupt scores, so this is fatal.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Query embedding dimension
        expected: usize,
        /// Stored embedding dimension encountered
        actual: usize,
    },
    /// A stored embedding column failed to deserialize
    #[error("Invalid stored embedding for coin {coin_id}: {reason}")]
    InvalidRecord { coin_id: i64, reason: String },
}

/// Top-level pipeline error, aggregating the per-concern kinds.
///
/// API layers match on this to pick a response: `Decode` maps to a client
/// error, everything else to an internal error.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Encoder(#[from] EncoderError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Match(#[from] MatchError),
}
