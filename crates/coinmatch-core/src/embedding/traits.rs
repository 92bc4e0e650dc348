//! Traits for embedding inference.

use crate::error::EncoderError;
use crate::image::CroppedImage;

/// Interface for image embedding models.
///
/// Allows different vision backbones to be swapped without changing the
/// scheduler or pipeline. Implementations must be `Send + Sync`; the serial
/// scheduler calls [`encode`](ImageEncoder::encode) from a dedicated worker
/// thread.
pub trait ImageEncoder: Send + Sync {
    /// Length of the vectors this model produces.
    fn embedding_dim(&self) -> usize;

    /// Encodes a cropped coin image into an L2-normalized embedding of
    /// length [`embedding_dim`](ImageEncoder::embedding_dim).
    fn encode(&self, image: &CroppedImage) -> Result<Vec<f32>, EncoderError>;
}
