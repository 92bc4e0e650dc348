//! Embedding encoder abstractions and the CLIP implementation.
//!
//! ## Core pieces
//!
//! - [`ImageEncoder`] - synchronous inference interface, implemented per model
//! - [`ClipImageEncoder`] - CLIP ViT-B/32 vision encoder using Candle
//! - [`preprocess`] - pixel normalization into the model's input layout
//!
//! Encoding failures are fatal by design: the match result depends entirely
//! on embedding correctness, so an un-encodable image fails loudly instead
//! of degrading.

pub mod clip;
pub mod preprocess;

mod traits;

pub use clip::ClipImageEncoder;
pub use traits::ImageEncoder;

use crate::error::EncoderError;

/// Scales a vector to unit Euclidean norm.
///
/// # Errors
///
/// Returns `EncoderError::DegenerateEmbedding` when the raw norm is exactly
/// zero; dividing through would produce NaNs that poison every similarity
/// downstream.
pub fn l2_normalize(mut vector: Vec<f32>) -> Result<Vec<f32>, EncoderError> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return Err(EncoderError::DegenerateEmbedding);
    }
    for value in &mut vector {
        *value /= norm;
    }
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize_unit_norm() {
        let normalized = l2_normalize(vec![3.0, 4.0]).unwrap();
        assert!((normalized[0] - 0.6).abs() < 1e-6);
        assert!((normalized[1] - 0.8).abs() < 1e-6);
        let norm: f32 = normalized.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_already_unit() {
        let normalized = l2_normalize(vec![1.0, 0.0, 0.0]).unwrap();
        assert_eq!(normalized, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_l2_normalize_zero_vector_is_fatal() {
        let result = l2_normalize(vec![0.0; 8]);
        assert!(matches!(result, Err(EncoderError::DegenerateEmbedding)));
    }
}
