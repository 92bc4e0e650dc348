//! Production configuration constants.
//!
//! These values pin the behavior of the identification pipeline and are used
//! throughout the crate and its tests to stay consistent.

// =============================================================================
// CLIP Encoder Configuration
// =============================================================================

/// Embedding vector dimension.
///
/// CLIP ViT-B/32 projects image features to 512 dimensions. Stored catalog
/// embeddings must match this; a mismatch is a model-version inconsistency
/// and fails matching with `MatchError::DimensionMismatch`.
pub const EMBEDDING_DIM: usize = 512;

/// Encoder input resolution (pixels per side).
///
/// The vision transformer consumes fixed 224x224 input; crops are resized
/// down during preprocessing.
pub const ENCODER_INPUT_SIZE: u32 = 224;

/// Per-channel pixel mean for CLIP normalization (RGB order).
pub const CLIP_PIXEL_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];

/// Per-channel pixel standard deviation for CLIP normalization (RGB order).
pub const CLIP_PIXEL_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// Whether produced embeddings are L2-normalized.
///
/// Always true: the encoder normalizes after inference, so dot product is a
/// valid proxy for cosine similarity on query vectors. Stored vectors are
/// still re-normalized inside the cosine computation because older catalog
/// rows predate this guarantee.
pub const EMBEDDINGS_NORMALIZED: bool = true;

// =============================================================================
// Crop Configuration
// =============================================================================

/// Width of a cropped coin image handed to the encoder or stored as the
/// canonical per-side image.
pub const CROP_TARGET_WIDTH: u32 = 420;

/// Height of a cropped coin image.
pub const CROP_TARGET_HEIGHT: u32 = 420;

/// Default zoom-in padding applied around a detected bounding box, as a
/// fraction of the box side per axis.
///
/// Historical call sites used 5% and 11% across pipeline generations; the
/// value is a tunable, constrained to [`MIN_CROP_PADDING`, `MAX_CROP_PADDING`].
pub const DEFAULT_CROP_PADDING: f32 = 0.05;

/// Lower bound of the accepted crop padding band.
pub const MIN_CROP_PADDING: f32 = 0.05;

/// Upper bound of the accepted crop padding band.
pub const MAX_CROP_PADDING: f32 = 0.11;

/// Width of each half of a merged preview image (older pipeline generation,
/// kept for the side-by-side display path).
pub const PREVIEW_HALF_WIDTH: u32 = 350;

/// Height of a merged preview image.
pub const PREVIEW_HEIGHT: u32 = 420;

/// Thumbnail width; height scales to preserve aspect ratio.
pub const THUMBNAIL_WIDTH: u32 = 300;

// =============================================================================
// Detection and Matching Thresholds
// =============================================================================

/// Minimum probability for a detector prediction to be used.
///
/// Predictions at or below this confidence are ignored; if none qualify the
/// cropper falls back to a centered square crop.
pub const DETECTION_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Dual acceptance threshold for a match candidate.
///
/// A candidate is a genuine match only when BOTH channel similarities are
/// strictly greater than this value.
pub const MATCH_THRESHOLD: f64 = 0.85;

/// Default number of ranked candidates returned by an identification.
pub const DEFAULT_TOP_COUNT: usize = 10;

/// Default detector request timeout in seconds.
///
/// The upstream service defined none; a timeout is required so a hung
/// detector degrades to the fallback crop instead of stalling the request.
pub const DETECTOR_TIMEOUT_SECS: u64 = 10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_dim_matches_clip_vit_b32() {
        assert_eq!(EMBEDDING_DIM, 512);
    }

    #[test]
    fn test_default_padding_inside_band() {
        assert!(DEFAULT_CROP_PADDING >= MIN_CROP_PADDING);
        assert!(DEFAULT_CROP_PADDING <= MAX_CROP_PADDING);
    }

    #[test]
    fn test_thresholds_are_probabilities() {
        assert!(DETECTION_CONFIDENCE_THRESHOLD > 0.0 && DETECTION_CONFIDENCE_THRESHOLD < 1.0);
        assert!(MATCH_THRESHOLD > 0.0 && MATCH_THRESHOLD < 1.0);
    }
}
