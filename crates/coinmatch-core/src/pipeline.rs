//! End-to-end identification pipeline.
//!
//! Per side: decode and correct orientation, detect the coin, crop, embed.
//! Both sides run concurrently at the I/O level (detector calls overlap)
//! while the encoder serializes the two inference passes behind the
//! scheduler. The matcher then scores the query pair against the catalog.

use std::sync::Arc;

use image::imageops::FilterType;
use image::DynamicImage;
use tracing::{debug, info};

use crate::config::{
    CROP_TARGET_HEIGHT, CROP_TARGET_WIDTH, DEFAULT_TOP_COUNT, PREVIEW_HALF_WIDTH, PREVIEW_HEIGHT,
};
use crate::detect::Detector;
use crate::error::{ImageError, PipelineError};
use crate::geometry::CropPadding;
use crate::image::{crop_coin, decode_upright, encode_png, merge_side_by_side, CroppedImage};
use crate::matching::{CoinEmbeddingRecord, MatchCandidate};
use crate::scheduler::EmbeddingBackend;

/// Tunable pipeline parameters.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Zoom-in padding around a detected bounding box
    pub crop_padding: CropPadding,
    /// Number of ranked candidates an identification returns
    pub top_count: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            crop_padding: CropPadding::default(),
            top_count: DEFAULT_TOP_COUNT,
        }
    }
}

/// One fully processed query side.
#[derive(Debug, Clone)]
pub struct ProcessedSide {
    /// Canonical cropped coin image for this side
    pub cropped: CroppedImage,
    /// L2-normalized embedding of the crop
    pub embedding: Vec<f32>,
}

/// Result of scoring a query pair against the catalog.
#[derive(Debug, Clone)]
pub struct IdentificationResult {
    /// All candidates ranked by weaker-side similarity, best first
    pub ranked: Vec<MatchCandidate>,
    /// The subset of `ranked` where both sides clear the match threshold
    pub matches: Vec<MatchCandidate>,
}

/// Orchestrates the identification pipeline over pluggable detector and
/// encoder backends.
pub struct CoinIdentifier {
    detector: Arc<dyn Detector>,
    encoder: Arc<dyn EmbeddingBackend>,
    config: PipelineConfig,
}

impl CoinIdentifier {
    pub fn new(
        detector: Arc<dyn Detector>,
        encoder: Arc<dyn EmbeddingBackend>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            detector,
            encoder,
            config,
        }
    }

    /// Runs one side of a coin through decode, detection, crop, and
    /// embedding.
    ///
    /// Detection failure is not an error here; the crop falls back to the
    /// centered square. Decode and embedding failures are fatal.
    pub async fn process_side(&self, raw_bytes: &[u8]) -> Result<ProcessedSide, PipelineError> {
        let upright = decode_upright(raw_bytes)?;

        // The detector sees the corrected pixels, not the original bytes,
        // so its box coordinates match what the cropper operates on.
        let detector_payload = encode_png(&upright)?;
        let outcome = self.detector.detect(&detector_payload).await;
        debug!(?outcome, "Detection outcome for side");

        let cropped = crop_coin(
            &upright,
            outcome.bounding_box(),
            self.config.crop_padding,
            CROP_TARGET_WIDTH,
            CROP_TARGET_HEIGHT,
        )?;

        let embedding = self.encoder.embed(cropped.clone()).await?;

        Ok(ProcessedSide { cropped, embedding })
    }

    /// Identifies a coin from obverse and reverse photos.
    ///
    /// Both sides are processed concurrently, then the catalog is ranked
    /// against the embedding pair.
    pub async fn identify(
        &self,
        obverse_bytes: &[u8],
        reverse_bytes: &[u8],
        records: &[CoinEmbeddingRecord],
    ) -> Result<IdentificationResult, PipelineError> {
        let (obverse, reverse) = tokio::try_join!(
            self.process_side(obverse_bytes),
            self.process_side(reverse_bytes)
        )?;

        let ranked = crate::matching::rank(
            &obverse.embedding,
            &reverse.embedding,
            records,
            self.config.top_count,
        )?;
        let matches: Vec<_> = ranked.iter().filter(|c| c.is_match()).cloned().collect();

        info!(
            candidates = ranked.len(),
            matches = matches.len(),
            "Identification completed"
        );

        Ok(IdentificationResult { ranked, matches })
    }

    /// Composes the two cropped sides into one preview image, each half
    /// resized to the preview dimensions.
    pub fn merge_for_preview(
        &self,
        obverse: &CroppedImage,
        reverse: &CroppedImage,
    ) -> Result<Vec<u8>, ImageError> {
        let resize = |side: &CroppedImage| -> DynamicImage {
            side.to_dynamic().resize_exact(
                PREVIEW_HALF_WIDTH,
                PREVIEW_HEIGHT,
                FilterType::CatmullRom,
            )
        };
        let merged = merge_side_by_side(&resize(obverse), &resize(reverse));
        encode_png(&merged)
    }
}
