//! Detection-guided cropping.
//!
//! Two paths produce the canonical per-side coin image:
//!
//! - **AI path**: a detector bounding box is converted to pixels, padded to
//!   zoom in slightly past the detector's tight box, and clamped.
//! - **Fallback path**: no usable detection; the largest centered square is
//!   taken instead, on the assumption that users roughly center the coin.
//!
//! Both paths finish with a fill/crop resize so the output always has
//! exactly the target dimensions, never letterboxing.

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use tracing::debug;

use crate::error::ImageError;
use crate::geometry::{BoundingBoxPercent, CropPadding, CropRect, ImageDimensions};

/// A coin image cropped and resized to fixed target dimensions.
///
/// Produced by exactly one [`crop_coin`] call; ownership moves to whichever
/// stage consumes it next (encoder or merger).
#[derive(Debug, Clone)]
pub struct CroppedImage {
    inner: RgbImage,
}

impl CroppedImage {
    /// Wraps an RGB buffer, verifying it has the promised dimensions.
    pub fn new(inner: RgbImage, width: u32, height: u32) -> Result<Self, ImageError> {
        if inner.width() != width || inner.height() != height {
            return Err(ImageError::UnexpectedDimensions {
                expected_width: width,
                expected_height: height,
                actual_width: inner.width(),
                actual_height: inner.height(),
            });
        }
        Ok(Self { inner })
    }

    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.inner
    }

    pub fn into_rgb(self) -> RgbImage {
        self.inner
    }

    pub fn to_dynamic(&self) -> DynamicImage {
        DynamicImage::ImageRgb8(self.inner.clone())
    }
}

/// Crops the coin out of a corrected image and resizes to target size.
///
/// With a bounding box the AI path is taken; without one the centered-square
/// fallback. Deterministic for identical inputs and parameters.
pub fn crop_coin(
    image: &DynamicImage,
    bbox: Option<&BoundingBoxPercent>,
    padding: CropPadding,
    target_width: u32,
    target_height: u32,
) -> Result<CroppedImage, ImageError> {
    let dims = ImageDimensions::new(image.width(), image.height());

    let rect = match bbox {
        Some(bbox) => {
            let rect = CropRect::from_bbox(bbox, dims, padding);
            debug!(?rect, "Cropping at detected coin location");
            rect
        }
        None => {
            let rect = CropRect::centered_square(dims);
            debug!(?rect, "No detection, falling back to centered square crop");
            rect
        }
    };

    let cropped = image.crop_imm(rect.x, rect.y, rect.width, rect.height);
    let resized = cropped.resize_to_fill(target_width, target_height, FilterType::CatmullRom);

    CroppedImage::new(resized.to_rgb8(), target_width, target_height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([120, 110, 90])))
    }

    #[test]
    fn test_ai_path_output_is_target_sized() {
        let bbox = BoundingBoxPercent::new(0.2, 0.3, 0.4, 0.4).unwrap();
        let cropped = solid(1000, 800);
        let out = crop_coin(&cropped, Some(&bbox), CropPadding::default(), 420, 420).unwrap();
        assert_eq!((out.width(), out.height()), (420, 420));
    }

    #[test]
    fn test_fallback_output_is_target_sized() {
        for (w, h) in [(1000, 600), (600, 1000), (420, 420), (50, 37)] {
            let out = crop_coin(&solid(w, h), None, CropPadding::default(), 420, 420).unwrap();
            assert_eq!((out.width(), out.height()), (420, 420), "input {}x{}", w, h);
        }
    }

    #[test]
    fn test_non_square_target() {
        let out = crop_coin(&solid(800, 800), None, CropPadding::default(), 350, 420).unwrap();
        assert_eq!((out.width(), out.height()), (350, 420));
    }

    #[test]
    fn test_deterministic_for_identical_inputs() {
        let image = solid(640, 480);
        let bbox = BoundingBoxPercent::new(0.1, 0.1, 0.5, 0.5).unwrap();
        let a = crop_coin(&image, Some(&bbox), CropPadding::new(0.05), 420, 420).unwrap();
        let b = crop_coin(&image, Some(&bbox), CropPadding::new(0.05), 420, 420).unwrap();
        assert_eq!(a.as_rgb().as_raw(), b.as_rgb().as_raw());
    }

    #[test]
    fn test_cropped_image_rejects_wrong_dimensions() {
        let buffer = RgbImage::new(100, 100);
        let result = CroppedImage::new(buffer, 420, 420);
        assert!(matches!(
            result,
            Err(ImageError::UnexpectedDimensions { .. })
        ));
    }
}
