//! Pixel preprocessing for the CLIP vision encoder.
//!
//! Converts a cropped coin image into the `1x3xHxW` float layout the model
//! expects: resize to the encoder input resolution, then per-channel
//! `(value/255 - mean[c]) / std[c]` with the CLIP normalization constants.

use image::imageops::FilterType;

use crate::config::{CLIP_PIXEL_MEAN, CLIP_PIXEL_STD, ENCODER_INPUT_SIZE};
use crate::image::CroppedImage;

/// Channel-major float buffer ready to become an input tensor.
#[derive(Debug, Clone)]
pub struct EncoderInput {
    /// Normalized pixel values, length `3 * size * size`, CHW order.
    pub data: Vec<f32>,
    /// Side length of the (square) spatial dimensions.
    pub size: u32,
}

/// Builds the normalized encoder input from a cropped image.
///
/// Images already at the encoder resolution skip the resize.
pub fn to_encoder_input(image: &CroppedImage) -> EncoderInput {
    let size = ENCODER_INPUT_SIZE;

    let rgb = if image.width() == size && image.height() == size {
        image.as_rgb().clone()
    } else {
        image::imageops::resize(image.as_rgb(), size, size, FilterType::CatmullRom)
    };

    let pixels = (size * size) as usize;
    let mut data = vec![0.0f32; 3 * pixels];

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let spatial = (y * size + x) as usize;
        for c in 0..3 {
            data[c * pixels + spatial] =
                (pixel.0[c] as f32 / 255.0 - CLIP_PIXEL_MEAN[c]) / CLIP_PIXEL_STD[c];
        }
    }

    EncoderInput { data, size }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn cropped_solid(side: u32, rgb: [u8; 3]) -> CroppedImage {
        CroppedImage::new(RgbImage::from_pixel(side, side, Rgb(rgb)), side, side).unwrap()
    }

    #[test]
    fn test_input_shape() {
        let input = to_encoder_input(&cropped_solid(224, [128, 128, 128]));
        assert_eq!(input.size, 224);
        assert_eq!(input.data.len(), 3 * 224 * 224);
    }

    #[test]
    fn test_resizes_when_not_at_encoder_resolution() {
        let input = to_encoder_input(&cropped_solid(420, [10, 20, 30]));
        assert_eq!(input.size, 224);
        assert_eq!(input.data.len(), 3 * 224 * 224);
    }

    #[test]
    fn test_normalization_formula() {
        // Solid white: every channel is (1.0 - mean) / std.
        let input = to_encoder_input(&cropped_solid(224, [255, 255, 255]));
        let pixels = 224 * 224;
        for c in 0..3 {
            let expected = (1.0 - CLIP_PIXEL_MEAN[c]) / CLIP_PIXEL_STD[c];
            assert!(
                (input.data[c * pixels] - expected).abs() < 1e-6,
                "channel {}",
                c
            );
        }
    }

    #[test]
    fn test_black_pixel_normalization() {
        let input = to_encoder_input(&cropped_solid(224, [0, 0, 0]));
        let pixels = 224 * 224;
        for c in 0..3 {
            let expected = (0.0 - CLIP_PIXEL_MEAN[c]) / CLIP_PIXEL_STD[c];
            assert!((input.data[c * pixels] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_channel_major_layout() {
        // Red image: channel 0 high, channels 1 and 2 at their zero level.
        let input = to_encoder_input(&cropped_solid(224, [255, 0, 0]));
        let pixels = 224 * 224;
        let red = (1.0 - CLIP_PIXEL_MEAN[0]) / CLIP_PIXEL_STD[0];
        let green_zero = (0.0 - CLIP_PIXEL_MEAN[1]) / CLIP_PIXEL_STD[1];
        assert!((input.data[0] - red).abs() < 1e-6);
        assert!((input.data[pixels] - green_zero).abs() < 1e-6);
    }
}
