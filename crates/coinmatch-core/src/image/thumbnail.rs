//! Catalog thumbnails.

use image::imageops::FilterType;
use image::DynamicImage;

use crate::config::THUMBNAIL_WIDTH;
use crate::error::ImageError;
use crate::image::orientation::decode_upright;

/// Produces a width-300 thumbnail from raw image bytes, preserving aspect
/// ratio and correcting orientation first.
pub fn make_thumbnail(raw_bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    let image = decode_upright(raw_bytes)?;
    let new_width = THUMBNAIL_WIDTH;
    let new_height =
        ((image.height() as f32) * (new_width as f32 / image.width() as f32)).round() as u32;
    Ok(image.resize_exact(new_width, new_height.max(1), FilterType::CatmullRom))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::orientation::encode_png;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_thumbnail_preserves_aspect_ratio() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(600, 900, Rgb([50, 50, 50])));
        let png = encode_png(&img).unwrap();
        let thumb = make_thumbnail(&png).unwrap();
        assert_eq!(thumb.width(), 300);
        assert_eq!(thumb.height(), 450);
    }

    #[test]
    fn test_thumbnail_rejects_undecodable_bytes() {
        assert!(matches!(
            make_thumbnail(b"not an image"),
            Err(ImageError::Decode(_))
        ));
    }
}
