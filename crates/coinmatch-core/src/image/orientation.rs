//! EXIF orientation correction.
//!
//! Phone photos embed rotation in EXIF tag 0x0112 instead of rotating
//! pixels; without correction, portrait shots reach the detector and the
//! encoder sideways. The tag is consumed exactly once: the corrected output
//! is a bare pixel buffer, so downstream consumers (and any re-encode) never
//! see the tag again.

use std::io::Cursor;

use image::DynamicImage;
use tracing::debug;

use crate::error::ImageError;

/// Reads the EXIF orientation tag from raw image bytes.
///
/// Returns 1 (no transform) when the container has no EXIF segment, the
/// segment is unreadable, or the tag is absent — a missing tag is the
/// common case for PNG and for images that were already corrected.
pub fn read_orientation(raw_bytes: &[u8]) -> u16 {
    let mut cursor = Cursor::new(raw_bytes);
    let reader = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(reader) => reader,
        Err(_) => return 1,
    };

    reader
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .map(|v| v as u16)
        .unwrap_or(1)
}

/// Applies the transform implied by an EXIF orientation tag.
///
/// Tag 1 and out-of-range values are identity, matching the standard
/// convention table for tags 2-8.
pub fn apply_orientation(image: DynamicImage, orientation: u16) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}

/// Decodes image bytes and normalizes orientation to upright.
///
/// # Errors
///
/// Returns `ImageError::Decode` for unparseable bytes. There is no
/// fallback: every later stage depends on valid pixels.
pub fn decode_upright(raw_bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    let image = image::load_from_memory(raw_bytes)
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    let orientation = read_orientation(raw_bytes);
    if orientation != 1 {
        debug!(orientation, "Correcting EXIF orientation");
    }

    Ok(apply_orientation(image, orientation))
}

/// Encodes a processed image as PNG bytes.
///
/// Used for the detector payload and for handing crops back to blob
/// storage. The output carries no EXIF metadata.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, ImageError> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// 2x1 marker image: red pixel at (0,0), blue pixel at (1,0).
    fn marker() -> DynamicImage {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 0, 255]));
        DynamicImage::ImageRgb8(img)
    }

    fn pixel(img: &DynamicImage, x: u32, y: u32) -> [u8; 3] {
        let rgb = img.to_rgb8();
        rgb.get_pixel(x, y).0
    }

    const RED: [u8; 3] = [255, 0, 0];
    const BLUE: [u8; 3] = [0, 0, 255];

    #[test]
    fn test_tag_1_is_identity() {
        let out = apply_orientation(marker(), 1);
        assert_eq!((out.width(), out.height()), (2, 1));
        assert_eq!(pixel(&out, 0, 0), RED);
        assert_eq!(pixel(&out, 1, 0), BLUE);
    }

    #[test]
    fn test_tag_2_flips_horizontal() {
        let out = apply_orientation(marker(), 2);
        assert_eq!(pixel(&out, 0, 0), BLUE);
        assert_eq!(pixel(&out, 1, 0), RED);
    }

    #[test]
    fn test_tag_3_rotates_180() {
        let out = apply_orientation(marker(), 3);
        assert_eq!(pixel(&out, 0, 0), BLUE);
        assert_eq!(pixel(&out, 1, 0), RED);
    }

    #[test]
    fn test_tag_4_flips_vertical() {
        // Single row: vertical flip leaves the layout unchanged.
        let out = apply_orientation(marker(), 4);
        assert_eq!(pixel(&out, 0, 0), RED);
        assert_eq!(pixel(&out, 1, 0), BLUE);
    }

    #[test]
    fn test_tag_5_rotate90_then_fliph() {
        // rotate90 turns the row into a column (red on top), fliph is a
        // no-op on a single-column image.
        let out = apply_orientation(marker(), 5);
        assert_eq!((out.width(), out.height()), (1, 2));
        assert_eq!(pixel(&out, 0, 0), RED);
        assert_eq!(pixel(&out, 0, 1), BLUE);
    }

    #[test]
    fn test_tag_6_rotates_90() {
        let out = apply_orientation(marker(), 6);
        assert_eq!((out.width(), out.height()), (1, 2));
        assert_eq!(pixel(&out, 0, 0), RED);
        assert_eq!(pixel(&out, 0, 1), BLUE);
    }

    #[test]
    fn test_tag_7_rotate270_then_fliph() {
        let out = apply_orientation(marker(), 7);
        assert_eq!((out.width(), out.height()), (1, 2));
        assert_eq!(pixel(&out, 0, 0), BLUE);
        assert_eq!(pixel(&out, 0, 1), RED);
    }

    #[test]
    fn test_tag_8_rotates_270() {
        let out = apply_orientation(marker(), 8);
        assert_eq!((out.width(), out.height()), (1, 2));
        assert_eq!(pixel(&out, 0, 0), BLUE);
        assert_eq!(pixel(&out, 0, 1), RED);
    }

    #[test]
    fn test_unknown_tag_is_identity() {
        let out = apply_orientation(marker(), 0);
        assert_eq!(pixel(&out, 0, 0), RED);
        let out = apply_orientation(marker(), 9);
        assert_eq!(pixel(&out, 0, 0), RED);
    }

    #[test]
    fn test_read_orientation_defaults_to_1_without_exif() {
        let png = encode_png(&marker()).unwrap();
        assert_eq!(read_orientation(&png), 1);
    }

    #[test]
    fn test_decode_upright_round_trip() {
        let png = encode_png(&marker()).unwrap();
        let decoded = decode_upright(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (2, 1));
        assert_eq!(pixel(&decoded, 0, 0), RED);
    }

    #[test]
    fn test_decode_upright_rejects_garbage() {
        let result = decode_upright(b"definitely not an image");
        assert!(matches!(result, Err(ImageError::Decode(_))));
    }

    #[test]
    fn test_corrected_output_carries_no_orientation_tag() {
        let rotated = apply_orientation(marker(), 6);
        let reencoded = encode_png(&rotated).unwrap();
        assert_eq!(read_orientation(&reencoded), 1);
    }
}
