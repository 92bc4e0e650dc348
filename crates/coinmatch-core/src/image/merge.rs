//! Side-by-side composition of obverse and reverse images.
//!
//! Display-only: the matching path never consumes merged images.

use image::{imageops, DynamicImage, RgbaImage};

/// Composes two images onto one canvas, left at (0,0) and right at
/// (left.width, 0), full opacity.
///
/// The canvas is `left.width + right.width` wide and as tall as the taller
/// input; when heights differ the shorter image leaves transparent rows
/// below it.
pub fn merge_side_by_side(left: &DynamicImage, right: &DynamicImage) -> DynamicImage {
    let width = left.width() + right.width();
    let height = left.height().max(right.height());

    let mut canvas = RgbaImage::new(width, height);
    imageops::replace(&mut canvas, &left.to_rgba8(), 0, 0);
    imageops::replace(&mut canvas, &right.to_rgba8(), left.width() as i64, 0);

    DynamicImage::ImageRgba8(canvas)
}
