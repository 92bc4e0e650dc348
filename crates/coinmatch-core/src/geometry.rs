//! Value types for detector boxes and crop rectangles.
//!
//! External floats (detector output) are funneled through checked
//! constructors here instead of being trusted as-is downstream.

use crate::config::{DEFAULT_CROP_PADDING, MAX_CROP_PADDING, MIN_CROP_PADDING};

/// Pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Bounding box in relative coordinates, each field a fraction of the
/// corresponding image dimension.
///
/// Invariant: all fields are finite and within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBoxPercent {
    left: f32,
    top: f32,
    width: f32,
    height: f32,
}

impl BoundingBoxPercent {
    /// Creates a bounding box, rejecting fractions outside `[0, 1]`.
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Option<Self> {
        let valid = |v: f32| v.is_finite() && (0.0..=1.0).contains(&v);
        if valid(left) && valid(top) && valid(width) && valid(height) {
            Some(Self {
                left,
                top,
                width,
                height,
            })
        } else {
            None
        }
    }

    /// Creates a bounding box from untrusted detector floats, clamping each
    /// fraction into `[0, 1]`. Non-finite values are treated as 0.
    pub fn from_wire(left: f32, top: f32, width: f32, height: f32) -> Self {
        let clamp = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            left: clamp(left),
            top: clamp(top),
            width: clamp(width),
            height: clamp(height),
        }
    }

    pub fn left(&self) -> f32 {
        self.left
    }

    pub fn top(&self) -> f32 {
        self.top
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }
}

/// Zoom-in padding fraction applied around a detected box.
///
/// Constrained to the 5%-11% band observed across pipeline generations;
/// values outside the band are clamped rather than rejected so a stale
/// configuration cannot take the pipeline down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropPadding(f32);

impl CropPadding {
    pub fn new(fraction: f32) -> Self {
        let fraction = if fraction.is_finite() {
            fraction.clamp(MIN_CROP_PADDING, MAX_CROP_PADDING)
        } else {
            DEFAULT_CROP_PADDING
        };
        Self(fraction)
    }

    pub fn fraction(&self) -> f32 {
        self.0
    }
}

impl Default for CropPadding {
    fn default() -> Self {
        Self(DEFAULT_CROP_PADDING)
    }
}

/// Absolute pixel rectangle, guaranteed to lie within the image it was
/// computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Converts a relative bounding box into a padded pixel rectangle.
    ///
    /// Fractions are converted with truncation, symmetric padding of
    /// `padding * box_side` is added per axis, and the result is clamped to
    /// the image bounds.
    pub fn from_bbox(bbox: &BoundingBoxPercent, dims: ImageDimensions, padding: CropPadding) -> Self {
        let x = (bbox.left() * dims.width as f32) as i64;
        let y = (bbox.top() * dims.height as f32) as i64;
        let w = (bbox.width() * dims.width as f32) as i64;
        let h = (bbox.height() * dims.height as f32) as i64;

        let pad_x = (w as f32 * padding.fraction()) as i64;
        let pad_y = (h as f32 * padding.fraction()) as i64;

        let crop_x = (x - pad_x).max(0);
        let crop_y = (y - pad_y).max(0);
        let crop_w = (w + 2 * pad_x).min(dims.width as i64 - crop_x).max(1);
        let crop_h = (h + 2 * pad_y).min(dims.height as i64 - crop_y).max(1);

        Self {
            x: crop_x as u32,
            y: crop_y as u32,
            width: crop_w as u32,
            height: crop_h as u32,
        }
    }

    /// Largest centered square crop, used when no detection is available.
    pub fn centered_square(dims: ImageDimensions) -> Self {
        let side = dims.width.min(dims.height).max(1);
        Self {
            x: (dims.width - side) / 2,
            y: (dims.height - side) / 2,
            width: side,
            height: side,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_rejects_out_of_range() {
        assert!(BoundingBoxPercent::new(0.0, 0.0, 1.0, 1.0).is_some());
        assert!(BoundingBoxPercent::new(-0.1, 0.0, 0.5, 0.5).is_none());
        assert!(BoundingBoxPercent::new(0.0, 0.0, 1.5, 0.5).is_none());
        assert!(BoundingBoxPercent::new(f32::NAN, 0.0, 0.5, 0.5).is_none());
    }

    #[test]
    fn test_bbox_from_wire_clamps() {
        let bbox = BoundingBoxPercent::from_wire(-0.2, 1.4, f32::NAN, 0.5);
        assert_eq!(bbox.left(), 0.0);
        assert_eq!(bbox.top(), 1.0);
        assert_eq!(bbox.width(), 0.0);
        assert_eq!(bbox.height(), 0.5);
    }

    #[test]
    fn test_padding_clamped_to_band() {
        assert_eq!(CropPadding::new(0.05).fraction(), 0.05);
        assert_eq!(CropPadding::new(0.11).fraction(), 0.11);
        assert_eq!(CropPadding::new(0.5).fraction(), MAX_CROP_PADDING);
        assert_eq!(CropPadding::new(0.0).fraction(), MIN_CROP_PADDING);
        assert_eq!(
            CropPadding::new(f32::NAN).fraction(),
            crate::config::DEFAULT_CROP_PADDING
        );
    }

    #[test]
    fn test_padded_crop_rect_arithmetic() {
        // Box {0.1, 0.1, 0.5, 0.5} on 1000x1000 with 5% padding:
        // x=100, y=100, w=500, h=500, pad=25 -> {75, 75, 550, 550}
        let bbox = BoundingBoxPercent::new(0.1, 0.1, 0.5, 0.5).unwrap();
        let dims = ImageDimensions::new(1000, 1000);
        let rect = CropRect::from_bbox(&bbox, dims, CropPadding::new(0.05));
        assert_eq!(rect, CropRect { x: 75, y: 75, width: 550, height: 550 });
    }

    #[test]
    fn test_crop_rect_clamps_to_image_bounds() {
        // Box touching the top-left corner: padding cannot go negative.
        let bbox = BoundingBoxPercent::new(0.0, 0.0, 0.5, 0.5).unwrap();
        let dims = ImageDimensions::new(1000, 1000);
        let rect = CropRect::from_bbox(&bbox, dims, CropPadding::new(0.05));
        assert_eq!(rect.x, 0);
        assert_eq!(rect.y, 0);
        assert_eq!(rect.width, 550);

        // Box touching the bottom-right corner: width is clipped.
        let bbox = BoundingBoxPercent::new(0.6, 0.6, 0.4, 0.4).unwrap();
        let rect = CropRect::from_bbox(&bbox, dims, CropPadding::new(0.05));
        assert_eq!(rect.x + rect.width, 1000);
        assert_eq!(rect.y + rect.height, 1000);
    }

    #[test]
    fn test_centered_square() {
        let rect = CropRect::centered_square(ImageDimensions::new(1000, 600));
        assert_eq!(rect, CropRect { x: 200, y: 0, width: 600, height: 600 });

        let rect = CropRect::centered_square(ImageDimensions::new(400, 900));
        assert_eq!(rect, CropRect { x: 0, y: 250, width: 400, height: 400 });
    }
}
