//! Image processing stages: orientation correction, detection-guided
//! cropping, preview merging, and thumbnails.
//!
//! All stages operate on decoded pixel buffers from the `image` crate.
//! Decoding is the only stage that can fail fatally on user input; every
//! later stage is a pure geometric transform.

pub mod crop;
pub mod merge;
pub mod orientation;
pub mod thumbnail;

pub use crop::{crop_coin, CroppedImage};
pub use merge::merge_side_by_side;
pub use orientation::{apply_orientation, decode_upright, encode_png, read_orientation};
pub use thumbnail::make_thumbnail;
