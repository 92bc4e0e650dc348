//! # Coinmatch Core
//!
//! Library for identifying coins from obverse/reverse photo pairs.
//!
//! This crate implements the full identification pipeline: EXIF orientation
//! correction, object-detection-guided cropping, CLIP image embedding, and
//! dual-channel cosine similarity matching against a coin catalog. It is
//! designed to be reusable across frontends (HTTP API, batch reprocessing
//! jobs, CLI tooling).
//!
//! ## Modules
//!
//! - [`config`] - Production configuration constants
//! - [`error`] - Per-concern error types
//! - [`geometry`] - Bounding box and crop rectangle value types
//! - [`image`] - Orientation correction, cropping, merging, thumbnails
//! - [`detect`] - External object-detector adapter
//! - [`embedding`] - CLIP encoder and pixel preprocessing
//! - [`scheduler`] - Serial inference scheduler owning the compute device
//! - [`matching`] - Dual-channel similarity ranking and thresholds
//! - [`pipeline`] - End-to-end identification orchestration

pub mod config;
pub mod detect;
pub mod embedding;
pub mod error;
pub mod geometry;
pub mod image;
pub mod matching;
pub mod pipeline;
pub mod scheduler;
