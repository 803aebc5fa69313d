//! Parameter types for image operations.
//!
//! These describe *what* to produce. [`operations`](super::operations)
//! builds them from the album config, and the [`backend`](super::backend)
//! executes them, so tests can swap in a mock backend.

use crate::config::OutputFormat;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Unsharp mask parameters.
///
/// - `sigma`: Gaussian blur radius (higher = stronger)
/// - `threshold`: minimum brightness difference to sharpen (0 = all pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub sigma: f32,
    pub threshold: i32,
}

impl Sharpening {
    /// Light sharpening suitable for thumbnails.
    pub fn light() -> Self {
        Self {
            sigma: 0.5,
            threshold: 0,
        }
    }
}

/// A single resize into one rendition.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
    pub format: OutputFormat,
}

/// A thumbnail: fill-resize, center crop, optional sharpening.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub crop_width: u32,
    pub crop_height: u32,
    pub quality: Quality,
    pub format: OutputFormat,
    pub sharpening: Option<Sharpening>,
}
