//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four operations the process stage
//! needs: identify, read_metadata, resize and thumbnail, plus a batched
//! `run_batch` on top of the last two. The production
//! implementation is [`RustBackend`](super::rust_backend::RustBackend);
//! tests use the recording `MockBackend` below.

use super::operations::VariantJob;
use super::params::{ResizeParams, ThumbnailParams};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Display dimensions, with EXIF orientation already applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Camera details shown next to a photo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exif {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taken: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens: Option<String>,
    /// `1/250s`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure: Option<String>,
    /// `f/2.8`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aperture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso: Option<u32>,
    /// `35mm`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<String>,
}

impl Exif {
    pub fn is_empty(&self) -> bool {
        *self == Exif::default()
    }
}

/// Embedded metadata.
///
/// - `title`: IPTC Object Name (`2:05`)
/// - `description`: IPTC Caption-Abstract (`2:120`)
/// - `keywords`: IPTC Keywords (`2:25`)
/// - `exif`: camera settings and capture time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub exif: Exif,
}

/// Every backend implements all four operations so the rest of the crate
/// stays backend-agnostic.
pub trait ImageBackend: Sync {
    /// Get display dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Read embedded IPTC and EXIF metadata.
    fn read_metadata(&self, path: &Path) -> Result<ImageMetadata, BackendError>;

    /// Write one rendition.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;

    /// Write a thumbnail (fill-resize + center crop).
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError>;

    /// Write several outputs. Backends that can share one decode between
    /// jobs with the same source override this.
    fn run_batch(&self, jobs: &[&VariantJob]) -> Result<(), BackendError> {
        for job in jobs {
            match job {
                VariantJob::Resize(params) => self.resize(params)?,
                VariantJob::Thumbnail(params) => self.thumbnail(params)?,
            }
        }
        Ok(())
    }
}
