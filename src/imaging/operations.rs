//! High-level image operations.
//!
//! Turns album config into concrete jobs: which renditions to write, under
//! which file names, at which dimensions. Jobs are plain data, so the process
//! stage can check the cache before running one against a backend.
//!
//! File naming inside an album's output directory:
//!
//! ```text
//! 001-dawn-800.jpg      rendition, 800px on the longer edge
//! 001-dawn-1600.jpg
//! 001-dawn-thumb.jpg    thumbnail
//! ```

use super::calculations::{calculate_responsive_sizes, calculate_thumbnail_dimensions};
use super::params::{Quality, ResizeParams, Sharpening, ThumbnailParams};
use crate::cache;
use crate::config::{ImagesConfig, OutputFormat, ThumbnailsConfig};
use std::path::Path;

/// Rendition settings for one album.
#[derive(Debug, Clone)]
pub struct ResponsiveConfig {
    pub sizes: Vec<u32>,
    pub quality: Quality,
    pub format: OutputFormat,
}

impl ResponsiveConfig {
    pub fn from_config(images: &ImagesConfig) -> Self {
        Self {
            sizes: images.sizes.clone(),
            quality: Quality::new(images.quality),
            format: images.format,
        }
    }
}

/// Thumbnail settings for one album.
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    pub aspect: (u32, u32),
    pub short_edge: u32,
    pub quality: Quality,
    pub format: OutputFormat,
    pub sharpening: Option<Sharpening>,
}

impl ThumbnailConfig {
    pub fn from_config(thumbnails: &ThumbnailsConfig, images: &ImagesConfig) -> Self {
        let [w, h] = thumbnails.aspect_ratio;
        Self {
            aspect: (w, h),
            short_edge: thumbnails.size,
            quality: Quality::new(images.quality),
            format: images.format,
            sharpening: thumbnails.sharpen.then(Sharpening::light),
        }
    }
}

/// One output file to produce from a source photo.
#[derive(Debug, Clone, PartialEq)]
pub enum VariantJob {
    Resize(ResizeParams),
    Thumbnail(ThumbnailParams),
}

impl VariantJob {
    pub fn source(&self) -> &Path {
        match self {
            VariantJob::Resize(p) => &p.source,
            VariantJob::Thumbnail(p) => &p.source,
        }
    }

    pub fn output(&self) -> &Path {
        match self {
            VariantJob::Resize(p) => &p.output,
            VariantJob::Thumbnail(p) => &p.output,
        }
    }

    /// Hash of everything that affects the encoded bytes, except the source.
    pub fn params_hash(&self) -> String {
        match self {
            VariantJob::Resize(p) => cache::hash_responsive_params(
                p.width.max(p.height),
                p.quality.value(),
                p.format,
            ),
            VariantJob::Thumbnail(p) => cache::hash_thumbnail_params(
                (p.crop_width, p.crop_height),
                p.quality.value(),
                p.sharpening.map(|s| (s.sigma, s.threshold)),
                p.format,
            ),
        }
    }
}

/// A job plus what the manifest records about its output.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedVariant {
    /// Requested rendition size, `None` for the thumbnail.
    pub target: Option<u32>,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub job: VariantJob,
}

pub fn rendition_file_name(slug: &str, size: u32, format: OutputFormat) -> String {
    format!("{}-{}.{}", slug, size, format.extension())
}

pub fn thumbnail_file_name(slug: &str, format: OutputFormat) -> String {
    format!("{}-thumb.{}", slug, format.extension())
}

/// Plan the renditions of one photo. Sizes above the original are skipped.
pub fn plan_responsive(
    source: &Path,
    output_dir: &Path,
    slug: &str,
    original_dims: (u32, u32),
    config: &ResponsiveConfig,
) -> Vec<PlannedVariant> {
    calculate_responsive_sizes(original_dims, &config.sizes)
        .into_iter()
        .map(|size| {
            let file_name = rendition_file_name(slug, size.target, config.format);
            PlannedVariant {
                target: Some(size.target),
                width: size.width,
                height: size.height,
                job: VariantJob::Resize(ResizeParams {
                    source: source.to_path_buf(),
                    output: output_dir.join(&file_name),
                    width: size.width,
                    height: size.height,
                    quality: config.quality,
                    format: config.format,
                }),
                file_name,
            }
        })
        .collect()
}

/// Plan the thumbnail of one photo.
pub fn plan_thumbnail(
    source: &Path,
    output_dir: &Path,
    slug: &str,
    config: &ThumbnailConfig,
) -> PlannedVariant {
    let (crop_width, crop_height) = calculate_thumbnail_dimensions(config.aspect, config.short_edge);
    let file_name = thumbnail_file_name(slug, config.format);
    PlannedVariant {
        target: None,
        width: crop_width,
        height: crop_height,
        job: VariantJob::Thumbnail(ThumbnailParams {
            source: source.to_path_buf(),
            output: output_dir.join(&file_name),
            crop_width,
            crop_height,
            quality: config.quality,
            format: config.format,
            sharpening: config.sharpening,
        }),
        file_name,
    }
}
