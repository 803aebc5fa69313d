//! Pure Rust image processing backend.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate decoders |
//! | Orientation | EXIF tag `0x0112` → `rotate*` / `flip*` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Thumbnail crop | `DynamicImage::resize_to_fill` |
//! | Batch | one decode shared by every job with the same source |
//! | Sharpening | `image::imageops::unsharpen` |
//! | Metadata | custom `iptc_parser` and `exif_parser` |

use super::backend::{BackendError, Dimensions, ImageBackend, ImageMetadata};
use super::exif_parser;
use super::iptc_parser;
use super::operations::VariantJob;
use super::params::{ResizeParams, ThumbnailParams};
use crate::config::OutputFormat;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// AVIF encoder speed (1 = slowest/best, 10 = fastest).
const AVIF_SPEED: u8 = 6;

#[derive(Debug, Default)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Decode an image and turn it upright.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    let img = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })?;
    let orientation = exif_parser::read_exif(path).orientation();
    Ok(apply_orientation(img, orientation))
}

/// Apply an EXIF orientation (1-8) to decoded pixels.
fn apply_orientation(img: DynamicImage, orientation: u16) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Orientations 5-8 swap width and height.
fn swaps_axes(orientation: u16) -> bool {
    (5..=8).contains(&orientation)
}

fn save_image(
    img: &DynamicImage,
    path: &Path,
    format: OutputFormat,
    quality: u32,
) -> Result<(), BackendError> {
    // Both encoders take 8-bit RGB; this also drops alpha and 16-bit depth.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let writer = BufWriter::new(File::create(path)?);
    let quality = quality.clamp(1, 100) as u8;

    let result = match format {
        OutputFormat::Jpeg => rgb.write_with_encoder(
            image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality),
        ),
        OutputFormat::Avif => rgb.write_with_encoder(
            image::codecs::avif::AvifEncoder::new_with_speed_quality(writer, AVIF_SPEED, quality),
        ),
    };
    result.map_err(|e| {
        BackendError::ProcessingFailed(format!(
            "Failed to encode {}: {}",
            path.display(),
            e
        ))
    })
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!(
                "Failed to read dimensions of {}: {}",
                path.display(),
                e
            ))
        })?;
        if swaps_axes(exif_parser::read_exif(path).orientation()) {
            Ok(Dimensions {
                width: height,
                height: width,
            })
        } else {
            Ok(Dimensions { width, height })
        }
    }

    fn read_metadata(&self, path: &Path) -> Result<ImageMetadata, BackendError> {
        let iptc = iptc_parser::read_iptc(path);
        let exif = exif_parser::read_exif(path);
        Ok(ImageMetadata {
            title: iptc.object_name,
            description: iptc.caption,
            keywords: iptc.keywords,
            exif: exif.to_exif(),
        })
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        write_resized(&load_image(&params.source)?, params)
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        write_thumbnail(&load_image(&params.source)?, params)
    }

    /// One decode per run of jobs sharing a source.
    fn run_batch(&self, jobs: &[&VariantJob]) -> Result<(), BackendError> {
        for group in jobs.chunk_by(|a, b| a.source() == b.source()) {
            let img = load_image(group[0].source())?;
            for job in group {
                match job {
                    VariantJob::Resize(params) => write_resized(&img, params)?,
                    VariantJob::Thumbnail(params) => write_thumbnail(&img, params)?,
                }
            }
        }
        Ok(())
    }
}

fn write_resized(img: &DynamicImage, params: &ResizeParams) -> Result<(), BackendError> {
    let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
    save_image(
        &resized,
        &params.output,
        params.format,
        params.quality.value(),
    )
}

fn write_thumbnail(img: &DynamicImage, params: &ThumbnailParams) -> Result<(), BackendError> {
    let filled = img.resize_to_fill(params.crop_width, params.crop_height, FilterType::Lanczos3);

    let final_img = match params.sharpening {
        Some(sharpening) => DynamicImage::from(image::imageops::unsharpen(
            &filled,
            sharpening.sigma,
            sharpening.threshold,
        )),
        None => filled,
    };

    save_image(
        &final_img,
        &params.output,
        params.format,
        params.quality.value(),
    )
}
