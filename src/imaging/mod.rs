//! Image processing, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` + EXIF orientation |
//! | **Metadata** | custom IPTC and EXIF parsers (JPEG APP1/APP13, TIFF IFD) |
//! | **Resize → JPEG/AVIF** | Lanczos3 + `JpegEncoder` / rav1e |
//! | **Thumbnail** | `resize_to_fill` + `unsharpen` |
//!
//! The module is split into:
//! - **Calculations**: dimension math (unit testable)
//! - **Parameters**: data describing one image operation
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: album config → planned jobs

pub mod backend;
mod calculations;
mod container;
pub(crate) mod exif_parser;
pub(crate) mod iptc_parser;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, Exif, ImageBackend, ImageMetadata};
pub use operations::{
    PlannedVariant, ResponsiveConfig, ThumbnailConfig, VariantJob, plan_responsive,
    plan_thumbnail,
};
pub use params::{Quality, Sharpening};
pub use rust_backend::RustBackend;
