//! EXIF reader for JPEG and TIFF files.
//!
//! JPEG files carry EXIF in an APP1 segment starting with `Exif\0\0`,
//! followed by a complete TIFF structure. TIFF files are that structure.
//!
//! Tags read from IFD0:
//!
//! | Tag | Name |
//! |---|---|
//! | `0x0112` | Orientation |
//! | `0x010F` | Make |
//! | `0x0110` | Model |
//! | `0x8769` | Exif IFD pointer |
//!
//! and from the Exif IFD: DateTimeOriginal (`0x9003`), ExposureTime
//! (`0x829A`), FNumber (`0x829D`), ISO (`0x8827`), FocalLength (`0x920A`)
//! and LensModel (`0xA434`).

use super::backend::Exif;
use super::container::{IfdEntry, Tiff, jpeg_segments};
use chrono::NaiveDateTime;
use std::path::Path;

const APP1: u8 = 0xE1;
const EXIF_HEADER: &[u8] = b"Exif\0\0";

const TAG_MAKE: u16 = 0x010F;
const TAG_MODEL: u16 = 0x0110;
const TAG_ORIENTATION: u16 = 0x0112;
const TAG_EXIF_IFD: u16 = 0x8769;
const TAG_EXPOSURE_TIME: u16 = 0x829A;
const TAG_F_NUMBER: u16 = 0x829D;
const TAG_ISO: u16 = 0x8827;
const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;
const TAG_FOCAL_LENGTH: u16 = 0x920A;
const TAG_LENS_MODEL: u16 = 0xA434;

const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Raw EXIF values as stored in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExifData {
    pub orientation: Option<u16>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub taken: Option<NaiveDateTime>,
    pub exposure_time: Option<(u32, u32)>,
    pub f_number: Option<(u32, u32)>,
    pub iso: Option<u32>,
    pub focal_length: Option<(u32, u32)>,
    pub lens: Option<String>,
}

impl ExifData {
    /// Orientation in the 1-8 range, treating anything else as upright.
    pub fn orientation(&self) -> u16 {
        self.orientation.filter(|o| (1..=8).contains(o)).unwrap_or(1)
    }

    /// Human-readable summary for the gallery front matter.
    pub fn to_exif(&self) -> Exif {
        Exif {
            taken: self.taken,
            camera: camera_name(self.make.as_deref(), self.model.as_deref()),
            lens: self.lens.clone(),
            exposure: self.exposure_time.and_then(format_exposure),
            aperture: self.f_number.and_then(format_aperture),
            iso: self.iso.filter(|&iso| iso > 0),
            focal_length: self.focal_length.and_then(format_focal_length),
        }
    }
}

/// Read EXIF from a file, dispatching on the file extension.
/// Unreadable or unsupported files yield empty data.
pub fn read_exif(path: &Path) -> ExifData {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if !matches!(ext.as_str(), "jpg" | "jpeg" | "tif" | "tiff") {
        return ExifData::default();
    }

    let Ok(bytes) = std::fs::read(path) else {
        return ExifData::default();
    };
    match ext.as_str() {
        "jpg" | "jpeg" => read_exif_from_jpeg(&bytes),
        _ => parse_tiff_exif(&bytes),
    }
}

fn read_exif_from_jpeg(data: &[u8]) -> ExifData {
    jpeg_segments(data)
        .into_iter()
        .filter(|(marker, _)| *marker == APP1)
        .find_map(|(_, segment)| segment.strip_prefix(EXIF_HEADER))
        .map(parse_tiff_exif)
        .unwrap_or_default()
}

fn parse_tiff_exif(data: &[u8]) -> ExifData {
    let Some(tiff) = Tiff::parse(data) else {
        return ExifData::default();
    };
    let Some(ifd0) = tiff.first_ifd().and_then(|o| tiff.ifd(o)).map(|(e, _)| e) else {
        return ExifData::default();
    };

    let mut exif = ExifData::default();
    let mut exif_ifd = None;
    for entry in &ifd0 {
        match entry.tag {
            TAG_ORIENTATION => exif.orientation = tiff.unsigned(entry).map(|v| v as u16),
            TAG_MAKE => exif.make = tiff.ascii(entry),
            TAG_MODEL => exif.model = tiff.ascii(entry),
            TAG_EXIF_IFD => exif_ifd = tiff.unsigned(entry).map(|v| v as usize),
            _ => {}
        }
    }

    let sub_entries: Vec<IfdEntry> = exif_ifd
        .and_then(|offset| tiff.ifd(offset))
        .map(|(entries, _)| entries)
        .unwrap_or_default();
    for entry in &sub_entries {
        match entry.tag {
            TAG_DATE_TIME_ORIGINAL => {
                exif.taken = tiff.ascii(entry).and_then(|s| parse_exif_date(&s))
            }
            TAG_EXPOSURE_TIME => exif.exposure_time = tiff.rational(entry),
            TAG_F_NUMBER => exif.f_number = tiff.rational(entry),
            TAG_ISO => exif.iso = tiff.unsigned(entry),
            TAG_FOCAL_LENGTH => exif.focal_length = tiff.rational(entry),
            TAG_LENS_MODEL => exif.lens = tiff.ascii(entry),
            _ => {}
        }
    }

    exif
}

/// `2024:05:01 18:30:00` → NaiveDateTime. Zeroed placeholder dates fail.
fn parse_exif_date(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), EXIF_DATE_FORMAT).ok()
}

/// Make and model, dropping the make when the model already starts with it.
fn camera_name(make: Option<&str>, model: Option<&str>) -> Option<String> {
    match (make, model) {
        (Some(make), Some(model)) if model.to_lowercase().starts_with(&make.to_lowercase()) => {
            Some(model.to_string())
        }
        (Some(make), Some(model)) => Some(format!("{make} {model}")),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => None,
    }
}

/// `1/250s` for fast shutters, `2s` or `0.5s` for slow ones.
fn format_exposure((num, den): (u32, u32)) -> Option<String> {
    if num == 0 || den == 0 {
        return None;
    }
    if num < den {
        let reciprocal = (den as f64 / num as f64).round() as u32;
        Some(format!("1/{reciprocal}s"))
    } else {
        Some(format!("{}s", trim_decimal(num as f64 / den as f64)))
    }
}

/// `f/2.8`
fn format_aperture((num, den): (u32, u32)) -> Option<String> {
    (num > 0 && den > 0).then(|| format!("f/{}", trim_decimal(num as f64 / den as f64)))
}

/// `35mm`
fn format_focal_length((num, den): (u32, u32)) -> Option<String> {
    (num > 0 && den > 0).then(|| format!("{}mm", trim_decimal(num as f64 / den as f64)))
}

/// One decimal place, without a trailing `.0`.
fn trim_decimal(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as u64)
    } else {
        format!("{rounded:.1}")
    }
}
