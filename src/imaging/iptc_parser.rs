//! IPTC-IIM reader for JPEG and TIFF files.
//!
//! Reads three fields from IPTC Record 2:
//! - ObjectName (2:05): title
//! - Caption-Abstract (2:120): description
//! - Keywords (2:25): repeatable
//!
//! JPEG files carry IPTC inside APP13 as Photoshop 8BIM resource 0x0404.
//! TIFF files carry it in IFD tag 33723 (raw IIM) or 34377 (8BIM block).

use super::container::{Tiff, jpeg_segments};
use std::path::Path;

const APP13: u8 = 0xED;
const PHOTOSHOP_HEADER: &[u8] = b"Photoshop 3.0\0";
const BIM_MARKER: &[u8] = b"8BIM";
const IPTC_RESOURCE_ID: u16 = 0x0404;
const TAG_IPTC_NAA: u16 = 33723;
const TAG_PHOTOSHOP: u16 = 34377;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IptcData {
    pub object_name: Option<String>,
    pub caption: Option<String>,
    pub keywords: Vec<String>,
}

impl IptcData {
    fn is_empty(&self) -> bool {
        self.object_name.is_none() && self.caption.is_none() && self.keywords.is_empty()
    }
}

/// Read IPTC metadata, dispatching on the file extension.
/// Unreadable or unsupported files yield empty metadata.
pub fn read_iptc(path: &Path) -> IptcData {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if !matches!(ext.as_str(), "jpg" | "jpeg" | "tif" | "tiff") {
        return IptcData::default();
    }

    let Ok(bytes) = std::fs::read(path) else {
        return IptcData::default();
    };
    match ext.as_str() {
        "jpg" | "jpeg" => read_iptc_from_jpeg(&bytes),
        _ => read_iptc_from_tiff(&bytes),
    }
}

/// Parse IIM datasets: `0x1C`, record, dataset, big-endian u16 length, data.
fn parse_iptc_iim(data: &[u8]) -> IptcData {
    let mut result = IptcData::default();
    let mut pos = 0;

    while pos + 5 <= data.len() {
        if data[pos] != 0x1C {
            pos += 1;
            continue;
        }
        let record = data[pos + 1];
        let dataset = data[pos + 2];
        let length = u16::from_be_bytes([data[pos + 3], data[pos + 4]]) as usize;
        pos += 5;
        let Some(raw) = data.get(pos..pos + length) else {
            break;
        };
        pos += length;

        if record != 2 {
            continue;
        }
        let value = String::from_utf8_lossy(raw).trim().to_string();
        if value.is_empty() {
            continue;
        }
        match dataset {
            5 => result.object_name = Some(value),
            25 => result.keywords.push(value),
            120 => result.caption = Some(value),
            _ => {}
        }
    }

    result
}

fn read_iptc_from_jpeg(data: &[u8]) -> IptcData {
    jpeg_segments(data)
        .into_iter()
        .filter(|(marker, _)| *marker == APP13)
        .find_map(|(_, segment)| extract_iptc_from_8bim(segment))
        .map(parse_iptc_iim)
        .unwrap_or_default()
}

/// Find resource 0x0404 in a Photoshop image resource block.
///
/// Each resource is `8BIM`, a u16 id, an even-padded Pascal name, a u32
/// length and the even-padded data.
fn extract_iptc_from_8bim(segment: &[u8]) -> Option<&[u8]> {
    let data = segment.strip_prefix(PHOTOSHOP_HEADER).unwrap_or(segment);

    let mut pos = 0;
    while pos + 12 <= data.len() {
        if &data[pos..pos + 4] != BIM_MARKER {
            pos += 1;
            continue;
        }
        pos += 4;
        let resource_id = u16::from_be_bytes([data[pos], data[pos + 1]]);
        pos += 2;

        let pascal_len = *data.get(pos)? as usize;
        pos += 1 + pascal_len + ((1 + pascal_len) % 2);

        let len_bytes = data.get(pos..pos + 4)?;
        let res_len =
            u32::from_be_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
        pos += 4;

        let resource = data.get(pos..pos + res_len)?;
        if resource_id == IPTC_RESOURCE_ID {
            return Some(resource);
        }
        pos += res_len + (res_len % 2);
    }

    None
}

fn read_iptc_from_tiff(data: &[u8]) -> IptcData {
    let Some(tiff) = Tiff::parse(data) else {
        return IptcData::default();
    };

    for ifd in tiff.ifd_chain() {
        for entry in &ifd {
            let iim = match entry.tag {
                TAG_IPTC_NAA => tiff.value_bytes(entry),
                TAG_PHOTOSHOP => tiff.value_bytes(entry).and_then(extract_iptc_from_8bim),
                _ => None,
            };
            if let Some(iim) = iim {
                let result = parse_iptc_iim(iim);
                if !result.is_empty() {
                    return result;
                }
            }
        }
    }

    IptcData::default()
}
