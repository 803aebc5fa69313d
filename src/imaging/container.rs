//! Byte-level walkers for the containers embedded metadata lives in.
//!
//! - JPEG: a sequence of marker segments. IPTC sits in APP13, EXIF in APP1.
//! - TIFF: a header plus a chain of IFDs (Image File Directories), each a
//!   list of 12-byte tagged entries. EXIF blocks are TIFF structures too.
//!
//! Everything here is bounds-checked and returns `None` on malformed input.

/// JPEG marker segments before the image data, as `(marker, payload)`.
///
/// Stops at Start of Scan since metadata always precedes it.
pub(crate) fn jpeg_segments(data: &[u8]) -> Vec<(u8, &[u8])> {
    let mut segments = Vec::new();
    if !data.starts_with(&[0xFF, 0xD8]) {
        return segments;
    }

    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            break;
        }
        let marker = data[pos + 1];
        match marker {
            // Fill byte
            0xFF => {
                pos += 1;
                continue;
            }
            // SOS / EOI
            0xDA | 0xD9 => break,
            // Standalone markers carry no length
            0x01 | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            _ => {}
        }

        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if len < 2 {
            break;
        }
        let end = (pos + 2 + len).min(data.len());
        segments.push((marker, &data[pos + 4..end]));
        pos += 2 + len;
    }
    segments
}

/// One IFD entry. The value lives inline when it fits in four bytes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct IfdEntry {
    pub tag: u16,
    pub typ: u16,
    pub count: u32,
    /// Offset of the entry's 4-byte value/offset field.
    field: usize,
}

/// A parsed TIFF header over borrowed bytes. Offsets are relative to the header.
pub(crate) struct Tiff<'a> {
    data: &'a [u8],
    big_endian: bool,
}

impl<'a> Tiff<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let big_endian = match data.get(0..2)? {
            b"MM" => true,
            b"II" => false,
            _ => return None,
        };
        let tiff = Self { data, big_endian };
        (tiff.u16_at(2)? == 42).then_some(tiff)
    }

    pub fn first_ifd(&self) -> Option<usize> {
        self.u32_at(4).map(|o| o as usize)
    }

    /// Entries of the IFD at `offset`, plus the offset of the next IFD (0 = last).
    pub fn ifd(&self, offset: usize) -> Option<(Vec<IfdEntry>, usize)> {
        let count = self.u16_at(offset)? as usize;
        let start = offset + 2;
        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let at = start + i * 12;
            entries.push(IfdEntry {
                tag: self.u16_at(at)?,
                typ: self.u16_at(at + 2)?,
                count: self.u32_at(at + 4)?,
                field: at + 8,
            });
        }
        let next = self.u32_at(start + count * 12).unwrap_or(0) as usize;
        Some((entries, next))
    }

    /// Walk the IFD chain from the first IFD, guarding against offset loops.
    pub fn ifd_chain(&self) -> Vec<Vec<IfdEntry>> {
        let mut chain = Vec::new();
        let mut seen = Vec::new();
        let mut offset = self.first_ifd().unwrap_or(0);
        while offset != 0 && !seen.contains(&offset) {
            seen.push(offset);
            let Some((entries, next)) = self.ifd(offset) else {
                break;
            };
            chain.push(entries);
            offset = next;
        }
        chain
    }

    /// Raw value bytes of an entry, resolving out-of-line offsets.
    pub fn value_bytes(&self, entry: &IfdEntry) -> Option<&'a [u8]> {
        let len = (entry.count as usize).checked_mul(type_size(entry.typ))?;
        let start = if len <= 4 {
            entry.field
        } else {
            self.u32_at(entry.field)? as usize
        };
        self.data.get(start..start.checked_add(len)?)
    }

    /// ASCII value, trimmed of NULs and whitespace. `None` when empty.
    pub fn ascii(&self, entry: &IfdEntry) -> Option<String> {
        let bytes = self.value_bytes(entry)?;
        let text = String::from_utf8_lossy(bytes);
        let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
        (!text.is_empty()).then(|| text.to_string())
    }

    /// First value of a SHORT or LONG entry.
    pub fn unsigned(&self, entry: &IfdEntry) -> Option<u32> {
        match entry.typ {
            3 => self.u16_at(entry.field).map(u32::from),
            4 => self.u32_at(entry.field),
            _ => None,
        }
    }

    /// First value of a RATIONAL entry as `(numerator, denominator)`.
    pub fn rational(&self, entry: &IfdEntry) -> Option<(u32, u32)> {
        if entry.typ != 5 {
            return None;
        }
        let offset = self.u32_at(entry.field)? as usize;
        Some((self.u32_at(offset)?, self.u32_at(offset + 4)?))
    }

    fn u16_at(&self, offset: usize) -> Option<u16> {
        let b = self.data.get(offset..offset + 2)?;
        Some(if self.big_endian {
            u16::from_be_bytes([b[0], b[1]])
        } else {
            u16::from_le_bytes([b[0], b[1]])
        })
    }

    fn u32_at(&self, offset: usize) -> Option<u32> {
        let b = self.data.get(offset..offset + 4)?;
        let bytes = [b[0], b[1], b[2], b[3]];
        Some(if self.big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        })
    }
}

/// Byte size of one value of a TIFF field type.
fn type_size(typ: u16) -> usize {
    match typ {
        1 | 2 | 6 | 7 => 1, // BYTE, ASCII, SBYTE, UNDEFINED
        3 | 8 => 2,         // SHORT, SSHORT
        4 | 9 | 11 => 4,    // LONG, SLONG, FLOAT
        5 | 10 | 12 => 8,   // RATIONAL, SRATIONAL, DOUBLE
        _ => 1,
    }
}
