//! Shared test utilities: fixture trees, manifest lookups, tree assertions.
//!
//! ```rust
//! let tmp = setup_fixtures();
//! let manifest = scan(tmp.path()).unwrap();
//!
//! let album = find_album(&manifest, "Landscapes");
//! let image = find_image(album, "001-dawn");
//!
//! assert_tree_shape(&manifest, &[
//!     ("Landscapes", &[]),
//!     ("Travel", &["Japan", "Italy"]),
//!     ("wip drafts", &[]),
//! ]);
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::config::CONFIG_FILENAME;
use crate::metadata::{DESCRIPTION_MD, DESCRIPTION_TXT};
use crate::scan::{Album, Image, Manifest};

// =========================================================================
// Fixture setup
// =========================================================================

/// Build a small photo tree in a temp directory.
///
/// ```text
/// hugallery.toml                 [images] quality = 80
/// 010-Landscapes/
///     description.md             "Quiet places, early light."
///     001-dawn.jpg, 001-dawn.txt "First light over the lake"
///     010-mountains.jpg
/// 020-Travel/
///     hugallery.toml             [thumbnails] aspect_ratio = [4, 5]
///     description.txt            "Trips abroad."
///     010-Japan/
///         hugallery.toml         [images] format = "avif"
///         001-tokyo.jpg, 002-kyoto.jpg
///     020-Italy/
///         001-rome.jpg
/// wip-drafts/
///     draft.jpg
/// ```
///
/// Photos are placeholder bytes: scanning only looks at extensions.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    fs::write(root.join(CONFIG_FILENAME), "[images]\nquality = 80\n").unwrap();

    write_photo(root, "010-Landscapes/001-dawn.jpg");
    write_photo(root, "010-Landscapes/010-mountains.jpg");
    fs::write(
        root.join("010-Landscapes/001-dawn.txt"),
        "First light over the lake\n",
    )
    .unwrap();
    fs::write(
        root.join("010-Landscapes").join(DESCRIPTION_MD),
        "Quiet places, early light.\n",
    )
    .unwrap();

    write_photo(root, "020-Travel/010-Japan/001-tokyo.jpg");
    write_photo(root, "020-Travel/010-Japan/002-kyoto.jpg");
    write_photo(root, "020-Travel/020-Italy/001-rome.jpg");
    fs::write(
        root.join("020-Travel").join(CONFIG_FILENAME),
        "[thumbnails]\naspect_ratio = [4, 5]\n",
    )
    .unwrap();
    fs::write(root.join("020-Travel").join(DESCRIPTION_TXT), "Trips abroad.").unwrap();
    fs::write(
        root.join("020-Travel/010-Japan").join(CONFIG_FILENAME),
        "[images]\nformat = \"avif\"\n",
    )
    .unwrap();

    write_photo(root, "wip-drafts/draft.jpg");
    tmp
}

/// Write a placeholder photo at `rel`, creating parent directories.
pub fn write_photo(root: &Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"fake image").unwrap();
}

// =========================================================================
// Manifest lookups (panic with the available names on a miss)
// =========================================================================

pub fn find_album<'a>(manifest: &'a Manifest, title: &str) -> &'a Album {
    manifest
        .albums
        .iter()
        .find(|a| a.title == title)
        .unwrap_or_else(|| {
            let titles = album_titles(manifest);
            panic!("album '{title}' not found. Available: {titles:?}")
        })
}

pub fn find_image<'a>(album: &'a Album, slug: &str) -> &'a Image {
    album
        .images
        .iter()
        .find(|i| i.slug == slug)
        .unwrap_or_else(|| {
            let slugs: Vec<&str> = album.images.iter().map(|i| i.slug.as_str()).collect();
            panic!(
                "image '{slug}' not found in album '{}'. Available: {slugs:?}",
                album.title
            )
        })
}

// =========================================================================
// Bulk extractors
// =========================================================================

pub fn album_titles(manifest: &Manifest) -> Vec<&str> {
    manifest.albums.iter().map(|a| a.title.as_str()).collect()
}

pub fn image_titles(album: &Album) -> Vec<Option<&str>> {
    album.images.iter().map(|i| i.title.as_deref()).collect()
}

pub fn image_descriptions(album: &Album) -> Vec<Option<&str>> {
    album
        .images
        .iter()
        .map(|i| i.description.as_deref())
        .collect()
}

// =========================================================================
// Tree assertions
// =========================================================================

/// Assert the gallery tree matches `(title, child titles)` pairs, in order.
pub fn assert_tree_shape(manifest: &Manifest, expected: &[(&str, &[&str])]) {
    let actual: Vec<&str> = manifest.tree.iter().map(|n| n.title.as_str()).collect();
    let expected_titles: Vec<&str> = expected.iter().map(|(t, _)| *t).collect();
    assert_eq!(actual, expected_titles, "tree top-level titles mismatch");

    for (node, (title, children)) in manifest.tree.iter().zip(expected) {
        let actual_children: Vec<&str> = node.children.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(
            actual_children,
            children.to_vec(),
            "children of '{title}' mismatch"
        );
    }
}

// =========================================================================
// Synthetic JPEGs and EXIF blocks
// =========================================================================

/// EXIF fields to embed. Unset fields are left out of the block.
#[derive(Debug, Default, Clone)]
pub struct ExifFixture {
    pub orientation: Option<u16>,
    pub make: Option<&'static str>,
    pub model: Option<&'static str>,
    /// `YYYY:MM:DD HH:MM:SS`
    pub taken: Option<&'static str>,
    pub exposure: Option<(u32, u32)>,
    pub f_number: Option<(u32, u32)>,
    pub iso: Option<u16>,
    pub focal_length: Option<(u32, u32)>,
    pub lens: Option<&'static str>,
}

enum FixtureValue {
    Short(u16),
    Long(u32),
    Ascii(&'static str),
    Rational((u32, u32)),
}

impl FixtureValue {
    /// `(type, count, little-endian bytes)`
    fn encode(&self) -> (u16, u32, Vec<u8>) {
        match *self {
            FixtureValue::Short(v) => (3, 1, v.to_le_bytes().to_vec()),
            FixtureValue::Long(v) => (4, 1, v.to_le_bytes().to_vec()),
            FixtureValue::Ascii(s) => {
                let mut bytes = s.as_bytes().to_vec();
                bytes.push(0);
                (2, bytes.len() as u32, bytes)
            }
            FixtureValue::Rational((n, d)) => (5, 1, [n.to_le_bytes(), d.to_le_bytes()].concat()),
        }
    }
}

fn ifd_size(entries: usize) -> u32 {
    (2 + 12 * entries + 4) as u32
}

/// Append one IFD. Values over four bytes go to `data`, which the caller
/// places at `data_base` after the last IFD.
fn write_ifd(
    out: &mut Vec<u8>,
    entries: &[(u16, FixtureValue)],
    data: &mut Vec<u8>,
    data_base: u32,
) {
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for (tag, value) in entries {
        let (typ, count, bytes) = value.encode();
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&typ.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        if bytes.len() <= 4 {
            let mut field = bytes;
            field.resize(4, 0);
            out.extend_from_slice(&field);
        } else {
            out.extend_from_slice(&(data_base + data.len() as u32).to_le_bytes());
            data.extend_from_slice(&bytes);
        }
    }
    out.extend_from_slice(&0u32.to_le_bytes());
}

/// Little-endian TIFF block: IFD0, then the Exif sub-IFD, then shared data.
pub fn exif_tiff_bytes(fixture: &ExifFixture) -> Vec<u8> {
    use FixtureValue::*;

    let mut ifd0 = Vec::new();
    if let Some(v) = fixture.orientation {
        ifd0.push((0x0112, Short(v)));
    }
    if let Some(v) = fixture.make {
        ifd0.push((0x010F, Ascii(v)));
    }
    if let Some(v) = fixture.model {
        ifd0.push((0x0110, Ascii(v)));
    }

    let mut exif = Vec::new();
    if let Some(v) = fixture.exposure {
        exif.push((0x829A, Rational(v)));
    }
    if let Some(v) = fixture.f_number {
        exif.push((0x829D, Rational(v)));
    }
    if let Some(v) = fixture.iso {
        exif.push((0x8827, Short(v)));
    }
    if let Some(v) = fixture.taken {
        exif.push((0x9003, Ascii(v)));
    }
    if let Some(v) = fixture.focal_length {
        exif.push((0x920A, Rational(v)));
    }
    if let Some(v) = fixture.lens {
        exif.push((0xA434, Ascii(v)));
    }

    let exif_offset = 8 + ifd_size(ifd0.len() + 1);
    ifd0.push((0x8769, Long(exif_offset)));
    let data_base = exif_offset + ifd_size(exif.len());

    let mut out = b"II*\0".to_vec();
    out.extend_from_slice(&8u32.to_le_bytes());
    let mut data = Vec::new();
    write_ifd(&mut out, &ifd0, &mut data, data_base);
    write_ifd(&mut out, &exif, &mut data, data_base);
    out.extend(data);
    out
}

fn encode_gradient_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_with_encoder(image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut buf, 90,
        ))
        .unwrap();
    buf
}

/// Write a real gradient JPEG, creating parent directories.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, encode_gradient_jpeg(width, height)).unwrap();
}

/// Write a single-color JPEG, creating parent directories.
pub fn write_solid_jpeg(path: &Path, width: u32, height: u32, rgb: [u8; 3]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    image::RgbImage::from_pixel(width, height, image::Rgb(rgb))
        .save(path)
        .unwrap();
}

/// Red channel at the center of an image file.
pub fn center_red(path: &Path) -> u8 {
    let img = image::open(path).unwrap().to_rgb8();
    img.get_pixel(img.width() / 2, img.height() / 2)[0]
}

/// Write a real JPEG with an EXIF APP1 segment right after SOI.
pub fn write_jpeg_with_exif(path: &Path, width: u32, height: u32, exif: &ExifFixture) {
    let jpeg = encode_gradient_jpeg(width, height);
    let tiff = exif_tiff_bytes(exif);

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend(tiff);
    out.extend_from_slice(&jpeg[2..]);

    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, out).unwrap();
}
