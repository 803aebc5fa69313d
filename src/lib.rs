//! # hugallery
//!
//! Turns a directory of photos into a gallery for the
//! [Hugo](http://gohugo.io/) static site generator. Directories become
//! albums, photos are ordered by numeric prefix, and every album becomes a
//! Hugo page bundle whose front matter lists its photos.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! Each stage produces a JSON manifest that the next stage consumes:
//!
//! ```text
//! 1. Scan      photos/    →  manifest.json                 (filesystem → structured data)
//! 2. Process   manifest   →  <site>/static/galleries/      (renditions + thumbnails)
//!                         →  processed.json
//! 3. Generate  processed  →  <site>/content/gallery/       (Hugo page bundles)
//! ```
//!
//! Each manifest is human-readable JSON, so a stage can be rerun on its own
//! and its input inspected when something looks off.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: walks the photo directory and produces the scan manifest |
//! | [`process`] | Stage 2: writes renditions and thumbnails, resolves photo metadata |
//! | [`generate`] | Stage 3: writes Hugo content files from the processed manifest |
//! | [`hugo`] | Front matter model, page bodies, generated-file detection |
//! | [`config`] | Cascading `hugallery.toml` loading, merging and validation |
//! | [`cache`] | Content-addressed cache that skips unchanged encodes |
//! | [`types`] | Types shared between stages (`GalleryNode`) |
//! | [`naming`] | `NNN-name` entry name parser |
//! | [`metadata`] | Title/description resolution, sidecars, slugs |
//! | [`imaging`] | Pure-Rust image operations: identify, resize, thumbnail, IPTC and EXIF |
//! | [`output`] | CLI output formatting for each stage |
//!
//! # Design Decisions
//!
//! ## Front Matter Over Layouts
//!
//! hugallery writes data, not HTML templates. Every album page lists its
//! photos under `[[photos]]` with URLs, dimensions, captions and EXIF
//! details, and the site's theme decides how to show them. A `{{< gallery >}}`
//! shortcode call (or plain `<figure>` blocks) in the page body is the only
//! markup it emits.
//!
//! ## Config Cascading (Root → Group → Album)
//!
//! ```text
//! photos/hugallery.toml                    ← root (overrides stock defaults)
//! photos/020-Travel/hugallery.toml         ← group (overrides root)
//! photos/020-Travel/010-Japan/hugallery.toml ← album (overrides group)
//! ```
//!
//! Image settings cascade. The `[hugo]` section only takes effect at the
//! root, since it describes the site rather than one album.
//!
//! ## NNN-Prefix Ordering
//!
//! Directories and files use a numeric prefix (`001-`, `020-`) for explicit
//! ordering and Hugo `weight`. Unprefixed albums are still generated but
//! kept out of Hugo's lists, which suits work in progress that should stay
//! reachable by direct URL.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate for decoding, Lanczos3
//! resampling and JPEG/AVIF encoding. No ImageMagick, no system libraries:
//! one self-contained binary.

pub mod cache;
pub mod config;
pub mod generate;
pub mod hugo;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod process;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
