//! Photo directory scanning.
//!
//! Stage 1 of the pipeline. Walks the photo directory, classifies every
//! directory as an album (contains photos) or a group (contains albums or
//! other groups), resolves the cascaded config for each album, and produces
//! a [`Manifest`] the process stage consumes.
//!
//! ```text
//! photos/
//! ├── hugallery.toml
//! ├── 010-Landscapes/          # album, listed, weight 10
//! │   ├── description.md
//! │   ├── 001-dawn.jpg         # cover
//! │   ├── 001-dawn.txt         # sidecar description
//! │   └── 010-mountains.jpg
//! ├── 020-Travel/              # group
//! │   ├── 010-Japan/
//! │   └── 020-Italy/
//! └── wip-drafts/              # album, built but not listed
//! ```
//!
//! The scanner rejects:
//! - directories holding both photos and subdirectories
//! - photos directly in the root (every photo belongs to an album)
//! - two photos with the same number in one album
//! - sibling directories whose names reduce to the same URL slug
//!
//! Empty directories are skipped.

use crate::config::{self, CONFIG_FILENAME, SiteConfig};
use crate::metadata::{self, DESCRIPTION_MD, DESCRIPTION_TXT, sanitize_slug};
use crate::naming::{ParsedName, parse_entry_name};
use crate::types::GalleryNode;
use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Photo directory not found: {0}")]
    NotFound(PathBuf),
    #[error("Directory contains both photos and subdirectories: {0}")]
    MixedContent(PathBuf),
    #[error("Photos must live in an album directory, found loose photos in: {0}")]
    LoosePhotos(PathBuf),
    #[error("Duplicate photo number {0} in {1}")]
    DuplicateNumber(u32, PathBuf),
    #[error("Slug '{0}' is used twice in {1}")]
    DuplicateSlug(String, PathBuf),
}

/// Scan stage output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Gallery tree in display order.
    pub tree: Vec<GalleryNode>,
    pub groups: Vec<Group>,
    pub albums: Vec<Album>,
    /// Root-level config. Albums carry their own cascaded copy.
    pub config: SiteConfig,
}

/// A directory of albums (or of other groups).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub path: String,
    pub slug_path: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub listed: bool,
}

/// A directory of photos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    /// Source directory relative to the photo root.
    pub path: String,
    /// URL path below the content section.
    pub slug_path: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Source path of the cover photo.
    pub cover: String,
    pub images: Vec<Image>,
    /// Numbered albums (under numbered groups) appear in Hugo lists.
    pub listed: bool,
    /// Config after cascading root → groups → album.
    pub config: SiteConfig,
}

/// A photo inside an album.
///
/// Filenames follow `(NNN-)?title.ext`:
/// - `001-Old-Harbour.jpg` → number 1, title "Old Harbour"
/// - `001.jpg` → number 1, no title
/// - `Harbour.jpg` → unnumbered, title "Harbour"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    /// 1-based position in album order.
    pub position: usize,
    pub source_path: String,
    pub filename: String,
    /// Output file stem, unique within the album: `003-old-harbour`.
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<FixedOffset>>,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff", "webp"];

pub fn scan(root: &Path) -> Result<Manifest, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotFound(root.to_path_buf()));
    }

    let base = config::stock_defaults_value();
    let root_value = match config::load_raw_config(root)? {
        Some(overlay) => config::merge_toml(base, overlay),
        None => base,
    };
    let config = config::resolve_config(root_value.clone(), None)?;

    let mut scanner = Scanner {
        root,
        groups: Vec::new(),
        albums: Vec::new(),
    };

    let entries = collect_entries(root)?;
    if entries.iter().any(|e| is_image(e)) {
        return Err(ScanError::LoosePhotos(root.to_path_buf()));
    }
    let subdirs: Vec<PathBuf> = entries.into_iter().filter(|e| e.is_dir()).collect();
    let tree = scanner.scan_children(root, &subdirs, &root_value, "", true)?;

    Ok(Manifest {
        tree,
        groups: scanner.groups,
        albums: scanner.albums,
        config,
    })
}

struct Scanner<'a> {
    root: &'a Path,
    groups: Vec<Group>,
    albums: Vec<Album>,
}

/// Where a directory sits in the tree, as seen from its parent.
struct Placement<'a> {
    parsed: ParsedName,
    slug_path: String,
    listed: bool,
    config: &'a toml::Value,
}

impl Scanner<'_> {
    /// Scan sibling directories in display order, returning their non-empty nodes.
    fn scan_children(
        &mut self,
        parent: &Path,
        subdirs: &[PathBuf],
        parent_config: &toml::Value,
        parent_slug: &str,
        parent_listed: bool,
    ) -> Result<Vec<GalleryNode>, ScanError> {
        let mut named: Vec<(ParsedName, &PathBuf)> = subdirs
            .iter()
            .map(|d| (parse_entry_name(&file_name(d)), d))
            .collect();
        named.sort_by_key(|(parsed, _)| parsed.sort_key());

        let mut seen_slugs = HashSet::new();
        let mut nodes = Vec::new();
        for (parsed, dir) in named {
            let slug = dir_slug(&parsed);
            if !seen_slugs.insert(slug.clone()) {
                return Err(ScanError::DuplicateSlug(slug, parent.to_path_buf()));
            }
            let placement = Placement {
                listed: parent_listed && parsed.number.is_some(),
                slug_path: join_slug(parent_slug, &slug),
                parsed,
                config: parent_config,
            };
            if let Some(node) = self.scan_directory(dir, placement)? {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    fn scan_directory(
        &mut self,
        dir: &Path,
        placement: Placement<'_>,
    ) -> Result<Option<GalleryNode>, ScanError> {
        let entries = collect_entries(dir)?;
        let images: Vec<&PathBuf> = entries.iter().filter(|e| is_image(e)).collect();
        let subdirs: Vec<PathBuf> = entries.iter().filter(|e| e.is_dir()).cloned().collect();

        if !images.is_empty() && !subdirs.is_empty() {
            return Err(ScanError::MixedContent(dir.to_path_buf()));
        }

        let config_value = match config::load_raw_config(dir)? {
            Some(overlay) => {
                if overlay.get("hugo").is_some() {
                    tracing::warn!(
                        path = %dir.join(config::CONFIG_FILENAME).display(),
                        "[hugo] only takes effect in the root hugallery.toml, ignoring it here"
                    );
                }
                config::merge_toml(placement.config.clone(), overlay)
            }
            None => placement.config.clone(),
        };
        let source_dir = self.relative(dir);
        let title = display_title(&placement.parsed, dir);

        if !images.is_empty() {
            let album_config = config::resolve_config(config_value, None)?;
            let album = self.build_album(dir, &placement, &title, &images, album_config)?;
            let node = GalleryNode {
                title,
                slug_path: album.slug_path.clone(),
                source_dir,
                children: vec![],
            };
            self.albums.push(album);
            return Ok(Some(node));
        }

        if subdirs.is_empty() {
            tracing::debug!(dir = %dir.display(), "skipping empty directory");
            return Ok(None);
        }

        let children = self.scan_children(
            dir,
            &subdirs,
            &config_value,
            &placement.slug_path,
            placement.listed,
        )?;
        if children.is_empty() {
            return Ok(None);
        }

        self.groups.push(Group {
            path: source_dir.clone(),
            slug_path: placement.slug_path.clone(),
            title: title.clone(),
            weight: placement.parsed.number,
            description: metadata::read_album_description(dir),
            listed: placement.listed,
        });
        Ok(Some(GalleryNode {
            title,
            slug_path: placement.slug_path,
            source_dir,
            children,
        }))
    }

    fn build_album(
        &self,
        dir: &Path,
        placement: &Placement<'_>,
        title: &str,
        images: &[&PathBuf],
        config: SiteConfig,
    ) -> Result<Album, ScanError> {
        let mut ordered: Vec<(ParsedName, &PathBuf)> = Vec::with_capacity(images.len());
        let mut numbers = HashSet::new();
        for &img in images {
            let parsed = parse_entry_name(&file_stem(img));
            if let Some(num) = parsed.number
                && !numbers.insert(num)
            {
                return Err(ScanError::DuplicateNumber(num, dir.to_path_buf()));
            }
            ordered.push((parsed, img));
        }
        ordered.sort_by(|(a, pa), (b, pb)| a.sort_key().cmp(&b.sort_key()).then(pa.cmp(pb)));

        let images: Vec<Image> = ordered
            .into_iter()
            .enumerate()
            .map(|(i, (parsed, path))| self.build_image(i + 1, parsed, path))
            .collect();

        let cover = images
            .iter()
            .find(|img| img.number == Some(1))
            .or_else(|| images.first())
            .map(|img| img.source_path.clone())
            .unwrap_or_default();

        Ok(Album {
            path: self.relative(dir),
            slug_path: placement.slug_path.clone(),
            title: title.to_string(),
            weight: placement.parsed.number,
            description: metadata::read_album_description(dir),
            cover,
            images,
            listed: placement.listed,
            config,
        })
    }

    fn build_image(&self, position: usize, parsed: ParsedName, path: &Path) -> Image {
        let name_slug = sanitize_slug(&parsed.name);
        let slug = if name_slug.is_empty() {
            format!("{:03}", position)
        } else {
            format!("{:03}-{}", position, name_slug)
        };
        let title = Some(parsed.display_title.trim().to_string()).filter(|t| !t.is_empty());
        let modified: Option<DateTime<FixedOffset>> = fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(|t| DateTime::<Local>::from(t).into());

        Image {
            number: parsed.number,
            position,
            source_path: self.relative(path),
            filename: file_name(path),
            slug,
            title,
            description: metadata::read_sidecar(path),
            modified,
        }
    }

    /// Path relative to the photo root with `/` separators.
    fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(self.root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// List a directory's entries sorted by name, minus hidden and reserved files.
fn collect_entries(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.')
            || name == CONFIG_FILENAME
            || name == DESCRIPTION_MD
            || name == DESCRIPTION_TXT
        {
            continue;
        }
        entries.push(entry.into_path());
    }
    Ok(entries)
}

fn is_image(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Album/group title; number-only directory names fall back to the raw name.
fn display_title(parsed: &ParsedName, dir: &Path) -> String {
    if parsed.display_title.trim().is_empty() {
        file_name(dir)
    } else {
        parsed.display_title.trim().to_string()
    }
}

fn dir_slug(parsed: &ParsedName) -> String {
    let slug = sanitize_slug(&parsed.name);
    if !slug.is_empty() {
        return slug;
    }
    match parsed.number {
        Some(n) => format!("{:03}", n),
        None => "untitled".to_string(),
    }
}

fn join_slug(parent: &str, slug: &str) -> String {
    if parent.is_empty() {
        slug.to_string()
    } else {
        format!("{}/{}", parent, slug)
    }
}
