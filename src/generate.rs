//! Hugo content generation.
//!
//! Stage 3 of the pipeline. Takes the processed manifest and writes Hugo
//! page bundles into the site's content directory.
//!
//! ## Generated Pages
//!
//! - **Section page** (`content/<section>/_index.md`): the gallery root
//! - **Group pages** (`.../<group>/_index.md`): branch bundles for directories of albums
//! - **Album pages** (`.../<album>/index.md`): leaf bundles listing every photo
//!
//! ## Output Structure
//!
//! ```text
//! content/gallery/
//! ├── _index.md
//! ├── landscapes/
//! │   └── index.md
//! ├── travel/
//! │   ├── _index.md
//! │   ├── japan/index.md
//! │   └── italy/index.md
//! └── wip-drafts/
//!     └── index.md           # _build.list = "never"
//! ```
//!
//! ## Ownership
//!
//! Every page carries `generator = "hugallery"`. An existing file without
//! that marker was written by someone else, and the run stops before
//! touching anything unless `force` is set. Pages whose content did not
//! change are left alone so Hugo's watcher stays quiet.

use crate::hugo::{
    self, AlbumFrontMatter, BuildOptions, GENERATOR, GroupFrontMatter, Photo, SrcsetEntry,
};
use crate::metadata;
use crate::process::{ProcessedAlbum, ProcessedImage, ProcessedManifest};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Front matter error: {0}")]
    FrontMatter(#[from] toml::ser::Error),
    #[error("{0} was not generated by hugallery (use --force to overwrite)")]
    Foreign(PathBuf),
}

/// Pages touched by one run, relative to the site root.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerateSummary {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
}

/// A rendered page waiting to be written.
struct Page {
    /// Relative to the site root.
    path: PathBuf,
    content: String,
}

pub fn generate(
    manifest_path: &Path,
    site_root: &Path,
    force: bool,
) -> Result<GenerateSummary, GenerateError> {
    let manifest_content = fs::read_to_string(manifest_path)?;
    let manifest: ProcessedManifest = serde_json::from_str(&manifest_content)?;

    let pages = render_pages(&manifest)?;

    // Check every target before writing anything
    let mut pending = Vec::new();
    let mut summary = GenerateSummary::default();
    for page in pages {
        let target = site_root.join(&page.path);
        match fs::read_to_string(&target) {
            Ok(existing) if existing == page.content => {
                summary.unchanged.push(page.path);
                continue;
            }
            Ok(existing) if !force && !hugo::is_generated(&existing) => {
                return Err(GenerateError::Foreign(target));
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        pending.push((target, page));
    }

    for (target, page) in pending {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &page.content)?;
        tracing::debug!(path = %page.path.display(), "wrote page");
        summary.written.push(page.path);
    }

    Ok(summary)
}

fn render_pages(manifest: &ProcessedManifest) -> Result<Vec<Page>, GenerateError> {
    let hugo_config = &manifest.config.hugo;
    let section_dir = Path::new("content").join(hugo_config.section.trim_matches('/'));
    let mut pages = Vec::with_capacity(1 + manifest.groups.len() + manifest.albums.len());

    let section = GroupFrontMatter {
        title: hugo_config.section_title.clone(),
        description: None,
        weight: None,
        generator: GENERATOR.to_string(),
        cover: first_cover(&manifest.albums, ""),
        build: None,
    };
    pages.push(Page {
        path: section_dir.join("_index.md"),
        content: hugo::render_page(&section, "")?,
    });

    for group in &manifest.groups {
        let front_matter = GroupFrontMatter {
            title: group.title.clone(),
            description: group.description.as_deref().map(metadata::plain_text),
            weight: group.weight,
            generator: GENERATOR.to_string(),
            cover: first_cover(&manifest.albums, &group.slug_path),
            build: (!group.listed).then(BuildOptions::unlisted),
        };
        let body = hugo::group_body(group.description.as_deref());
        pages.push(Page {
            path: section_dir.join(&group.slug_path).join("_index.md"),
            content: hugo::render_page(&front_matter, &body)?,
        });
    }

    for album in &manifest.albums {
        let photos: Vec<Photo> = album.images.iter().map(photo_entry).collect();
        let body = hugo::album_body(
            hugo_config.body,
            &hugo_config.shortcode,
            album.description.as_deref(),
            &album.title,
            &photos,
        );
        let front_matter = AlbumFrontMatter {
            title: album.title.clone(),
            date: album.date,
            description: album.description.as_deref().map(metadata::plain_text),
            weight: album.weight,
            generator: GENERATOR.to_string(),
            cover: album.cover_thumbnail.clone(),
            tags: album.keywords.clone(),
            build: (!album.listed).then(BuildOptions::unlisted),
            photos,
        };
        pages.push(Page {
            path: section_dir.join(&album.slug_path).join("index.md"),
            content: hugo::render_page(&front_matter, &body)?,
        });
    }

    Ok(pages)
}

/// Cover of the first listed album under `slug_prefix` (empty = whole gallery),
/// falling back to the first album at all.
fn first_cover(albums: &[ProcessedAlbum], slug_prefix: &str) -> Option<String> {
    let under_prefix = |album: &&ProcessedAlbum| {
        slug_prefix.is_empty()
            || album
                .slug_path
                .strip_prefix(slug_prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    };
    albums
        .iter()
        .filter(under_prefix)
        .find(|a| a.listed)
        .or_else(|| albums.iter().find(under_prefix))
        .and_then(|a| a.cover_thumbnail.clone())
}

fn photo_entry(image: &ProcessedImage) -> Photo {
    let full = image.largest().unwrap_or(&image.thumbnail);
    Photo {
        src: full.url.clone(),
        thumb: image.thumbnail.url.clone(),
        width: full.width,
        height: full.height,
        title: image.title.clone(),
        description: image.description.clone(),
        date: image.date,
        keywords: image.keywords.clone(),
        exif: image.exif.clone(),
        srcset: image
            .renditions
            .iter()
            .map(|r| SrcsetEntry {
                src: r.url.clone(),
                width: r.width,
                height: r.height,
            })
            .collect(),
    }
}
