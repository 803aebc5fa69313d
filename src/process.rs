//! Image processing and rendition generation.
//!
//! Stage 2 of the pipeline. Reads the scan manifest, writes renditions and
//! thumbnails into the Hugo site's `static/` tree, resolves every photo's
//! metadata, and produces the processed manifest the generate stage reads.
//!
//! ## Output Structure
//!
//! ```text
//! <site>/static/galleries/
//! ├── .hugallery-cache.json
//! ├── landscapes/
//! │   ├── 001-dawn-800.jpg
//! │   ├── 001-dawn-1600.jpg
//! │   ├── 001-dawn-thumb.jpg
//! │   └── ...
//! └── travel/japan/
//!     └── ...
//! ```
//!
//! Directories follow the album slug path, so image URLs line up with the
//! content URLs Hugo produces for the album pages.
//!
//! ## Metadata
//!
//! Per photo, each field resolves independently (see [`crate::metadata`]):
//! title from IPTC then filename, description from sidecar then IPTC
//! caption, keywords and camera details from IPTC/EXIF.
//!
//! Per album, the date is the earliest EXIF capture time, falling back to
//! the newest file modification time, and the keywords are the union of the
//! photos' keywords in first-seen order.
//!
//! ## Parallel Processing
//!
//! Photos within an album are processed in parallel with rayon. Album order
//! and photo order are preserved in the output manifest.

use crate::cache::{self, CacheManifest, CacheStats};
use crate::config::SiteConfig;
use crate::imaging::{
    BackendError, Dimensions, Exif, ImageBackend, ImageMetadata, PlannedVariant,
    ResponsiveConfig, RustBackend, ThumbnailConfig, VariantJob, plan_responsive, plan_thumbnail,
};
use crate::metadata;
use crate::scan::{self, Group};
use crate::types::GalleryNode;
use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Source image not found: {0}")]
    SourceNotFound(PathBuf),
}

/// Process stage output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedManifest {
    pub tree: Vec<GalleryNode>,
    pub groups: Vec<Group>,
    pub albums: Vec<ProcessedAlbum>,
    pub config: SiteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedAlbum {
    pub path: String,
    pub slug_path: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub listed: bool,
    /// Thumbnail URL of the cover photo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    pub images: Vec<ProcessedImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedImage {
    pub position: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    pub source_path: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// Capture time, or the file modification time without EXIF.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exif: Option<Exif>,
    /// Upright dimensions of the source.
    pub dimensions: Dimensions,
    /// Smallest first.
    pub renditions: Vec<OutputFile>,
    pub thumbnail: OutputFile,
}

impl ProcessedImage {
    /// The largest rendition, used as the full-size `src`.
    pub fn largest(&self) -> Option<&OutputFile> {
        self.renditions.last()
    }
}

/// One written file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFile {
    /// Rendition size on the longer edge. Absent for thumbnails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    /// Relative to the images root.
    pub path: String,
    /// Site-absolute URL: `/galleries/travel/japan/001-tokyo-800.jpg`.
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Cache outcome for one output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantStatus {
    /// Already on disk at the wanted path.
    Cached,
    /// Found under another path and copied.
    Copied,
    /// Encoded from the source.
    Encoded,
}

#[derive(Debug, Clone)]
pub struct VariantInfo {
    /// `800px` or `thumbnail`.
    pub label: String,
    pub status: VariantStatus,
}

/// Progress events, sent as work completes. Image events within an album
/// may arrive out of order.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    AlbumStarted {
        title: String,
        image_count: usize,
    },
    ImageProcessed {
        /// 1-based position in the album.
        index: usize,
        title: Option<String>,
        source_path: String,
        variants: Vec<VariantInfo>,
    },
}

pub struct ProcessResult {
    pub manifest: ProcessedManifest,
    pub cache_stats: CacheStats,
}

/// Directory receiving renditions: `<site>/static/<images_dir>`.
pub fn images_root(site_root: &Path, config: &SiteConfig) -> PathBuf {
    site_root
        .join("static")
        .join(config.hugo.images_dir.trim_matches('/'))
}

pub fn process(
    manifest_path: &Path,
    source_root: &Path,
    images_root: &Path,
    use_cache: bool,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    let backend = RustBackend::new();
    process_with_backend(
        &backend,
        manifest_path,
        source_root,
        images_root,
        use_cache,
        events,
    )
}

/// Process with a specific backend (tests pass a mock).
///
/// Runs in two passes. The first reads every source and decides, against
/// the cache as it was before the run, whether each output is already in
/// place, can be copied from another path, or must be encoded. Files to be
/// copied are staged aside before the second pass writes anything, so an
/// output overwritten during the run is never read back as a cache hit.
pub fn process_with_backend(
    backend: &impl ImageBackend,
    manifest_path: &Path,
    source_root: &Path,
    images_root: &Path,
    use_cache: bool,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    let manifest_content = std::fs::read_to_string(manifest_path)?;
    let input: scan::Manifest = serde_json::from_str(&manifest_content)?;

    std::fs::create_dir_all(images_root)?;
    let previous = if use_cache {
        CacheManifest::load(images_root)
    } else {
        CacheManifest::empty()
    };
    let cache = Mutex::new(previous.clone());
    let stats = Mutex::new(CacheStats::default());
    let staging_dir = images_root.join(STAGING_DIR);
    remove_staging(&staging_dir)?;
    let url_prefix = format!("/{}", input.config.hugo.images_dir.trim_matches('/'));

    let workers: Vec<AlbumWorker<'_, _>> = input
        .albums
        .iter()
        .map(|album| AlbumWorker {
            backend,
            source_root,
            images_root,
            staging_dir: &staging_dir,
            album_dir: images_root.join(&album.slug_path),
            slug_path: &album.slug_path,
            url_base: format!("{}/{}", url_prefix, album.slug_path),
            responsive: ResponsiveConfig::from_config(&album.config.images),
            thumbnail: ThumbnailConfig::from_config(
                &album.config.thumbnails,
                &album.config.images,
            ),
            previous: &previous,
            cache: &cache,
            stats: &stats,
        })
        .collect();

    let mut planned = Vec::with_capacity(input.albums.len());
    for (album, worker) in input.albums.iter().zip(&workers) {
        let images = album
            .images
            .par_iter()
            .map(|image| worker.plan_image(image))
            .collect::<Result<Vec<_>, ProcessError>>()?;
        planned.push(images);
    }

    stage_copies(&planned, images_root)?;

    let mut albums = Vec::with_capacity(input.albums.len());
    for ((album, worker), images) in input.albums.iter().zip(&workers).zip(planned) {
        if let Some(tx) = &events {
            tx.send(ProcessEvent::AlbumStarted {
                title: album.title.clone(),
                image_count: album.images.len(),
            })
            .ok();
        }
        std::fs::create_dir_all(&worker.album_dir)?;

        let images = images
            .into_par_iter()
            .map(|plan| {
                let (processed, variants) = worker.write_image(plan)?;
                if let Some(tx) = &events {
                    tx.send(ProcessEvent::ImageProcessed {
                        index: processed.position,
                        title: processed.title.clone(),
                        source_path: processed.source_path.clone(),
                        variants,
                    })
                    .ok();
                }
                Ok(processed)
            })
            .collect::<Result<Vec<_>, ProcessError>>()?;

        albums.push(finish_album(album, images));
    }

    remove_staging(&staging_dir)?;
    let cache = cache.into_inner().unwrap_or_else(PoisonError::into_inner);
    cache.save(images_root)?;

    Ok(ProcessResult {
        manifest: ProcessedManifest {
            tree: input.tree,
            groups: input.groups,
            albums,
            config: input.config,
        },
        cache_stats: stats.into_inner().unwrap_or_else(PoisonError::into_inner),
    })
}

/// Holds copies of reused outputs while the run overwrites files.
const STAGING_DIR: &str = ".hugallery-staging";

fn remove_staging(staging_dir: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(staging_dir) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Copy every file a copy action reads from into the staging directory.
fn stage_copies(planned: &[Vec<PlannedImage>], images_root: &Path) -> Result<(), ProcessError> {
    let outputs = planned.iter().flatten().flat_map(|image| &image.outputs);
    for output in outputs {
        if let Action::Copy { from, staged } = &output.action
            && !staged.exists()
        {
            if let Some(dir) = staged.parent() {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::copy(images_root.join(from), staged)?;
        }
    }
    Ok(())
}

/// How one output file gets produced, decided before anything is written.
#[derive(Debug, Clone, PartialEq)]
enum Action {
    /// Already on disk at the wanted path.
    Keep,
    /// Written earlier under `from`. `staged` holds a copy taken before the run
    /// started writing.
    Copy { from: String, staged: PathBuf },
    Encode,
}

struct PlannedOutput {
    label: String,
    rel_path: String,
    params_hash: String,
    job: VariantJob,
    action: Action,
}

/// A photo whose metadata is resolved and whose outputs are decided.
struct PlannedImage {
    processed: ProcessedImage,
    source_hash: String,
    outputs: Vec<PlannedOutput>,
}

/// Everything needed to process the photos of one album.
struct AlbumWorker<'a, B: ImageBackend> {
    backend: &'a B,
    source_root: &'a Path,
    images_root: &'a Path,
    staging_dir: &'a Path,
    album_dir: PathBuf,
    slug_path: &'a str,
    url_base: String,
    responsive: ResponsiveConfig,
    thumbnail: ThumbnailConfig,
    /// Cache as loaded. Every lookup goes here.
    previous: &'a CacheManifest,
    /// Cache being written for the next run.
    cache: &'a Mutex<CacheManifest>,
    stats: &'a Mutex<CacheStats>,
}

impl<B: ImageBackend> AlbumWorker<'_, B> {
    /// Read a source photo and decide how each of its outputs is produced.
    fn plan_image(&self, image: &scan::Image) -> Result<PlannedImage, ProcessError> {
        let source = self.source_root.join(&image.source_path);
        if !source.exists() {
            return Err(ProcessError::SourceNotFound(source));
        }

        let dimensions = self.backend.identify(&source)?;
        let embedded = self.backend.read_metadata(&source).unwrap_or_else(|e| {
            tracing::warn!(path = %source.display(), error = %e, "could not read embedded metadata");
            ImageMetadata::default()
        });
        let source_hash = cache::hash_file(&source)?;

        let plans = plan_responsive(
            &source,
            &self.album_dir,
            &image.slug,
            (dimensions.width, dimensions.height),
            &self.responsive,
        );
        let thumb_plan = plan_thumbnail(&source, &self.album_dir, &image.slug, &self.thumbnail);

        let renditions = plans.iter().map(|plan| self.output_file(plan)).collect();
        let thumbnail = self.output_file(&thumb_plan);

        let mut outputs = Vec::with_capacity(plans.len() + 1);
        for plan in plans {
            let label = format!("{}px", plan.target.unwrap_or(plan.width));
            outputs.push(self.plan_output(label, plan, &source_hash));
        }
        outputs.push(self.plan_output("thumbnail".to_string(), thumb_plan, &source_hash));

        let date = embedded
            .exif
            .taken
            .or_else(|| image.modified.map(|m| m.naive_local()));

        let processed = ProcessedImage {
            position: image.position,
            number: image.number,
            source_path: image.source_path.clone(),
            slug: image.slug.clone(),
            title: metadata::resolve(&[embedded.title.as_deref(), image.title.as_deref()]),
            description: metadata::resolve(&[
                image.description.as_deref(),
                embedded.description.as_deref(),
            ]),
            keywords: embedded.keywords,
            date,
            exif: (!embedded.exif.is_empty()).then_some(embedded.exif),
            dimensions,
            renditions,
            thumbnail,
        };
        Ok(PlannedImage {
            processed,
            source_hash,
            outputs,
        })
    }

    fn plan_output(&self, label: String, plan: PlannedVariant, source_hash: &str) -> PlannedOutput {
        let rel_path = format!("{}/{}", self.slug_path, plan.file_name);
        let params_hash = plan.job.params_hash();
        let action = match self
            .previous
            .find_cached(source_hash, &params_hash, self.images_root)
        {
            Some(stored) if stored == rel_path => Action::Keep,
            Some(stored) => Action::Copy {
                staged: self
                    .staging_dir
                    .join(format!("{}-{}", source_hash, params_hash)),
                from: stored,
            },
            None => Action::Encode,
        };
        PlannedOutput {
            label,
            rel_path,
            params_hash,
            job: plan.job,
            action,
        }
    }

    /// Produce the planned outputs of one photo and record them in the cache.
    fn write_image(
        &self,
        planned: PlannedImage,
    ) -> Result<(ProcessedImage, Vec<VariantInfo>), ProcessError> {
        let mut to_encode = Vec::new();
        for output in &planned.outputs {
            match &output.action {
                Action::Keep => {}
                Action::Copy { from, staged } => {
                    tracing::debug!(from = %from, to = %output.rel_path, "copying cached rendition");
                    std::fs::copy(staged, output.job.output())?;
                }
                Action::Encode => {
                    tracing::debug!(output = %output.rel_path, "encoding");
                    to_encode.push(&output.job);
                }
            }
        }
        if !to_encode.is_empty() {
            self.backend.run_batch(&to_encode)?;
        }

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        let mut variants = Vec::with_capacity(planned.outputs.len());
        for output in planned.outputs {
            let status = match output.action {
                Action::Keep => {
                    stats.hit();
                    VariantStatus::Cached
                }
                Action::Copy { .. } => {
                    stats.copy();
                    VariantStatus::Copied
                }
                Action::Encode => {
                    stats.miss();
                    VariantStatus::Encoded
                }
            };
            cache.insert(
                output.rel_path,
                planned.source_hash.clone(),
                output.params_hash,
            );
            variants.push(VariantInfo {
                label: output.label,
                status,
            });
        }
        Ok((planned.processed, variants))
    }

    fn output_file(&self, plan: &PlannedVariant) -> OutputFile {
        OutputFile {
            size: plan.target,
            path: format!("{}/{}", self.slug_path, plan.file_name),
            url: format!("{}/{}", self.url_base, plan.file_name),
            width: plan.width,
            height: plan.height,
        }
    }
}

fn finish_album(album: &scan::Album, images: Vec<ProcessedImage>) -> ProcessedAlbum {
    let cover_thumbnail = images
        .iter()
        .find(|img| img.source_path == album.cover)
        .or_else(|| images.first())
        .map(|img| img.thumbnail.url.clone());

    let mut keywords = Vec::new();
    for image in &images {
        metadata::merge_keywords(&mut keywords, &image.keywords);
    }

    ProcessedAlbum {
        path: album.path.clone(),
        slug_path: album.slug_path.clone(),
        title: album.title.clone(),
        weight: album.weight,
        description: album.description.clone(),
        listed: album.listed,
        cover_thumbnail,
        date: album_date(&images, &album.images),
        keywords,
        images,
    }
}

/// Earliest capture time, else the newest modification time.
fn album_date(processed: &[ProcessedImage], scanned: &[scan::Image]) -> Option<NaiveDateTime> {
    let earliest_taken = processed
        .iter()
        .filter_map(|img| img.exif.as_ref().and_then(|e| e.taken))
        .min();
    earliest_taken.or_else(|| {
        scanned
            .iter()
            .filter_map(|img| img.modified.map(|m| m.naive_local()))
            .max()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    /// Scan `photos` and write the manifest into `temp`.
    fn write_scan_manifest(photos: &Path, temp: &Path) -> PathBuf {
        let manifest = scan::scan(photos).unwrap();
        let path = temp.join("manifest.json");
        fs::write(&path, serde_json::to_string_pretty(&manifest).unwrap()).unwrap();
        path
    }

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    fn run_mock(backend: &MockBackend, photos: &Path, work: &Path) -> ProcessResult {
        let manifest_path = write_scan_manifest(photos, work);
        process_with_backend(
            backend,
            &manifest_path,
            photos,
            &work.join("static/galleries"),
            true,
            None,
        )
        .unwrap()
    }

    #[test]
    fn images_root_lives_under_static() {
        let config = SiteConfig::default();
        assert_eq!(
            images_root(Path::new("/site"), &config),
            PathBuf::from("/site/static/galleries")
        );
    }

    #[test]
    fn processes_every_album_in_order() {
        let photos = setup_fixtures();
        let work = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(vec![dims(2000, 1500); 6]);

        let result = run_mock(&backend, photos.path(), work.path());
        let titles: Vec<&str> = result
            .manifest
            .albums
            .iter()
            .map(|a| a.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Landscapes", "Japan", "Italy", "wip drafts"]);
        assert_eq!(result.manifest.groups.len(), 1);
        assert_eq!(result.manifest.tree.len(), 3);
    }

    #[test]
    fn renditions_follow_album_config() {
        let photos = setup_fixtures();
        let work = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(vec![dims(2000, 1500); 6]);
        let result = run_mock(&backend, photos.path(), work.path());

        let japan = &result.manifest.albums[1];
        let tokyo = &japan.images[0];
        let urls: Vec<&str> = tokyo.renditions.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "/galleries/travel/japan/001-tokyo-800.avif",
                "/galleries/travel/japan/001-tokyo-1600.avif",
            ]
        );
        assert_eq!(
            tokyo.thumbnail.url,
            "/galleries/travel/japan/001-tokyo-thumb.avif"
        );
        // Travel sets a 4:5 thumbnail aspect
        assert_eq!((tokyo.thumbnail.width, tokyo.thumbnail.height), (300, 375));
        assert_eq!(tokyo.largest().map(|r| r.width), Some(1600));

        let landscapes = &result.manifest.albums[0];
        assert_eq!(
            landscapes.images[0].thumbnail.path,
            "landscapes/001-dawn-thumb.jpg"
        );
        assert_eq!(
            landscapes.cover_thumbnail.as_deref(),
            Some("/galleries/landscapes/001-dawn-thumb.jpg")
        );
    }

    #[test]
    fn backend_receives_album_quality_and_format() {
        let photos = TempDir::new().unwrap();
        write_photo(photos.path(), "010-Japan/001-tokyo.jpg");
        fs::write(
            photos.path().join("010-Japan/hugallery.toml"),
            "[images]\nsizes = [1000]\nquality = 70\nformat = \"avif\"\n",
        )
        .unwrap();
        let work = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(vec![dims(3000, 2000)]);
        run_mock(&backend, photos.path(), work.path());

        let ops = backend.get_operations();
        assert!(ops.iter().any(|op| matches!(
            op,
            RecordedOp::Resize { width: 1000, height: 667, quality: 70, format: crate::config::OutputFormat::Avif, .. }
        )));
        assert!(ops.iter().any(|op| matches!(
            op,
            RecordedOp::Thumbnail { crop_width: 300, crop_height: 300, quality: 70, sharpening: Some(_), .. }
        )));
    }

    #[test]
    fn metadata_resolution_order() {
        let photos = TempDir::new().unwrap();
        write_photo(photos.path(), "010-Test/001-Filename-Title.jpg");
        fs::write(photos.path().join("010-Test/001-Filename-Title.txt"), "Sidecar").unwrap();
        let work = TempDir::new().unwrap();

        let backend = MockBackend::with_metadata(
            vec![dims(1000, 800)],
            vec![ImageMetadata {
                title: Some("IPTC Title".to_string()),
                description: Some("IPTC Caption".to_string()),
                keywords: vec!["harbour".to_string()],
                exif: Exif::default(),
            }],
        );
        let result = run_mock(&backend, photos.path(), work.path());

        let image = &result.manifest.albums[0].images[0];
        assert_eq!(image.title.as_deref(), Some("IPTC Title"));
        assert_eq!(image.description.as_deref(), Some("Sidecar"));
        assert_eq!(image.keywords, vec!["harbour"]);
        assert!(image.exif.is_none());
    }

    #[test]
    fn filename_title_and_iptc_caption_as_fallbacks() {
        let photos = TempDir::new().unwrap();
        write_photo(photos.path(), "010-Test/001-Old-Harbour.jpg");
        let work = TempDir::new().unwrap();

        let backend = MockBackend::with_metadata(
            vec![dims(1000, 800)],
            vec![ImageMetadata {
                description: Some("Boats at dusk".to_string()),
                ..ImageMetadata::default()
            }],
        );
        let result = run_mock(&backend, photos.path(), work.path());

        let image = &result.manifest.albums[0].images[0];
        assert_eq!(image.title.as_deref(), Some("Old Harbour"));
        assert_eq!(image.description.as_deref(), Some("Boats at dusk"));
    }

    #[test]
    fn album_date_and_keywords_aggregate() {
        let taken = |d: u32| NaiveDate::from_ymd_opt(2024, 5, d).and_then(|d| d.and_hms_opt(9, 0, 0));
        let exif_taken = |d: u32| Exif {
            taken: taken(d),
            ..Exif::default()
        };

        let images = vec![
            ProcessedImage {
                exif: Some(exif_taken(3)),
                keywords: vec!["sea".into(), "boats".into()],
                ..sample_image(1)
            },
            ProcessedImage {
                exif: Some(exif_taken(1)),
                keywords: vec!["Boats".into(), "dusk".into()],
                ..sample_image(2)
            },
        ];
        let album = scan::Album {
            path: "010-Test".into(),
            slug_path: "test".into(),
            title: "Test".into(),
            weight: Some(10),
            description: None,
            cover: "010-Test/002-b.jpg".into(),
            images: vec![],
            listed: true,
            config: SiteConfig::default(),
        };

        let processed = finish_album(&album, images);
        assert_eq!(processed.date, taken(1));
        assert_eq!(processed.keywords, vec!["sea", "boats", "dusk"]);
        assert_eq!(
            processed.cover_thumbnail.as_deref(),
            Some("/galleries/test/002-thumb.jpg")
        );
    }

    #[test]
    fn album_date_falls_back_to_newest_mtime() {
        let photos = setup_fixtures();
        let work = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(vec![dims(1000, 800); 6]);
        let result = run_mock(&backend, photos.path(), work.path());

        let landscapes = &result.manifest.albums[0];
        let newest = landscapes.images.iter().filter_map(|i| i.date).max();
        assert!(landscapes.date.is_some());
        assert_eq!(landscapes.date, newest);
    }

    fn sample_image(position: usize) -> ProcessedImage {
        let file = |suffix: &str| OutputFile {
            size: None,
            path: format!("test/{:03}-{}.jpg", position, suffix),
            url: format!("/galleries/test/{:03}-{}.jpg", position, suffix),
            width: 300,
            height: 300,
        };
        ProcessedImage {
            position,
            number: Some(position as u32),
            source_path: format!("010-Test/{:03}-{}.jpg", position, ["a", "b"][position - 1]),
            slug: format!("{:03}", position),
            title: None,
            description: None,
            keywords: vec![],
            date: None,
            exif: None,
            dimensions: dims(1000, 800),
            renditions: vec![file("800")],
            thumbnail: file("thumb"),
        }
    }

    #[test]
    fn missing_source_is_error() {
        let photos = TempDir::new().unwrap();
        write_photo(photos.path(), "010-Test/001-a.jpg");
        let work = TempDir::new().unwrap();
        let manifest_path = write_scan_manifest(photos.path(), work.path());
        fs::remove_file(photos.path().join("010-Test/001-a.jpg")).unwrap();

        let backend = MockBackend::with_dimensions(vec![dims(100, 100)]);
        let result = process_with_backend(
            &backend,
            &manifest_path,
            photos.path(),
            &work.path().join("images"),
            true,
            None,
        );
        assert!(matches!(result, Err(ProcessError::SourceNotFound(_))));
    }

    #[test]
    fn identify_failure_is_error() {
        let photos = TempDir::new().unwrap();
        write_photo(photos.path(), "010-Test/001-a.jpg");
        let work = TempDir::new().unwrap();
        let manifest_path = write_scan_manifest(photos.path(), work.path());

        let backend = MockBackend::new();
        let result = process_with_backend(
            &backend,
            &manifest_path,
            photos.path(),
            &work.path().join("images"),
            true,
            None,
        );
        assert!(matches!(result, Err(ProcessError::Imaging(_))));
    }

    #[test]
    fn events_report_albums_and_images() {
        let photos = TempDir::new().unwrap();
        write_photo(photos.path(), "010-Test/001-a.jpg");
        write_photo(photos.path(), "010-Test/002-b.jpg");
        let work = TempDir::new().unwrap();
        let manifest_path = write_scan_manifest(photos.path(), work.path());
        let backend = MockBackend::with_dimensions(vec![dims(1000, 800); 2]);

        let (tx, rx) = std::sync::mpsc::channel();
        process_with_backend(
            &backend,
            &manifest_path,
            photos.path(),
            &work.path().join("images"),
            true,
            Some(tx),
        )
        .unwrap();

        let events: Vec<ProcessEvent> = rx.iter().collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[0],
            ProcessEvent::AlbumStarted { title, image_count: 2 } if title == "Test"
        ));
        for event in &events[1..] {
            let ProcessEvent::ImageProcessed { variants, .. } = event else {
                panic!("expected image event, got {event:?}");
            };
            let labels: Vec<&str> = variants.iter().map(|v| v.label.as_str()).collect();
            assert_eq!(labels, vec!["800px", "thumbnail"]);
            assert!(variants.iter().all(|v| v.status == VariantStatus::Encoded));
        }
    }

    #[test]
    fn cache_skips_encoding_on_second_run() {
        let photos = TempDir::new().unwrap();
        write_jpeg(&photos.path().join("010-Test/001-a.jpg"), 64, 48);
        let work = TempDir::new().unwrap();
        let manifest_path = write_scan_manifest(photos.path(), work.path());
        let images = work.path().join("images");

        let first = process(&manifest_path, photos.path(), &images, true, None).unwrap();
        assert_eq!(first.cache_stats.misses, 2);
        assert!(cache::manifest_path(&images).exists());

        let second = process(&manifest_path, photos.path(), &images, true, None).unwrap();
        assert_eq!(second.cache_stats.hits, 2);
        assert_eq!(second.cache_stats.misses, 0);

        let forced = process(&manifest_path, photos.path(), &images, false, None).unwrap();
        assert_eq!(forced.cache_stats.misses, 2);
    }

    #[test]
    fn renamed_album_copies_from_cache() {
        let photos = TempDir::new().unwrap();
        write_jpeg(&photos.path().join("010-Old/001-a.jpg"), 64, 48);
        let work = TempDir::new().unwrap();
        let images = work.path().join("images");

        let manifest_path = write_scan_manifest(photos.path(), work.path());
        process(&manifest_path, photos.path(), &images, true, None).unwrap();

        fs::rename(photos.path().join("010-Old"), photos.path().join("010-New")).unwrap();
        let manifest_path = write_scan_manifest(photos.path(), work.path());
        let result = process(&manifest_path, photos.path(), &images, true, None).unwrap();

        assert_eq!(result.cache_stats.copies, 2);
        assert!(images.join("new/001-a-64.jpg").exists());
        assert!(images.join("new/001-a-thumb.jpg").exists());
    }

    #[test]
    fn swapped_sources_keep_their_own_pixels() {
        let photos = TempDir::new().unwrap();
        let a = photos.path().join("010-T/001-a.jpg");
        let b = photos.path().join("010-T/002-b.jpg");
        write_solid_jpeg(&a, 64, 48, [255, 0, 0]);
        write_solid_jpeg(&b, 64, 48, [0, 0, 255]);
        let work = TempDir::new().unwrap();
        let images = work.path().join("images");

        let manifest_path = write_scan_manifest(photos.path(), work.path());
        process(&manifest_path, photos.path(), &images, true, None).unwrap();
        assert!(center_red(&images.join("t/001-a-thumb.jpg")) > 200);

        let red = fs::read(&a).unwrap();
        let blue = fs::read(&b).unwrap();
        fs::write(&a, blue).unwrap();
        fs::write(&b, red).unwrap();
        let manifest_path = write_scan_manifest(photos.path(), work.path());
        let result = process(&manifest_path, photos.path(), &images, true, None).unwrap();

        assert_eq!(result.cache_stats.copies, 4);
        for file in ["t/001-a-64.jpg", "t/001-a-thumb.jpg"] {
            assert!(center_red(&images.join(file)) < 50, "{file} should be blue");
        }
        for file in ["t/002-b-64.jpg", "t/002-b-thumb.jpg"] {
            assert!(center_red(&images.join(file)) > 200, "{file} should be red");
        }
        assert!(!images.join(STAGING_DIR).exists());

        // The rewritten cache points each colour at its new path
        let third = process(&manifest_path, photos.path(), &images, true, None).unwrap();
        assert_eq!(third.cache_stats.hits, 4);
    }

    #[test]
    fn processed_manifest_roundtrips_through_json() {
        let photos = setup_fixtures();
        let work = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(vec![dims(2000, 1500); 6]);
        let result = run_mock(&backend, photos.path(), work.path());

        let json = serde_json::to_string(&result.manifest).unwrap();
        let back: ProcessedManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.albums.len(), 4);
        assert_eq!(back.albums[1].images[0].renditions.len(), 2);
    }
}
