//! Image processing cache for incremental builds.
//!
//! Encoding is the slow part of a build, AVIF especially. This module lets
//! the process stage skip encoding when neither the source photo nor the
//! encoding parameters changed since the last run.
//!
//! # Design
//!
//! Only encoding is cached. Dimension reads and IPTC/EXIF extraction always
//! run, so editing a caption in Lightroom shows up on the next build without
//! busting anything.
//!
//! ## Cache keys
//!
//! Lookups are **content-addressed** by `source_hash` + `params_hash`, not
//! by output path, so renaming an album or renumbering photos never forces
//! a re-encode.
//!
//! - **`source_hash`**: SHA-256 of the source file. Content-based, so it
//!   survives `git checkout` resetting modification times.
//! - **`params_hash`**: SHA-256 of the encoding parameters: rendition size,
//!   quality and format, or for thumbnails crop size, quality, sharpening
//!   and format.
//!
//! A hit requires a matching entry *and* the previously written file on
//! disk. When the stored path differs from the wanted one the file is copied
//! instead of re-encoded. The process stage looks things up in the manifest
//! as loaded and records into a separate copy, so outputs rewritten during a
//! run never answer a lookup in the same run.
//!
//! ## Storage
//!
//! `<images_root>/.hugallery-cache.json`, next to the renditions it
//! describes. Paths inside are relative to the images root.

use crate::config::OutputFormat;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

const MANIFEST_FILENAME: &str = ".hugallery-cache.json";

/// Bump to invalidate every existing cache when the key computation changes.
const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub params_hash: String,
}

/// On-disk cache manifest mapping output paths to their cache entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
    /// `"{source_hash}:{params_hash}"` → output path. Rebuilt on load.
    #[serde(skip)]
    content_index: HashMap<String, String>,
}

impl CacheManifest {
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
            content_index: HashMap::new(),
        }
    }

    /// Load from the images root. Missing, corrupt or outdated manifests
    /// load as empty.
    pub fn load(images_root: &Path) -> Self {
        let path = manifest_path(images_root);
        let Ok(content) = std::fs::read_to_string(&path) else {
            return Self::empty();
        };
        let mut manifest: Self = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable cache manifest");
                return Self::empty();
            }
        };
        if manifest.version != MANIFEST_VERSION {
            tracing::debug!(found = manifest.version, "cache manifest version changed, starting fresh");
            return Self::empty();
        }
        manifest.content_index = build_content_index(&manifest.entries);
        manifest
    }

    pub fn save(&self, images_root: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(images_root), json)
    }

    /// Find a previously written file with the same content hashes.
    ///
    /// Returns the stored path (relative to `images_root`) only if the file
    /// still exists. It may differ from the path the caller wants now.
    pub fn find_cached(
        &self,
        source_hash: &str,
        params_hash: &str,
        images_root: &Path,
    ) -> Option<String> {
        let stored_path = self.content_index.get(&content_key(source_hash, params_hash))?;
        images_root
            .join(stored_path)
            .exists()
            .then(|| stored_path.clone())
    }

    /// Record an output file. An older entry for the same content under a
    /// different path is dropped, and so is the index entry for whatever
    /// content `output_path` held before.
    pub fn insert(&mut self, output_path: String, source_hash: String, params_hash: String) {
        let key = content_key(&source_hash, &params_hash);
        if let Some(replaced) = self.entries.get(&output_path) {
            let replaced_key = content_key(&replaced.source_hash, &replaced.params_hash);
            if self.content_index.get(&replaced_key) == Some(&output_path) {
                self.content_index.remove(&replaced_key);
            }
        }
        if let Some(old_path) = self.content_index.get(&key)
            && *old_path != output_path
        {
            self.entries.remove(old_path.as_str());
        }

        self.content_index.insert(key, output_path.clone());
        self.entries.insert(
            output_path,
            CacheEntry {
                source_hash,
                params_hash,
            },
        );
    }
}

fn content_key(source_hash: &str, params_hash: &str) -> String {
    format!("{}:{}", source_hash, params_hash)
}

fn build_content_index(entries: &HashMap<String, CacheEntry>) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(output_path, entry)| {
            (
                content_key(&entry.source_hash, &entry.params_hash),
                output_path.clone(),
            )
        })
        .collect()
}

/// SHA-256 of a file's contents as hex.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

pub fn hash_responsive_params(target: u32, quality: u32, format: OutputFormat) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"responsive\0");
    hasher.update(target.to_le_bytes());
    hasher.update(quality.to_le_bytes());
    hasher.update(format.extension().as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn hash_thumbnail_params(
    crop: (u32, u32),
    quality: u32,
    sharpening: Option<(f32, i32)>,
    format: OutputFormat,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"thumbnail\0");
    hasher.update(crop.0.to_le_bytes());
    hasher.update(crop.1.to_le_bytes());
    hasher.update(quality.to_le_bytes());
    match sharpening {
        Some((sigma, threshold)) => {
            hasher.update(b"\x01");
            hasher.update(sigma.to_le_bytes());
            hasher.update(threshold.to_le_bytes());
        }
        None => hasher.update(b"\x00"),
    }
    hasher.update(format.extension().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Cache performance for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub copies: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn copy(&mut self) {
        self.copies += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.copies + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits == 0 && self.copies == 0 {
            return write!(f, "{} encoded", self.misses);
        }
        write!(
            f,
            "{} cached, {} copied, {} encoded ({} total)",
            self.hits,
            self.copies,
            self.misses,
            self.total()
        )
    }
}

pub fn manifest_path(images_root: &Path) -> PathBuf {
    images_root.join(MANIFEST_FILENAME)
}
