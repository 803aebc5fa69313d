//! Gallery configuration.
//!
//! Configuration lives in `hugallery.toml` files. Stock defaults are
//! overridden by a file in the photo root, which is overridden by files in
//! group and album directories further down the tree:
//!
//! ```text
//! photos/
//! ├── hugallery.toml              # root (overrides stock defaults)
//! └── 020-Travel/
//!     ├── hugallery.toml          # group (overrides root)
//!     └── 010-Japan/
//!         └── hugallery.toml      # album (overrides group)
//! ```
//!
//! Files are sparse, so each level only names the keys it changes:
//!
//! ```toml
//! [thumbnails]
//! aspect_ratio = [4, 5]
//! ```
//!
//! Unknown keys are rejected to catch typos early. The `[hugo]` section only
//! has an effect in the root file since it shapes the whole site layout.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in every directory.
pub const CONFIG_FILENAME: &str = "hugallery.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Fully resolved configuration for one directory level.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Where generated content and images land inside the Hugo site.
    pub hugo: HugoConfig,
    /// Responsive rendition settings.
    pub images: ImagesConfig,
    /// Thumbnail crop settings.
    pub thumbnails: ThumbnailsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Validation(msg.to_string()));

        if !(1..=100).contains(&self.images.quality) {
            return invalid("images.quality must be 1-100");
        }
        if self.images.sizes.is_empty() {
            return invalid("images.sizes must not be empty");
        }
        if self.images.sizes.contains(&0) {
            return invalid("images.sizes must be non-zero");
        }
        if self.thumbnails.aspect_ratio.contains(&0) {
            return invalid("thumbnails.aspect_ratio values must be non-zero");
        }
        if self.thumbnails.size == 0 {
            return invalid("thumbnails.size must be non-zero");
        }
        if self.hugo.section.trim_matches('/').is_empty() {
            return invalid("hugo.section must not be empty");
        }
        if self.hugo.images_dir.trim_matches('/').is_empty() {
            return invalid("hugo.images_dir must not be empty");
        }
        if self.hugo.body == BodyMode::Shortcode && self.hugo.shortcode.trim().is_empty() {
            return invalid("hugo.shortcode must be set when hugo.body = \"shortcode\"");
        }
        Ok(())
    }
}

/// How the body of a generated album page is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyMode {
    /// Description followed by a `{{< shortcode >}}` call.
    #[default]
    Shortcode,
    /// Description followed by plain HTML `<figure>` blocks.
    Figures,
    /// Description only; the theme renders `.Params.photos` itself.
    None,
}

/// Hugo site layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HugoConfig {
    /// Content section the galleries are written to (`content/<section>/`).
    pub section: String,
    /// Title of the section's `_index.md`.
    pub section_title: String,
    /// Directory under `static/` that receives renditions and thumbnails.
    pub images_dir: String,
    /// Album page body style.
    pub body: BodyMode,
    /// Shortcode name used when `body = "shortcode"`.
    pub shortcode: String,
}

impl Default for HugoConfig {
    fn default() -> Self {
        Self {
            section: "gallery".to_string(),
            section_title: "Gallery".to_string(),
            images_dir: "galleries".to_string(),
            body: BodyMode::Shortcode,
            shortcode: "gallery".to_string(),
        }
    }
}

/// Encoded rendition format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Avif,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Avif => "avif",
        }
    }
}

/// Responsive rendition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Target sizes in pixels on the longer edge. Never upscaled.
    pub sizes: Vec<u32>,
    /// Encoding quality, 1 (worst) to 100 (best).
    pub quality: u32,
    /// Output format for renditions and thumbnails.
    pub format: OutputFormat,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            sizes: vec![800, 1600],
            quality: 85,
            format: OutputFormat::Jpeg,
        }
    }
}

/// Thumbnail crop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Aspect ratio as `[width, height]`.
    pub aspect_ratio: [u32; 2],
    /// Size of the short edge in pixels.
    pub size: u32,
    /// Apply a light unsharp mask after downscaling.
    pub sharpen: bool,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: [1, 1],
            size: 300,
            sharpen: true,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum parallel workers. Absent means one per CPU core.
    pub max_processes: Option<usize>,
}

/// Resolve the worker count: `min(max_processes, cores)`, or all cores.
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.clamp(1, cores)).unwrap_or(cores)
}

// =============================================================================
// Loading and merging
// =============================================================================

/// Stock defaults as a TOML table, the base layer for every merge.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key by key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read `hugallery.toml` from a directory as a raw TOML value, if present.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    Ok(Some(toml::from_str(&content)?))
}

/// Apply an optional overlay, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config for a single directory on top of stock defaults.
pub fn load_config(dir: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// A fully commented `hugallery.toml` with every key at its default.
///
/// Printed by `hugallery gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# hugallery configuration
# =======================
# Every setting is optional; the values below are the defaults.
#
# A hugallery.toml can sit at any level of the photo directory:
#   photos/hugallery.toml                    -> root
#   photos/020-Travel/hugallery.toml         -> group (overrides root)
#   photos/020-Travel/010-Japan/hugallery.toml -> album (overrides group)
#
# Each level only needs the keys it changes. Unknown keys are an error.

# ---------------------------------------------------------------------------
# Hugo site layout (root file only)
# ---------------------------------------------------------------------------
[hugo]
# Content section for gallery pages: content/<section>/
section = "gallery"

# Title written to content/<section>/_index.md
section_title = "Gallery"

# Renditions and thumbnails go to static/<images_dir>/
images_dir = "galleries"

# Album page body: "shortcode", "figures" (raw HTML) or "none".
# "figures" needs markup.goldmark.renderer.unsafe = true in the Hugo config.
body = "shortcode"

# Shortcode called when body = "shortcode": {{< gallery >}}
shortcode = "gallery"

# ---------------------------------------------------------------------------
# Responsive renditions
# ---------------------------------------------------------------------------
[images]
# Sizes in pixels on the longer edge. Photos are never upscaled.
sizes = [800, 1600]

# Encoding quality (1 = worst, 100 = best).
quality = 85

# "jpeg" or "avif".
format = "jpeg"

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Crop aspect ratio as [width, height]: [1, 1] square, [4, 5] portrait, [3, 2] landscape.
aspect_ratio = [1, 1]

# Short edge in pixels.
size = 300

# Light unsharp mask after downscaling.
sharpen = true

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers. Omit to use one per CPU core.
# max_processes = 4
"##
}
