//! Hugo content model.
//!
//! Galleries become page bundles with TOML front matter between `+++`
//! fences. The front matter carries everything a theme needs to render the
//! gallery itself, so hugallery ships no layouts:
//!
//! ```toml
//! +++
//! title = "Japan"
//! date = "2024-05-01T18:30:00"
//! weight = 10
//! generator = "hugallery"
//! cover = "/galleries/travel/japan/001-tokyo-thumb.jpg"
//! tags = ["city"]
//!
//! [[photos]]
//! src = "/galleries/travel/japan/001-tokyo-1600.jpg"
//! thumb = "/galleries/travel/japan/001-tokyo-thumb.jpg"
//! width = 1600
//! height = 1067
//! title = "Tokyo"
//!
//! [photos.exif]
//! camera = "FUJIFILM X-T4"
//!
//! [[photos.srcset]]
//! src = "/galleries/travel/japan/001-tokyo-800.jpg"
//! width = 800
//! height = 533
//! +++
//! ```
//!
//! `generator = "hugallery"` marks files this tool owns. Files without it
//! are never overwritten unless forced.
//!
//! The body depends on `[hugo] body`:
//! - `shortcode`: description, then `{{< gallery >}}` for the theme's shortcode
//! - `figures`: description, then one `<figure>` per photo (needs
//!   `markup.goldmark.renderer.unsafe = true` in the Hugo config)
//! - `none`: description only

use crate::config::BodyMode;
use crate::imaging::Exif;
use chrono::NaiveDateTime;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

/// Value of the `generator` key in every file hugallery writes.
pub const GENERATOR: &str = "hugallery";

const FENCE: &str = "+++";

/// Hugo build options. Only used to keep unlisted pages out of lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildOptions {
    pub list: String,
}

impl BuildOptions {
    /// `_build = { list = "never" }`: rendered, but absent from section lists.
    pub fn unlisted() -> Self {
        Self {
            list: "never".to_string(),
        }
    }
}

/// Front matter of a branch bundle (`_index.md`): the gallery section
/// itself and every group.
///
/// Field order matters: TOML needs plain values before tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupFrontMatter {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    pub generator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(rename = "_build", default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildOptions>,
}

/// Front matter of a leaf bundle (`index.md`): one album.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumFrontMatter {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    pub generator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(rename = "_build", default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildOptions>,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

/// One `[[photos]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    /// Largest rendition.
    pub src: String,
    pub thumb: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exif: Option<Exif>,
    /// Every rendition, smallest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub srcset: Vec<SrcsetEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrcsetEntry {
    pub src: String,
    pub width: u32,
    pub height: u32,
}

/// Serialize front matter and body into a complete content file.
///
/// Strings are folded onto one line first. A multi-line TOML string could
/// hold a line reading `+++` and close the front matter early.
pub fn render_page<T: Serialize>(front_matter: &T, body: &str) -> Result<String, toml::ser::Error> {
    let mut value = toml::Value::try_from(front_matter)?;
    fold_line_breaks(&mut value);
    let toml = toml::to_string(&value)?;
    let mut page = format!("{FENCE}\n{toml}");
    if !toml.ends_with('\n') {
        page.push('\n');
    }
    page.push_str(FENCE);
    page.push('\n');
    if !body.is_empty() {
        page.push('\n');
        page.push_str(body.trim_end());
        page.push('\n');
    }
    Ok(page)
}

fn fold_line_breaks(value: &mut toml::Value) {
    match value {
        toml::Value::String(s) if s.contains(['\n', '\r']) => {
            *s = s
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
        }
        toml::Value::Array(items) => items.iter_mut().for_each(fold_line_breaks),
        toml::Value::Table(table) => table.iter_mut().for_each(|(_, v)| fold_line_breaks(v)),
        _ => {}
    }
}

/// Split a content file into its TOML front matter and body.
///
/// `None` when the file does not open with a `+++` fence.
pub fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix(FENCE)?;
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// True if the file carries hugallery's generator marker.
pub fn is_generated(text: &str) -> bool {
    split_front_matter(text)
        .and_then(|(front, _)| front.parse::<toml::Table>().ok())
        .and_then(|table| {
            table
                .get("generator")
                .and_then(|v| v.as_str())
                .map(|g| g == GENERATOR)
        })
        .unwrap_or(false)
}

/// Body of an album page.
///
/// `description` is the album's markdown description, passed through
/// unchanged so Hugo renders it.
pub fn album_body(
    mode: BodyMode,
    shortcode: &str,
    description: Option<&str>,
    album_title: &str,
    photos: &[Photo],
) -> String {
    let mut parts: Vec<String> = description.map(|d| d.trim().to_string()).into_iter().collect();
    match mode {
        BodyMode::Shortcode => parts.push(format!("{{{{< {} >}}}}", shortcode)),
        BodyMode::Figures => parts.push(render_figures(album_title, photos).into_string()),
        BodyMode::None => {}
    }
    parts.join("\n\n")
}

/// Body of a section or group page.
pub fn group_body(description: Option<&str>) -> String {
    description.map(|d| d.trim().to_string()).unwrap_or_default()
}

/// One linked thumbnail per photo, with the title and description as caption.
fn render_figures(album_title: &str, photos: &[Photo]) -> Markup {
    html! {
        @for (idx, photo) in photos.iter().enumerate() {
            @let alt = photo.title.clone().unwrap_or_else(|| format!("{} - {}", album_title, idx + 1));
            figure.hugallery-photo {
                a href=(photo.src) {
                    img src=(photo.thumb) alt=(alt) loading="lazy";
                }
                @if photo.title.is_some() || photo.description.is_some() {
                    figcaption {
                        @if let Some(title) = &photo.title {
                            strong { (title) }
                        }
                        @if let Some(description) = &photo.description {
                            " " (description)
                        }
                    }
                }
            }
        }
    }
}
