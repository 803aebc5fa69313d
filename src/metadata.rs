//! Photo and album metadata resolution.
//!
//! Every photo can carry a title and a description from two places:
//!
//! - **The filesystem**, read during scan: the title comes from the filename
//!   (`001-Old-Harbour.jpg` → "Old Harbour") and the description from a
//!   sidecar text file with the same stem (`001-Old-Harbour.txt`).
//! - **Embedded IPTC fields**, read during process: Object Name (`2:05`) and
//!   Caption-Abstract (`2:120`), the "Title" and "Caption" fields of
//!   Lightroom and most DAM tools.
//!
//! Each field resolves independently, first non-empty value wins:
//!
//! - **Title**: IPTC title → filename title
//! - **Description**: sidecar `.txt` → IPTC caption
//!
//! Albums and groups take their description from `description.md`, falling
//! back to `description.txt`.

use pulldown_cmark::{Event, Parser, TagEnd};
use std::path::Path;

/// Markdown album description file. Wins over [`DESCRIPTION_TXT`].
pub const DESCRIPTION_MD: &str = "description.md";
/// Plain text album description file.
pub const DESCRIPTION_TXT: &str = "description.txt";

const MAX_SLUG_LEN: usize = 80;

/// Return the first non-empty value, trimmed.
///
/// ```text
/// title:       resolve(&[iptc_title,   filename_title])
/// description: resolve(&[sidecar_text, iptc_caption])
/// ```
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(String::from)
}

/// Read the `.txt` sidecar next to a photo. `None` if missing or blank.
pub fn read_sidecar(image_path: &Path) -> Option<String> {
    read_trimmed(&image_path.with_extension("txt"))
}

/// Read an album or group description from `description.md` or `description.txt`.
pub fn read_album_description(dir: &Path) -> Option<String> {
    read_trimmed(&dir.join(DESCRIPTION_MD)).or_else(|| read_trimmed(&dir.join(DESCRIPTION_TXT)))
}

fn read_trimmed(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Turn a title into a lowercase URL slug.
///
/// Non-alphanumeric ASCII runs collapse into a single dash, leading and
/// trailing dashes are stripped, and anything longer than 80 characters is
/// cut at the last dash before the limit.
pub fn sanitize_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let trimmed = slug.trim_matches('-');

    if trimmed.len() <= MAX_SLUG_LEN {
        return trimmed.to_string();
    }
    let truncated = &trimmed[..MAX_SLUG_LEN];
    match truncated.rfind('-') {
        Some(pos) => truncated[..pos].to_string(),
        None => truncated.to_string(),
    }
}

/// Flatten markdown into a single line of plain text.
///
/// Hugo uses the front matter `description` for `<meta>` tags and list
/// summaries, where markup would show up verbatim.
pub fn plain_text(markdown: &str) -> String {
    let mut text = String::with_capacity(markdown.len());
    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak
            | Event::HardBreak
            | Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item) => {
                text.push(' ')
            }
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Append keywords not seen yet, preserving first-seen order.
pub fn merge_keywords(into: &mut Vec<String>, keywords: &[String]) {
    for keyword in keywords {
        if !into.iter().any(|k| k.eq_ignore_ascii_case(keyword)) {
            into.push(keyword.clone());
        }
    }
}
