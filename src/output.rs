//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! The primary display for every entity (group, album, photo) is its
//! positional index and title. Filesystem paths follow as indented `Source:`
//! lines, so the output reads as a content inventory while still pointing
//! back at the files.
//!
//! Shared helpers ([`entity_header`], [`image_line`]) keep scan and process
//! output consistent for the same entities.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Albums
//! 001 Landscapes (2 photos)
//!     Source: 010-Landscapes/
//!     Quiet places, early light.
//!     001 dawn
//!         Source: 001-dawn.jpg
//!         Description: 001-dawn.txt
//!     002 mountains
//!         Source: 010-mountains.jpg
//! 002 Travel
//!     Source: 020-Travel/
//!     001 Japan (2 photos)
//!     ...
//! 003 wip drafts (1 photos, unlisted)
//!     Source: wip-drafts/
//!
//! Config
//!     hugallery.toml
//! ```
//!
//! ## Process
//!
//! ```text
//! Landscapes (2 photos)
//!     001 dawn
//!         Source: 010-Landscapes/001-dawn.jpg
//!         800px: cached
//!         1600px: encoded
//!         thumbnail: cached
//! ```
//!
//! ## Generate
//!
//! ```text
//! Pages
//!     content/gallery/_index.md
//!     content/gallery/landscapes/index.md
//!     content/gallery/travel/japan/index.md (unchanged)
//!
//! Wrote 2 pages, 1 unchanged
//! ```
//!
//! Each stage has a `format_*` function returning lines and a `print_*`
//! wrapper that writes them to stdout.

use crate::cache::CacheStats;
use crate::config::CONFIG_FILENAME;
use crate::generate::GenerateSummary;
use crate::metadata;
use crate::process::{ProcessEvent, ProcessedManifest, VariantStatus};
use crate::scan::{Album, Manifest};
use crate::types::GalleryNode;
use std::path::Path;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Positional index + title, with optional detail.
///
/// ```text
/// 001 Landscapes (5 photos)
/// 002 Travel
/// ```
fn entity_header(index: usize, title: &str, detail: Option<&str>) -> String {
    match detail {
        Some(d) => format!("{} {} ({})", format_index(index), title, d),
        None => format!("{} {}", format_index(index), title),
    }
}

/// Titled photos show their title, untitled ones the filename in parens.
///
/// ```text
/// 001 Old Harbour
/// 002 (002.jpg)
/// ```
fn image_line(index: usize, title: Option<&str>, filename: &str) -> String {
    match title {
        Some(t) if !t.is_empty() => format!("{} {}", format_index(index), t),
        _ => format!("{} ({})", format_index(index), filename),
    }
}

/// Truncate to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn album_detail(album: &Album) -> String {
    let count = format!("{} photos", album.images.len());
    if album.listed {
        count
    } else {
        format!("{}, unlisted", count)
    }
}

// ============================================================================
// Stage 1: Scan output
// ============================================================================

/// Format scan stage output showing the discovered gallery tree.
pub fn format_scan_output(manifest: &Manifest, source_root: &Path) -> Vec<String> {
    let mut lines = vec!["Albums".to_string()];
    for (i, node) in manifest.tree.iter().enumerate() {
        format_scan_node(manifest, node, i + 1, 0, &mut lines);
    }

    lines.push(String::new());
    lines.push("Config".to_string());
    if source_root.join(CONFIG_FILENAME).exists() {
        lines.push(format!("    {}", CONFIG_FILENAME));
    } else {
        lines.push("    (stock defaults)".to_string());
    }
    lines
}

fn format_scan_node(
    manifest: &Manifest,
    node: &GalleryNode,
    position: usize,
    depth: usize,
    lines: &mut Vec<String>,
) {
    let base_indent = indent(depth);

    if node.is_group() {
        let listed = manifest
            .groups
            .iter()
            .find(|g| g.slug_path == node.slug_path)
            .is_none_or(|g| g.listed);
        let header = entity_header(position, &node.title, (!listed).then_some("unlisted"));
        lines.push(format!("{}{}", base_indent, header));
        lines.push(format!("{}    Source: {}/", base_indent, node.source_dir));
        for (i, child) in node.children.iter().enumerate() {
            format_scan_node(manifest, child, i + 1, depth + 1, lines);
        }
        return;
    }

    let Some(album) = manifest.albums.iter().find(|a| a.slug_path == node.slug_path) else {
        return;
    };
    let header = entity_header(position, &album.title, Some(&album_detail(album)));
    lines.push(format!("{}{}", base_indent, header));
    lines.push(format!("{}    Source: {}/", base_indent, node.source_dir));

    if let Some(desc) = &album.description {
        let preview = truncate_desc(&metadata::plain_text(desc), 60);
        if !preview.is_empty() {
            lines.push(format!("{}    {}", base_indent, preview));
        }
    }

    let img_indent = format!("{}    ", base_indent);
    for img in &album.images {
        lines.push(format!(
            "{}{}",
            img_indent,
            image_line(img.position, img.title.as_deref(), &img.filename)
        ));
        if img.title.is_some() {
            lines.push(format!("{}    Source: {}", img_indent, img.filename));
        }
        if img.description.is_some() {
            let sidecar = Path::new(&img.filename).with_extension("txt");
            lines.push(format!(
                "{}    Description: {}",
                img_indent,
                sidecar.display()
            ));
        }
    }
}

pub fn print_scan_output(manifest: &Manifest, source_root: &Path) {
    for line in format_scan_output(manifest, source_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Process output
// ============================================================================

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::AlbumStarted { title, image_count } => {
            vec![format!("{} ({} photos)", title, image_count)]
        }
        ProcessEvent::ImageProcessed {
            index,
            title,
            source_path,
            variants,
        } => {
            let mut lines = Vec::new();
            let filename = Path::new(source_path)
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_else(|| source_path.clone());

            lines.push(format!(
                "    {}",
                image_line(*index, title.as_deref(), &filename)
            ));
            lines.push(format!("        Source: {}", source_path));

            for variant in variants {
                let status_str = match variant.status {
                    VariantStatus::Cached => "cached",
                    VariantStatus::Copied => "copied",
                    VariantStatus::Encoded => "encoded",
                };
                lines.push(format!("        {}: {}", variant.label, status_str));
            }
            lines
        }
    }
}

/// Closing line of the process stage.
///
/// ```text
/// Processed 6 photos in 4 albums: 10 cached, 0 copied, 2 encoded (12 total)
/// ```
pub fn format_process_summary(manifest: &ProcessedManifest, stats: &CacheStats) -> String {
    let photos: usize = manifest.albums.iter().map(|a| a.images.len()).sum();
    format!(
        "Processed {} photos in {} albums: {}",
        photos,
        manifest.albums.len(),
        stats
    )
}

// ============================================================================
// Stage 3: Generate output
// ============================================================================

/// Format generate stage output: every page, then a count.
pub fn format_generate_output(summary: &GenerateSummary) -> Vec<String> {
    let mut lines = vec!["Pages".to_string()];
    for path in &summary.written {
        lines.push(format!("    {}", path.display()));
    }
    for path in &summary.unchanged {
        lines.push(format!("    {} (unchanged)", path.display()));
    }
    lines.push(String::new());
    lines.push(format!(
        "Wrote {} pages, {} unchanged",
        summary.written.len(),
        summary.unchanged.len()
    ));
    lines
}

pub fn print_generate_output(summary: &GenerateSummary) {
    for line in format_generate_output(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::VariantInfo;
    use crate::scan::scan;
    use crate::test_helpers::*;
    use std::path::PathBuf;

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn truncate_desc_short() {
        assert_eq!(truncate_desc("hello", 10), "hello");
    }

    #[test]
    fn truncate_desc_exact() {
        assert_eq!(truncate_desc("hello", 5), "hello");
    }

    #[test]
    fn truncate_desc_long() {
        assert_eq!(truncate_desc("hello world", 5), "hello...");
    }

    #[test]
    fn truncate_desc_multibyte() {
        assert_eq!(truncate_desc("Café au lait", 4), "Café...");
    }

    #[test]
    fn format_index_padding() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn entity_header_with_detail() {
        assert_eq!(
            entity_header(1, "Landscapes", Some("5 photos")),
            "001 Landscapes (5 photos)"
        );
    }

    #[test]
    fn entity_header_without_detail() {
        assert_eq!(entity_header(2, "Travel", None), "002 Travel");
    }

    #[test]
    fn image_line_with_title() {
        assert_eq!(
            image_line(1, Some("The Sunset"), "010-The-Sunset.jpg"),
            "001 The Sunset"
        );
    }

    #[test]
    fn image_line_without_title() {
        assert_eq!(image_line(1, None, "010.jpg"), "001 (010.jpg)");
        assert_eq!(image_line(1, Some(""), "010.jpg"), "001 (010.jpg)");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    // =========================================================================
    // Scan output tests
    // =========================================================================

    #[test]
    fn scan_output_lists_tree() {
        let tmp = setup_fixtures();
        let manifest = scan(tmp.path()).unwrap();
        let lines = format_scan_output(&manifest, tmp.path());

        let expected_start = vec![
            "Albums",
            "001 Landscapes (2 photos)",
            "    Source: 010-Landscapes/",
            "    Quiet places, early light.",
            "    001 dawn",
            "        Source: 001-dawn.jpg",
            "        Description: 001-dawn.txt",
            "    002 mountains",
            "        Source: 010-mountains.jpg",
            "002 Travel",
            "    Source: 020-Travel/",
            "    001 Japan (2 photos)",
            "        Source: 020-Travel/010-Japan/",
        ];
        assert_eq!(&lines[..expected_start.len()], expected_start.as_slice());

        assert!(lines.contains(&"003 wip drafts (1 photos, unlisted)".to_string()));
        assert_eq!(lines[lines.len() - 2], "Config");
        assert_eq!(lines[lines.len() - 1], "    hugallery.toml");
    }

    #[test]
    fn scan_output_without_root_config() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_photo(tmp.path(), "010-A/001.jpg");
        let manifest = scan(tmp.path()).unwrap();
        let lines = format_scan_output(&manifest, tmp.path());

        assert!(lines.contains(&"    001 (001.jpg)".to_string()));
        assert_eq!(lines.last().unwrap(), "    (stock defaults)");
    }

    // =========================================================================
    // Process output tests
    // =========================================================================

    #[test]
    fn format_process_album_started() {
        let event = ProcessEvent::AlbumStarted {
            title: "Landscapes".to_string(),
            image_count: 5,
        };
        assert_eq!(format_process_event(&event), vec!["Landscapes (5 photos)"]);
    }

    #[test]
    fn format_process_image_with_title() {
        let event = ProcessEvent::ImageProcessed {
            index: 1,
            title: Some("The Sunset".to_string()),
            source_path: "010-Landscapes/001-sunset.jpg".to_string(),
            variants: vec![
                VariantInfo {
                    label: "800px".to_string(),
                    status: VariantStatus::Cached,
                },
                VariantInfo {
                    label: "1600px".to_string(),
                    status: VariantStatus::Encoded,
                },
                VariantInfo {
                    label: "thumbnail".to_string(),
                    status: VariantStatus::Copied,
                },
            ],
        };
        let lines = format_process_event(&event);
        assert_eq!(
            lines,
            vec![
                "    001 The Sunset",
                "        Source: 010-Landscapes/001-sunset.jpg",
                "        800px: cached",
                "        1600px: encoded",
                "        thumbnail: copied",
            ]
        );
    }

    #[test]
    fn format_process_image_without_title() {
        let event = ProcessEvent::ImageProcessed {
            index: 3,
            title: None,
            source_path: "002-NY/038.jpg".to_string(),
            variants: vec![],
        };
        let lines = format_process_event(&event);
        assert_eq!(lines[0], "    003 (038.jpg)");
        assert_eq!(lines[1], "        Source: 002-NY/038.jpg");
    }

    // =========================================================================
    // Generate output tests
    // =========================================================================

    #[test]
    fn process_summary_counts_photos_and_cache() {
        let manifest = ProcessedManifest {
            tree: vec![],
            groups: vec![],
            albums: vec![],
            config: crate::config::SiteConfig::default(),
        };
        let stats = CacheStats {
            hits: 3,
            copies: 1,
            misses: 2,
        };
        assert_eq!(
            format_process_summary(&manifest, &stats),
            "Processed 0 photos in 0 albums: 3 cached, 1 copied, 2 encoded (6 total)"
        );
    }

    #[test]
    fn generate_output_marks_unchanged_pages() {
        let summary = GenerateSummary {
            written: vec![PathBuf::from("content/gallery/_index.md")],
            unchanged: vec![PathBuf::from("content/gallery/a/index.md")],
        };
        assert_eq!(
            format_generate_output(&summary),
            vec![
                "Pages",
                "    content/gallery/_index.md",
                "    content/gallery/a/index.md (unchanged)",
                "",
                "Wrote 1 pages, 1 unchanged",
            ]
        );
    }
}
