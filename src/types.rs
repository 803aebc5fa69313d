//! Types shared by all pipeline stages.
//!
//! These are serialized into both the scan and the processed manifest, so
//! their shape must stay identical across stages.

use serde::{Deserialize, Serialize};

/// One node of the gallery tree: either a group (with children) or an album.
///
/// The tree mirrors the photo directory and therefore the Hugo content
/// layout. Nodes are in display order (numbered first, then by name).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryNode {
    pub title: String,
    /// URL path below the content section, e.g. `travel/japan`.
    pub slug_path: String,
    /// Source directory relative to the photo root, e.g. `020-Travel/010-Japan`.
    pub source_dir: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<GalleryNode>,
}

impl GalleryNode {
    pub fn is_group(&self) -> bool {
        !self.children.is_empty()
    }
}
