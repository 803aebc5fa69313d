//! Dimension math. No I/O, no pixels.

/// Thumbnail crop size from an aspect ratio and the short edge length.
///
/// `(4, 5)` at 300 gives 300x375; `(16, 9)` at 180 gives 320x180.
pub fn calculate_thumbnail_dimensions(aspect: (u32, u32), short_edge: u32) -> (u32, u32) {
    let (aspect_w, aspect_h) = aspect;

    if aspect_w <= aspect_h {
        let h = (short_edge as f64 * aspect_h as f64 / aspect_w as f64).round() as u32;
        (short_edge, h)
    } else {
        let w = (short_edge as f64 * aspect_w as f64 / aspect_h as f64).round() as u32;
        (w, short_edge)
    }
}

/// One rendition to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsiveSize {
    /// Requested size on the longer edge. Used in the file name.
    pub target: u32,
    pub width: u32,
    pub height: u32,
}

/// Work out which renditions to generate for a photo of `original` size.
///
/// Sizes larger than the longer edge are dropped, since photos are never
/// upscaled. When every requested size is too large the original size is
/// the only rendition. Duplicate sizes collapse.
pub fn calculate_responsive_sizes(original: (u32, u32), sizes: &[u32]) -> Vec<ResponsiveSize> {
    let (orig_w, orig_h) = original;
    let longer_edge = orig_w.max(orig_h);

    let mut targets: Vec<u32> = sizes
        .iter()
        .copied()
        .filter(|&size| size <= longer_edge)
        .collect();
    targets.sort_unstable();
    targets.dedup();

    if targets.is_empty() {
        return vec![ResponsiveSize {
            target: longer_edge,
            width: orig_w,
            height: orig_h,
        }];
    }

    targets
        .into_iter()
        .map(|target| {
            let (width, height) = if orig_w >= orig_h {
                let ratio = target as f64 / orig_w as f64;
                (target, ((orig_h as f64 * ratio).round() as u32).max(1))
            } else {
                let ratio = target as f64 / orig_h as f64;
                (((orig_w as f64 * ratio).round() as u32).max(1), target)
            };
            ResponsiveSize {
                target,
                width,
                height,
            }
        })
        .collect()
}
