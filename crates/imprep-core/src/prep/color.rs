//! Color vs. grayscale classification.

use crate::raw::{Pixel, RawImage};

/// Decide whether an image carries chromatic information.
///
/// Single-luminance modes are never color. For RGB, RGBA and CMYK the image
/// is color as soon as any single pixel's channel spread (max - min of its
/// additive RGB triple) exceeds `tolerance`. One stray colored pixel is
/// enough, so small logos or artifacts in otherwise gray scans are caught.
pub fn is_color(image: &RawImage, tolerance: u8) -> bool {
    let mode = image.mode();
    if !mode.is_multichannel_color() {
        return false;
    }

    image
        .as_samples()
        .chunks_exact(mode.channels())
        .filter_map(|chunk| Pixel::new(chunk).to_rgb(mode))
        .any(|[r, g, b]| {
            let max = r.max(g).max(b);
            let min = r.min(g).min(b);
            max - min > tolerance
        })
}
