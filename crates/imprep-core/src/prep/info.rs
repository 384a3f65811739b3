//! Per-image normalization summary.

use serde::Serialize;

use super::{autocrop, is_color, AutoCrop};
use crate::config::ColorConfig;
use crate::prep::BoundingBox;
use crate::raw::{Pixel, PixelMode, RawImage};

/// What the normalization pass learned about one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    /// Pixel encoding of the source image
    pub mode: PixelMode,

    /// Source width in pixels
    pub width: u32,

    /// Source height in pixels
    pub height: u32,

    /// Whether any pixel carries chromatic information.
    ///
    /// Covers the whole source image, border included. The fingerprint
    /// classifies the cropped content, so a gray picture on a colored border
    /// reports `true` here and carries a grayscale fingerprint.
    pub is_color: bool,

    /// Inferred border/background color
    pub border: Pixel,

    /// Content bounds; equal to the full image when nothing was trimmed
    pub crop: BoundingBox,
}

impl ImageInfo {
    /// Classify and autocrop an image, keeping only the summary.
    pub fn analyze(image: &RawImage, config: &ColorConfig) -> Self {
        Self::from_crop(image, &autocrop(image), config)
    }

    /// Summarize `image` given its precomputed autocrop.
    pub fn from_crop(image: &RawImage, cropped: &AutoCrop<'_>, config: &ColorConfig) -> Self {
        Self {
            mode: image.mode(),
            width: image.width(),
            height: image.height(),
            is_color: is_color(image, config.tolerance),
            border: cropped.border,
            crop: cropped.bbox,
        }
    }

    /// Whether the crop removes any padding.
    pub fn is_trimmed(&self) -> bool {
        self.crop != BoundingBox::full(self.width, self.height)
    }
}
