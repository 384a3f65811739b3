//! Bounding-box autocrop of flat border padding.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::border::guess_border;
use crate::raw::{Pixel, RawImage};

/// Inclusive pixel bounds of a sub-rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    /// The box covering a whole `width` x `height` image ("no crop").
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            min_x: 0,
            min_y: 0,
            max_x: width.saturating_sub(1),
            max_y: height.saturating_sub(1),
        }
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Grow the box to include `(x, y)`.
    fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }
}

/// Result of autocropping an image.
#[derive(Debug, Clone)]
pub struct AutoCrop<'a> {
    /// The cropped pixels; borrowed when nothing was trimmed
    pub image: Cow<'a, RawImage>,
    /// Bounds of the crop within the source image
    pub bbox: BoundingBox,
    /// Border color the crop was computed against
    pub border: Pixel,
}

impl AutoCrop<'_> {
    /// Whether any padding was removed.
    pub fn is_trimmed(&self) -> bool {
        matches!(self.image, Cow::Owned(_))
    }
}

/// Bounding box of every pixel that differs exactly from `border`.
///
/// Returns `None` when the whole image equals the border color.
pub fn content_bounds(image: &RawImage, border: Pixel) -> Option<BoundingBox> {
    let mut bounds: Option<BoundingBox> = None;
    for (x, y, pixel) in image.pixels() {
        if pixel == border {
            continue;
        }
        match bounds.as_mut() {
            Some(bbox) => bbox.include(x, y),
            None => {
                bounds = Some(BoundingBox {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                })
            }
        }
    }
    bounds
}

/// Trim uniform border padding from an image.
///
/// The border color comes from [`guess_border`]. The result is the smallest
/// sub-image containing every pixel that differs from it. A uniform image is
/// returned whole, never collapsed to an empty or single-pixel crop.
pub fn autocrop(image: &RawImage) -> AutoCrop<'_> {
    let border = guess_border(image);
    match content_bounds(image, border) {
        Some(bbox) if bbox != BoundingBox::full(image.width(), image.height()) => {
            tracing::trace!(
                "Autocrop {}x{} -> {}x{}",
                image.width(),
                image.height(),
                bbox.width(),
                bbox.height()
            );
            AutoCrop {
                image: Cow::Owned(image.crop(&bbox)),
                bbox,
                border,
            }
        }
        _ => AutoCrop {
            image: Cow::Borrowed(image),
            bbox: BoundingBox::full(image.width(), image.height()),
            border,
        },
    }
}
