//! Border color estimation from corner samples.

use crate::raw::{Pixel, RawImage};

/// Guess the background color surrounding an image's content.
///
/// Only the four corner pixels are sampled. The most frequent corner value
/// wins; among equally frequent values the greatest pixel under channel-wise
/// comparison wins, which favors the lighter color when a border is
/// ambiguous.
pub fn guess_border(image: &RawImage) -> Pixel {
    let (w, h) = image.dimensions();
    let corners = [
        image.pixel(0, 0),
        image.pixel(w - 1, 0),
        image.pixel(0, h - 1),
        image.pixel(w - 1, h - 1),
    ];

    let mut best = corners[0];
    let mut best_count = 0;
    for candidate in corners {
        let count = corners.iter().filter(|&&c| c == candidate).count();
        if count > best_count || (count == best_count && candidate > best) {
            best = candidate;
            best_count = count;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::PixelMode;

    /// 3x3 image whose corners, in (0,0), (2,0), (0,2), (2,2) order, are
    /// white (`true`) or black (`false`).
    fn image_with_corners(mode: PixelMode, corners: [bool; 4]) -> RawImage {
        let color = |white: bool| if white { mode.white() } else { mode.black() };
        let mut image = RawImage::filled(3, 3, mode, color(corners[0])).unwrap();
        for ((x, y), white) in [(0, 0), (2, 0), (0, 2), (2, 2)].into_iter().zip(corners) {
            image.put_pixel(x, y, color(white));
        }
        image
    }

    #[test]
    fn test_all_corners_identical() {
        for mode in [PixelMode::Luma, PixelMode::Rgb] {
            let white = image_with_corners(mode, [true; 4]);
            assert_eq!(guess_border(&white), mode.white());
            let black = image_with_corners(mode, [false; 4]);
            assert_eq!(guess_border(&black), mode.black());
        }
    }

    #[test]
    fn test_even_split_prefers_lighter() {
        for mode in [PixelMode::Luma, PixelMode::Rgb] {
            let image = image_with_corners(mode, [false, false, true, true]);
            assert_eq!(guess_border(&image), mode.white(), "{mode} half and half");
            let image = image_with_corners(mode, [true, false, true, false]);
            assert_eq!(guess_border(&image), mode.white(), "{mode} alternating");
        }
    }

    #[test]
    fn test_majority_beats_lighter() {
        for mode in [PixelMode::Luma, PixelMode::Rgb] {
            let image = image_with_corners(mode, [false, false, false, true]);
            assert_eq!(guess_border(&image), mode.black(), "{mode} one white");
        }
    }

    #[test]
    fn test_all_distinct_picks_greatest() {
        let mut image = RawImage::filled(2, 2, PixelMode::Rgb, Pixel::new(&[0, 0, 0])).unwrap();
        image.put_pixel(1, 0, Pixel::new(&[10, 200, 0]));
        image.put_pixel(0, 1, Pixel::new(&[10, 199, 255]));
        image.put_pixel(1, 1, Pixel::new(&[9, 255, 255]));
        assert_eq!(guess_border(&image), Pixel::new(&[10, 200, 0]));
    }

    #[test]
    fn test_single_pixel_image() {
        let image = RawImage::filled(1, 1, PixelMode::Cmyk, Pixel::new(&[1, 2, 3, 4])).unwrap();
        assert_eq!(guess_border(&image), Pixel::new(&[1, 2, 3, 4]));
    }
}
