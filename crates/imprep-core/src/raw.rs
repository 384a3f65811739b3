//! Decoded pixel grids with an explicit channel mode.
//!
//! `RawImage` is the boundary between file decoding and the pure
//! normalization functions. It supports the modes training corpora actually
//! contain, including bilevel scans and CMYK print files, which the `image`
//! crate's `DynamicImage` cannot represent directly.

use std::fmt;
use std::str::FromStr;

use image::{ColorType, DynamicImage, GrayImage, ImageBuffer, LumaA, Rgb, Rgba};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ImageError;
use crate::prep::BoundingBox;

/// Pixel encoding of a `RawImage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelMode {
    /// 1-bit black and white, stored as 0 or 255
    #[serde(rename = "1")]
    Bilevel,
    /// Single-channel luminance
    #[serde(rename = "L")]
    Luma,
    /// Luminance plus alpha
    #[serde(rename = "LA")]
    LumaAlpha,
    /// Additive color
    #[serde(rename = "RGB")]
    Rgb,
    /// Additive color plus alpha
    #[serde(rename = "RGBA")]
    Rgba,
    /// Subtractive print color
    #[serde(rename = "CMYK")]
    Cmyk,
}

impl PixelMode {
    /// Number of 8-bit samples per pixel.
    pub fn channels(self) -> usize {
        match self {
            PixelMode::Bilevel | PixelMode::Luma => 1,
            PixelMode::LumaAlpha => 2,
            PixelMode::Rgb => 3,
            PixelMode::Rgba | PixelMode::Cmyk => 4,
        }
    }

    /// Short mode name ("1", "L", "LA", "RGB", "RGBA", "CMYK").
    pub fn name(self) -> &'static str {
        match self {
            PixelMode::Bilevel => "1",
            PixelMode::Luma => "L",
            PixelMode::LumaAlpha => "LA",
            PixelMode::Rgb => "RGB",
            PixelMode::Rgba => "RGBA",
            PixelMode::Cmyk => "CMYK",
        }
    }

    /// Whether the mode can represent chromatic values at all.
    pub fn is_multichannel_color(self) -> bool {
        matches!(self, PixelMode::Rgb | PixelMode::Rgba | PixelMode::Cmyk)
    }

    /// Opaque white in this mode.
    pub fn white(self) -> Pixel {
        match self {
            PixelMode::Bilevel | PixelMode::Luma => Pixel::new(&[255]),
            PixelMode::LumaAlpha => Pixel::new(&[255, 255]),
            PixelMode::Rgb => Pixel::new(&[255, 255, 255]),
            PixelMode::Rgba => Pixel::new(&[255, 255, 255, 255]),
            PixelMode::Cmyk => Pixel::new(&[0, 0, 0, 0]),
        }
    }

    /// Opaque black in this mode.
    pub fn black(self) -> Pixel {
        match self {
            PixelMode::Bilevel | PixelMode::Luma => Pixel::new(&[0]),
            PixelMode::LumaAlpha => Pixel::new(&[0, 255]),
            PixelMode::Rgb => Pixel::new(&[0, 0, 0]),
            PixelMode::Rgba => Pixel::new(&[0, 0, 0, 255]),
            PixelMode::Cmyk => Pixel::new(&[0, 0, 0, 255]),
        }
    }
}

impl fmt::Display for PixelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelMode {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(PixelMode::Bilevel),
            "L" => Ok(PixelMode::Luma),
            "LA" => Ok(PixelMode::LumaAlpha),
            "RGB" => Ok(PixelMode::Rgb),
            "RGBA" => Ok(PixelMode::Rgba),
            "CMYK" => Ok(PixelMode::Cmyk),
            other => Err(ImageError::UnsupportedMode(other.to_string())),
        }
    }
}

/// A single pixel value of up to four 8-bit channels.
///
/// Ordering is channel-wise lexicographic, so for every supported mode a
/// "greater" pixel is the lighter one when channels are otherwise tied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pixel {
    channels: [u8; 4],
    len: u8,
}

impl Pixel {
    /// Build a pixel from its channel samples. At most four channels are kept.
    pub fn new(samples: &[u8]) -> Self {
        let len = samples.len().min(4);
        let mut channels = [0u8; 4];
        channels[..len].copy_from_slice(&samples[..len]);
        Self {
            channels,
            len: len as u8,
        }
    }

    /// The channel samples of this pixel.
    pub fn channels(&self) -> &[u8] {
        &self.channels[..self.len as usize]
    }

    /// Additive RGB triple for color-capable modes, alpha dropped.
    ///
    /// Returns `None` for single-luminance modes.
    pub fn to_rgb(&self, mode: PixelMode) -> Option<[u8; 3]> {
        let c = &self.channels;
        match mode {
            PixelMode::Rgb | PixelMode::Rgba => Some([c[0], c[1], c[2]]),
            PixelMode::Cmyk => {
                let k = 255 - c[3] as u32;
                let additive = |v: u8| (((255 - v as u32) * k + 127) / 255) as u8;
                Some([additive(c[0]), additive(c[1]), additive(c[2])])
            }
            PixelMode::Bilevel | PixelMode::Luma | PixelMode::LumaAlpha => None,
        }
    }

    /// 8-bit luminance using ITU-R 601-2 weights, alpha dropped.
    pub fn luminance(&self, mode: PixelMode) -> u8 {
        match self.to_rgb(mode) {
            Some([r, g, b]) => {
                ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
            }
            None => self.channels[0],
        }
    }
}

impl Serialize for Pixel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.channels())
    }
}

/// An owned, decoded pixel grid.
///
/// Samples are stored interleaved, row-major, one byte per channel. Images
/// always have at least one pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    width: u32,
    height: u32,
    mode: PixelMode,
    samples: Vec<u8>,
}

impl RawImage {
    /// Wrap an interleaved sample buffer.
    ///
    /// Bilevel samples are normalized to 0 or 255.
    pub fn from_raw(
        width: u32,
        height: u32,
        mode: PixelMode,
        mut samples: Vec<u8>,
    ) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::EmptyImage { width, height });
        }
        let expected = width as usize * height as usize * mode.channels();
        if samples.len() != expected {
            return Err(ImageError::BufferSize {
                width,
                height,
                mode,
                expected,
                actual: samples.len(),
            });
        }
        if mode == PixelMode::Bilevel {
            for s in samples.iter_mut() {
                *s = if *s == 0 { 0 } else { 255 };
            }
        }
        Ok(Self {
            width,
            height,
            mode,
            samples,
        })
    }

    /// Create an image with every pixel set to `fill`.
    pub fn filled(width: u32, height: u32, mode: PixelMode, fill: Pixel) -> Result<Self, ImageError> {
        check_channels(mode, &fill)?;
        let samples = fill
            .channels()
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * mode.channels())
            .collect();
        Self::from_raw(width, height, mode, samples)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn mode(&self) -> PixelMode {
        self.mode
    }

    /// Raw interleaved samples.
    pub fn as_samples(&self) -> &[u8] {
        &self.samples
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.mode.channels()
    }

    /// Read the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Pixel {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) out of bounds for {}x{}",
            self.width,
            self.height
        );
        let start = self.offset(x, y);
        Pixel::new(&self.samples[start..start + self.mode.channels()])
    }

    /// Read the pixel at `(x, y)`, or `None` when out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        (x < self.width && y < self.height).then(|| self.pixel(x, y))
    }

    /// Overwrite the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds or the pixel has the wrong
    /// number of channels for this image's mode.
    pub fn put_pixel(&mut self, x: u32, y: u32, pixel: Pixel) {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) out of bounds for {}x{}",
            self.width,
            self.height
        );
        if let Err(e) = check_channels(self.mode, &pixel) {
            panic!("{e}");
        }
        let start = self.offset(x, y);
        let channels = self.mode.channels();
        self.samples[start..start + channels].copy_from_slice(pixel.channels());
        if self.mode == PixelMode::Bilevel && self.samples[start] != 0 {
            self.samples[start] = 255;
        }
    }

    /// Iterate pixels in row-major order as `(x, y, pixel)`.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32, Pixel)> + '_ {
        let width = self.width;
        self.samples
            .chunks_exact(self.mode.channels())
            .enumerate()
            .map(move |(i, chunk)| {
                let x = (i % width as usize) as u32;
                let y = (i / width as usize) as u32;
                (x, y, Pixel::new(chunk))
            })
    }

    /// Copy the inclusive sub-rectangle `bbox` into a new image.
    ///
    /// # Panics
    ///
    /// Panics if the box extends past the image.
    pub fn crop(&self, bbox: &BoundingBox) -> RawImage {
        assert!(
            bbox.max_x < self.width && bbox.max_y < self.height,
            "crop box {bbox:?} exceeds {}x{}",
            self.width,
            self.height
        );
        let channels = self.mode.channels();
        let row_len = bbox.width() as usize * channels;
        let mut samples = Vec::with_capacity(row_len * bbox.height() as usize);
        for y in bbox.min_y..=bbox.max_y {
            let start = self.offset(bbox.min_x, y);
            samples.extend_from_slice(&self.samples[start..start + row_len]);
        }
        RawImage {
            width: bbox.width(),
            height: bbox.height(),
            mode: self.mode,
            samples,
        }
    }

    /// Canonical 8-bit luminance plane, alpha dropped.
    pub fn to_luma8(&self) -> GrayImage {
        let plane = self
            .samples
            .chunks_exact(self.mode.channels())
            .map(|chunk| Pixel::new(chunk).luminance(self.mode))
            .collect();
        GrayImage::from_raw(self.width, self.height, plane)
            .expect("luminance plane matches image dimensions")
    }

    /// Convert into a `DynamicImage` for encoding. CMYK is rendered as RGB.
    pub fn to_dynamic(&self) -> DynamicImage {
        let (w, h) = (self.width, self.height);
        let converted = match self.mode {
            PixelMode::Bilevel | PixelMode::Luma => {
                GrayImage::from_raw(w, h, self.samples.clone()).map(DynamicImage::ImageLuma8)
            }
            PixelMode::LumaAlpha => ImageBuffer::<LumaA<u8>, _>::from_raw(w, h, self.samples.clone())
                .map(DynamicImage::ImageLumaA8),
            PixelMode::Rgb => ImageBuffer::<Rgb<u8>, _>::from_raw(w, h, self.samples.clone())
                .map(DynamicImage::ImageRgb8),
            PixelMode::Rgba => ImageBuffer::<Rgba<u8>, _>::from_raw(w, h, self.samples.clone())
                .map(DynamicImage::ImageRgba8),
            PixelMode::Cmyk => {
                let rgb = self
                    .samples
                    .chunks_exact(4)
                    .flat_map(|chunk| Pixel::new(chunk).to_rgb(PixelMode::Cmyk).unwrap_or_default())
                    .collect();
                ImageBuffer::<Rgb<u8>, _>::from_raw(w, h, rgb).map(DynamicImage::ImageRgb8)
            }
        };
        converted.expect("sample buffer matches image dimensions")
    }
}

impl TryFrom<&DynamicImage> for RawImage {
    type Error = ImageError;

    fn try_from(image: &DynamicImage) -> Result<Self, Self::Error> {
        let mode = match image.color() {
            ColorType::L8 => PixelMode::Luma,
            ColorType::La8 => PixelMode::LumaAlpha,
            ColorType::Rgb8 => PixelMode::Rgb,
            ColorType::Rgba8 => PixelMode::Rgba,
            other => return Err(ImageError::UnsupportedMode(format!("{other:?}"))),
        };
        RawImage::from_raw(image.width(), image.height(), mode, image.as_bytes().to_vec())
    }
}

fn check_channels(mode: PixelMode, pixel: &Pixel) -> Result<(), ImageError> {
    let actual = pixel.channels().len();
    if actual != mode.channels() {
        return Err(ImageError::ChannelMismatch {
            mode,
            expected: mode.channels(),
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse_round_trip() {
        for name in ["1", "L", "LA", "RGB", "RGBA", "CMYK"] {
            let mode: PixelMode = name.parse().unwrap();
            assert_eq!(mode.to_string(), name);
        }
    }

    #[test]
    fn test_mode_parse_rejects_unknown() {
        let err = "P".parse::<PixelMode>().unwrap_err();
        assert_eq!(err, ImageError::UnsupportedMode("P".into()));
    }

    #[test]
    fn test_pixel_ordering_is_channel_wise() {
        assert!(Pixel::new(&[255, 255, 255]) > Pixel::new(&[0, 0, 0]));
        assert!(Pixel::new(&[1, 0, 0]) > Pixel::new(&[0, 255, 255]));
        assert!(Pixel::new(&[255]) > Pixel::new(&[0]));
    }

    #[test]
    fn test_cmyk_to_rgb() {
        assert_eq!(
            Pixel::new(&[0, 0, 0, 0]).to_rgb(PixelMode::Cmyk),
            Some([255, 255, 255])
        );
        assert_eq!(
            Pixel::new(&[0, 0, 0, 255]).to_rgb(PixelMode::Cmyk),
            Some([0, 0, 0])
        );
        assert_eq!(
            Pixel::new(&[155, 155, 155, 0]).to_rgb(PixelMode::Cmyk),
            Some([100, 100, 100])
        );
        assert_eq!(Pixel::new(&[7]).to_rgb(PixelMode::Luma), None);
    }

    #[test]
    fn test_luminance_of_gray_is_identity() {
        for v in [0u8, 1, 77, 128, 254, 255] {
            assert_eq!(Pixel::new(&[v, v, v]).luminance(PixelMode::Rgb), v);
            assert_eq!(Pixel::new(&[v, 9]).luminance(PixelMode::LumaAlpha), v);
        }
    }

    #[test]
    fn test_from_raw_rejects_bad_buffer() {
        let err = RawImage::from_raw(2, 2, PixelMode::Rgb, vec![0; 11]).unwrap_err();
        assert!(matches!(
            err,
            ImageError::BufferSize {
                expected: 12,
                actual: 11,
                ..
            }
        ));
    }

    #[test]
    fn test_from_raw_rejects_empty() {
        let err = RawImage::from_raw(0, 4, PixelMode::Luma, vec![]).unwrap_err();
        assert_eq!(err, ImageError::EmptyImage { width: 0, height: 4 });
    }

    #[test]
    fn test_bilevel_samples_normalized() {
        let image = RawImage::from_raw(3, 1, PixelMode::Bilevel, vec![0, 1, 200]).unwrap();
        assert_eq!(image.as_samples(), &[0, 255, 255]);
    }

    #[test]
    fn test_filled_rejects_channel_mismatch() {
        let err = RawImage::filled(2, 2, PixelMode::Rgb, Pixel::new(&[1])).unwrap_err();
        assert!(matches!(err, ImageError::ChannelMismatch { expected: 3, .. }));
    }

    #[test]
    fn test_put_and_read_pixel() {
        let mut image = RawImage::filled(3, 2, PixelMode::Rgba, PixelMode::Rgba.white()).unwrap();
        image.put_pixel(2, 1, Pixel::new(&[1, 2, 3, 4]));
        assert_eq!(image.pixel(2, 1).channels(), &[1, 2, 3, 4]);
        assert_eq!(image.pixel(0, 0), PixelMode::Rgba.white());
        assert!(image.get_pixel(3, 0).is_none());
    }

    #[test]
    fn test_crop_copies_sub_rectangle() {
        let samples: Vec<u8> = (0..16).collect();
        let image = RawImage::from_raw(4, 4, PixelMode::Luma, samples).unwrap();
        let cropped = image.crop(&BoundingBox {
            min_x: 1,
            min_y: 2,
            max_x: 2,
            max_y: 3,
        });
        assert_eq!(cropped.dimensions(), (2, 2));
        assert_eq!(cropped.as_samples(), &[9, 10, 13, 14]);
    }

    #[test]
    fn test_dynamic_image_round_trip() {
        let dynamic = DynamicImage::new_rgba8(5, 3);
        let raw = RawImage::try_from(&dynamic).unwrap();
        assert_eq!(raw.mode(), PixelMode::Rgba);
        assert_eq!(raw.dimensions(), (5, 3));
        assert_eq!(raw.to_dynamic(), dynamic);
    }

    #[test]
    fn test_dynamic_image_unsupported_depth() {
        let dynamic = DynamicImage::new_rgb16(2, 2);
        let err = RawImage::try_from(&dynamic).unwrap_err();
        assert!(matches!(err, ImageError::UnsupportedMode(_)));
    }

    #[test]
    fn test_pixel_serializes_as_channel_list() {
        let json = serde_json::to_string(&Pixel::new(&[10, 20, 30])).unwrap();
        assert_eq!(json, "[10,20,30]");
    }
}
