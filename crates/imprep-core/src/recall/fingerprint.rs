//! Perceptual fingerprints of normalized images.

use image::DynamicImage;
use image_hasher::{HasherConfig, ImageHash};
use rayon::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::{ColorConfig, RecallConfig};
use crate::error::ImageError;
use crate::prep::{autocrop, is_color, AutoCrop};
use crate::raw::RawImage;

const COLOR_TAG: &str = "c";
const GRAY_TAG: &str = "g";

/// Compact summary of an autocropped image's visual content.
///
/// The perceptual hash covers the luminance plane only; the color
/// classification travels alongside it so color and grayscale renditions of
/// the same picture stay distinguishable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    is_color: bool,
    hash: ImageHash,
}

impl Fingerprint {
    /// Whether the fingerprinted image was classified as color.
    pub fn is_color(&self) -> bool {
        self.is_color
    }

    /// Hash bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.hash.as_bytes()
    }

    /// Hamming distance between the two hashes, ignoring color class.
    ///
    /// Returns `None` if the hashes have different lengths.
    pub fn hamming(&self, other: &Fingerprint) -> Option<u32> {
        (self.as_bytes().len() == other.as_bytes().len()).then(|| self.hash.dist(&other.hash))
    }

    /// Distance used for recall.
    ///
    /// Color and grayscale fingerprints never match unless
    /// `match_across_color` is set.
    pub fn distance(&self, other: &Fingerprint, match_across_color: bool) -> Option<u32> {
        if self.is_color != other.is_color && !match_across_color {
            return None;
        }
        self.hamming(other)
    }

    /// Encode as `c:<base64>` (color) or `g:<base64>` (grayscale).
    pub fn to_base64(&self) -> String {
        let tag = if self.is_color { COLOR_TAG } else { GRAY_TAG };
        format!("{tag}:{}", self.hash.to_base64())
    }

    /// Parse the `to_base64` representation.
    pub fn from_base64(encoded: &str) -> Result<Self, ImageError> {
        let (tag, body) = encoded
            .split_once(':')
            .ok_or_else(|| ImageError::InvalidFingerprint(format!("missing class tag: {encoded}")))?;
        let is_color = match tag {
            COLOR_TAG => true,
            GRAY_TAG => false,
            other => {
                return Err(ImageError::InvalidFingerprint(format!(
                    "unknown class tag {other:?}"
                )))
            }
        };
        let hash = ImageHash::from_base64(body)
            .map_err(|e| ImageError::InvalidFingerprint(format!("{e:?}")))?;
        Self::from_hash(is_color, hash)
    }

    /// Build a fingerprint from raw hash bytes and a color class.
    pub fn from_bytes(is_color: bool, bytes: &[u8]) -> Result<Self, ImageError> {
        let hash = ImageHash::from_bytes(bytes)
            .map_err(|e| ImageError::InvalidFingerprint(format!("{e:?}")))?;
        Self::from_hash(is_color, hash)
    }

    fn from_hash(is_color: bool, hash: ImageHash) -> Result<Self, ImageError> {
        if hash.as_bytes().is_empty() {
            return Err(ImageError::InvalidFingerprint("empty hash".into()));
        }
        Ok(Self { is_color, hash })
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Fingerprint::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

/// Computes fingerprints with a fixed hash configuration.
///
/// The perceptual hasher is configured once and reused for every image.
pub struct Fingerprinter {
    hasher: image_hasher::Hasher,
    color_tolerance: u8,
}

impl Fingerprinter {
    /// Create a fingerprinter from recall and color settings.
    pub fn new(recall: &RecallConfig, color: &ColorConfig) -> Self {
        let hasher = HasherConfig::new()
            .hash_alg(recall.algorithm.to_hash_alg())
            .hash_size(recall.hash_size, recall.hash_size)
            .to_hasher();
        Self {
            hasher,
            color_tolerance: color.tolerance,
        }
    }

    /// Fingerprint an image: autocrop, classify, hash the luminance plane.
    pub fn fingerprint(&self, image: &RawImage) -> Fingerprint {
        self.fingerprint_cropped(&autocrop(image))
    }

    /// Fingerprint an image that has already been autocropped.
    pub fn fingerprint_cropped(&self, cropped: &AutoCrop<'_>) -> Fingerprint {
        let is_color = is_color(&cropped.image, self.color_tolerance);
        let luma = DynamicImage::ImageLuma8(cropped.image.to_luma8());
        let hash = self.hasher.hash_image(&luma);
        tracing::trace!(
            "Fingerprint {}x{} (color={}) -> {}",
            cropped.bbox.width(),
            cropped.bbox.height(),
            is_color,
            hash.to_base64()
        );
        Fingerprint { is_color, hash }
    }

    /// Fingerprint a decoded `DynamicImage`.
    ///
    /// Fails for pixel formats outside the supported modes.
    pub fn fingerprint_dynamic(&self, image: &DynamicImage) -> Result<Fingerprint, ImageError> {
        let raw = RawImage::try_from(image)?;
        Ok(self.fingerprint(&raw))
    }

    /// Fingerprint many images in parallel, preserving input order.
    pub fn fingerprint_all(&self, images: &[RawImage]) -> Vec<Fingerprint> {
        images.par_iter().map(|image| self.fingerprint(image)).collect()
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new(&RecallConfig::default(), &ColorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{Pixel, PixelMode};

    /// Horizontal luminance ramp; `rising` chooses its direction.
    fn ramp(rising: bool) -> RawImage {
        let mut samples = Vec::new();
        for _y in 0..64u32 {
            for x in 0..64u32 {
                let v = if rising { x * 4 } else { 252 - x * 4 };
                samples.push(v as u8);
            }
        }
        RawImage::from_raw(64, 64, PixelMode::Luma, samples).unwrap()
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let fingerprinter = Fingerprinter::default();
        let a = fingerprinter.fingerprint(&ramp(true));
        let b = fingerprinter.fingerprint(&ramp(true));
        assert_eq!(a, b);
        assert_eq!(a.hamming(&b), Some(0));
        assert!(!a.is_color());
    }

    #[test]
    fn test_opposite_ramps_are_far_apart() {
        let fingerprinter = Fingerprinter::default();
        let a = fingerprinter.fingerprint(&ramp(true));
        let b = fingerprinter.fingerprint(&ramp(false));
        assert!(a.hamming(&b).unwrap() > RecallConfig::default().max_distance);
    }

    /// Diagonal ramp whose corners vote for the middle value, so autocrop
    /// keeps the whole image.
    fn diagonal() -> RawImage {
        let mut samples = Vec::new();
        for y in 0..64u32 {
            for x in 0..64u32 {
                samples.push((2 * x + 2 * y) as u8);
            }
        }
        RawImage::from_raw(64, 64, PixelMode::Luma, samples).unwrap()
    }

    #[test]
    fn test_padding_does_not_change_fingerprint() {
        let fingerprinter = Fingerprinter::default();
        let content = diagonal();
        let mut padded = RawImage::filled(90, 80, PixelMode::Luma, Pixel::new(&[255])).unwrap();
        for (x, y, p) in content.pixels() {
            padded.put_pixel(x + 13, y + 7, p);
        }
        let a = fingerprinter.fingerprint(&content);
        let b = fingerprinter.fingerprint(&padded);
        assert_eq!(a.hamming(&b), Some(0));
    }

    #[test]
    fn test_color_class_gates_distance() {
        let gray = Fingerprinter::default().fingerprint(&ramp(true));
        let body = gray.to_base64().strip_prefix("g:").unwrap().to_string();
        let color = Fingerprint::from_base64(&format!("c:{body}")).unwrap();
        assert!(color.is_color());
        assert_eq!(gray.distance(&color, false), None);
        assert_eq!(gray.distance(&color, true), Some(0));
        assert_eq!(gray.distance(&gray, false), Some(0));
    }

    #[test]
    fn test_base64_round_trip_and_serde() {
        let fingerprinter = Fingerprinter::default();
        let fp = fingerprinter.fingerprint(&ramp(true));
        let parsed = Fingerprint::from_base64(&fp.to_base64()).unwrap();
        assert_eq!(parsed, fp);

        let json = serde_json::to_string(&fp).unwrap();
        assert!(json.starts_with("\"g:"));
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp);
    }

    #[test]
    fn test_from_bytes() {
        let fp = Fingerprint::from_bytes(true, &[0b1010_0000, 0xFF]).unwrap();
        assert!(fp.is_color());
        assert_eq!(fp.as_bytes(), &[0b1010_0000, 0xFF]);
        let other = Fingerprint::from_bytes(false, &[0, 0xFF]).unwrap();
        assert_eq!(fp.hamming(&other), Some(2));
        assert!(Fingerprint::from_bytes(false, &[]).is_err());
    }

    #[test]
    fn test_cropped_matches_full_path() {
        let fingerprinter = Fingerprinter::default();
        let mut padded = RawImage::filled(90, 80, PixelMode::Luma, Pixel::new(&[255])).unwrap();
        for (x, y, p) in diagonal().pixels() {
            padded.put_pixel(x + 13, y + 7, p);
        }
        let cropped = autocrop(&padded);
        assert_eq!(
            fingerprinter.fingerprint_cropped(&cropped),
            fingerprinter.fingerprint(&padded)
        );
    }

    #[test]
    fn test_from_base64_rejects_garbage() {
        assert!(Fingerprint::from_base64("no-tag").is_err());
        assert!(Fingerprint::from_base64("x:AAAA").is_err());
        assert!(Fingerprint::from_base64("g:").is_err());
    }

    #[test]
    fn test_fingerprint_dynamic_rejects_16_bit() {
        let fingerprinter = Fingerprinter::default();
        let err = fingerprinter
            .fingerprint_dynamic(&DynamicImage::new_luma16(8, 8))
            .unwrap_err();
        assert!(matches!(err, ImageError::UnsupportedMode(_)));
    }

    #[test]
    fn test_fingerprint_all_preserves_order() {
        let fingerprinter = Fingerprinter::default();
        let images = vec![ramp(true), ramp(false), ramp(true)];
        let prints = fingerprinter.fingerprint_all(&images);
        assert_eq!(prints.len(), 3);
        assert_eq!(prints[0], prints[2]);
        assert_eq!(prints[0], fingerprinter.fingerprint(&images[0]));
        assert_eq!(prints[1], fingerprinter.fingerprint(&images[1]));
    }
}
