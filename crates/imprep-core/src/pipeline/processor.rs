//! Pipeline orchestration - wires together all processing stages.

use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;

use crate::config::{ColorConfig, Config};
use crate::error::{PipelineError, PipelineResult};
use crate::prep::{autocrop, filename_key, ImageInfo};
use crate::recall::Fingerprinter;
use crate::types::ImageRecord;

use super::decode::{format_to_string, DecodedImage, ImageDecoder};
use super::discovery::{DiscoveredFile, FileDiscovery};
use super::hash::ContentHasher;
use super::validate::Validator;

/// Runs validate, decode, normalize and fingerprint for single files.
pub struct ImageProcessor {
    decoder: ImageDecoder,
    validator: Validator,
    discovery: FileDiscovery,
    fingerprinter: Fingerprinter,
    color: ColorConfig,
}

impl ImageProcessor {
    /// Create a new image processor with the given configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            decoder: ImageDecoder::new(config.limits.clone()),
            validator: Validator::new(config.limits.clone()),
            discovery: FileDiscovery::new(config.processing.clone()),
            fingerprinter: Fingerprinter::new(&config.recall, &config.color),
            color: config.color.clone(),
        }
    }

    /// Discover all image files at a path, in filename-key order.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        self.discovery.discover(path)
    }

    /// Validate and decode one file, with the configured timeout.
    pub async fn load(&self, path: &Path) -> PipelineResult<DecodedImage> {
        self.validator.validate(path)?;
        self.decoder.decode(path).await
    }

    /// Process a single image through the full pipeline.
    pub async fn process(&self, path: &Path) -> PipelineResult<ImageRecord> {
        let start = Instant::now();
        tracing::debug!("Processing: {:?}", path);

        let bytes = read(path).await?;
        self.validator.validate_bytes(path, &bytes)?;
        let content_hash = ContentHasher::hash_bytes(&bytes);
        tracing::trace!("  Validate + hash: {:?}", start.elapsed());

        let decode_start = Instant::now();
        let decoded = self.decoder.decode_from_bytes(bytes, path).await?;
        tracing::trace!("  Decode: {:?}", decode_start.elapsed());

        let record = self.record(path, content_hash, decoded);
        tracing::debug!(
            "Processed {:?} in {:?} ({}x{}, color={})",
            record.file_name,
            start.elapsed(),
            record.info.width,
            record.info.height,
            record.info.is_color
        );
        Ok(record)
    }

    /// Process files on the rayon pool, preserving input order.
    ///
    /// Decoding runs without the async timeout; the size and dimension
    /// limits still apply.
    pub fn process_batch(&self, files: &[DiscoveredFile]) -> Vec<PipelineResult<ImageRecord>> {
        files
            .par_iter()
            .map(|file| self.process_blocking(&file.path))
            .collect()
    }

    /// Synchronous variant of [`process`](Self::process).
    pub fn process_blocking(&self, path: &Path) -> PipelineResult<ImageRecord> {
        let bytes = std::fs::read(path).map_err(|e| read_error(path, e))?;
        self.validator.validate_bytes(path, &bytes)?;
        let content_hash = ContentHasher::hash_bytes(&bytes);
        let decoded = self.decoder.decode_blocking(bytes, path)?;
        Ok(self.record(path, content_hash, decoded))
    }

    /// The fingerprinter configured for this processor.
    pub fn fingerprinter(&self) -> &Fingerprinter {
        &self.fingerprinter
    }

    fn record(&self, path: &Path, content_hash: String, decoded: DecodedImage) -> ImageRecord {
        let cropped = autocrop(&decoded.image);
        let info = ImageInfo::from_crop(&decoded.image, &cropped, &self.color);
        let fingerprint = self.fingerprinter.fingerprint_cropped(&cropped);
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        ImageRecord {
            file_path: path.to_path_buf(),
            file_name,
            sort_key: filename_key(&path.to_string_lossy()),
            content_hash,
            format: format_to_string(decoded.format),
            file_size: decoded.file_size,
            info,
            fingerprint,
        }
    }
}

async fn read(path: &Path) -> PipelineResult<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| read_error(path, e))
}

fn read_error(path: &Path, e: std::io::Error) -> PipelineError {
    if e.kind() == std::io::ErrorKind::NotFound {
        PipelineError::FileNotFound(path.to_path_buf())
    } else {
        PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot read file: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prep::BoundingBox;
    use crate::raw::PixelMode;
    use image::{DynamicImage, Rgb, RgbImage};

    /// White canvas with a colored block at (3..7, 2..5).
    fn write_padded(path: &Path) {
        let img = RgbImage::from_fn(12, 9, |x, y| {
            if (3..7).contains(&x) && (2..5).contains(&y) {
                Rgb([200, 30, 30])
            } else {
                Rgb([255, 255, 255])
            }
        });
        DynamicImage::ImageRgb8(img).save(path).unwrap();
    }

    #[tokio::test]
    async fn test_process_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slide-4.png");
        write_padded(&path);

        let processor = ImageProcessor::new(&Config::default());
        let record = processor.process(&path).await.unwrap();

        assert_eq!(record.file_name, "slide-4.png");
        assert!(record.sort_key.ends_with("slide-000004.png"));
        assert_eq!(record.format, "png");
        assert_eq!(record.info.mode, PixelMode::Rgb);
        assert!(record.info.is_color);
        assert_eq!(
            record.info.crop,
            BoundingBox {
                min_x: 3,
                min_y: 2,
                max_x: 6,
                max_y: 4
            }
        );
        assert_eq!(record.content_hash, ContentHasher::hash_file(&path).unwrap());

        let decoded = processor.load(&path).await.unwrap();
        assert_eq!(
            record.fingerprint,
            processor.fingerprinter().fingerprint(&decoded.image)
        );
        assert_eq!(
            record.info,
            ImageInfo::analyze(&decoded.image, &ColorConfig::default())
        );
    }

    #[tokio::test]
    async fn test_process_missing_file() {
        let processor = ImageProcessor::new(&Config::default());
        let err = processor
            .process(Path::new("/nonexistent/slide-1.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }

    #[test]
    fn test_batch_matches_single_and_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("a-1.png");
        let bad = dir.path().join("a-2.png");
        write_padded(&good);
        std::fs::write(&bad, b"not a png").unwrap();

        let processor = ImageProcessor::new(&Config::default());
        let files = processor.discover(dir.path());
        assert_eq!(files.len(), 2);

        let results = processor.process_batch(&files);
        assert_eq!(results.len(), 2);
        let first = results[0].as_ref().unwrap();
        assert_eq!(first.file_name, "a-1.png");
        assert_eq!(
            first.fingerprint,
            processor.process_blocking(&good).unwrap().fingerprint
        );
        assert!(results[1].is_err());
    }
}
