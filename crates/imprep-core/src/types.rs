//! Core data types emitted by the imprep pipeline.

use serde::Serialize;
use std::path::PathBuf;

use crate::prep::ImageInfo;
use crate::recall::{Fingerprint, RecallMatch};

/// Everything the scan learned about one image file.
#[derive(Debug, Clone, Serialize)]
pub struct ImageRecord {
    // === File Identification ===
    /// Path to the source file
    pub file_path: PathBuf,

    /// Just the filename portion
    pub file_name: String,

    /// Natural sort key of the file path
    pub sort_key: String,

    /// BLAKE3 hash for exact-duplicate detection
    pub content_hash: String,

    // === File Properties ===
    /// Detected format ("jpeg", "png", "webp", etc.)
    pub format: String,

    /// File size in bytes
    pub file_size: u64,

    // === Normalization ===
    /// Mode, border, crop box and color class
    #[serde(flatten)]
    pub info: ImageInfo,

    /// Perceptual fingerprint of the autocropped image
    pub fingerprint: Fingerprint,
}

/// Ranked matches for one query image.
#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    /// The query image
    pub query: PathBuf,

    /// Hamming radius used
    pub max_distance: u32,

    /// Matches, nearest first
    pub matches: Vec<RecallMatch<PathBuf>>,
}

/// Processing statistics for a batch run.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ProcessingStats {
    /// Total images processed successfully
    pub succeeded: usize,

    /// Total images that failed
    pub failed: usize,

    /// Processing rate in images per second
    pub images_per_second: f64,

    /// Total processing time in seconds
    pub total_seconds: f64,
}

impl ProcessingStats {
    /// Fill in timing fields from the elapsed wall time.
    pub fn finish(&mut self, elapsed: std::time::Duration) {
        self.total_seconds = elapsed.as_secs_f64();
        self.images_per_second = if self.total_seconds > 0.0 {
            self.succeeded as f64 / self.total_seconds
        } else {
            0.0
        };
    }
}
