//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of parallel workers for fingerprinting
    pub parallel_workers: usize,

    /// Supported input formats (file extensions)
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
            supported_formats: vec![
                "png".to_string(),
                "jpg".to_string(),
                "jpeg".to_string(),
                "tiff".to_string(),
                "tif".to_string(),
                "webp".to_string(),
                "bmp".to_string(),
                "gif".to_string(),
            ],
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 20000,
            decode_timeout_ms: 10000,
        }
    }
}

/// Color classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Largest per-pixel channel spread still treated as gray.
    /// Absorbs rounding noise from lossy encoders; 0 demands exact equality.
    pub tolerance: u8,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self { tolerance: 2 }
    }
}

/// Perceptual hash algorithm used for fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// Compare each pixel to the mean
    Mean,
    /// Horizontal neighbor gradients
    Gradient,
    /// Vertical neighbor gradients
    VertGradient,
    /// Horizontal and vertical gradients
    DoubleGradient,
    /// Block mean comparison
    Blockhash,
}

impl HashAlgorithm {
    /// Convert to the `image_hasher` algorithm.
    pub fn to_hash_alg(self) -> image_hasher::HashAlg {
        use image_hasher::HashAlg;
        match self {
            HashAlgorithm::Mean => HashAlg::Mean,
            HashAlgorithm::Gradient => HashAlg::Gradient,
            HashAlgorithm::VertGradient => HashAlg::VertGradient,
            HashAlgorithm::DoubleGradient => HashAlg::DoubleGradient,
            HashAlgorithm::Blockhash => HashAlg::Blockhash,
        }
    }
}

/// Fuzzy recall (near-duplicate index) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecallConfig {
    /// Perceptual hash algorithm
    pub algorithm: HashAlgorithm,

    /// Hash grid edge length; fingerprints carry roughly `hash_size²` bits
    pub hash_size: u32,

    /// Number of fingerprint bands in the lookup table.
    /// Queries with a radius below the band count avoid a full scan.
    pub bands: usize,

    /// Default Hamming radius for near-duplicate queries
    pub max_distance: u32,

    /// Allow color images to match grayscale ones
    pub match_across_color: bool,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::DoubleGradient,
            hash_size: 8,
            bands: 8,
            max_distance: 6,
            match_across_color: false,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
