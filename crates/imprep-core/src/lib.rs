//! imprep core - normalization and near-duplicate recall for image corpora.
//!
//! Training-image corpora collect the same picture many times over: rescanned,
//! re-exported with a different border, converted to grayscale. This crate
//! provides the pure building blocks for cleaning such a corpus:
//!
//! ```text
//! File → Validate → Decode → RawImage → Autocrop → Color class → Fingerprint → RecallIndex
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use imprep_core::{Config, RawImage, RecallIndex};
//!
//! let config = Config::load()?;
//! let mut index: RecallIndex<String> = RecallIndex::from_config(&config);
//! let image = RawImage::try_from(&image::open("scan-12.png")?)?;
//! index.insert("scan-12.png".to_string(), &image);
//! let matches = index.query(&image, config.recall.max_distance);
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prep;
pub mod raw;
pub mod recall;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, ImageError, PipelineError, PipelineResult, PrepError, Result};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{ContentHasher, DiscoveredFile, ImageProcessor};
pub use prep::{autocrop, filename_key, guess_border, is_color, AutoCrop, BoundingBox, ImageInfo};
pub use raw::{Pixel, PixelMode, RawImage};
pub use recall::{
    DuplicateGroup, Fingerprint, Fingerprinter, RecallId, RecallIndex, RecallMatch,
    SharedRecallIndex,
};
pub use types::{ImageRecord, ProcessingStats, QueryReport};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
