//! Error types for the imprep normalization and recall pipeline.
//!
//! Errors are organized by layer: pixel-level problems (`ImageError`) are
//! raised by the pure preprocessing and recall functions, file-level problems
//! (`PipelineError`) carry the offending path so batch drivers can report and
//! skip a single image without aborting the run.

use std::path::PathBuf;
use thiserror::Error;

use crate::raw::PixelMode;

/// Top-level error type for imprep operations.
#[derive(Error, Debug)]
pub enum PrepError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Pixel grid errors raised outside a file context
    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised by the pixel-level components.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// A pixel mode outside the recognized set
    #[error("Unsupported pixel mode: {0}")]
    UnsupportedMode(String),

    /// Sample buffer length does not match the declared geometry
    #[error("Pixel buffer holds {actual} samples, expected {expected} for {width}x{height} {mode}")]
    BufferSize {
        width: u32,
        height: u32,
        mode: PixelMode,
        expected: usize,
        actual: usize,
    },

    /// A pixel value with the wrong number of channels for the image mode
    #[error("Pixel has {actual} channels, {mode} expects {expected}")]
    ChannelMismatch {
        mode: PixelMode,
        expected: usize,
        actual: usize,
    },

    /// Zero-area images carry no identity and are rejected
    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// A precomputed fingerprint from a differently configured hasher
    #[error("Fingerprint is {actual} bytes, index expects {expected}")]
    IncompatibleFingerprint { expected: usize, actual: usize },

    /// A serialized fingerprint that cannot be parsed
    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(String),
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// The decoded pixels could not be normalized
    #[error("Image error for {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: ImageError,
    },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

/// Convenience type alias for imprep results.
pub type Result<T> = std::result::Result<T, PrepError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
