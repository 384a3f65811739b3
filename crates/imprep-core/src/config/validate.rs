//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

/// Largest supported hash grid edge.
const MAX_HASH_SIZE: u32 = 64;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.parallel_workers must be > 0".into(),
            ));
        }
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must not be empty".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        if self.recall.hash_size < 2 || self.recall.hash_size > MAX_HASH_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "recall.hash_size must be between 2 and {MAX_HASH_SIZE}"
            )));
        }
        if self.recall.bands == 0 {
            return Err(ConfigError::ValidationError(
                "recall.bands must be > 0".into(),
            ));
        }
        if self.recall.bands <= self.recall.max_distance as usize {
            tracing::warn!(
                "recall.bands ({}) <= recall.max_distance ({}); default-radius queries will scan every entry",
                self.recall.bands,
                self.recall.max_distance
            );
        }
        if !matches!(self.output.format.as_str(), "json" | "jsonl") {
            return Err(ConfigError::ValidationError(
                "output.format must be \"json\" or \"jsonl\"".into(),
            ));
        }
        Ok(())
    }
}
