//! Input validation before decoding.

use std::io::Read;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Header length needed to recognize every supported signature.
const HEADER_LEN: usize = 12;

/// Validates files before decoding.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Cheap checks ahead of a full decode: the file exists, fits the size
    /// limit and starts with a known image signature.
    pub fn validate(&self, path: &Path) -> Result<(), PipelineError> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }

        let metadata = std::fs::metadata(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot read metadata: {}", e),
        })?;
        self.check_size(path, metadata.len())?;

        let mut file = std::fs::File::open(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot open file: {}", e),
        })?;
        let mut header = [0u8; HEADER_LEN];
        let mut filled = 0;
        while filled < HEADER_LEN {
            let n = file.read(&mut header[filled..]).map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot read header: {}", e),
            })?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Self::check_header(path, &header[..filled])
    }

    /// Validate an in-memory buffer already read from `path`.
    pub fn validate_bytes(&self, path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
        self.check_size(path, bytes.len() as u64)?;
        Self::check_header(path, &bytes[..bytes.len().min(HEADER_LEN)])
    }

    fn check_size(&self, path: &Path, len: u64) -> Result<(), PipelineError> {
        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if len > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: len / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }
        Ok(())
    }

    fn check_header(path: &Path, header: &[u8]) -> Result<(), PipelineError> {
        if header.len() < 4 {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "File too small to be a valid image".to_string(),
            });
        }
        if !is_image_header(header) {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "Unrecognized image format (invalid magic bytes)".to_string(),
            });
        }
        Ok(())
    }
}

/// Whether the leading bytes match a format the decoder supports.
fn is_image_header(header: &[u8]) -> bool {
    match header {
        // JPEG
        [0xFF, 0xD8, 0xFF, ..] => true,
        // PNG
        [0x89, b'P', b'N', b'G', ..] => true,
        // GIF87a / GIF89a
        [b'G', b'I', b'F', b'8', ..] => true,
        // BMP
        [b'B', b'M', ..] => true,
        // TIFF, little- and big-endian, version 42
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => true,
        // WebP: RIFF....WEBP; a truncated RIFF header is left to the decoder
        [b'R', b'I', b'F', b'F', _, _, _, _, rest @ ..] if rest.len() >= 4 => rest[..4] == *b"WEBP",
        [b'R', b'I', b'F', b'F', ..] => true,
        _ => false,
    }
}
