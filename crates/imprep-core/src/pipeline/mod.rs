//! File-level pipeline around the pure normalization functions.
//!
//! - **discovery**: find image files, ordered by filename key
//! - **validate**: size limits and magic-byte checks before decoding
//! - **decode**: decode to a [`RawImage`](crate::raw::RawImage) with a timeout
//! - **hash**: BLAKE3 content hashes for exact duplicates
//! - **processor**: orchestrates the stages into an [`ImageRecord`](crate::types::ImageRecord)

pub mod decode;
pub mod discovery;
pub mod hash;
pub mod processor;
pub mod validate;

// Re-exports for convenient access
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use hash::ContentHasher;
pub use processor::ImageProcessor;
pub use validate::Validator;
