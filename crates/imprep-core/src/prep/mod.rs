//! Pure image normalization functions.
//!
//! - **filename**: natural sort keys for sequence-numbered files
//! - **border**: border color inference from corner samples
//! - **crop**: bounding-box autocrop against the border color
//! - **color**: color vs. grayscale classification
//! - **info**: per-image summary combining the above

pub mod border;
pub mod color;
pub mod crop;
pub mod filename;
pub mod info;

// Re-exports for convenient access
pub use border::guess_border;
pub use color::is_color;
pub use crop::{autocrop, content_bounds, AutoCrop, BoundingBox};
pub use filename::filename_key;
pub use info::ImageInfo;
