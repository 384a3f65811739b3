//! Fuzzy recall of near-duplicate images.
//!
//! Images are reduced to a [`Fingerprint`] (autocrop, color class, perceptual
//! hash of the luminance plane) and stored in a [`RecallIndex`] that answers
//! Hamming-radius queries.

pub mod fingerprint;
pub mod index;

pub use fingerprint::{Fingerprint, Fingerprinter};
pub use index::{DuplicateGroup, RecallId, RecallIndex, RecallMatch, SharedRecallIndex};
