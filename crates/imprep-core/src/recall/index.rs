//! Banded multi-index over fingerprints for Hamming-radius queries.
//!
//! Each fingerprint's bits are split into `bands` contiguous runs and every
//! run is bucketed. Two fingerprints within distance `d` of each other
//! differ in at most `d` bands, so when `d` is smaller than the band count at
//! least one band matches exactly and the union of the query's band buckets
//! holds every true match. Larger radii fall back to a full scan.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::ops::Range;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use image::DynamicImage;
use rayon::prelude::*;
use serde::Serialize;

use super::fingerprint::{Fingerprint, Fingerprinter};
use crate::config::{ColorConfig, Config, RecallConfig};
use crate::error::ImageError;
use crate::prep::filename_key;
use crate::raw::RawImage;

/// Identifier types the index can store.
///
/// The index treats identifiers as opaque; `recall_name` is only used to
/// order equally distant matches via [`filename_key`].
pub trait RecallId: Clone + Eq + Hash {
    fn recall_name(&self) -> Cow<'_, str>;
}

impl RecallId for String {
    fn recall_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl RecallId for &str {
    fn recall_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl RecallId for PathBuf {
    fn recall_name(&self) -> Cow<'_, str> {
        self.to_string_lossy()
    }
}

/// One query hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecallMatch<K> {
    /// Identifier of the stored image
    pub id: K,
    /// Hamming distance to the query fingerprint
    pub distance: u32,
}

/// A canonical image and its near-duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup<K> {
    /// Member with the smallest filename key
    pub canonical: K,
    /// Other members with their distance to the canonical image
    pub duplicates: Vec<RecallMatch<K>>,
}

/// Index shared between threads: mutations take the write lock, queries the
/// read lock.
pub type SharedRecallIndex<K> = Arc<RwLock<RecallIndex<K>>>;

/// Growable collection of fingerprints answering near-duplicate queries.
pub struct RecallIndex<K: RecallId> {
    fingerprinter: Fingerprinter,
    bands: usize,
    match_across_color: bool,
    /// Byte length shared by every stored fingerprint, fixed by the first insert
    hash_len: Option<usize>,
    entries: HashMap<K, Fingerprint>,
    buckets: Vec<HashMap<Vec<u8>, HashSet<K>>>,
}

impl<K: RecallId> RecallIndex<K> {
    /// Create an empty index.
    pub fn new(recall: &RecallConfig, color: &ColorConfig) -> Self {
        Self {
            fingerprinter: Fingerprinter::new(recall, color),
            bands: recall.bands.max(1),
            match_across_color: recall.match_across_color,
            hash_len: None,
            entries: HashMap::new(),
            buckets: Vec::new(),
        }
    }

    /// Create an empty index from the full configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.recall, &config.color)
    }

    /// Wrap the index for use from several threads.
    pub fn into_shared(self) -> SharedRecallIndex<K> {
        Arc::new(RwLock::new(self))
    }

    /// The fingerprinter used for `insert` and `query`.
    pub fn fingerprinter(&self) -> &Fingerprinter {
        &self.fingerprinter
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &K) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &K) -> Option<&Fingerprint> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &Fingerprint)> {
        self.entries.iter()
    }

    /// Fingerprint `image` and store it under `id`.
    ///
    /// Returns the fingerprint previously stored under `id`, if any.
    pub fn insert(&mut self, id: K, image: &RawImage) -> Option<Fingerprint> {
        let fingerprint = self.fingerprinter.fingerprint(image);
        self.store(id, fingerprint)
    }

    /// Fingerprint a decoded `DynamicImage` and store it under `id`.
    pub fn insert_image(
        &mut self,
        id: K,
        image: &DynamicImage,
    ) -> Result<Option<Fingerprint>, ImageError> {
        let fingerprint = self.fingerprinter.fingerprint_dynamic(image)?;
        Ok(self.store(id, fingerprint))
    }

    /// Store a precomputed fingerprint under `id`.
    ///
    /// Fails if the fingerprint's length differs from those already stored.
    pub fn insert_fingerprint(
        &mut self,
        id: K,
        fingerprint: Fingerprint,
    ) -> Result<Option<Fingerprint>, ImageError> {
        self.check_len(&fingerprint)?;
        Ok(self.store(id, fingerprint))
    }

    /// Fingerprint many images in parallel, then store them.
    ///
    /// Returns the number of identifiers that replaced an existing entry.
    pub fn extend_par(&mut self, items: Vec<(K, RawImage)>) -> usize
    where
        K: Send + Sync,
    {
        let fingerprinter = &self.fingerprinter;
        let computed: Vec<(K, Fingerprint)> = items
            .into_par_iter()
            .map(|(id, image)| {
                let fingerprint = fingerprinter.fingerprint(&image);
                (id, fingerprint)
            })
            .collect();
        computed
            .into_iter()
            .filter_map(|(id, fingerprint)| self.store(id, fingerprint))
            .count()
    }

    /// Delete the entry for `id`; no-op if absent.
    pub fn remove(&mut self, id: &K) -> Option<Fingerprint> {
        let fingerprint = self.entries.remove(id)?;
        self.unbucket(id, &fingerprint);
        Some(fingerprint)
    }

    /// Every stored identifier within `max_distance` of `image`.
    ///
    /// Matches are ordered by ascending distance, then by filename key.
    pub fn query(&self, image: &RawImage, max_distance: u32) -> Vec<RecallMatch<K>> {
        let fingerprint = self.fingerprinter.fingerprint(image);
        self.matches(&fingerprint, max_distance)
    }

    /// Query with a decoded `DynamicImage`.
    pub fn query_image(
        &self,
        image: &DynamicImage,
        max_distance: u32,
    ) -> Result<Vec<RecallMatch<K>>, ImageError> {
        let fingerprint = self.fingerprinter.fingerprint_dynamic(image)?;
        Ok(self.matches(&fingerprint, max_distance))
    }

    /// Query with a precomputed fingerprint.
    pub fn query_fingerprint(
        &self,
        fingerprint: &Fingerprint,
        max_distance: u32,
    ) -> Result<Vec<RecallMatch<K>>, ImageError> {
        self.check_len(fingerprint)?;
        Ok(self.matches(fingerprint, max_distance))
    }

    /// Group stored images into near-duplicate clusters.
    ///
    /// Identifiers are visited in filename-key order; each unvisited one
    /// claims every unvisited match within `max_distance`. Singletons are
    /// omitted.
    pub fn duplicate_groups(&self, max_distance: u32) -> Vec<DuplicateGroup<K>> {
        let mut ids: Vec<&K> = self.entries.keys().collect();
        ids.sort_by_cached_key(|id| sort_key(*id));

        let mut claimed: HashSet<&K> = HashSet::new();
        let mut groups = Vec::new();
        for id in ids {
            if claimed.contains(id) {
                continue;
            }
            claimed.insert(id);
            let fingerprint = &self.entries[id];
            let duplicates: Vec<RecallMatch<K>> = self
                .matches(fingerprint, max_distance)
                .into_iter()
                .filter(|m| !claimed.contains(&m.id))
                .collect();
            if duplicates.is_empty() {
                continue;
            }
            for m in &duplicates {
                if let Some((key, _)) = self.entries.get_key_value(&m.id) {
                    claimed.insert(key);
                }
            }
            groups.push(DuplicateGroup {
                canonical: id.clone(),
                duplicates,
            });
        }
        groups
    }

    fn check_len(&self, fingerprint: &Fingerprint) -> Result<(), ImageError> {
        match self.hash_len {
            Some(expected) if expected != fingerprint.as_bytes().len() => {
                Err(ImageError::IncompatibleFingerprint {
                    expected,
                    actual: fingerprint.as_bytes().len(),
                })
            }
            _ => Ok(()),
        }
    }

    fn store(&mut self, id: K, fingerprint: Fingerprint) -> Option<Fingerprint> {
        let len = *self.hash_len.get_or_insert(fingerprint.as_bytes().len());
        if self.buckets.is_empty() {
            self.buckets = vec![HashMap::new(); band_ranges(len * 8, self.bands).len()];
        }

        let previous = self.entries.remove(&id);
        if let Some(old) = &previous {
            self.unbucket(&id, old);
        }
        for (bucket, range) in self.buckets.iter_mut().zip(band_ranges(len * 8, self.bands)) {
            bucket
                .entry(band_key(fingerprint.as_bytes(), range))
                .or_default()
                .insert(id.clone());
        }
        self.entries.insert(id, fingerprint);
        previous
    }

    fn unbucket(&mut self, id: &K, fingerprint: &Fingerprint) {
        let Some(len) = self.hash_len else {
            return;
        };
        for (bucket, range) in self.buckets.iter_mut().zip(band_ranges(len * 8, self.bands)) {
            let band = band_key(fingerprint.as_bytes(), range);
            if let Some(ids) = bucket.get_mut(&band) {
                ids.remove(id);
                if ids.is_empty() {
                    bucket.remove(&band);
                }
            }
        }
    }

    /// Candidates sharing at least one band with `fingerprint`, or every
    /// entry when the radius is too wide for the pigeonhole bound.
    fn candidates(&self, fingerprint: &Fingerprint, max_distance: u32) -> Vec<&K> {
        let Some(len) = self.hash_len else {
            return Vec::new();
        };
        if !self.is_banded(max_distance) {
            return self.entries.keys().collect();
        }
        let mut seen: HashSet<&K> = HashSet::new();
        for (bucket, range) in self.buckets.iter().zip(band_ranges(len * 8, self.bands)) {
            if let Some(ids) = bucket.get(&band_key(fingerprint.as_bytes(), range)) {
                seen.extend(ids.iter());
            }
        }
        seen.into_iter().collect()
    }

    /// Whether a query at `max_distance` can be answered from the buckets.
    fn is_banded(&self, max_distance: u32) -> bool {
        self.hash_len
            .is_some_and(|len| (max_distance as usize) < band_ranges(len * 8, self.bands).len())
    }

    fn matches(&self, fingerprint: &Fingerprint, max_distance: u32) -> Vec<RecallMatch<K>> {
        let mut found: Vec<(u32, String, &K)> = self
            .candidates(fingerprint, max_distance)
            .into_iter()
            .filter_map(|id| {
                let stored = &self.entries[id];
                fingerprint
                    .distance(stored, self.match_across_color)
                    .filter(|&d| d <= max_distance)
                    .map(|d| (d, sort_key(id), id))
            })
            .collect();
        found.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.recall_name().cmp(&b.2.recall_name()))
        });
        tracing::trace!("Query radius {} -> {} matches", max_distance, found.len());
        found
            .into_iter()
            .map(|(distance, _, id)| RecallMatch {
                id: id.clone(),
                distance,
            })
            .collect()
    }
}

fn sort_key<K: RecallId>(id: &K) -> String {
    filename_key(&id.recall_name())
}

/// Split `bits` hash bits into at most `bands` contiguous, nearly equal ranges.
fn band_ranges(bits: usize, bands: usize) -> Vec<Range<usize>> {
    let count = bands.min(bits).max(1);
    (0..count)
        .map(|i| (i * bits / count)..((i + 1) * bits / count))
        .collect()
}

/// The bits of `bytes` in `range`, packed MSB-first.
fn band_key(bytes: &[u8], range: Range<usize>) -> Vec<u8> {
    let mut key = vec![0u8; range.len().div_ceil(8)];
    for (i, bit) in range.enumerate() {
        if bytes[bit / 8] & (0x80 >> (bit % 8)) != 0 {
            key[i / 8] |= 0x80 >> (i % 8);
        }
    }
    key
}
