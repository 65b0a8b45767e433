//! Coefficient-bucket inverted index.
//!
//! Maps `(color, sign, magnitude)` of a signature coefficient to the list of
//! internal ids whose signatures contain that coefficient. Lists keep
//! insertion order and may hold the same id more than once.

use crate::signature::{HaarSignature, NUM_CHANNELS};
use crate::types::ImageId;

/// One inverted-index entry.
pub type Bucket = Vec<ImageId>;

/// Inverted index from signed coefficients to internal ids.
///
/// Each `(color, sign)` table only grows up to the largest magnitude that has
/// been referenced, so memory tracks the observed coefficient range.
#[derive(Debug, Default, Clone)]
pub struct BucketIndex {
    /// `tables[color][sign]` indexed by coefficient magnitude.
    tables: [[Vec<Bucket>; 2]; NUM_CHANNELS],
}

fn split(coef: i16) -> (usize, usize) {
    (usize::from(coef < 0), coef.unsigned_abs() as usize)
}

impl BucketIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` to the bucket of every coefficient in `sig`.
    pub fn add(&mut self, sig: &HaarSignature, id: ImageId) {
        for (color, coef) in sig.each_coef() {
            self.bucket_mut(color, coef).push(id);
        }
    }

    /// Remove every occurrence of `id` from every bucket touched by `sig`.
    pub fn remove(&mut self, sig: &HaarSignature, id: ImageId) {
        for (color, coef) in sig.each_coef() {
            self.bucket_mut(color, coef).retain(|&other| other != id);
        }
    }

    /// The bucket for `coef` in `color`, allocated on first reference.
    pub fn bucket_mut(&mut self, color: usize, coef: i16) -> &mut Bucket {
        let (sign, magnitude) = split(coef);
        let table = &mut self.tables[color][sign];
        if magnitude >= table.len() {
            table.resize_with(magnitude + 1, Vec::new);
        }
        &mut table[magnitude]
    }

    /// The bucket for `coef` in `color`; empty when never referenced.
    pub fn bucket(&self, color: usize, coef: i16) -> &[ImageId] {
        let (sign, magnitude) = split(coef);
        self.tables[color][sign]
            .get(magnitude)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Drop all buckets.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Total number of id entries across all buckets.
    pub fn entry_count(&self) -> usize {
        self.tables
            .iter()
            .flatten()
            .flatten()
            .map(Vec::len)
            .sum()
    }

    /// Number of entries referencing `id` across all buckets.
    pub fn occurrences(&self, id: ImageId) -> usize {
        self.tables
            .iter()
            .flatten()
            .flatten()
            .map(|bucket| bucket.iter().filter(|&&other| other == id).count())
            .sum()
    }
}
