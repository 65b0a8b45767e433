//! Similarity scoring and bounded top-N selection.
//!
//! Every live record starts from its weighted average-luminance distance to
//! the query. Each query coefficient whose bucket is non-empty then subtracts
//! its weight from every record listed in that bucket, so records sharing
//! more (and lower-frequency) coefficients with the query end up with lower
//! raw scores. The N lowest raw scores are kept in a bounded max-heap and
//! finally normalized against the total weight of all matched buckets.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::index::buckets::BucketIndex;
use crate::index::records::{ImageRecords, ImageSlot};
use crate::index::weights::{coef_weight, luminance_weight};
use crate::signature::HaarSignature;
use crate::types::{ImageId, Score, SimilarityResult};

/// A scored internal id. Ordered by score, then id, so the heap root is the
/// worst candidate kept so far.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: Score,
    id: ImageId,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Read-only view over the in-memory index used to answer one query.
pub struct QueryEngine<'a> {
    buckets: &'a BucketIndex,
    records: &'a ImageRecords,
}

impl<'a> QueryEngine<'a> {
    pub fn new(buckets: &'a BucketIndex, records: &'a ImageRecords) -> Self {
        Self { buckets, records }
    }

    /// Return up to `numres` live records most similar to `sig`, best first.
    pub fn search(&self, sig: &HaarSignature, numres: usize) -> Vec<SimilarityResult> {
        let (scores, scale) = self.raw_scores(sig);
        let heap = self.top_n(&scores, numres);

        let scale = if scale != 0.0 { 1.0 / scale } else { 0.0 };

        // An overflowed raw score times a zero scale would be NaN.
        let normalize = |raw: Score| if scale == 0.0 { 0.0 } else { raw * 100.0 * scale };

        let results: Vec<SimilarityResult> = heap
            .into_sorted_vec()
            .into_iter()
            .filter_map(|c| match self.records.get(c.id) {
                ImageSlot::Live { post_id, .. } => Some(SimilarityResult {
                    post_id,
                    score: normalize(c.score),
                }),
                _ => None,
            })
            .collect();

        debug!(
            candidates = scores.len(),
            returned = results.len(),
            numres,
            scale,
            "query complete"
        );

        results
    }

    /// Raw per-slot scores and the (negative) total weight of matched buckets.
    fn raw_scores(&self, sig: &HaarSignature) -> (Vec<Score>, Score) {
        let colors = sig.num_colors();
        let query_avgl = sig.avglf();

        let mut scores: Vec<Score> = self
            .records
            .slots()
            .iter()
            .map(|slot| match slot {
                ImageSlot::Live { avgl, .. } => (0..colors)
                    .map(|c| luminance_weight(c) * (avgl[c] - query_avgl[c] as Score).abs())
                    .sum::<Score>(),
                _ => 0.0,
            })
            .collect();

        let mut scale: Score = 0.0;
        for (color, coef) in sig.each_coef() {
            let bucket = self.buckets.bucket(color, coef);
            if bucket.is_empty() {
                continue;
            }

            let weight = coef_weight(coef, color);
            scale -= weight;

            for &id in bucket {
                if let Some(score) = scores.get_mut(id as usize) {
                    *score -= weight;
                }
            }
        }

        (scores, scale)
    }

    /// Keep the `numres` smallest scores among live slots.
    fn top_n(&self, scores: &[Score], numres: usize) -> BinaryHeap<Candidate> {
        let mut heap = BinaryHeap::with_capacity(numres.min(scores.len()));
        if numres == 0 {
            return heap;
        }

        for (idx, slot) in self.records.slots().iter().enumerate() {
            if !slot.is_live() {
                continue;
            }
            let candidate = Candidate {
                score: scores[idx],
                id: idx as ImageId,
            };

            if heap.len() < numres {
                heap.push(candidate);
            } else if let Some(mut worst) = heap.peek_mut() {
                if candidate.score < worst.score {
                    *worst = candidate;
                }
            }
        }

        heap
    }
}
