use serde::{Deserialize, Serialize};

/// External identifier of an image, owned by the calling service.
pub type PostId = u64;

/// Dense internal identifier assigned by the durable store.
/// Used directly as an index into the in-memory record array.
pub type ImageId = u32;

/// Accumulated similarity score.
pub type Score = f32;

/// A single query hit: the post id and its normalized similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub post_id: PostId,
    pub score: Score,
}
