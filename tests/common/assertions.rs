use haarindex::index::BucketIndex;
use haarindex::signature::HaarSignature;
use haarindex::types::{PostId, SimilarityResult};

/// Post ids of `results`, in order.
pub fn post_ids(results: &[SimilarityResult]) -> Vec<PostId> {
    results.iter().map(|r| r.post_id).collect()
}

/// Assert that the top result has the expected post id.
pub fn assert_top_result(results: &[SimilarityResult], expected: PostId) {
    assert!(
        !results.is_empty(),
        "query results are empty, expected top result {expected}"
    );
    assert_eq!(
        results[0].post_id, expected,
        "top result is {}, expected {expected}. Got: {:?}",
        results[0].post_id,
        post_ids(results)
    );
}

/// Assert that `results` never contains `post_id`.
pub fn assert_excludes(results: &[SimilarityResult], post_id: PostId) {
    assert!(
        results.iter().all(|r| r.post_id != post_id),
        "post {post_id} should not be in results. Got: {:?}",
        post_ids(results)
    );
}

/// Assert that normalized scores never increase down the list.
pub fn assert_best_first(results: &[SimilarityResult]) {
    for pair in results.windows(2) {
        assert!(
            pair[0].score >= pair[1].score,
            "results are not ordered best first: {:?}",
            results
        );
    }
}

/// Sorted contents of every bucket touched by `sig`, in slot order.
pub fn bucket_snapshot(buckets: &BucketIndex, sig: &HaarSignature) -> Vec<Vec<u32>> {
    sig.each_coef()
        .map(|(color, coef)| {
            let mut ids = buckets.bucket(color, coef).to_vec();
            ids.sort_unstable();
            ids
        })
        .collect()
}
