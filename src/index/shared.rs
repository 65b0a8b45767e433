use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::Result;
use crate::signature::HaarSignature;
use crate::storage::{ImageStore, StoredImage};
use crate::types::{ImageId, PostId, SimilarityResult};

use super::manager::ImageIndex;

/// Cloneable handle serializing writers against each other and against
/// queries. Writers hold the write lock across their durable-store calls;
/// queries share the read lock.
#[derive(Clone)]
pub struct SharedIndex {
    inner: Arc<RwLock<ImageIndex>>,
}

impl SharedIndex {
    pub fn new(index: ImageIndex) -> Self {
        Self {
            inner: Arc::new(RwLock::new(index)),
        }
    }

    pub async fn add_or_replace(
        &self,
        post_id: PostId,
        signature: &HaarSignature,
    ) -> Result<ImageId> {
        self.inner
            .write()
            .await
            .add_or_replace(post_id, signature)
            .await
    }

    pub async fn add_blob(&self, post_id: PostId, blob: &[u8]) -> Result<ImageId> {
        self.inner.write().await.add_blob(post_id, blob).await
    }

    pub async fn remove(&self, post_id: PostId) -> Result<bool> {
        self.inner.write().await.remove(post_id).await
    }

    pub async fn query(&self, signature: &HaarSignature, numres: usize) -> Vec<SimilarityResult> {
        self.inner.read().await.query(signature, numres)
    }

    pub async fn query_blob(
        &self,
        blob: &[u8],
        numres: usize,
    ) -> Result<Vec<SimilarityResult>> {
        self.inner.read().await.query_blob(blob, numres)
    }

    pub async fn get_by_post_id(&self, post_id: PostId) -> Result<Option<StoredImage>> {
        self.inner.read().await.get_by_post_id(post_id).await
    }

    /// Rebuild from the current store.
    pub async fn rebuild(&self) -> Result<usize> {
        self.inner.write().await.rebuild().await
    }

    /// Switch to `store` and rebuild from it.
    pub async fn load(&self, store: Arc<dyn ImageStore>) -> Result<usize> {
        self.inner.write().await.load(store).await
    }

    pub async fn record_count(&self) -> usize {
        self.inner.read().await.record_count()
    }

    pub async fn live_count(&self) -> usize {
        self.inner.read().await.live_count()
    }
}
