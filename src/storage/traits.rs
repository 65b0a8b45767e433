//! Durable store contract consumed by the image index.
//!
//! The store is the single source of truth for which images exist and which
//! internal id each one holds. The in-memory index mirrors it and can always
//! be rebuilt from it with [`ImageStore::for_each`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::signature::HaarSignature;
use crate::types::{ImageId, PostId};

/// An image as persisted by the durable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredImage {
    pub id: ImageId,
    pub post_id: PostId,
    pub signature: HaarSignature,
}

/// Trait that every durable image store must satisfy.
///
/// The trait is object-safe (via `async_trait`) so the index can hold an
/// `Arc<dyn ImageStore>` chosen at runtime.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist `signature` for `post_id` under a freshly assigned internal id.
    ///
    /// Ids are dense and strictly increasing; they are never handed out twice,
    /// even after the image holding them is deleted.
    ///
    /// # Errors
    /// Returns `HaarIndexError::IdSpaceExhausted` when no ids remain, or any
    /// storage error raised while writing.
    async fn allocate(&self, post_id: PostId, signature: &HaarSignature) -> Result<ImageId>;

    /// Point lookup by post id. Returns `None` when the post is not stored.
    async fn lookup(&self, post_id: PostId) -> Result<Option<StoredImage>>;

    /// Delete the image stored for `post_id`. Deleting an absent post succeeds.
    async fn delete(&self, post_id: PostId) -> Result<()>;

    /// Visit every stored image in ascending internal-id order.
    ///
    /// Stops at the first error returned by `visit` and propagates it.
    /// Returns the number of images visited.
    async fn for_each(
        &self,
        visit: &mut (dyn FnMut(StoredImage) -> Result<()> + Send),
    ) -> Result<usize>;
}
