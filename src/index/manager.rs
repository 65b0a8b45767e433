//! Lifecycle of indexed images.
//!
//! `ImageIndex` keeps the bucket index and the record store in step with the
//! durable store. Every write goes to the store first for id assignment
//! (adds) or lookup (removes), then mirrors the change in memory. Queries
//! only read memory.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use crate::config::IndexConfig;
use crate::error::Result;
use crate::index::buckets::BucketIndex;
use crate::index::query::QueryEngine;
use crate::index::records::ImageRecords;
use crate::metrics;
use crate::signature::HaarSignature;
use crate::storage::{ImageStore, StoredImage};
use crate::types::{ImageId, PostId, SimilarityResult};

/// In-memory similarity index mirroring an [`ImageStore`].
///
/// Mutating methods take `&mut self`; wrap the index in
/// [`SharedIndex`](crate::index::SharedIndex) to share it between tasks.
pub struct ImageIndex {
    store: Arc<dyn ImageStore>,
    buckets: BucketIndex,
    records: ImageRecords,
    config: IndexConfig,
}

impl ImageIndex {
    /// An empty index over `store`. Call [`ImageIndex::rebuild`] to pick up
    /// images already stored, or use [`ImageIndex::open`].
    pub fn new(store: Arc<dyn ImageStore>, config: IndexConfig) -> Self {
        let records = ImageRecords::new(config.record_chunk);
        Self {
            store,
            buckets: BucketIndex::new(),
            records,
            config,
        }
    }

    /// Attach `store` and rebuild the in-memory index from its contents.
    pub async fn open(store: Arc<dyn ImageStore>, config: IndexConfig) -> Result<Self> {
        let mut index = Self::new(store, config);
        index.rebuild().await?;
        Ok(index)
    }

    /// Switch to a different store and rebuild from it.
    pub async fn load(&mut self, store: Arc<dyn ImageStore>) -> Result<usize> {
        self.store = store;
        self.rebuild().await
    }

    /// Discard the in-memory index and re-read every stored image.
    /// Returns the number of images loaded.
    #[instrument(skip(self))]
    pub async fn rebuild(&mut self) -> Result<usize> {
        let started = Instant::now();
        self.buckets.clear();
        self.records = ImageRecords::new(self.config.record_chunk);

        let store = Arc::clone(&self.store);
        let interval = self.config.load_progress_interval.max(1);
        let buckets = &mut self.buckets;
        let records = &mut self.records;

        let loaded = store
            .for_each(&mut |image: StoredImage| {
                index_image(buckets, records, &image)?;
                if image.id % interval == 0 {
                    info!(id = image.id, post_id = image.post_id, "loaded image");
                }
                Ok(())
            })
            .await?;

        metrics::REBUILDS_TOTAL.inc();
        self.publish_live_count();

        info!(
            images = loaded,
            record_slots = self.records.count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "rebuilt index from store"
        );
        Ok(loaded)
    }

    /// Index `signature` under `post_id`, replacing any previous image of
    /// that post. Returns the new internal id.
    #[instrument(skip(self, signature))]
    pub async fn add_or_replace(
        &mut self,
        post_id: PostId,
        signature: &HaarSignature,
    ) -> Result<ImageId> {
        if let Some(old) = self.remove_existing(post_id).await? {
            debug!(old_id = old.id, "replacing existing image");
        }

        let id = self.store.allocate(post_id, signature).await?;
        let image = StoredImage {
            id,
            post_id,
            signature: signature.clone(),
        };
        index_image(&mut self.buckets, &mut self.records, &image)?;

        metrics::IMAGES_ADDED_TOTAL.inc();
        self.publish_live_count();

        debug!(id, colors = signature.num_colors(), "added image to memory and store");
        Ok(id)
    }

    /// Decode a signature blob and index it under `post_id`.
    pub async fn add_blob(&mut self, post_id: PostId, blob: &[u8]) -> Result<ImageId> {
        let signature = HaarSignature::from_bytes(blob)?;
        self.add_or_replace(post_id, &signature).await
    }

    /// Remove `post_id` from memory and from the store.
    ///
    /// Removing a post that is not stored is not an error: it is logged and
    /// `Ok(false)` is returned.
    #[instrument(skip(self))]
    pub async fn remove(&mut self, post_id: PostId) -> Result<bool> {
        match self.remove_existing(post_id).await? {
            Some(_) => Ok(true),
            None => {
                metrics::REMOVE_MISSES_TOTAL.inc();
                warn!(post_id, "couldn't remove post; not in store");
                Ok(false)
            }
        }
    }

    /// Purge the stored image of `post_id` from memory, then delete it from
    /// the store. Returns the purged image, if any.
    async fn remove_existing(&mut self, post_id: PostId) -> Result<Option<StoredImage>> {
        let Some(image) = self.store.lookup(post_id).await? else {
            return Ok(None);
        };

        self.buckets.remove(&image.signature, image.id);
        self.records.mark_deleted(image.id);
        self.store.delete(post_id).await?;

        metrics::IMAGES_REMOVED_TOTAL.inc();
        self.publish_live_count();

        debug!(id = image.id, "removed image from memory and store");
        Ok(Some(image))
    }

    /// Stored image of `post_id`, read from the durable store.
    pub async fn get_by_post_id(&self, post_id: PostId) -> Result<Option<StoredImage>> {
        self.store.lookup(post_id).await
    }

    /// Up to `numres` images most similar to `signature`, best first.
    pub fn query(&self, signature: &HaarSignature, numres: usize) -> Vec<SimilarityResult> {
        metrics::QUERIES_TOTAL.inc();
        let timer = metrics::QUERY_DURATION.start_timer();

        let results = QueryEngine::new(&self.buckets, &self.records).search(signature, numres);

        timer.observe_duration();
        results
    }

    /// Decode a signature blob and query with it.
    pub fn query_blob(&self, blob: &[u8], numres: usize) -> Result<Vec<SimilarityResult>> {
        let signature = HaarSignature::from_bytes(blob)?;
        Ok(self.query(&signature, numres))
    }

    /// Record store capacity: live, deleted and not-yet-assigned slots.
    pub fn record_count(&self) -> usize {
        self.records.count()
    }

    /// Number of images currently indexed.
    pub fn live_count(&self) -> usize {
        self.records.live_count()
    }

    fn publish_live_count(&self) {
        metrics::LIVE_IMAGES
            .with_label_values(&[self.config.name.as_str()])
            .set(self.records.live_count() as i64);
    }

    pub fn buckets(&self) -> &BucketIndex {
        &self.buckets
    }

    pub fn records(&self) -> &ImageRecords {
        &self.records
    }

    pub fn store(&self) -> &Arc<dyn ImageStore> {
        &self.store
    }
}

fn index_image(
    buckets: &mut BucketIndex,
    records: &mut ImageRecords,
    image: &StoredImage,
) -> Result<()> {
    records.upsert(image.id, image.post_id, image.signature.avglf())?;
    buckets.add(&image.signature, image.id);
    Ok(())
}
