use std::sync::Arc;

use haarindex::config::IndexConfig;
use haarindex::index::ImageIndex;
use haarindex::storage::{ImageStore, ObjectImageStore};

/// An index over a fresh in-memory object store.
pub struct TestHarness {
    pub store: Arc<ObjectImageStore>,
    pub index: ImageIndex,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(IndexConfig::default())
    }

    pub fn with_config(config: IndexConfig) -> Self {
        haarindex::metrics::init();
        let store = Arc::new(ObjectImageStore::in_memory());
        let index = ImageIndex::new(store.clone() as Arc<dyn ImageStore>, config);
        Self { store, index }
    }

    /// A second index rebuilt from the same store.
    pub async fn reopen(&self) -> ImageIndex {
        ImageIndex::open(
            self.store.clone() as Arc<dyn ImageStore>,
            IndexConfig::default(),
        )
        .await
        .expect("reopen should succeed")
    }
}
