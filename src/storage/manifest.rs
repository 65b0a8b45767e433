use bytes::Bytes;
use chrono::{DateTime, Utc};
use object_store::path::Path;
use object_store::ObjectStore;
use serde::{Deserialize, Serialize};

use crate::error::{HaarIndexError, Result};
use crate::types::ImageId;

/// The manifest tracks the id allocator of an image store.
/// Internal ids are never reused, so `next_id` only moves forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreManifest {
    /// Id handed out by the next allocation. Id 0 is never assigned.
    pub next_id: ImageId,
    /// Total allocations performed over the store's lifetime.
    #[serde(default)]
    pub allocations: u64,
    /// Last time the manifest was updated.
    pub updated_at: DateTime<Utc>,
}

impl StoreManifest {
    /// Create a manifest for an empty store.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            allocations: 0,
            updated_at: Utc::now(),
        }
    }

    /// Take the next internal id.
    pub fn allocate_id(&mut self) -> Result<ImageId> {
        let id = self.next_id;
        self.next_id = id
            .checked_add(1)
            .ok_or(HaarIndexError::IdSpaceExhausted { last: id })?;
        self.allocations += 1;
        self.updated_at = Utc::now();
        Ok(id)
    }

    /// Serialize to JSON bytes.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let json = serde_json::to_vec_pretty(self)?;
        Ok(Bytes::from(json))
    }

    /// Deserialize from JSON bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Read the manifest at `path`. Returns None if not found.
    pub async fn read(store: &dyn ObjectStore, path: &Path) -> Result<Option<Self>> {
        match store.get(path).await {
            Ok(result) => {
                let data = result.bytes().await?;
                Ok(Some(Self::from_bytes(&data)?))
            }
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the manifest to `path`.
    pub async fn write(&self, store: &dyn ObjectStore, path: &Path) -> Result<()> {
        let data = self.to_bytes()?;
        store.put(path, data.into()).await?;
        Ok(())
    }
}

impl Default for StoreManifest {
    fn default() -> Self {
        Self::new()
    }
}
