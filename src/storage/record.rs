use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use crate::error::{HaarIndexError, Result};
use crate::signature::HaarSignature;
use crate::types::{ImageId, PostId};

use super::traits::StoredImage;

/// One persisted image. Objects are rewritten whole, never patched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageObject {
    pub id: ImageId,
    pub post_id: PostId,
    pub signature: HaarSignature,
    pub created_at: DateTime<Utc>,
    /// xxHash checksum of the bincode-encoded (id, post_id, signature).
    pub checksum: u64,
}

impl ImageObject {
    pub fn new(id: ImageId, post_id: PostId, signature: HaarSignature) -> Result<Self> {
        let checksum = Self::compute_checksum(id, post_id, &signature)?;
        Ok(Self {
            id,
            post_id,
            signature,
            created_at: Utc::now(),
            checksum,
        })
    }

    fn compute_checksum(id: ImageId, post_id: PostId, signature: &HaarSignature) -> Result<u64> {
        let payload = bincode::serialize(&(id, post_id, signature))?;
        Ok(xxh3_64(&payload))
    }

    /// Validate the checksum of this object.
    pub fn validate_checksum(&self) -> Result<()> {
        let expected = Self::compute_checksum(self.id, self.post_id, &self.signature)?;
        if self.checksum != expected {
            return Err(HaarIndexError::ChecksumMismatch {
                expected,
                actual: self.checksum,
            });
        }
        Ok(())
    }

    /// Serialize this object to bincode bytes.
    pub fn to_bytes(&self) -> Result<Bytes> {
        Ok(Bytes::from(bincode::serialize(self)?))
    }

    /// Deserialize an object from bincode bytes and verify its checksum.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let object: Self = bincode::deserialize(data)?;
        object.validate_checksum()?;
        Ok(object)
    }

    /// Object name of the image stored for `post_id`.
    pub fn file_name(post_id: PostId) -> String {
        format!("{post_id:020}.img")
    }

    pub fn into_stored(self) -> StoredImage {
        StoredImage {
            id: self.id,
            post_id: self.post_id,
            signature: self.signature,
        }
    }
}
