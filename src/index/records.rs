//! Dense per-image record store indexed by internal id.

use crate::error::{HaarIndexError, Result};
use crate::signature::NUM_CHANNELS;
use crate::types::{ImageId, PostId, Score};

/// Default number of slots added whenever an id exceeds capacity.
pub const DEFAULT_RECORD_CHUNK: usize = 50_000;

/// In-memory state of one internal id slot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ImageSlot {
    /// Never assigned, or beyond the last assigned id.
    #[default]
    Vacant,
    /// Indexed image.
    Live {
        post_id: PostId,
        avgl: [Score; NUM_CHANNELS],
    },
    /// Removed image; the slot is never reused.
    Deleted,
}

impl ImageSlot {
    pub fn is_live(&self) -> bool {
        matches!(self, ImageSlot::Live { .. })
    }
}

/// Growable array of [`ImageSlot`]s, grown in fixed chunks.
#[derive(Debug, Clone)]
pub struct ImageRecords {
    slots: Vec<ImageSlot>,
    chunk: usize,
    live: usize,
}

impl Default for ImageRecords {
    fn default() -> Self {
        Self::new(DEFAULT_RECORD_CHUNK)
    }
}

impl ImageRecords {
    /// Create an empty store that grows `chunk` slots past the requested id.
    pub fn new(chunk: usize) -> Self {
        Self {
            slots: Vec::new(),
            chunk: chunk.max(1),
            live: 0,
        }
    }

    /// Record `id` as live, growing the array first if needed.
    pub fn upsert(
        &mut self,
        id: ImageId,
        post_id: PostId,
        avglf: &[f64; NUM_CHANNELS],
    ) -> Result<()> {
        let idx = id as usize;
        if idx >= self.slots.len() {
            self.grow(idx)?;
        }
        if !self.slots[idx].is_live() {
            self.live += 1;
        }
        self.slots[idx] = ImageSlot::Live {
            post_id,
            avgl: [avglf[0] as Score, avglf[1] as Score, avglf[2] as Score],
        };
        Ok(())
    }

    fn grow(&mut self, idx: usize) -> Result<()> {
        let requested = idx
            .checked_add(self.chunk)
            .ok_or(HaarIndexError::CapacityExhausted { requested: usize::MAX })?;
        tracing::debug!(size = self.slots.len(), requested, "growing record store");
        self.slots
            .try_reserve_exact(requested - self.slots.len())
            .map_err(|_| HaarIndexError::CapacityExhausted { requested })?;
        self.slots.resize(requested, ImageSlot::Vacant);
        Ok(())
    }

    /// True unless `id` holds a live record. Ids beyond capacity count as deleted.
    pub fn is_deleted(&self, id: ImageId) -> bool {
        !self.get(id).is_live()
    }

    /// Tombstone `id`. Unknown ids are ignored.
    pub fn mark_deleted(&mut self, id: ImageId) {
        if let Some(slot) = self.slots.get_mut(id as usize) {
            if slot.is_live() {
                self.live -= 1;
            }
            *slot = ImageSlot::Deleted;
        }
    }

    pub fn get(&self, id: ImageId) -> ImageSlot {
        self.slots.get(id as usize).copied().unwrap_or_default()
    }

    /// Current capacity, including vacant and deleted slots.
    pub fn count(&self) -> usize {
        self.slots.len()
    }

    /// Number of live records.
    pub fn live_count(&self) -> usize {
        self.live
    }

    pub fn slots(&self) -> &[ImageSlot] {
        &self.slots
    }

    pub fn clear(&mut self) {
        self.slots = Vec::new();
        self.live = 0;
    }
}
