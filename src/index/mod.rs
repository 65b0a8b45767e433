//! In-memory similarity index.
//!
//! Provides the coefficient bucket index, the dense record store, the query
//! engine and the `ImageIndex` that keeps them in sync with durable storage.

pub mod buckets;
pub mod manager;
pub mod query;
pub mod records;
pub mod shared;
pub mod weights;

// Re-export the main types at the module level so callers can write
// `use crate::index::{ImageIndex, SharedIndex}`.
pub use buckets::BucketIndex;
pub use manager::ImageIndex;
pub use query::QueryEngine;
pub use records::{ImageRecords, ImageSlot};
pub use shared::SharedIndex;
