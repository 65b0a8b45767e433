//! Durable image storage.
//!
//! Provides the `ImageStore` trait the index depends on and an
//! `object_store`-backed implementation.

pub mod manifest;
pub mod object;
pub mod record;
pub mod traits;

pub use manifest::StoreManifest;
pub use object::ObjectImageStore;
pub use record::ImageObject;
pub use traits::{ImageStore, StoredImage};
