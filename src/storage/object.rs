//! [`ImageStore`] backed by an `object_store` bucket or directory.
//!
//! Layout under the configured prefix:
//!
//! ```text
//! {prefix}/manifest.json              id allocator (JSON)
//! {prefix}/images/{post_id:020}.img   one ImageObject per post (bincode)
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectMeta, ObjectStore};
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use url::Url;

use crate::config::StorageConfig;
use crate::error::{HaarIndexError, Result};
use crate::signature::HaarSignature;
use crate::types::{ImageId, PostId};

use super::manifest::StoreManifest;
use super::record::ImageObject;
use super::traits::{ImageStore, StoredImage};

const MANIFEST_FILE: &str = "manifest.json";
const IMAGES_DIR: &str = "images";
const IMAGE_EXTENSION: &str = "img";

/// Durable image store on top of any [`ObjectStore`].
pub struct ObjectImageStore {
    store: Arc<dyn ObjectStore>,
    prefix: Path,
    /// Serializes id allocation and deletes.
    write_lock: Mutex<()>,
}

impl ObjectImageStore {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: Path) -> Self {
        Self {
            store,
            prefix,
            write_lock: Mutex::new(()),
        }
    }

    /// A store that lives only as long as this process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()), Path::default())
    }

    /// Resolve the backend from `config.url` (`memory:///`, `file:///…`,
    /// `s3://…`, …) and nest `config.prefix` below the URL path.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let url = Url::parse(&config.url)?;
        let (store, mut prefix) = object_store::parse_url(&url)?;
        for part in config.prefix.split('/').filter(|p| !p.is_empty()) {
            prefix = prefix.child(part);
        }
        debug!(url = %url, prefix = %prefix, "opened object image store");
        Ok(Self::new(Arc::from(store), prefix))
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    fn manifest_path(&self) -> Path {
        self.prefix.child(MANIFEST_FILE)
    }

    fn images_path(&self) -> Path {
        self.prefix.child(IMAGES_DIR)
    }

    /// Location of the object holding `post_id`.
    pub fn image_path(&self, post_id: PostId) -> Path {
        self.images_path().child(ImageObject::file_name(post_id))
    }

    /// Read the id allocator state, or a fresh manifest for an empty store.
    pub async fn manifest(&self) -> Result<StoreManifest> {
        Ok(StoreManifest::read(self.store.as_ref(), &self.manifest_path())
            .await?
            .unwrap_or_default())
    }

    async fn get(&self, path: &Path) -> Result<Bytes> {
        match self.store.get(path).await {
            Ok(result) => Ok(result.bytes().await?),
            Err(object_store::Error::NotFound { .. }) => Err(HaarIndexError::NotFound {
                key: path.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_image(&self, path: &Path) -> Result<ImageObject> {
        let data = self.get(path).await?;
        ImageObject::from_bytes(&data)
    }

    async fn list_images(&self) -> Result<Vec<ObjectMeta>> {
        let prefix = self.images_path();
        let metas: Vec<ObjectMeta> = self.store.list(Some(&prefix)).try_collect().await?;
        Ok(metas
            .into_iter()
            .filter(|m| m.location.extension() == Some(IMAGE_EXTENSION))
            .collect())
    }
}

#[async_trait]
impl ImageStore for ObjectImageStore {
    #[instrument(skip(self, signature), fields(prefix = %self.prefix))]
    async fn allocate(&self, post_id: PostId, signature: &HaarSignature) -> Result<ImageId> {
        let _guard = self.write_lock.lock().await;

        let mut manifest = self.manifest().await?;
        let id = manifest.allocate_id()?;
        let object = ImageObject::new(id, post_id, signature.clone())?;

        // Reserve the id before the image exists: a failed image write
        // leaves an unused id, never an id shared by two objects.
        manifest
            .write(self.store.as_ref(), &self.manifest_path())
            .await?;
        self.store
            .put(&self.image_path(post_id), object.to_bytes()?.into())
            .await?;

        debug!(id, next_id = manifest.next_id, "stored image");
        Ok(id)
    }

    #[instrument(skip(self), fields(prefix = %self.prefix))]
    async fn lookup(&self, post_id: PostId) -> Result<Option<StoredImage>> {
        match self.read_image(&self.image_path(post_id)).await {
            Ok(object) => Ok(Some(object.into_stored())),
            Err(HaarIndexError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self), fields(prefix = %self.prefix))]
    async fn delete(&self, post_id: PostId) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        match self.store.delete(&self.image_path(post_id)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => {
                debug!("deleted image");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, visit), fields(prefix = %self.prefix))]
    async fn for_each(
        &self,
        visit: &mut (dyn FnMut(StoredImage) -> Result<()> + Send),
    ) -> Result<usize> {
        let metas = self.list_images().await?;

        let mut images = Vec::with_capacity(metas.len());
        for meta in &metas {
            images.push(self.read_image(&meta.location).await?.into_stored());
        }
        images.sort_by_key(|image| image.id);

        let count = images.len();
        for image in images {
            visit(image)?;
        }

        debug!(count, "visited stored images");
        Ok(count)
    }
}
