mod common;

use std::sync::Arc;

use common::signatures::{random_signatures, sequential_signature};

use haarindex::config::StorageConfig;
use haarindex::error::HaarIndexError;
use haarindex::storage::{ImageObject, ImageStore, ObjectImageStore, StoreManifest, StoredImage};

use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::ObjectStore;

#[tokio::test]
async fn test_allocate_assigns_dense_ids_from_one() {
    let store = ObjectImageStore::in_memory();
    let sigs = random_signatures(4, 1);

    for (i, sig) in sigs.iter().enumerate() {
        let id = store.allocate(100 + i as u64, sig).await.unwrap();
        assert_eq!(id, i as u32 + 1);
    }

    let manifest = store.manifest().await.unwrap();
    assert_eq!(manifest.next_id, 5);
    assert_eq!(manifest.allocations, 4);
}

#[tokio::test]
async fn test_ids_are_never_reused() {
    let store = ObjectImageStore::in_memory();
    let sig = sequential_signature(1);

    let first = store.allocate(1, &sig).await.unwrap();
    store.delete(1).await.unwrap();
    let second = store.allocate(1, &sig).await.unwrap();

    assert!(second > first);
}

#[tokio::test]
async fn test_lookup_returns_stored_image() {
    let store = ObjectImageStore::in_memory();
    let sig = sequential_signature(10);
    let id = store.allocate(77, &sig).await.unwrap();

    let image = store.lookup(77).await.unwrap().expect("image should be stored");
    assert_eq!(
        image,
        StoredImage {
            id,
            post_id: 77,
            signature: sig,
        }
    );
    assert!(store.lookup(78).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_absent_post_succeeds() {
    let store = ObjectImageStore::in_memory();
    store.delete(5).await.unwrap();

    store.allocate(5, &sequential_signature(1)).await.unwrap();
    store.delete(5).await.unwrap();
    store.delete(5).await.unwrap();
    assert!(store.lookup(5).await.unwrap().is_none());
}

#[tokio::test]
async fn test_for_each_visits_in_id_order() {
    let store = ObjectImageStore::in_memory();
    let sigs = random_signatures(5, 2);

    // Post ids descend while internal ids ascend, so key order differs from id order.
    for (i, sig) in sigs.iter().enumerate() {
        store.allocate(1000 - i as u64, sig).await.unwrap();
    }
    store.delete(998).await.unwrap();

    let mut seen = Vec::new();
    let count = store
        .for_each(&mut |image| {
            seen.push((image.id, image.post_id));
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(count, 4);
    assert_eq!(seen, vec![(1, 1000), (2, 999), (4, 997), (5, 996)]);
}

#[tokio::test]
async fn test_for_each_stops_on_visitor_error() {
    let store = ObjectImageStore::in_memory();
    for (i, sig) in random_signatures(3, 4).iter().enumerate() {
        store.allocate(i as u64, sig).await.unwrap();
    }

    let mut visited = 0;
    let result = store
        .for_each(&mut |_| {
            visited += 1;
            Err(HaarIndexError::Internal("stop".to_string()))
        })
        .await;

    assert!(matches!(result, Err(HaarIndexError::Internal(_))));
    assert_eq!(visited, 1);
}

#[tokio::test]
async fn test_corrupted_object_fails_checksum() {
    let backend = Arc::new(InMemory::new());
    let store = ObjectImageStore::new(backend.clone(), Path::from("corrupt"));

    let object = ImageObject {
        checksum: 42,
        ..ImageObject::new(1, 9, sequential_signature(1)).unwrap()
    };
    backend
        .put(&store.image_path(9), object.to_bytes().unwrap().into())
        .await
        .unwrap();

    match store.lookup(9).await {
        Err(HaarIndexError::ChecksumMismatch { actual, .. }) => assert_eq!(actual, 42),
        other => panic!("expected ChecksumMismatch, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_garbage_object_is_a_storage_error() {
    let backend = Arc::new(InMemory::new());
    let store = ObjectImageStore::new(backend.clone(), Path::default());

    backend
        .put(&store.image_path(3), bytes::Bytes::from_static(b"xx").into())
        .await
        .unwrap();

    assert!(matches!(
        store.lookup(3).await,
        Err(HaarIndexError::Bincode(_))
    ));
}

#[tokio::test]
async fn test_manifest_json_round_trip() {
    let mut manifest = StoreManifest::new();
    assert_eq!(manifest.allocate_id().unwrap(), 1);
    assert_eq!(manifest.allocate_id().unwrap(), 2);

    let back = StoreManifest::from_bytes(&manifest.to_bytes().unwrap()).unwrap();
    assert_eq!(back.next_id, 3);
    assert_eq!(back.allocations, 2);
}

#[test]
fn test_manifest_id_space_exhaustion() {
    let mut manifest = StoreManifest {
        next_id: u32::MAX,
        ..StoreManifest::new()
    };
    match manifest.allocate_id() {
        Err(e @ HaarIndexError::IdSpaceExhausted { .. }) => assert!(e.is_fatal()),
        other => panic!("expected IdSpaceExhausted, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_local_file_store_persists_across_instances() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = StorageConfig {
        url: format!("file://{}", dir.path().display()),
        prefix: "images-db".to_string(),
    };
    let sig = sequential_signature(1);

    {
        let store = ObjectImageStore::from_config(&config).unwrap();
        assert_eq!(store.allocate(1, &sig).await.unwrap(), 1);
        assert_eq!(store.allocate(2, &sig).await.unwrap(), 2);
        store.delete(1).await.unwrap();
    }

    let store = ObjectImageStore::from_config(&config).unwrap();
    assert!(store.lookup(1).await.unwrap().is_none());
    assert_eq!(store.lookup(2).await.unwrap().unwrap().id, 2);
    assert_eq!(store.allocate(3, &sig).await.unwrap(), 3);
    assert!(dir.path().join("images-db").join("manifest.json").exists());
}

#[tokio::test]
async fn test_failed_image_write_does_not_reuse_id() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = StorageConfig {
        url: format!("file://{}", dir.path().display()),
        prefix: "db".to_string(),
    };
    let store = ObjectImageStore::from_config(&config).unwrap();
    let sigs = random_signatures(3, 11);

    assert_eq!(store.allocate(1, &sigs[0]).await.unwrap(), 1);

    // A directory squatting on the object key makes the image write fail.
    let blocked = dir
        .path()
        .join("db")
        .join("images")
        .join(ImageObject::file_name(2));
    std::fs::create_dir_all(&blocked).unwrap();
    assert!(store.allocate(2, &sigs[1]).await.is_err());
    assert!(store.lookup(2).await.unwrap().is_none());

    // The failed allocation still consumed its id.
    assert_eq!(store.manifest().await.unwrap().next_id, 3);

    std::fs::remove_dir(&blocked).unwrap();
    assert_eq!(store.allocate(3, &sigs[2]).await.unwrap(), 3);

    let mut ids = Vec::new();
    store
        .for_each(&mut |image: StoredImage| {
            ids.push((image.id, image.post_id));
            Ok(())
        })
        .await
        .unwrap();
    assert_eq!(ids, vec![(1, 1), (3, 3)]);
}

#[test]
fn test_from_config_rejects_bad_url() {
    let config = StorageConfig {
        url: "not a url".to_string(),
        prefix: String::new(),
    };
    assert!(matches!(
        ObjectImageStore::from_config(&config),
        Err(HaarIndexError::Url(_))
    ));
}
