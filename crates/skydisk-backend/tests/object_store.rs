//! Object-store backend against the in-memory client.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use skydisk_backend::{
    BackendRegistry, MemoryObjectClient, ObjectClient, ObjectStoreBackend, ObjectStoreConfig,
    StorageBackend, byte_stream,
};
use skydisk_core::{CatalogEntry, DiskError, StorageSource, StorageType};
use tokio::io::AsyncReadExt;

fn source(base_path: &str) -> StorageSource {
    StorageSource::new(
        "minio-default",
        StorageType::ObjectStore,
        format!(
            r#"{{"endpoint":"http://localhost:9000","bucket":"cloud-disk","accessKey":"ak","secretKey":"sk","basePath":"{base_path}"}}"#
        ),
    )
}

fn backend() -> (Arc<MemoryObjectClient>, ObjectStoreBackend) {
    let client = Arc::new(MemoryObjectClient::new("cloud-disk"));
    let backend = ObjectStoreBackend::with_client(client.clone());
    (client, backend)
}

#[tokio::test]
async fn test_store_uses_deterministic_keys() {
    let (client, backend) = backend();
    let src = source("/tenant/");

    let draft = backend
        .store(
            &src,
            "docs",
            "a.txt",
            Some("text/plain"),
            None,
            byte_stream(b"hello".to_vec()),
        )
        .await
        .unwrap();
    assert_eq!(draft.storage_path, "tenant/docs/a.txt");
    assert_eq!(draft.size, 5);
    assert!(client.has_bucket());

    let (content_type, body) = client.object("tenant/docs/a.txt").unwrap();
    assert_eq!(content_type, "text/plain");
    assert_eq!(body, b"hello");

    let entry = CatalogEntry::from_draft(draft);
    let mut loaded = Vec::new();
    backend
        .load(&src, &entry)
        .await
        .unwrap()
        .read_to_end(&mut loaded)
        .await
        .unwrap();
    assert_eq!(loaded, b"hello");

    backend.delete(&src, &entry).await.unwrap();
    assert!(client.object("tenant/docs/a.txt").is_none());
    backend.delete(&src, &entry).await.unwrap();
}

#[tokio::test]
async fn test_directory_markers() {
    let (client, backend) = backend();
    let src = source("");
    backend.ensure_directory(&src, "").await.unwrap();
    assert!(client.keys().is_empty());

    backend.ensure_directory(&src, "docs/old").await.unwrap();
    let (content_type, body) = client.object("docs/old/").unwrap();
    assert_eq!(content_type, "application/x-directory");
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_bucket_creation_forbidden_is_tolerated() {
    let (client, backend) = backend();
    client.refuse_bucket_creation(403);
    let src = source("");

    backend.ensure_directory(&src, "docs").await.unwrap();
    assert_eq!(client.create_calls(), 1);
    assert!(client.object("docs/").is_some());
}

#[tokio::test]
async fn test_bucket_creation_other_failure_is_fatal() {
    let (client, backend) = backend();
    client.refuse_bucket_creation(500);
    let err = backend.ensure_directory(&source(""), "docs").await.unwrap_err();
    assert!(matches!(err, DiskError::Io { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_key_outside_prefix_is_rejected() {
    let (client, backend) = backend();
    let src = source("tenant");
    client
        .put_object("other/secret.txt", "text/plain", b"x".to_vec())
        .await
        .unwrap();

    let mut entry = CatalogEntry::from_draft(
        backend
            .store(&src, "", "a.txt", None, None, byte_stream(b"x".to_vec()))
            .await
            .unwrap(),
    );
    for tampered in ["other/secret.txt", "tenant/../other/secret.txt", "/tenant/a.txt"] {
        entry.storage_path = tampered.into();
        assert!(matches!(
            backend.load(&src, &entry).await,
            Err(DiskError::InvalidPath(_))
        ));
        assert!(matches!(
            backend.delete(&src, &entry).await,
            Err(DiskError::InvalidPath(_))
        ));
    }
    assert!(client.object("other/secret.txt").is_some());
}

#[tokio::test]
async fn test_presigned_url_clamps_ttl() {
    let (_client, backend) = backend();
    let src = source("");
    let entry = CatalogEntry::from_draft(
        backend
            .store(&src, "", "a.txt", None, None, byte_stream(b"x".to_vec()))
            .await
            .unwrap(),
    );

    let url = backend
        .presigned_url(&src, &entry, Some(Duration::from_secs(5)))
        .await
        .unwrap()
        .unwrap();
    assert!(url.ends_with("X-Amz-Expires=60"));

    let url = backend.presigned_url(&src, &entry, None).await.unwrap().unwrap();
    assert!(url.ends_with("X-Amz-Expires=3600"));
}

#[tokio::test]
async fn test_invalid_config_fails_before_io() {
    let (client, backend) = backend();
    let src = StorageSource::new("broken", StorageType::ObjectStore, r#"{"endpoint":"x"}"#);
    let err = backend.ensure_directory(&src, "docs").await.unwrap_err();
    assert!(matches!(err, DiskError::Config(_)));
    assert_eq!(client.create_calls(), 0);
}

#[tokio::test]
async fn test_client_cache_rebuilds_on_config_change_and_invalidate() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&built);
    let backend = Arc::new(ObjectStoreBackend::with_client_factory(Arc::new(move |config: &ObjectStoreConfig| {
        counter.fetch_add(1, Ordering::SeqCst);
        let client: Arc<dyn ObjectClient> = Arc::new(MemoryObjectClient::new(config.bucket.clone()));
        Ok(client)
    })));
    let registry = BackendRegistry::new().with_backend(backend.clone());

    let mut src = source("");
    backend.ensure_directory(&src, "a").await.unwrap();
    backend.ensure_directory(&src, "b").await.unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 1);
    assert_eq!(backend.cached_clients(), 1);

    src.config = src.config.replace("cloud-disk", "other-bucket");
    backend.ensure_directory(&src, "a").await.unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 2);

    registry.invalidate(src.id);
    assert_eq!(backend.cached_clients(), 0);
    backend.ensure_directory(&src, "a").await.unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 3);
}
