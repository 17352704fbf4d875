//! Link issuance, resolution and direct-link fallback.

use std::sync::Arc;
use std::time::Duration;

use skydisk_backend::{
    LocalBackend, MemoryObjectClient, ObjectStoreBackend, StorageBackend, byte_stream,
};
use skydisk_catalog::{CatalogStore, MemoryCatalog};
use skydisk_core::{CatalogEntry, DiskError, StorageSource, StorageType};
use skydisk_links::{DirectLink, LinkIssuer, TOKEN_LENGTH};

const BASE: &str = "https://disk.example.com";

struct Fixture {
    _dir: tempfile::TempDir,
    catalog: Arc<MemoryCatalog>,
    issuer: LinkIssuer,
    source: StorageSource,
    file: CatalogEntry,
}

async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Arc::new(MemoryCatalog::new());
    let source = catalog
        .insert_source(StorageSource::new(
            "local-default",
            StorageType::Local,
            dir.path().to_string_lossy().into_owned(),
        ))
        .await
        .unwrap();
    let draft = LocalBackend::new()
        .store(&source, "", "a.txt", None, None, byte_stream(b"a".to_vec()))
        .await
        .unwrap();
    let file = catalog
        .insert_entry(CatalogEntry::from_draft(draft))
        .await
        .unwrap();
    let issuer = LinkIssuer::new(catalog.clone(), BASE);
    Fixture {
        _dir: dir,
        catalog,
        issuer,
        source,
        file,
    }
}

#[tokio::test]
async fn test_link_without_ttl_never_expires() {
    let f = fixture().await;
    for ttl in [None, Some(Duration::ZERO)] {
        let link = f.issuer.create(&f.file, ttl, None).await.unwrap();
        assert_eq!(link.token.len(), TOKEN_LENGTH);
        assert!(link.expires_at.is_none());
        let resolved = f.issuer.resolve(&link.token, None).await.unwrap();
        assert_eq!(resolved.entry.id, f.file.id);
        assert_eq!(resolved.source.id, f.source.id);
    }
}

#[tokio::test]
async fn test_link_expires_after_ttl() {
    let f = fixture().await;
    let link = f
        .issuer
        .create(&f.file, Some(Duration::from_secs(1)), None)
        .await
        .unwrap();
    assert!(f.issuer.resolve(&link.token, None).await.is_ok());

    tokio::time::sleep(Duration::from_millis(1_100)).await;
    let err = f.issuer.resolve(&link.token, None).await.unwrap_err();
    assert!(matches!(err, DiskError::Expired { .. }));

    assert_eq!(f.issuer.cleanup_expired().await.unwrap(), 1);
    assert!(matches!(
        f.issuer.resolve(&link.token, None).await,
        Err(DiskError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_access_code_is_enforced() {
    let f = fixture().await;
    let link = f
        .issuer
        .create(&f.file, None, Some("open-sesame"))
        .await
        .unwrap();
    assert_eq!(link.access_code.as_deref(), Some("open-sesame"));

    for bad in [
        None,
        Some("wrong"),
        Some(""),
        Some("open-sesame!"),
        Some(" open-sesame"),
        Some("open-sesame "),
    ] {
        let err = f.issuer.resolve(&link.token, bad).await.unwrap_err();
        assert!(matches!(err, DiskError::AccessDenied { .. }), "{bad:?}");
    }
    assert!(f.issuer.resolve(&link.token, Some("open-sesame")).await.is_ok());
}

#[tokio::test]
async fn test_access_code_is_kept_as_given() {
    let f = fixture().await;
    let link = f.issuer.create(&f.file, None, Some(" pad ")).await.unwrap();
    assert_eq!(link.access_code.as_deref(), Some(" pad "));

    let err = f.issuer.resolve(&link.token, Some("pad")).await.unwrap_err();
    assert!(matches!(err, DiskError::AccessDenied { .. }));
    assert!(f.issuer.resolve(&link.token, Some(" pad ")).await.is_ok());
}

#[tokio::test]
async fn test_blank_access_code_means_none() {
    let f = fixture().await;
    let link = f.issuer.create(&f.file, None, Some("   ")).await.unwrap();
    assert!(link.access_code.is_none());
    assert!(f.issuer.resolve(&link.token, Some("anything")).await.is_ok());
}

#[tokio::test]
async fn test_unrepresentable_lifetime_is_rejected() {
    let f = fixture().await;
    let err = f
        .issuer
        .create(&f.file, Some(Duration::MAX), None)
        .await
        .unwrap_err();
    assert!(matches!(err, DiskError::InvalidArgument(_)));
    assert!(err.is_client_fault());
    assert!(f.issuer.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_directories_cannot_be_linked() {
    let f = fixture().await;
    let dir = f
        .catalog
        .insert_entry(CatalogEntry::directory(f.source.id, "", "docs"))
        .await
        .unwrap();
    assert!(matches!(
        f.issuer.create(&dir, None, None).await,
        Err(DiskError::InvalidTarget(_))
    ));
    assert!(matches!(
        f.issuer
            .direct_link(&dir, &f.source, &LocalBackend::new(), None)
            .await,
        Err(DiskError::InvalidTarget(_))
    ));
}

#[tokio::test]
async fn test_unknown_token() {
    let f = fixture().await;
    assert!(matches!(
        f.issuer.resolve("doesnotexist", None).await,
        Err(DiskError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_list_links_newest_first() {
    let f = fixture().await;
    let first = f.issuer.create(&f.file, None, None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = f.issuer.create(&f.file, None, None).await.unwrap();
    let links = f.issuer.list().await.unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].id, second.id);
    assert_eq!(links[1].id, first.id);
}

#[tokio::test]
async fn test_direct_link_falls_back_for_local() {
    let f = fixture().await;
    let backend = LocalBackend::new();

    let link = f
        .issuer
        .direct_link(&f.file, &f.source, &backend, None)
        .await
        .unwrap();
    assert_eq!(
        link,
        DirectLink::Download(format!("{BASE}/api/files/{}/download", f.file.id))
    );

    let link = f
        .issuer
        .direct_link(&f.file, &f.source, &backend, Some(Duration::from_secs(600)))
        .await
        .unwrap();
    let DirectLink::ShortLink { url, token } = link else {
        panic!("expected a short link");
    };
    assert_eq!(url, format!("{BASE}/s/{token}"));
    assert!(f.issuer.resolve(&token, None).await.is_ok());
}

#[tokio::test]
async fn test_direct_link_prefers_presigned_url() {
    let f = fixture().await;
    let client = Arc::new(MemoryObjectClient::new("cloud-disk"));
    let backend = ObjectStoreBackend::with_client(client.clone());
    let source = StorageSource::new(
        "minio-default",
        StorageType::ObjectStore,
        r#"{"endpoint":"http://localhost:9000","bucket":"cloud-disk","accessKey":"a","secretKey":"s"}"#,
    );
    let entry = CatalogEntry::from_draft(
        backend
            .store(&source, "", "b.txt", None, None, byte_stream(b"b".to_vec()))
            .await
            .unwrap(),
    );

    let link = f
        .issuer
        .direct_link(&entry, &source, &backend, Some(Duration::from_secs(600)))
        .await
        .unwrap();
    assert!(matches!(link, DirectLink::Presigned(_)));
    assert!(link.url().starts_with("memory://cloud-disk/b.txt"));

    client.fail_presign();
    let link = f
        .issuer
        .direct_link(&entry, &source, &backend, None)
        .await
        .unwrap();
    assert!(matches!(link, DirectLink::Download(_)));
}
