//! The drive end to end over a real local root and the in-memory object client.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use skydisk_backend::{
    BackendRegistry, LocalBackend, MemoryObjectClient, ObjectStoreBackend, byte_stream,
};
use skydisk_config::Config;
use skydisk_core::{DiskError, LinkId, ShortLink, StorageSource, StorageType};
use skydisk_drive::{DirectLink, Disposition, Drive, FileDownload, LOCAL_SOURCE_NAME};
use tokio::io::AsyncReadExt;

const BASE: &str = "https://disk.example.com";

struct Fixture {
    dir: tempfile::TempDir,
    client: Arc<MemoryObjectClient>,
    drive: Drive,
    local: StorageSource,
    s3: StorageSource,
}

fn config(dir: &tempfile::TempDir) -> Config {
    let mut config = Config::default();
    config.storage.local.base_path = dir.path().join("storage").to_string_lossy().into_owned();
    config.catalog.path = dir.path().join("catalog.json").to_string_lossy().into_owned();
    config.storage.s3.enabled = true;
    config.links.public_base_url = format!("{BASE}/");
    config
}

fn registry(client: &Arc<MemoryObjectClient>) -> BackendRegistry {
    BackendRegistry::new()
        .with_backend(Arc::new(LocalBackend::new()))
        .with_backend(Arc::new(ObjectStoreBackend::with_client(client.clone())))
}

async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(MemoryObjectClient::new("cloud-disk"));
    let drive = Drive::bootstrap_with(&config(&dir), registry(&client))
        .await
        .unwrap();
    let local = drive.find_source(LOCAL_SOURCE_NAME).await.unwrap();
    let s3 = drive.find_source("minio-default").await.unwrap();
    Fixture {
        dir,
        client,
        drive,
        local,
        s3,
    }
}

async fn read_all(mut download: FileDownload) -> Vec<u8> {
    let mut body = Vec::new();
    download.reader.read_to_end(&mut body).await.unwrap();
    body
}

#[tokio::test]
async fn bootstrap_registers_sources_once() {
    let f = fixture().await;
    let sources = f.drive.list_storage_sources().await.unwrap();
    assert_eq!(sources.len(), 2);
    assert_eq!(f.local.storage_type, StorageType::Local);
    assert_eq!(f.s3.storage_type, StorageType::ObjectStore);
    assert!(f.dir.path().join("storage").is_dir());

    // A second bootstrap over the same snapshot adopts the existing sources.
    let again = Drive::bootstrap_with(&config(&f.dir), registry(&f.client))
        .await
        .unwrap();
    let sources = again.list_storage_sources().await.unwrap();
    assert_eq!(sources.len(), 2);
    assert_eq!(again.find_source(LOCAL_SOURCE_NAME).await.unwrap().id, f.local.id);
}

#[tokio::test]
async fn find_source_by_id_or_name() {
    let f = fixture().await;
    let by_id = f.drive.find_source(&f.s3.id.to_string()).await.unwrap();
    assert_eq!(by_id.name, "minio-default");
    let err = f.drive.find_source("nowhere").await.unwrap_err();
    assert!(matches!(err, DiskError::NotFound(_)));
}

#[tokio::test]
async fn upload_browse_and_download() {
    let f = fixture().await;
    let entry = f
        .drive
        .upload(
            f.local.id,
            "/docs/2024/",
            "notes.md",
            None,
            None,
            byte_stream(b"# notes".to_vec()),
        )
        .await
        .unwrap();
    assert_eq!(entry.full_path(), "docs/2024/notes.md");

    let root = f.drive.browse(f.local.id, "").await.unwrap();
    assert_eq!(root.len(), 1);
    assert!(root[0].is_directory);

    let download = f.drive.download(entry.id).await.unwrap();
    assert_eq!(download.content_type, "application/octet-stream");
    assert_eq!(download.disposition, Disposition::Attachment);
    assert_eq!(download.filename, "notes.md");
    assert_eq!(read_all(download).await, b"# notes");

    let preview = f.drive.preview(entry.id).await.unwrap();
    assert_eq!(preview.disposition, Disposition::Inline);

    let err = f.drive.download(root[0].id).await.unwrap_err();
    assert!(matches!(err, DiskError::InvalidTarget(_)));
}

#[tokio::test]
async fn object_store_round_trip_and_presigned_direct_link() {
    let f = fixture().await;
    let entry = f
        .drive
        .upload(
            f.s3.id,
            "photos",
            "cat.jpg",
            Some("image/jpeg"),
            Some(4),
            byte_stream(b"meow".to_vec()),
        )
        .await
        .unwrap();
    assert_eq!(entry.storage_path, "photos/cat.jpg");
    assert!(f.client.keys().contains(&"photos/".to_owned()));

    let download = f.drive.download(entry.id).await.unwrap();
    assert_eq!(download.content_type, "image/jpeg");
    assert_eq!(read_all(download).await, b"meow");

    let link = f.drive.create_direct_link(entry.id, None).await.unwrap();
    assert!(matches!(link, DirectLink::Presigned(_)));
    assert!(link.url().ends_with("X-Amz-Expires=3600"));
}

#[tokio::test]
async fn local_direct_link_falls_back() {
    let f = fixture().await;
    let entry = f
        .drive
        .upload(f.local.id, "", "a.txt", None, None, byte_stream(b"a".to_vec()))
        .await
        .unwrap();

    let download = DirectLink::Download(format!("{BASE}/api/files/{}/download", entry.id));
    let link = f.drive.create_direct_link(entry.id, None).await.unwrap();
    assert_eq!(link, download);
    assert!(f.drive.list_short_links().await.unwrap().is_empty());

    let link = f
        .drive
        .create_direct_link(entry.id, Some(Duration::ZERO))
        .await
        .unwrap();
    assert_eq!(link, download);

    let link = f
        .drive
        .create_direct_link(entry.id, Some(Duration::from_secs(600)))
        .await
        .unwrap();
    let DirectLink::ShortLink { url, token } = link else {
        panic!("expected a short link, got {link:?}");
    };
    assert_eq!(url, format!("{BASE}/s/{token}"));
    assert_eq!(f.drive.list_short_links().await.unwrap().len(), 1);
}

#[tokio::test]
async fn short_link_with_access_code() {
    let f = fixture().await;
    let entry = f
        .drive
        .upload(f.local.id, "share", "plan.txt", Some("text/plain"), None, byte_stream(b"plan".to_vec()))
        .await
        .unwrap();

    let grant = f
        .drive
        .create_short_link(entry.id, Some(Duration::from_secs(600)), Some("4321"))
        .await
        .unwrap();
    assert_eq!(grant.access_code.as_deref(), Some("4321"));
    assert_eq!(grant.url, format!("{BASE}/s/{}", grant.token));

    let err = f
        .drive
        .resolve_short_link(&grant.token, Some("0000"))
        .await
        .unwrap_err();
    assert!(matches!(err, DiskError::AccessDenied { .. }));

    let resolved = f
        .drive
        .resolve_short_link(&grant.token, Some("4321"))
        .await
        .unwrap();
    assert_eq!(resolved.entry.id, entry.id);
    assert_eq!(resolved.source.id, f.local.id);

    let opened = f
        .drive
        .open_short_link(&grant.token, Some("4321"))
        .await
        .unwrap();
    assert_eq!(opened.disposition, Disposition::Inline);
    assert_eq!(read_all(opened).await, b"plan");

    let share = f.drive.browse(f.local.id, "").await.unwrap();
    let err = f
        .drive
        .create_short_link(share[0].id, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DiskError::InvalidTarget(_)));
}

#[tokio::test]
async fn delete_removes_links_and_rename_cascades() {
    let f = fixture().await;
    let entry = f
        .drive
        .upload(f.local.id, "a/b", "c.txt", None, None, byte_stream(b"c".to_vec()))
        .await
        .unwrap();
    let grant = f.drive.create_short_link(entry.id, None, None).await.unwrap();

    let a = f.drive.browse(f.local.id, "").await.unwrap().remove(0);
    f.drive.rename(a.id, "z").await.unwrap();
    let moved = f.drive.browse(f.local.id, "z/b").await.unwrap();
    assert_eq!(moved.len(), 1);
    assert_eq!(moved[0].id, entry.id);

    f.drive.delete(a.id).await.unwrap();
    assert!(f.drive.list_files(Some(f.local.id)).await.unwrap().is_empty());
    assert!(f.drive.list_short_links().await.unwrap().is_empty());
    let err = f.drive.resolve_short_link(&grant.token, None).await.unwrap_err();
    assert!(matches!(err, DiskError::NotFound(_)));
}

#[tokio::test]
async fn source_administration() {
    let f = fixture().await;
    let err = f
        .drive
        .register_source("broken", StorageType::ObjectStore, "{\"endpoint\":\"x\"}")
        .await
        .unwrap_err();
    assert!(matches!(err, DiskError::Config(_)));

    let err = f
        .drive
        .register_source("relative", StorageType::Local, "data/elsewhere")
        .await
        .unwrap_err();
    assert!(matches!(err, DiskError::Config(_)));

    let root = f.dir.path().join("second");
    let second = f
        .drive
        .register_source("second", StorageType::Local, root.to_string_lossy())
        .await
        .unwrap();
    let err = f
        .drive
        .register_source("second", StorageType::Local, root.to_string_lossy())
        .await
        .unwrap_err();
    assert!(matches!(err, DiskError::Conflict(_)));

    let moved = f.dir.path().join("moved");
    let updated = f
        .drive
        .update_source_config(second.id, moved.to_string_lossy())
        .await
        .unwrap();
    assert_eq!(updated.config, moved.to_string_lossy());

    f.drive
        .upload(f.local.id, "", "keep.txt", None, None, byte_stream(b"k".to_vec()))
        .await
        .unwrap();
    let err = f.drive.remove_source(f.local.id).await.unwrap_err();
    assert!(matches!(err, DiskError::Conflict(_)));

    assert!(f.drive.remove_source(second.id).await.unwrap());
    assert!(!f.drive.remove_source(second.id).await.unwrap());
}

#[tokio::test]
async fn purge_loop_removes_expired_links() {
    let f = fixture().await;
    let entry = f
        .drive
        .upload(f.local.id, "", "old.txt", None, None, byte_stream(b"o".to_vec()))
        .await
        .unwrap();
    let now = Utc::now();
    f.drive
        .tree()
        .catalog()
        .insert_link(ShortLink {
            id: LinkId::new(),
            token: "expired000".into(),
            file_item_id: entry.id,
            expires_at: Some(now - chrono::Duration::minutes(5)),
            access_code: None,
            created_at: now - chrono::Duration::hours(1),
        })
        .await
        .unwrap();
    f.drive.create_short_link(entry.id, None, None).await.unwrap();

    let task = f.drive.spawn_purge_loop(Duration::from_secs(3600));
    tokio::time::sleep(Duration::from_millis(200)).await;
    task.abort();

    let links = f.drive.list_short_links().await.unwrap();
    assert_eq!(links.len(), 1);
    assert_ne!(links[0].token, "expired000");
    assert_eq!(f.drive.purge_expired_links().await.unwrap(), 0);
}
