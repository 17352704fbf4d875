//! Snapshot persistence of the in-memory catalog.

use chrono::{Duration, Utc};
use skydisk_catalog::{CatalogBatch, CatalogStore, MemoryCatalog};
use skydisk_core::{CatalogEntry, EntryDraft, LinkId, ShortLink, StorageSource, StorageType};

fn upload_entry(source: &StorageSource, dir: &str, name: &str) -> CatalogEntry {
    CatalogEntry::from_draft(EntryDraft {
        storage_source_id: source.id,
        filename: name.to_owned(),
        directory_path: dir.to_owned(),
        storage_path: format!("0000-{name}"),
        size: 12,
        content_type: Some("text/plain".to_owned()),
    })
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");

    let source = StorageSource::new("local-default", StorageType::Local, "/srv/disk");
    let file = upload_entry(&source, "docs", "a.txt");
    {
        let catalog = MemoryCatalog::open(&path).unwrap();
        catalog.insert_source(source.clone()).await.unwrap();
        catalog
            .insert_entry(CatalogEntry::directory(source.id, "", "docs"))
            .await
            .unwrap();
        catalog.insert_entry(file.clone()).await.unwrap();
        catalog
            .insert_link(ShortLink {
                id: LinkId::new(),
                token: "Ab12Cd34Ef".to_owned(),
                file_item_id: file.id,
                expires_at: Some(Utc::now() + Duration::hours(1)),
                access_code: Some("pw".to_owned()),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }
    assert!(path.exists());

    let reopened = MemoryCatalog::open(&path).unwrap();
    assert_eq!(reopened.list_sources().await.unwrap(), vec![source.clone()]);
    assert_eq!(reopened.get_entry(file.id).await.unwrap(), Some(file.clone()));
    assert!(
        reopened
            .find_directory(source.id, "", "docs")
            .await
            .unwrap()
            .is_some()
    );
    let link = reopened.find_link_by_token("Ab12Cd34Ef").await.unwrap().unwrap();
    assert_eq!(link.access_code.as_deref(), Some("pw"));
}

#[tokio::test]
async fn test_batch_writes_are_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("catalog.json");

    let source = StorageSource::new("local-default", StorageType::Local, "/srv/disk");
    let file = upload_entry(&source, "", "old.txt");
    {
        let catalog = MemoryCatalog::open(&path).unwrap();
        catalog.insert_entry(file.clone()).await.unwrap();
        let mut renamed = file.clone();
        renamed.filename = "new.txt".to_owned();
        catalog
            .apply(
                CatalogBatch::new()
                    .require_vacant(source.id, "", "new.txt", Some(file.id))
                    .update_entry(&file, renamed),
            )
            .await
            .unwrap();
    }

    let reopened = MemoryCatalog::open(&path).unwrap();
    let entry = reopened.get_entry(file.id).await.unwrap().unwrap();
    assert_eq!(entry.filename, "new.txt");
}

#[tokio::test]
async fn test_failed_snapshot_leaves_state_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");

    let source = StorageSource::new("local-default", StorageType::Local, "/srv/disk");
    let kept = upload_entry(&source, "", "kept.txt");
    let catalog = MemoryCatalog::open(&path).unwrap();
    catalog.insert_source(source.clone()).await.unwrap();
    catalog.insert_entry(kept.clone()).await.unwrap();

    // A directory in place of the snapshot file makes every persist fail.
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();

    let lost = upload_entry(&source, "", "lost.txt");
    assert!(catalog.insert_entry(lost.clone()).await.is_err());
    assert!(catalog.get_entry(lost.id).await.unwrap().is_none());

    let mut renamed = kept.clone();
    renamed.filename = "renamed.txt".to_owned();
    assert!(
        catalog
            .apply(CatalogBatch::new().update_entry(&kept, renamed))
            .await
            .is_err()
    );
    assert_eq!(catalog.get_entry(kept.id).await.unwrap(), Some(kept.clone()));

    let other = StorageSource::new("archive", StorageType::Local, "/srv/archive");
    assert!(catalog.insert_source(other.clone()).await.is_err());
    assert!(catalog.get_source(other.id).await.unwrap().is_none());

    let entries = catalog.list_entries(Some(source.id)).await.unwrap();
    assert_eq!(entries, vec![kept]);
}

#[test]
fn test_corrupt_snapshot_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    std::fs::write(&path, b"{not json").unwrap();
    assert!(MemoryCatalog::open(&path).is_err());
}
