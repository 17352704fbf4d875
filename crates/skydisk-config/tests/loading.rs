//! Layered loading against real files.

use std::collections::HashMap;
use std::fs;

use skydisk_config::{Config, ConfigError, ConfigLayer, LoadOptions, loader};

fn no_env() -> Option<HashMap<String, String>> {
    Some(HashMap::new())
}

#[test]
fn defaults_when_no_file_exists() {
    let home = tempfile::tempdir().unwrap();
    let resolved = loader::load_with(LoadOptions {
        config_path: None,
        home_dir: Some(home.path().to_path_buf()),
        env: no_env(),
    })
    .unwrap();

    assert_eq!(resolved.config, Config::default());
    assert!(resolved.loaded_files.is_empty());
    assert_eq!(
        resolved.source_of("storage.local.base_path"),
        Some(ConfigLayer::Defaults)
    );
}

#[test]
fn home_file_overrides_defaults() {
    let home = tempfile::tempdir().unwrap();
    let dir = home.path().join(".skydisk");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("config.toml"),
        "[links]\npublic_base_url = \"https://disk.example.com\"\n",
    )
    .unwrap();

    let resolved = loader::load_with(LoadOptions {
        config_path: None,
        home_dir: Some(home.path().to_path_buf()),
        env: no_env(),
    })
    .unwrap();

    assert_eq!(resolved.config.links.public_base_url, "https://disk.example.com");
    assert_eq!(resolved.config.links.purge_interval_secs, 3600);
    assert_eq!(resolved.loaded_files.len(), 1);
    assert_eq!(
        resolved.source_of("links.public_base_url"),
        Some(ConfigLayer::File)
    );
}

#[test]
fn env_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("skydisk.toml");
    fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

    let env: HashMap<String, String> = [
        ("SKYDISK_LOG_LEVEL".to_owned(), "warn".to_owned()),
        ("SKYDISK_S3_ENABLED".to_owned(), "true".to_owned()),
        ("SKYDISK_S3_BUCKET".to_owned(), "team-files".to_owned()),
    ]
    .into_iter()
    .collect();

    let resolved = loader::load_with(LoadOptions {
        config_path: Some(path),
        home_dir: None,
        env: Some(env),
    })
    .unwrap();

    assert_eq!(resolved.config.logging.level, "warn");
    assert!(resolved.config.storage.s3.enabled);
    assert_eq!(resolved.config.storage.s3.bucket, "team-files");
    assert_eq!(resolved.source_of("logging.level"), Some(ConfigLayer::Env));
    assert_eq!(resolved.env_overrides.len(), 3);
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::ReadError { .. }));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[links\npurge_interval_secs = ").unwrap();
    let err = Config::load_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn wrong_type_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("typed.toml");
    fs::write(&path, "[links]\npurge_interval_secs = \"hourly\"\n").unwrap();
    let err = Config::load_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn invalid_values_fail_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("invalid.toml");
    fs::write(
        &path,
        "[storage.s3]\nenabled = true\nendpoint = \"minio:9000\"\n",
    )
    .unwrap();
    let err = Config::load_file(&path).unwrap_err();
    assert!(
        matches!(err, ConfigError::ValidationError { ref field, .. } if field == "storage.s3.endpoint")
    );
}
