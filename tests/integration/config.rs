//! Configuration-driven export/import
//!
//! `assetport.toml` picks the archive root, compression level, reader limits
//! and import deadline.

use crate::common::*;
use assetport::engine::CONFIG_FILE_NAME;
use assetport::{export_archive, import_archive};
use std::time::Duration;

#[test]
fn config_file_controls_root_and_limits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(
        &path,
        "root = \"nightly_backup\"\ncompression_level = 19\nimport_timeout_ms = 60000\n",
    )
    .unwrap();
    let config = EngineConfig::from_file(&path).unwrap();

    let (archive, info) =
        export_archive(&sample_store(), &AllowAll, &ExportScope::All, &config).unwrap();
    assert_eq!(info.root, "nightly_backup");
    assert!(archive_members(&archive)
        .iter()
        .all(|(name, _)| name.starts_with("nightly_backup/")));

    let options = config.import_options(BundleType::Assets);
    assert_eq!(options.timeout, Some(Duration::from_secs(60)));

    let store = MemoryStore::new();
    let report =
        import_archive(&store, &AllowAll, &archive, &sample_passwords(), &options, &config)
            .unwrap();
    assert_eq!(report.imported_count(), 5);
    assert_eq!(store.snapshot(), sample_store().snapshot());
}

#[test]
fn member_limit_applies_to_import() {
    let (archive, _) = export_archive(
        &sample_store(),
        &AllowAll,
        &ExportScope::All,
        &EngineConfig::default(),
    )
    .unwrap();
    let strict = EngineConfig::from_toml_str("[limits]\nmax_members = 3\n").unwrap();

    let store = MemoryStore::new();
    let err = import_archive(
        &store,
        &AllowAll,
        &archive,
        &RedactionMap::new(),
        &ImportOptions::default(),
        &strict,
    )
    .unwrap_err();
    assert!(matches!(err, AssetError::MalformedBundle(_)));
    assert!(store.is_empty());
}

#[test]
fn default_file_is_written_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);

    EngineConfig::write_default_if_missing(&path).unwrap();
    let config = EngineConfig::from_file(&path).unwrap();
    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.root, paths::DEFAULT_ROOT);
}

fn large_store() -> MemoryStore {
    let mut records = sample_records();
    for i in 0..200 {
        records.push(record(
            EntityKind::Chart,
            &format!("uuid: extra{:03}\ndataset_uuid: birth_names\n", i),
        ));
    }
    MemoryStore::with_records(records)
}

#[test]
fn archive_import_uses_configured_deadline() {
    let config = EngineConfig::from_toml_str("import_timeout_ms = 0\n").unwrap();
    let (archive, _) =
        export_archive(&large_store(), &AllowAll, &ExportScope::All, &config).unwrap();

    let store = MemoryStore::new();
    let err = import_archive(
        &store,
        &AllowAll,
        &archive,
        &RedactionMap::new(),
        &ImportOptions::default(),
        &config,
    )
    .unwrap_err();
    assert!(matches!(err, AssetError::Timeout { .. }));
    assert!(store.is_empty());
}

#[test]
fn explicit_deadline_overrides_config() {
    let config = EngineConfig::from_toml_str("import_timeout_ms = 0\n").unwrap();
    let (archive, _) =
        export_archive(&large_store(), &AllowAll, &ExportScope::All, &config).unwrap();

    let store = MemoryStore::new();
    let report = import_archive(
        &store,
        &AllowAll,
        &archive,
        &RedactionMap::new(),
        &ImportOptions::default().timeout(Duration::from_secs(600)),
        &config,
    )
    .unwrap();
    assert_eq!(report.imported_count(), 205);
}
