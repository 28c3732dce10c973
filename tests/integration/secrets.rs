//! Secret handling tests
//!
//! Real secrets never appear in exported content or archive bytes; on import
//! they come only from the redaction map or from the entity already stored.

use crate::common::*;
use assetport::model::PASSWORD_MASK;
use assetport::{export, export_archive, import, import_archive};

fn database(store: &MemoryStore) -> EntityRecord {
    store
        .get(&EntityRef::new(EntityKind::Database, "examples"))
        .unwrap()
        .expect("database imported")
}

#[test]
fn exported_pairs_never_contain_the_secret() {
    for scope in [
        ExportScope::All,
        ExportScope::kind(EntityKind::Database, ["examples"]),
        ExportScope::kind(EntityKind::Dashboard, ["births"]),
        ExportScope::kind(EntityKind::SavedQuery, ["top_names"]),
    ] {
        let pairs = export(&sample_store(), &AllowAll, &scope).unwrap();
        assert!(pairs.iter().any(|p| p.path == "databases/examples.yaml"));
        for pair in &pairs {
            assert!(
                !pair.content.contains(DB_SECRET),
                "{:?}: {} leaks the secret",
                scope,
                pair.path
            );
        }
    }
}

#[test]
fn archive_bytes_never_contain_the_secret() {
    let (archive, _) = export_archive(
        &sample_store(),
        &AllowAll,
        &ExportScope::All,
        &EngineConfig::default(),
    )
    .unwrap();

    let tar_bytes = decompress(&archive);
    let needle = DB_SECRET.as_bytes();
    assert!(!tar_bytes.windows(needle.len()).any(|w| w == needle));

    let (_, db) = archive_members(&archive)
        .into_iter()
        .find(|(name, _)| name.ends_with("databases/examples.yaml"))
        .unwrap();
    assert!(db.contains(PASSWORD_MASK));
}

#[test]
fn import_without_entry_keeps_placeholder() {
    let contents = pairs_to_contents(&export(&sample_store(), &AllowAll, &ExportScope::All).unwrap());
    let store = MemoryStore::new();
    let report = import(
        &store,
        &AllowAll,
        &contents,
        &RedactionMap::new(),
        &ImportOptions::default(),
    )
    .unwrap();

    assert_eq!(report.secrets_applied, 0);
    let db = database(&store);
    assert_eq!(db.field("password"), Some(PASSWORD_MASK));
    assert_eq!(
        db.field("sqlalchemy_uri"),
        Some("postgresql://superset:XXXXXXXXXX@db:5432/examples")
    );
    assert!(db.has_masked_secret());
}

#[test]
fn import_with_entry_restores_secret() {
    let contents = pairs_to_contents(&export(&sample_store(), &AllowAll, &ExportScope::All).unwrap());
    let store = MemoryStore::new();
    import(
        &store,
        &AllowAll,
        &contents,
        &sample_passwords(),
        &ImportOptions::default(),
    )
    .unwrap();

    let db = database(&store);
    assert_eq!(db.field("password"), Some(DB_SECRET));
    assert!(!db.has_masked_secret());
}

#[test]
fn redaction_keys_with_root_prefix_are_accepted_for_archives() {
    let (archive, _) = export_archive(
        &sample_store(),
        &AllowAll,
        &ExportScope::All,
        &EngineConfig::default(),
    )
    .unwrap();
    let passwords: RedactionMap = [("assets_export/databases/examples.yaml", DB_SECRET)]
        .into_iter()
        .collect();

    let store = MemoryStore::new();
    import_archive(
        &store,
        &AllowAll,
        &archive,
        &passwords,
        &ImportOptions::default(),
        &EngineConfig::default(),
    )
    .unwrap();
    assert_eq!(database(&store).field("password"), Some(DB_SECRET));
}

#[test]
fn redaction_map_from_transport_json() {
    let contents = pairs_to_contents(&export(&sample_store(), &AllowAll, &ExportScope::All).unwrap());
    let payload = serde_json::json!({ "databases/examples.yaml": "from-json" }).to_string();
    let passwords = RedactionMap::from_json(&payload).unwrap();

    let store = MemoryStore::new();
    import(
        &store,
        &AllowAll,
        &contents,
        &passwords,
        &ImportOptions::default(),
    )
    .unwrap();
    assert_eq!(database(&store).field("password"), Some("from-json"));
}

#[test]
fn placeholder_never_replaces_a_stored_secret() {
    let contents = pairs_to_contents(&export(&sample_store(), &AllowAll, &ExportScope::All).unwrap());
    let store = sample_store();

    import(
        &store,
        &AllowAll,
        &contents,
        &RedactionMap::new(),
        &ImportOptions::default(),
    )
    .unwrap();

    let db = database(&store);
    assert_eq!(db.field("password"), Some(DB_SECRET));
    assert_eq!(store.snapshot(), sample_store().snapshot());
}

#[test]
fn redaction_entry_replaces_a_stored_secret() {
    let contents = pairs_to_contents(&export(&sample_store(), &AllowAll, &ExportScope::All).unwrap());
    let store = sample_store();
    let passwords: RedactionMap = [("databases/examples.yaml", "rotated")].into_iter().collect();

    import(
        &store,
        &AllowAll,
        &contents,
        &passwords,
        &ImportOptions::default(),
    )
    .unwrap();

    let db = database(&store);
    assert_eq!(db.field("password"), Some("rotated"));
    assert_eq!(
        db.field("sqlalchemy_uri"),
        Some("postgresql://superset:rotated@db:5432/examples")
    );
}

#[test]
fn redaction_entries_for_non_secret_kinds_are_ignored() {
    let contents = pairs_to_contents(&export(&sample_store(), &AllowAll, &ExportScope::All).unwrap());
    let passwords: RedactionMap = [("charts/girls.yaml", "nope")].into_iter().collect();

    let store = MemoryStore::new();
    let report = import(
        &store,
        &AllowAll,
        &contents,
        &passwords,
        &ImportOptions::default(),
    )
    .unwrap();

    assert_eq!(report.secrets_applied, 0);
    let chart = store
        .get(&EntityRef::new(EntityKind::Chart, "girls"))
        .unwrap()
        .unwrap();
    assert_eq!(chart.field("password"), None);
}

#[test]
fn uri_passwords_with_reserved_characters_never_leak() {
    for secret in ["pa/ss", "pa?ss", "pa#ss", "p@ss"] {
        let db = record(
            EntityKind::Database,
            &format!(
                "uuid: main\npassword: '{secret}'\nsqlalchemy_uri: 'postgresql://scott:{secret}@db:5432/prod'\n",
                secret = secret
            ),
        );
        let source = MemoryStore::with_records([db.clone()]);

        let (archive, _) = export_archive(
            &source,
            &AllowAll,
            &ExportScope::All,
            &EngineConfig::default(),
        )
        .unwrap();
        for (name, content) in archive_members(&archive) {
            assert!(!content.contains(secret), "{} leaks {:?}", name, secret);
        }

        let passwords: RedactionMap = [("databases/main.yaml", secret)].into_iter().collect();
        let target = MemoryStore::new();
        let report = import_archive(
            &target,
            &AllowAll,
            &archive,
            &passwords,
            &ImportOptions::default(),
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(report.secrets_applied, 1);
        assert_eq!(target.snapshot(), source.snapshot(), "{:?}", secret);
    }
}
