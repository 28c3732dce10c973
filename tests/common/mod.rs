//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

pub use assetport::bundle::{paths, BundleReader, BundleWriter, ContentPair, MetadataDescriptor};
pub use assetport::engine::{
    Action, AllowAll, AssetStore, EngineConfig, ExportScope, ImportOptions, ImportReport,
    MemoryStore, Permissions, RedactionMap, StoreTransaction,
};
pub use assetport::{AssetError, AssetResult, BundleType, EntityKind, EntityRecord, EntityRef};

use std::collections::BTreeMap;
use std::io::Read;
use tar::{Builder, EntryType, Header};

// ============================================================================
// Fixtures
// ============================================================================

/// Real secret held by the sample database; must never appear in an archive.
pub const DB_SECRET: &str = "correct-horse-battery";

pub const ASSETS_METADATA: &str =
    "version: 1.0.0\ntype: assets\ntimestamp: '2022-01-01T00:00:00+00:00'\n";

pub const DASHBOARD_METADATA: &str =
    "version: 1.0.0\ntype: dashboard\ntimestamp: '2022-01-01T00:00:00+00:00'\n";

/// Build a record from YAML, taking the identifier from its `uuid`.
pub fn record(kind: EntityKind, yaml: &str) -> EntityRecord {
    kind.deserialize(&kind.path_for("fixture"), yaml)
        .expect("fixture record")
}

/// One entity of every kind, wired together, with a real database secret.
pub fn sample_records() -> Vec<EntityRecord> {
    vec![
        record(
            EntityKind::Database,
            &format!(
                "uuid: examples\ndatabase_name: examples\npassword: {secret}\nsqlalchemy_uri: postgresql://superset:{secret}@db:5432/examples\n",
                secret = DB_SECRET
            ),
        ),
        record(
            EntityKind::Dataset,
            "uuid: birth_names\ntable_name: birth_names\ndatabase_uuid: examples\ncolumns:\n- column_name: ds\n  is_dttm: true\n",
        ),
        record(
            EntityKind::Chart,
            "uuid: girls\nslice_name: Girls\nviz_type: table\ndataset_uuid: birth_names\nparams:\n  row_limit: 50\n",
        ),
        record(
            EntityKind::Dashboard,
            "uuid: births\ndashboard_title: Births\nposition:\n  ROOT_ID:\n    type: ROOT\n  CHART-girls:\n    type: CHART\n    meta:\n      uuid: girls\n      width: 4\n",
        ),
        record(
            EntityKind::SavedQuery,
            "uuid: top_names\nlabel: Top names\nsql: SELECT name FROM birth_names LIMIT 10\ndatabase_uuid: examples\n",
        ),
    ]
}

pub fn sample_store() -> MemoryStore {
    MemoryStore::with_records(sample_records())
}

/// Redaction map restoring the sample database secret.
pub fn sample_passwords() -> RedactionMap {
    [("databases/examples.yaml", DB_SECRET)].into_iter().collect()
}

pub fn contents(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(p, c)| (p.to_string(), c.to_string()))
        .collect()
}

pub fn pairs_to_contents(pairs: &[ContentPair]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|p| (p.path.clone(), p.content.clone()))
        .collect()
}

// ============================================================================
// Raw archives
// ============================================================================

/// Build a tar.zst archive with raw member names, bypassing every check the
/// writer would apply.
pub fn raw_archive(members: &[(&str, &str)]) -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let encoder = zstd::Encoder::new(&mut buffer, 3).unwrap().auto_finish();
        let mut builder = Builder::new(encoder);
        for (name, data) in members {
            let mut header = Header::new_gnu();
            let raw = name.as_bytes();
            header.as_old_mut().name[..raw.len()].copy_from_slice(raw);
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_entry_type(EntryType::Regular);
            header.set_cksum();
            builder.append(&header, data.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap();
    }
    buffer
}

/// Decompressed tar bytes of an archive.
pub fn decompress(data: &[u8]) -> Vec<u8> {
    let mut decoder = zstd::Decoder::new(data).unwrap();
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).unwrap();
    out
}

/// `(member name, content)` for every member, in archive order.
pub fn archive_members(data: &[u8]) -> Vec<(String, String)> {
    let tar_data = decompress(data);
    let mut archive = tar::Archive::new(&tar_data[..]);
    archive
        .entries()
        .unwrap()
        .map(|entry| {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().to_string();
            let mut content = String::new();
            entry.read_to_string(&mut content).unwrap();
            (name, content)
        })
        .collect()
}

// ============================================================================
// FailingStore - MemoryStore with injected write failures
// ============================================================================

/// Wraps a `MemoryStore`; fails the `put` of one entity, or the commit.
pub struct FailingStore {
    pub inner: MemoryStore,
    pub fail_on: Option<EntityRef>,
    pub fail_commit: bool,
}

impl FailingStore {
    pub fn failing_on(inner: MemoryStore, entity: EntityRef) -> Self {
        Self {
            inner,
            fail_on: Some(entity),
            fail_commit: false,
        }
    }

    pub fn failing_commit(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_on: None,
            fail_commit: true,
        }
    }
}

impl AssetStore for FailingStore {
    fn get(&self, entity: &EntityRef) -> AssetResult<Option<EntityRecord>> {
        self.inner.get(entity)
    }

    fn list(&self, kind: EntityKind) -> AssetResult<Vec<EntityRecord>> {
        self.inner.list(kind)
    }

    fn begin(&self) -> AssetResult<Box<dyn StoreTransaction + '_>> {
        Ok(Box::new(FailingTransaction {
            inner: self.inner.begin()?,
            fail_on: self.fail_on.clone(),
            fail_commit: self.fail_commit,
        }))
    }
}

struct FailingTransaction<'a> {
    inner: Box<dyn StoreTransaction + 'a>,
    fail_on: Option<EntityRef>,
    fail_commit: bool,
}

impl StoreTransaction for FailingTransaction<'_> {
    fn get(&self, entity: &EntityRef) -> AssetResult<Option<EntityRecord>> {
        self.inner.get(entity)
    }

    fn put(&mut self, record: EntityRecord) -> AssetResult<()> {
        if self.fail_on.as_ref() == Some(&record.entity_ref()) {
            return Err(AssetError::Storage(format!(
                "injected failure writing {}",
                record.entity_ref()
            )));
        }
        self.inner.put(record)
    }

    fn pending(&self) -> usize {
        self.inner.pending()
    }

    fn commit(self: Box<Self>) -> AssetResult<()> {
        if self.fail_commit {
            self.inner.rollback()?;
            return Err(AssetError::Storage("injected commit failure".to_string()));
        }
        self.inner.commit()
    }

    fn rollback(self: Box<Self>) -> AssetResult<()> {
        self.inner.rollback()
    }
}
