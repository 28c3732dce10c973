//! In-memory asset store
//!
//! Committed state lives in one `BTreeMap` behind a `RwLock`. A write
//! transaction holds the writer mutex for its whole lifetime, so at most one
//! transaction is in flight and commits are serialized. Staged writes are
//! private to the transaction until commit swaps them in under the write lock.

use super::{AssetStore, StoreTransaction};
use assetport_core::{AssetResult, EntityKind, EntityRecord, EntityRef};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Transaction counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreMetrics {
    /// Transactions currently open
    pub active_count: u64,
    /// Transactions begun
    pub total_started: u64,
    /// Transactions committed
    pub total_committed: u64,
    /// Transactions rolled back (explicitly or by drop)
    pub total_rolled_back: u64,
}

/// Thread-safe in-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entities: RwLock<BTreeMap<EntityRef, EntityRecord>>,
    writer: Mutex<()>,
    active_count: AtomicU64,
    total_started: AtomicU64,
    total_committed: AtomicU64,
    total_rolled_back: AtomicU64,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `records`
    pub fn with_records(records: impl IntoIterator<Item = EntityRecord>) -> Self {
        let store = Self::new();
        {
            let mut entities = store.entities.write();
            for record in records {
                entities.insert(record.entity_ref(), record);
            }
        }
        store
    }

    /// Insert or replace a record outside any transaction
    pub fn insert(&self, record: EntityRecord) {
        let _writer = self.writer.lock();
        self.entities.write().insert(record.entity_ref(), record);
    }

    /// Copy of the committed state
    pub fn snapshot(&self) -> BTreeMap<EntityRef, EntityRecord> {
        self.entities.read().clone()
    }

    /// Number of committed records
    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.entities.read().is_empty()
    }

    /// Current transaction counters
    pub fn metrics(&self) -> StoreMetrics {
        StoreMetrics {
            active_count: self.active_count.load(Ordering::Relaxed),
            total_started: self.total_started.load(Ordering::Relaxed),
            total_committed: self.total_committed.load(Ordering::Relaxed),
            total_rolled_back: self.total_rolled_back.load(Ordering::Relaxed),
        }
    }
}

impl AssetStore for MemoryStore {
    fn get(&self, entity: &EntityRef) -> AssetResult<Option<EntityRecord>> {
        Ok(self.entities.read().get(entity).cloned())
    }

    fn list(&self, kind: EntityKind) -> AssetResult<Vec<EntityRecord>> {
        Ok(self
            .entities
            .read()
            .values()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect())
    }

    fn begin(&self) -> AssetResult<Box<dyn StoreTransaction + '_>> {
        let writer = self.writer.lock();
        self.active_count.fetch_add(1, Ordering::Relaxed);
        self.total_started.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(MemoryTransaction {
            store: self,
            _writer: writer,
            staged: BTreeMap::new(),
            finished: false,
        }))
    }
}

struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    _writer: MutexGuard<'a, ()>,
    staged: BTreeMap<EntityRef, EntityRecord>,
    finished: bool,
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn get(&self, entity: &EntityRef) -> AssetResult<Option<EntityRecord>> {
        if let Some(record) = self.staged.get(entity) {
            return Ok(Some(record.clone()));
        }
        self.store.get(entity)
    }

    fn put(&mut self, record: EntityRecord) -> AssetResult<()> {
        self.staged.insert(record.entity_ref(), record);
        Ok(())
    }

    fn pending(&self) -> usize {
        self.staged.len()
    }

    fn commit(mut self: Box<Self>) -> AssetResult<()> {
        let staged = std::mem::take(&mut self.staged);
        self.store.entities.write().extend(staged);
        self.store.total_committed.fetch_add(1, Ordering::Relaxed);
        self.finished = true;
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> AssetResult<()> {
        self.staged.clear();
        self.store.total_rolled_back.fetch_add(1, Ordering::Relaxed);
        self.finished = true;
        Ok(())
    }
}

impl Drop for MemoryTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.store.total_rolled_back.fetch_add(1, Ordering::Relaxed);
        }
        self.store.active_count.fetch_sub(1, Ordering::Relaxed);
    }
}
