//! Asset store seam
//!
//! The persistent store is an external collaborator. The pipelines only need
//! point lookups, per-kind listing and an explicit begin/commit/rollback
//! transaction, which is what these traits capture.
//!
//! `MemoryStore` is the in-process implementation used by tests and by
//! callers that stage entities before handing them to a real backend.

pub mod memory;

pub use memory::{MemoryStore, StoreMetrics};

use assetport_core::{AssetResult, EntityKind, EntityRecord, EntityRef};

/// Read access plus transaction creation
pub trait AssetStore: Send + Sync {
    /// Committed record for `entity`, if any
    fn get(&self, entity: &EntityRef) -> AssetResult<Option<EntityRecord>>;

    /// Every committed record of `kind`, sorted by identifier
    fn list(&self, kind: EntityKind) -> AssetResult<Vec<EntityRecord>>;

    /// Begin a write transaction
    ///
    /// Writes made through the transaction are invisible to other readers
    /// until `commit` succeeds.
    fn begin(&self) -> AssetResult<Box<dyn StoreTransaction + '_>>;
}

/// Explicit write transaction
///
/// Callers normally hold one through [`crate::TransactionGuard`], which rolls
/// back on every exit path that does not reach `commit`.
pub trait StoreTransaction {
    /// Record for `entity` as seen by this transaction (staged writes first)
    fn get(&self, entity: &EntityRef) -> AssetResult<Option<EntityRecord>>;

    /// Stage an insert-or-replace
    fn put(&mut self, record: EntityRecord) -> AssetResult<()>;

    /// Number of staged writes
    fn pending(&self) -> usize;

    /// Make every staged write visible at once
    fn commit(self: Box<Self>) -> AssetResult<()>;

    /// Discard every staged write
    fn rollback(self: Box<Self>) -> AssetResult<()>;
}

impl<S: AssetStore + ?Sized> AssetStore for &S {
    fn get(&self, entity: &EntityRef) -> AssetResult<Option<EntityRecord>> {
        (**self).get(entity)
    }

    fn list(&self, kind: EntityKind) -> AssetResult<Vec<EntityRecord>> {
        (**self).list(kind)
    }

    fn begin(&self) -> AssetResult<Box<dyn StoreTransaction + '_>> {
        (**self).begin()
    }
}
