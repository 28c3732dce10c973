//! Scoped transaction guard
//!
//! Wraps a [`StoreTransaction`] so that every exit path which does not reach
//! [`TransactionGuard::commit`] rolls back: early `?` returns, deadline
//! expiry, and unwinding panics all end in `Drop`.

use crate::store::{AssetStore, StoreTransaction};
use assetport_core::{AssetError, AssetResult, EntityRecord, EntityRef};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Transaction that rolls back unless explicitly committed
pub struct TransactionGuard<'a> {
    txn: Option<Box<dyn StoreTransaction + 'a>>,
    started: Instant,
    timeout: Option<Duration>,
}

impl<'a> TransactionGuard<'a> {
    /// Begin a transaction on `store`
    ///
    /// `timeout` bounds the time between begin and commit. It is checked by
    /// [`check_deadline`](Self::check_deadline) and before commit.
    pub fn begin<S: AssetStore + ?Sized>(
        store: &'a S,
        timeout: Option<Duration>,
    ) -> AssetResult<Self> {
        let txn = store.begin()?;
        debug!(target: "assetport::txn", timeout_ms = ?timeout.map(|t| t.as_millis()), "Transaction started");
        Ok(Self {
            txn: Some(txn),
            started: Instant::now(),
            timeout,
        })
    }

    fn inner(&self) -> AssetResult<&(dyn StoreTransaction + 'a)> {
        self.txn
            .as_deref()
            .ok_or_else(|| AssetError::storage("transaction already finished"))
    }

    fn inner_mut(&mut self) -> AssetResult<&mut (dyn StoreTransaction + 'a)> {
        match self.txn.as_deref_mut() {
            Some(txn) => Ok(txn),
            None => Err(AssetError::storage("transaction already finished")),
        }
    }

    /// Time since begin
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// `Timeout` if the deadline has passed
    pub fn check_deadline(&self) -> AssetResult<()> {
        match self.timeout {
            Some(limit) if self.elapsed() > limit => Err(AssetError::Timeout {
                elapsed_ms: self.elapsed().as_millis() as u64,
                limit_ms: limit.as_millis() as u64,
            }),
            _ => Ok(()),
        }
    }

    /// Record for `entity` as seen by this transaction
    pub fn get(&self, entity: &EntityRef) -> AssetResult<Option<EntityRecord>> {
        self.inner()?.get(entity)
    }

    /// Stage an insert-or-replace
    pub fn put(&mut self, record: EntityRecord) -> AssetResult<()> {
        self.inner_mut()?.put(record)
    }

    /// Number of staged writes
    pub fn pending(&self) -> usize {
        self.txn.as_ref().map_or(0, |t| t.pending())
    }

    /// Commit the transaction
    ///
    /// The deadline is checked first; once the store's commit has started it
    /// runs to completion.
    pub fn commit(mut self) -> AssetResult<()> {
        self.check_deadline()?;
        let txn = self
            .txn
            .take()
            .ok_or_else(|| AssetError::storage("transaction already finished"))?;
        let writes = txn.pending();
        match txn.commit() {
            Ok(()) => {
                info!(target: "assetport::txn", writes, elapsed_ms = self.elapsed().as_millis() as u64, "Transaction committed");
                Ok(())
            }
            Err(e) => {
                warn!(target: "assetport::txn", error = %e, "Transaction aborted");
                Err(e)
            }
        }
    }

    /// Roll back explicitly
    pub fn rollback(mut self) -> AssetResult<()> {
        match self.txn.take() {
            Some(txn) => {
                let writes = txn.pending();
                txn.rollback()?;
                debug!(target: "assetport::txn", writes, "Transaction rolled back");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if let Some(txn) = self.txn.take() {
            let writes = txn.pending();
            match txn.rollback() {
                Ok(()) => {
                    warn!(target: "assetport::txn", writes, "Transaction rolled back on drop")
                }
                Err(e) => {
                    warn!(target: "assetport::txn", writes, error = %e, "Rollback on drop failed")
                }
            }
        }
    }
}
