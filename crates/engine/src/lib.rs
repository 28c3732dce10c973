//! Import/export engine for assetport
//!
//! This crate sits on top of the bundle codec and drives the store:
//! - Export pipeline: store -> redacted content pairs -> archive
//! - Import pipeline: archive -> validated, ordered records -> one transaction
//! - Redaction map: out-of-band secrets re-injected on import
//! - Store seam (`AssetStore`) with an in-memory implementation
//! - Scoped transaction guard (rollback on every non-commit exit)
//! - Explicit authorization capability
//! - `assetport.toml` configuration
//!
//! The engine is the only component that knows about:
//! - Dependency ordering between entities
//! - Secret placement and preservation
//! - Transaction boundaries

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod config;
pub mod export;
pub mod import;
pub mod ordering;
pub mod secrets;
pub mod store;
pub mod transaction;

pub use auth::{Action, AllowAll, Authorizer, Permissions};
pub use config::{EngineConfig, LimitsConfig, CONFIG_FILE_NAME};
pub use export::{export, export_archive, export_to_file, export_with_descriptor, ExportScope};
pub use import::{
    import, import_archive, import_file, ImportOptions, ImportReport, DEFAULT_PARALLEL_THRESHOLD,
};
pub use ordering::{dependency_order, order_records};
pub use secrets::RedactionMap;
pub use store::{AssetStore, MemoryStore, StoreMetrics, StoreTransaction};
pub use transaction::TransactionGuard;
