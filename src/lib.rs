//! assetport - portable asset bundles
//!
//! Exports configuration entities (database connections, datasets, charts,
//! dashboards, saved queries) into a versioned `.tar.zst` archive and imports
//! them back into another instance. Secrets never travel inside the archive.
//!
//! # Quick Start
//!
//! ```ignore
//! use assetport::prelude::*;
//!
//! let store = MemoryStore::new();
//! let config = EngineConfig::default();
//!
//! // Export everything
//! let (archive, info) = export_archive(&store, &AllowAll, &ExportScope::All, &config)?;
//!
//! // Import it elsewhere, supplying the database password out of band
//! let passwords = RedactionMap::from_json(r#"{"databases/examples.yaml": "s3cret"}"#)?;
//! let report = import_archive(
//!     &other_store,
//!     &AllowAll,
//!     &archive,
//!     &passwords,
//!     &ImportOptions::default(),
//!     &config,
//! )?;
//! ```
//!
//! # Architecture
//!
//! - [`model`]: error taxonomy and the closed set of entity kinds
//! - [`bundle`]: path codec, metadata record, archive reader/writer
//! - [`engine`]: export/import pipelines, store seam, transactions, config

pub use assetport_bundle as bundle;
pub use assetport_core as model;
pub use assetport_engine as engine;

pub use assetport_bundle::{
    contents_from_bundle, ArchiveInfo, Bundle, BundleReader, BundleType, BundleWriter,
    ContentPair, MetadataDescriptor,
};
pub use assetport_core::{AssetError, AssetResult, EntityKind, EntityRecord, EntityRef};
pub use assetport_engine::{
    export, export_archive, export_to_file, import, import_archive, import_file, AllowAll,
    AssetStore, Authorizer, EngineConfig, ExportScope, ImportOptions, ImportReport, MemoryStore,
    RedactionMap,
};

/// Everything needed for a typical export/import round trip
pub mod prelude {
    pub use assetport_bundle::{BundleType, ContentPair};
    pub use assetport_core::{AssetError, AssetResult, EntityKind, EntityRecord, EntityRef};
    pub use assetport_engine::{
        export, export_archive, import, import_archive, Action, AllowAll, AssetStore, Authorizer,
        EngineConfig, ExportScope, ImportOptions, ImportReport, MemoryStore, Permissions,
        RedactionMap,
    };
}
