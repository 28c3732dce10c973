//! Asset bundle codec
//!
//! This crate implements the portable `.tar.zst` asset archive.
//!
//! ## Archive Structure
//!
//! ```text
//! assets.tar.zst
//! └── assets_export/                 — root label (any single directory name)
//!     ├── metadata.yaml              — version, type, timestamp (always first)
//!     ├── databases/<id>.yaml
//!     ├── datasets/<id>.yaml
//!     ├── charts/<id>.yaml
//!     ├── dashboards/<id>.yaml
//!     └── queries/<id>.yaml
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let (bytes, info) = BundleWriter::with_defaults().write(&pairs)?;
//! let contents = BundleReader::with_defaults().read(&bytes)?;
//! assert_eq!(contents.bundle.pairs(), pairs.as_slice());
//! ```
//!
//! ## Design Principles
//!
//! - **Pure**: the codec knows paths and text, never entity semantics
//! - **Root-agnostic**: readers strip whatever single root the writer used
//! - **Safe**: member paths are normalized; traversal is rejected before use
//! - **Inspectable**: standard tools (tar, zstd) can inspect contents

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod metadata;
pub mod path;
pub mod reader;
pub mod types;
pub mod writer;

pub use metadata::{BundleType, BundleVersion, MetadataDescriptor, SUPPORTED_VERSION};
pub use path::{normalize, split_root, strip_root, validate_root};
pub use reader::{contents_from_bundle, BundleReader};
pub use types::{
    paths, xxh3_hex, ArchiveContents, ArchiveInfo, Bundle, ContentPair, ReaderLimits,
    WriteOptions, BUNDLE_EXTENSION,
};
pub use writer::BundleWriter;
