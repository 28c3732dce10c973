//! Asset bundle core types
//!
//! Types for the asset bundle archive format (.tar.zst)

use crate::metadata::MetadataDescriptor;
use crate::path::normalize;
use assetport_core::{AssetError, AssetResult};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

/// File extension for asset bundle archives
pub const BUNDLE_EXTENSION: &str = ".tar.zst";

/// Archive paths within the bundle
pub mod paths {
    /// Root directory used for whole-asset exports
    pub const DEFAULT_ROOT: &str = "assets_export";
    /// Metadata record (relative to the root)
    pub const METADATA: &str = "metadata.yaml";
}

// =============================================================================
// Content pairs
// =============================================================================

/// One named text payload of a bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPair {
    /// Root-relative, forward-slash path
    pub path: String,
    /// Full textual serialization
    pub content: String,
}

impl ContentPair {
    /// Create a pair
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Whether this pair is the metadata record
    pub fn is_metadata(&self) -> bool {
        self.path == paths::METADATA
    }
}

impl<P: Into<String>, C: Into<String>> From<(P, C)> for ContentPair {
    fn from((path, content): (P, C)) -> Self {
        Self::new(path, content)
    }
}

// =============================================================================
// Bundle
// =============================================================================

/// Ordered, immutable set of content pairs with exactly one metadata record
///
/// The metadata record is always first; other pairs keep the order they were
/// given in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pairs: Vec<ContentPair>,
}

impl Bundle {
    /// Build a bundle, normalizing every path
    ///
    /// # Errors
    ///
    /// - `InvalidPath` if any path fails normalization
    /// - `MalformedBundle` on duplicate paths or a missing metadata record
    pub fn new(pairs: Vec<ContentPair>) -> AssetResult<Self> {
        let mut seen = HashSet::with_capacity(pairs.len());
        let mut metadata = None;
        let mut rest = Vec::with_capacity(pairs.len());

        for pair in pairs {
            let path = normalize(&pair.path)?;
            if !seen.insert(path.clone()) {
                return Err(AssetError::malformed(format!(
                    "duplicate member path '{}'",
                    path
                )));
            }
            let pair = ContentPair::new(path, pair.content);
            if pair.is_metadata() {
                metadata = Some(pair);
            } else {
                rest.push(pair);
            }
        }

        let metadata = metadata.ok_or_else(|| {
            AssetError::malformed(format!("missing {} record", paths::METADATA))
        })?;

        let mut ordered = Vec::with_capacity(rest.len() + 1);
        ordered.push(metadata);
        ordered.extend(rest);
        Ok(Self { pairs: ordered })
    }

    /// Build a bundle from a path -> content mapping
    pub fn from_contents(contents: &BTreeMap<String, String>) -> AssetResult<Self> {
        Self::new(
            contents
                .iter()
                .map(|(path, content)| ContentPair::new(path.clone(), content.clone()))
                .collect(),
        )
    }

    /// All pairs, metadata first
    pub fn pairs(&self) -> &[ContentPair] {
        &self.pairs
    }

    /// The metadata record
    pub fn metadata(&self) -> &ContentPair {
        &self.pairs[0]
    }

    /// Parse the metadata record
    pub fn descriptor(&self) -> AssetResult<MetadataDescriptor> {
        MetadataDescriptor::parse(&self.metadata().content)
    }

    /// Pairs other than the metadata record
    pub fn entities(&self) -> &[ContentPair] {
        &self.pairs[1..]
    }

    /// Content stored at `path`
    pub fn get(&self, path: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|p| p.path == path)
            .map(|p| p.content.as_str())
    }

    /// Number of pairs (including metadata)
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Always false: a bundle holds at least its metadata record
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Path -> content mapping consumed by the import pipeline
    pub fn to_contents(&self) -> BTreeMap<String, String> {
        self.pairs
            .iter()
            .map(|p| (p.path.clone(), p.content.clone()))
            .collect()
    }

    /// Consume into the ordered pair list
    pub fn into_pairs(self) -> Vec<ContentPair> {
        self.pairs
    }
}

// =============================================================================
// Writer / Reader options and results
// =============================================================================

/// Options for archive creation
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Zstd compression level (1-22, default: 3)
    pub compression_level: i32,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compression_level: 3,
        }
    }
}

/// Limits enforced while reading untrusted archives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderLimits {
    /// Maximum number of file members
    pub max_members: usize,
    /// Maximum uncompressed size of a single member
    pub max_member_bytes: u64,
    /// Maximum uncompressed size of all members together
    pub max_total_bytes: u64,
}

impl Default for ReaderLimits {
    fn default() -> Self {
        Self {
            max_members: 10_000,
            max_member_bytes: 16 * 1024 * 1024,
            max_total_bytes: 256 * 1024 * 1024,
        }
    }
}

/// Information returned after writing an archive
#[derive(Debug, Clone)]
pub struct ArchiveInfo {
    /// Root directory used for every member
    pub root: String,
    /// Path where the archive was written (empty for in-memory archives)
    pub path: PathBuf,
    /// Number of members (including metadata)
    pub member_count: usize,
    /// Size of the archive in bytes
    pub size_bytes: u64,
    /// xxh3 checksum of the archive bytes
    pub checksum: String,
}

/// Bundle read back from an archive, with the root it was stored under
#[derive(Debug, Clone)]
pub struct ArchiveContents {
    /// Top-level directory shared by every member
    pub root: String,
    /// Root-stripped bundle
    pub bundle: Bundle,
}

/// Compute xxh3 hash of data and return as hex string
pub fn xxh3_hex(data: &[u8]) -> String {
    use xxhash_rust::xxh3::xxh3_64;
    format!("{:016x}", xxh3_64(data))
}
