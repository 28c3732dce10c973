//! Asset bundle archive reader
//!
//! Reads .tar.zst archives, validates member paths, detects the shared root
//! directory and strips it, so that everything downstream works on
//! root-relative paths regardless of which root label the exporter chose.

use crate::path::{normalize, split_root};
use crate::types::{ArchiveContents, Bundle, ContentPair, ReaderLimits};
use assetport_core::{AssetError, AssetResult};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tar::{Archive, EntryType};
use tracing::debug;

/// Reader for asset bundle archives
///
/// Pure codec: produces content pairs, never entity records.
pub struct BundleReader {
    limits: ReaderLimits,
}

impl BundleReader {
    /// Create a reader enforcing `limits`
    pub fn new(limits: ReaderLimits) -> Self {
        Self { limits }
    }

    /// Create a reader with default limits
    pub fn with_defaults() -> Self {
        Self::new(ReaderLimits::default())
    }

    /// Read an archive from memory and strip its root
    ///
    /// # Errors
    ///
    /// - `MalformedBundle` if the container is unreadable, members disagree on
    ///   the root, two members share a path, metadata is missing, a member is
    ///   not valid UTF-8, or a limit is exceeded
    /// - `InvalidPath` if any member path escapes the archive
    pub fn read(&self, data: &[u8]) -> AssetResult<ArchiveContents> {
        self.read_from(data)
    }

    /// Read an archive file and strip its root
    pub fn read_file(&self, path: &Path) -> AssetResult<ArchiveContents> {
        let file = File::open(path)?;
        self.read_from(BufReader::new(file))
    }

    fn read_from<R: Read>(&self, input: R) -> AssetResult<ArchiveContents> {
        let members = self.extract_members(input)?;
        if members.is_empty() {
            return Err(AssetError::malformed("archive contains no files"));
        }

        let mut root: Option<String> = None;
        let mut pairs = Vec::with_capacity(members.len());

        for (path, data) in members {
            let (member_root, inner) = split_root(&path).ok_or_else(|| {
                AssetError::malformed(format!("member '{}' is not inside a root directory", path))
            })?;

            match &root {
                None => root = Some(member_root.to_string()),
                Some(expected) if expected != member_root => {
                    return Err(AssetError::malformed(format!(
                        "inconsistent root directories '{}' and '{}'",
                        expected, member_root
                    )));
                }
                Some(_) => {}
            }

            let content = String::from_utf8(data).map_err(|e| {
                AssetError::malformed(format!("member '{}' is not valid UTF-8: {}", path, e))
            })?;
            pairs.push(ContentPair::new(inner, content));
        }

        let root = root.unwrap_or_default();
        let bundle = Bundle::new(pairs)?;

        debug!(
            target: "assetport::bundle",
            root = %root,
            members = bundle.len(),
            "Bundle archive read"
        );
        Ok(ArchiveContents { root, bundle })
    }

    /// Decompress and collect every file member with its normalized path
    fn extract_members<R: Read>(&self, input: R) -> AssetResult<Vec<(String, Vec<u8>)>> {
        let decoder = zstd::Decoder::new(input)
            .map_err(|e| AssetError::malformed(format!("zstd decode: {}", e)))?;

        let mut archive = Archive::new(decoder);
        let mut members = Vec::new();
        let mut total_bytes = 0u64;

        for entry in archive
            .entries()
            .map_err(|e| AssetError::malformed(format!("tar read: {}", e)))?
        {
            let entry = entry.map_err(|e| AssetError::malformed(format!("tar entry: {}", e)))?;

            let raw_path = std::str::from_utf8(&entry.path_bytes())
                .map_err(|_| AssetError::malformed("member path is not valid UTF-8"))?
                .to_string();

            match entry.header().entry_type() {
                EntryType::Directory => continue,
                EntryType::Regular | EntryType::Continuous => {}
                other => {
                    return Err(AssetError::malformed(format!(
                        "member '{}' has unsupported type {:?}",
                        raw_path, other
                    )));
                }
            }

            let path = normalize(&raw_path)?;

            if members.len() >= self.limits.max_members {
                return Err(AssetError::malformed(format!(
                    "archive has more than {} members",
                    self.limits.max_members
                )));
            }

            let declared = entry
                .header()
                .size()
                .map_err(|e| AssetError::malformed(format!("member '{}': {}", path, e)))?;
            if declared > self.limits.max_member_bytes {
                return Err(AssetError::malformed(format!(
                    "member '{}' exceeds {} bytes",
                    path, self.limits.max_member_bytes
                )));
            }

            let mut data = Vec::with_capacity(declared as usize);
            entry
                .take(self.limits.max_member_bytes + 1)
                .read_to_end(&mut data)
                .map_err(|e| AssetError::malformed(format!("read '{}': {}", path, e)))?;
            if data.len() as u64 > self.limits.max_member_bytes {
                return Err(AssetError::malformed(format!(
                    "member '{}' exceeds {} bytes",
                    path, self.limits.max_member_bytes
                )));
            }

            total_bytes += data.len() as u64;
            if total_bytes > self.limits.max_total_bytes {
                return Err(AssetError::malformed(format!(
                    "archive exceeds {} uncompressed bytes",
                    self.limits.max_total_bytes
                )));
            }

            members.push((path, data));
        }

        Ok(members)
    }
}

/// Read an archive and return the root-stripped path -> content mapping
///
/// This mapping, not the raw archive, is what the import pipeline consumes.
pub fn contents_from_bundle(data: &[u8]) -> AssetResult<BTreeMap<String, String>> {
    Ok(BundleReader::with_defaults().read(data)?.bundle.to_contents())
}
