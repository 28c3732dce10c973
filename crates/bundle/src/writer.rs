//! Asset bundle archive writer
//!
//! Creates .tar.zst archives containing, under one root directory:
//! - metadata.yaml - format version, bundle type, export timestamp (always first)
//! - <kind>/<identifier>.yaml - one member per entity, in the order given

use crate::path::validate_root;
use crate::types::{paths, xxh3_hex, ArchiveInfo, Bundle, ContentPair, WriteOptions};
use assetport_core::AssetResult;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tar::{Builder, Header};
use tracing::debug;

/// Writer for asset bundle archives
///
/// Pure codec: knows nothing about entity kinds, only paths and text.
pub struct BundleWriter {
    root: String,
    compression_level: i32,
}

impl BundleWriter {
    /// Create a writer storing members under `root`
    ///
    /// # Errors
    ///
    /// `InvalidPath` if `root` is not a single safe path segment.
    pub fn new(root: impl Into<String>, options: &WriteOptions) -> AssetResult<Self> {
        let root = root.into();
        validate_root(&root)?;
        Ok(Self {
            root,
            compression_level: options.compression_level,
        })
    }

    /// Create a writer with the default root and options
    pub fn with_defaults() -> Self {
        Self {
            root: paths::DEFAULT_ROOT.to_string(),
            compression_level: WriteOptions::default().compression_level,
        }
    }

    /// Root directory of written archives
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Write an archive into memory
    ///
    /// # Errors
    ///
    /// - `InvalidPath` if any pair path fails normalization
    /// - `MalformedBundle` on duplicate paths or a missing metadata record
    pub fn write(&self, pairs: &[ContentPair]) -> AssetResult<(Vec<u8>, ArchiveInfo)> {
        let bundle = Bundle::new(pairs.to_vec())?;

        let mut buffer = Vec::new();
        self.write_archive(&bundle, &mut buffer)?;

        let info = ArchiveInfo {
            root: self.root.clone(),
            path: PathBuf::new(),
            member_count: bundle.len(),
            size_bytes: buffer.len() as u64,
            checksum: xxh3_hex(&buffer),
        };
        debug!(
            target: "assetport::bundle",
            root = %self.root,
            members = info.member_count,
            bytes = info.size_bytes,
            "Bundle archive written"
        );
        Ok((buffer, info))
    }

    /// Write an archive to `path`
    ///
    /// This is an atomic operation - either the complete archive is written
    /// or no file is left behind.
    pub fn write_to_file(&self, pairs: &[ContentPair], path: &Path) -> AssetResult<ArchiveInfo> {
        let temp_path = path.with_extension("tmp");

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        match self.write_file_inner(pairs, &temp_path) {
            Ok(info) => {
                fs::rename(&temp_path, path)?;
                Ok(ArchiveInfo {
                    path: path.to_path_buf(),
                    ..info
                })
            }
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                Err(e)
            }
        }
    }

    fn write_file_inner(&self, pairs: &[ContentPair], path: &Path) -> AssetResult<ArchiveInfo> {
        let bundle = Bundle::new(pairs.to_vec())?;

        let file = File::create(path)?;
        let mut buf_writer = BufWriter::new(file);
        self.write_archive(&bundle, &mut buf_writer)?;
        buf_writer.flush()?;
        drop(buf_writer);

        let data = fs::read(path)?;
        Ok(ArchiveInfo {
            root: self.root.clone(),
            path: path.to_path_buf(),
            member_count: bundle.len(),
            size_bytes: data.len() as u64,
            checksum: xxh3_hex(&data),
        })
    }

    /// Stream the tar.zst container for `bundle` into `out`
    fn write_archive<W: Write>(&self, bundle: &Bundle, out: W) -> AssetResult<()> {
        let zstd_writer = zstd::Encoder::new(out, self.compression_level)?;

        let mut tar_builder = Builder::new(zstd_writer);
        for pair in bundle.pairs() {
            let member = format!("{}/{}", self.root, pair.path);
            self.add_file(&mut tar_builder, &member, pair.content.as_bytes())?;
        }

        let zstd_writer = tar_builder.into_inner()?;
        zstd_writer.finish()?;
        Ok(())
    }

    /// Add a file to the tar archive
    fn add_file<W: Write>(
        &self,
        builder: &mut Builder<W>,
        path: &str,
        data: &[u8],
    ) -> AssetResult<()> {
        let mut header = Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);

        // append_data handles long names via GNU extension headers
        builder
            .append_data(&mut header, path, data)
            .map_err(|e| io::Error::new(e.kind(), format!("append '{}': {}", path, e)))?;

        Ok(())
    }
}
