//! Engine configuration via `assetport.toml`
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! same behavior as `EngineConfig::default()`.

use crate::import::{ImportOptions, DEFAULT_PARALLEL_THRESHOLD};
use assetport_bundle::{paths, validate_root, BundleType, ReaderLimits, WriteOptions};
use assetport_core::{AssetError, AssetResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config file name looked up next to the caller's data.
pub const CONFIG_FILE_NAME: &str = "assetport.toml";

/// Reader limits section (`[limits]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LimitsConfig {
    /// Maximum number of archive members
    #[serde(default = "default_max_members")]
    pub max_members: usize,
    /// Maximum uncompressed size of one member in bytes
    #[serde(default = "default_max_member_bytes")]
    pub max_member_bytes: u64,
    /// Maximum uncompressed size of the whole archive in bytes
    #[serde(default = "default_max_total_bytes")]
    pub max_total_bytes: u64,
}

fn default_max_members() -> usize {
    ReaderLimits::default().max_members
}

fn default_max_member_bytes() -> u64 {
    ReaderLimits::default().max_member_bytes
}

fn default_max_total_bytes() -> u64 {
    ReaderLimits::default().max_total_bytes
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_members: default_max_members(),
            max_member_bytes: default_max_member_bytes(),
            max_total_bytes: default_max_total_bytes(),
        }
    }
}

impl From<&LimitsConfig> for ReaderLimits {
    fn from(limits: &LimitsConfig) -> Self {
        ReaderLimits {
            max_members: limits.max_members,
            max_member_bytes: limits.max_member_bytes,
            max_total_bytes: limits.max_total_bytes,
        }
    }
}

/// Engine configuration loaded from `assetport.toml`.
///
/// # Example
///
/// ```toml
/// root = "assets_export"
/// compression_level = 3
/// # import_timeout_ms = 30000
/// parallel_threshold = 64
///
/// [limits]
/// max_members = 10000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Top-level directory label for written archives.
    #[serde(default = "default_root")]
    pub root: String,
    /// Zstd compression level (1-22).
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
    /// Import deadline in milliseconds. No deadline when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_timeout_ms: Option<u64>,
    /// Member count at which import deserialization goes parallel.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
    /// Archive reader limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

fn default_root() -> String {
    paths::DEFAULT_ROOT.to_string()
}

fn default_compression_level() -> i32 {
    WriteOptions::default().compression_level
}

fn default_parallel_threshold() -> usize {
    DEFAULT_PARALLEL_THRESHOLD
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            compression_level: default_compression_level(),
            import_timeout_ms: None,
            parallel_threshold: default_parallel_threshold(),
            limits: LimitsConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Check field ranges.
    ///
    /// # Errors
    ///
    /// `Config` if the compression level is outside 1..=22, the root is not a
    /// single safe path segment, or a limit is zero.
    pub fn validate(&self) -> AssetResult<()> {
        if !(1..=22).contains(&self.compression_level) {
            return Err(AssetError::config(format!(
                "compression_level {} in {} is outside 1..=22",
                self.compression_level, CONFIG_FILE_NAME
            )));
        }
        validate_root(&self.root)
            .map_err(|e| AssetError::config(format!("invalid root '{}': {}", self.root, e)))?;
        if self.limits.max_members == 0
            || self.limits.max_member_bytes == 0
            || self.limits.max_total_bytes == 0
        {
            return Err(AssetError::config("reader limits must be non-zero"));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# assetport configuration
#
# Top-level directory of written archives (default: "assets_export")
root = "assets_export"

# Zstd compression level, 1 (fastest) to 22 (smallest). Default: 3
compression_level = 3

# Abort an import that runs longer than this many milliseconds.
# Unset means no deadline.
# import_timeout_ms = 30000

# Member count at which payload deserialization runs in parallel.
parallel_threshold = 64

# Limits applied when reading archives from untrusted sources.
[limits]
max_members = 10000
max_member_bytes = 16777216
max_total_bytes = 268435456
"#
    }

    /// Parse config from TOML text and validate it.
    pub fn from_toml_str(content: &str) -> AssetResult<Self> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| AssetError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> AssetResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AssetError::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            AssetError::Config(msg) => {
                AssetError::config(format!("{} (in '{}')", msg, path.display()))
            }
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> AssetResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                AssetError::config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> AssetResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| AssetError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            AssetError::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Writer options derived from this config.
    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            compression_level: self.compression_level,
        }
    }

    /// Reader limits derived from this config.
    pub fn reader_limits(&self) -> ReaderLimits {
        ReaderLimits::from(&self.limits)
    }

    /// Import deadline, if configured.
    pub fn import_timeout(&self) -> Option<Duration> {
        self.import_timeout_ms.map(Duration::from_millis)
    }

    /// Import options for bundles of `expected` type.
    pub fn import_options(&self, expected: BundleType) -> ImportOptions {
        ImportOptions {
            expected_type: expected,
            timeout: self.import_timeout(),
            parallel_threshold: Some(self.parallel_threshold),
            ..ImportOptions::default()
        }
    }
}
