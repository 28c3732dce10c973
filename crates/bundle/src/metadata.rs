//! Bundle metadata descriptor (`metadata.yaml`)
//!
//! The metadata record is the first logical record of every bundle:
//!
//! ```yaml
//! version: 1.0.0
//! type: assets
//! timestamp: '2022-01-01T00:00:00+00:00'
//! ```
//!
//! ## Version policy
//!
//! The major version must equal the engine's major version. Minor and patch
//! may be older than the engine's (backward-compatible reads) but never newer.

use assetport_core::{AssetError, AssetResult, EntityKind};
use chrono::{DateTime, FixedOffset, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version written by this engine and the newest one it reads
pub const SUPPORTED_VERSION: BundleVersion = BundleVersion {
    major: 1,
    minor: 0,
    patch: 0,
};

/// Dotted `major.minor.patch` bundle format version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BundleVersion {
    /// Incompatible format changes
    pub major: u32,
    /// Backward-compatible additions
    pub minor: u32,
    /// Fixes
    pub patch: u32,
}

impl BundleVersion {
    /// Whether a bundle of this version can be read by an engine at `supported`
    pub fn is_readable_by(&self, supported: &BundleVersion) -> bool {
        self.major == supported.major
            && (self.minor, self.patch) <= (supported.minor, supported.patch)
    }
}

impl FromStr for BundleVersion {
    type Err = AssetError;

    fn from_str(s: &str) -> AssetResult<Self> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(AssetError::metadata_parse(format!(
                "version '{}' is not major.minor.patch",
                s
            )));
        }
        let component = |part: &str| {
            part.parse::<u32>().map_err(|_| {
                AssetError::metadata_parse(format!("version '{}' has non-numeric component", s))
            })
        };
        Ok(Self {
            major: component(parts[0])?,
            minor: component(parts[1])?,
            patch: component(parts[2])?,
        })
    }
}

impl fmt::Display for BundleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// What a bundle contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleType {
    /// Whole-instance export of every kind
    Assets,
    /// Export rooted at entities of one kind (plus their dependencies)
    Entity(EntityKind),
}

impl BundleType {
    /// Value written to the `type` field
    pub fn as_str(&self) -> &'static str {
        match self {
            BundleType::Assets => "assets",
            BundleType::Entity(kind) => kind.type_name(),
        }
    }
}

impl FromStr for BundleType {
    type Err = AssetError;

    fn from_str(s: &str) -> AssetResult<Self> {
        if s == "assets" {
            return Ok(BundleType::Assets);
        }
        EntityKind::from_type_name(s)
            .map(BundleType::Entity)
            .ok_or_else(|| AssetError::metadata_parse(format!("unknown bundle type '{}'", s)))
    }
}

impl fmt::Display for BundleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// On-disk shape of `metadata.yaml`
#[derive(Serialize, Deserialize)]
struct RawMetadata {
    version: String,
    #[serde(rename = "type")]
    bundle_type: String,
    timestamp: String,
}

/// Parsed metadata record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDescriptor {
    /// Format version
    pub version: BundleVersion,
    /// Bundle type
    pub bundle_type: BundleType,
    /// Export instant
    pub timestamp: DateTime<FixedOffset>,
}

impl MetadataDescriptor {
    /// Descriptor for a bundle exported now by this engine
    pub fn new(bundle_type: BundleType) -> Self {
        Self::at(bundle_type, Utc::now().trunc_subsecs(0).into())
    }

    /// Descriptor with an explicit timestamp
    pub fn at(bundle_type: BundleType, timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            version: SUPPORTED_VERSION,
            bundle_type,
            timestamp,
        }
    }

    /// Parse a metadata record
    pub fn parse(content: &str) -> AssetResult<Self> {
        let raw: RawMetadata = serde_yaml::from_str(content)
            .map_err(|e| AssetError::metadata_parse(e.to_string()))?;

        let version = raw.version.parse()?;
        let bundle_type = raw.bundle_type.parse()?;
        let timestamp = DateTime::parse_from_rfc3339(&raw.timestamp).map_err(|e| {
            AssetError::metadata_parse(format!("timestamp '{}': {}", raw.timestamp, e))
        })?;

        Ok(Self {
            version,
            bundle_type,
            timestamp,
        })
    }

    /// Check version compatibility and bundle type
    ///
    /// Version is checked first so that a bundle from an incompatible engine
    /// reports the version problem rather than a type problem.
    pub fn validate(&self, expected: BundleType) -> AssetResult<()> {
        if !self.version.is_readable_by(&SUPPORTED_VERSION) {
            return Err(AssetError::VersionMismatch {
                found: self.version.to_string(),
                supported: SUPPORTED_VERSION.to_string(),
            });
        }
        if self.bundle_type != expected {
            return Err(AssetError::TypeMismatch {
                expected: expected.to_string(),
                found: self.bundle_type.to_string(),
            });
        }
        Ok(())
    }

    /// Render the record as YAML (`version`, `type`, `timestamp` in that order)
    pub fn to_yaml(&self) -> AssetResult<String> {
        let raw = RawMetadata {
            version: self.version.to_string(),
            bundle_type: self.bundle_type.to_string(),
            timestamp: self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, false),
        };
        serde_yaml::to_string(&raw).map_err(|e| AssetError::metadata_parse(e.to_string()))
    }
}
