//! Error types for asset bundle operations
//!
//! Every failure the export/import machinery can report lives in one enum so
//! that callers (request handlers, CLIs) can match on the failing step.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use thiserror::Error;

/// Result type alias for asset operations
pub type AssetResult<T> = std::result::Result<T, AssetError>;

/// Errors that can occur while exporting, archiving or importing assets
#[derive(Debug, Error)]
pub enum AssetError {
    /// Path escapes the bundle root or is otherwise not normalizable
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath {
        /// Offending raw path
        path: String,
        /// Why the path was rejected
        reason: String,
    },

    /// Container unreadable, duplicate members, missing metadata, inconsistent root
    #[error("Malformed bundle: {0}")]
    MalformedBundle(String),

    /// Metadata record is not valid structured text or lacks required fields
    #[error("Metadata parse error: {0}")]
    MetadataParse(String),

    /// Bundle version is outside the supported import range
    #[error("Unsupported bundle version {found} (supported: {supported})")]
    VersionMismatch {
        /// Version found in the bundle
        found: String,
        /// Version the engine writes and reads
        supported: String,
    },

    /// Bundle type does not match the requested operation
    #[error("Bundle type mismatch: expected '{expected}', found '{found}'")]
    TypeMismatch {
        /// Type the operation expects
        expected: String,
        /// Type declared by the bundle
        found: String,
    },

    /// Dependency graph contains a cycle
    #[error("Cyclic dependency between entities: {}", .cycle.join(" -> "))]
    CyclicDependency {
        /// Entities participating in the cycle, in edge order
        cycle: Vec<String>,
    },

    /// A single payload could not be deserialized
    #[error("Failed to deserialize '{path}': {reason}")]
    Deserialization {
        /// Bundle path of the payload
        path: String,
        /// Parser message
        reason: String,
    },

    /// An entity failed validation or could not be applied
    #[error("Validation failed for '{entity}': {reason}")]
    Validation {
        /// Entity reference or bundle path
        entity: String,
        /// Description of the problem
        reason: String,
    },

    /// Authorization capability refused the action
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// Import exceeded the caller-imposed deadline
    #[error("Import timed out after {elapsed_ms}ms (limit {limit_ms}ms)")]
    Timeout {
        /// Time spent before giving up
        elapsed_ms: u64,
        /// Configured limit
        limit_ms: u64,
    },

    /// Persistent store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl AssetError {
    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed bundle error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedBundle(msg.into())
    }

    /// Create a metadata parse error
    pub fn metadata_parse(msg: impl Into<String>) -> Self {
        Self::MetadataParse(msg.into())
    }

    /// Create a deserialization error for a bundle path
    pub fn deserialization(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Deserialization {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a validation error for an entity
    pub fn validation(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Stable machine-readable code for the failing step
    ///
    /// Request layers use this to build structured failure responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPath { .. } => "invalid_path",
            Self::MalformedBundle(_) => "malformed_bundle",
            Self::MetadataParse(_) => "metadata_parse",
            Self::VersionMismatch { .. } => "version_mismatch",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::CyclicDependency { .. } => "cyclic_dependency",
            Self::Deserialization { .. } => "deserialization",
            Self::Validation { .. } => "validation",
            Self::Unauthorized(_) => "unauthorized",
            Self::Timeout { .. } => "timeout",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
        }
    }
}
