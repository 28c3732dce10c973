//! Bundle member path codec
//!
//! Archive members live under one top-level directory (the bundle root).
//! Everything past the reader works on root-relative, normalized paths:
//! forward slashes only, no empty segments, no `..`, never absolute.

use assetport_core::{AssetError, AssetResult};

/// Normalize a raw member path
///
/// `.` segments are dropped. Absolute paths, backslashes, drive prefixes,
/// NUL bytes, empty segments and `..` segments are rejected.
pub fn normalize(raw: &str) -> AssetResult<String> {
    if raw.is_empty() {
        return Err(AssetError::invalid_path(raw, "empty path"));
    }
    if raw.contains('\0') {
        return Err(AssetError::invalid_path(raw, "contains NUL byte"));
    }
    if raw.contains('\\') {
        return Err(AssetError::invalid_path(raw, "backslash separator"));
    }
    if raw.starts_with('/') {
        return Err(AssetError::invalid_path(raw, "absolute path"));
    }

    let mut segments = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" => return Err(AssetError::invalid_path(raw, "empty path segment")),
            "." => continue,
            ".." => return Err(AssetError::invalid_path(raw, "parent directory segment")),
            s if s.len() == 2 && s.ends_with(':') && segments.is_empty() => {
                return Err(AssetError::invalid_path(raw, "drive prefix"))
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return Err(AssetError::invalid_path(raw, "path resolves to bundle root"));
    }
    Ok(segments.join("/"))
}

/// Split a normalized path into its top-level directory and the remainder
///
/// Returns `None` for paths with a single segment.
pub fn split_root(path: &str) -> Option<(&str, &str)> {
    path.split_once('/')
}

/// Strip `root/` from a normalized path
pub fn strip_root(path: &str, root: &str) -> AssetResult<String> {
    match split_root(path) {
        Some((first, rest)) if first == root => Ok(rest.to_string()),
        _ => Err(AssetError::malformed(format!(
            "member '{}' is not under root '{}'",
            path, root
        ))),
    }
}

/// Validate a bundle root label (a single path segment)
pub fn validate_root(root: &str) -> AssetResult<()> {
    let normalized = normalize(root)?;
    if normalized != root || root.contains('/') {
        return Err(AssetError::invalid_path(
            root,
            "bundle root must be a single path segment",
        ));
    }
    Ok(())
}
