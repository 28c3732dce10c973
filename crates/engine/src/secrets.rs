//! Redaction Map: out-of-band secrets supplied at import time
//!
//! Keys are root-relative bundle paths (`databases/examples.yaml`), values
//! are the secret to inject into that payload. Only exact path matches have
//! an effect.

use assetport_bundle::split_root;
use assetport_core::{AssetError, AssetResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Path -> secret mapping
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedactionMap {
    entries: BTreeMap<String, String>,
}

impl RedactionMap {
    /// Empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON object transport form (`{"databases/a.yaml": "secret"}`)
    ///
    /// An empty string is treated as an empty map.
    ///
    /// # Errors
    ///
    /// `Validation` on `passwords` if the payload is not a JSON object of
    /// strings.
    pub fn from_json(payload: &str) -> AssetResult<Self> {
        if payload.trim().is_empty() {
            return Ok(Self::new());
        }
        let entries: BTreeMap<String, String> = serde_json::from_str(payload)
            .map_err(|e| AssetError::validation("passwords", e.to_string()))?;
        Ok(Self { entries })
    }

    /// Add or replace the secret for `path`
    pub fn insert(&mut self, path: impl Into<String>, secret: impl Into<String>) {
        self.entries.insert(path.into(), secret.into());
    }

    /// Secret for `path`, exact match only
    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    /// Re-key entries written with the archive root prefix
    ///
    /// `assets_export/databases/a.yaml` becomes `databases/a.yaml`. Keys that
    /// do not start with `root/` are kept as they are.
    pub fn strip_root(&self, root: &str) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|(path, secret)| {
                let key = match split_root(path) {
                    Some((first, rest)) if first == root => rest.to_string(),
                    _ => path.clone(),
                };
                (key, secret.clone())
            })
            .collect();
        Self { entries }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Paths with a secret, in sorted order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RedactionMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// Secrets never reach log output.
impl fmt::Debug for RedactionMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.keys().map(|k| (k, "***")))
            .finish()
    }
}
