//! Import pipeline
//!
//! Content pairs -> store, all or nothing:
//!
//! 1. normalize every path, locate and validate `metadata.yaml`
//! 2. deserialize every payload under a known kind directory
//! 3. inject secrets from the redaction map (exact path match)
//! 4. order by dependencies, check references that leave the bundle
//! 5. apply inside one transaction guard, then commit
//!
//! Steps 1-4 never touch the store's write side. Any error in step 5 drops
//! the guard, which rolls back.

use crate::auth::{authorize_kinds, Action, Authorizer};
use crate::config::EngineConfig;
use crate::ordering::order_records;
use crate::secrets::RedactionMap;
use crate::store::AssetStore;
use crate::transaction::TransactionGuard;
use assetport_bundle::{normalize, paths, BundleReader, BundleType, MetadataDescriptor};
use assetport_core::{AssetError, AssetResult, EntityKind, EntityRecord, EntityRef};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Payload count at which deserialization moves to the rayon pool
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 64;

/// Import behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// Bundle type the metadata record must declare
    pub expected_type: BundleType,
    /// Replace entities that already exist (default: true)
    pub overwrite: bool,
    /// Deadline for the apply phase, checked between entities and before commit
    ///
    /// `None` means no deadline, or the configured one for archive imports.
    pub timeout: Option<Duration>,
    /// Payload count at which deserialization runs on the rayon pool
    ///
    /// `None` means [`DEFAULT_PARALLEL_THRESHOLD`], or the configured value
    /// for archive imports.
    pub parallel_threshold: Option<usize>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            expected_type: BundleType::Assets,
            overwrite: true,
            timeout: None,
            parallel_threshold: None,
        }
    }
}

impl ImportOptions {
    /// Options for a single-kind bundle
    pub fn for_kind(kind: EntityKind) -> Self {
        Self {
            expected_type: BundleType::Entity(kind),
            ..Self::default()
        }
    }

    /// Set `overwrite`
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Set the apply deadline
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the parallel deserialization threshold
    pub fn parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = Some(threshold);
        self
    }

    /// Fill unset fields from `config`
    pub fn with_config_defaults(&self, config: &EngineConfig) -> Self {
        Self {
            timeout: self.timeout.or_else(|| config.import_timeout()),
            parallel_threshold: self.parallel_threshold.or(Some(config.parallel_threshold)),
            ..self.clone()
        }
    }
}

/// Outcome of a committed import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Entities written, in apply order
    pub imported: Vec<EntityRef>,
    /// Existing entities left untouched because `overwrite` was off
    pub skipped_existing: Vec<EntityRef>,
    /// Members outside every known kind directory
    pub ignored_paths: Vec<String>,
    /// Records that received a secret from the redaction map
    pub secrets_applied: usize,
}

impl ImportReport {
    /// Number of entities written
    pub fn imported_count(&self) -> usize {
        self.imported.len()
    }

    /// Number of members skipped as unknown
    pub fn ignored_count(&self) -> usize {
        self.ignored_paths.len()
    }
}

/// Import a path -> content mapping into `store`
///
/// # Errors
///
/// Every error leaves the store unchanged:
/// - `InvalidPath` for unsafe member paths
/// - `MalformedBundle` when paths collide after normalization or metadata is missing
/// - `MetadataParse`, `VersionMismatch`, `TypeMismatch` for the metadata record
/// - `Unauthorized` when a contained kind may not be imported
/// - `Deserialization` / `Validation` for individual payloads
/// - `CyclicDependency` when the bundle's references loop
/// - `Timeout` when the deadline passes before commit
pub fn import<S, A>(
    store: &S,
    authorizer: &A,
    contents: &BTreeMap<String, String>,
    passwords: &RedactionMap,
    options: &ImportOptions,
) -> AssetResult<ImportReport>
where
    S: AssetStore + ?Sized,
    A: Authorizer + ?Sized,
{
    let members = normalize_members(contents)?;

    let metadata = members
        .get(paths::METADATA)
        .ok_or_else(|| AssetError::malformed(format!("missing {} record", paths::METADATA)))?;
    let descriptor = MetadataDescriptor::parse(metadata)?;
    descriptor.validate(options.expected_type)?;
    debug!(
        target: "assetport::import",
        bundle_type = %descriptor.bundle_type,
        version = %descriptor.version,
        members = members.len(),
        "Import started"
    );

    let mut report = ImportReport::default();
    let mut payloads = Vec::with_capacity(members.len());
    for (path, content) in &members {
        if *path == paths::METADATA {
            continue;
        }
        match EntityKind::from_path(path) {
            Some(kind) => payloads.push((kind, path.as_str(), *content)),
            None => {
                warn!(target: "assetport::import", path = %path, "Skipping member outside known kind directories");
                report.ignored_paths.push(path.clone());
            }
        }
    }

    let kinds: BTreeSet<EntityKind> = payloads.iter().map(|(kind, _, _)| *kind).collect();
    authorize_kinds(authorizer, Action::Import, kinds)?;

    let threshold = options
        .parallel_threshold
        .unwrap_or(DEFAULT_PARALLEL_THRESHOLD);
    let mut records = deserialize_all(&payloads, threshold)?;

    for (path, record) in &mut records {
        if let Some(secret) = passwords.get(path) {
            if record.inject_secret(secret) {
                report.secrets_applied += 1;
            }
        }
    }

    let records: Vec<EntityRecord> = records.into_iter().map(|(_, r)| r).collect();
    let order = order_records(&records)?;
    let in_bundle: HashSet<EntityRef> = records.iter().map(EntityRecord::entity_ref).collect();

    let mut guard = TransactionGuard::begin(store, options.timeout)?;
    for index in order {
        guard.check_deadline()?;
        let mut record = records[index].clone();
        let entity = record.entity_ref();

        for dep in record.dependencies() {
            if !in_bundle.contains(&dep) && guard.get(&dep)?.is_none() {
                return Err(AssetError::validation(
                    entity.to_string(),
                    format!("references {} which is neither in the bundle nor in the store", dep),
                ));
            }
        }

        if let Some(existing) = guard.get(&entity)? {
            if !options.overwrite {
                debug!(target: "assetport::import", entity = %entity, "Keeping existing entity");
                report.skipped_existing.push(entity);
                continue;
            }
            record.preserve_secrets_from(&existing);
        }

        if record.has_masked_secret() {
            debug!(target: "assetport::import", entity = %entity, "Secret placeholder kept; no redaction entry");
        }
        guard.put(record)?;
        report.imported.push(entity);
    }
    guard.commit()?;

    info!(
        target: "assetport::import",
        bundle_type = %descriptor.bundle_type,
        imported = report.imported.len(),
        skipped = report.skipped_existing.len(),
        ignored = report.ignored_paths.len(),
        secrets = report.secrets_applied,
        "Import committed"
    );
    Ok(report)
}

/// Read an archive and import it
///
/// Redaction keys that carry the archive root are re-keyed first. Fields
/// left unset in `options` take the config's deadline and parallel threshold;
/// fields set in `options` win.
pub fn import_archive<S, A>(
    store: &S,
    authorizer: &A,
    data: &[u8],
    passwords: &RedactionMap,
    options: &ImportOptions,
    config: &EngineConfig,
) -> AssetResult<ImportReport>
where
    S: AssetStore + ?Sized,
    A: Authorizer + ?Sized,
{
    let archive = BundleReader::new(config.reader_limits()).read(data)?;
    let passwords = passwords.strip_root(&archive.root);
    import(
        store,
        authorizer,
        &archive.bundle.to_contents(),
        &passwords,
        &options.with_config_defaults(config),
    )
}

/// Read an archive file and import it
pub fn import_file<S, A>(
    store: &S,
    authorizer: &A,
    path: &Path,
    passwords: &RedactionMap,
    options: &ImportOptions,
    config: &EngineConfig,
) -> AssetResult<ImportReport>
where
    S: AssetStore + ?Sized,
    A: Authorizer + ?Sized,
{
    let data = std::fs::read(path)?;
    import_archive(store, authorizer, &data, passwords, options, config)
}

/// Normalize every key, rejecting collisions
fn normalize_members(contents: &BTreeMap<String, String>) -> AssetResult<BTreeMap<String, &str>> {
    let mut members = BTreeMap::new();
    for (raw, content) in contents {
        let path = normalize(raw)?;
        if members.insert(path.clone(), content.as_str()).is_some() {
            return Err(AssetError::malformed(format!(
                "duplicate member path '{}' after normalization",
                path
            )));
        }
    }
    Ok(members)
}

/// Deserialize payloads, in parallel above `threshold`, preserving order
fn deserialize_all(
    payloads: &[(EntityKind, &str, &str)],
    threshold: usize,
) -> AssetResult<Vec<(String, EntityRecord)>> {
    let one = |(kind, path, content): &(EntityKind, &str, &str)| {
        kind.deserialize(path, content)
            .map(|record| (path.to_string(), record))
    };
    if payloads.len() >= threshold.max(1) {
        payloads.par_iter().map(one).collect()
    } else {
        payloads.iter().map(one).collect()
    }
}
