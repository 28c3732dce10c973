//! Export pipeline
//!
//! Store -> content pairs -> (optionally) archive.
//!
//! ```text
//! metadata.yaml                 always first
//! databases/<id>.yaml           then kinds in table order
//! datasets/<id>.yaml            identifiers sorted within a kind
//! charts/<id>.yaml
//! dashboards/<id>.yaml
//! queries/<id>.yaml
//! ```
//!
//! Secret fields of every exported record are replaced by the placeholder.

use crate::auth::{authorize_kinds, Action, Authorizer};
use crate::config::EngineConfig;
use crate::store::AssetStore;
use assetport_bundle::{
    paths, ArchiveInfo, BundleType, BundleWriter, ContentPair, MetadataDescriptor,
};
use assetport_core::{AssetError, AssetResult, EntityKind, EntityRecord, EntityRef};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

/// What to export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportScope {
    /// Every entity of every kind (bundle type `assets`)
    All,
    /// Selected entities of one kind plus everything they depend on
    Kind {
        /// Kind of the selected entities; also the bundle type
        kind: EntityKind,
        /// Identifiers to export
        identifiers: Vec<String>,
    },
}

impl ExportScope {
    /// Scope selecting `identifiers` of `kind`
    pub fn kind<I, S>(kind: EntityKind, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ExportScope::Kind {
            kind,
            identifiers: identifiers.into_iter().map(Into::into).collect(),
        }
    }

    /// Bundle type written to the metadata record
    pub fn bundle_type(&self) -> BundleType {
        match self {
            ExportScope::All => BundleType::Assets,
            ExportScope::Kind { kind, .. } => BundleType::Entity(*kind),
        }
    }
}

/// Export `scope` from `store` as ordered content pairs
///
/// # Errors
///
/// - `Unauthorized` if any exported kind is refused
/// - `Validation` if a selected entity or one of its dependencies is missing
pub fn export<S, A>(store: &S, authorizer: &A, scope: &ExportScope) -> AssetResult<Vec<ContentPair>>
where
    S: AssetStore + ?Sized,
    A: Authorizer + ?Sized,
{
    export_with_descriptor(
        store,
        authorizer,
        scope,
        &MetadataDescriptor::new(scope.bundle_type()),
    )
}

/// Export with an explicit metadata record
///
/// The descriptor's type must match the scope.
pub fn export_with_descriptor<S, A>(
    store: &S,
    authorizer: &A,
    scope: &ExportScope,
    descriptor: &MetadataDescriptor,
) -> AssetResult<Vec<ContentPair>>
where
    S: AssetStore + ?Sized,
    A: Authorizer + ?Sized,
{
    if descriptor.bundle_type != scope.bundle_type() {
        return Err(AssetError::TypeMismatch {
            expected: scope.bundle_type().to_string(),
            found: descriptor.bundle_type.to_string(),
        });
    }
    debug!(target: "assetport::export", bundle_type = %descriptor.bundle_type, "Export started");

    let selected = match scope {
        ExportScope::All => {
            authorize_kinds(authorizer, Action::Export, EntityKind::ALL)?;
            collect_all(store)?
        }
        ExportScope::Kind { kind, identifiers } => {
            authorizer.authorize(Action::Export, *kind)?;
            let selected = collect_closure(store, *kind, identifiers)?;
            let kinds: BTreeSet<EntityKind> = selected.keys().map(|r| r.kind).collect();
            authorize_kinds(authorizer, Action::Export, kinds)?;
            selected
        }
    };

    let mut pairs = Vec::with_capacity(selected.len() + 1);
    pairs.push(ContentPair::new(paths::METADATA, descriptor.to_yaml()?));
    let mut redacted = 0usize;
    for record in selected.values() {
        if record.kind.is_secret_bearing() {
            redacted += 1;
        }
        pairs.push(ContentPair::new(
            record.path(),
            record.redacted().to_payload()?,
        ));
    }

    info!(
        target: "assetport::export",
        bundle_type = %descriptor.bundle_type,
        entities = selected.len(),
        redacted,
        "Export completed"
    );
    Ok(pairs)
}

/// Export `scope` and encode it as an archive using `config`'s root and
/// compression level
pub fn export_archive<S, A>(
    store: &S,
    authorizer: &A,
    scope: &ExportScope,
    config: &EngineConfig,
) -> AssetResult<(Vec<u8>, ArchiveInfo)>
where
    S: AssetStore + ?Sized,
    A: Authorizer + ?Sized,
{
    let pairs = export(store, authorizer, scope)?;
    let writer = BundleWriter::new(config.root.clone(), &config.write_options())?;
    writer.write(&pairs)
}

/// Export `scope` into an archive file at `path` (atomic)
pub fn export_to_file<S, A>(
    store: &S,
    authorizer: &A,
    scope: &ExportScope,
    config: &EngineConfig,
    path: &Path,
) -> AssetResult<ArchiveInfo>
where
    S: AssetStore + ?Sized,
    A: Authorizer + ?Sized,
{
    let pairs = export(store, authorizer, scope)?;
    let writer = BundleWriter::new(config.root.clone(), &config.write_options())?;
    let info = writer.write_to_file(&pairs, path)?;
    info!(
        target: "assetport::export",
        path = %path.display(),
        members = info.member_count,
        bytes = info.size_bytes,
        "Export written"
    );
    Ok(info)
}

fn collect_all<S: AssetStore + ?Sized>(store: &S) -> AssetResult<BTreeMap<EntityRef, EntityRecord>> {
    let mut selected = BTreeMap::new();
    for kind in EntityKind::ALL {
        for record in store.list(kind)? {
            selected.insert(record.entity_ref(), record);
        }
    }
    Ok(selected)
}

/// Selected entities plus their transitive dependencies
fn collect_closure<S: AssetStore + ?Sized>(
    store: &S,
    kind: EntityKind,
    identifiers: &[String],
) -> AssetResult<BTreeMap<EntityRef, EntityRecord>> {
    let mut selected = BTreeMap::new();
    let mut pending: Vec<(EntityRef, Option<EntityRef>)> = identifiers
        .iter()
        .map(|id| (EntityRef::new(kind, id.clone()), None))
        .collect();

    while let Some((entity, referrer)) = pending.pop() {
        if selected.contains_key(&entity) {
            continue;
        }
        let record = store.get(&entity)?.ok_or_else(|| match &referrer {
            Some(from) => AssetError::validation(
                entity.to_string(),
                format!("referenced by {} but not found", from),
            ),
            None => AssetError::validation(entity.to_string(), "not found"),
        })?;
        for dep in record.dependencies() {
            if !selected.contains_key(&dep) {
                pending.push((dep, Some(entity.clone())));
            }
        }
        selected.insert(entity, record);
    }
    Ok(selected)
}
