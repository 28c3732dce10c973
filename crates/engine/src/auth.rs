//! Authorization capability
//!
//! Export and import entry points take an `Authorizer` explicitly. There is
//! no ambient "current user": the caller decides what this call may touch.

use assetport_core::{AssetError, AssetResult, EntityKind};
use std::collections::HashSet;
use std::fmt;

/// Operation being authorized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Read entities out of the store
    Export,
    /// Write entities into the store
    Import,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Export => f.write_str("export"),
            Action::Import => f.write_str("import"),
        }
    }
}

/// Decides whether an action on a kind is allowed
pub trait Authorizer: Send + Sync {
    /// Returns `Unauthorized` when `action` on `kind` is refused
    fn authorize(&self, action: Action, kind: EntityKind) -> AssetResult<()>;
}

/// Permits everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, _action: Action, _kind: EntityKind) -> AssetResult<()> {
        Ok(())
    }
}

/// Explicit grant list
///
/// Starts empty (denies everything); grants are added with the builder
/// methods.
#[derive(Debug, Clone, Default)]
pub struct Permissions {
    granted: HashSet<(Action, EntityKind)>,
}

impl Permissions {
    /// Empty grant list
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `action` on `kind`
    pub fn grant(mut self, action: Action, kind: EntityKind) -> Self {
        self.granted.insert((action, kind));
        self
    }

    /// Allow `action` on every kind
    pub fn grant_all(mut self, action: Action) -> Self {
        for kind in EntityKind::ALL {
            self.granted.insert((action, kind));
        }
        self
    }

    /// Whether `action` on `kind` is granted
    pub fn allows(&self, action: Action, kind: EntityKind) -> bool {
        self.granted.contains(&(action, kind))
    }
}

impl Authorizer for Permissions {
    fn authorize(&self, action: Action, kind: EntityKind) -> AssetResult<()> {
        if self.allows(action, kind) {
            Ok(())
        } else {
            Err(AssetError::Unauthorized(format!("{} {}", action, kind)))
        }
    }
}

impl<A: Authorizer + ?Sized> Authorizer for &A {
    fn authorize(&self, action: Action, kind: EntityKind) -> AssetResult<()> {
        (**self).authorize(action, kind)
    }
}

/// Authorize `action` on every kind in `kinds`
pub(crate) fn authorize_kinds<A, I>(authorizer: &A, action: Action, kinds: I) -> AssetResult<()>
where
    A: Authorizer + ?Sized,
    I: IntoIterator<Item = EntityKind>,
{
    for kind in kinds {
        authorizer.authorize(action, kind)?;
    }
    Ok(())
}
