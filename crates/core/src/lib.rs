//! Core types for assetport
//!
//! This crate defines the foundational types shared by the bundle codec and
//! the import/export engine:
//! - AssetError: error taxonomy for every export/import step
//! - EntityKind: closed set of entity kinds with a static directory lookup table
//! - EntityRef / EntityRecord: typed form of one bundle payload
//! - Secret placeholder handling (PASSWORD_MASK)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entity;
pub mod error;

pub use entity::{
    replace_uri_password, uri_password, validate_identifier, EntityKind, EntityRecord, EntityRef,
    IDENTIFIER_FIELD, PASSWORD_MASK, PAYLOAD_EXTENSION, URI_FIELD,
};
pub use error::{AssetError, AssetResult};
