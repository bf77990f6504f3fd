//! Core type definitions for invsync.
//!
//! This crate defines the small, domain-agnostic types shared by every
//! layer of the reconciliation engine:
//! - [`FieldValue`]: a tagged field value with per-kind equality rules
//! - [`IdentityKey`]: the hashable, order-stable key naming an entity
//! - [`RecordId`] / [`RunId`]: opaque handles (UUID v7)
//!
//! Nothing here knows about buildings, devices or cables; that lives in
//! `invsync-model`.

mod ids;
mod key;
mod value;

pub use ids::{RecordId, RunId};
pub use key::{IdentityKey, KeyPart};
pub use value::{FieldValue, Fields};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("value of kind {0} cannot be part of an identity key")]
    UnhashableKeyPart(&'static str),
}
