//! Error types for the storage layer.

use invsync_types::IdentityKey;
use thiserror::Error;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An entity with the same type and identity key is already stored.
    #[error("duplicate {entity_type} with key {key}")]
    DuplicateIdentity {
        entity_type: String,
        key: IdentityKey,
    },

    /// No entity with this type and identity key.
    #[error("{entity_type} not found: {key}")]
    NotFound {
        entity_type: String,
        key: IdentityKey,
    },

    /// The entity type is not part of the store's model family.
    #[error("unknown entity type: {0}")]
    UnknownType(String),

    /// The parent type does not declare the child type.
    #[error("{parent} does not own {child} entities")]
    UndeclaredChild { parent: String, child: String },

    /// Schema violation while updating an entity.
    #[error("model error: {0}")]
    Model(#[from] invsync_model::ModelError),

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A lock guarding the connection was poisoned.
    #[error("storage lock poisoned")]
    LockPoisoned,
}
