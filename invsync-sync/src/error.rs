//! Error types for the sync layer.

use invsync_inventory::InventoryError;
use invsync_model::ModelError;
use invsync_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that abort a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Bad schema, missing scope mapping or unusable configuration.
    /// Raised before anything is loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// A source provider failed while paging.
    #[error("provider error: {0}")]
    Provider(String),

    /// An adapter built an entity its schema rejects.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Store error outside the recoverable duplicate case.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The target inventory failed while loading.
    #[error("inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (fixture files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from one create, update or delete against the target.
///
/// These never abort a run: the apply engine records them against the
/// change and moves on.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Deletion is not performed for this entity type.
    #[error("delete is disabled for {0}")]
    DeleteDisabled(String),

    /// A referenced object could not be found by name.
    #[error("cannot resolve {what} {name:?}")]
    Unresolved { what: &'static str, name: String },

    /// The change lacks a field the operation needs.
    #[error("missing field `{0}`")]
    MissingField(String),

    /// The target entity was not loaded from a persisted record.
    #[error("{entity_type} {key} has no persisted record")]
    NoHandle { entity_type: String, key: String },

    /// No persister is registered for the entity type.
    #[error("no persister for entity type {0}")]
    NoPersister(String),

    /// The inventory rejected the operation.
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}
