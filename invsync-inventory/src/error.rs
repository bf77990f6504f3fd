//! Error types for the inventory store.

use crate::RecordKind;
use thiserror::Error;

/// Result type for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Errors that can occur in inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// No record matched the id or filter.
    #[error("{kind} not found: {detail}")]
    NotFound { kind: RecordKind, detail: String },

    /// A lookup that must be unique matched several records.
    #[error("{count} {kind} records match {filter}")]
    MultipleFound {
        kind: RecordKind,
        filter: String,
        count: usize,
    },

    /// Record data must be a JSON object.
    #[error("{0} data must be a JSON object")]
    NotAnObject(RecordKind),

    /// A required field is absent or null.
    #[error("{kind}: missing required field `{field}`")]
    MissingField { kind: RecordKind, field: String },

    /// A reference field does not point at an existing record of the right kind.
    #[error("{kind}: `{field}` references unknown {target} {value}")]
    InvalidReference {
        kind: RecordKind,
        field: String,
        target: RecordKind,
        value: String,
    },

    /// Another record already holds the same values for a unique-together set.
    #[error("{kind}: a record with the same {fields} already exists")]
    UniqueViolation { kind: RecordKind, fields: String },

    /// A field value is out of range or malformed.
    #[error("{kind}: invalid `{field}`: {reason}")]
    InvalidValue {
        kind: RecordKind,
        field: String,
        reason: String,
    },

    /// The record is still referenced by another record.
    #[error("{kind} {id} is referenced by a {by}")]
    InUse {
        kind: RecordKind,
        id: String,
        by: RecordKind,
    },

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored data could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// A lock guarding the store was poisoned.
    #[error("inventory lock poisoned")]
    LockPoisoned,
}
