//! Error types for the model layer.
//!
//! Every variant here is a configuration error: either a schema is
//! malformed or an adapter built an entity that does not satisfy it.

use crate::FieldType;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while declaring schemas or constructing entities.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A required identity field is absent or null.
    #[error("{entity_type}: missing identity field `{field}`")]
    MissingIdentityField { entity_type: String, field: String },

    /// A declared field holds a value of the wrong kind.
    #[error("{entity_type}: field `{field}` expects {expected:?}, got {found}")]
    FieldTypeMismatch {
        entity_type: String,
        field: String,
        expected: FieldType,
        found: &'static str,
    },

    /// An update tried to change a field that is part of the identity.
    #[error("{entity_type}: identity field `{field}` cannot be updated")]
    ImmutableIdentityField { entity_type: String, field: String },

    /// The schema itself is malformed.
    #[error("invalid schema for {entity_type}: {reason}")]
    InvalidSchema { entity_type: String, reason: String },

    /// Two schemas registered under the same type name.
    #[error("entity type registered twice: {0}")]
    DuplicateType(String),

    /// A type was referenced but never registered.
    #[error("unknown entity type: {0}")]
    UnknownType(String),

    /// A children map names a type that was not registered.
    #[error("{parent} declares unknown child type {child}")]
    UnknownChildType { parent: String, child: String },

    /// The children maps form a cycle.
    #[error("children declarations form a cycle through {0}")]
    CyclicChildren(String),

    /// A registered type is neither top-level nor anybody's child.
    #[error("entity type {0} is not reachable from any top-level type")]
    UnreachableType(String),

    /// An identity value could not be turned into a key part.
    #[error("identity key error: {0}")]
    Key(#[from] invsync_types::Error),
}
