//! Entity model layer for invsync.
//!
//! Defines the declarative description of every reconcilable entity type:
//! - [`EntitySchema`]: identity fields, attribute fields and children of a type
//! - [`Entity`]: one identity-keyed instance with its field values
//! - [`ModelFamily`]: the set of types one sync reconciles, with their
//!   parent-before-child order
//! - [`dcim`]: the concrete catalogue (buildings through cables)
//!
//! Schemas carry no behaviour beyond key computation and attribute
//! comparison. Persistence lives with the target adapters in `invsync-sync`.

pub mod dcim;
mod entity;
mod error;
mod family;
mod schema;

pub use entity::Entity;
pub use error::{ModelError, ModelResult};
pub use family::{ModelFamily, ModelFamilyBuilder};
pub use schema::{ChildSpec, EntitySchema, FieldSpec, FieldType};
