//! Target inventory store for invsync.
//!
//! The system of record that target adapters read and write. Records are
//! typed by [`RecordKind`] and carry a JSON object; every create and
//! update is validated against the kind's required fields, references,
//! unique-together constraints and value rules before it is stored.
//!
//! Two backends implement [`InventoryBackend`]:
//!
//! - [`MemoryInventory`] for tests and dry experiments
//! - [`SqliteInventory`] for an on-disk store (one JSON column per record)

mod backend;
mod constraints;
mod error;
mod memory;
mod record;
mod sqlite;

pub use backend::InventoryBackend;
pub use error::{InventoryError, InventoryResult};
pub use memory::MemoryInventory;
pub use record::{Filter, Record, RecordKind};
pub use sqlite::SqliteInventory;
