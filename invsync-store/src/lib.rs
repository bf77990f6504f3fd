//! Storage for invsync.
//!
//! Two stores live here:
//!
//! - [`GraphStore`] holds every entity loaded for one side of a sync,
//!   indexed by entity type and identity key. It is built fresh by an
//!   adapter's `load()` and dropped at the end of the run.
//! - [`ScopeStore`] is the small persisted mapping from an external
//!   tenant to the building it corresponds to, read once per run to
//!   decide what to sync.

mod error;
mod graph;
mod scope;

pub use error::{StoreError, StoreResult};
pub use graph::{Entities, GraphStore};
pub use scope::{ScopeStore, Tenant, TenantLink};
