//! Reconciliation engine for invsync.
//!
//! A sync run compares two snapshots of one [`ModelFamily`]: a source
//! graph built from an external provider and a target graph built from
//! the inventory of record. The diff between them is a list of creates
//! and updates that the apply engine hands to per-type persisters.
//!
//! ```text
//! provider ──► SourceAdapter ──► GraphStore (source) ─┐
//!                                                     ├─► diff ─► apply ─► SyncReport
//! inventory ─► InventoryTarget ─► GraphStore (target) ┘
//! ```
//!
//! Sync is additive: keys found only in the target are counted but never
//! deleted.
//!
//! [`ModelFamily`]: invsync_model::ModelFamily

/// Logs at `info` when the run asked for debug output, `debug` otherwise.
macro_rules! verbose {
    ($enabled:expr, $($arg:tt)+) => {
        if $enabled {
            tracing::info!($($arg)+)
        } else {
            tracing::debug!($($arg)+)
        }
    };
}

pub mod adapter;
pub mod applicator;
pub mod cabling;
mod config;
pub mod diff;
mod engine;
mod error;
pub mod persist;
pub mod provider;
mod report;

pub use config::{DEFAULT_PAGE_SIZE, StatusNames, SyncConfig};
pub use diff::{Change, Diff, Operation};
pub use engine::{Reconciler, RunParams, run_location_sync, run_network_sync};
pub use error::{PersistError, SyncError, SyncResult};
pub use report::{Failure, SyncReport, TypeCounts};
