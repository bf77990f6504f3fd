//! Adapters that populate a [`GraphStore`] for one side of a sync.
//!
//! Source adapters read an external provider through the async traits in
//! [`crate::provider`]. The target adapter reads the inventory of record
//! and also builds the [`ResolutionContext`] the persisters use when the
//! diff is applied.

mod inventory;
mod locations;
mod network;
mod resolution;

pub use inventory::{InventoryTarget, TargetLoad, TargetScope};
pub use locations::LocationSource;
pub use network::{NetworkSource, ScopeSelection};
pub use resolution::ResolutionContext;

use crate::{SyncConfig, SyncResult};
use async_trait::async_trait;
use invsync_model::{Entity, ModelFamily};
use invsync_store::{GraphStore, StoreError};
use invsync_types::IdentityKey;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Per-run settings handed to every adapter.
#[derive(Debug, Clone, Copy)]
pub struct LoadContext<'a> {
    pub config: &'a SyncConfig,
    /// Emit per-entity messages at `info` instead of `debug`.
    pub debug: bool,
}

/// A populated graph plus what was dropped on the way.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub graph: GraphStore,
    /// Records skipped per entity type (duplicates and invalid records).
    pub skipped: BTreeMap<String, usize>,
    pub diagnostics: Vec<String>,
}

/// An adapter that builds the source graph.
///
/// Every call to `load` starts from an empty graph; nothing carries over
/// between calls.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn load(&self, family: Arc<ModelFamily>, ctx: &LoadContext<'_>) -> SyncResult<Loaded>;
}

/// Accumulates a [`Loaded`] while an adapter walks its input.
pub(crate) struct GraphBuilder {
    loaded: Loaded,
    debug: bool,
    side: &'static str,
}

impl GraphBuilder {
    pub(crate) fn new(family: Arc<ModelFamily>, side: &'static str, debug: bool) -> Self {
        Self {
            loaded: Loaded {
                graph: GraphStore::new(family),
                skipped: BTreeMap::new(),
                diagnostics: Vec::new(),
            },
            debug,
            side,
        }
    }

    /// Adds an entity and returns its key, or `None` when an entity with
    /// the same identity was already loaded. The first one wins.
    pub(crate) fn add(&mut self, entity: Entity) -> SyncResult<Option<IdentityKey>> {
        let entity_type = entity.entity_type().to_string();
        let key = entity.key().clone();
        match self.loaded.graph.add(entity) {
            Ok(()) => {
                verbose!(self.debug, "{}: loaded {entity_type} {key}", self.side);
                Ok(Some(key))
            }
            Err(StoreError::DuplicateIdentity { entity_type, key }) => {
                warn!("{}: duplicate {entity_type} {key}, keeping the first", self.side);
                self.skip(&entity_type, format!("duplicate {entity_type} {key}"));
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Records `child` under `parent` when both were loaded.
    pub(crate) fn attach(
        &mut self,
        parent: (&str, &IdentityKey),
        child: (&str, &IdentityKey),
    ) -> SyncResult<()> {
        self.loaded
            .graph
            .add_child(parent.0, parent.1, child.0, child.1)?;
        Ok(())
    }

    /// Adds `entity` and attaches it to `parent` if it was new.
    pub(crate) fn add_under(
        &mut self,
        parent: Option<(&str, &IdentityKey)>,
        entity: Entity,
    ) -> SyncResult<Option<IdentityKey>> {
        let entity_type = entity.entity_type().to_string();
        let key = self.add(entity)?;
        if let (Some(parent), Some(key)) = (parent, &key) {
            self.attach(parent, (&entity_type, key))?;
        }
        Ok(key)
    }

    /// Counts a dropped record and keeps the reason for the report.
    pub(crate) fn skip(&mut self, entity_type: &str, reason: String) {
        *self.loaded.skipped.entry(entity_type.to_string()).or_default() += 1;
        self.loaded.diagnostics.push(reason);
    }

    pub(crate) fn diagnostic(&mut self, message: String) {
        self.loaded.diagnostics.push(message);
    }

    pub(crate) fn finish(self) -> Loaded {
        self.loaded
    }
}
