//! The control loop: load source, load target, diff, then stop (dry run)
//! or apply.

use crate::adapter::{
    InventoryTarget, LoadContext, LocationSource, NetworkSource, ScopeSelection, SourceAdapter,
    TargetScope,
};
use crate::persist::PersistContext;
use crate::provider::{NetworkDiscovery, TenantDirectory};
use crate::{SyncConfig, SyncReport, SyncResult, applicator, diff};
use chrono::Utc;
use invsync_inventory::InventoryBackend;
use invsync_model::{ModelFamily, dcim};
use invsync_store::ScopeStore;
use std::sync::Arc;
use tracing::info;

/// Parameters of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunParams {
    /// Compute and report the changes without applying them.
    pub dry_run: bool,
    /// Log per-entity progress at `info`.
    pub debug: bool,
}

/// Runs syncs for one model family.
///
/// Holds no state between runs: every call to [`run`](Self::run) builds
/// fresh graphs from both sides.
pub struct Reconciler {
    family: Arc<ModelFamily>,
    config: SyncConfig,
}

impl Reconciler {
    /// Fails on a config no run could use.
    pub fn new(family: ModelFamily, config: SyncConfig) -> SyncResult<Self> {
        config.validate()?;
        Ok(Self {
            family: Arc::new(family),
            config,
        })
    }

    pub fn family(&self) -> &ModelFamily {
        &self.family
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub async fn run(
        &self,
        source: &dyn SourceAdapter,
        target: &InventoryTarget,
        params: RunParams,
    ) -> SyncResult<SyncReport> {
        let mut report = SyncReport::new(self.family.name(), params.dry_run, self.family.order());
        info!(
            "sync {} started: family {}, dry run {}",
            report.run_id,
            self.family.name(),
            params.dry_run
        );
        let ctx = LoadContext {
            config: &self.config,
            debug: params.debug,
        };

        let source_load = source.load(Arc::clone(&self.family), &ctx).await?;
        let target_load = target.load(Arc::clone(&self.family), &ctx)?;
        let mut target_graph = target_load.loaded.graph;
        let mut resolution = target_load.resolution;

        let skipped = source_load.skipped.iter().chain(&target_load.loaded.skipped);
        for (entity_type, count) in skipped {
            report.counts_mut(entity_type).skipped += count;
        }
        report.diagnostics.extend(source_load.diagnostics);
        report.diagnostics.extend(target_load.loaded.diagnostics);

        let diff = diff::diff(&self.family, &source_load.graph, &target_graph)?;
        for (entity_type, unchanged) in &diff.unchanged {
            report.counts_mut(entity_type).unchanged += unchanged;
        }
        info!("sync {}: {} changes to apply", report.run_id, diff.changes.len());

        if params.dry_run {
            applicator::summarize(&diff, &mut report);
        } else {
            let mut persist = PersistContext {
                inventory: target.inventory(),
                resolution: &mut resolution,
                config: &self.config,
                debug: params.debug,
            };
            applicator::apply(&diff, &mut target_graph, &mut persist, &mut report);
        }

        report.finished_at = Utc::now();
        let totals = report.totals();
        info!(
            "sync {} finished: {} created, {} updated, {} unchanged, {} skipped, {} failed",
            report.run_id,
            totals.created,
            totals.updated,
            totals.unchanged,
            totals.skipped,
            totals.failed
        );
        Ok(report)
    }
}

/// Syncs every live building and its rooms into the inventory.
pub async fn run_location_sync(
    directory: Arc<dyn TenantDirectory>,
    inventory: Arc<dyn InventoryBackend>,
    config: SyncConfig,
    params: RunParams,
) -> SyncResult<SyncReport> {
    let reconciler = Reconciler::new(dcim::locations_family()?, config)?;
    let source = LocationSource::new(directory);
    let target = InventoryTarget::new(inventory, TargetScope::Locations);
    reconciler.run(&source, &target, params).await
}

/// Syncs the network of the building linked to `tenant_id`.
///
/// The tenant must be linked in `scope`; otherwise the run stops before
/// anything is loaded.
pub async fn run_network_sync(
    discovery: Arc<dyn NetworkDiscovery>,
    inventory: Arc<dyn InventoryBackend>,
    scope: &ScopeStore,
    tenant_id: &str,
    config: SyncConfig,
    params: RunParams,
) -> SyncResult<SyncReport> {
    let selection = ScopeSelection::resolve(scope, tenant_id)?;
    let reconciler = Reconciler::new(dcim::network_family()?, config)?;
    let target = InventoryTarget::new(
        inventory,
        TargetScope::Building(selection.building.clone()),
    );
    let source = NetworkSource::new(discovery, selection);
    reconciler.run(&source, &target, params).await
}
