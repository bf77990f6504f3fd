//! Command surface of the `invsync` binary.
//!
//! Kept in a library so the commands can be driven from tests without
//! spawning a process.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use invsync_inventory::SqliteInventory;
use invsync_store::ScopeStore;
use invsync_sync::provider::{FixtureNetworkDiscovery, FixtureTenantDirectory};
use invsync_sync::{RunParams, SyncConfig, SyncReport, run_location_sync, run_network_sync};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "invsync")]
#[command(about = "Reconcile building and network inventory against the inventory of record")]
pub struct Cli {
    /// JSON file overriding the default sync settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sync live buildings and their rooms
    Locations {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Sync the network of the building a tenant is linked to
    Network {
        /// External tenant id
        #[arg(long)]
        tenant: String,

        /// Scope store database
        #[arg(long)]
        scope_db: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Manage tenant-to-building links
    Scope {
        /// Scope store database
        #[arg(long, global = true, default_value = "scope.db")]
        scope_db: PathBuf,

        #[command(subcommand)]
        action: ScopeAction,
    },
}

/// Options shared by the sync commands.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Provider fixture (JSON)
    #[arg(long)]
    pub fixture: PathBuf,

    /// Inventory database
    #[arg(long)]
    pub inventory: PathBuf,

    /// Report the changes without applying them
    #[arg(long)]
    pub dry_run: bool,

    /// Log every loaded and persisted entity
    #[arg(long)]
    pub debug: bool,
}

impl RunArgs {
    fn params(&self) -> RunParams {
        RunParams {
            dry_run: self.dry_run,
            debug: self.debug,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ScopeAction {
    /// Register a tenant, or rename an existing one
    AddTenant { tenant_id: String, name: String },
    /// Link a tenant to a building, replacing any existing link
    Link { tenant_id: String, building: String },
    /// Remove a tenant's building link
    Unlink { tenant_id: String },
    /// List tenants and their links
    List,
}

/// What a command printed and whether it fully succeeded.
#[derive(Debug)]
pub struct Outcome {
    pub output: Value,
    pub success: bool,
}

impl Outcome {
    fn ok(output: Value) -> Self {
        Self {
            output,
            success: true,
        }
    }

    fn from_report(report: &SyncReport) -> Result<Self> {
        Ok(Self {
            output: serde_json::to_value(report).context("Failed to serialize sync report")?,
            success: report.is_success(),
        })
    }
}

/// Reads the sync settings, falling back to the defaults without a file.
pub fn load_config(path: Option<&Path>) -> Result<SyncConfig> {
    let Some(path) = path else {
        return Ok(SyncConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    SyncConfig::from_json(&json).with_context(|| format!("Invalid config {}", path.display()))
}

pub async fn execute(cli: &Cli) -> Result<Outcome> {
    match &cli.command {
        Command::Locations { run } => {
            let config = load_config(cli.config.as_deref())?;
            let directory = FixtureTenantDirectory::from_path(&run.fixture, config.page_size)
                .await
                .with_context(|| format!("Failed to load fixture {}", run.fixture.display()))?;
            let inventory = open_inventory(&run.inventory)?;
            let report = run_location_sync(Arc::new(directory), inventory, config, run.params())
                .await
                .context("Location sync failed")?;
            log_outcome(&report);
            Outcome::from_report(&report)
        }
        Command::Network {
            tenant,
            scope_db,
            run,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let scope = open_scope(scope_db)?;
            let discovery = FixtureNetworkDiscovery::from_path(&run.fixture, config.page_size)
                .await
                .with_context(|| format!("Failed to load fixture {}", run.fixture.display()))?;
            let inventory = open_inventory(&run.inventory)?;
            let report = run_network_sync(
                Arc::new(discovery),
                inventory,
                &scope,
                tenant,
                config,
                run.params(),
            )
            .await
            .with_context(|| format!("Network sync for tenant {tenant} failed"))?;
            log_outcome(&report);
            Outcome::from_report(&report)
        }
        Command::Scope { scope_db, action } => {
            let scope = open_scope(scope_db)?;
            scope_command(&scope, action)
        }
    }
}

fn scope_command(scope: &ScopeStore, action: &ScopeAction) -> Result<Outcome> {
    match action {
        ScopeAction::AddTenant { tenant_id, name } => {
            scope.upsert_tenant(tenant_id, name)?;
            info!("Tenant {tenant_id} registered as {name}");
            Ok(Outcome::ok(json!({ "tenant_id": tenant_id, "name": name })))
        }
        ScopeAction::Link {
            tenant_id,
            building,
        } => {
            let known = scope
                .list_tenants()?
                .iter()
                .any(|t| &t.tenant_id == tenant_id);
            if !known {
                bail!("Unknown tenant {tenant_id}; register it with `scope add-tenant` first");
            }
            scope
                .link_building(tenant_id, building)
                .with_context(|| format!("Failed to link tenant {tenant_id}"))?;
            info!("Tenant {tenant_id} linked to {building}");
            Ok(Outcome::ok(json!({ "tenant_id": tenant_id, "building": building })))
        }
        ScopeAction::Unlink { tenant_id } => {
            let removed = scope.unlink(tenant_id)?;
            if !removed {
                warn!("Tenant {tenant_id} had no building link");
            }
            Ok(Outcome::ok(json!({ "tenant_id": tenant_id, "unlinked": removed })))
        }
        ScopeAction::List => Ok(Outcome::ok(json!({
            "tenants": scope.list_tenants()?,
            "links": scope.list_links()?,
        }))),
    }
}

fn open_inventory(path: &Path) -> Result<Arc<SqliteInventory>> {
    let inventory = SqliteInventory::open(path)
        .with_context(|| format!("Failed to open inventory {}", path.display()))?;
    Ok(Arc::new(inventory))
}

fn open_scope(path: &Path) -> Result<ScopeStore> {
    ScopeStore::open(path).with_context(|| format!("Failed to open scope store {}", path.display()))
}

fn log_outcome(report: &SyncReport) {
    for failure in &report.failures {
        warn!(
            "{} {} {} failed: {}",
            failure.operation, failure.entity_type, failure.key, failure.message
        );
    }
}
