//! Source data providers.
//!
//! Providers wrap the external systems the source adapters read from.
//! Every list call is paged: it returns one [`Page`] of records plus an
//! optional cursor for the next page, and [`fetch_all_pages`] drains a
//! call until the cursor runs out.

mod fixture;

pub use fixture::{
    FixtureNetworkDiscovery, FixtureTenantDirectory, LocationFixture, NetworkFixture,
    TenantNetwork,
};

use crate::{SyncError, SyncResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use tracing::trace;

/// One page of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor for the next page; `None` on the last page.
    pub next: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

/// Calls `fetch` with successive cursors until a page has no next cursor,
/// returning every item in order.
///
/// A provider that hands back a cursor it has already been given would
/// loop forever; that is reported as a provider error.
pub async fn fetch_all_pages<T, F, Fut>(mut fetch: F) -> SyncResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = SyncResult<Page<T>>>,
{
    let mut all = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = fetch(cursor.take()).await?;
        trace!("fetched page of {} items", page.items.len());
        all.extend(page.items);

        let Some(next) = page.next else {
            break;
        };
        if !seen.insert(next.clone()) {
            return Err(SyncError::Provider(format!(
                "provider returned cursor {next} twice"
            )));
        }
        cursor = Some(next);
    }

    Ok(all)
}

// ── Tenant directory ─────────────────────────────────────────────

/// A building as listed by the tenant directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingRecord {
    pub id: i64,
    pub building_name: String,
    pub status: String,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub technical_reference: Option<String>,
}

/// A room as listed by the tenant directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub id: i64,
    pub room_name: String,
    pub building_id: i64,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// Directory of buildings and rooms.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn list_buildings(&self, cursor: Option<String>) -> SyncResult<Page<BuildingRecord>>;

    async fn list_rooms(
        &self,
        building_id: i64,
        cursor: Option<String>,
    ) -> SyncResult<Page<RoomRecord>>;
}

// ── Network discovery ────────────────────────────────────────────

/// A discovered network. Carries a VLAN id, a CIDR prefix, or both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub vlan_id: Option<u16>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A discovered device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub management_ip: Option<String>,
    #[serde(default)]
    pub monitoring_profile: Option<serde_json::Value>,
}

/// A discovered interface. `connected_to` lists the ids of the
/// interfaces discovery saw on the other end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceRecord {
    pub id: String,
    pub device_id: String,
    pub name: String,
    #[serde(default)]
    pub interface_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub connected_to: Vec<String>,
    #[serde(default)]
    pub monitoring_profile: Option<serde_json::Value>,
}

/// Network discovery scoped by tenant.
#[async_trait]
pub trait NetworkDiscovery: Send + Sync {
    async fn list_networks(
        &self,
        tenant: &str,
        cursor: Option<String>,
    ) -> SyncResult<Page<NetworkRecord>>;

    async fn list_devices(
        &self,
        tenant: &str,
        cursor: Option<String>,
    ) -> SyncResult<Page<DeviceRecord>>;

    async fn list_interfaces(
        &self,
        tenant: &str,
        cursor: Option<String>,
    ) -> SyncResult<Page<InterfaceRecord>>;
}
