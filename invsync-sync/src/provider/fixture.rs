//! Providers that serve records from JSON fixtures.

use super::{
    BuildingRecord, DeviceRecord, InterfaceRecord, NetworkDiscovery, NetworkRecord, Page,
    RoomRecord, TenantDirectory,
};
use crate::{SyncError, SyncResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Contents of a tenant directory fixture.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationFixture {
    pub buildings: Vec<BuildingRecord>,
    pub rooms: Vec<RoomRecord>,
}

/// Discovery data for one tenant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantNetwork {
    pub networks: Vec<NetworkRecord>,
    pub devices: Vec<DeviceRecord>,
    pub interfaces: Vec<InterfaceRecord>,
}

/// Contents of a network discovery fixture, keyed by tenant id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkFixture {
    pub tenants: BTreeMap<String, TenantNetwork>,
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> SyncResult<T> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&text)?)
}

/// Slices `items` into a page starting at the offset encoded in `cursor`.
fn paginate<T: Clone>(items: &[T], cursor: Option<&str>, page_size: usize) -> SyncResult<Page<T>> {
    let start = match cursor {
        None => 0,
        Some(c) => c
            .parse::<usize>()
            .map_err(|_| SyncError::Provider(format!("invalid cursor {c:?}")))?,
    };
    let end = start.saturating_add(page_size.max(1)).min(items.len());
    let slice = items.get(start..end).unwrap_or_default();
    let next = (end < items.len()).then(|| end.to_string());
    Ok(Page {
        items: slice.to_vec(),
        next,
    })
}

/// Tenant directory backed by a [`LocationFixture`].
#[derive(Debug, Clone)]
pub struct FixtureTenantDirectory {
    fixture: LocationFixture,
    page_size: usize,
}

impl FixtureTenantDirectory {
    pub fn new(fixture: LocationFixture, page_size: usize) -> Self {
        Self { fixture, page_size }
    }

    pub async fn from_path(path: impl AsRef<Path>, page_size: usize) -> SyncResult<Self> {
        Ok(Self::new(read_json(path.as_ref()).await?, page_size))
    }
}

#[async_trait]
impl TenantDirectory for FixtureTenantDirectory {
    async fn list_buildings(&self, cursor: Option<String>) -> SyncResult<Page<BuildingRecord>> {
        paginate(&self.fixture.buildings, cursor.as_deref(), self.page_size)
    }

    async fn list_rooms(
        &self,
        building_id: i64,
        cursor: Option<String>,
    ) -> SyncResult<Page<RoomRecord>> {
        let rooms: Vec<RoomRecord> = self
            .fixture
            .rooms
            .iter()
            .filter(|r| r.building_id == building_id)
            .cloned()
            .collect();
        paginate(&rooms, cursor.as_deref(), self.page_size)
    }
}

/// Network discovery backed by a [`NetworkFixture`].
#[derive(Debug, Clone)]
pub struct FixtureNetworkDiscovery {
    fixture: NetworkFixture,
    page_size: usize,
}

impl FixtureNetworkDiscovery {
    pub fn new(fixture: NetworkFixture, page_size: usize) -> Self {
        Self { fixture, page_size }
    }

    pub async fn from_path(path: impl AsRef<Path>, page_size: usize) -> SyncResult<Self> {
        Ok(Self::new(read_json(path.as_ref()).await?, page_size))
    }

    fn tenant(&self, tenant: &str) -> SyncResult<&TenantNetwork> {
        self.fixture
            .tenants
            .get(tenant)
            .ok_or_else(|| SyncError::Provider(format!("unknown tenant {tenant}")))
    }
}

#[async_trait]
impl NetworkDiscovery for FixtureNetworkDiscovery {
    async fn list_networks(
        &self,
        tenant: &str,
        cursor: Option<String>,
    ) -> SyncResult<Page<NetworkRecord>> {
        paginate(&self.tenant(tenant)?.networks, cursor.as_deref(), self.page_size)
    }

    async fn list_devices(
        &self,
        tenant: &str,
        cursor: Option<String>,
    ) -> SyncResult<Page<DeviceRecord>> {
        paginate(&self.tenant(tenant)?.devices, cursor.as_deref(), self.page_size)
    }

    async fn list_interfaces(
        &self,
        tenant: &str,
        cursor: Option<String>,
    ) -> SyncResult<Page<InterfaceRecord>> {
        paginate(&self.tenant(tenant)?.interfaces, cursor.as_deref(), self.page_size)
    }
}
