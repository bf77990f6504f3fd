//! Source adapter for one building's network, read from discovery.

use super::{GraphBuilder, LoadContext, Loaded, SourceAdapter};
use crate::cabling::derive_cables;
use crate::provider::{DeviceRecord, NetworkDiscovery, fetch_all_pages};
use crate::{SyncError, SyncResult};
use async_trait::async_trait;
use invsync_model::ModelFamily;
use invsync_model::dcim::{
    self, Device, Interface, IpAddress, Model, Namespace, Prefix, Vlan, VlanGroup,
};
use invsync_store::ScopeStore;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info};

/// Which discovery tenant is synced into which building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeSelection {
    pub tenant_id: String,
    pub building: String,
}

impl ScopeSelection {
    /// Looks up the building linked to `tenant_id`. A tenant with no
    /// building is a configuration error.
    pub fn resolve(store: &ScopeStore, tenant_id: &str) -> SyncResult<Self> {
        let building = store.building_for_tenant(tenant_id)?.ok_or_else(|| {
            SyncError::Config(format!("tenant {tenant_id} is not linked to a building"))
        })?;
        Ok(Self {
            tenant_id: tenant_id.to_string(),
            building,
        })
    }

    pub fn namespace(&self) -> String {
        self.building.clone()
    }

    pub fn vlan_group(&self) -> String {
        vlan_group_name(&self.building)
    }
}

/// Name of the VLAN group holding a building's VLANs.
pub(crate) fn vlan_group_name(building: &str) -> String {
    format!("{building} VLANs")
}

/// Loads namespaces, VLANs, devices, interfaces, management addresses
/// and cables for one tenant.
pub struct NetworkSource {
    discovery: Arc<dyn NetworkDiscovery>,
    scope: ScopeSelection,
}

impl NetworkSource {
    pub fn new(discovery: Arc<dyn NetworkDiscovery>, scope: ScopeSelection) -> Self {
        Self { discovery, scope }
    }

    pub fn scope(&self) -> &ScopeSelection {
        &self.scope
    }
}

#[async_trait]
impl SourceAdapter for NetworkSource {
    async fn load(&self, family: Arc<ModelFamily>, ctx: &LoadContext<'_>) -> SyncResult<Loaded> {
        let config = ctx.config;
        let discovery = &*self.discovery;
        let tenant = self.scope.tenant_id.as_str();
        let building = self.scope.building.clone();
        let namespace = self.scope.namespace();
        let mut builder = GraphBuilder::new(family, "source", ctx.debug);

        let networks = fetch_all_pages(move |c| discovery.list_networks(tenant, c)).await?;
        let devices = fetch_all_pages(move |c| discovery.list_devices(tenant, c)).await?;
        let interfaces = fetch_all_pages(move |c| discovery.list_interfaces(tenant, c)).await?;
        info!(
            "source: tenant {tenant} listed {} networks, {} devices, {} interfaces",
            networks.len(),
            devices.len(),
            interfaces.len()
        );

        // ── Namespace and VLAN group ──

        let ns_key = builder
            .add(
                Namespace {
                    name: namespace.clone(),
                    description: Some(format!("{building} namespace")),
                }
                .into_entity()?,
            )?
            .ok_or_else(|| SyncError::Config(format!("duplicate namespace {namespace}")))?;
        let group = self.scope.vlan_group();
        let group_key = builder
            .add(
                VlanGroup {
                    name: group.clone(),
                    location: Some(building.clone()),
                }
                .into_entity()?,
            )?
            .ok_or_else(|| SyncError::Config(format!("duplicate VLAN group {group}")))?;

        // ── Networks ──

        for network in &networks {
            if let Some(vid) = network.vlan_id {
                if (1..=4094).contains(&vid) {
                    let vlan = Vlan {
                        vid,
                        name: network.name.clone(),
                        group: group.clone(),
                        location: Some(building.clone()),
                    }
                    .into_entity()?;
                    builder.add_under(Some((dcim::VLAN_GROUP, &group_key)), vlan)?;
                } else {
                    builder.skip(
                        dcim::VLAN,
                        format!("network {} has out-of-range VLAN id {vid}", network.id),
                    );
                }
            }
            if let Some(prefix) = &network.prefix {
                let entity = Prefix {
                    prefix: prefix.clone(),
                    namespace: namespace.clone(),
                    description: Some(network.name.clone()),
                    prefix_type: "network".to_string(),
                }
                .into_entity()?;
                builder.add_under(Some((dcim::NAMESPACE, &ns_key)), entity)?;
            }
        }

        // ── Devices and management addresses ──

        let mut device_names: HashMap<String, String> = HashMap::new();
        let mut device_keys = HashMap::new();
        for record in &devices {
            if let Some(reason) = import_blocker(record, &config.excluded_device_statuses) {
                debug!("source: skipping device {}: {reason}", record.name);
                builder.skip(dcim::DEVICE, format!("device {}: {reason}", record.name));
                continue;
            }
            let device = Device {
                name: record.name.clone(),
                location: building.clone(),
                device_type: record.model.clone().unwrap_or_default(),
                manufacturer: record.vendor.clone().unwrap_or_default(),
                role: record.role.clone().unwrap_or_default(),
                serial: record.serial.clone(),
                platform: record.platform.clone(),
                monitoring_profile: record.monitoring_profile.clone(),
            }
            .into_entity()?;
            let Some(device_key) = builder.add(device)? else {
                continue;
            };
            device_names.insert(record.id.clone(), record.name.clone());
            device_keys.insert(record.id.clone(), device_key.clone());

            let Some(raw) = record.management_ip.as_deref() else {
                continue;
            };
            let Some(address) = host_address(raw) else {
                builder.skip(
                    dcim::IP_ADDRESS,
                    format!("device {} has invalid management address {raw:?}", record.name),
                );
                continue;
            };

            let mgmt = Interface {
                name: config.management_interface.clone(),
                device: record.name.clone(),
                location: building.clone(),
                interface_type: "virtual".to_string(),
                status: config.statuses.active.clone(),
                description: Some(config.default_interface_description.clone()),
                mgmt_only: true,
                mac_address: None,
                monitoring_profile: None,
            }
            .into_entity()?;
            let Some(mgmt_key) = builder.add_under(Some((dcim::DEVICE, &device_key)), mgmt)? else {
                continue;
            };
            let ip = IpAddress {
                address,
                namespace: namespace.clone(),
                interface: Some(config.management_interface.clone()),
                device: Some(record.name.clone()),
                status: config.statuses.active.clone(),
            }
            .into_entity()?;
            builder.add_under(Some((dcim::INTERFACE, &mgmt_key)), ip)?;
        }

        // ── Interfaces ──

        for record in &interfaces {
            let (Some(device), Some(device_key)) = (
                device_names.get(&record.device_id),
                device_keys.get(&record.device_id),
            ) else {
                continue;
            };
            let entity = Interface {
                name: record.name.clone(),
                device: device.clone(),
                location: building.clone(),
                interface_type: record
                    .interface_type
                    .clone()
                    .unwrap_or_else(|| "other".to_string()),
                status: config.statuses.planned.clone(),
                description: Some(
                    record
                        .description
                        .clone()
                        .unwrap_or_else(|| config.default_interface_description.clone()),
                ),
                mgmt_only: false,
                mac_address: record.mac_address.clone(),
                monitoring_profile: record.monitoring_profile.clone(),
            }
            .into_entity()?;
            builder.add_under(Some((dcim::DEVICE, device_key)), entity)?;
        }

        // ── Cables ──

        let derived = derive_cables(&interfaces, &device_names, &config.aggregation_interface);
        for unresolved in derived.unresolved {
            builder.diagnostic(format!("unresolved cable: {unresolved}"));
        }
        for cable in derived.cables {
            builder.add(cable.into_entity()?)?;
        }

        let loaded = builder.finish();
        info!(
            "source: loaded {} entities for building {building}",
            loaded.graph.len()
        );
        Ok(loaded)
    }
}

/// Why a discovered device cannot be imported, if it cannot.
fn import_blocker(record: &DeviceRecord, excluded: &[String]) -> Option<String> {
    let missing = [
        ("vendor", &record.vendor),
        ("model", &record.model),
        ("role", &record.role),
    ]
    .into_iter()
    .find(|(_, value)| value.as_deref().is_none_or(str::is_empty));
    if let Some((field, _)) = missing {
        return Some(format!("no {field}"));
    }
    match &record.status {
        Some(status) if excluded.iter().any(|e| e.eq_ignore_ascii_case(status)) => {
            Some(format!("status {status}"))
        }
        _ => None,
    }
}

/// Normalises a management address to a host address with a full mask.
/// Accepts a bare address or one with any mask.
fn host_address(raw: &str) -> Option<String> {
    let host = raw.split('/').next().unwrap_or(raw).trim();
    match host.parse::<IpAddr>().ok()? {
        IpAddr::V4(v4) => Some(format!("{v4}/32")),
        IpAddr::V6(v6) => Some(format!("{v6}/128")),
    }
}
