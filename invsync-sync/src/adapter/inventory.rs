//! Target adapter over the inventory of record.
//!
//! Loading only reads: it never creates lookup records, so a dry run
//! leaves the inventory untouched.

use super::network::vlan_group_name;
use super::{GraphBuilder, LoadContext, Loaded, ResolutionContext};
use crate::SyncResult;
use invsync_inventory::{Filter, InventoryBackend, Record, RecordKind};
use invsync_model::dcim::{
    self, Building, Cable, Device, Interface, IpAddress, Model, Namespace, Prefix, Room, Vlan,
    VlanGroup,
};
use invsync_model::ModelFamily;
use invsync_types::{IdentityKey, RecordId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Which part of the inventory a target load covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetScope {
    /// Every building and its rooms.
    Locations,
    /// The network of one building.
    Building(String),
}

/// The target graph plus the lookups persisters need.
#[derive(Debug, Clone)]
pub struct TargetLoad {
    pub loaded: Loaded,
    pub resolution: ResolutionContext,
}

/// Reads and writes the inventory for one scope.
pub struct InventoryTarget {
    inventory: Arc<dyn InventoryBackend>,
    scope: TargetScope,
}

impl InventoryTarget {
    pub fn new(inventory: Arc<dyn InventoryBackend>, scope: TargetScope) -> Self {
        Self { inventory, scope }
    }

    pub fn inventory(&self) -> &dyn InventoryBackend {
        &*self.inventory
    }

    pub fn scope(&self) -> &TargetScope {
        &self.scope
    }

    /// Builds the target graph for this scope. Entities carry the handle
    /// of the record they were read from.
    pub fn load(&self, family: Arc<ModelFamily>, ctx: &LoadContext<'_>) -> SyncResult<TargetLoad> {
        let mut reader = Reader {
            inventory: &*self.inventory,
            builder: GraphBuilder::new(family, "target", ctx.debug),
            names: HashMap::new(),
        };
        let resolution = match &self.scope {
            TargetScope::Locations => reader.load_locations()?,
            TargetScope::Building(building) => reader.load_network(building)?,
        };
        let loaded = reader.builder.finish();
        info!("target: loaded {} entities", loaded.graph.len());
        Ok(TargetLoad { loaded, resolution })
    }
}

struct Reader<'a> {
    inventory: &'a dyn InventoryBackend,
    builder: GraphBuilder,
    /// Cached `name` of lookup records (statuses, roles, locations).
    names: HashMap<RecordId, String>,
}

/// An interface already placed in the target graph.
struct LoadedInterface {
    device: String,
    name: String,
    key: IdentityKey,
}

impl Reader<'_> {
    fn name_of(&mut self, kind: RecordKind, id: Option<RecordId>) -> SyncResult<Option<String>> {
        let Some(id) = id else {
            return Ok(None);
        };
        if let Some(name) = self.names.get(&id) {
            return Ok(Some(name.clone()));
        }
        let record = self.inventory.get(kind, id)?;
        let name = record.get_str("name").map(str::to_string);
        if let Some(name) = &name {
            self.names.insert(id, name.clone());
        }
        Ok(name)
    }

    fn type_id(&self, name: &str) -> SyncResult<Option<RecordId>> {
        Ok(self
            .inventory
            .find_first(RecordKind::LocationType, &Filter::new().eq("name", name))?
            .map(|r| r.id))
    }

    // ── Locations ──

    fn load_locations(&mut self) -> SyncResult<ResolutionContext> {
        let mut resolution = ResolutionContext::default();
        let Some(building_type) = self.type_id("Building")? else {
            return Ok(resolution);
        };

        let mut buildings: HashMap<RecordId, (String, IdentityKey)> = HashMap::new();
        let filter = Filter::new().eq_ref("location_type", building_type);
        for record in self.inventory.find(RecordKind::Location, &filter)? {
            let name = record.get_str("name").unwrap_or_default().to_string();
            resolution.buildings.insert(name.clone(), record.id);
            let entity = Building {
                name: name.clone(),
                status: self
                    .name_of(RecordKind::Status, record.get_ref("status"))?
                    .unwrap_or_default(),
                external_id: record
                    .pointer("/custom_fields/external_id")
                    .and_then(|v| v.as_i64()),
                longitude: record.get_f64("longitude"),
                latitude: record.get_f64("latitude"),
                technical_reference: record
                    .pointer("/custom_fields/technical_reference")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
            }
            .into_entity()?
            .with_handle(record.id);
            if let Some(key) = self.builder.add(entity)? {
                buildings.insert(record.id, (name, key));
            }
        }

        let Some(room_type) = self.type_id("Room")? else {
            return Ok(resolution);
        };
        let filter = Filter::new().eq_ref("location_type", room_type);
        for record in self.inventory.find(RecordKind::Location, &filter)? {
            let Some((building, building_key)) =
                record.get_ref("parent").and_then(|p| buildings.get(&p))
            else {
                continue;
            };
            let name = record.get_str("name").unwrap_or_default().to_string();
            resolution
                .rooms
                .insert((building.clone(), name.clone()), record.id);

            let Some(external_id) = record
                .pointer("/custom_fields/external_id")
                .and_then(|v| v.as_i64())
            else {
                self.builder.skip(
                    dcim::ROOM,
                    format!("room {name} in {building} has no external id"),
                );
                continue;
            };
            let entity = Room {
                name,
                building: building.clone(),
                external_id,
                status: self
                    .name_of(RecordKind::Status, record.get_ref("status"))?
                    .unwrap_or_default(),
            }
            .into_entity()?
            .with_handle(record.id);
            let building_key = building_key.clone();
            self.builder
                .add_under(Some((dcim::BUILDING, &building_key)), entity)?;
        }
        Ok(resolution)
    }

    // ── Network ──

    fn load_network(&mut self, building: &str) -> SyncResult<ResolutionContext> {
        let mut resolution = ResolutionContext::for_building(building);

        let building_id = match self.type_id("Building")? {
            Some(building_type) => self
                .inventory
                .find_first(
                    RecordKind::Location,
                    &Filter::new()
                        .eq("name", building)
                        .eq_ref("location_type", building_type),
                )?
                .map(|r| r.id),
            None => None,
        };
        if let Some(id) = building_id {
            resolution.buildings.insert(building.to_string(), id);
        }

        let namespace = self.load_namespace(building, &mut resolution)?;
        self.load_vlans(building, &mut resolution)?;
        let interfaces = match building_id {
            Some(id) => self.load_devices(building, id, &mut resolution)?,
            None => HashMap::new(),
        };
        if let Some(namespace) = namespace {
            self.load_addresses(building, namespace, &interfaces)?;
        }
        self.load_cables(&interfaces)?;
        Ok(resolution)
    }

    fn load_namespace(
        &mut self,
        building: &str,
        resolution: &mut ResolutionContext,
    ) -> SyncResult<Option<RecordId>> {
        let Some(record) = self
            .inventory
            .find_first(RecordKind::Namespace, &Filter::new().eq("name", building))?
        else {
            return Ok(None);
        };
        resolution.namespaces.insert(building.to_string(), record.id);
        let entity = Namespace {
            name: building.to_string(),
            description: record.get_str("description").map(str::to_string),
        }
        .into_entity()?
        .with_handle(record.id);
        let Some(ns_key) = self.builder.add(entity)? else {
            return Ok(Some(record.id));
        };

        let filter = Filter::new().eq_ref("namespace", record.id);
        for prefix in self.inventory.find(RecordKind::Prefix, &filter)? {
            let entity = Prefix {
                prefix: prefix.get_str("prefix").unwrap_or_default().to_string(),
                namespace: building.to_string(),
                description: prefix.get_str("description").map(str::to_string),
                prefix_type: prefix.get_str("type").unwrap_or_default().to_string(),
            }
            .into_entity()?
            .with_handle(prefix.id);
            self.builder
                .add_under(Some((dcim::NAMESPACE, &ns_key)), entity)?;
        }
        Ok(Some(record.id))
    }

    fn load_vlans(&mut self, building: &str, resolution: &mut ResolutionContext) -> SyncResult<()> {
        let group_name = vlan_group_name(building);
        let Some(group) = self
            .inventory
            .find_first(RecordKind::VlanGroup, &Filter::new().eq("name", group_name.as_str()))?
        else {
            return Ok(());
        };
        resolution.vlan_groups.insert(group_name.clone(), group.id);
        let entity = VlanGroup {
            name: group_name.clone(),
            location: self.name_of(RecordKind::Location, group.get_ref("location"))?,
        }
        .into_entity()?
        .with_handle(group.id);
        let Some(group_key) = self.builder.add(entity)? else {
            return Ok(());
        };

        let filter = Filter::new().eq_ref("vlan_group", group.id);
        for vlan in self.inventory.find(RecordKind::Vlan, &filter)? {
            let Some(vid) = vlan.get_i64("vid").and_then(|v| u16::try_from(v).ok()) else {
                self.builder
                    .skip(dcim::VLAN, format!("VLAN record {} has no usable vid", vlan.id));
                continue;
            };
            let entity = Vlan {
                vid,
                name: vlan.get_str("name").unwrap_or_default().to_string(),
                group: group_name.clone(),
                location: self.name_of(RecordKind::Location, vlan.get_ref("location"))?,
            }
            .into_entity()?
            .with_handle(vlan.id);
            self.builder
                .add_under(Some((dcim::VLAN_GROUP, &group_key)), entity)?;
        }
        Ok(())
    }

    /// Loads the building's devices and their interfaces, returning the
    /// loaded interfaces by record id.
    fn load_devices(
        &mut self,
        building: &str,
        building_id: RecordId,
        resolution: &mut ResolutionContext,
    ) -> SyncResult<HashMap<RecordId, LoadedInterface>> {
        let mut interfaces = HashMap::new();
        let filter = Filter::new().eq_ref("location", building_id);
        for record in self.inventory.find(RecordKind::Device, &filter)? {
            let name = record.get_str("name").unwrap_or_default().to_string();
            resolution
                .devices
                .insert((name.clone(), building.to_string()), record.id);

            let (model, manufacturer) = self.device_type(record.get_ref("device_type"))?;
            let entity = Device {
                name: name.clone(),
                location: building.to_string(),
                device_type: model,
                manufacturer,
                role: self
                    .name_of(RecordKind::Role, record.get_ref("role"))?
                    .unwrap_or_default(),
                serial: record.get_str("serial").map(str::to_string),
                platform: record.get_str("platform").map(str::to_string),
                monitoring_profile: record.pointer("/custom_fields/monitoring_profile").cloned(),
            }
            .into_entity()?
            .with_handle(record.id);
            let Some(device_key) = self.builder.add(entity)? else {
                continue;
            };

            let filter = Filter::new().eq_ref("device", record.id);
            for iface in self.inventory.find(RecordKind::Interface, &filter)? {
                let iface_name = iface.get_str("name").unwrap_or_default().to_string();
                resolution.interfaces.insert(
                    (name.clone(), building.to_string(), iface_name.clone()),
                    iface.id,
                );
                let entity = self.interface_entity(&iface, &name, building)?;
                if let Some(key) = self
                    .builder
                    .add_under(Some((dcim::DEVICE, &device_key)), entity)?
                {
                    interfaces.insert(
                        iface.id,
                        LoadedInterface {
                            device: name.clone(),
                            name: iface_name,
                            key,
                        },
                    );
                }
            }
        }
        Ok(interfaces)
    }

    fn device_type(&mut self, id: Option<RecordId>) -> SyncResult<(String, String)> {
        let Some(id) = id else {
            return Ok(Default::default());
        };
        let record = self.inventory.get(RecordKind::DeviceType, id)?;
        let model = record.get_str("model").unwrap_or_default().to_string();
        let manufacturer = self
            .name_of(RecordKind::Manufacturer, record.get_ref("manufacturer"))?
            .unwrap_or_default();
        Ok((model, manufacturer))
    }

    fn interface_entity(
        &mut self,
        record: &Record,
        device: &str,
        building: &str,
    ) -> SyncResult<invsync_model::Entity> {
        let entity = Interface {
            name: record.get_str("name").unwrap_or_default().to_string(),
            device: device.to_string(),
            location: building.to_string(),
            interface_type: record.get_str("type").unwrap_or_default().to_string(),
            status: self
                .name_of(RecordKind::Status, record.get_ref("status"))?
                .unwrap_or_default(),
            description: record.get_str("description").map(str::to_string),
            mgmt_only: record.get_bool("mgmt_only").unwrap_or(false),
            mac_address: record.get_str("mac_address").map(str::to_string),
            monitoring_profile: record.pointer("/custom_fields/monitoring_profile").cloned(),
        }
        .into_entity()?;
        Ok(entity.with_handle(record.id))
    }

    fn load_addresses(
        &mut self,
        building: &str,
        namespace: RecordId,
        interfaces: &HashMap<RecordId, LoadedInterface>,
    ) -> SyncResult<()> {
        let filter = Filter::new().eq_ref("namespace", namespace);
        for record in self.inventory.find(RecordKind::IpAddress, &filter)? {
            let address = record.get_str("address").unwrap_or_default().to_string();

            let assigned = self
                .inventory
                .find_first(
                    RecordKind::IpAssignment,
                    &Filter::new().eq_ref("ip_address", record.id),
                )?
                .and_then(|a| a.get_ref("interface"))
                .and_then(|id| interfaces.get(&id));
            let entity = IpAddress {
                address,
                namespace: building.to_string(),
                interface: assigned.map(|i| i.name.clone()),
                device: assigned.map(|i| i.device.clone()),
                status: self
                    .name_of(RecordKind::Status, record.get_ref("status"))?
                    .unwrap_or_default(),
            }
            .into_entity()?
            .with_handle(record.id);
            let parent = assigned.map(|i| (dcim::INTERFACE, &i.key));
            self.builder.add_under(parent, entity)?;
        }
        Ok(())
    }

    /// Loads cables with at least one end on an interface in scope.
    fn load_cables(&mut self, interfaces: &HashMap<RecordId, LoadedInterface>) -> SyncResult<()> {
        for record in self.inventory.find(RecordKind::Cable, &Filter::new())? {
            let (Some(a), Some(b)) = (
                record.get_ref("termination_a"),
                record.get_ref("termination_b"),
            ) else {
                continue;
            };
            if !interfaces.contains_key(&a) && !interfaces.contains_key(&b) {
                continue;
            }
            let (Some(a), Some(b)) = (self.endpoint(a, interfaces)?, self.endpoint(b, interfaces)?)
            else {
                self.builder.skip(
                    dcim::CABLE,
                    format!("cable {} has an unreadable termination", record.id),
                );
                continue;
            };
            let entity = Cable::between(a, b).into_entity()?.with_handle(record.id);
            self.builder.add(entity)?;
        }
        Ok(())
    }

    /// `(device, interface)` names of a cable termination.
    fn endpoint(
        &mut self,
        id: RecordId,
        interfaces: &HashMap<RecordId, LoadedInterface>,
    ) -> SyncResult<Option<(String, String)>> {
        if let Some(loaded) = interfaces.get(&id) {
            return Ok(Some((loaded.device.clone(), loaded.name.clone())));
        }
        let iface = self.inventory.get(RecordKind::Interface, id)?;
        let Some(name) = iface.get_str("name") else {
            return Ok(None);
        };
        let device = self.name_of(RecordKind::Device, iface.get_ref("device"))?;
        Ok(device.map(|d| (d, name.to_string())))
    }
}
