//! Shared fixtures for sync tests.

#![allow(dead_code)]

use invsync_inventory::{Filter, InventoryBackend, MemoryInventory, RecordKind};
use invsync_store::ScopeStore;
use invsync_sync::provider::{
    BuildingRecord, DeviceRecord, InterfaceRecord, LocationFixture, NetworkFixture,
    NetworkRecord, RoomRecord, TenantNetwork,
};
use invsync_types::RecordId;
use serde_json::json;
use std::sync::Arc;

pub const BUILDING: &str = "Tower A";
pub const TENANT: &str = "tenant-1";

pub fn lookup(inv: &dyn InventoryBackend, kind: RecordKind, name: &str) -> RecordId {
    inv.get_or_create(kind, &Filter::new().eq("name", name), json!({}))
        .unwrap()
        .0
        .id
}

/// A building location with the given name.
pub fn add_building(inv: &dyn InventoryBackend, name: &str) -> RecordId {
    let location_type = lookup(inv, RecordKind::LocationType, "Building");
    let status = lookup(inv, RecordKind::Status, "Active");
    inv.create(
        RecordKind::Location,
        json!({
            "name": name,
            "location_type": location_type.to_string(),
            "status": status.to_string(),
        }),
    )
    .unwrap()
    .id
}

/// An inventory holding `Tower A` and a Cisco C9300 device type.
pub fn seeded_inventory() -> Arc<MemoryInventory> {
    let inv = MemoryInventory::new();
    add_building(&inv, BUILDING);
    let cisco = lookup(&inv, RecordKind::Manufacturer, "Cisco");
    inv.create(
        RecordKind::DeviceType,
        json!({ "model": "C9300", "manufacturer": cisco.to_string() }),
    )
    .unwrap();
    Arc::new(inv)
}

/// A scope store linking `TENANT` to `Tower A`.
pub fn scope_store() -> ScopeStore {
    let store = ScopeStore::open_in_memory().unwrap();
    store.upsert_tenant(TENANT, "Tenant One").unwrap();
    store.link_building(TENANT, BUILDING).unwrap();
    store
}

pub fn building_record(id: i64, name: &str, status: &str) -> BuildingRecord {
    BuildingRecord {
        id,
        building_name: name.to_string(),
        status: status.to_string(),
        longitude: Some(4.35),
        latitude: Some(50.85),
        technical_reference: None,
    }
}

pub fn room_record(id: i64, name: &str, building_id: i64, active: bool) -> RoomRecord {
    RoomRecord {
        id,
        room_name: name.to_string(),
        building_id,
        active,
    }
}

/// One live building with an active and an inactive room, plus a
/// closed building that must be ignored.
pub fn location_fixture() -> LocationFixture {
    LocationFixture {
        buildings: vec![
            building_record(1, BUILDING, "Live Building"),
            building_record(2, "Old Depot", "Closed"),
        ],
        rooms: vec![
            room_record(10, "A-101", 1, true),
            room_record(11, "A-102", 1, false),
            room_record(20, "D-001", 2, true),
        ],
    }
}

pub fn device_record(id: &str, name: &str, management_ip: Option<&str>) -> DeviceRecord {
    DeviceRecord {
        id: id.to_string(),
        name: name.to_string(),
        vendor: Some("Cisco".to_string()),
        model: Some("C9300".to_string()),
        role: Some("access".to_string()),
        status: Some("active".to_string()),
        serial: Some(format!("SN-{name}")),
        platform: None,
        management_ip: management_ip.map(str::to_string),
        monitoring_profile: None,
    }
}

pub fn interface_record(id: &str, device_id: &str, name: &str, connected_to: &[&str]) -> InterfaceRecord {
    InterfaceRecord {
        id: id.to_string(),
        device_id: device_id.to_string(),
        name: name.to_string(),
        interface_type: None,
        description: None,
        mac_address: None,
        connected_to: connected_to.iter().map(|s| s.to_string()).collect(),
        monitoring_profile: None,
    }
}

/// Two switches cabled to each other, one decommissioned switch and one
/// switch with no vendor.
pub fn tenant_network() -> TenantNetwork {
    let mut decommissioned = device_record("d3", "sw-old", None);
    decommissioned.status = Some("Decommissioned".to_string());
    let mut unclassified = device_record("d4", "mystery", None);
    unclassified.vendor = None;

    let mut uplink = interface_record("i3", "d1", "Gi1/0/48", &[]);
    uplink.interface_type = Some("1000base-t".to_string());
    uplink.monitoring_profile = Some(json!({ "poll": 60 }));

    TenantNetwork {
        networks: vec![
            NetworkRecord {
                id: "n1".to_string(),
                name: "Users".to_string(),
                vlan_id: Some(10),
                prefix: Some("10.10.0.0/24".to_string()),
                description: None,
            },
            NetworkRecord {
                id: "n2".to_string(),
                name: "Servers".to_string(),
                vlan_id: Some(20),
                prefix: None,
                description: None,
            },
        ],
        devices: vec![
            device_record("d1", "sw1", Some("10.0.0.1")),
            device_record("d2", "sw2", Some("10.0.0.2/24")),
            decommissioned,
            unclassified,
        ],
        interfaces: vec![
            interface_record("i1", "d1", "Gi1/0/1", &["i2"]),
            interface_record("i2", "d2", "Gi1/0/1", &["i1"]),
            uplink,
            interface_record("i4", "d3", "Gi1/0/1", &[]),
        ],
    }
}

pub fn network_fixture() -> NetworkFixture {
    let mut fixture = NetworkFixture::default();
    fixture.tenants.insert(TENANT.to_string(), tenant_network());
    fixture
}
