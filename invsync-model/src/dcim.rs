//! The DCIM entity catalogue.
//!
//! Ten entity types in two families: `locations` (buildings and rooms)
//! and `network` (namespaces, prefixes, VLAN groups, VLANs, devices,
//! interfaces, IP addresses and cables). Each type has a typed struct
//! implementing [`Model`], which adapters use to build entities without
//! spelling out field names.

use crate::{Entity, EntitySchema, FieldSpec, ModelFamily, ModelResult};
use invsync_types::{FieldValue, Fields};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const BUILDING: &str = "building";
pub const ROOM: &str = "room";
pub const NAMESPACE: &str = "namespace";
pub const PREFIX: &str = "prefix";
pub const VLAN_GROUP: &str = "vlangroup";
pub const VLAN: &str = "vlan";
pub const DEVICE: &str = "device";
pub const INTERFACE: &str = "interface";
pub const IP_ADDRESS: &str = "ipaddr";
pub const CABLE: &str = "cable";

/// Field names shared by schemas, adapters and persisters.
pub mod field {
    pub const NAME: &str = "name";
    pub const STATUS: &str = "status__name";
    pub const EXTERNAL_ID: &str = "external_id";
    pub const LONGITUDE: &str = "longitude";
    pub const LATITUDE: &str = "latitude";
    pub const TECHNICAL_REFERENCE: &str = "technical_reference";
    pub const PARENT: &str = "parent__name";
    pub const DESCRIPTION: &str = "description";
    pub const PREFIX: &str = "prefix";
    pub const NAMESPACE: &str = "namespace";
    pub const TYPE: &str = "type";
    pub const LOCATION: &str = "location__name";
    pub const VID: &str = "vid";
    pub const VLAN_GROUP: &str = "vlangroup";
    pub const MONITORING_PROFILE: &str = "monitoring_profile";
    pub const DEVICE_TYPE: &str = "device_type";
    pub const MANUFACTURER: &str = "manufacturer";
    pub const SERIAL: &str = "serial";
    pub const ROLE: &str = "role";
    pub const PLATFORM: &str = "platform";
    pub const DEVICE: &str = "device__name";
    pub const DEVICE_LOCATION: &str = "device__location__name";
    pub const MGMT_ONLY: &str = "mgmt_only";
    pub const MAC_ADDRESS: &str = "mac_address";
    pub const ADDRESS: &str = "address";
    pub const INTERFACE: &str = "interface__name";
    pub const IP_DEVICE: &str = "device";
    pub const FROM_DEVICE: &str = "from_device";
    pub const FROM_INTERFACE: &str = "from_interface";
    pub const TO_DEVICE: &str = "to_device";
    pub const TO_INTERFACE: &str = "to_interface";
}

/// A typed entity of the catalogue.
pub trait Model: Sized {
    const TYPE: &'static str;

    fn schema() -> &'static EntitySchema;

    fn into_fields(self) -> Fields;

    fn into_entity(self) -> ModelResult<Entity> {
        Entity::new(Self::schema(), self.into_fields())
    }
}

/// Collects `(name, value)` pairs into a field map.
fn fields<const N: usize>(pairs: [(&str, FieldValue); N]) -> Fields {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

// ── Locations ───────────────────────────────────────────────────

static BUILDING_SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
    EntitySchema::new(BUILDING)
        .identifier(FieldSpec::text(field::NAME))
        .attribute(FieldSpec::text(field::STATUS))
        .attribute(FieldSpec::integer(field::EXTERNAL_ID).optional())
        .attribute(FieldSpec::float(field::LONGITUDE).optional())
        .attribute(FieldSpec::float(field::LATITUDE).optional())
        .attribute(FieldSpec::text(field::TECHNICAL_REFERENCE).optional())
        .child(ROOM, "rooms")
});

static ROOM_SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
    EntitySchema::new(ROOM)
        .identifier(FieldSpec::text(field::NAME))
        .identifier(FieldSpec::text(field::PARENT))
        .identifier(FieldSpec::integer(field::EXTERNAL_ID))
        .attribute(FieldSpec::text(field::STATUS))
});

/// A building location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub name: String,
    pub status: String,
    pub external_id: Option<i64>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub technical_reference: Option<String>,
}

impl Model for Building {
    const TYPE: &'static str = BUILDING;

    fn schema() -> &'static EntitySchema {
        &BUILDING_SCHEMA
    }

    fn into_fields(self) -> Fields {
        fields([
            (field::NAME, self.name.into()),
            (field::STATUS, self.status.into()),
            (field::EXTERNAL_ID, self.external_id.into()),
            (field::LONGITUDE, self.longitude.into()),
            (field::LATITUDE, self.latitude.into()),
            (field::TECHNICAL_REFERENCE, self.technical_reference.into()),
        ])
    }
}

/// A room inside a building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    pub building: String,
    pub external_id: i64,
    pub status: String,
}

impl Model for Room {
    const TYPE: &'static str = ROOM;

    fn schema() -> &'static EntitySchema {
        &ROOM_SCHEMA
    }

    fn into_fields(self) -> Fields {
        fields([
            (field::NAME, self.name.into()),
            (field::PARENT, self.building.into()),
            (field::EXTERNAL_ID, self.external_id.into()),
            (field::STATUS, self.status.into()),
        ])
    }
}

// ── Network ─────────────────────────────────────────────────────

static NAMESPACE_SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
    EntitySchema::new(NAMESPACE)
        .identifier(FieldSpec::text(field::NAME))
        .attribute(FieldSpec::text(field::DESCRIPTION).optional())
        .child(PREFIX, "prefixes")
});

static PREFIX_SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
    EntitySchema::new(PREFIX)
        .identifier(FieldSpec::text(field::PREFIX))
        .identifier(FieldSpec::text(field::NAMESPACE))
        .attribute(FieldSpec::text(field::DESCRIPTION).optional())
        .attribute(FieldSpec::text(field::TYPE))
});

static VLAN_GROUP_SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
    EntitySchema::new(VLAN_GROUP)
        .identifier(FieldSpec::text(field::NAME))
        .attribute(FieldSpec::text(field::LOCATION).optional())
        .child(VLAN, "vlans")
});

static VLAN_SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
    EntitySchema::new(VLAN)
        .identifier(FieldSpec::integer(field::VID))
        .identifier(FieldSpec::text(field::NAME))
        .identifier(FieldSpec::text(field::VLAN_GROUP))
        .attribute(FieldSpec::text(field::LOCATION).optional())
});

static DEVICE_SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
    EntitySchema::new(DEVICE)
        .identifier(FieldSpec::text(field::NAME))
        .identifier(FieldSpec::text(field::LOCATION))
        .attribute(FieldSpec::json(field::MONITORING_PROFILE).optional())
        .attribute(FieldSpec::text(field::DEVICE_TYPE))
        .attribute(FieldSpec::text(field::MANUFACTURER))
        .attribute(FieldSpec::text(field::SERIAL).optional())
        .attribute(FieldSpec::text(field::ROLE))
        .child(INTERFACE, "interfaces")
});

static INTERFACE_SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
    EntitySchema::new(INTERFACE)
        .identifier(FieldSpec::text(field::NAME))
        .identifier(FieldSpec::text(field::DEVICE))
        .identifier(FieldSpec::text(field::DEVICE_LOCATION))
        .attribute(FieldSpec::text(field::TYPE))
        .attribute(FieldSpec::text(field::DESCRIPTION).optional())
        .attribute(FieldSpec::text(field::STATUS))
        .attribute(FieldSpec::boolean(field::MGMT_ONLY).optional())
        .attribute(FieldSpec::json(field::MONITORING_PROFILE).optional())
        .child(IP_ADDRESS, "ipaddrs")
});

static IP_ADDRESS_SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
    EntitySchema::new(IP_ADDRESS)
        .identifier(FieldSpec::text(field::ADDRESS))
        .identifier(FieldSpec::text(field::NAMESPACE))
        .attribute(FieldSpec::text(field::INTERFACE).optional())
        .attribute(FieldSpec::text(field::STATUS))
        .attribute(FieldSpec::text(field::IP_DEVICE).optional())
});

static CABLE_SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
    EntitySchema::new(CABLE)
        .identifier(FieldSpec::text(field::FROM_DEVICE))
        .identifier(FieldSpec::text(field::FROM_INTERFACE))
        .identifier(FieldSpec::text(field::TO_DEVICE))
        .identifier(FieldSpec::text(field::TO_INTERFACE))
});

/// An IP namespace; one per building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    pub description: Option<String>,
}

impl Model for Namespace {
    const TYPE: &'static str = NAMESPACE;

    fn schema() -> &'static EntitySchema {
        &NAMESPACE_SCHEMA
    }

    fn into_fields(self) -> Fields {
        fields([
            (field::NAME, self.name.into()),
            (field::DESCRIPTION, self.description.into()),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prefix {
    /// CIDR notation, e.g. `10.20.0.0/24`.
    pub prefix: String,
    pub namespace: String,
    pub description: Option<String>,
    /// `network`, `pool` or `container`.
    pub prefix_type: String,
}

impl Model for Prefix {
    const TYPE: &'static str = PREFIX;

    fn schema() -> &'static EntitySchema {
        &PREFIX_SCHEMA
    }

    fn into_fields(self) -> Fields {
        fields([
            (field::PREFIX, self.prefix.into()),
            (field::NAMESPACE, self.namespace.into()),
            (field::DESCRIPTION, self.description.into()),
            (field::TYPE, self.prefix_type.into()),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VlanGroup {
    pub name: String,
    pub location: Option<String>,
}

impl Model for VlanGroup {
    const TYPE: &'static str = VLAN_GROUP;

    fn schema() -> &'static EntitySchema {
        &VLAN_GROUP_SCHEMA
    }

    fn into_fields(self) -> Fields {
        fields([
            (field::NAME, self.name.into()),
            (field::LOCATION, self.location.into()),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vlan {
    pub vid: u16,
    pub name: String,
    pub group: String,
    pub location: Option<String>,
}

impl Model for Vlan {
    const TYPE: &'static str = VLAN;

    fn schema() -> &'static EntitySchema {
        &VLAN_SCHEMA
    }

    fn into_fields(self) -> Fields {
        fields([
            (field::VID, self.vid.into()),
            (field::NAME, self.name.into()),
            (field::VLAN_GROUP, self.group.into()),
            (field::LOCATION, self.location.into()),
        ])
    }
}

/// A network device. `platform` is carried for creation but not compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub location: String,
    pub device_type: String,
    pub manufacturer: String,
    pub role: String,
    pub serial: Option<String>,
    pub platform: Option<String>,
    pub monitoring_profile: Option<serde_json::Value>,
}

impl Model for Device {
    const TYPE: &'static str = DEVICE;

    fn schema() -> &'static EntitySchema {
        &DEVICE_SCHEMA
    }

    fn into_fields(self) -> Fields {
        fields([
            (field::NAME, self.name.into()),
            (field::LOCATION, self.location.into()),
            (field::DEVICE_TYPE, self.device_type.into()),
            (field::MANUFACTURER, self.manufacturer.into()),
            (field::ROLE, self.role.into()),
            (field::SERIAL, self.serial.into()),
            (field::PLATFORM, self.platform.into()),
            (field::MONITORING_PROFILE, json_field(self.monitoring_profile)),
        ])
    }
}

/// A device interface. `mac_address` is carried but not compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    pub device: String,
    pub location: String,
    pub interface_type: String,
    pub status: String,
    pub description: Option<String>,
    pub mgmt_only: bool,
    pub mac_address: Option<String>,
    pub monitoring_profile: Option<serde_json::Value>,
}

impl Model for Interface {
    const TYPE: &'static str = INTERFACE;

    fn schema() -> &'static EntitySchema {
        &INTERFACE_SCHEMA
    }

    fn into_fields(self) -> Fields {
        fields([
            (field::NAME, self.name.into()),
            (field::DEVICE, self.device.into()),
            (field::DEVICE_LOCATION, self.location.into()),
            (field::TYPE, self.interface_type.into()),
            (field::STATUS, self.status.into()),
            (field::DESCRIPTION, self.description.into()),
            (field::MGMT_ONLY, self.mgmt_only.into()),
            (field::MAC_ADDRESS, self.mac_address.into()),
            (field::MONITORING_PROFILE, json_field(self.monitoring_profile)),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpAddress {
    /// Host address with mask, e.g. `10.20.0.5/32`.
    pub address: String,
    pub namespace: String,
    pub interface: Option<String>,
    pub device: Option<String>,
    pub status: String,
}

impl Model for IpAddress {
    const TYPE: &'static str = IP_ADDRESS;

    fn schema() -> &'static EntitySchema {
        &IP_ADDRESS_SCHEMA
    }

    fn into_fields(self) -> Fields {
        fields([
            (field::ADDRESS, self.address.into()),
            (field::NAMESPACE, self.namespace.into()),
            (field::INTERFACE, self.interface.into()),
            (field::IP_DEVICE, self.device.into()),
            (field::STATUS, self.status.into()),
        ])
    }
}

/// A physical cable between two device interfaces.
///
/// Endpoints are canonicalised on construction so a cable reported from
/// either end has the same identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cable {
    pub from_device: String,
    pub from_interface: String,
    pub to_device: String,
    pub to_interface: String,
}

impl Cable {
    /// Builds a cable from two `(device, interface)` endpoints in any order.
    pub fn between(a: (String, String), b: (String, String)) -> Self {
        let (from, to) = if b < a { (b, a) } else { (a, b) };
        Self {
            from_device: from.0,
            from_interface: from.1,
            to_device: to.0,
            to_interface: to.1,
        }
    }
}

impl Model for Cable {
    const TYPE: &'static str = CABLE;

    fn schema() -> &'static EntitySchema {
        &CABLE_SCHEMA
    }

    fn into_fields(self) -> Fields {
        fields([
            (field::FROM_DEVICE, self.from_device.into()),
            (field::FROM_INTERFACE, self.from_interface.into()),
            (field::TO_DEVICE, self.to_device.into()),
            (field::TO_INTERFACE, self.to_interface.into()),
        ])
    }
}

/// Structured fields stay structured even when the value is a scalar.
fn json_field(value: Option<serde_json::Value>) -> FieldValue {
    match value {
        None | Some(serde_json::Value::Null) => FieldValue::Null,
        Some(v) => FieldValue::Json(v),
    }
}

// ── Families ────────────────────────────────────────────────────

pub const LOCATIONS_FAMILY: &str = "locations";
pub const NETWORK_FAMILY: &str = "network";

/// Buildings and their rooms.
pub fn locations_family() -> ModelResult<ModelFamily> {
    ModelFamily::builder(LOCATIONS_FAMILY)
        .register(Building::schema().clone())
        .register(Room::schema().clone())
        .top_level([BUILDING])
        .build()
}

/// Everything synced for one building's network.
pub fn network_family() -> ModelResult<ModelFamily> {
    ModelFamily::builder(NETWORK_FAMILY)
        .register(Namespace::schema().clone())
        .register(Prefix::schema().clone())
        .register(VlanGroup::schema().clone())
        .register(Vlan::schema().clone())
        .register(Device::schema().clone())
        .register(Interface::schema().clone())
        .register(IpAddress::schema().clone())
        .register(Cable::schema().clone())
        .top_level([NAMESPACE, VLAN_GROUP, DEVICE, CABLE])
        .build()
}
