//! Per-type persistence against the inventory.
//!
//! Each entity type has one [`Persister`]. The apply engine picks it by
//! the change's entity type via [`persister_for`]. Creates resolve every
//! reference by name, updates touch only the fields present in the
//! change, and deletes are disabled for every type: sync only ever adds
//! to or repairs the inventory.

mod dcim;
mod ipam;
mod locations;

use crate::adapter::ResolutionContext;
use crate::{PersistError, SyncConfig};
use invsync_inventory::{Filter, InventoryBackend, RecordKind};
use invsync_model::Entity;
use invsync_model::dcim as types;
use invsync_types::{FieldValue, Fields, RecordId};
use serde_json::{Map, Value};

/// Everything a persister may touch during one apply.
pub struct PersistContext<'a> {
    pub inventory: &'a dyn InventoryBackend,
    pub resolution: &'a mut ResolutionContext,
    pub config: &'a SyncConfig,
    pub debug: bool,
}

/// Create, update and delete for one entity type.
pub trait Persister: Send + Sync {
    /// Persists a new entity and returns the handle of its record.
    fn create(
        &self,
        ctx: &mut PersistContext<'_>,
        identifiers: &Fields,
        attributes: &Fields,
    ) -> Result<RecordId, PersistError>;

    /// Applies `changes` to the record behind `current`. Fields not in
    /// `changes` are left alone, as are changed fields this type never
    /// writes. Returns `false` when nothing was written.
    fn update(
        &self,
        ctx: &mut PersistContext<'_>,
        current: &Entity,
        changes: &Fields,
    ) -> Result<bool, PersistError>;

    fn delete(&self, _ctx: &mut PersistContext<'_>, current: &Entity) -> Result<(), PersistError> {
        Err(PersistError::DeleteDisabled(current.entity_type().to_string()))
    }
}

/// The persister for an entity type.
pub fn persister_for(entity_type: &str) -> Option<&'static dyn Persister> {
    let persister: &'static dyn Persister = match entity_type {
        types::BUILDING => &locations::BuildingPersister,
        types::ROOM => &locations::RoomPersister,
        types::NAMESPACE => &ipam::NamespacePersister,
        types::PREFIX => &ipam::PrefixPersister,
        types::VLAN_GROUP => &ipam::VlanGroupPersister,
        types::VLAN => &ipam::VlanPersister,
        types::IP_ADDRESS => &ipam::IpAddressPersister,
        types::DEVICE => &dcim::DevicePersister,
        types::INTERFACE => &dcim::InterfacePersister,
        types::CABLE => &dcim::CablePersister,
        _ => return None,
    };
    Some(persister)
}

// ── Field helpers ──

/// A required text field.
pub(crate) fn text<'f>(fields: &'f Fields, name: &str) -> Result<&'f str, PersistError> {
    fields
        .get(name)
        .and_then(FieldValue::as_str)
        .ok_or_else(|| PersistError::MissingField(name.to_string()))
}

/// A text field, if present and non-null.
pub(crate) fn opt_text<'f>(fields: &'f Fields, name: &str) -> Option<&'f str> {
    fields.get(name).and_then(FieldValue::as_str)
}

/// A field as JSON, if present and non-null.
pub(crate) fn present(fields: &Fields, name: &str) -> Option<Value> {
    fields
        .get(name)
        .filter(|v| !v.is_null())
        .map(FieldValue::to_json)
}

/// The handle of a loaded target entity.
pub(crate) fn handle(current: &Entity) -> Result<RecordId, PersistError> {
    current.handle().ok_or_else(|| PersistError::NoHandle {
        entity_type: current.entity_type().to_string(),
        key: current.key().to_string(),
    })
}

/// Wraps `(key, value)` pairs into a `custom_fields` object, dropping nulls.
pub(crate) fn custom_fields<const N: usize>(pairs: [(&str, Option<Value>); N]) -> Value {
    let map: Map<String, Value> = pairs
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k.to_string(), v)))
        .collect();
    Value::Object(map)
}

// ── Reference helpers ──

/// Finds or creates a lookup record (status, role, location type) by name.
pub(crate) fn named(
    ctx: &PersistContext<'_>,
    kind: RecordKind,
    name: &str,
) -> Result<RecordId, PersistError> {
    let (record, created) =
        ctx.inventory
            .get_or_create(kind, &Filter::new().eq("name", name), Value::Null)?;
    if created {
        verbose!(ctx.debug, "target: created {kind} {name}");
    }
    Ok(record.id)
}

/// The id of the single record matching `filter`, or `Unresolved`.
pub(crate) fn lookup(
    ctx: &PersistContext<'_>,
    kind: RecordKind,
    filter: &Filter,
    what: &'static str,
    name: &str,
) -> Result<RecordId, PersistError> {
    ctx.inventory
        .find_first(kind, filter)?
        .map(|r| r.id)
        .ok_or_else(|| PersistError::Unresolved {
            what,
            name: name.to_string(),
        })
}

/// A location by name, preferring one already resolved in this run.
pub(crate) fn location(ctx: &PersistContext<'_>, name: &str) -> Result<RecordId, PersistError> {
    if let Some(id) = ctx.resolution.building(name) {
        return Ok(id);
    }
    lookup(
        ctx,
        RecordKind::Location,
        &Filter::new().eq("name", name),
        "location",
        name,
    )
}

/// A device by name and location.
pub(crate) fn device(
    ctx: &PersistContext<'_>,
    name: &str,
    location_name: &str,
) -> Result<RecordId, PersistError> {
    if let Some(id) = ctx.resolution.device(name, location_name) {
        return Ok(id);
    }
    let location_id = location(ctx, location_name)?;
    lookup(
        ctx,
        RecordKind::Device,
        &Filter::new().eq("name", name).eq_ref("location", location_id),
        "device",
        name,
    )
}

/// A device interface by device, location and interface name.
pub(crate) fn interface(
    ctx: &PersistContext<'_>,
    device_name: &str,
    location_name: &str,
    name: &str,
) -> Result<RecordId, PersistError> {
    if let Some(id) = ctx.resolution.interface(device_name, location_name, name) {
        return Ok(id);
    }
    let device_id = device(ctx, device_name, location_name)?;
    lookup(
        ctx,
        RecordKind::Interface,
        &Filter::new().eq("name", name).eq_ref("device", device_id),
        "interface",
        &format!("{device_name}:{name}"),
    )
}

/// The building a network run is scoped to.
pub(crate) fn scope_building<'c>(ctx: &'c PersistContext<'_>) -> Result<&'c str, PersistError> {
    ctx.resolution
        .scope_building
        .as_deref()
        .ok_or_else(|| PersistError::Unresolved {
            what: "scope building",
            name: String::new(),
        })
}
