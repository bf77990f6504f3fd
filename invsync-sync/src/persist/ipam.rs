use super::{
    PersistContext, Persister, handle, interface, location, lookup, named, opt_text, present,
    scope_building, text,
};
use crate::PersistError;
use invsync_inventory::{Filter, RecordKind};
use invsync_model::Entity;
use invsync_model::dcim::field;
use invsync_types::{Fields, RecordId};
use serde_json::{Map, Value, json};
use tracing::{info, warn};

/// The namespace a record lives in, resolved by name.
fn namespace(ctx: &PersistContext<'_>, name: &str) -> Result<RecordId, PersistError> {
    if let Some(id) = ctx.resolution.namespaces.get(name) {
        return Ok(*id);
    }
    lookup(
        ctx,
        RecordKind::Namespace,
        &Filter::new().eq("name", name),
        "namespace",
        name,
    )
}

/// An optional location reference as JSON.
fn location_ref(ctx: &PersistContext<'_>, fields: &Fields) -> Result<Value, PersistError> {
    match opt_text(fields, field::LOCATION) {
        Some(name) => Ok(Value::String(location(ctx, name)?.to_string())),
        None => Ok(Value::Null),
    }
}

// ── Namespace ──

pub(crate) struct NamespacePersister;

impl Persister for NamespacePersister {
    fn create(
        &self,
        ctx: &mut PersistContext<'_>,
        identifiers: &Fields,
        attributes: &Fields,
    ) -> Result<RecordId, PersistError> {
        let name = text(identifiers, field::NAME)?;
        verbose!(ctx.debug, "target: creating namespace {name}");
        let record = ctx.inventory.create(
            RecordKind::Namespace,
            json!({
                "name": name,
                "description": present(attributes, field::DESCRIPTION),
            }),
        )?;
        ctx.resolution.namespaces.insert(name.to_string(), record.id);
        Ok(record.id)
    }

    fn update(
        &self,
        ctx: &mut PersistContext<'_>,
        current: &Entity,
        changes: &Fields,
    ) -> Result<bool, PersistError> {
        let id = handle(current)?;
        let Some(description) = present(changes, field::DESCRIPTION) else {
            return Ok(false);
        };
        verbose!(ctx.debug, "target: updating namespace {}", current.key());
        ctx.inventory
            .update(RecordKind::Namespace, id, json!({ "description": description }))?;
        Ok(true)
    }
}

// ── Prefix ──

pub(crate) struct PrefixPersister;

impl Persister for PrefixPersister {
    fn create(
        &self,
        ctx: &mut PersistContext<'_>,
        identifiers: &Fields,
        attributes: &Fields,
    ) -> Result<RecordId, PersistError> {
        let prefix = text(identifiers, field::PREFIX)?;
        let namespace_id = namespace(ctx, text(identifiers, field::NAMESPACE)?)?;
        verbose!(ctx.debug, "target: creating prefix {prefix}");
        let status = named(ctx, RecordKind::Status, &ctx.config.statuses.active)?;
        let record = ctx.inventory.create(
            RecordKind::Prefix,
            json!({
                "prefix": prefix,
                "namespace": namespace_id.to_string(),
                "status": status.to_string(),
                "type": text(attributes, field::TYPE)?,
                "description": present(attributes, field::DESCRIPTION),
            }),
        )?;
        Ok(record.id)
    }

    fn update(
        &self,
        ctx: &mut PersistContext<'_>,
        current: &Entity,
        changes: &Fields,
    ) -> Result<bool, PersistError> {
        let id = handle(current)?;
        let mut patch = Map::new();
        for name in [field::DESCRIPTION, field::TYPE] {
            if let Some(value) = present(changes, name) {
                patch.insert(name.to_string(), value);
            }
        }
        if patch.is_empty() {
            return Ok(false);
        }
        verbose!(ctx.debug, "target: updating prefix {}", current.key());
        ctx.inventory
            .update(RecordKind::Prefix, id, Value::Object(patch))?;
        Ok(true)
    }
}

// ── VLAN group ──

pub(crate) struct VlanGroupPersister;

impl Persister for VlanGroupPersister {
    fn create(
        &self,
        ctx: &mut PersistContext<'_>,
        identifiers: &Fields,
        attributes: &Fields,
    ) -> Result<RecordId, PersistError> {
        let name = text(identifiers, field::NAME)?;
        verbose!(ctx.debug, "target: creating VLAN group {name}");
        let record = ctx.inventory.create(
            RecordKind::VlanGroup,
            json!({
                "name": name,
                "location": location_ref(ctx, attributes)?,
            }),
        )?;
        ctx.resolution.vlan_groups.insert(name.to_string(), record.id);
        Ok(record.id)
    }

    fn update(
        &self,
        ctx: &mut PersistContext<'_>,
        current: &Entity,
        changes: &Fields,
    ) -> Result<bool, PersistError> {
        let id = handle(current)?;
        if !changes.contains_key(field::LOCATION) {
            return Ok(false);
        }
        verbose!(ctx.debug, "target: updating VLAN group {}", current.key());
        let location = location_ref(ctx, changes)?;
        ctx.inventory
            .update(RecordKind::VlanGroup, id, json!({ "location": location }))?;
        Ok(true)
    }
}

// ── VLAN ──

pub(crate) struct VlanPersister;

impl Persister for VlanPersister {
    fn create(
        &self,
        ctx: &mut PersistContext<'_>,
        identifiers: &Fields,
        attributes: &Fields,
    ) -> Result<RecordId, PersistError> {
        let name = text(identifiers, field::NAME)?;
        let vid = identifiers
            .get(field::VID)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| PersistError::MissingField(field::VID.to_string()))?;
        let group_name = text(identifiers, field::VLAN_GROUP)?;
        verbose!(ctx.debug, "target: creating VLAN {vid} {name}");

        let group = match ctx.resolution.vlan_groups.get(group_name) {
            Some(id) => *id,
            None => lookup(
                ctx,
                RecordKind::VlanGroup,
                &Filter::new().eq("name", group_name),
                "VLAN group",
                group_name,
            )?,
        };
        let status = named(ctx, RecordKind::Status, &ctx.config.statuses.active)?;
        let record = ctx.inventory.create(
            RecordKind::Vlan,
            json!({
                "vid": vid,
                "name": name,
                "status": status.to_string(),
                "vlan_group": group.to_string(),
                "location": location_ref(ctx, attributes)?,
            }),
        )?;
        Ok(record.id)
    }

    fn update(
        &self,
        ctx: &mut PersistContext<'_>,
        current: &Entity,
        changes: &Fields,
    ) -> Result<bool, PersistError> {
        let id = handle(current)?;
        if !changes.contains_key(field::LOCATION) {
            return Ok(false);
        }
        verbose!(ctx.debug, "target: updating VLAN {}", current.key());
        let location = location_ref(ctx, changes)?;
        ctx.inventory
            .update(RecordKind::Vlan, id, json!({ "location": location }))?;
        Ok(true)
    }
}

// ── IP address ──

pub(crate) struct IpAddressPersister;

impl Persister for IpAddressPersister {
    /// Reuses an existing record for the same address, then assigns it to
    /// its interface. A failed assignment is logged and does not fail the
    /// create.
    fn create(
        &self,
        ctx: &mut PersistContext<'_>,
        identifiers: &Fields,
        attributes: &Fields,
    ) -> Result<RecordId, PersistError> {
        let address = text(identifiers, field::ADDRESS)?;
        let namespace_name = text(identifiers, field::NAMESPACE)?;
        verbose!(ctx.debug, "target: creating IP address {address}");

        let namespace_id = namespace(ctx, namespace_name)?;
        let status_name =
            opt_text(attributes, field::STATUS).unwrap_or(ctx.config.statuses.active.as_str());
        let status = named(ctx, RecordKind::Status, status_name)?;

        let filter = Filter::new()
            .eq("address", address)
            .eq_ref("namespace", namespace_id);
        let id = match ctx.inventory.find_first(RecordKind::IpAddress, &filter)? {
            Some(existing) => {
                info!("target: IP address {address} already exists, reusing it");
                existing.id
            }
            None => {
                ctx.inventory
                    .create(
                        RecordKind::IpAddress,
                        json!({
                            "address": address,
                            "namespace": namespace_id.to_string(),
                            "status": status.to_string(),
                        }),
                    )?
                    .id
            }
        };
        if let Err(e) = assign(ctx, id, address, attributes) {
            warn!("target: failed to assign IP address {address}: {e}");
        }
        Ok(id)
    }

    fn update(
        &self,
        ctx: &mut PersistContext<'_>,
        current: &Entity,
        changes: &Fields,
    ) -> Result<bool, PersistError> {
        let id = handle(current)?;
        let address = text(current.fields(), field::ADDRESS)?;
        verbose!(ctx.debug, "target: updating IP address {address}");

        let mut written = false;
        if let Some(status_name) = opt_text(changes, field::STATUS) {
            let status = named(ctx, RecordKind::Status, status_name)?;
            ctx.inventory.update(
                RecordKind::IpAddress,
                id,
                json!({ "status": status.to_string() }),
            )?;
            written = true;
        }
        if changes.contains_key(field::INTERFACE) || changes.contains_key(field::IP_DEVICE) {
            let mut target = current.fields().clone();
            target.extend(changes.iter().map(|(k, v)| (k.clone(), v.clone())));
            let iface = assign(ctx, id, address, &target)?;
            release(ctx, id, iface)?;
            written = true;
        }
        Ok(written)
    }
}

/// Assigns an address to the interface named in `fields` and makes an
/// IPv4 address the device's primary address. Returns the interface,
/// or `None` when `fields` names none.
fn assign(
    ctx: &PersistContext<'_>,
    ip: RecordId,
    address: &str,
    fields: &Fields,
) -> Result<Option<RecordId>, PersistError> {
    let (Some(iface_name), Some(device_name)) = (
        opt_text(fields, field::INTERFACE),
        opt_text(fields, field::IP_DEVICE),
    ) else {
        return Ok(None);
    };
    let building = scope_building(ctx)?;
    let iface = interface(ctx, device_name, building, iface_name)?;

    ctx.inventory.get_or_create(
        RecordKind::IpAssignment,
        &Filter::new()
            .eq_ref("ip_address", ip)
            .eq_ref("interface", iface),
        Value::Null,
    )?;
    if !address.contains(':') {
        let record = ctx.inventory.get(RecordKind::Interface, iface)?;
        if let Some(device_id) = record.get_ref("device") {
            ctx.inventory.update(
                RecordKind::Device,
                device_id,
                json!({ "primary_ip4": ip.to_string() }),
            )?;
        }
    }
    verbose!(ctx.debug, "target: assigned {address} to {device_name}:{iface_name}");
    Ok(Some(iface))
}

/// Removes the address's assignments to every interface but `keep`,
/// clearing it as primary address of the devices it leaves.
fn release(
    ctx: &PersistContext<'_>,
    ip: RecordId,
    keep: Option<RecordId>,
) -> Result<(), PersistError> {
    let assignments = ctx
        .inventory
        .find(RecordKind::IpAssignment, &Filter::new().eq_ref("ip_address", ip))?;
    let primary = Value::String(ip.to_string());
    let kept_device = match keep {
        Some(iface) => ctx.inventory.get(RecordKind::Interface, iface)?.get_ref("device"),
        None => None,
    };
    for assignment in assignments {
        let Some(iface) = assignment.get_ref("interface") else {
            continue;
        };
        if Some(iface) == keep {
            continue;
        }
        ctx.inventory.delete(RecordKind::IpAssignment, assignment.id)?;
        let record = ctx.inventory.get(RecordKind::Interface, iface)?;
        let Some(device_id) = record.get_ref("device").filter(|d| Some(*d) != kept_device)
        else {
            continue;
        };
        let device = ctx.inventory.get(RecordKind::Device, device_id)?;
        if device.data.get("primary_ip4") == Some(&primary) {
            ctx.inventory.update(
                RecordKind::Device,
                device_id,
                json!({ "primary_ip4": null }),
            )?;
        }
        verbose!(ctx.debug, "target: released {ip} from interface {iface}");
    }
    Ok(())
}
