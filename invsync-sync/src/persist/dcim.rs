use super::{
    PersistContext, Persister, custom_fields, device, handle, interface, location, lookup, named,
    opt_text, present, scope_building, text,
};
use crate::PersistError;
use invsync_inventory::{Filter, RecordKind};
use invsync_model::Entity;
use invsync_model::dcim::field;
use invsync_types::{Fields, RecordId};
use serde_json::{Map, Value, json};

/// Resolves a device type by model and manufacturer. Both must exist.
fn device_type(
    ctx: &PersistContext<'_>,
    model: &str,
    manufacturer: &str,
) -> Result<RecordId, PersistError> {
    let manufacturer_id = lookup(
        ctx,
        RecordKind::Manufacturer,
        &Filter::new().eq("name", manufacturer),
        "manufacturer",
        manufacturer,
    )?;
    lookup(
        ctx,
        RecordKind::DeviceType,
        &Filter::new()
            .eq("model", model)
            .eq_ref("manufacturer", manufacturer_id),
        "device type",
        model,
    )
}

// ── Device ──

pub(crate) struct DevicePersister;

impl Persister for DevicePersister {
    fn create(
        &self,
        ctx: &mut PersistContext<'_>,
        identifiers: &Fields,
        attributes: &Fields,
    ) -> Result<RecordId, PersistError> {
        let name = text(identifiers, field::NAME)?;
        let location_name = text(identifiers, field::LOCATION)?;
        verbose!(ctx.debug, "target: creating device {name} in {location_name}");

        let location_id = location(ctx, location_name)?;
        let device_type_id = device_type(
            ctx,
            text(attributes, field::DEVICE_TYPE)?,
            text(attributes, field::MANUFACTURER)?,
        )?;
        let role = named(ctx, RecordKind::Role, text(attributes, field::ROLE)?)?;
        let status = named(ctx, RecordKind::Status, &ctx.config.statuses.active)?;

        let record = ctx.inventory.create(
            RecordKind::Device,
            json!({
                "name": name,
                "location": location_id.to_string(),
                "device_type": device_type_id.to_string(),
                "role": role.to_string(),
                "status": status.to_string(),
                "serial": present(attributes, field::SERIAL),
                "platform": present(attributes, field::PLATFORM),
                "custom_fields": custom_fields([
                    ("monitoring_profile", present(attributes, field::MONITORING_PROFILE)),
                ]),
            }),
        )?;
        ctx.resolution
            .devices
            .insert((name.to_string(), location_name.to_string()), record.id);
        Ok(record.id)
    }

    fn update(
        &self,
        ctx: &mut PersistContext<'_>,
        current: &Entity,
        changes: &Fields,
    ) -> Result<bool, PersistError> {
        let id = handle(current)?;
        verbose!(ctx.debug, "target: updating device {}", current.key());

        let mut patch = Map::new();
        if let Some(serial) = present(changes, field::SERIAL) {
            patch.insert("serial".to_string(), serial);
        }
        if let Some(role) = opt_text(changes, field::ROLE) {
            let role = named(ctx, RecordKind::Role, role)?;
            patch.insert("role".to_string(), Value::String(role.to_string()));
        }
        if changes.contains_key(field::DEVICE_TYPE) || changes.contains_key(field::MANUFACTURER) {
            let pick = |name| opt_text(changes, name).or_else(|| current.get_str(name));
            let (Some(model), Some(manufacturer)) =
                (pick(field::DEVICE_TYPE), pick(field::MANUFACTURER))
            else {
                return Err(PersistError::MissingField(field::DEVICE_TYPE.to_string()));
            };
            let device_type_id = device_type(ctx, model, manufacturer)?;
            patch.insert(
                "device_type".to_string(),
                Value::String(device_type_id.to_string()),
            );
        }
        if let Some(profile) = present(changes, field::MONITORING_PROFILE) {
            patch.insert(
                "custom_fields".to_string(),
                json!({ "monitoring_profile": profile }),
            );
        }

        if patch.is_empty() {
            return Ok(false);
        }
        ctx.inventory
            .update(RecordKind::Device, id, Value::Object(patch))?;
        Ok(true)
    }
}

// ── Interface ──

pub(crate) struct InterfacePersister;

impl Persister for InterfacePersister {
    /// Adopts an interface that already exists on the device (typically
    /// one created from the device type's template) instead of creating
    /// a second one.
    fn create(
        &self,
        ctx: &mut PersistContext<'_>,
        identifiers: &Fields,
        attributes: &Fields,
    ) -> Result<RecordId, PersistError> {
        let name = text(identifiers, field::NAME)?;
        let device_name = text(identifiers, field::DEVICE)?;
        let location_name = text(identifiers, field::DEVICE_LOCATION)?;
        let device_id = device(ctx, device_name, location_name)?;
        let profile = present(attributes, field::MONITORING_PROFILE);

        let existing = ctx.inventory.find_first(
            RecordKind::Interface,
            &Filter::new().eq("name", name).eq_ref("device", device_id),
        )?;
        let id = match existing {
            Some(existing) => {
                verbose!(ctx.debug, "target: adopting interface {device_name}:{name}");
                if let Some(profile) = profile {
                    ctx.inventory.update(
                        RecordKind::Interface,
                        existing.id,
                        json!({ "custom_fields": { "monitoring_profile": profile } }),
                    )?;
                }
                existing.id
            }
            None => {
                verbose!(ctx.debug, "target: creating interface {device_name}:{name}");
                let status_name = opt_text(attributes, field::STATUS)
                    .unwrap_or(ctx.config.statuses.planned.as_str());
                let status = named(ctx, RecordKind::Status, status_name)?;
                let description = opt_text(attributes, field::DESCRIPTION)
                    .unwrap_or(ctx.config.default_interface_description.as_str());
                ctx.inventory
                    .create(
                        RecordKind::Interface,
                        json!({
                            "name": name,
                            "device": device_id.to_string(),
                            "type": opt_text(attributes, field::TYPE).unwrap_or("other"),
                            "status": status.to_string(),
                            "description": description,
                            "mgmt_only": attributes
                                .get(field::MGMT_ONLY)
                                .and_then(|v| v.as_bool())
                                .unwrap_or(false),
                            "mac_address": present(attributes, field::MAC_ADDRESS),
                            "custom_fields": custom_fields([("monitoring_profile", profile)]),
                        }),
                    )?
                    .id
            }
        };
        ctx.resolution.interfaces.insert(
            (
                device_name.to_string(),
                location_name.to_string(),
                name.to_string(),
            ),
            id,
        );
        Ok(id)
    }

    /// Only the monitoring profile is kept in step.
    fn update(
        &self,
        ctx: &mut PersistContext<'_>,
        current: &Entity,
        changes: &Fields,
    ) -> Result<bool, PersistError> {
        let id = handle(current)?;
        let Some(profile) = present(changes, field::MONITORING_PROFILE) else {
            return Ok(false);
        };
        verbose!(ctx.debug, "target: updating interface {}", current.key());
        ctx.inventory.update(
            RecordKind::Interface,
            id,
            json!({ "custom_fields": { "monitoring_profile": profile } }),
        )?;
        Ok(true)
    }
}

// ── Cable ──

pub(crate) struct CablePersister;

impl Persister for CablePersister {
    fn create(
        &self,
        ctx: &mut PersistContext<'_>,
        identifiers: &Fields,
        _attributes: &Fields,
    ) -> Result<RecordId, PersistError> {
        let building = scope_building(ctx)?;
        let from_device = text(identifiers, field::FROM_DEVICE)?;
        let from_iface = text(identifiers, field::FROM_INTERFACE)?;
        let to_device = text(identifiers, field::TO_DEVICE)?;
        let to_iface = text(identifiers, field::TO_INTERFACE)?;
        verbose!(
            ctx.debug,
            "target: creating cable {from_device}:{from_iface} <-> {to_device}:{to_iface}"
        );

        let a = interface(ctx, from_device, building, from_iface)?;
        let b = interface(ctx, to_device, building, to_iface)?;
        let status = named(ctx, RecordKind::Status, &ctx.config.statuses.connected)?;
        let record = ctx.inventory.create(
            RecordKind::Cable,
            json!({
                "termination_a": a.to_string(),
                "termination_b": b.to_string(),
                "status": status.to_string(),
            }),
        )?;
        Ok(record.id)
    }

    /// Cables have no attributes; there is never anything to update.
    fn update(
        &self,
        _ctx: &mut PersistContext<'_>,
        _current: &Entity,
        _changes: &Fields,
    ) -> Result<bool, PersistError> {
        Ok(false)
    }
}
