use super::{
    PersistContext, Persister, custom_fields, handle, location, named, opt_text, present, text,
};
use crate::PersistError;
use invsync_inventory::RecordKind;
use invsync_model::Entity;
use invsync_model::dcim::field;
use invsync_types::{Fields, RecordId};
use serde_json::{Map, Value, json};

pub(crate) struct BuildingPersister;

impl Persister for BuildingPersister {
    fn create(
        &self,
        ctx: &mut PersistContext<'_>,
        identifiers: &Fields,
        attributes: &Fields,
    ) -> Result<RecordId, PersistError> {
        let name = text(identifiers, field::NAME)?;
        verbose!(ctx.debug, "target: creating building {name}");

        let location_type = named(ctx, RecordKind::LocationType, "Building")?;
        let status = named(ctx, RecordKind::Status, &ctx.config.statuses.planned)?;
        let record = ctx.inventory.create(
            RecordKind::Location,
            json!({
                "name": name,
                "location_type": location_type.to_string(),
                "status": status.to_string(),
                "longitude": present(attributes, field::LONGITUDE),
                "latitude": present(attributes, field::LATITUDE),
                "custom_fields": custom_fields([
                    ("external_id", present(attributes, field::EXTERNAL_ID)),
                    ("technical_reference", present(attributes, field::TECHNICAL_REFERENCE)),
                ]),
            }),
        )?;
        ctx.resolution.buildings.insert(name.to_string(), record.id);
        Ok(record.id)
    }

    /// Coordinates and custom fields are applied when present. The
    /// status only ever moves to retired.
    fn update(
        &self,
        ctx: &mut PersistContext<'_>,
        current: &Entity,
        changes: &Fields,
    ) -> Result<bool, PersistError> {
        let id = handle(current)?;
        verbose!(ctx.debug, "target: updating building {}", current.key());

        let mut patch = Map::new();
        for name in [field::LONGITUDE, field::LATITUDE] {
            if let Some(value) = present(changes, name) {
                patch.insert(name.to_string(), value);
            }
        }
        let custom = custom_fields([
            ("external_id", present(changes, field::EXTERNAL_ID)),
            ("technical_reference", present(changes, field::TECHNICAL_REFERENCE)),
        ]);
        if custom.as_object().is_some_and(|m| !m.is_empty()) {
            patch.insert("custom_fields".to_string(), custom);
        }
        if let Some(status) = retired_status(ctx, changes)? {
            patch.insert("status".to_string(), Value::String(status.to_string()));
        }

        if patch.is_empty() {
            return Ok(false);
        }
        ctx.inventory
            .update(RecordKind::Location, id, Value::Object(patch))?;
        Ok(true)
    }
}

pub(crate) struct RoomPersister;

impl Persister for RoomPersister {
    fn create(
        &self,
        ctx: &mut PersistContext<'_>,
        identifiers: &Fields,
        attributes: &Fields,
    ) -> Result<RecordId, PersistError> {
        let name = text(identifiers, field::NAME)?;
        let building = text(identifiers, field::PARENT)?;
        let external_id = present(identifiers, field::EXTERNAL_ID);
        if let Some(existing) = ctx.resolution.room(building, name) {
            let record = ctx.inventory.get(RecordKind::Location, existing)?;
            if record.pointer("/custom_fields/external_id").is_none() {
                verbose!(ctx.debug, "target: adopting room {name} in {building}");
                ctx.inventory.update(
                    RecordKind::Location,
                    existing,
                    json!({ "custom_fields": custom_fields([("external_id", external_id)]) }),
                )?;
                return Ok(existing);
            }
        }
        verbose!(ctx.debug, "target: creating room {name} in {building}");

        let parent = location(ctx, building)?;
        let location_type = named(ctx, RecordKind::LocationType, "Room")?;
        let status_name =
            opt_text(attributes, field::STATUS).unwrap_or(ctx.config.statuses.planned.as_str());
        let status = named(ctx, RecordKind::Status, status_name)?;

        let record = ctx.inventory.create(
            RecordKind::Location,
            json!({
                "name": name,
                "location_type": location_type.to_string(),
                "status": status.to_string(),
                "parent": parent.to_string(),
                "custom_fields": custom_fields([
                    ("external_id", external_id),
                ]),
            }),
        )?;
        ctx.resolution
            .rooms
            .insert((building.to_string(), name.to_string()), record.id);
        Ok(record.id)
    }

    fn update(
        &self,
        ctx: &mut PersistContext<'_>,
        current: &Entity,
        changes: &Fields,
    ) -> Result<bool, PersistError> {
        let id = handle(current)?;
        let Some(status) = retired_status(ctx, changes)? else {
            return Ok(false);
        };
        verbose!(ctx.debug, "target: retiring room {}", current.key());
        ctx.inventory.update(
            RecordKind::Location,
            id,
            json!({ "status": status.to_string() }),
        )?;
        Ok(true)
    }
}

/// The retired status record, when `changes` retires the location.
fn retired_status(
    ctx: &PersistContext<'_>,
    changes: &Fields,
) -> Result<Option<RecordId>, PersistError> {
    let retired = &ctx.config.statuses.retired;
    match opt_text(changes, field::STATUS) {
        Some(status) if status == retired => Ok(Some(named(ctx, RecordKind::Status, retired)?)),
        _ => Ok(None),
    }
}
