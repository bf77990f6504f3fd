//! Source adapter for buildings and rooms.

use super::{GraphBuilder, LoadContext, Loaded, SourceAdapter};
use crate::SyncResult;
use crate::provider::{TenantDirectory, fetch_all_pages};
use async_trait::async_trait;
use invsync_model::dcim::{BUILDING, Building, Model, Room};
use invsync_model::ModelFamily;
use std::sync::Arc;
use tracing::{debug, info};

/// Loads buildings and their rooms from a [`TenantDirectory`].
pub struct LocationSource {
    directory: Arc<dyn TenantDirectory>,
}

impl LocationSource {
    pub fn new(directory: Arc<dyn TenantDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl SourceAdapter for LocationSource {
    async fn load(&self, family: Arc<ModelFamily>, ctx: &LoadContext<'_>) -> SyncResult<Loaded> {
        let config = ctx.config;
        let directory = &*self.directory;
        let mut builder = GraphBuilder::new(family, "source", ctx.debug);

        let buildings = fetch_all_pages(move |cursor| directory.list_buildings(cursor)).await?;
        info!("source: {} buildings listed", buildings.len());

        for record in buildings {
            if !config.building_statuses.contains(&record.status) {
                debug!(
                    "source: skipping building {} with status {:?}",
                    record.building_name, record.status
                );
                continue;
            }

            let building = Building {
                name: record.building_name.clone(),
                status: config.statuses.planned.clone(),
                external_id: Some(record.id),
                longitude: record.longitude,
                latitude: record.latitude,
                technical_reference: record.technical_reference.clone(),
            }
            .into_entity()?;
            let Some(building_key) = builder.add(building)? else {
                continue;
            };

            let building_id = record.id;
            let rooms =
                fetch_all_pages(move |cursor| directory.list_rooms(building_id, cursor)).await?;
            for room in rooms {
                let status = if room.active {
                    &config.statuses.planned
                } else {
                    &config.statuses.retired
                };
                let entity = Room {
                    name: room.room_name,
                    building: record.building_name.clone(),
                    external_id: room.id,
                    status: status.clone(),
                }
                .into_entity()?;
                builder.add_under(Some((BUILDING, &building_key)), entity)?;
            }
        }

        let loaded = builder.finish();
        info!("source: loaded {} entities", loaded.graph.len());
        Ok(loaded)
    }
}
