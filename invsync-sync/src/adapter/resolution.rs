use invsync_types::RecordId;
use std::collections::HashMap;

/// Name-to-handle lookups for one run.
///
/// Filled by the target adapter while it loads, then extended by the
/// persisters as they create records, so an entity created early in a
/// run can be referenced by its children later in the same run.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    /// The building a network run is scoped to.
    pub scope_building: Option<String>,
    pub buildings: HashMap<String, RecordId>,
    /// `(building, room)` to room location.
    pub rooms: HashMap<(String, String), RecordId>,
    pub namespaces: HashMap<String, RecordId>,
    pub vlan_groups: HashMap<String, RecordId>,
    /// `(device, location)` to device.
    pub devices: HashMap<(String, String), RecordId>,
    /// `(device, location, interface)` to interface.
    pub interfaces: HashMap<(String, String, String), RecordId>,
}

impl ResolutionContext {
    pub fn for_building(building: impl Into<String>) -> Self {
        Self {
            scope_building: Some(building.into()),
            ..Self::default()
        }
    }

    pub fn building(&self, name: &str) -> Option<RecordId> {
        self.buildings.get(name).copied()
    }

    pub fn room(&self, building: &str, name: &str) -> Option<RecordId> {
        self.rooms
            .get(&(building.to_string(), name.to_string()))
            .copied()
    }

    pub fn device(&self, name: &str, location: &str) -> Option<RecordId> {
        self.devices
            .get(&(name.to_string(), location.to_string()))
            .copied()
    }

    pub fn interface(&self, device: &str, location: &str, name: &str) -> Option<RecordId> {
        self.interfaces
            .get(&(device.to_string(), location.to_string(), name.to_string()))
            .copied()
    }
}
