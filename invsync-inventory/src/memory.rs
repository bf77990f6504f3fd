use crate::constraints::{self, RecordReader};
use crate::{Filter, InventoryBackend, InventoryError, InventoryResult, Record, RecordKind};
use invsync_types::RecordId;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Default)]
struct State {
    records: HashMap<RecordKind, Vec<Record>>,
}

impl State {
    fn position(&self, kind: RecordKind, id: RecordId) -> Option<usize> {
        self.records.get(&kind)?.iter().position(|r| r.id == id)
    }
}

impl RecordReader for State {
    fn read(&self, kind: RecordKind, id: RecordId) -> InventoryResult<Option<Record>> {
        Ok(self
            .records
            .get(&kind)
            .and_then(|rs| rs.iter().find(|r| r.id == id))
            .cloned())
    }

    fn scan(&self, kind: RecordKind) -> InventoryResult<Vec<Record>> {
        Ok(self.records.get(&kind).cloned().unwrap_or_default())
    }
}

/// Inventory held in memory. Cloning is not supported; share it behind an
/// `Arc` instead.
#[derive(Default)]
pub struct MemoryInventory {
    state: Mutex<State>,
}

impl MemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> InventoryResult<MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| InventoryError::LockPoisoned)
    }
}

impl InventoryBackend for MemoryInventory {
    fn get(&self, kind: RecordKind, id: RecordId) -> InventoryResult<Record> {
        self.lock()?.read(kind, id)?.ok_or(InventoryError::NotFound {
            kind,
            detail: id.to_string(),
        })
    }

    fn find(&self, kind: RecordKind, filter: &Filter) -> InventoryResult<Vec<Record>> {
        let state = self.lock()?;
        Ok(state
            .records
            .get(&kind)
            .map(|rs| rs.iter().filter(|r| filter.matches(&r.data)).cloned().collect())
            .unwrap_or_default())
    }

    fn create(&self, kind: RecordKind, data: Value) -> InventoryResult<Record> {
        let mut state = self.lock()?;
        constraints::validate(kind, &data, None, &*state)?;
        let record = Record {
            id: RecordId::new(),
            kind,
            data,
        };
        debug!("inventory: created {kind} {}", record.id);
        state.records.entry(kind).or_default().push(record.clone());
        Ok(record)
    }

    fn update(&self, kind: RecordKind, id: RecordId, changes: Value) -> InventoryResult<Record> {
        let Value::Object(changes) = changes else {
            return Err(InventoryError::NotAnObject(kind));
        };
        let mut state = self.lock()?;
        let not_found = || InventoryError::NotFound {
            kind,
            detail: id.to_string(),
        };
        let index = state.position(kind, id).ok_or_else(not_found)?;
        let mut updated = state.records[&kind][index].clone();
        if let Value::Object(map) = &mut updated.data {
            constraints::merge(map, &changes);
        }
        constraints::validate(kind, &updated.data, Some(id), &*state)?;
        if let Some(slot) = state.records.get_mut(&kind).and_then(|rs| rs.get_mut(index)) {
            *slot = updated.clone();
        }
        debug!("inventory: updated {kind} {id}");
        Ok(updated)
    }

    fn delete(&self, kind: RecordKind, id: RecordId) -> InventoryResult<()> {
        let mut state = self.lock()?;
        let index = state.position(kind, id).ok_or(InventoryError::NotFound {
            kind,
            detail: id.to_string(),
        })?;
        let needle = Value::String(id.to_string());
        for other in RecordKind::ALL {
            for (field, target) in constraints::references(other) {
                if *target != kind {
                    continue;
                }
                let used = state
                    .records
                    .get(&other)
                    .is_some_and(|rs| rs.iter().any(|r| r.data.get(*field) == Some(&needle)));
                if used {
                    return Err(InventoryError::InUse {
                        kind,
                        id: id.to_string(),
                        by: other,
                    });
                }
            }
        }
        if let Some(rs) = state.records.get_mut(&kind) {
            rs.remove(index);
        }
        debug!("inventory: deleted {kind} {id}");
        Ok(())
    }

    fn count(&self, kind: RecordKind) -> InventoryResult<usize> {
        Ok(self.lock()?.records.get(&kind).map_or(0, Vec::len))
    }
}
