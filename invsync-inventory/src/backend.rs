use crate::{Filter, InventoryError, InventoryResult, Record, RecordKind};
use invsync_types::RecordId;
use serde_json::Value;

/// Persistence operations of the target inventory.
///
/// `create` and `update` validate the resulting record; `update` is a
/// partial update that only touches the fields present in `changes`.
pub trait InventoryBackend: Send + Sync {
    fn get(&self, kind: RecordKind, id: RecordId) -> InventoryResult<Record>;

    /// All records of `kind` matching `filter`, in creation order.
    fn find(&self, kind: RecordKind, filter: &Filter) -> InventoryResult<Vec<Record>>;

    fn create(&self, kind: RecordKind, data: Value) -> InventoryResult<Record>;

    fn update(&self, kind: RecordKind, id: RecordId, changes: Value) -> InventoryResult<Record>;

    /// Deletes a record. Fails if another record still references it.
    fn delete(&self, kind: RecordKind, id: RecordId) -> InventoryResult<()>;

    fn count(&self, kind: RecordKind) -> InventoryResult<usize>;

    /// Exactly one record matching `filter`.
    fn find_one(&self, kind: RecordKind, filter: &Filter) -> InventoryResult<Record> {
        let mut found = self.find(kind, filter)?;
        match found.len() {
            0 => Err(InventoryError::NotFound {
                kind,
                detail: filter.to_string(),
            }),
            1 => Ok(found.remove(0)),
            count => Err(InventoryError::MultipleFound {
                kind,
                filter: filter.to_string(),
                count,
            }),
        }
    }

    /// The first record matching `filter`, if any.
    fn find_first(&self, kind: RecordKind, filter: &Filter) -> InventoryResult<Option<Record>> {
        Ok(self.find(kind, filter)?.into_iter().next())
    }

    /// Finds a record matching `filter`, creating it from the filter's
    /// fields plus `defaults` if none exists. Returns whether it was created.
    fn get_or_create(
        &self,
        kind: RecordKind,
        filter: &Filter,
        defaults: Value,
    ) -> InventoryResult<(Record, bool)> {
        if let Some(existing) = self.find_first(kind, filter)? {
            return Ok((existing, false));
        }
        let mut data = match defaults {
            Value::Object(map) => map,
            Value::Null => serde_json::Map::new(),
            _ => return Err(InventoryError::NotAnObject(kind)),
        };
        for (field, value) in filter.conditions() {
            data.insert(field.clone(), value.clone());
        }
        let record = self.create(kind, Value::Object(data))?;
        Ok((record, true))
    }
}
