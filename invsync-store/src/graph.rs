//! In-memory object graph for one side of a sync.

use crate::{StoreError, StoreResult};
use invsync_model::{Entity, ModelFamily};
use invsync_types::{Fields, IdentityKey, RecordId};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Entities of one type, in insertion order.
#[derive(Debug, Clone, Default)]
struct Bucket {
    order: Vec<IdentityKey>,
    entities: HashMap<IdentityKey, Entity>,
}

/// Every entity loaded for one side of a sync, keyed by
/// `(entity type, identity key)`.
///
/// Only types registered in the store's [`ModelFamily`] are accepted.
/// Children are recorded on their parent for reporting but are stored
/// and diffed as independent entities.
#[derive(Debug, Clone)]
pub struct GraphStore {
    family: Arc<ModelFamily>,
    buckets: HashMap<String, Bucket>,
}

impl GraphStore {
    pub fn new(family: Arc<ModelFamily>) -> Self {
        let buckets = family
            .order()
            .iter()
            .map(|t| (t.clone(), Bucket::default()))
            .collect();
        Self { family, buckets }
    }

    pub fn family(&self) -> &ModelFamily {
        &self.family
    }

    /// Inserts an entity. The first entity with a given key wins; a later
    /// one is rejected with [`StoreError::DuplicateIdentity`].
    pub fn add(&mut self, entity: Entity) -> StoreResult<()> {
        let bucket = self.bucket_mut(entity.entity_type())?;
        if bucket.entities.contains_key(entity.key()) {
            return Err(StoreError::DuplicateIdentity {
                entity_type: entity.entity_type().to_string(),
                key: entity.key().clone(),
            });
        }
        trace!("graph add {} {}", entity.entity_type(), entity.key());
        bucket.order.push(entity.key().clone());
        bucket.entities.insert(entity.key().clone(), entity);
        Ok(())
    }

    pub fn get(&self, entity_type: &str, key: &IdentityKey) -> StoreResult<&Entity> {
        self.bucket(entity_type)?
            .entities
            .get(key)
            .ok_or_else(|| not_found(entity_type, key))
    }

    pub fn contains(&self, entity_type: &str, key: &IdentityKey) -> bool {
        self.buckets
            .get(entity_type)
            .is_some_and(|b| b.entities.contains_key(key))
    }

    /// All entities of a type in insertion order. The iterator is lazy and
    /// can be cloned to restart from the current position; calling
    /// `get_all` again starts from the beginning.
    pub fn get_all(&self, entity_type: &str) -> Entities<'_> {
        match self.buckets.get(entity_type) {
            Some(bucket) => Entities {
                keys: bucket.order.iter(),
                entities: Some(&bucket.entities),
            },
            None => Entities {
                keys: Default::default(),
                entities: None,
            },
        }
    }

    pub fn count(&self, entity_type: &str) -> usize {
        self.buckets.get(entity_type).map_or(0, |b| b.order.len())
    }

    /// Total number of entities across all types.
    pub fn len(&self) -> usize {
        self.buckets.values().map(|b| b.order.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records `child` under its parent's declared child field. Both
    /// entities must already be stored.
    pub fn add_child(
        &mut self,
        parent_type: &str,
        parent_key: &IdentityKey,
        child_type: &str,
        child_key: &IdentityKey,
    ) -> StoreResult<()> {
        let field = self
            .family
            .require(parent_type)
            .map_err(|_| StoreError::UnknownType(parent_type.to_string()))?
            .child_field(child_type)
            .ok_or_else(|| StoreError::UndeclaredChild {
                parent: parent_type.to_string(),
                child: child_type.to_string(),
            })?
            .to_string();

        if !self.contains(child_type, child_key) {
            return Err(not_found(child_type, child_key));
        }
        let parent = self.entity_mut(parent_type, parent_key)?;
        parent.push_child(&field, child_key.clone());
        Ok(())
    }

    /// Applies a partial update to a stored entity.
    pub fn update(&mut self, entity_type: &str, key: &IdentityKey, changes: &Fields) -> StoreResult<()> {
        let family = Arc::clone(&self.family);
        let schema = family
            .require(entity_type)
            .map_err(|_| StoreError::UnknownType(entity_type.to_string()))?;
        self.entity_mut(entity_type, key)?.apply(schema, changes)?;
        Ok(())
    }

    /// Records the persisted handle of a stored entity.
    pub fn set_handle(&mut self, entity_type: &str, key: &IdentityKey, handle: RecordId) -> StoreResult<()> {
        self.entity_mut(entity_type, key)?.set_handle(handle);
        Ok(())
    }

    /// Removes an entity and returns it.
    pub fn remove(&mut self, entity_type: &str, key: &IdentityKey) -> StoreResult<Entity> {
        let bucket = self.bucket_mut(entity_type)?;
        let entity = bucket
            .entities
            .remove(key)
            .ok_or_else(|| not_found(entity_type, key))?;
        bucket.order.retain(|k| k != key);
        Ok(entity)
    }

    /// Renders the store as a JSON tree: top-level types with their
    /// children nested under the declared child fields.
    pub fn dump(&self) -> Value {
        let mut root = Map::new();
        for entity_type in self.family.top_level() {
            let nodes: Vec<Value> = self
                .get_all(entity_type)
                .map(|e| self.render(e))
                .collect();
            root.insert(entity_type.clone(), Value::Array(nodes));
        }
        Value::Object(root)
    }

    fn render(&self, entity: &Entity) -> Value {
        let mut node = json!({
            "key": entity.key().to_string(),
            "fields": entity.fields(),
        });
        if let Some(schema) = self.family.schema(entity.entity_type()) {
            for child in &schema.children {
                let rendered: Vec<Value> = entity
                    .children(&child.field)
                    .iter()
                    .filter_map(|key| self.get(&child.entity_type, key).ok())
                    .map(|c| self.render(c))
                    .collect();
                if !rendered.is_empty() {
                    node[child.field.as_str()] = Value::Array(rendered);
                }
            }
        }
        node
    }

    fn bucket(&self, entity_type: &str) -> StoreResult<&Bucket> {
        self.buckets
            .get(entity_type)
            .ok_or_else(|| StoreError::UnknownType(entity_type.to_string()))
    }

    fn bucket_mut(&mut self, entity_type: &str) -> StoreResult<&mut Bucket> {
        self.buckets
            .get_mut(entity_type)
            .ok_or_else(|| StoreError::UnknownType(entity_type.to_string()))
    }

    fn entity_mut(&mut self, entity_type: &str, key: &IdentityKey) -> StoreResult<&mut Entity> {
        self.bucket_mut(entity_type)?
            .entities
            .get_mut(key)
            .ok_or_else(|| not_found(entity_type, key))
    }
}

fn not_found(entity_type: &str, key: &IdentityKey) -> StoreError {
    StoreError::NotFound {
        entity_type: entity_type.to_string(),
        key: key.clone(),
    }
}

/// Iterator over the entities of one type, in insertion order.
#[derive(Debug, Clone)]
pub struct Entities<'a> {
    keys: std::slice::Iter<'a, IdentityKey>,
    entities: Option<&'a HashMap<IdentityKey, Entity>>,
}

impl<'a> Iterator for Entities<'a> {
    type Item = &'a Entity;

    fn next(&mut self) -> Option<Self::Item> {
        let entities = self.entities?;
        self.keys.find_map(|k| entities.get(k))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.keys.len()))
    }
}
