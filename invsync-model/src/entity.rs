use crate::{EntitySchema, ModelError, ModelResult};
use invsync_types::{FieldValue, Fields, IdentityKey, RecordId};
use serde::Serialize;
use std::collections::BTreeMap;

/// One identity-keyed instance of an entity type.
///
/// The identity key is computed once, at construction, from the schema's
/// identity fields. Children are bookkeeping for reporting only: they hold
/// the keys of owned entities, which are stored and diffed independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    entity_type: String,
    key: IdentityKey,
    fields: Fields,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    children: BTreeMap<String, Vec<IdentityKey>>,
    /// Handle of the persisted record on the target side.
    #[serde(skip_serializing_if = "Option::is_none")]
    handle: Option<RecordId>,
}

impl Entity {
    /// Builds an entity, validating it against its schema.
    pub fn new(schema: &EntitySchema, fields: Fields) -> ModelResult<Self> {
        schema.check_fields(&fields)?;
        let key = schema.identity_key(&fields)?;
        Ok(Self {
            entity_type: schema.entity_type.clone(),
            key,
            fields,
            children: BTreeMap::new(),
            handle: None,
        })
    }

    pub fn with_handle(mut self, handle: RecordId) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn key(&self) -> &IdentityKey {
        &self.key
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn handle(&self) -> Option<RecordId> {
        self.handle
    }

    pub fn set_handle(&mut self, handle: RecordId) {
        self.handle = Some(handle);
    }

    /// Returns a field, or `Null` when absent.
    pub fn get(&self, name: &str) -> &FieldValue {
        static NULL: FieldValue = FieldValue::Null;
        self.fields.get(name).unwrap_or(&NULL)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).as_str()
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).as_i64()
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).as_f64()
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).as_bool()
    }

    /// Applies a partial update. Fields not named in `changes` are left
    /// untouched; identity fields cannot change.
    pub fn apply(&mut self, schema: &EntitySchema, changes: &Fields) -> ModelResult<()> {
        if let Some(name) = changes.keys().find(|name| schema.is_identifier(name)) {
            return Err(ModelError::ImmutableIdentityField {
                entity_type: self.entity_type.clone(),
                field: name.clone(),
            });
        }
        schema.check_fields(changes)?;
        for (name, value) in changes {
            self.fields.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    /// Keys of children listed under `field`.
    pub fn children(&self, field: &str) -> &[IdentityKey] {
        self.children.get(field).map_or(&[], Vec::as_slice)
    }

    pub fn children_map(&self) -> &BTreeMap<String, Vec<IdentityKey>> {
        &self.children
    }

    /// Appends a child key under `field`. Returns false if it was already listed.
    pub fn push_child(&mut self, field: &str, key: IdentityKey) -> bool {
        let list = self.children.entry(field.to_string()).or_default();
        if list.contains(&key) {
            return false;
        }
        list.push(key);
        true
    }
}
