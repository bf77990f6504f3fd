//! Model families.
//!
//! A family is the set of entity types one sync reconciles. It fixes the
//! dependency order used by the diff engine: each top-level type followed
//! depth-first by its declared children, so parents always precede their
//! children.

use crate::{EntitySchema, ModelError, ModelResult};
use std::collections::{BTreeSet, HashMap};

/// Registered schemas plus their computed dependency order.
#[derive(Debug, Clone)]
pub struct ModelFamily {
    name: String,
    schemas: HashMap<String, EntitySchema>,
    top_level: Vec<String>,
    order: Vec<String>,
}

impl ModelFamily {
    pub fn builder(name: impl Into<String>) -> ModelFamilyBuilder {
        ModelFamilyBuilder {
            name: name.into(),
            schemas: Vec::new(),
            top_level: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn top_level(&self) -> &[String] {
        &self.top_level
    }

    /// All types, parents before children.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Position of a type in the dependency order.
    pub fn rank(&self, entity_type: &str) -> Option<usize> {
        self.order.iter().position(|t| t == entity_type)
    }

    pub fn schema(&self, entity_type: &str) -> Option<&EntitySchema> {
        self.schemas.get(entity_type)
    }

    pub fn require(&self, entity_type: &str) -> ModelResult<&EntitySchema> {
        self.schema(entity_type)
            .ok_or_else(|| ModelError::UnknownType(entity_type.to_string()))
    }

    /// The owning type and child field for `child_type`, if any.
    pub fn parent_of(&self, child_type: &str) -> Option<(&str, &str)> {
        self.order.iter().find_map(|parent| {
            let schema = self.schemas.get(parent)?;
            schema
                .child_field(child_type)
                .map(|field| (schema.entity_type.as_str(), field))
        })
    }
}

/// Collects schemas and top-level declarations for a [`ModelFamily`].
#[derive(Debug)]
pub struct ModelFamilyBuilder {
    name: String,
    schemas: Vec<EntitySchema>,
    top_level: Vec<String>,
}

impl ModelFamilyBuilder {
    pub fn register(mut self, schema: EntitySchema) -> Self {
        self.schemas.push(schema);
        self
    }

    pub fn top_level<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.top_level.extend(types.into_iter().map(Into::into));
        self
    }

    /// Validates every schema and computes the dependency order.
    pub fn build(self) -> ModelResult<ModelFamily> {
        let mut schemas = HashMap::with_capacity(self.schemas.len());
        for schema in self.schemas {
            schema.validate()?;
            let name = schema.entity_type.clone();
            if schemas.insert(name.clone(), schema).is_some() {
                return Err(ModelError::DuplicateType(name));
            }
        }

        let mut order = Vec::with_capacity(schemas.len());
        let mut visiting = BTreeSet::new();
        for top in &self.top_level {
            if !schemas.contains_key(top) {
                return Err(ModelError::UnknownType(top.clone()));
            }
            visit(top, &schemas, &mut visiting, &mut order)?;
        }

        let mut unreachable: Vec<&String> =
            schemas.keys().filter(|t| !order.contains(*t)).collect();
        unreachable.sort();
        if let Some(t) = unreachable.first() {
            return Err(ModelError::UnreachableType((*t).clone()));
        }

        Ok(ModelFamily {
            name: self.name,
            schemas,
            top_level: self.top_level,
            order,
        })
    }
}

fn visit(
    entity_type: &str,
    schemas: &HashMap<String, EntitySchema>,
    visiting: &mut BTreeSet<String>,
    order: &mut Vec<String>,
) -> ModelResult<()> {
    if visiting.contains(entity_type) {
        return Err(ModelError::CyclicChildren(entity_type.to_string()));
    }
    if order.iter().any(|t| t == entity_type) {
        return Ok(());
    }
    let Some(schema) = schemas.get(entity_type) else {
        return Err(ModelError::UnknownType(entity_type.to_string()));
    };

    visiting.insert(entity_type.to_string());
    order.push(entity_type.to_string());
    for child in &schema.children {
        if !schemas.contains_key(&child.entity_type) {
            return Err(ModelError::UnknownChildType {
                parent: entity_type.to_string(),
                child: child.entity_type.clone(),
            });
        }
        visit(&child.entity_type, schemas, visiting, order)?;
    }
    visiting.remove(entity_type);
    Ok(())
}
