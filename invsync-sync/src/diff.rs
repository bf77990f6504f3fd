//! The diff engine.
//!
//! Compares a source graph with a target graph of the same family, type
//! by type in the family's dependency order. Within a type, changes
//! follow the source graph's insertion order, so the same inputs always
//! produce the same change list.

use crate::SyncResult;
use invsync_model::ModelFamily;
use invsync_store::GraphStore;
use invsync_types::{Fields, IdentityKey};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Update,
    /// Never produced by [`diff`]; sync does not remove target records.
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// One required mutation of the target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    pub entity_type: String,
    pub operation: Operation,
    pub key: IdentityKey,
    /// Identity field values, for creates.
    pub identifiers: Fields,
    /// For a create, every non-identity field of the source entity. For
    /// an update, only the attributes that differ, with the source value.
    pub attributes: Fields,
    /// The owning entity in the source graph, if any.
    pub parent: Option<(String, IdentityKey)>,
    /// Position of the entity type in the family order.
    pub rank: usize,
}

/// The change list plus per-type tallies of what needed no change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diff {
    pub changes: Vec<Change>,
    /// Keys present on both sides with equal attributes.
    pub unchanged: BTreeMap<String, usize>,
    /// Keys present only in the target. Left alone.
    pub target_only: BTreeMap<String, usize>,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn count(&self, entity_type: &str, operation: Operation) -> usize {
        self.changes
            .iter()
            .filter(|c| c.entity_type == entity_type && c.operation == operation)
            .count()
    }
}

/// Computes the changes that bring `target` in line with `source`.
pub fn diff(family: &ModelFamily, source: &GraphStore, target: &GraphStore) -> SyncResult<Diff> {
    let parents = parent_index(family, source);
    let mut out = Diff::default();

    for (rank, entity_type) in family.order().iter().enumerate() {
        let schema = family.require(entity_type)?;
        let mut unchanged = 0;

        for entity in source.get_all(entity_type) {
            let parent = parents
                .get(&(entity_type.as_str(), entity.key()))
                .map(|(t, k)| (t.to_string(), (*k).clone()));

            if !target.contains(entity_type, entity.key()) {
                let attributes = entity
                    .fields()
                    .iter()
                    .filter(|(name, _)| !schema.is_identifier(name))
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect();
                out.changes.push(Change {
                    entity_type: entity_type.clone(),
                    operation: Operation::Create,
                    key: entity.key().clone(),
                    identifiers: schema.identity_fields(entity.fields()),
                    attributes,
                    parent,
                    rank,
                });
                continue;
            }

            let existing = target.get(entity_type, entity.key())?;
            let attributes = schema.diff_attributes(entity.fields(), existing.fields());
            if attributes.is_empty() {
                unchanged += 1;
                continue;
            }
            out.changes.push(Change {
                entity_type: entity_type.clone(),
                operation: Operation::Update,
                key: entity.key().clone(),
                identifiers: schema.identity_fields(entity.fields()),
                attributes,
                parent,
                rank,
            });
        }

        let target_only = target
            .get_all(entity_type)
            .filter(|e| !source.contains(entity_type, e.key()))
            .count();
        out.unchanged.insert(entity_type.clone(), unchanged);
        out.target_only.insert(entity_type.clone(), target_only);
    }
    Ok(out)
}

/// Maps each child `(type, key)` in `graph` to its owner.
fn parent_index<'g>(
    family: &'g ModelFamily,
    graph: &'g GraphStore,
) -> HashMap<(&'g str, &'g IdentityKey), (&'g str, &'g IdentityKey)> {
    let mut index = HashMap::new();
    for parent_type in family.order() {
        let Some(schema) = family.schema(parent_type) else {
            continue;
        };
        for parent in graph.get_all(parent_type) {
            for child in &schema.children {
                for key in parent.children(&child.field) {
                    index.insert(
                        (child.entity_type.as_str(), key),
                        (parent_type.as_str(), parent.key()),
                    );
                }
            }
        }
    }
    index
}
