//! The apply engine.
//!
//! Walks a [`Diff`] in order and hands each change to its type's
//! persister. A change that fails is logged with its type and key,
//! recorded in the report, and the walk moves on; nothing a single
//! change does can stop the batch.

use crate::diff::{Change, Diff, Operation};
use crate::persist::{PersistContext, persister_for};
use crate::{PersistError, SyncReport};
use invsync_model::Entity;
use invsync_store::GraphStore;
use invsync_types::RecordId;
use tracing::{error, info, warn};

/// Counts the changes a dry run would make. Touches nothing.
pub fn summarize(diff: &Diff, report: &mut SyncReport) {
    for change in &diff.changes {
        let counts = report.counts_mut(&change.entity_type);
        match change.operation {
            Operation::Create => counts.created += 1,
            Operation::Update => counts.updated += 1,
            Operation::Delete => {}
        }
        info!(
            "dry run: would {} {} {}",
            change.operation, change.entity_type, change.key
        );
    }
}

/// Applies every change in `diff`, recording outcomes in `report`.
///
/// Successful changes are mirrored into `target` so later changes in
/// the same run see them.
pub fn apply(
    diff: &Diff,
    target: &mut GraphStore,
    ctx: &mut PersistContext<'_>,
    report: &mut SyncReport,
) {
    for change in &diff.changes {
        match apply_one(change, target, ctx) {
            Ok(false) => {
                info!(
                    "nothing written for {} {}: no changed field is kept in step",
                    change.entity_type, change.key
                );
                report.counts_mut(&change.entity_type).unchanged += 1;
            }
            Ok(true) => {
                let counts = report.counts_mut(&change.entity_type);
                match change.operation {
                    Operation::Create => counts.created += 1,
                    Operation::Update => counts.updated += 1,
                    Operation::Delete => {}
                }
            }
            Err(e) => {
                error!(
                    "failed to {} {} {}: {e}",
                    change.operation, change.entity_type, change.key
                );
                report.counts_mut(&change.entity_type).failed += 1;
                report.failures.push(crate::Failure {
                    entity_type: change.entity_type.clone(),
                    key: change.key.to_string(),
                    operation: change.operation,
                    message: e.to_string(),
                });
            }
        }
    }
}

/// Returns whether the inventory was written.
fn apply_one(
    change: &Change,
    target: &mut GraphStore,
    ctx: &mut PersistContext<'_>,
) -> Result<bool, PersistError> {
    let persister = persister_for(&change.entity_type)
        .ok_or_else(|| PersistError::NoPersister(change.entity_type.clone()))?;

    match change.operation {
        Operation::Create => {
            let handle = persister.create(ctx, &change.identifiers, &change.attributes)?;
            record_created(change, handle, target);
        }
        Operation::Update => {
            let current = existing(change, target)?;
            if !persister.update(ctx, &current, &change.attributes)? {
                return Ok(false);
            }
            if let Err(e) = target.update(&change.entity_type, &change.key, &change.attributes) {
                warn!("target graph out of step for {} {}: {e}", change.entity_type, change.key);
            }
        }
        Operation::Delete => {
            let current = existing(change, target)?;
            persister.delete(ctx, &current)?;
            if let Err(e) = target.remove(&change.entity_type, &change.key) {
                warn!("target graph out of step for {} {}: {e}", change.entity_type, change.key);
            }
        }
    }
    Ok(true)
}

fn existing(change: &Change, target: &GraphStore) -> Result<Entity, PersistError> {
    target
        .get(&change.entity_type, &change.key)
        .cloned()
        .map_err(|_| PersistError::NoHandle {
            entity_type: change.entity_type.clone(),
            key: change.key.to_string(),
        })
}

/// Mirrors a created entity into the target graph.
fn record_created(change: &Change, handle: RecordId, target: &mut GraphStore) {
    let mut fields = change.identifiers.clone();
    fields.extend(change.attributes.clone());

    let built = target
        .family()
        .require(&change.entity_type)
        .map_err(|e| e.to_string())
        .and_then(|schema| Entity::new(schema, fields).map_err(|e| e.to_string()));
    let entity = match built {
        Ok(entity) => entity.with_handle(handle),
        Err(e) => {
            warn!("cannot mirror {} {}: {e}", change.entity_type, change.key);
            return;
        }
    };
    if let Err(e) = target.add(entity) {
        warn!("cannot mirror {} {}: {e}", change.entity_type, change.key);
        return;
    }
    if let Some((parent_type, parent_key)) = &change.parent {
        if target.contains(parent_type, parent_key) {
            if let Err(e) =
                target.add_child(parent_type, parent_key, &change.entity_type, &change.key)
            {
                warn!("cannot attach {} {}: {e}", change.entity_type, change.key);
            }
        }
    }
}
