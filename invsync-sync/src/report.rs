use crate::diff::Operation;
use chrono::{DateTime, Utc};
use invsync_types::RunId;
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-type outcome counts. In a dry run `created` and `updated` count
/// the changes that would have been applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeCounts {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// A change the target refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub entity_type: String,
    pub key: String,
    pub operation: Operation,
    pub message: String,
}

/// Summary of one sync run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub run_id: RunId,
    pub family: String,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub counts: BTreeMap<String, TypeCounts>,
    pub failures: Vec<Failure>,
    pub diagnostics: Vec<String>,
}

impl SyncReport {
    pub fn new(family: &str, dry_run: bool, types: &[String]) -> Self {
        let now = Utc::now();
        Self {
            run_id: RunId::new(),
            family: family.to_string(),
            dry_run,
            started_at: now,
            finished_at: now,
            counts: types
                .iter()
                .map(|t| (t.clone(), TypeCounts::default()))
                .collect(),
            failures: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn counts_mut(&mut self, entity_type: &str) -> &mut TypeCounts {
        self.counts.entry(entity_type.to_string()).or_default()
    }

    pub fn counts(&self, entity_type: &str) -> TypeCounts {
        self.counts.get(entity_type).copied().unwrap_or_default()
    }

    /// Totals across every type.
    pub fn totals(&self) -> TypeCounts {
        self.counts
            .values()
            .fold(TypeCounts::default(), |acc, c| TypeCounts {
                created: acc.created + c.created,
                updated: acc.updated + c.updated,
                unchanged: acc.unchanged + c.unchanged,
                skipped: acc.skipped + c.skipped,
                failed: acc.failed + c.failed,
            })
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}
