//! SQLite-backed inventory.
//!
//! Every record is one row holding its kind and a JSON document. Filters
//! and constraints are evaluated on the decoded documents, so both
//! backends share the exact same matching and validation rules.

use crate::constraints::{self, RecordReader};
use crate::{Filter, InventoryBackend, InventoryError, InventoryResult, Record, RecordKind};
use invsync_types::RecordId;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Persistent inventory backed by SQLite.
#[derive(Clone)]
pub struct SqliteInventory {
    conn: Arc<Mutex<Connection>>,
}

/// Reader over a connection that is already locked.
struct ConnReader<'a>(&'a Connection);

impl RecordReader for ConnReader<'_> {
    fn read(&self, kind: RecordKind, id: RecordId) -> InventoryResult<Option<Record>> {
        let data: Option<String> = self
            .0
            .query_row(
                "SELECT data FROM records WHERE id = ?1 AND kind = ?2",
                params![id.to_string(), kind.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        data.map(|d| decode(id, kind, &d)).transpose()
    }

    fn scan(&self, kind: RecordKind) -> InventoryResult<Vec<Record>> {
        let mut stmt = self
            .0
            .prepare("SELECT id, data FROM records WHERE kind = ?1 ORDER BY seq")?;
        let rows = stmt.query_map(params![kind.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, data) = row?;
            let id: RecordId = id
                .parse()
                .map_err(|e| InventoryError::Corrupt(format!("invalid record id {id}: {e}")))?;
            records.push(decode(id, kind, &data)?);
        }
        Ok(records)
    }
}

fn decode(id: RecordId, kind: RecordKind, data: &str) -> InventoryResult<Record> {
    Ok(Record {
        id,
        kind,
        data: serde_json::from_str(data)?,
    })
}

impl SqliteInventory {
    /// Opens (or creates) an inventory database at the given path.
    pub fn open(path: impl AsRef<Path>) -> InventoryResult<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Opens an in-memory inventory database.
    pub fn open_in_memory() -> InventoryResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> InventoryResult<Self> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS records (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                kind TEXT NOT NULL,
                data TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_records_kind ON records(kind);
            ",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> InventoryResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| InventoryError::LockPoisoned)
    }
}

impl InventoryBackend for SqliteInventory {
    fn get(&self, kind: RecordKind, id: RecordId) -> InventoryResult<Record> {
        let conn = self.lock()?;
        ConnReader(&conn).read(kind, id)?.ok_or(InventoryError::NotFound {
            kind,
            detail: id.to_string(),
        })
    }

    fn find(&self, kind: RecordKind, filter: &Filter) -> InventoryResult<Vec<Record>> {
        let conn = self.lock()?;
        let mut records = ConnReader(&conn).scan(kind)?;
        records.retain(|r| filter.matches(&r.data));
        Ok(records)
    }

    fn create(&self, kind: RecordKind, data: Value) -> InventoryResult<Record> {
        let conn = self.lock()?;
        constraints::validate(kind, &data, None, &ConnReader(&conn))?;
        let record = Record {
            id: RecordId::new(),
            kind,
            data,
        };
        conn.execute(
            "INSERT INTO records (id, kind, data) VALUES (?1, ?2, ?3)",
            params![
                record.id.to_string(),
                kind.as_str(),
                serde_json::to_string(&record.data)?
            ],
        )?;
        debug!("inventory: created {kind} {}", record.id);
        Ok(record)
    }

    fn update(&self, kind: RecordKind, id: RecordId, changes: Value) -> InventoryResult<Record> {
        let Value::Object(changes) = changes else {
            return Err(InventoryError::NotAnObject(kind));
        };
        let conn = self.lock()?;
        let reader = ConnReader(&conn);
        let mut record = reader.read(kind, id)?.ok_or(InventoryError::NotFound {
            kind,
            detail: id.to_string(),
        })?;
        if let Value::Object(map) = &mut record.data {
            constraints::merge(map, &changes);
        }
        constraints::validate(kind, &record.data, Some(id), &reader)?;
        conn.execute(
            "UPDATE records SET data = ?1 WHERE id = ?2",
            params![serde_json::to_string(&record.data)?, id.to_string()],
        )?;
        debug!("inventory: updated {kind} {id}");
        Ok(record)
    }

    fn delete(&self, kind: RecordKind, id: RecordId) -> InventoryResult<()> {
        let conn = self.lock()?;
        let reader = ConnReader(&conn);
        if reader.read(kind, id)?.is_none() {
            return Err(InventoryError::NotFound {
                kind,
                detail: id.to_string(),
            });
        }
        let needle = Value::String(id.to_string());
        for other in RecordKind::ALL {
            let fields: Vec<&str> = constraints::references(other)
                .iter()
                .filter(|(_, target)| *target == kind)
                .map(|(field, _)| *field)
                .collect();
            if fields.is_empty() {
                continue;
            }
            let used = reader
                .scan(other)?
                .iter()
                .any(|r| fields.iter().any(|f| r.data.get(*f) == Some(&needle)));
            if used {
                return Err(InventoryError::InUse {
                    kind,
                    id: id.to_string(),
                    by: other,
                });
            }
        }
        conn.execute("DELETE FROM records WHERE id = ?1", params![id.to_string()])?;
        debug!("inventory: deleted {kind} {id}");
        Ok(())
    }

    fn count(&self, kind: RecordKind) -> InventoryResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE kind = ?1",
            params![kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
