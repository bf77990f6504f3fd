//! Persistent scope configuration: which building an external tenant maps to.
//!
//! Uses its own SQLite file so scope data stays separate from the
//! inventory it scopes.

use crate::{StoreError, StoreResult};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// An external tenant known to the scope store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub tenant_id: String,
    pub name: String,
}

/// A tenant-to-building mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantLink {
    pub tenant_id: String,
    pub tenant_name: String,
    pub building_name: String,
}

/// Persistent store for tenant scope mappings backed by SQLite.
#[derive(Clone)]
pub struct ScopeStore {
    conn: Arc<Mutex<Connection>>,
}

impl ScopeStore {
    /// Opens (or creates) a scope store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Opens an in-memory scope store.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS tenants (
                tenant_id TEXT PRIMARY KEY,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tenant_buildings (
                tenant_id TEXT PRIMARY KEY
                    REFERENCES tenants(tenant_id) ON DELETE CASCADE,
                building_name TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    // ── Tenants ──────────────────────────────────────────────────

    /// Inserts a tenant or renames an existing one.
    pub fn upsert_tenant(&self, tenant_id: &str, name: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO tenants (tenant_id, name) VALUES (?1, ?2)
             ON CONFLICT(tenant_id) DO UPDATE SET name = excluded.name",
            params![tenant_id, name],
        )?;
        debug!("scope: upserted tenant {tenant_id}");
        Ok(())
    }

    pub fn list_tenants(&self) -> StoreResult<Vec<Tenant>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT tenant_id, name FROM tenants ORDER BY tenant_id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Tenant {
                tenant_id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ── Building links ───────────────────────────────────────────

    /// Maps a tenant to a building, replacing any previous mapping.
    /// The tenant must already exist.
    pub fn link_building(&self, tenant_id: &str, building_name: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO tenant_buildings (tenant_id, building_name) VALUES (?1, ?2)
             ON CONFLICT(tenant_id) DO UPDATE SET building_name = excluded.building_name",
            params![tenant_id, building_name],
        )?;
        debug!("scope: linked tenant {tenant_id} to {building_name}");
        Ok(())
    }

    /// Removes a tenant's building mapping. Returns whether one existed.
    pub fn unlink(&self, tenant_id: &str) -> StoreResult<bool> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM tenant_buildings WHERE tenant_id = ?1",
            params![tenant_id],
        )?;
        Ok(removed > 0)
    }

    pub fn building_for_tenant(&self, tenant_id: &str) -> StoreResult<Option<String>> {
        let conn = self.lock()?;
        let building = conn
            .query_row(
                "SELECT building_name FROM tenant_buildings WHERE tenant_id = ?1",
                params![tenant_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(building)
    }

    pub fn list_links(&self) -> StoreResult<Vec<TenantLink>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT t.tenant_id, t.name, b.building_name
             FROM tenant_buildings b JOIN tenants t ON t.tenant_id = b.tenant_id
             ORDER BY t.tenant_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(TenantLink {
                tenant_id: row.get(0)?,
                tenant_name: row.get(1)?,
                building_name: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
