//! SQLite store implementation.
//!
//! Override keys are matched structurally with the SQL `IS` operator, never
//! through NULL-in-primary-key comparison semantics.

use async_trait::async_trait;
use flagstone_core::{CustomerId, FlagError, FlagResult, FlagScope, FlagStore, UserId};
use log::debug;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS customers (
    customer_id INTEGER PRIMARY KEY
);
CREATE TABLE IF NOT EXISTS features (
    feature_name TEXT PRIMARY KEY,
    is_enabled INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS overrides (
    feature_name TEXT NOT NULL,
    customer_id INTEGER,
    user_id INTEGER,
    is_enabled INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_overrides_feature ON overrides(feature_name);
CREATE INDEX IF NOT EXISTS idx_overrides_customer ON overrides(customer_id);
CREATE INDEX IF NOT EXISTS idx_overrides_user ON overrides(user_id);
";

fn storage(e: rusqlite::Error) -> FlagError {
    FlagError::Storage(e.to_string())
}

fn scope_parts(scope: &FlagScope) -> (Option<CustomerId>, Option<UserId>) {
    (scope.customer_id(), scope.user_id())
}

/// SQLite flag store
#[derive(Debug)]
pub struct SqliteFlagStore {
    conn: Mutex<Connection>,
}

impl SqliteFlagStore {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> FlagResult<Self> {
        debug!("opening flag database at {}", path.as_ref().display());
        Self::with_connection(Connection::open(path).map_err(storage)?)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> FlagResult<Self> {
        Self::with_connection(Connection::open_in_memory().map_err(storage)?)
    }

    fn with_connection(conn: Connection) -> FlagResult<Self> {
        conn.execute_batch(SCHEMA).map_err(storage)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl FlagStore for SqliteFlagStore {
    async fn insert_customer(&self, customer_id: CustomerId) -> FlagResult<()> {
        self.conn
            .lock()
            .execute(
                "INSERT OR IGNORE INTO customers (customer_id) VALUES (?1)",
                params![customer_id],
            )
            .map_err(storage)?;
        Ok(())
    }

    async fn delete_customer(&self, customer_id: CustomerId) -> FlagResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(storage)?;
        tx.execute(
            "DELETE FROM overrides WHERE customer_id = ?1",
            params![customer_id],
        )
        .map_err(storage)?;
        tx.execute(
            "DELETE FROM customers WHERE customer_id = ?1",
            params![customer_id],
        )
        .map_err(storage)?;
        tx.commit().map_err(storage)
    }

    async fn delete_user(&self, user_id: UserId) -> FlagResult<()> {
        self.conn
            .lock()
            .execute("DELETE FROM overrides WHERE user_id = ?1", params![user_id])
            .map_err(storage)?;
        Ok(())
    }

    async fn customers(&self) -> FlagResult<BTreeSet<CustomerId>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT customer_id FROM customers")
            .map_err(storage)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, CustomerId>(0))
            .map_err(storage)?;
        let mut out = BTreeSet::new();
        for row in rows {
            out.insert(row.map_err(storage)?);
        }
        Ok(out)
    }

    async fn upsert_feature(&self, name: &str, enabled: bool) -> FlagResult<()> {
        self.conn
            .lock()
            .execute(
                "INSERT INTO features (feature_name, is_enabled) VALUES (?1, ?2)
                 ON CONFLICT(feature_name) DO UPDATE SET is_enabled = excluded.is_enabled",
                params![name, enabled],
            )
            .map_err(storage)?;
        Ok(())
    }

    async fn feature_default(&self, name: &str) -> FlagResult<Option<bool>> {
        self.conn
            .lock()
            .query_row(
                "SELECT is_enabled FROM features WHERE feature_name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(storage)
    }

    async fn delete_feature(&self, name: &str) -> FlagResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(storage)?;
        tx.execute(
            "DELETE FROM overrides WHERE feature_name = ?1",
            params![name],
        )
        .map_err(storage)?;
        tx.execute(
            "DELETE FROM features WHERE feature_name = ?1",
            params![name],
        )
        .map_err(storage)?;
        tx.commit().map_err(storage)
    }

    async fn rename_feature(&self, old: &str, new: &str) -> FlagResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(storage)?;

        let old_exists = tx
            .query_row(
                "SELECT 1 FROM features WHERE feature_name = ?1",
                params![old],
                |_| Ok(()),
            )
            .optional()
            .map_err(storage)?
            .is_some();
        if !old_exists {
            return Err(FlagError::NotFound(old.to_string()));
        }
        let new_exists = tx
            .query_row(
                "SELECT 1 FROM features WHERE feature_name = ?1",
                params![new],
                |_| Ok(()),
            )
            .optional()
            .map_err(storage)?
            .is_some();
        if new_exists {
            return Err(FlagError::Conflict(new.to_string()));
        }

        tx.execute(
            "UPDATE features SET feature_name = ?2 WHERE feature_name = ?1",
            params![old, new],
        )
        .map_err(storage)?;
        tx.execute(
            "UPDATE overrides SET feature_name = ?2 WHERE feature_name = ?1",
            params![old, new],
        )
        .map_err(storage)?;
        tx.commit().map_err(storage)
    }

    async fn features(&self) -> FlagResult<BTreeMap<String, bool>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT feature_name, is_enabled FROM features")
            .map_err(storage)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?)))
            .map_err(storage)?;
        let mut out = BTreeMap::new();
        for row in rows {
            let (name, enabled) = row.map_err(storage)?;
            out.insert(name, enabled);
        }
        Ok(out)
    }

    async fn upsert_override(
        &self,
        feature: &str,
        scope: &FlagScope,
        enabled: bool,
    ) -> FlagResult<()> {
        let (customer_id, user_id) = scope_parts(scope);
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(storage)?;
        tx.execute(
            "DELETE FROM overrides
             WHERE feature_name = ?1 AND customer_id IS ?2 AND user_id IS ?3",
            params![feature, customer_id, user_id],
        )
        .map_err(storage)?;
        tx.execute(
            "INSERT INTO overrides (feature_name, customer_id, user_id, is_enabled)
             VALUES (?1, ?2, ?3, ?4)",
            params![feature, customer_id, user_id, enabled],
        )
        .map_err(storage)?;
        tx.commit().map_err(storage)
    }

    async fn delete_override(&self, feature: &str, scope: &FlagScope) -> FlagResult<()> {
        let (customer_id, user_id) = scope_parts(scope);
        self.conn
            .lock()
            .execute(
                "DELETE FROM overrides
                 WHERE feature_name = ?1 AND customer_id IS ?2 AND user_id IS ?3",
                params![feature, customer_id, user_id],
            )
            .map_err(storage)?;
        Ok(())
    }

    async fn override_value(&self, feature: &str, scope: &FlagScope) -> FlagResult<Option<bool>> {
        let (customer_id, user_id) = scope_parts(scope);
        self.conn
            .lock()
            .query_row(
                "SELECT is_enabled FROM overrides
                 WHERE feature_name = ?1 AND customer_id IS ?2 AND user_id IS ?3",
                params![feature, customer_id, user_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(storage)
    }

    async fn customer_overrides(
        &self,
        feature: &str,
        enabled: bool,
    ) -> FlagResult<BTreeSet<CustomerId>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT customer_id FROM overrides
                 WHERE feature_name = ?1 AND is_enabled = ?2
                   AND customer_id IS NOT NULL AND user_id IS NULL",
            )
            .map_err(storage)?;
        let rows = stmt
            .query_map(params![feature, enabled], |row| {
                row.get::<_, CustomerId>(0)
            })
            .map_err(storage)?;
        let mut out = BTreeSet::new();
        for row in rows {
            out.insert(row.map_err(storage)?);
        }
        Ok(out)
    }

    async fn feature_overrides_for_customer(
        &self,
        customer_id: CustomerId,
        enabled: bool,
    ) -> FlagResult<BTreeSet<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT feature_name FROM overrides
                 WHERE customer_id = ?1 AND is_enabled = ?2",
            )
            .map_err(storage)?;
        let rows = stmt
            .query_map(params![customer_id, enabled], |row| {
                row.get::<_, String>(0)
            })
            .map_err(storage)?;
        let mut out = BTreeSet::new();
        for row in rows {
            out.insert(row.map_err(storage)?);
        }
        Ok(out)
    }
}
