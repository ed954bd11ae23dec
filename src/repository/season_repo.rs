// ==========================================
// Apparel Season Reconciliation - Season Metadata Repository
// ==========================================
// Season metadata (display name, lifecycle status, notes) lives apart
// from the canonical tables and can drift from actual row counts; the
// seasons overview reconciles the two.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::records::SeasonMeta;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct SeasonRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SeasonRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.init_schema()?;
        Ok(repo)
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.init_schema()?;
        Ok(repo)
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn init_schema(&self) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS season_meta (
                code TEXT PRIMARY KEY,
                display_name TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'active',
                notes TEXT NOT NULL DEFAULT ''
            );",
        )?;
        Ok(())
    }

    pub fn upsert(&self, meta: &SeasonMeta) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO season_meta (code, display_name, status, notes)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(code) DO UPDATE SET
                display_name = excluded.display_name,
                status = excluded.status,
                notes = excluded.notes",
            params![meta.code, meta.display_name, meta.status, meta.notes],
        )?;
        Ok(())
    }

    pub fn get(&self, code: &str) -> RepositoryResult<Option<SeasonMeta>> {
        let conn = self.lock()?;
        let result = conn.query_row(
            "SELECT code, display_name, status, notes FROM season_meta WHERE code = ?1",
            params![code],
            |row| {
                Ok(SeasonMeta {
                    code: row.get(0)?,
                    display_name: row.get(1)?,
                    status: row.get(2)?,
                    notes: row.get(3)?,
                })
            },
        );
        match result {
            Ok(meta) => Ok(Some(meta)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list(&self) -> RepositoryResult<Vec<SeasonMeta>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT code, display_name, status, notes FROM season_meta ORDER BY code")?;
        let seasons = stmt
            .query_map([], |row| {
                Ok(SeasonMeta {
                    code: row.get(0)?,
                    display_name: row.get(1)?,
                    status: row.get(2)?,
                    notes: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(seasons)
    }

    pub fn delete_all(&self) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM season_meta", [])?;
        Ok(deleted)
    }
}
