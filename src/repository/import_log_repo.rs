// ==========================================
// Apparel Season Reconciliation - Import Log Repository
// ==========================================
// Append-only audit log: one row per successful live import run.
// Safe for concurrent writers; never updated or deleted by the import
// path (reset wipes it along with everything else).
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::records::ImportLogEntry;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct ImportLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ImportLogRepository {
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
            "CREATE TABLE IF NOT EXISTS import_log (
                id TEXT PRIMARY KEY,
                file_name TEXT NOT NULL,
                file_type TEXT NOT NULL,
                season TEXT,
                record_count INTEGER NOT NULL,
                imported_at TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    pub fn append(&self, entry: &ImportLogEntry) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO import_log (id, file_name, file_type, season, record_count, imported_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.id,
                entry.file_name,
                entry.file_type,
                entry.season,
                entry.record_count as i64,
                entry.imported_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Most recent runs first.
    pub fn list_recent(&self, limit: usize) -> RepositoryResult<Vec<ImportLogEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, file_name, file_type, season, record_count, imported_at
             FROM import_log ORDER BY imported_at DESC LIMIT ?1",
        )?;
        let entries = stmt
            .query_map(params![limit as i64], |row| {
                let imported_at: String = row.get(5)?;
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, i64>(4)?,
                    imported_at,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        entries
            .into_iter()
            .map(|(id, file_name, file_type, season, record_count, imported_at)| {
                let imported_at = chrono::DateTime::parse_from_rfc3339(&imported_at)
                    .map_err(|e| RepositoryError::SerializationError(e.to_string()))?
                    .with_timezone(&chrono::Utc);
                Ok(ImportLogEntry {
                    id,
                    file_name,
                    file_type,
                    season,
                    record_count: record_count as usize,
                    imported_at,
                })
            })
            .collect()
    }

    pub fn delete_all(&self) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM import_log", [])?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::NamedTempFile;

    #[test]
    fn test_append_and_list() {
        let file = NamedTempFile::new().unwrap();
        let repo = ImportLogRepository::new(file.path().to_str().unwrap()).unwrap();

        let entry = ImportLogEntry {
            id: "run-1".to_string(),
            file_name: "line_list_26FA.xlsx".to_string(),
            file_type: "line_list".to_string(),
            season: Some("26FA".to_string()),
            record_count: 412,
            imported_at: Utc::now(),
        };
        repo.append(&entry).unwrap();

        let recent = repo.list_recent(10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].file_name, "line_list_26FA.xlsx");
        assert_eq!(recent[0].record_count, 412);
    }
}
