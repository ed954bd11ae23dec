// ==========================================
// Apparel Season Reconciliation - SQLite Table Store
// ==========================================
// Production TableStore implementation over SQLite. Each canonical table
// is a generic keyed table: key / season columns for filtering plus the
// full record as a JSON payload. Rollups run as single GROUP BY queries
// over json_extract, which is what keeps dashboards from paying a raw
// scan per view.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::Table;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::table_store::{
    InventoryGroupSum, InventoryRollup, SalesGroupSum, SalesRollup, TableRow, TableStore,
    PAGE_CEILING,
};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::debug;

pub struct SqliteTableStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTableStore {
    /// Open (or create) the store at the given database path.
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Share an already-open connection (tests, CLI wiring).
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn init_schema(&self) -> RepositoryResult<()> {
        let conn = self.lock()?;
        for table in Table::all() {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {t} (
                    row_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    key TEXT,
                    season TEXT,
                    payload TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_{t}_season ON {t}(season);",
                t = table.name()
            ))?;
            if table.keyed() {
                conn.execute_batch(&format!(
                    "CREATE UNIQUE INDEX IF NOT EXISTS idx_{t}_key ON {t}(key);",
                    t = table.name()
                ))?;
            }
        }
        Ok(())
    }

    fn row_from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Option<String>, Option<String>, String)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?))
    }
}

#[async_trait]
impl TableStore for SqliteTableStore {
    async fn insert_rows(
        &self,
        table: Table,
        rows: &[TableRow],
        skip_duplicates: bool,
    ) -> RepositoryResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let sql = if skip_duplicates {
            format!(
                "INSERT OR IGNORE INTO {} (key, season, payload) VALUES (?1, ?2, ?3)",
                table.name()
            )
        } else {
            format!(
                "INSERT INTO {} (key, season, payload) VALUES (?1, ?2, ?3)",
                table.name()
            )
        };

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in rows {
                let payload = serde_json::to_string(&row.payload)?;
                inserted += stmt.execute(params![row.key, row.season, payload])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        debug!(table = %table, rows = rows.len(), inserted, "chunk inserted");
        Ok(inserted)
    }

    async fn delete_all(&self, table: Table) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute(&format!("DELETE FROM {}", table.name()), [])?;
        Ok(deleted)
    }

    async fn delete_seasons(&self, table: Table, seasons: &[String]) -> RepositoryResult<usize> {
        if seasons.is_empty() {
            return Ok(0);
        }
        let conn = self.lock()?;
        let mut deleted = 0;
        let sql = format!("DELETE FROM {} WHERE season = ?1", table.name());
        for season in seasons {
            deleted += conn.execute(&sql, params![season])?;
        }
        Ok(deleted)
    }

    async fn read_page(
        &self,
        table: Table,
        offset: usize,
        limit: usize,
    ) -> RepositoryResult<Vec<TableRow>> {
        let effective = limit.min(PAGE_CEILING);
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT key, season, payload FROM {} ORDER BY row_id LIMIT ?1 OFFSET ?2",
            table.name()
        ))?;
        let rows = stmt
            .query_map(params![effective as i64, offset as i64], Self::row_from_sql)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(key, season, payload)| {
                Ok(TableRow {
                    key,
                    season,
                    payload: serde_json::from_str(&payload)?,
                })
            })
            .collect()
    }

    async fn count_rows(&self, table: Table, season: Option<&str>) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let count: i64 = match season {
            Some(season) => conn.query_row(
                &format!("SELECT COUNT(*) FROM {} WHERE season = ?1", table.name()),
                params![season],
                |row| row.get(0),
            )?,
            None => conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", table.name()),
                [],
                |row| row.get(0),
            )?,
        };
        Ok(count as usize)
    }

    async fn inventory_rollup(&self) -> RepositoryResult<InventoryRollup> {
        let conn = self.lock()?;

        let (total_count, total_qty, total_extension): (i64, f64, f64) = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CAST(json_extract(payload, '$.qty') AS REAL)), 0),
                    COALESCE(SUM(CAST(json_extract(payload, '$.extension') AS REAL)), 0)
             FROM inventory",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let group_by = |field: &str| -> RepositoryResult<Vec<InventoryGroupSum>> {
            let mut stmt = conn.prepare(&format!(
                "SELECT COALESCE(json_extract(payload, '$.{f}'), ''),
                        COUNT(*),
                        COALESCE(SUM(CAST(json_extract(payload, '$.qty') AS REAL)), 0),
                        COALESCE(SUM(CAST(json_extract(payload, '$.extension') AS REAL)), 0)
                 FROM inventory
                 GROUP BY 1
                 ORDER BY 1",
                f = field
            ))?;
            let groups = stmt
                .query_map([], |row| {
                    Ok(InventoryGroupSum {
                        group: row.get(0)?,
                        count: row.get::<_, i64>(1)? as u64,
                        qty: row.get(2)?,
                        extension: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(groups)
        };

        Ok(InventoryRollup {
            total_count: total_count as u64,
            total_qty,
            total_extension,
            by_type: group_by("item_type")?,
            by_warehouse: group_by("warehouse")?,
            by_period: group_by("period")?,
        })
    }

    async fn sales_rollup(&self) -> RepositoryResult<SalesRollup> {
        let conn = self.lock()?;

        let group_by = |field: &str| -> RepositoryResult<Vec<SalesGroupSum>> {
            let mut stmt = conn.prepare(&format!(
                "SELECT COALESCE(season, ''),
                        COALESCE(json_extract(payload, '$.{f}'), ''),
                        COALESCE(SUM(CAST(json_extract(payload, '$.revenue') AS REAL)), 0),
                        COALESCE(SUM(CAST(json_extract(payload, '$.units_booked') AS REAL)), 0)
                 FROM sales
                 GROUP BY 1, 2
                 ORDER BY 1, 2",
                f = field
            ))?;
            let groups = stmt
                .query_map([], |row| {
                    Ok(SalesGroupSum {
                        season: row.get(0)?,
                        group: row.get(1)?,
                        revenue: row.get(2)?,
                        units_booked: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(groups)
        };

        Ok(SalesRollup {
            by_channel: group_by("channel")?,
            by_category: group_by("category")?,
            by_gender: group_by("gender")?,
            by_customer: group_by("customer")?,
        })
    }

    async fn sales_page(&self, offset: usize, limit: usize) -> RepositoryResult<Vec<TableRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT key, season, payload FROM sales ORDER BY row_id LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_from_sql)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(key, season, payload)| {
                Ok(TableRow {
                    key,
                    season,
                    payload: serde_json::from_str(&payload)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::NamedTempFile;

    fn store() -> (NamedTempFile, SqliteTableStore) {
        let file = NamedTempFile::new().unwrap();
        let store = SqliteTableStore::new(file.path().to_str().unwrap()).unwrap();
        (file, store)
    }

    fn product_row(key: &str, season: &str) -> TableRow {
        TableRow::new(
            Some(key.to_string()),
            Some(season.to_string()),
            json!({"id": key, "season": season}),
        )
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let (_file, store) = store();
        let rows = vec![product_row("A_BLK_26FA", "26FA"), product_row("B_NVY_26FA", "26FA")];
        let inserted = store.insert_rows(Table::Products, &rows, true).await.unwrap();
        assert_eq!(inserted, 2);

        let page = store.read_page(Table::Products, 0, 10).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].key.as_deref(), Some("A_BLK_26FA"));
    }

    #[tokio::test]
    async fn test_duplicate_keys_skipped_when_requested() {
        let (_file, store) = store();
        let rows = vec![product_row("A_BLK_26FA", "26FA")];
        store.insert_rows(Table::Products, &rows, true).await.unwrap();
        let inserted = store.insert_rows(Table::Products, &rows, true).await.unwrap();
        assert_eq!(inserted, 0);
        assert_eq!(store.count_rows(Table::Products, None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sales_duplicates_inserted() {
        let (_file, store) = store();
        let row = TableRow::new(
            None,
            Some("26FA".to_string()),
            json!({"style_number": "A", "revenue": 100.0}),
        );
        store
            .insert_rows(Table::Sales, &[row.clone(), row], false)
            .await
            .unwrap();
        assert_eq!(store.count_rows(Table::Sales, None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_seasons_scoped() {
        let (_file, store) = store();
        let rows = vec![product_row("A_BLK_26FA", "26FA"), product_row("C_GRN_26SP", "26SP")];
        store.insert_rows(Table::Products, &rows, true).await.unwrap();

        let deleted = store
            .delete_seasons(Table::Products, &["26FA".to_string()])
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(
            store.count_rows(Table::Products, Some("26SP")).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_read_page_respects_ceiling() {
        let (_file, store) = store();
        let rows: Vec<TableRow> = (0..1100)
            .map(|i| product_row(&format!("S{i}_X_26FA"), "26FA"))
            .collect();
        store.insert_rows(Table::Products, &rows, true).await.unwrap();

        let page = store.read_page(Table::Products, 0, 5000).await.unwrap();
        assert_eq!(page.len(), PAGE_CEILING);

        // The dedicated sales entry point is not capped.
        let sales: Vec<TableRow> = (0..1100)
            .map(|i| TableRow::new(None, Some("26FA".to_string()), json!({"n": i})))
            .collect();
        store.insert_rows(Table::Sales, &sales, false).await.unwrap();
        let page = store.sales_page(0, 5000).await.unwrap();
        assert_eq!(page.len(), 1100);
    }

    #[tokio::test]
    async fn test_inventory_rollup_groups() {
        let (_file, store) = store();
        let rows = vec![
            TableRow::new(
                Some("I1".into()),
                None,
                json!({"item_type": "Tops", "warehouse": "W1", "period": "Q1", "qty": 10.0, "extension": 100.0}),
            ),
            TableRow::new(
                Some("I2".into()),
                None,
                json!({"item_type": "Tops", "warehouse": "W2", "period": "Q1", "qty": 5.0, "extension": 50.0}),
            ),
        ];
        store.insert_rows(Table::Inventory, &rows, true).await.unwrap();

        let rollup = store.inventory_rollup().await.unwrap();
        assert_eq!(rollup.total_count, 2);
        assert_eq!(rollup.total_qty, 15.0);
        let tops = rollup.by_type.iter().find(|g| g.group == "Tops").unwrap();
        assert_eq!(tops.qty, 15.0);
        assert_eq!(rollup.by_warehouse.len(), 2);
    }

    #[tokio::test]
    async fn test_sales_rollup_by_season_and_channel() {
        let (_file, store) = store();
        let mk = |season: &str, channel: &str, revenue: f64| {
            TableRow::new(
                None,
                Some(season.to_string()),
                json!({"channel": channel, "revenue": revenue, "units_booked": 1.0}),
            )
        };
        let rows = vec![
            mk("26FA", "Wholesale", 100.0),
            mk("26FA", "Wholesale", 50.0),
            mk("26SP", "Ecomm", 30.0),
        ];
        store.insert_rows(Table::Sales, &rows, false).await.unwrap();

        let rollup = store.sales_rollup().await.unwrap();
        let fa_wholesale = rollup
            .by_channel
            .iter()
            .find(|g| g.season == "26FA" && g.group == "Wholesale")
            .unwrap();
        assert_eq!(fa_wholesale.revenue, 150.0);
        assert_eq!(fa_wholesale.units_booked, 2.0);
    }
}
