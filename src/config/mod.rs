// ==========================================
// Apparel Season Reconciliation - Configuration Manager
// ==========================================
// Responsibilities: import tuning knobs (chunk sizes, retry/backoff)
// Storage: config_kv table (key-value, scope_id='global')
// Missing or malformed values fall back to the built-in defaults.
// ==========================================

use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::domain::types::Table;
use crate::persister::RetryPolicy;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ==========================================
// Configuration key constants
// ==========================================
pub mod config_keys {
    // Chunk sizes, one per table
    pub const CHUNK_SIZE_PRODUCTS: &str = "chunk_size_products";
    pub const CHUNK_SIZE_COSTS: &str = "chunk_size_costs";
    pub const CHUNK_SIZE_PRICING: &str = "chunk_size_pricing";
    pub const CHUNK_SIZE_SALES: &str = "chunk_size_sales";
    pub const CHUNK_SIZE_INVENTORY: &str = "chunk_size_inventory";

    // Retry / backoff
    pub const RETRY_MAX_ATTEMPTS: &str = "retry_max_attempts";
    pub const BACKOFF_BASE_SECS: &str = "backoff_base_secs";
    pub const BACKOFF_CAP_SECS: &str = "backoff_cap_secs";
    pub const INTER_CHUNK_DELAY_MS: &str = "inter_chunk_delay_ms";
}

// ==========================================
// ImportConfig - resolved tuning values
// ==========================================
/// Snapshot of the import tuning knobs, resolved once per run.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub chunk_size_products: usize,
    pub chunk_size_costs: usize,
    pub chunk_size_pricing: usize,
    pub chunk_size_sales: usize,
    pub chunk_size_inventory: usize,
    pub retry_max_attempts: u32,
    pub backoff_base_secs: u64,
    pub backoff_cap_secs: u64,
    pub inter_chunk_delay_ms: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            chunk_size_products: 500,
            chunk_size_costs: 1000,
            chunk_size_pricing: 1000,
            chunk_size_sales: 5000,
            chunk_size_inventory: 2000,
            retry_max_attempts: 5,
            backoff_base_secs: 5,
            backoff_cap_secs: 30,
            inter_chunk_delay_ms: 200,
        }
    }
}

impl ImportConfig {
    pub fn chunk_size(&self, table: Table) -> usize {
        match table {
            Table::Products => self.chunk_size_products,
            Table::Costs => self.chunk_size_costs,
            Table::Pricing => self.chunk_size_pricing,
            Table::Sales => self.chunk_size_sales,
            Table::Inventory => self.chunk_size_inventory,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts,
            backoff_base: Duration::from_secs(self.backoff_base_secs),
            backoff_cap: Duration::from_secs(self.backoff_cap_secs),
            inter_chunk_delay: Duration::from_millis(self.inter_chunk_delay_ms),
        }
    }
}

// ==========================================
// ConfigManager
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        let manager = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        manager.init_schema()?;
        Ok(manager)
    }

    /// Reuse an existing connection. PRAGMAs are re-applied (idempotent)
    /// so behavior does not depend on who opened the connection.
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
        }
        let manager = Self { conn };
        manager.init_schema()?;
        Ok(manager)
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn init_schema(&self) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS config_kv (
                scope_id TEXT NOT NULL DEFAULT 'global',
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (scope_id, key)
            );",
        )?;
        Ok(())
    }

    fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.lock()?;
        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_usize(&self, key: &str, default: usize) -> RepositoryResult<usize> {
        Ok(self
            .get_config_value(key)?
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(default))
    }

    fn get_u64(&self, key: &str, default: u64) -> RepositoryResult<u64> {
        Ok(self
            .get_config_value(key)?
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(default))
    }

    /// Resolve the full import configuration, applying defaults for
    /// anything not overridden in config_kv.
    pub fn import_config(&self) -> RepositoryResult<ImportConfig> {
        let defaults = ImportConfig::default();
        Ok(ImportConfig {
            chunk_size_products: self
                .get_usize(config_keys::CHUNK_SIZE_PRODUCTS, defaults.chunk_size_products)?,
            chunk_size_costs: self
                .get_usize(config_keys::CHUNK_SIZE_COSTS, defaults.chunk_size_costs)?,
            chunk_size_pricing: self
                .get_usize(config_keys::CHUNK_SIZE_PRICING, defaults.chunk_size_pricing)?,
            chunk_size_sales: self
                .get_usize(config_keys::CHUNK_SIZE_SALES, defaults.chunk_size_sales)?,
            chunk_size_inventory: self.get_usize(
                config_keys::CHUNK_SIZE_INVENTORY,
                defaults.chunk_size_inventory,
            )?,
            retry_max_attempts: self
                .get_u64(config_keys::RETRY_MAX_ATTEMPTS, defaults.retry_max_attempts as u64)?
                as u32,
            backoff_base_secs: self
                .get_u64(config_keys::BACKOFF_BASE_SECS, defaults.backoff_base_secs)?,
            backoff_cap_secs: self
                .get_u64(config_keys::BACKOFF_CAP_SECS, defaults.backoff_cap_secs)?,
            inter_chunk_delay_ms: self
                .get_u64(config_keys::INTER_CHUNK_DELAY_MS, defaults.inter_chunk_delay_ms)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_when_table_empty() {
        let file = NamedTempFile::new().unwrap();
        let manager = ConfigManager::new(file.path().to_str().unwrap()).unwrap();

        let config = manager.import_config().unwrap();
        assert_eq!(config.chunk_size(Table::Products), 500);
        assert_eq!(config.chunk_size(Table::Sales), 5000);
        assert_eq!(config.retry_max_attempts, 5);
        assert_eq!(config.retry_policy().backoff_cap, Duration::from_secs(30));
    }

    #[test]
    fn test_override_and_malformed_value() {
        let file = NamedTempFile::new().unwrap();
        let manager = ConfigManager::new(file.path().to_str().unwrap()).unwrap();

        manager
            .set_config_value(config_keys::CHUNK_SIZE_SALES, "2500")
            .unwrap();
        // Malformed override falls back to the default.
        manager
            .set_config_value(config_keys::RETRY_MAX_ATTEMPTS, "lots")
            .unwrap();
        // Zero chunk size is rejected.
        manager
            .set_config_value(config_keys::CHUNK_SIZE_PRODUCTS, "0")
            .unwrap();

        let config = manager.import_config().unwrap();
        assert_eq!(config.chunk_size(Table::Sales), 2500);
        assert_eq!(config.retry_max_attempts, 5);
        assert_eq!(config.chunk_size(Table::Products), 500);
    }
}
