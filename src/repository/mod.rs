// ==========================================
// Apparel Season Reconciliation - Repository Layer
// ==========================================
// Data access only, no business rules. All queries parameterized.
// ==========================================

pub mod error;
pub mod import_log_repo;
pub mod season_repo;
pub mod sqlite_store;
pub mod table_store;

pub use error::{RepositoryError, RepositoryResult};
pub use import_log_repo::ImportLogRepository;
pub use season_repo::SeasonRepository;
pub use sqlite_store::SqliteTableStore;
pub use table_store::{
    InventoryGroupSum, InventoryRollup, SalesGroupSum, SalesRollup, TableRow, TableStore,
    PAGE_CEILING,
};
