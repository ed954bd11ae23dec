// ==========================================
// Apparel Season Reconciliation - Admin API
// ==========================================
// Destructive and overview operations: full reset behind a confirmation
// token, season metadata maintenance, and the seasons overview that
// reconciles metadata with live row counts.
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::records::SeasonMeta;
use crate::domain::types::Table;
use crate::repository::{
    ImportLogRepository, SeasonRepository, SqliteTableStore, TableStore,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Token the caller must echo back before a full reset runs.
pub const RESET_CONFIRM_TOKEN: &str = "RESET-ALL-DATA";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    /// Deleted row count per canonical table.
    pub deleted: BTreeMap<String, usize>,
    pub import_log_deleted: usize,
    pub season_meta_deleted: usize,
    pub message: String,
}

/// Season metadata merged with live per-table counts. Metadata can drift
/// from the data; the counts here are always live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonOverview {
    pub code: String,
    pub display_name: String,
    pub status: String,
    pub notes: String,
    pub product_count: usize,
    pub cost_count: usize,
    pub pricing_count: usize,
    pub sales_count: usize,
}

pub struct AdminApi<S: TableStore> {
    store: Arc<S>,
    import_log: ImportLogRepository,
    season_repo: SeasonRepository,
}

impl AdminApi<SqliteTableStore> {
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let store = Arc::new(SqliteTableStore::new(db_path)?);
        let conn = store.connection();
        let import_log = ImportLogRepository::from_connection(Arc::clone(&conn))?;
        let season_repo = SeasonRepository::from_connection(conn)?;
        Ok(Self {
            store,
            import_log,
            season_repo,
        })
    }
}

impl<S: TableStore> AdminApi<S> {
    pub fn with_store(
        store: Arc<S>,
        import_log: ImportLogRepository,
        season_repo: SeasonRepository,
    ) -> Self {
        Self {
            store,
            import_log,
            season_repo,
        }
    }

    /// Delete everything: all canonical tables, the import log and the
    /// season metadata. Refuses to run unless the caller passes the
    /// exact confirmation token.
    pub async fn reset(&self, confirm: &str) -> ApiResult<ResetResponse> {
        if confirm != RESET_CONFIRM_TOKEN {
            warn!("reset rejected: bad confirmation token");
            return Err(ApiError::ConfirmationRequired(format!(
                "pass \"{}\" to confirm a full reset",
                RESET_CONFIRM_TOKEN
            )));
        }

        let mut deleted = BTreeMap::new();
        for table in Table::all() {
            let count = self.store.delete_all(table).await?;
            deleted.insert(table.name().to_string(), count);
        }
        let import_log_deleted = self.import_log.delete_all()?;
        let season_meta_deleted = self.season_repo.delete_all()?;

        let total: usize = deleted.values().sum();
        info!(total, import_log_deleted, season_meta_deleted, "full reset complete");

        Ok(ResetResponse {
            deleted,
            import_log_deleted,
            season_meta_deleted,
            message: format!("all data deleted ({} table rows)", total),
        })
    }

    /// Create or update season metadata.
    pub fn upsert_season(&self, meta: &SeasonMeta) -> ApiResult<()> {
        if meta.code.trim().is_empty() {
            return Err(ApiError::InvalidInput("season code is required".to_string()));
        }
        self.season_repo.upsert(meta)?;
        Ok(())
    }

    /// All known seasons with live per-table counts. Seasons that exist
    /// only in the data (no metadata row) still appear, with empty
    /// metadata fields.
    pub async fn seasons(&self) -> ApiResult<Vec<SeasonOverview>> {
        let metas = self.season_repo.list()?;
        let mut by_code: BTreeMap<String, SeasonMeta> =
            metas.into_iter().map(|m| (m.code.clone(), m)).collect();

        // Seasons present in the data but missing metadata.
        let data_seasons = self.distinct_data_seasons().await?;
        for code in data_seasons {
            by_code.entry(code.clone()).or_insert_with(|| SeasonMeta {
                code,
                ..SeasonMeta::default()
            });
        }

        let mut overviews = Vec::with_capacity(by_code.len());
        for (code, meta) in by_code {
            overviews.push(SeasonOverview {
                product_count: self.store.count_rows(Table::Products, Some(&code)).await?,
                cost_count: self.store.count_rows(Table::Costs, Some(&code)).await?,
                pricing_count: self.store.count_rows(Table::Pricing, Some(&code)).await?,
                sales_count: self.store.count_rows(Table::Sales, Some(&code)).await?,
                code,
                display_name: meta.display_name,
                status: meta.status,
                notes: meta.notes,
            });
        }
        Ok(overviews)
    }

    /// Distinct season codes found across the season-bearing tables,
    /// paged through the generic read path.
    async fn distinct_data_seasons(&self) -> ApiResult<Vec<String>> {
        use crate::repository::PAGE_CEILING;
        let mut seasons = std::collections::BTreeSet::new();
        for table in [Table::Products, Table::Pricing, Table::Sales] {
            let mut offset = 0;
            loop {
                let page = self.store.read_page(table, offset, PAGE_CEILING).await?;
                let page_len = page.len();
                for row in page {
                    if let Some(season) = row.season {
                        seasons.insert(season);
                    }
                }
                if page_len < PAGE_CEILING {
                    break;
                }
                offset += page_len;
            }
        }
        Ok(seasons.into_iter().collect())
    }
}
