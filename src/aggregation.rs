// ==========================================
// Apparel Season Reconciliation - Aggregation Service
// ==========================================
// Read-side summaries over the stored tables. Grouped sums are pushed
// down to the store's rollup entry points (one request each) instead of
// paging the whole table through the 1000-row generic read path and
// reducing client-side. Full-table fetches page until a short page.
// ==========================================

use crate::domain::types::Table;
use crate::repository::error::RepositoryResult;
use crate::repository::table_store::{
    InventoryRollup, SalesRollup, TableRow, TableStore, PAGE_CEILING,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Page size for the dedicated sales read path. The generic ceiling does
/// not apply there, so larger pages keep the request count low.
pub const SALES_PAGE_SIZE: usize = 10_000;

pub struct AggregationService<S: TableStore> {
    store: Arc<S>,
}

impl<S: TableStore> AggregationService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Inventory summary: totals plus per-type/warehouse/period sums,
    /// computed store-side in a single request.
    pub async fn inventory_summary(&self) -> RepositoryResult<InventoryRollup> {
        let rollup = self.store.inventory_rollup().await?;
        info!(
            rows = rollup.total_count,
            qty = rollup.total_qty,
            "inventory rollup complete"
        );
        Ok(rollup)
    }

    /// Sales summary: season x channel/category/gender/customer sums,
    /// computed store-side in a single request.
    pub async fn sales_summary(&self) -> RepositoryResult<SalesRollup> {
        self.store.sales_rollup().await
    }

    /// Fetch every row of a table through the generic read path,
    /// repeating ceiling-sized reads until a short page.
    pub async fn fetch_table(&self, table: Table) -> RepositoryResult<Vec<TableRow>> {
        let mut rows = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.store.read_page(table, offset, PAGE_CEILING).await?;
            let page_len = page.len();
            rows.extend(page);
            debug!(table = %table, offset, page_len, "fetched page");
            if page_len < PAGE_CEILING {
                break;
            }
            offset += page_len;
        }
        Ok(rows)
    }

    /// Fetch every sales row via the dedicated uncapped read path.
    pub async fn fetch_sales(&self) -> RepositoryResult<Vec<TableRow>> {
        let mut rows = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.store.sales_page(offset, SALES_PAGE_SIZE).await?;
            let page_len = page.len();
            rows.extend(page);
            if page_len < SALES_PAGE_SIZE {
                break;
            }
            offset += page_len;
        }
        Ok(rows)
    }
}
