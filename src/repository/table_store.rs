// ==========================================
// Apparel Season Reconciliation - Table Store Contract
// ==========================================
// The backing store is treated as a generic keyed table store: paginated
// range reads, batched insert with optional duplicate-skip, delete by
// filter, plus two server-side rollup entry points and one dedicated
// paginated-sales entry point.
//
// The generic read path caps any single request at PAGE_CEILING rows;
// consumers page with repeated reads until a short page signals
// end-of-data. The sales table defeats that cap's economics at 300K+
// rows, hence its dedicated entry points.
// ==========================================

use crate::domain::types::Table;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Row ceiling for any single generic read request.
pub const PAGE_CEILING: usize = 1000;

// ==========================================
// TableRow - generic stored row
// ==========================================
/// Key is present for keyed tables (products/costs/pricing/inventory),
/// absent for sales lines. Season drives season-scoped replace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRow {
    pub key: Option<String>,
    pub season: Option<String>,
    pub payload: Value,
}

impl TableRow {
    pub fn new(key: Option<String>, season: Option<String>, payload: Value) -> Self {
        Self {
            key,
            season,
            payload,
        }
    }
}

// ==========================================
// Rollup results
// ==========================================

/// One grouped sum bucket of the inventory rollup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryGroupSum {
    pub group: String,
    pub count: u64,
    pub qty: f64,
    pub extension: f64,
}

/// Inventory aggregations returned as a single structured result,
/// replacing hundreds of paginated requests plus client-side reduction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryRollup {
    pub total_count: u64,
    pub total_qty: f64,
    pub total_extension: f64,
    pub by_type: Vec<InventoryGroupSum>,
    pub by_warehouse: Vec<InventoryGroupSum>,
    pub by_period: Vec<InventoryGroupSum>,
}

/// One season x group bucket of the sales rollup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalesGroupSum {
    pub season: String,
    pub group: String,
    pub revenue: f64,
    pub units_booked: f64,
}

/// Sales aggregations grouped by season x channel/category/gender/customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalesRollup {
    pub by_channel: Vec<SalesGroupSum>,
    pub by_category: Vec<SalesGroupSum>,
    pub by_gender: Vec<SalesGroupSum>,
    pub by_customer: Vec<SalesGroupSum>,
}

// ==========================================
// TableStore Trait
// ==========================================
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Batched insert, one atomic write per call. With `skip_duplicates`
    /// set, rows whose key already exists are silently skipped (insert
    /// new, ignore pre-existing key, no upsert-with-overwrite).
    /// Returns the number of rows actually inserted.
    async fn insert_rows(
        &self,
        table: Table,
        rows: &[TableRow],
        skip_duplicates: bool,
    ) -> RepositoryResult<usize>;

    /// Delete every row of the table. Returns the deleted count.
    async fn delete_all(&self, table: Table) -> RepositoryResult<usize>;

    /// Delete rows matching any of the given seasons. Returns the
    /// deleted count.
    async fn delete_seasons(&self, table: Table, seasons: &[String]) -> RepositoryResult<usize>;

    /// Generic paginated range read. The effective limit is capped at
    /// PAGE_CEILING regardless of what the caller asks for.
    async fn read_page(
        &self,
        table: Table,
        offset: usize,
        limit: usize,
    ) -> RepositoryResult<Vec<TableRow>>;

    /// Live row count, optionally filtered to one season.
    async fn count_rows(&self, table: Table, season: Option<&str>) -> RepositoryResult<usize>;

    /// Server-side inventory rollup (single request).
    async fn inventory_rollup(&self) -> RepositoryResult<InventoryRollup>;

    /// Server-side sales rollup (single request).
    async fn sales_rollup(&self) -> RepositoryResult<SalesRollup>;

    /// Dedicated paginated read for the sales table; not subject to the
    /// generic PAGE_CEILING.
    async fn sales_page(&self, offset: usize, limit: usize) -> RepositoryResult<Vec<TableRow>>;
}
