// ==========================================
// Apparel Season Reconciliation - Record Entities
// ==========================================
// Source records (one struct per spreadsheet shape), canonical output
// records produced by the reconciliation engine, and the persisted
// side-channel entities (import log, season metadata).
// No data access logic here.
// ==========================================

use crate::domain::types::{CostSource, SeasonType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// LineListItem - product master sheet row
// ==========================================
// One style+color+season record. Immutable once emitted; a later import
// for the same season supersedes it, never mutates it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineListItem {
    pub style_number: String,
    pub style_desc: String,
    pub color_code: String,
    pub color_desc: String,

    /// Season string as entered on the sheet.
    pub season_raw: String,
    /// Normalized season code (canonical or passthrough).
    pub season: String,
    pub season_type: SeasonType,

    pub factory: String,
    pub country_of_origin: String,
    pub designer: String,
    pub developer: String,

    // Per-market pricing
    pub msrp_us: f64,
    pub msrp_ca: f64,
    pub wholesale_us: f64,
    pub wholesale_ca: f64,

    // Cost snapshot carried on the line list
    pub fob_cost: f64,
    pub landed_cost: f64,
    /// Derived; recalculated on every cost/price override.
    pub margin: f64,

    // Flags
    pub carry_over: bool,
    pub top_seller: bool,
    pub smu: bool,
    pub map_protected: bool,
}

// ==========================================
// LandedCostItem - cost-request sheet row
// ==========================================
// One style+season cost request. Resubmissions produce multiple rows per
// (style, season); deduplication keeps the one with the greatest
// date_requested.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandedCostItem {
    pub style_number: String,
    pub style_desc: String,
    pub season_raw: String,
    pub season: String,

    pub fob_cost: f64,
    pub duty: f64,
    pub tariff: f64,
    pub freight: f64,
    pub overhead: f64,
    pub landed_cost: f64,

    /// Orderable recency marker used by deduplication.
    pub date_requested: Option<NaiveDate>,
}

// ==========================================
// PricingItem - price sheet row
// ==========================================
// Source of truth for wholesale/MSRP when present (strict priority chain,
// ahead of line-list figures). Persisted verbatim to the pricing table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingItem {
    pub style_number: String,
    pub color_code: String,
    pub season: String,
    pub season_desc: String,
    pub price: f64,
    pub msrp: f64,
    pub cost: f64,
}

// ==========================================
// SalesItem - order-line extract row
// ==========================================
// Read-only with respect to reconciliation; persisted verbatim and used
// as the aggregation input. Sales lines are not unique.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalesItem {
    pub style_number: String,
    pub color_desc: String,
    pub season: String,
    pub customer: String,
    pub channel: String,
    pub customer_type: String,
    pub category: String,
    pub division: String,
    pub gender: String,
    pub units_booked: f64,
    pub units_shipped: f64,
    pub revenue: f64,
}

// ==========================================
// InventoryItem - inventory movement row
// ==========================================
// Arrives pre-parsed through the import API; feeds the inventory rollup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryItem {
    pub style_number: String,
    pub description: String,
    pub item_type: String,
    pub warehouse: String,
    pub period: String,
    pub qty: f64,
    pub unit_cost: f64,
    pub extension: f64,
}

// ==========================================
// Canonical output records
// ==========================================

/// Reconciled product record, keyed by (style, color, season).
/// Product and Cost for a season are produced together, 1:1, sharing the
/// same synthetic id so the reporting layer can cross-reference them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    pub style_number: String,
    pub style_desc: String,
    pub color_code: String,
    pub color_desc: String,
    pub season: String,
    pub season_type: SeasonType,
    pub factory: String,
    pub country_of_origin: String,
    pub designer: String,
    pub developer: String,
    pub msrp: f64,
    pub msrp_ca: f64,
    pub wholesale: f64,
    pub wholesale_ca: f64,
    pub fob_cost: f64,
    pub landed_cost: f64,
    pub margin: f64,
    pub carry_over: bool,
    pub top_seller: bool,
    pub smu: bool,
    pub map_protected: bool,
    pub cost_source: CostSource,
}

/// Reconciled cost record. Cost data is modeled at style granularity but
/// emitted 1:1 with products so both sides key identically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostRecord {
    pub id: String,
    pub style_number: String,
    pub season: String,
    pub fob_cost: f64,
    pub duty: f64,
    pub tariff: f64,
    pub freight: f64,
    pub overhead: f64,
    pub landed_cost: f64,
    pub margin: f64,
    pub cost_source: CostSource,
    pub date_requested: Option<NaiveDate>,
}

/// Synthetic id shared by a product record and its cost record.
pub fn record_id(style_number: &str, color_code: &str, season: &str) -> String {
    format!("{}_{}_{}", style_number, color_code, season)
}

// ==========================================
// ReconcileStats - per-run reconciliation counters
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileStats {
    /// Line-list rows that entered reconciliation.
    pub line_list_rows: usize,
    /// Landed-cost rows for the target season (before dedup).
    pub landed_rows: usize,
    /// Landed-cost rows surviving dedup.
    pub landed_deduped: usize,
    /// Line-list rows that received a landed-cost override.
    pub landed_matched: usize,
    /// Deduped landed-cost rows with no line-list counterpart (dropped).
    pub landed_unmatched: usize,
    /// Line-list rows that received a pricing-sheet price/msrp override.
    pub pricing_overrides: usize,
}

// ==========================================
// ImportSummary - parse-stage statistics
// ==========================================
// Produced identically by dry runs and live runs so operators can
// validate a file before committing it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Raw data rows seen in the selected sheet.
    pub total_rows: usize,
    /// Rows that passed the style-number admission filter.
    pub emitted: usize,
    /// Emitted rows per normalized season code.
    pub by_season: BTreeMap<String, usize>,
    /// Canonical fields that resolved from at least one row.
    pub columns_matched: Vec<String>,
}

impl ImportSummary {
    pub fn record_season(&mut self, season: &str) {
        let bucket = if season.is_empty() { "Unknown" } else { season };
        *self.by_season.entry(bucket.to_string()).or_insert(0) += 1;
        self.emitted += 1;
    }
}

// ==========================================
// ImportLogEntry - append-only audit record
// ==========================================
// One row per successful live import run. The only persisted
// side-channel state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportLogEntry {
    pub id: String,
    pub file_name: String,
    pub file_type: String,
    pub season: Option<String>,
    pub record_count: usize,
    pub imported_at: DateTime<Utc>,
}

// ==========================================
// SeasonMeta - season metadata
// ==========================================
// Independent of the live per-table counts and reconciled against them
// by the seasons overview (metadata can drift from actual data).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeasonMeta {
    pub code: String,
    pub display_name: String,
    /// Lifecycle status, e.g. "active", "archived", "upcoming".
    pub status: String,
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_scheme() {
        assert_eq!(record_id("ST100", "BLK", "26FA"), "ST100_BLK_26FA");
    }

    #[test]
    fn test_summary_unknown_bucket() {
        let mut summary = ImportSummary::default();
        summary.record_season("26FA");
        summary.record_season("");
        assert_eq!(summary.by_season.get("26FA"), Some(&1));
        assert_eq!(summary.by_season.get("Unknown"), Some(&1));
        assert_eq!(summary.emitted, 2);
    }
}
