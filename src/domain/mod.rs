// ==========================================
// Apparel Season Reconciliation - Domain Layer
// ==========================================
// Entities and shared types only. No data access, no engine logic.
// ==========================================

pub mod records;
pub mod types;

pub use records::{
    record_id, CostRecord, ImportLogEntry, ImportSummary, InventoryItem, LandedCostItem,
    LineListItem, PricingItem, ProductRecord, ReconcileStats, SalesItem, SeasonMeta,
};
pub use types::{CostSource, FileType, ReplaceScope, SeasonType, Table};
