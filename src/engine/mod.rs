// ==========================================
// Apparel Season Reconciliation - Engine Layer
// ==========================================
// Business rules only: merging, deduplication, derived fields.
// No data access here.
// ==========================================

pub mod reconcile;

pub use reconcile::{margin_pct, ReconcileOutput, ReconciliationEngine};
