// ==========================================
// Apparel Season Reconciliation - Core Library
// ==========================================
// Quarterly spreadsheet ingestion for an apparel business: season code
// normalization, four source parsers, reconciliation into unified
// product/cost records, chunked persistence and read-side aggregation.
// Stack: Rust + SQLite
// ==========================================

// ==========================================
// Module declarations
// ==========================================

// Domain layer - entities and types
pub mod domain;

// Repository layer - data access
pub mod repository;

// Engine layer - business rules
pub mod engine;

// Import layer - external data
pub mod importer;

// Persistence orchestration - chunking, retry, replace semantics
pub mod persister;

// Aggregation - read-side summaries
pub mod aggregation;

// Configuration layer
pub mod config;

// Database infrastructure (connection setup, unified PRAGMAs)
pub mod db;

// Logging
pub mod logging;

// API layer - operator-facing surface
pub mod api;

// ==========================================
// Core re-exports
// ==========================================

pub use domain::types::{CostSource, FileType, ReplaceScope, SeasonType, Table};

pub use domain::{
    CostRecord, ImportLogEntry, ImportSummary, InventoryItem, LandedCostItem, LineListItem,
    PricingItem, ProductRecord, ReconcileStats, SalesItem, SeasonMeta,
};

pub use api::{AdminApi, ApiError, ApiResult, ImportApi, ImportOptions};
pub use engine::ReconciliationEngine;
pub use persister::{BatchPersister, PersistOptions, PersistReport, RetryPolicy};
pub use repository::{SqliteTableStore, TableStore, PAGE_CEILING};

// ==========================================
// Version info
// ==========================================
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "Apparel Season Reconciliation";

/// Default database location: user data dir, overridable via env var.
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("APPAREL_RECON_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./apparel_recon.db");
    if let Some(data_dir) = dirs::data_dir() {
        path = data_dir.join("apparel-recon");
        let _ = std::fs::create_dir_all(&path);
        path = path.join("apparel_recon.db");
    }
    path.to_string_lossy().to_string()
}
