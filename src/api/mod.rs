// ==========================================
// Apparel Season Reconciliation - API Layer
// ==========================================
// The operator-facing surface: import pipelines, admin operations.
// Orchestration only; business rules live in the engine, data access in
// the repository layer.
// ==========================================

pub mod admin_api;
pub mod error;
pub mod import_api;

pub use admin_api::{AdminApi, ResetResponse, SeasonOverview, RESET_CONFIRM_TOKEN};
pub use error::{ApiError, ApiResult};
pub use import_api::{
    ImportApi, ImportOptions, ImportRequest, ImportResponse, SeasonImportResponse,
};
