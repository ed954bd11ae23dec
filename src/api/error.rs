// ==========================================
// Apparel Season Reconciliation - API Layer Errors
// ==========================================
// Converts importer/repository errors into operator-facing messages.
// Every error message carries an explicit reason.
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    // ===== input / request errors =====
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("confirmation token mismatch: {0}")]
    ConfirmationRequired(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    // ===== import errors =====
    #[error("file import failed: {0}")]
    ImportError(String),

    #[error("data validation failed: {0}")]
    ValidationError(String),

    // ===== data access errors =====
    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("database connection failed: {0}")]
    DatabaseConnectionError(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    // ===== generic =====
    #[error("internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// Conversions from lower layers
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::RateLimited(msg) => {
                ApiError::StoreUnavailable(format!("rate limited: {}", msg))
            }
            RepositoryError::Unavailable { status, message } => {
                ApiError::StoreUnavailable(format!("status {}: {}", status, message))
            }
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} (id={})", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("database lock failed: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg)
            | RepositoryError::UniqueConstraintViolation(msg)
            | RepositoryError::SerializationError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        ApiError::ImportError(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
