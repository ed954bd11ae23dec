// ==========================================
// Apparel Season Reconciliation - Repository Errors
// ==========================================
// Store-facing error taxonomy. The batch persister retries errors that
// classify as transient (rate limits, 5xx-class outages) and isolates
// everything else per chunk.
// ==========================================

use thiserror::Error;

/// Repository/store error type
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== Transient infrastructure errors =====
    #[error("rate limited by store: {0}")]
    RateLimited(String),

    #[error("store unavailable (status {status}): {message}")]
    Unavailable { status: u16, message: String },

    // ===== Database errors =====
    #[error("database connection failed: {0}")]
    DatabaseConnectionError(String),

    #[error("database transaction failed: {0}")]
    DatabaseTransactionError(String),

    #[error("database query failed: {0}")]
    DatabaseQueryError(String),

    #[error("lock acquisition failed: {0}")]
    LockError(String),

    // ===== Data errors =====
    #[error("unique constraint violation: {0}")]
    UniqueConstraintViolation(String),

    #[error("serialization failed: {0}")]
    SerializationError(String),

    #[error("{entity} not found (id={id})")]
    NotFound { entity: String, id: String },

    // ===== General =====
    #[error("internal repository error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepositoryError {
    /// Transient errors are worth retrying with backoff: rate limiting
    /// and 5xx-class outages. Everything else is fatal for its chunk.
    pub fn is_transient(&self) -> bool {
        match self {
            RepositoryError::RateLimited(_) => true,
            RepositoryError::Unavailable { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("UNIQUE") => {
                RepositoryError::UniqueConstraintViolation(msg.clone())
            }
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::SerializationError(err.to_string())
    }
}

/// Result alias for the repository layer
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(RepositoryError::RateLimited("429".to_string()).is_transient());
        assert!(RepositoryError::Unavailable {
            status: 503,
            message: "down".to_string()
        }
        .is_transient());
        assert!(!RepositoryError::Unavailable {
            status: 400,
            message: "bad batch".to_string()
        }
        .is_transient());
        assert!(!RepositoryError::DatabaseQueryError("boom".to_string()).is_transient());
    }
}
