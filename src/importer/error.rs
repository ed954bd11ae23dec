// ==========================================
// Apparel Season Reconciliation - Import Errors
// ==========================================
// Only sheet-structure problems are fatal; row-level data issues are
// absorbed by lenient parsing and never surface as errors.
// ==========================================

use thiserror::Error;

/// Importer error type
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== File errors =====
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unsupported file format: {0} (expected .xlsx/.xls/.csv)")]
    UnsupportedFormat(String),

    #[error("file read failed: {0}")]
    FileReadError(String),

    #[error("excel parse failed: {0}")]
    ExcelParseError(String),

    #[error("csv parse failed: {0}")]
    CsvParseError(String),

    // ===== Sheet-structure errors =====
    #[error("workbook has no sheets: {0}")]
    EmptyWorkbook(String),

    #[error("sheet {sheet} has no header row")]
    MissingHeaderRow { sheet: String },

    // ===== General =====
    #[error("internal import error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result alias for the importer layer
pub type ImportResult<T> = Result<T, ImportError>;
