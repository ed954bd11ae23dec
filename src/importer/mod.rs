// ==========================================
// Apparel Season Reconciliation - Import Layer
// ==========================================
// External spreadsheet data in, canonical-shaped records out.
// Supports Excel (.xlsx/.xls) and CSV inputs.
// ==========================================

pub mod column_mapper;
pub mod error;
pub mod parsers;
pub mod season;
pub mod sheet_reader;

pub use column_mapper::{ColumnMapper, RawRow};
pub use error::{ImportError, ImportResult};
pub use parsers::ParseOutcome;
pub use season::{normalize, NormalizedSeason};
pub use sheet_reader::{read_workbook, SheetData, WorkbookData};
