// ==========================================
// Apparel Season Reconciliation - Source Parsers
// ==========================================
// One parser per spreadsheet shape. Shared rules:
// - Sheet selection: preferred named sheets first, else the first sheet.
// - Admission filter: a record is emitted only when its style-number
//   field resolves non-empty. Everything else may be blank.
// - Row-level issues never abort a parse; only an unreadable file is
//   fatal, and that is handled by the sheet reader.
// ==========================================

pub mod landed_cost;
pub mod line_list;
pub mod pricing;
pub mod sales;

use crate::domain::records::ImportSummary;
use crate::importer::column_mapper::{ColumnMapper, RawRow};
use std::collections::BTreeSet;

/// Parse result: emitted items plus the summary statistics a dry run
/// reports (identical for live runs).
#[derive(Debug, Clone)]
pub struct ParseOutcome<T> {
    pub items: Vec<T>,
    pub summary: ImportSummary,
}

/// Field list entry for the column-match report: canonical field name
/// plus its accepted header spellings.
pub(crate) type FieldSpec = (&'static str, &'static [&'static str]);

/// Record which canonical fields have resolved from at least one row.
/// Fields already seen are skipped, so the scan stays cheap on wide
/// sheets.
pub(crate) fn track_columns(
    matched: &mut BTreeSet<&'static str>,
    row: &RawRow,
    fields: &[FieldSpec],
) {
    for (name, aliases) in fields {
        if !matched.contains(name) && !ColumnMapper::get_string(row, aliases).is_empty() {
            matched.insert(name);
        }
    }
}

pub(crate) fn matched_column_names(matched: BTreeSet<&'static str>) -> Vec<String> {
    matched.into_iter().map(|s| s.to_string()).collect()
}
