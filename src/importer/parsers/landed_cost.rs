// ==========================================
// Apparel Season Reconciliation - Landed Cost Parser
// ==========================================
// Cost-request log from the sourcing team. The sheet carries a fixed
// 10-row preamble (instructions and totals) above its header row, so
// data mapping starts at row 11. Resubmitted requests produce multiple
// rows per style+season; the reconciliation engine dedups by
// date_requested.
// ==========================================

use crate::domain::records::{ImportSummary, LandedCostItem};
use crate::importer::column_mapper::{ColumnMapper, RawRow};
use crate::importer::parsers::{matched_column_names, track_columns, FieldSpec, ParseOutcome};
use crate::importer::season;
use crate::importer::sheet_reader::WorkbookData;
use std::collections::BTreeSet;
use tracing::debug;

const PREFERRED_SHEETS: &[&str] = &["LDP Requests", "Landed Cost", "Cost Sheet", "Sheet1"];

/// Known layout: rows 1-10 are preamble, headers sit on row 11.
const HEADER_ROW: usize = 10;

const STYLE_NUMBER: &[&str] = &["Style Number", "Style #", "Style No", "Style#", "Style"];
const STYLE_DESC: &[&str] = &["Style Description", "Style Desc", "Description"];
const SEASON: &[&str] = &["Season", "Season Code", "Ssn"];
const FOB_COST: &[&str] = &["FOB", "FOB Cost", "FOB $"];
const DUTY: &[&str] = &["Duty", "Duty $", "Duty Cost"];
const TARIFF: &[&str] = &["Tariff", "301 Tariff", "Tariff $"];
const FREIGHT: &[&str] = &["Freight", "Freight $", "Freight Cost"];
const OVERHEAD: &[&str] = &["Overhead", "OH", "Overhead $"];
const LANDED_COST: &[&str] = &["LDP", "Landed", "Landed Cost", "Total LDP"];
const DATE_REQUESTED: &[&str] = &["Date Requested", "Request Date", "Requested", "Date"];

const FIELDS: &[FieldSpec] = &[
    ("style_number", STYLE_NUMBER),
    ("style_desc", STYLE_DESC),
    ("season", SEASON),
    ("fob_cost", FOB_COST),
    ("duty", DUTY),
    ("tariff", TARIFF),
    ("freight", FREIGHT),
    ("overhead", OVERHEAD),
    ("landed_cost", LANDED_COST),
    ("date_requested", DATE_REQUESTED),
];

pub fn parse(workbook: &WorkbookData) -> ParseOutcome<LandedCostItem> {
    let mut summary = ImportSummary::default();
    let mut items = Vec::new();
    let mut matched = BTreeSet::new();

    let sheet = match workbook.select_sheet(PREFERRED_SHEETS) {
        Some(sheet) => sheet,
        None => return ParseOutcome { items, summary },
    };
    debug!(sheet = %sheet.name, file = %workbook.file_name, "parsing landed cost sheet");

    for row in sheet.to_records(HEADER_ROW) {
        summary.total_rows += 1;
        track_columns(&mut matched, &row, FIELDS);

        if let Some(item) = parse_row(&row) {
            summary.record_season(&item.season);
            items.push(item);
        }
    }

    summary.columns_matched = matched_column_names(matched);
    ParseOutcome { items, summary }
}

fn parse_row(row: &RawRow) -> Option<LandedCostItem> {
    let style_number = ColumnMapper::get_string(row, STYLE_NUMBER);
    if style_number.is_empty() {
        return None;
    }

    let season_raw = ColumnMapper::get_string(row, SEASON);
    let fob_cost = ColumnMapper::get_f64(row, FOB_COST);
    let duty = ColumnMapper::get_f64(row, DUTY);
    let tariff = ColumnMapper::get_f64(row, TARIFF);
    let freight = ColumnMapper::get_f64(row, FREIGHT);
    let overhead = ColumnMapper::get_f64(row, OVERHEAD);
    let mut landed_cost = ColumnMapper::get_f64(row, LANDED_COST);

    // Some sheets leave the total blank and carry only the components.
    if landed_cost <= 0.0 && fob_cost > 0.0 {
        landed_cost = fob_cost + duty + tariff + freight + overhead;
    }

    Some(LandedCostItem {
        style_number,
        style_desc: ColumnMapper::get_string(row, STYLE_DESC),
        season: season::normalize(&season_raw).season,
        season_raw,
        fob_cost,
        duty,
        tariff,
        freight,
        overhead,
        landed_cost,
        date_requested: ColumnMapper::get_date(row, DATE_REQUESTED),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::sheet_reader::SheetData;
    use chrono::NaiveDate;

    /// Builds a sheet with the fixed 10-row preamble above the headers.
    fn workbook(data_rows: Vec<Vec<&str>>) -> WorkbookData {
        let mut rows: Vec<Vec<String>> = (0..HEADER_ROW)
            .map(|i| vec![format!("preamble {}", i)])
            .collect();
        for row in data_rows {
            rows.push(row.into_iter().map(|c| c.to_string()).collect());
        }
        WorkbookData {
            file_name: "ldp.xlsx".to_string(),
            sheets: vec![SheetData {
                name: "LDP Requests".to_string(),
                rows,
            }],
        }
    }

    #[test]
    fn test_preamble_skipped() {
        let wb = workbook(vec![
            vec!["Style #", "Season", "FOB", "LDP", "Date Requested"],
            vec!["ST100", "FA26", "12.00", "20.00", "2026-03-01"],
        ]);
        let outcome = parse(&wb);
        assert_eq!(outcome.items.len(), 1);
        let item = &outcome.items[0];
        assert_eq!(item.season, "26FA");
        assert_eq!(item.landed_cost, 20.0);
        assert_eq!(
            item.date_requested,
            NaiveDate::from_ymd_opt(2026, 3, 1)
        );
    }

    #[test]
    fn test_landed_total_derived_from_components() {
        let wb = workbook(vec![
            vec!["Style #", "FOB", "Duty", "Freight"],
            vec!["ST100", "10.00", "2.00", "1.50"],
        ]);
        let outcome = parse(&wb);
        assert_eq!(outcome.items[0].landed_cost, 13.5);
    }

    #[test]
    fn test_missing_date_is_none() {
        let wb = workbook(vec![
            vec!["Style #", "LDP"],
            vec!["ST100", "20.00"],
        ]);
        assert_eq!(parse(&wb).items[0].date_requested, None);
    }
}
