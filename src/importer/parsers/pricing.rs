// ==========================================
// Apparel Season Reconciliation - Price Sheet Parser
// ==========================================
// Season price list: style + color with wholesale price, MSRP and cost.
// Pricing records are the top of the price priority chain and are
// persisted verbatim to the pricing table.
// ==========================================

use crate::domain::records::{ImportSummary, PricingItem};
use crate::importer::column_mapper::{ColumnMapper, RawRow};
use crate::importer::parsers::{matched_column_names, track_columns, FieldSpec, ParseOutcome};
use crate::importer::season;
use crate::importer::sheet_reader::WorkbookData;
use std::collections::BTreeSet;
use tracing::debug;

const PREFERRED_SHEETS: &[&str] = &["Price Sheet", "Pricing", "Prices", "Sheet1"];

const STYLE_NUMBER: &[&str] = &["Style Number", "Style #", "Style No", "Style#", "Style"];
const COLOR_CODE: &[&str] = &["Color Code", "Colorway Code", "Color #", "Color", "CC"];
const SEASON: &[&str] = &["Season", "Season Code", "Ssn"];
const SEASON_DESC: &[&str] = &["Season Description", "Season Desc", "Season Name"];
const PRICE: &[&str] = &["Price", "Wholesale", "Wholesale Price", "WHLS", "WS Price"];
const MSRP: &[&str] = &["MSRP", "Retail", "Retail Price", "Suggested Retail"];
const COST: &[&str] = &["Cost", "FOB", "Unit Cost"];

const FIELDS: &[FieldSpec] = &[
    ("style_number", STYLE_NUMBER),
    ("color_code", COLOR_CODE),
    ("season", SEASON),
    ("season_desc", SEASON_DESC),
    ("price", PRICE),
    ("msrp", MSRP),
    ("cost", COST),
];

pub fn parse(workbook: &WorkbookData) -> ParseOutcome<PricingItem> {
    let mut summary = ImportSummary::default();
    let mut items = Vec::new();
    let mut matched = BTreeSet::new();

    let sheet = match workbook.select_sheet(PREFERRED_SHEETS) {
        Some(sheet) => sheet,
        None => return ParseOutcome { items, summary },
    };
    debug!(sheet = %sheet.name, file = %workbook.file_name, "parsing price sheet");

    for row in sheet.to_records(0) {
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

fn parse_row(row: &RawRow) -> Option<PricingItem> {
    let style_number = ColumnMapper::get_string(row, STYLE_NUMBER);
    if style_number.is_empty() {
        return None;
    }

    let season_raw = ColumnMapper::get_string(row, SEASON);

    Some(PricingItem {
        style_number,
        color_code: ColumnMapper::get_string(row, COLOR_CODE),
        season: season::normalize(&season_raw).season,
        season_desc: ColumnMapper::get_string(row, SEASON_DESC),
        price: ColumnMapper::get_f64(row, PRICE),
        msrp: ColumnMapper::get_f64(row, MSRP),
        cost: ColumnMapper::get_f64(row, COST),
    })
}
