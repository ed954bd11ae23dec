// ==========================================
// Apparel Season Reconciliation - Line List Parser
// ==========================================
// The line list is the master product catalog: style + color + season,
// per-market prices and the initial cost snapshot. One emitted item per
// row with a style number.
// ==========================================

use crate::domain::records::{ImportSummary, LineListItem};
use crate::importer::column_mapper::{ColumnMapper, RawRow};
use crate::importer::parsers::{matched_column_names, track_columns, FieldSpec, ParseOutcome};
use crate::importer::season;
use crate::importer::sheet_reader::WorkbookData;
use std::collections::BTreeSet;
use tracing::debug;

const PREFERRED_SHEETS: &[&str] = &["Line List", "LineList", "Master", "Sheet1"];

// Accepted header spellings per canonical field. Ordered: first
// non-empty match wins.
const STYLE_NUMBER: &[&str] = &["Style Number", "Style #", "Style No", "Style#", "Style"];
const STYLE_DESC: &[&str] = &["Style Description", "Style Desc", "Style Name", "Description"];
const COLOR_CODE: &[&str] = &["Color Code", "Colorway Code", "Color #", "CC"];
const COLOR_DESC: &[&str] = &["Color Description", "Color Desc", "Colorway", "Color"];
const SEASON: &[&str] = &["Season", "Season Code", "Ssn"];
const FACTORY: &[&str] = &["Factory", "Factory Name", "Vendor"];
const COUNTRY_OF_ORIGIN: &[&str] = &["Country of Origin", "COO", "Origin"];
const DESIGNER: &[&str] = &["Designer"];
const DEVELOPER: &[&str] = &["Developer"];
const MSRP_US: &[&str] = &["US MSRP", "MSRP US", "MSRP (US)", "MSRP"];
const MSRP_CA: &[&str] = &["CA MSRP", "MSRP CA", "MSRP (CA)", "Canada MSRP"];
const WHOLESALE_US: &[&str] = &["US Wholesale", "Wholesale US", "WHLS US", "Wholesale", "WS Price"];
const WHOLESALE_CA: &[&str] = &["CA Wholesale", "Wholesale CA", "WHLS CA", "Canada Wholesale"];
const FOB_COST: &[&str] = &["FOB", "FOB Cost", "FOB $"];
const LANDED_COST: &[&str] = &["LDP", "Landed", "Landed Cost", "LDP Cost"];
const MARGIN: &[&str] = &["Margin", "Margin %", "MRGN"];
const CARRY_OVER: &[&str] = &["Carry Over", "Carryover", "C/O"];
const TOP_SELLER: &[&str] = &["Top Seller", "Top"];
const SMU: &[&str] = &["SMU"];
const MAP_PROTECTED: &[&str] = &["MAP", "MAP Protected"];

const FIELDS: &[FieldSpec] = &[
    ("style_number", STYLE_NUMBER),
    ("style_desc", STYLE_DESC),
    ("color_code", COLOR_CODE),
    ("color_desc", COLOR_DESC),
    ("season", SEASON),
    ("factory", FACTORY),
    ("country_of_origin", COUNTRY_OF_ORIGIN),
    ("designer", DESIGNER),
    ("developer", DEVELOPER),
    ("msrp_us", MSRP_US),
    ("msrp_ca", MSRP_CA),
    ("wholesale_us", WHOLESALE_US),
    ("wholesale_ca", WHOLESALE_CA),
    ("fob_cost", FOB_COST),
    ("landed_cost", LANDED_COST),
    ("margin", MARGIN),
];

pub fn parse(workbook: &WorkbookData) -> ParseOutcome<LineListItem> {
    let mut summary = ImportSummary::default();
    let mut items = Vec::new();
    let mut matched = BTreeSet::new();

    let sheet = match workbook.select_sheet(PREFERRED_SHEETS) {
        Some(sheet) => sheet,
        None => {
            return ParseOutcome {
                items,
                summary,
            }
        }
    };
    debug!(sheet = %sheet.name, file = %workbook.file_name, "parsing line list");

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

fn parse_row(row: &RawRow) -> Option<LineListItem> {
    let style_number = ColumnMapper::get_string(row, STYLE_NUMBER);
    if style_number.is_empty() {
        return None;
    }

    let season_raw = ColumnMapper::get_string(row, SEASON);
    let normalized = season::normalize(&season_raw);

    Some(LineListItem {
        style_number,
        style_desc: ColumnMapper::get_string(row, STYLE_DESC),
        color_code: ColumnMapper::get_string(row, COLOR_CODE),
        color_desc: ColumnMapper::get_string(row, COLOR_DESC),
        season_raw,
        season: normalized.season,
        season_type: normalized.season_type,
        factory: ColumnMapper::get_string(row, FACTORY),
        country_of_origin: ColumnMapper::get_string(row, COUNTRY_OF_ORIGIN),
        designer: ColumnMapper::get_string(row, DESIGNER),
        developer: ColumnMapper::get_string(row, DEVELOPER),
        msrp_us: ColumnMapper::get_f64(row, MSRP_US),
        msrp_ca: ColumnMapper::get_f64(row, MSRP_CA),
        wholesale_us: ColumnMapper::get_f64(row, WHOLESALE_US),
        wholesale_ca: ColumnMapper::get_f64(row, WHOLESALE_CA),
        fob_cost: ColumnMapper::get_f64(row, FOB_COST),
        landed_cost: ColumnMapper::get_f64(row, LANDED_COST),
        margin: ColumnMapper::get_f64(row, MARGIN),
        carry_over: ColumnMapper::get_flag(row, CARRY_OVER),
        top_seller: ColumnMapper::get_flag(row, TOP_SELLER),
        smu: ColumnMapper::get_flag(row, SMU),
        map_protected: ColumnMapper::get_flag(row, MAP_PROTECTED),
    })
}
