// ==========================================
// Apparel Season Reconciliation - Sales Extract Parser
// ==========================================
// Order-line detail from the ERP export. The customer column has the
// highest naming variance of any field across departments, so its alias
// chain is deliberately long. Sales lines are not unique; duplicates are
// valid re-bookings and are kept.
// ==========================================

use crate::domain::records::{ImportSummary, SalesItem};
use crate::importer::column_mapper::{ColumnMapper, RawRow};
use crate::importer::parsers::{matched_column_names, track_columns, FieldSpec, ParseOutcome};
use crate::importer::season;
use crate::importer::sheet_reader::WorkbookData;
use std::collections::BTreeSet;
use tracing::debug;

const PREFERRED_SHEETS: &[&str] = &["Sales", "Sales Extract", "Bookings", "Sheet1"];

const STYLE_NUMBER: &[&str] = &["Style Number", "Style #", "Style No", "Style", "Item", "Item Number"];
const COLOR_DESC: &[&str] = &["Color Description", "Color Desc", "Colorway", "Color"];
const SEASON: &[&str] = &["Season", "Season Code", "Ssn"];

/// Every customer-column spelling seen in production extracts so far.
const CUSTOMER: &[&str] = &[
    "Customer",
    "Customer Name",
    "Cust",
    "Cust Name",
    "Sold To",
    "Sold To Name",
    "Sold-To Name",
    "Account",
    "Account Name",
    "Bill To",
    "Bill To Name",
    "Client",
];

const CHANNEL: &[&str] = &["Channel", "Distribution Channel", "Channel Type"];
const CUSTOMER_TYPE: &[&str] = &["Customer Type", "Cust Type", "Account Type"];
const CATEGORY: &[&str] = &["Category", "Product Category", "Cat"];
const DIVISION: &[&str] = &["Division", "Div"];
const GENDER: &[&str] = &["Gender", "Gender Desc"];
const UNITS_BOOKED: &[&str] = &["Units Booked", "Booked Units", "Qty Booked", "Units", "Qty"];
const UNITS_SHIPPED: &[&str] = &["Units Shipped", "Shipped Units", "Qty Shipped", "Shipped"];
const REVENUE: &[&str] = &["Revenue", "Booked $", "Net Revenue", "Ext Price", "Extended Price", "Amount"];

const FIELDS: &[FieldSpec] = &[
    ("style_number", STYLE_NUMBER),
    ("color_desc", COLOR_DESC),
    ("season", SEASON),
    ("customer", CUSTOMER),
    ("channel", CHANNEL),
    ("customer_type", CUSTOMER_TYPE),
    ("category", CATEGORY),
    ("division", DIVISION),
    ("gender", GENDER),
    ("units_booked", UNITS_BOOKED),
    ("units_shipped", UNITS_SHIPPED),
    ("revenue", REVENUE),
];

pub fn parse(workbook: &WorkbookData) -> ParseOutcome<SalesItem> {
    let mut summary = ImportSummary::default();
    let mut items = Vec::new();
    let mut matched = BTreeSet::new();

    let sheet = match workbook.select_sheet(PREFERRED_SHEETS) {
        Some(sheet) => sheet,
        None => return ParseOutcome { items, summary },
    };
    debug!(sheet = %sheet.name, file = %workbook.file_name, "parsing sales extract");

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

fn parse_row(row: &RawRow) -> Option<SalesItem> {
    let style_number = ColumnMapper::get_string(row, STYLE_NUMBER);
    if style_number.is_empty() {
        return None;
    }

    let season_raw = ColumnMapper::get_string(row, SEASON);

    Some(SalesItem {
        style_number,
        color_desc: ColumnMapper::get_string(row, COLOR_DESC),
        season: season::normalize(&season_raw).season,
        customer: ColumnMapper::get_string(row, CUSTOMER),
        channel: ColumnMapper::get_string(row, CHANNEL),
        customer_type: ColumnMapper::get_string(row, CUSTOMER_TYPE),
        category: ColumnMapper::get_string(row, CATEGORY),
        division: ColumnMapper::get_string(row, DIVISION),
        gender: ColumnMapper::get_string(row, GENDER),
        units_booked: ColumnMapper::get_f64(row, UNITS_BOOKED),
        units_shipped: ColumnMapper::get_f64(row, UNITS_SHIPPED),
        revenue: ColumnMapper::get_f64(row, REVENUE),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::sheet_reader::SheetData;

    fn workbook(rows: Vec<Vec<&str>>) -> WorkbookData {
        WorkbookData {
            file_name: "sales.xlsx".to_string(),
            sheets: vec![SheetData {
                name: "Sales".to_string(),
                rows: rows
                    .into_iter()
                    .map(|r| r.into_iter().map(|c| c.to_string()).collect())
                    .collect(),
            }],
        }
    }

    #[test]
    fn test_parse_sales_row() {
        let wb = workbook(vec![
            vec!["Style", "Season", "Sold To Name", "Channel", "Units Booked", "Booked $"],
            vec!["ST100", "FA26", "Acme Outdoor", "Wholesale", "120", "$5,400.00"],
        ]);
        let outcome = parse(&wb);
        assert_eq!(outcome.items.len(), 1);
        let item = &outcome.items[0];
        assert_eq!(item.customer, "Acme Outdoor");
        assert_eq!(item.units_booked, 120.0);
        assert_eq!(item.revenue, 5400.0);
    }

    #[test]
    fn test_customer_alias_chain() {
        for header in ["Customer", "Cust Name", "Account Name", "Bill To"] {
            let wb = workbook(vec![
                vec!["Style", header],
                vec!["ST100", "Acme"],
            ]);
            assert_eq!(parse(&wb).items[0].customer, "Acme", "header {}", header);
        }
    }

    #[test]
    fn test_lenient_qty() {
        let wb = workbook(vec![
            vec!["Style", "Qty"],
            vec!["ST100", "n/a"],
        ]);
        assert_eq!(parse(&wb).items[0].units_booked, 0.0);
    }

    #[test]
    fn test_duplicate_lines_kept() {
        let wb = workbook(vec![
            vec!["Style", "Units"],
            vec!["ST100", "5"],
            vec!["ST100", "5"],
        ]);
        assert_eq!(parse(&wb).items.len(), 2);
    }
}
