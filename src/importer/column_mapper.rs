// ==========================================
// Apparel Season Reconciliation - Column Mapper
// ==========================================
// Typed row accessor shared by every parser: an ordered list of accepted
// header spellings per canonical field, evaluated in order, first
// non-empty match wins. Keeps the alias lists declarative and the
// priority policy inspectable.
//
// Lenient-parse policy is deliberate: the sheets are human-maintained and
// a malformed cell must not abort an entire import. Numeric cells that
// fail to parse yield 0, dates yield None, strings yield "".
// ==========================================

use chrono::NaiveDate;
use std::collections::HashMap;

/// One raw sheet row: header -> cell text.
pub type RawRow = HashMap<String, String>;

pub struct ColumnMapper;

impl ColumnMapper {
    /// First non-empty cell under any accepted header spelling, else "".
    /// Header comparison is case-insensitive; cell text is trimmed.
    pub fn get_string(row: &RawRow, aliases: &[&str]) -> String {
        for alias in aliases {
            for (header, value) in row {
                if header.trim().eq_ignore_ascii_case(alias) {
                    let trimmed = value.trim();
                    if !trimmed.is_empty() {
                        return trimmed.to_string();
                    }
                }
            }
        }
        String::new()
    }

    /// Numeric cell with currency symbols and thousands separators
    /// stripped. Anything that still fails to parse yields 0, never an
    /// error.
    pub fn get_f64(row: &RawRow, aliases: &[&str]) -> f64 {
        let raw = Self::get_string(row, aliases);
        parse_lenient_f64(&raw)
    }

    /// Date cell in any of the shapes seen across department sheets.
    pub fn get_date(row: &RawRow, aliases: &[&str]) -> Option<NaiveDate> {
        let raw = Self::get_string(row, aliases);
        if raw.is_empty() {
            return None;
        }
        for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%Y%m%d"] {
            if let Ok(date) = NaiveDate::parse_from_str(&raw, fmt) {
                return Some(date);
            }
        }
        None
    }

    /// Flag cell: Y / YES / TRUE / 1 / X in any case counts as set.
    pub fn get_flag(row: &RawRow, aliases: &[&str]) -> bool {
        let raw = Self::get_string(row, aliases).to_uppercase();
        matches!(raw.as_str(), "Y" | "YES" | "TRUE" | "1" | "X")
    }
}

/// Strip currency symbols, thousands separators and whitespace, then
/// parse. Non-numeric leftovers parse to 0.
fn parse_lenient_f64(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return 0.0;
    }
    cleaned.parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_first_non_empty_alias_wins() {
        let r = row(&[("Style #", ""), ("Style Number", "ST100")]);
        assert_eq!(
            ColumnMapper::get_string(&r, &["Style #", "Style Number"]),
            "ST100"
        );
    }

    #[test]
    fn test_header_match_is_case_insensitive() {
        let r = row(&[("STYLE NUMBER", "ST100")]);
        assert_eq!(ColumnMapper::get_string(&r, &["Style Number"]), "ST100");
    }

    #[test]
    fn test_missing_string_is_empty() {
        let r = row(&[("Other", "x")]);
        assert_eq!(ColumnMapper::get_string(&r, &["Style Number"]), "");
    }

    #[test]
    fn test_currency_and_separators_stripped() {
        let r = row(&[("MSRP", "$1,250.50")]);
        assert_eq!(ColumnMapper::get_f64(&r, &["MSRP"]), 1250.50);
    }

    #[test]
    fn test_non_numeric_yields_zero() {
        let r = row(&[("Qty", "n/a")]);
        assert_eq!(ColumnMapper::get_f64(&r, &["Qty"]), 0.0);

        let r = row(&[("Qty", "")]);
        assert_eq!(ColumnMapper::get_f64(&r, &["Qty"]), 0.0);
    }

    #[test]
    fn test_date_formats() {
        let r = row(&[("Date Requested", "2026-03-15")]);
        assert_eq!(
            ColumnMapper::get_date(&r, &["Date Requested"]),
            NaiveDate::from_ymd_opt(2026, 3, 15)
        );

        let r = row(&[("Date Requested", "3/15/2026")]);
        assert_eq!(
            ColumnMapper::get_date(&r, &["Date Requested"]),
            NaiveDate::from_ymd_opt(2026, 3, 15)
        );

        let r = row(&[("Date Requested", "soon")]);
        assert_eq!(ColumnMapper::get_date(&r, &["Date Requested"]), None);
    }

    #[test]
    fn test_flags() {
        let r = row(&[("Carry Over", "Y"), ("SMU", "no"), ("MAP", "x")]);
        assert!(ColumnMapper::get_flag(&r, &["Carry Over"]));
        assert!(!ColumnMapper::get_flag(&r, &["SMU"]));
        assert!(ColumnMapper::get_flag(&r, &["MAP"]));
    }
}
