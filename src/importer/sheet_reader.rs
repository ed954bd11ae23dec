// ==========================================
// Apparel Season Reconciliation - Sheet Reader
// ==========================================
// Reads .xlsx/.xls via calamine and .csv via the csv crate into raw
// string grids. Parsers pick a sheet (preferred names first, else the
// first sheet) and decide where the header row sits; the landed-cost
// sheet carries a fixed 10-row preamble above its headers.
// ==========================================

use crate::importer::column_mapper::RawRow;
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

// ==========================================
// SheetData - one sheet as a raw string grid
// ==========================================
#[derive(Debug, Clone)]
pub struct SheetData {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl SheetData {
    /// Build header->value rows with the header row at `header_row`.
    /// Rows above the header row are skipped; fully blank rows are
    /// dropped.
    pub fn to_records(&self, header_row: usize) -> Vec<RawRow> {
        let headers: Vec<String> = match self.rows.get(header_row) {
            Some(row) => row.iter().map(|h| h.trim().to_string()).collect(),
            None => return Vec::new(),
        };

        let mut records = Vec::new();
        for data_row in self.rows.iter().skip(header_row + 1) {
            let mut record = RawRow::new();
            for (idx, value) in data_row.iter().enumerate() {
                if let Some(header) = headers.get(idx) {
                    if !header.is_empty() {
                        record.insert(header.clone(), value.trim().to_string());
                    }
                }
            }
            if record.values().all(|v| v.is_empty()) {
                continue;
            }
            records.push(record);
        }
        records
    }
}

// ==========================================
// WorkbookData - all sheets of one input file
// ==========================================
#[derive(Debug, Clone)]
pub struct WorkbookData {
    pub file_name: String,
    pub sheets: Vec<SheetData>,
}

impl WorkbookData {
    /// Prefer a named sheet (first preferred name that exists), else the
    /// first sheet of the workbook.
    pub fn select_sheet(&self, preferred: &[&str]) -> Option<&SheetData> {
        for name in preferred {
            if let Some(sheet) = self
                .sheets
                .iter()
                .find(|s| s.name.trim().eq_ignore_ascii_case(name))
            {
                return Some(sheet);
            }
        }
        self.sheets.first()
    }
}

// ==========================================
// Reading
// ==========================================

/// Open an input file by extension. Only an unreadable or undecodable
/// file is fatal; cell-level issues are handled downstream.
pub fn read_workbook<P: AsRef<Path>>(path: P) -> ImportResult<WorkbookData> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "csv" => read_csv(path),
        "xlsx" | "xls" => read_excel(path),
        _ => Err(ImportError::UnsupportedFormat(ext)),
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// A CSV file reads as a single-sheet workbook named "Sheet1".
fn read_csv(path: &Path) -> ImportResult<WorkbookData> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(|v| v.to_string()).collect());
    }

    Ok(WorkbookData {
        file_name: file_name_of(path),
        sheets: vec![SheetData {
            name: "Sheet1".to_string(),
            rows,
        }],
    })
}

fn read_excel(path: &Path) -> ImportResult<WorkbookData> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet_names = workbook.sheet_names().to_owned();
    if sheet_names.is_empty() {
        return Err(ImportError::EmptyWorkbook(path.display().to_string()));
    }

    let mut sheets = Vec::new();
    for name in sheet_names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();
        sheets.push(SheetData { name, rows });
    }

    Ok(WorkbookData {
        file_name: file_name_of(path),
        sheets,
    })
}
