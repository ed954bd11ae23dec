// ==========================================
// Apparel Season Reconciliation - Domain Types
// ==========================================
// Shared enums used across importer, engine, persistence and API layers.
// Serialized forms match what lands in the backing store.
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Season Type
// ==========================================
// Derived from trailing qualifiers on raw season strings
// (e.g. "26FA-BULK" -> Bulk). Main is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeasonType {
    Main,
    Bulk,
    Proto,
}

impl Default for SeasonType {
    fn default() -> Self {
        SeasonType::Main
    }
}

impl fmt::Display for SeasonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeasonType::Main => write!(f, "Main"),
            SeasonType::Bulk => write!(f, "Bulk"),
            SeasonType::Proto => write!(f, "Proto"),
        }
    }
}

// ==========================================
// Cost Source
// ==========================================
// Tags where a product's cost figures came from after reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostSource {
    LineList,
    LandedSheet,
}

impl Default for CostSource {
    fn default() -> Self {
        CostSource::LineList
    }
}

impl fmt::Display for CostSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostSource::LineList => write!(f, "line_list"),
            CostSource::LandedSheet => write!(f, "landed_sheet"),
        }
    }
}

// ==========================================
// Canonical Tables
// ==========================================
// One table per canonical record type in the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Products,
    Costs,
    Pricing,
    Sales,
    Inventory,
}

impl Table {
    /// Physical table name in the backing store.
    pub fn name(&self) -> &'static str {
        match self {
            Table::Products => "products",
            Table::Costs => "costs",
            Table::Pricing => "pricing",
            Table::Sales => "sales",
            Table::Inventory => "inventory",
        }
    }

    /// Whether rows in this table carry a unique key.
    /// Sales lines are not naturally unique (re-bookings are valid).
    pub fn keyed(&self) -> bool {
        !matches!(self, Table::Sales)
    }

    /// Insert policy: keyed tables silently skip pre-existing keys,
    /// the sales table never skips duplicates.
    pub fn skip_duplicates(&self) -> bool {
        self.keyed()
    }

    /// All canonical tables, in the import order the caller should use
    /// (products are the referential anchor other views join against).
    pub fn all() -> [Table; 5] {
        [
            Table::Products,
            Table::Costs,
            Table::Pricing,
            Table::Sales,
            Table::Inventory,
        ]
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "products" => Ok(Table::Products),
            "costs" => Ok(Table::Costs),
            "pricing" => Ok(Table::Pricing),
            "sales" => Ok(Table::Sales),
            "inventory" => Ok(Table::Inventory),
            other => Err(format!("unknown record type: {}", other)),
        }
    }
}

// ==========================================
// Replace Scope
// ==========================================
// Season-scoped replace deletes only the seasons present in the incoming
// batch; whole-table replace deletes unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceScope {
    Table,
    Seasons,
}

// ==========================================
// Spreadsheet Shapes
// ==========================================
// The four source spreadsheet shapes the importer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    LineList,
    Pricing,
    LandedCost,
    Sales,
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::LineList => write!(f, "line_list"),
            FileType::Pricing => write!(f, "pricing"),
            FileType::LandedCost => write!(f, "landed_cost"),
            FileType::Sales => write!(f, "sales"),
        }
    }
}
