use serde::{Deserialize, Serialize};

/// One sellable offer from a single country partition of the marketplace catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub code: String,
    pub category_code: String,
    pub name: String,
    pub provider_code: String,
    pub price: i64,
    #[serde(rename = "process_time")]
    pub process_time_minutes: i64,
    pub country_code: String,
    pub status: String,
}

/// Run flag read from the sheet. Rows without a recognised flag are never loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Reconcile, write the note, and push the price into the row's target cell.
    Run,
    /// Reconcile and write the note only.
    Check,
}

impl RunMode {
    pub fn from_cell(raw: &str) -> Option<Self> {
        match raw.trim() {
            "1" => Some(RunMode::Run),
            "2" => Some(RunMode::Check),
            _ => None,
        }
    }

    pub fn as_cell(&self) -> &'static str {
        match self {
            RunMode::Run => "1",
            RunMode::Check => "2",
        }
    }
}

/// Cell in another spreadsheet that receives the bare winning price.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriceTarget {
    pub sheet_id: String,
    pub sheet_name: String,
    pub cell: String,
}

/// One operator-authored configuration row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRow {
    /// 1-based sheet row; the write-back key.
    pub index: u32,
    pub mode: RunMode,
    pub codes: Vec<String>,
    pub allowed_statuses: Option<Vec<String>>,
    pub max_process_time_minutes: Option<i64>,
    pub country_priority: Option<Vec<String>>,
    pub price_target: Option<PriceTarget>,
    pub lowest_price: String,
    pub note: String,
}

impl ConfigRow {
    pub fn new(index: u32, mode: RunMode, codes: Vec<String>) -> Self {
        Self {
            index,
            mode,
            codes,
            allowed_statuses: None,
            max_process_time_minutes: None,
            country_priority: None,
            price_target: None,
            lowest_price: String::new(),
            note: String::new(),
        }
    }
}

/// `(cell, value)` pair for the price-only fast path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub cell: String,
    pub value: String,
}
