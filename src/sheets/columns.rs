//! Static binding between configuration-row fields and sheet columns.
//!
//! Only the sheet adapter reads this table; the reconciliation core never
//! sees column letters.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowField {
    RunFlag,
    Codes,
    AllowedStatuses,
    MaxProcessTime,
    CountryPriority,
    LowestPrice,
    Note,
    TargetSheetId,
    TargetSheetName,
    TargetCell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnBinding {
    pub field: RowField,
    pub column: &'static str,
    pub written_back: bool,
}

const fn bind(field: RowField, column: &'static str, written_back: bool) -> ColumnBinding {
    ColumnBinding {
        field,
        column,
        written_back,
    }
}

/// Contiguous, left to right.
pub const ROW_COLUMNS: [ColumnBinding; 10] = [
    bind(RowField::RunFlag, "B", false),
    bind(RowField::Codes, "C", false),
    bind(RowField::AllowedStatuses, "D", false),
    bind(RowField::MaxProcessTime, "E", false),
    bind(RowField::CountryPriority, "F", false),
    bind(RowField::LowestPrice, "G", true),
    bind(RowField::Note, "H", true),
    bind(RowField::TargetSheetId, "I", false),
    bind(RowField::TargetSheetName, "J", false),
    bind(RowField::TargetCell, "K", false),
];

pub fn column_of(field: RowField) -> &'static str {
    ROW_COLUMNS
        .iter()
        .find(|binding| binding.field == field)
        .map(|binding| binding.column)
        .unwrap_or("A")
}

pub fn written_back() -> impl Iterator<Item = &'static ColumnBinding> {
    ROW_COLUMNS.iter().filter(|binding| binding.written_back)
}

/// 1-based column number for letters like `"B"` or `"AA"`.
pub fn column_index(letters: &str) -> u32 {
    letters
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .fold(0, |acc, c| acc * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1))
}

/// Inverse of [`column_index`]: 1 -> "A", 27 -> "AA".
pub fn column_letter(mut index: u32) -> String {
    let mut letters = Vec::new();
    while index > 0 {
        let rem = (index - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        index = (index - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Offset of `field` inside a row read from the first bound column.
pub fn offset_of(field: RowField) -> usize {
    let first = column_index(ROW_COLUMNS[0].column);
    (column_index(column_of(field)) - first) as usize
}

/// Sheet names are always quoted; embedded quotes are doubled.
pub fn quote_sheet_name(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// A1 range for a single cell, e.g. `'Config'!O2`.
pub fn cell_range(sheet_name: &str, cell: &str) -> String {
    format!("{}!{}", quote_sheet_name(sheet_name), cell.trim())
}

/// A1 range covering every bound column of one row, e.g. `'Config'!B5:K5`.
pub fn row_range(sheet_name: &str, index: u32) -> String {
    let first = ROW_COLUMNS[0].column;
    let last = ROW_COLUMNS[ROW_COLUMNS.len() - 1].column;
    format!("{}!{first}{index}:{last}{index}", quote_sheet_name(sheet_name))
}

/// Whole-column range for a 1-based column number, e.g. `'Config'!B:B`.
pub fn column_range(sheet_name: &str, column: u32) -> String {
    let letter = column_letter(column);
    format!("{}!{letter}:{letter}", quote_sheet_name(sheet_name))
}
