use tracing::warn;

use crate::models::{ConfigRow, PriceTarget, RunMode};

use super::columns::{offset_of, RowField};

const SEPARATOR: char = ',';

/// Split a comma-separated cell, trimming each item and dropping blanks.
pub fn split_cell_list(raw: &str) -> Vec<String> {
    raw.split(SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// `None` for a blank cell, otherwise the split list.
pub fn optional_list(raw: &str) -> Option<Vec<String>> {
    let items = split_cell_list(raw);
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Accepts `15` and `15.0`. Zero means no limit; anything unreadable is
/// treated as unset.
pub fn optional_minutes(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let minutes = match trimmed.parse::<i64>() {
        Ok(v) => v,
        Err(_) => match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() && v.fract() == 0.0 => v as i64,
            _ => {
                warn!(value = %trimmed, "unreadable max process time; treating as unset");
                return None;
            }
        },
    };
    (minutes != 0).then_some(minutes)
}

fn cell<'a>(cells: &'a [String], field: RowField) -> &'a str {
    cells.get(offset_of(field)).map(|s| s.trim()).unwrap_or("")
}

/// Decode one sheet row read from the first bound column onward.
///
/// Returns `None` when the run flag is not recognised. Missing trailing
/// cells read as blank.
pub fn row_from_cells(index: u32, cells: &[String]) -> Option<ConfigRow> {
    let mode = RunMode::from_cell(cell(cells, RowField::RunFlag))?;

    let target = PriceTarget {
        sheet_id: cell(cells, RowField::TargetSheetId).to_string(),
        sheet_name: cell(cells, RowField::TargetSheetName).to_string(),
        cell: cell(cells, RowField::TargetCell).to_string(),
    };
    let has_target =
        !target.sheet_id.is_empty() || !target.sheet_name.is_empty() || !target.cell.is_empty();

    Some(ConfigRow {
        index,
        mode,
        codes: split_cell_list(cell(cells, RowField::Codes)),
        allowed_statuses: optional_list(cell(cells, RowField::AllowedStatuses)),
        max_process_time_minutes: optional_minutes(cell(cells, RowField::MaxProcessTime)),
        country_priority: optional_list(cell(cells, RowField::CountryPriority)),
        price_target: has_target.then_some(target),
        lowest_price: cell(cells, RowField::LowestPrice).to_string(),
        note: cell(cells, RowField::Note).to_string(),
    })
}

/// Value written back for an output field.
pub fn output_value(row: &ConfigRow, field: RowField) -> Option<&str> {
    match field {
        RowField::LowestPrice => Some(row.lowest_price.as_str()),
        RowField::Note => Some(row.note.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::is_valid_entry;
    use crate::reconciliation::testing::entry_with;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn decodes_full_row() {
        let row = row_from_cells(
            12,
            &cells(&[
                "1",
                "A, B ,,A",
                "available,limited",
                "30",
                "vn, th",
                "120",
                "old note",
                "target-sheet",
                "Prices",
                "C7",
            ]),
        )
        .unwrap();

        assert_eq!(row.index, 12);
        assert_eq!(row.mode, RunMode::Run);
        assert_eq!(row.codes, vec!["A", "B", "A"]);
        assert_eq!(row.allowed_statuses, Some(cells(&["available", "limited"])));
        assert_eq!(row.max_process_time_minutes, Some(30));
        assert_eq!(row.country_priority, Some(cells(&["vn", "th"])));
        assert_eq!(row.lowest_price, "120");
        assert_eq!(row.note, "old note");
        let target = row.price_target.unwrap();
        assert_eq!(target.cell, "C7");
    }

    #[test]
    fn short_row_reads_blanks() {
        let row = row_from_cells(4, &cells(&["2", "A"])).unwrap();
        assert_eq!(row.mode, RunMode::Check);
        assert_eq!(row.allowed_statuses, None);
        assert_eq!(row.max_process_time_minutes, None);
        assert_eq!(row.country_priority, None);
        assert_eq!(row.price_target, None);
        assert_eq!(row.lowest_price, "");
    }

    #[test]
    fn unknown_run_flag_is_skipped() {
        assert!(row_from_cells(4, &cells(&["", "A"])).is_none());
        assert!(row_from_cells(4, &cells(&["yes", "A"])).is_none());
        assert!(row_from_cells(4, &[]).is_none());
    }

    #[test]
    fn minutes_accept_float_formatting() {
        assert_eq!(optional_minutes("15.0"), Some(15));
        assert_eq!(optional_minutes(" 0 "), None);
        assert_eq!(optional_minutes("0.0"), None);
        assert_eq!(optional_minutes("15.5"), None);
        assert_eq!(optional_minutes("soon"), None);
    }

    #[test]
    fn zero_max_process_time_leaves_row_unconstrained() {
        let row = row_from_cells(9, &cells(&["1", "A", "", "0"])).unwrap();
        assert_eq!(row.max_process_time_minutes, None);
        let offer = entry_with("A", 10, "th", "ok", 5);
        assert!(is_valid_entry(&row, &offer));
    }

    #[test]
    fn outputs_map_to_fields() {
        let mut row = ConfigRow::new(3, RunMode::Run, Vec::new());
        row.lowest_price = "99".to_string();
        assert_eq!(output_value(&row, RowField::LowestPrice), Some("99"));
        assert_eq!(output_value(&row, RowField::Codes), None);
    }
}
