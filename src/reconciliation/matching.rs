use crate::models::{CatalogEntry, ConfigRow};
use crate::reconciliation::snapshot::CatalogSnapshot;

/// Resolve `codes` against the snapshot, keeping the row's order.
///
/// Unknown codes are skipped. A code listed twice yields the entry twice.
pub fn match_codes<'a>(codes: &[String], snapshot: &'a CatalogSnapshot) -> Vec<&'a CatalogEntry> {
    codes
        .iter()
        .filter_map(|code| snapshot.get(code))
        .collect()
}

/// Whether `entry` satisfies the row's status and process-time constraints.
pub fn is_valid_entry(row: &ConfigRow, entry: &CatalogEntry) -> bool {
    if let Some(allowed) = &row.allowed_statuses {
        if !allowed.iter().any(|status| *status == entry.status) {
            return false;
        }
    }

    if let Some(max_minutes) = row.max_process_time_minutes {
        if entry.process_time_minutes > max_minutes {
            return false;
        }
    }

    true
}

pub fn filter_valid<'a>(row: &ConfigRow, entries: &[&'a CatalogEntry]) -> Vec<&'a CatalogEntry> {
    entries
        .iter()
        .copied()
        .filter(|entry| is_valid_entry(row, entry))
        .collect()
}
