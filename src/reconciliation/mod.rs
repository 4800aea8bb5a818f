//! Reconciliation engine: decides, per configuration row, which catalog entry
//! (if any) carries the price to report, and renders the audit note.
//!
//! Everything here is pure. Fetching, sheet I/O and retries live in
//! `catalog`, `sheets` and `orchestrator`.
pub mod matching;
pub mod note;
pub mod selection;
pub mod snapshot;

use chrono::NaiveDateTime;
use indexmap::IndexMap;

use crate::models::{CellUpdate, ConfigRow, PriceTarget, RunMode};
pub use matching::{filter_valid, is_valid_entry, match_codes};
pub use note::{compose_note, NoteLanguage};
pub use selection::{select, SelectionResult};
pub use snapshot::CatalogSnapshot;

/// Rows to write back plus the price-only cell writes grouped by
/// `(spreadsheet id, sheet name)` in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOutput {
    pub updated_rows: Vec<ConfigRow>,
    pub price_updates: IndexMap<(String, String), Vec<CellUpdate>>,
}

impl ReconcileOutput {
    pub fn price_update_count(&self) -> usize {
        self.price_updates.values().map(Vec::len).sum()
    }
}

/// Computed outputs for one row, before they are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOutcome {
    pub lowest_price: String,
    pub note: String,
    pub has_winner: bool,
}

pub fn evaluate_row(
    row: &ConfigRow,
    snapshot: &CatalogSnapshot,
    now: NaiveDateTime,
    language: NoteLanguage,
) -> RowOutcome {
    let matched = match_codes(&row.codes, snapshot);
    let valid = filter_valid(row, &matched);
    let selection = select(&valid, row.country_priority.as_deref());

    RowOutcome {
        lowest_price: selection
            .winner
            .map(|winner| winner.price.to_string())
            .unwrap_or_default(),
        note: compose_note(now, selection.winner, &selection.runners_up, language),
        has_winner: selection.winner.is_some(),
    }
}

fn complete_target(target: &PriceTarget) -> bool {
    !target.sheet_id.is_empty() && !target.sheet_name.is_empty() && !target.cell.is_empty()
}

/// Reconcile a batch of rows against the cycle's snapshot.
///
/// Rows whose outputs changed are returned in `updated_rows`. `Run` rows with
/// a winner and a complete price target also produce a price-only cell write.
pub fn reconcile(
    rows: Vec<ConfigRow>,
    snapshot: &CatalogSnapshot,
    now: NaiveDateTime,
    language: NoteLanguage,
) -> ReconcileOutput {
    let mut output = ReconcileOutput::default();

    for mut row in rows {
        let outcome = evaluate_row(&row, snapshot, now, language);

        if outcome.has_winner && row.mode == RunMode::Run {
            if let Some(target) = row.price_target.as_ref().filter(|t| complete_target(t)) {
                output
                    .price_updates
                    .entry((target.sheet_id.clone(), target.sheet_name.clone()))
                    .or_default()
                    .push(CellUpdate {
                        cell: target.cell.clone(),
                        value: outcome.lowest_price.clone(),
                    });
            }
        }

        if row.lowest_price != outcome.lowest_price || row.note != outcome.note {
            row.lowest_price = outcome.lowest_price;
            row.note = outcome.note;
            output.updated_rows.push(row);
        }
    }

    output
}
