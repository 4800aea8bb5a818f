//! Sync cycle: snapshot the catalog, walk the runnable rows in batches, push
//! the results back, then rest for the operator-controlled relax interval.
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use tracing::{debug, error, info, warn};

use crate::catalog::CatalogSource;
use crate::config::AppConfig;
use crate::reconciliation::snapshot::fetch_snapshot;
use crate::reconciliation::{reconcile, CatalogSnapshot, NoteLanguage};
use crate::sheets::SheetStore;

pub const DEFAULT_RELAX: Duration = Duration::from_secs(10);

/// Relax-cell value in seconds; blank, unreadable or negative means 10s.
pub fn parse_relax_seconds(raw: Option<&str>) -> Duration {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return DEFAULT_RELAX;
    };
    match raw.parse::<f64>() {
        Ok(secs) => Duration::try_from_secs_f64(secs).unwrap_or_else(|_| {
            warn!(value = %raw, "relax time out of range; using default");
            DEFAULT_RELAX
        }),
        Err(_) => {
            warn!(value = %raw, "relax time is not a number; using default");
            DEFAULT_RELAX
        }
    }
}

pub async fn sleep_for(what: &str, duration: Duration) {
    if duration.is_zero() {
        return;
    }
    debug!(what, secs = duration.as_secs_f64(), "sleeping");
    tokio::time::sleep(duration).await;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub rows_read: usize,
    pub rows_updated: usize,
    pub price_updates: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleSummary {
    pub catalog_codes: usize,
    pub runnable_rows: usize,
    pub batches: usize,
    pub rows_updated: usize,
    pub price_updates: usize,
    pub relax: Duration,
}

/// Read one batch of rows, reconcile, and write results.
///
/// Price-only writes go first, one call per target sheet, then the row
/// outputs in a single call.
pub async fn process_batch<S>(
    store: &S,
    snapshot: &CatalogSnapshot,
    indexes: &[u32],
    now: NaiveDateTime,
    language: NoteLanguage,
) -> Result<BatchSummary>
where
    S: SheetStore + ?Sized,
{
    let rows = store.batch_get_rows(indexes).await?;
    let rows_read = rows.len();
    let output = reconcile(rows, snapshot, now, language);

    for ((sheet_id, sheet_name), updates) in &output.price_updates {
        store
            .batch_update_cells(sheet_id, sheet_name, updates)
            .await
            .with_context(|| format!("price update for {sheet_id}/{sheet_name}"))?;
    }
    if !output.updated_rows.is_empty() {
        store.batch_update_rows(&output.updated_rows).await?;
    }

    Ok(BatchSummary {
        rows_read,
        rows_updated: output.updated_rows.len(),
        price_updates: output.price_update_count(),
    })
}

pub async fn run_cycle<C, S>(source: &C, store: &S, cfg: &AppConfig) -> Result<CycleSummary>
where
    C: CatalogSource + ?Sized,
    S: SheetStore + ?Sized,
{
    let cycle = &cfg.cycle;
    let snapshot = fetch_snapshot(source, &cfg.catalog.country_codes, &cycle.fetch_retry).await?;

    let indexes = cycle
        .sheet_retry
        .run("runnable rows", || {
            store.get_runnable_row_indexes(cfg.sheet.run_flag_column)
        })
        .await
        .context("listing runnable rows")?;

    let mut summary = CycleSummary {
        catalog_codes: snapshot.len(),
        runnable_rows: indexes.len(),
        ..CycleSummary::default()
    };

    for (batch_no, chunk) in indexes.chunks(cycle.batch_size.max(1)).enumerate() {
        let batch = cycle
            .batch_retry
            .run("process batch", || {
                process_batch(
                    store,
                    &snapshot,
                    chunk,
                    Local::now().naive_local(),
                    cycle.note_language,
                )
            })
            .await
            .with_context(|| format!("batch {} ({} rows)", batch_no + 1, chunk.len()))?;
        info!(
            batch = batch_no + 1,
            rows = batch.rows_read,
            updated = batch.rows_updated,
            prices = batch.price_updates,
            "batch done"
        );
        summary.batches += 1;
        summary.rows_updated += batch.rows_updated;
        summary.price_updates += batch.price_updates;
        sleep_for("batch relax", cycle.relax_each_batch).await;
    }

    let raw_relax = cycle
        .sheet_retry
        .run("relax cell", || store.get_cell_value(&cfg.sheet.relax_cell))
        .await
        .context("reading relax time")?;
    summary.relax = parse_relax_seconds(raw_relax.as_deref());

    info!(
        codes = summary.catalog_codes,
        runnable = summary.runnable_rows,
        batches = summary.batches,
        updated = summary.rows_updated,
        prices = summary.price_updates,
        relax_secs = summary.relax.as_secs_f64(),
        "cycle complete"
    );
    Ok(summary)
}

/// Run cycles until the process is stopped, resting for the relax-cell
/// interval between them. A failed cycle is logged and restarted after
/// `error_relax`.
pub async fn run_forever<C, S>(source: &C, store: &S, cfg: &AppConfig)
where
    C: CatalogSource + ?Sized,
    S: SheetStore + ?Sized,
{
    let mut cycle_no: u64 = 0;
    loop {
        cycle_no += 1;
        info!(cycle = cycle_no, "cycle start");
        match run_cycle(source, store, cfg).await {
            Ok(summary) => sleep_for("cycle relax", summary.relax).await,
            Err(e) => {
                error!(cycle = cycle_no, error = %format!("{e:#}"), "cycle failed");
                sleep_for("error relax", cfg.cycle.error_relax).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use crate::config::{CatalogConfig, CycleConfig, SheetConfig};
    use crate::models::{CatalogEntry, CellUpdate, ConfigRow, PriceTarget, RunMode};
    use crate::reconciliation::testing::{codes, entry};
    use crate::util::retry::RetryPolicy;

    struct FakeCatalog {
        partitions: HashMap<String, Vec<CatalogEntry>>,
    }

    #[async_trait::async_trait]
    impl CatalogSource for FakeCatalog {
        async fn fetch_all_products(&self, country_code: &str) -> Result<Vec<CatalogEntry>> {
            Ok(self.partitions.get(country_code).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct FakeSheet {
        rows: Mutex<BTreeMap<u32, ConfigRow>>,
        cell_writes: Mutex<Vec<(String, String, Vec<CellUpdate>)>>,
        row_writes: Mutex<Vec<u32>>,
        relax: Option<String>,
        failing_reads: AtomicU32,
    }

    #[async_trait::async_trait]
    impl SheetStore for FakeSheet {
        async fn get_runnable_row_indexes(&self, _column_index: u32) -> Result<Vec<u32>> {
            Ok(self.rows.lock().unwrap().keys().copied().collect())
        }

        async fn batch_get_rows(&self, indexes: &[u32]) -> Result<Vec<ConfigRow>> {
            if self.failing_reads.load(Ordering::SeqCst) > 0 {
                self.failing_reads.fetch_sub(1, Ordering::SeqCst);
                anyhow::bail!("quota exceeded");
            }
            let rows = self.rows.lock().unwrap();
            Ok(indexes.iter().filter_map(|i| rows.get(i).cloned()).collect())
        }

        async fn batch_update_rows(&self, rows: &[ConfigRow]) -> Result<()> {
            let mut stored = self.rows.lock().unwrap();
            for row in rows {
                self.row_writes.lock().unwrap().push(row.index);
                stored.insert(row.index, row.clone());
            }
            Ok(())
        }

        async fn batch_update_cells(
            &self,
            sheet_id: &str,
            sheet_name: &str,
            updates: &[CellUpdate],
        ) -> Result<()> {
            self.cell_writes.lock().unwrap().push((
                sheet_id.to_string(),
                sheet_name.to_string(),
                updates.to_vec(),
            ));
            Ok(())
        }

        async fn get_cell_value(&self, _cell: &str) -> Result<Option<String>> {
            Ok(self.relax.clone())
        }
    }

    fn test_config(batch_size: usize) -> AppConfig {
        AppConfig {
            catalog: CatalogConfig {
                base_url: "http://catalog.test".to_string(),
                api_key: "k".to_string(),
                country_codes: codes(&["th", "vn"]),
                timeout: Duration::from_secs(1),
            },
            sheet: SheetConfig {
                keys_path: PathBuf::from("keys.json"),
                spreadsheet_id: "cfg".to_string(),
                sheet_name: "Config".to_string(),
                run_flag_column: 2,
                relax_cell: "O2".to_string(),
                timeout: Duration::from_secs(1),
            },
            cycle: CycleConfig {
                batch_size,
                relax_each_batch: Duration::ZERO,
                error_relax: Duration::ZERO,
                fetch_retry: RetryPolicy::new(2, Duration::ZERO),
                batch_retry: RetryPolicy::new(3, Duration::ZERO),
                sheet_retry: RetryPolicy::new(2, Duration::ZERO),
                ..CycleConfig::default()
            },
        }
    }

    fn catalog() -> FakeCatalog {
        let mut partitions = HashMap::new();
        partitions.insert("th".to_string(), vec![entry("A", 100, "th"), entry("B", 80, "th")]);
        partitions.insert("vn".to_string(), vec![entry("C", 120, "vn")]);
        FakeCatalog { partitions }
    }

    fn row(index: u32, mode: RunMode, row_codes: &[&str], target: Option<(&str, &str, &str)>) -> ConfigRow {
        let mut row = ConfigRow::new(index, mode, codes(row_codes));
        row.price_target = target.map(|(id, name, cell)| PriceTarget {
            sheet_id: id.to_string(),
            sheet_name: name.to_string(),
            cell: cell.to_string(),
        });
        row
    }

    fn sheet(rows: Vec<ConfigRow>) -> FakeSheet {
        FakeSheet {
            rows: Mutex::new(rows.into_iter().map(|r| (r.index, r)).collect()),
            relax: Some("0".to_string()),
            ..FakeSheet::default()
        }
    }

    #[test]
    fn relax_cell_defaults() {
        assert_eq!(parse_relax_seconds(None), DEFAULT_RELAX);
        assert_eq!(parse_relax_seconds(Some("  ")), DEFAULT_RELAX);
        assert_eq!(parse_relax_seconds(Some("soon")), DEFAULT_RELAX);
        assert_eq!(parse_relax_seconds(Some("-5")), DEFAULT_RELAX);
        assert_eq!(parse_relax_seconds(Some("NaN")), DEFAULT_RELAX);
        assert_eq!(parse_relax_seconds(Some("2.5")), Duration::from_millis(2500));
        assert_eq!(parse_relax_seconds(Some("0")), Duration::ZERO);
    }

    #[tokio::test]
    async fn cycle_groups_price_updates_and_skips_check_rows() {
        let store = sheet(vec![
            row(4, RunMode::Run, &["A", "B"], Some(("t1", "Prices", "C4"))),
            row(5, RunMode::Run, &["C"], Some(("t1", "Prices", "C5"))),
            row(6, RunMode::Check, &["A"], Some(("t1", "Prices", "C6"))),
            row(7, RunMode::Run, &["A"], Some(("t2", "Other", "D1"))),
            row(8, RunMode::Run, &["ZZZ"], Some(("t1", "Prices", "C8"))),
        ]);
        let summary = run_cycle(&catalog(), &store, &test_config(2)).await.unwrap();

        assert_eq!(summary.runnable_rows, 5);
        assert_eq!(summary.batches, 3);
        assert_eq!(summary.catalog_codes, 3);
        assert_eq!(summary.rows_updated, 5);
        assert_eq!(summary.price_updates, 3);
        assert_eq!(summary.relax, Duration::ZERO);

        let writes = store.cell_writes.lock().unwrap();
        let t1: Vec<&CellUpdate> = writes
            .iter()
            .filter(|(id, name, _)| id == "t1" && name == "Prices")
            .flat_map(|(_, _, updates)| updates)
            .collect();
        assert_eq!(
            t1.iter().map(|u| (u.cell.as_str(), u.value.as_str())).collect::<Vec<_>>(),
            vec![("C4", "80"), ("C5", "120")]
        );
        assert!(writes.iter().all(|(_, _, updates)| updates.iter().all(|u| u.cell != "C6")));

        let rows = store.rows.lock().unwrap();
        assert_eq!(rows[&4].lowest_price, "80");
        assert_eq!(rows[&6].lowest_price, "100");
        assert_eq!(rows[&8].lowest_price, "");
        assert!(rows[&8].note.contains("Không tìm thấy product hợp lệ"));
    }

    #[tokio::test]
    async fn transient_batch_failure_is_retried() {
        let store = sheet(vec![row(4, RunMode::Check, &["A"], None)]);
        store.failing_reads.store(2, Ordering::SeqCst);
        let summary = run_cycle(&catalog(), &store, &test_config(10)).await.unwrap();
        assert_eq!(summary.rows_updated, 1);
        assert_eq!(store.failing_reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn exhausted_batch_retries_fail_the_cycle() {
        let store = sheet(vec![row(4, RunMode::Check, &["A"], None)]);
        store.failing_reads.store(5, Ordering::SeqCst);
        let err = run_cycle(&catalog(), &store, &test_config(10)).await.unwrap_err();
        assert!(format!("{err:#}").contains("quota exceeded"));
        assert!(store.row_writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unchanged_prices_still_push_fast_path_but_not_rows() {
        let store = sheet(vec![row(4, RunMode::Run, &["A"], Some(("t1", "Prices", "C4")))]);
        let snapshot = CatalogSnapshot::from_partitions(vec![("th".to_string(), vec![entry("A", 100, "th")])]);
        let now = crate::reconciliation::testing::fixed_now();

        let first = process_batch(&store, &snapshot, &[4], now, NoteLanguage::English).await.unwrap();
        assert_eq!(first.rows_updated, 1);
        let second = process_batch(&store, &snapshot, &[4], now, NoteLanguage::English).await.unwrap();
        assert_eq!(second.rows_updated, 0);
        assert_eq!(second.price_updates, 1);
        assert_eq!(store.row_writes.lock().unwrap().len(), 1);
        assert_eq!(store.cell_writes.lock().unwrap().len(), 2);
    }
}
