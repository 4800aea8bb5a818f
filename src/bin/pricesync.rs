use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::info;

use price_sheet_sync::catalog::{CatalogClient, CatalogSource};
use price_sheet_sync::config::AppConfig;
use price_sheet_sync::orchestrator::run_cycle;
use price_sheet_sync::reconciliation::evaluate_row;
use price_sheet_sync::reconciliation::snapshot::fetch_snapshot;
use price_sheet_sync::sheets::{GoogleSheetStore, SheetStore};
use price_sheet_sync::util::env;
use price_sheet_sync::{CatalogSnapshot, RunMode};

#[derive(Parser, Debug)]
#[command(name = "pricesync", version, about = "Lowest-price sheet sync operator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Run a single sync cycle and exit (no relax sleep at the end)
    Once,
    /// Fetch every catalog partition and print entry counts
    CatalogCounts {
        /// Override the configured country list
        #[arg(long, value_delimiter = ',')]
        countries: Option<Vec<String>>,
    },
    /// Reconcile one sheet row against a fresh snapshot without writing anything
    PreviewRow {
        /// 1-based sheet row
        #[arg(long)]
        index: u32,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    price_sheet_sync::tracing::init_tracing("pricesync")?;
    env::bootstrap_cli("pricesync");

    let cli = Cli::parse();
    let cfg = AppConfig::from_env()?;
    let catalog = CatalogClient::from_config(&cfg.catalog).context("building catalog client")?;

    match cli.command {
        Commands::Once => {
            let sheet = GoogleSheetStore::from_config(&cfg.sheet)?;
            let summary = run_cycle(&catalog, &sheet, &cfg).await?;
            println!(
                "cycle: codes={} runnable={} batches={} updated={} prices={} next_relax={:.1}s",
                summary.catalog_codes,
                summary.runnable_rows,
                summary.batches,
                summary.rows_updated,
                summary.price_updates,
                summary.relax.as_secs_f64()
            );
        }
        Commands::CatalogCounts { countries } => {
            let countries = countries.unwrap_or_else(|| cfg.catalog.country_codes.clone());
            let mut snapshot = CatalogSnapshot::new();
            let mut total = 0usize;
            for country in &countries {
                let entries = cfg
                    .cycle
                    .fetch_retry
                    .run("catalog fetch", || catalog.fetch_all_products(country))
                    .await
                    .with_context(|| format!("fetching {country}"))?;
                total += entries.len();
                println!("{country:>4} {:>8}", entries.len());
                snapshot.insert_partition(country, entries);
            }
            println!("{:>4} {:>8}", "all", total);
            println!("{:>4} {:>8}", "uniq", snapshot.len());
        }
        Commands::PreviewRow { index } => {
            let sheet = GoogleSheetStore::from_config(&cfg.sheet)?;
            let snapshot =
                fetch_snapshot(&catalog, &cfg.catalog.country_codes, &cfg.cycle.fetch_retry)
                    .await?;
            let rows = sheet.batch_get_rows(&[index]).await?;
            let Some(row) = rows.into_iter().next() else {
                println!("row {index} has no run flag; nothing to preview");
                return Ok(());
            };
            info!(index, codes = row.codes.len(), "previewing row");
            let outcome = evaluate_row(
                &row,
                &snapshot,
                Local::now().naive_local(),
                cfg.cycle.note_language,
            );
            println!("row:          {index} (mode {})", row.mode.as_cell());
            println!("codes:        {}", row.codes.join(","));
            println!("current:      {:?}", row.lowest_price);
            println!("lowest price: {:?}", outcome.lowest_price);
            if let (RunMode::Run, true, Some(target)) =
                (row.mode, outcome.has_winner, row.price_target.as_ref())
            {
                println!(
                    "price target: {}/{}!{}",
                    target.sheet_id, target.sheet_name, target.cell
                );
            }
            println!("note:\n{}", outcome.note);
        }
    }
    Ok(())
}
