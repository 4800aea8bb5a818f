use anyhow::{Context, Result};
use tracing::info;

use price_sheet_sync::catalog::CatalogClient;
use price_sheet_sync::config::AppConfig;
use price_sheet_sync::orchestrator::run_forever;
use price_sheet_sync::sheets::GoogleSheetStore;

fn main() -> Result<()> {
    price_sheet_sync::tracing::init_tracing("price-sheet-sync")?;
    price_sheet_sync::util::env::bootstrap_cli("price-sheet-sync");

    let cfg = AppConfig::from_env()?;
    let catalog = CatalogClient::from_config(&cfg.catalog).context("building catalog client")?;
    let sheet = GoogleSheetStore::from_config(&cfg.sheet).context("building sheet store")?;

    info!(
        spreadsheet = %cfg.sheet.spreadsheet_id,
        sheet = %cfg.sheet.sheet_name,
        countries = %cfg.catalog.country_codes.join(","),
        batch_size = cfg.cycle.batch_size,
        "price sync starting"
    );

    // Every call is awaited in order; a single thread is enough.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    runtime.block_on(run_forever(&catalog, &sheet, &cfg));
    Ok(())
}
