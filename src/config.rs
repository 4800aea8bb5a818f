use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::reconciliation::NoteLanguage;
use crate::util::env::{env_list, env_opt, env_parse, env_req};
use crate::util::retry::RetryPolicy;

/// Marketplace partitions fetched every cycle, in merge order.
pub const DEFAULT_COUNTRY_CODES: [&str; 7] = ["id", "my", "ph", "th", "us", "br", "vn"];
pub const DEFAULT_CATALOG_BASE_URL: &str = "https://www.lapakgaming.com";
pub const DEFAULT_RELAX_CELL: &str = "O2";
/// Column B holds the run flag.
pub const DEFAULT_RUN_FLAG_COLUMN: u32 = 2;

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    pub api_key: String,
    pub country_codes: Vec<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SheetConfig {
    pub keys_path: PathBuf,
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub run_flag_column: u32,
    pub relax_cell: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CycleConfig {
    pub batch_size: usize,
    pub relax_each_batch: Duration,
    pub error_relax: Duration,
    pub note_language: NoteLanguage,
    pub fetch_retry: RetryPolicy,
    pub batch_retry: RetryPolicy,
    pub sheet_retry: RetryPolicy,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            relax_each_batch: Duration::from_secs(5),
            error_relax: Duration::from_secs(10),
            note_language: NoteLanguage::default(),
            fetch_retry: RetryPolicy::new(3, Duration::from_secs(10)),
            batch_retry: RetryPolicy::new(5, Duration::from_secs(10)),
            sheet_retry: RetryPolicy::new(5, Duration::from_secs(10)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub sheet: SheetConfig,
    pub cycle: CycleConfig,
}

fn secs(key: &str, default: f64) -> Duration {
    let raw: f64 = env_parse(key, default);
    Duration::try_from_secs_f64(raw).unwrap_or_else(|_| Duration::from_secs_f64(default))
}

fn retry(prefix: &str, attempts: u32, delay_secs: f64) -> RetryPolicy {
    RetryPolicy::new(
        env_parse(&format!("{prefix}_ATTEMPTS"), attempts),
        secs(&format!("{prefix}_DELAY_SECS"), delay_secs),
    )
}

impl AppConfig {
    /// Assemble the configuration from the process environment (and `.env`).
    pub fn from_env() -> Result<Self> {
        let http_timeout = secs("HTTP_TIMEOUT_SECS", 30.0);

        let catalog = CatalogConfig {
            base_url: env_opt("CATALOG_BASE_URL")
                .unwrap_or_else(|| DEFAULT_CATALOG_BASE_URL.to_string()),
            api_key: env_req("CATALOG_API_KEY")?,
            country_codes: env_list("CATALOG_COUNTRY_CODES", &DEFAULT_COUNTRY_CODES),
            timeout: http_timeout,
        };

        let sheet = SheetConfig {
            keys_path: PathBuf::from(env_req("KEYS_PATH")?),
            spreadsheet_id: env_req("SPREADSHEET_KEY")?,
            sheet_name: env_req("SHEET_NAME")?,
            run_flag_column: env_parse("RUN_FLAG_COLUMN", DEFAULT_RUN_FLAG_COLUMN),
            relax_cell: env_opt("RELAX_TIME_CELL").unwrap_or_else(|| DEFAULT_RELAX_CELL.to_string()),
            timeout: http_timeout,
        };

        let defaults = CycleConfig::default();
        let note_language = match env_opt("NOTE_LANGUAGE") {
            Some(raw) => raw.parse().context("NOTE_LANGUAGE")?,
            None => defaults.note_language,
        };
        let cycle = CycleConfig {
            batch_size: env_parse("PROCESS_BATCH_SIZE", defaults.batch_size).max(1),
            relax_each_batch: secs("RELAX_TIME_EACH_BATCH", 5.0),
            error_relax: secs("CYCLE_ERROR_RELAX_SECS", 10.0),
            note_language,
            fetch_retry: retry("FETCH_RETRY", 3, 10.0),
            batch_retry: retry("BATCH_RETRY", 5, 10.0),
            sheet_retry: retry("SHEET_RETRY", 5, 10.0),
        };

        Ok(Self {
            catalog,
            sheet,
            cycle,
        })
    }
}
