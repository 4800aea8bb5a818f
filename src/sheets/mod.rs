pub mod auth;
pub mod client;
pub mod columns;
pub mod rows;

use anyhow::Result;
use thiserror::Error;

use crate::models::{CellUpdate, ConfigRow};

pub use client::GoogleSheetStore;

#[derive(Error, Debug)]
pub enum SheetsError {
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("network: {0}")]
    Net(#[from] reqwest::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("auth: {0}")]
    Auth(String),
    #[error("jwt: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("reading key file {path}: {source}")]
    KeyFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Backing store for configuration rows and their write-back fields.
#[async_trait::async_trait]
pub trait SheetStore: Send + Sync {
    /// 1-based rows whose run-flag cell in `column_index` is a recognised flag.
    async fn get_runnable_row_indexes(&self, column_index: u32) -> Result<Vec<u32>>;

    /// Rows in the order of `indexes`; rows whose flag was cleared since are dropped.
    async fn batch_get_rows(&self, indexes: &[u32]) -> Result<Vec<ConfigRow>>;

    /// Write the output fields of every row.
    async fn batch_update_rows(&self, rows: &[ConfigRow]) -> Result<()>;

    /// Price-only fast path into an arbitrary spreadsheet/sheet.
    async fn batch_update_cells(&self, sheet_id: &str, sheet_name: &str, updates: &[CellUpdate]) -> Result<()>;

    /// Raw value of one cell on the configuration sheet; `None` when blank.
    async fn get_cell_value(&self, cell: &str) -> Result<Option<String>>;
}
