pub mod client;

use anyhow::Result;

use crate::models::CatalogEntry;

pub use client::{CatalogClient, CatalogError};

/// Source of one country partition of the marketplace catalog.
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_all_products(&self, country_code: &str) -> Result<Vec<CatalogEntry>>;
}
