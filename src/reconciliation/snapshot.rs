use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::info;

use crate::catalog::CatalogSource;
use crate::models::CatalogEntry;
use crate::util::retry::RetryPolicy;

/// Code-indexed view over every country partition fetched in one cycle.
///
/// Codes are only unique within a partition. When two partitions carry the
/// same code, the partition inserted later replaces the earlier entry.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    entries: HashMap<String, CatalogEntry>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge partitions in iteration order (last write wins per code).
    pub fn from_partitions<I>(partitions: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<CatalogEntry>)>,
    {
        let mut snapshot = Self::new();
        for (country_code, entries) in partitions {
            snapshot.insert_partition(&country_code, entries);
        }
        snapshot
    }

    pub fn insert_partition(&mut self, country_code: &str, entries: Vec<CatalogEntry>) {
        info!(country = %country_code, products = entries.len(), "catalog partition merged");
        for entry in entries {
            self.entries.insert(entry.code.clone(), entry);
        }
    }

    pub fn get(&self, code: &str) -> Option<&CatalogEntry> {
        self.entries.get(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetch every configured partition one after another and merge them.
///
/// Each partition fetch runs under `retry`; an exhausted fetch aborts the
/// whole snapshot.
pub async fn fetch_snapshot<C>(
    source: &C,
    country_codes: &[String],
    retry: &RetryPolicy,
) -> Result<CatalogSnapshot>
where
    C: CatalogSource + ?Sized,
{
    let mut snapshot = CatalogSnapshot::new();
    let mut fetched = 0usize;
    for country_code in country_codes {
        let entries = retry
            .run("catalog fetch", || source.fetch_all_products(country_code))
            .await
            .with_context(|| format!("fetching catalog partition {country_code}"))?;
        fetched += entries.len();
        snapshot.insert_partition(country_code, entries);
    }
    info!(fetched, unique_codes = snapshot.len(), "catalog snapshot built");
    Ok(snapshot)
}
