use std::time::{Duration, Instant};

use reqwest::{header, Client};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::CatalogConfig;
use crate::models::CatalogEntry;
use crate::util::text::truncate_for_log;

use super::CatalogSource;

const PRODUCTS_PATH: &str = "/api/v1/products";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("http {status} for {country}: {body}")]
    Http {
        country: String,
        status: u16,
        body: String,
    },
    #[error("network: {0}")]
    Net(#[from] reqwest::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub code: String,
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct ProductList {
    #[serde(default)]
    pub products: Vec<CatalogEntry>,
}

/// HTTP client for the marketplace product catalog.
///
/// One call returns the whole partition for a country code.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl CatalogClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let http = Client::builder()
            .user_agent(concat!("price-sheet-sync/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http,
        })
    }

    pub fn from_config(cfg: &CatalogConfig) -> Result<Self, CatalogError> {
        Self::new(&cfg.base_url, &cfg.api_key, cfg.timeout)
    }

    pub fn products_url(&self) -> String {
        format!("{}{}", self.base_url, PRODUCTS_PATH)
    }

    /// Fetch and decode the product list for one country.
    pub async fn get_all_products(&self, country_code: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
        let url = self.products_url();
        let t0 = Instant::now();
        let resp = self
            .http
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(&self.api_key)
            .query(&[("country_code", country_code)])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(CatalogError::Http {
                country: country_code.to_string(),
                status: status.as_u16(),
                body: truncate_for_log(body, 500),
            });
        }

        let parsed = parse_products(&body)?;
        info!(
            country = %country_code,
            products = parsed.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "catalog partition fetched"
        );
        Ok(parsed)
    }
}

pub fn parse_products(body: &str) -> Result<Vec<CatalogEntry>, serde_json::Error> {
    let resp: ApiResponse<ProductList> = serde_json::from_str(body)?;
    debug!(code = %resp.code, products = resp.data.products.len(), "catalog response decoded");
    Ok(resp.data.products)
}

#[async_trait::async_trait]
impl CatalogSource for CatalogClient {
    async fn fetch_all_products(&self, country_code: &str) -> anyhow::Result<Vec<CatalogEntry>> {
        Ok(self.get_all_products(country_code).await?)
    }
}
