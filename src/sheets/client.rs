use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::SheetConfig;
use crate::models::{CellUpdate, ConfigRow, RunMode};
use crate::util::text::truncate_for_log;

use super::auth::{ServiceAccountAuth, ServiceAccountKey};
use super::columns::{self, cell_range, column_range, row_range};
use super::rows::{output_value, row_from_cells};
use super::{SheetStore, SheetsError};

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchGetResponse {
    #[serde(default)]
    value_ranges: Vec<ValueRange>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WriteRange {
    range: String,
    values: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateRequest {
    value_input_option: &'static str,
    data: Vec<WriteRange>,
}

/// Cells come back as strings for formatted reads, but numbers and booleans
/// are tolerated.
pub fn cell_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn first_row(range: &ValueRange) -> Vec<String> {
    range
        .values
        .first()
        .map(|row| row.iter().map(cell_to_string).collect())
        .unwrap_or_default()
}

/// Google Sheets v4 values API bound to one configuration sheet.
pub struct GoogleSheetStore {
    http: Client,
    auth: Arc<ServiceAccountAuth>,
    base_url: String,
    spreadsheet_id: String,
    sheet_name: String,
}

impl GoogleSheetStore {
    pub fn new(
        auth: Arc<ServiceAccountAuth>,
        http: Client,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> Self {
        Self {
            http,
            auth,
            base_url: SHEETS_BASE_URL.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_name: sheet_name.to_string(),
        }
    }

    pub fn from_config(cfg: &SheetConfig) -> Result<Self, SheetsError> {
        let http = Client::builder()
            .user_agent(concat!("price-sheet-sync/", env!("CARGO_PKG_VERSION")))
            .timeout(cfg.timeout)
            .build()?;
        let key = ServiceAccountKey::from_file(&cfg.keys_path)?;
        let auth = ServiceAccountAuth::new(key, http.clone())?;
        info!(account = %auth.client_email(), sheet = %cfg.sheet_name, "sheet store ready");
        Ok(Self::new(
            Arc::new(auth),
            http,
            &cfg.spreadsheet_id,
            &cfg.sheet_name,
        ))
    }

    async fn send(&self, req: RequestBuilder, what: &str) -> Result<String, SheetsError> {
        let token = self.auth.access_token().await?;
        let t0 = Instant::now();
        let resp = req.bearer_auth(token).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        debug!(op = what, status = status.as_u16(), elapsed_ms = t0.elapsed().as_millis() as u64, "sheets call");
        if !status.is_success() {
            if status.as_u16() == 429 {
                warn!(op = what, "sheets quota exceeded");
            }
            return Err(SheetsError::Http {
                status: status.as_u16(),
                body: truncate_for_log(body, 500),
            });
        }
        Ok(body)
    }

    pub async fn values_get(
        &self,
        spreadsheet_id: &str,
        range: &str,
        major_dimension: &str,
    ) -> Result<ValueRange, SheetsError> {
        let url = format!(
            "{}/{}/values/{}",
            self.base_url,
            spreadsheet_id,
            urlencoding::encode(range)
        );
        let req = self.http.get(url).query(&[("majorDimension", major_dimension)]);
        let body = self.send(req, "values.get").await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn values_batch_get(
        &self,
        spreadsheet_id: &str,
        ranges: &[String],
    ) -> Result<Vec<ValueRange>, SheetsError> {
        let url = format!("{}/{}/values:batchGet", self.base_url, spreadsheet_id);
        let mut query: Vec<(&str, &str)> = ranges.iter().map(|r| ("ranges", r.as_str())).collect();
        query.push(("majorDimension", "ROWS"));
        let req = self.http.get(url).query(&query);
        let body = self.send(req, "values.batchGet").await?;
        let parsed: BatchGetResponse = serde_json::from_str(&body)?;
        Ok(parsed.value_ranges)
    }

    async fn values_batch_update(
        &self,
        spreadsheet_id: &str,
        data: Vec<WriteRange>,
    ) -> Result<(), SheetsError> {
        if data.is_empty() {
            return Ok(());
        }
        let url = format!("{}/{}/values:batchUpdate", self.base_url, spreadsheet_id);
        let payload = BatchUpdateRequest {
            value_input_option: "USER_ENTERED",
            data,
        };
        let req = self.http.post(url).json(&payload);
        self.send(req, "values.batchUpdate").await?;
        Ok(())
    }
}

fn single(range: String, value: &str) -> WriteRange {
    WriteRange {
        range,
        values: vec![vec![value.to_string()]],
    }
}

#[async_trait::async_trait]
impl SheetStore for GoogleSheetStore {
    async fn get_runnable_row_indexes(&self, column_index: u32) -> anyhow::Result<Vec<u32>> {
        let range = column_range(&self.sheet_name, column_index);
        let column = self
            .values_get(&self.spreadsheet_id, &range, "COLUMNS")
            .await
            .with_context(|| format!("reading run flags from {range}"))?;
        let flags = first_row(&column);
        let indexes: Vec<u32> = flags
            .iter()
            .enumerate()
            .filter(|(_, value)| RunMode::from_cell(value).is_some())
            .map(|(i, _)| i as u32 + 1)
            .collect();
        info!(rows = indexes.len(), "runnable rows found");
        Ok(indexes)
    }

    async fn batch_get_rows(&self, indexes: &[u32]) -> anyhow::Result<Vec<ConfigRow>> {
        let ranges: Vec<String> = indexes
            .iter()
            .map(|&index| row_range(&self.sheet_name, index))
            .collect();
        let value_ranges = self
            .values_batch_get(&self.spreadsheet_id, &ranges)
            .await
            .context("reading configuration rows")?;
        if value_ranges.len() != indexes.len() {
            anyhow::bail!(
                "sheets returned {} ranges for {} rows",
                value_ranges.len(),
                indexes.len()
            );
        }

        let mut rows = Vec::with_capacity(indexes.len());
        for (&index, range) in indexes.iter().zip(&value_ranges) {
            match row_from_cells(index, &first_row(range)) {
                Some(row) => rows.push(row),
                None => debug!(index, "row no longer flagged; skipped"),
            }
        }
        Ok(rows)
    }

    async fn batch_update_rows(&self, rows: &[ConfigRow]) -> anyhow::Result<()> {
        let mut data = Vec::with_capacity(rows.len() * 2);
        for row in rows {
            for binding in columns::written_back() {
                if let Some(value) = output_value(row, binding.field) {
                    let cell = format!("{}{}", binding.column, row.index);
                    data.push(single(cell_range(&self.sheet_name, &cell), value));
                }
            }
        }
        let ranges = data.len();
        self.values_batch_update(&self.spreadsheet_id, data)
            .await
            .context("writing row outputs")?;
        info!(rows = rows.len(), ranges, "row outputs written");
        Ok(())
    }

    async fn batch_update_cells(
        &self,
        sheet_id: &str,
        sheet_name: &str,
        updates: &[CellUpdate],
    ) -> anyhow::Result<()> {
        let data = updates
            .iter()
            .map(|u| single(cell_range(sheet_name, &u.cell), &u.value))
            .collect();
        self.values_batch_update(sheet_id, data)
            .await
            .with_context(|| format!("writing prices to {sheet_id}/{sheet_name}"))?;
        info!(sheet_id = %sheet_id, sheet = %sheet_name, cells = updates.len(), "prices written");
        Ok(())
    }

    async fn get_cell_value(&self, cell: &str) -> anyhow::Result<Option<String>> {
        let range = cell_range(&self.sheet_name, cell);
        let value = self
            .values_get(&self.spreadsheet_id, &range, "ROWS")
            .await
            .with_context(|| format!("reading {range}"))?;
        let raw = first_row(&value).into_iter().next().unwrap_or_default();
        Ok(Some(raw).filter(|s| !s.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_batch_get_and_pads_rows() {
        let body = json!({
            "spreadsheetId": "abc",
            "valueRanges": [
                { "range": "'Config'!B4:K4", "majorDimension": "ROWS", "values": [["1", "A,B"]] },
                { "range": "'Config'!B5:K5", "majorDimension": "ROWS" }
            ]
        })
        .to_string();
        let parsed: BatchGetResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.value_ranges.len(), 2);
        assert_eq!(first_row(&parsed.value_ranges[0]), vec!["1", "A,B"]);
        assert!(first_row(&parsed.value_ranges[1]).is_empty());
    }

    #[test]
    fn non_string_cells_render_plainly() {
        assert_eq!(cell_to_string(&json!(12)), "12");
        assert_eq!(cell_to_string(&json!(" x ")), "x");
        assert_eq!(cell_to_string(&Value::Null), "");
    }

    #[test]
    fn batch_update_payload_shape() {
        let payload = BatchUpdateRequest {
            value_input_option: "USER_ENTERED",
            data: vec![single(cell_range("Config", "G4"), "100")],
        };
        let v = serde_json::to_value(&payload).unwrap();
        assert_eq!(v["valueInputOption"], "USER_ENTERED");
        assert_eq!(v["data"][0]["range"], "'Config'!G4");
        assert_eq!(v["data"][0]["values"][0][0], "100");
    }
}
