use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::SheetsConfig;
use crate::records::RecordGrid;

/// Anything that can hand back the full record grid, header row first.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_grid(&self) -> Result<RecordGrid>;
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Option<Vec<Vec<Value>>>,
}

/// Google Sheets `values.get` client authenticated with an API key.
pub struct SheetsClient {
    client: reqwest::Client,
    config: SheetsConfig,
}

impl SheetsClient {
    pub fn new(client: reqwest::Client, config: SheetsConfig) -> Self {
        Self { client, config }
    }

    fn values_url(&self) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.sheet_id,
            self.config.range
        )
    }
}

#[async_trait]
impl RecordSource for SheetsClient {
    async fn fetch_grid(&self) -> Result<RecordGrid> {
        let url = self.values_url();
        debug!("Fetching sheet values: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .send()
            .await
            .context("Failed to send request to Google Sheets")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Google Sheets API error ({}): {}", status, error_body);
        }

        let body: ValueRange = response
            .json()
            .await
            .context("Failed to parse Google Sheets response")?;

        Ok(decode_values(body.values.unwrap_or_default()))
    }
}

fn decode_values(values: Vec<Vec<Value>>) -> RecordGrid {
    values
        .into_iter()
        .map(|row| row.into_iter().map(cell_to_string).collect())
        .collect()
}

/// String form of a cell. Sheets normally sends formatted strings, but
/// unformatted reads produce numbers and booleans.
fn cell_to_string(cell: Value) -> String {
    match cell {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
