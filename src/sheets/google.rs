//! Google Sheets v4 backend.
//!
//! Talks to the `spreadsheets.values` REST resource with a bearer token.
//! Writes use `USER_ENTERED` input so the sheet formats values the way it
//! would for typed input.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use super::{AppendOutcome, CellRange, RangeStore, SheetError};

/// Connection settings for one spreadsheet.
#[derive(Debug, Clone)]
pub struct GoogleSheetsConfig {
    pub spreadsheet_id: String,
    pub base_url: String,
    pub access_token: String,
    pub timeout_seconds: u64,
}

/// [`RangeStore`] backed by the Google Sheets REST API.
pub struct GoogleSheetsClient {
    client: Client,
    base_url: String,
    spreadsheet_id: String,
    access_token: String,
}

impl GoogleSheetsClient {
    pub fn new(config: GoogleSheetsConfig) -> Result<Self, SheetError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| SheetError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url,
            spreadsheet_id: config.spreadsheet_id,
            access_token: config.access_token,
        })
    }

    /// `{base}/v4/spreadsheets/{id}/values/{range}{suffix}`
    fn values_url(&self, range: &CellRange, suffix: &str) -> Result<Url, SheetError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SheetError::Unavailable(format!("bad base url {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| SheetError::Unavailable(format!("bad base url {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values"])
            .push(&format!("{}{}", range, suffix));
        Ok(url)
    }

    async fn send<T: for<'de> Deserialize<'de>>(
        &self,
        request: RequestBuilder,
        range: &CellRange,
    ) -> Result<T, SheetError> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| SheetError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Sheets API returned {} for {}", status, range);
            return Err(match status {
                StatusCode::BAD_REQUEST => SheetError::InvalidRange(format!("{}: {}", range, body)),
                _ => SheetError::Unavailable(format!("Sheets API returned {}: {}", status, body)),
            });
        }

        response
            .json()
            .await
            .map_err(|e| SheetError::Schema(format!("unreadable Sheets API response: {}", e)))
    }
}

/// `ValueRange` resource.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<String>,
    major_dimension: String,
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl ValueRange {
    fn rows(range: Option<&CellRange>, rows: Vec<Vec<String>>) -> Self {
        Self {
            range: range.map(|r| r.to_string()),
            major_dimension: "ROWS".to_string(),
            values: rows
                .into_iter()
                .map(|row| row.into_iter().map(serde_json::Value::String).collect())
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendValuesResponse {
    #[serde(default)]
    table_range: Option<String>,
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl RangeStore for GoogleSheetsClient {
    fn name(&self) -> &'static str {
        "google-sheets"
    }

    async fn get_values(&self, range: &CellRange) -> Result<Vec<Vec<String>>, SheetError> {
        let url = self.values_url(range, "")?;
        debug!("GET {}", url);

        let body: ValueRange = self.send(self.client.get(url), range).await?;
        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    async fn update_values(
        &self,
        range: &CellRange,
        rows: Vec<Vec<String>>,
    ) -> Result<(), SheetError> {
        let mut url = self.values_url(range, "")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");
        debug!("PUT {}", url);

        let request = self
            .client
            .put(url)
            .json(&ValueRange::rows(Some(range), rows));
        let _: serde_json::Value = self.send(request, range).await?;
        Ok(())
    }

    async fn append_values(
        &self,
        range: &CellRange,
        rows: Vec<Vec<String>>,
    ) -> Result<AppendOutcome, SheetError> {
        let mut url = self.values_url(range, ":append")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");
        debug!("POST {}", url);

        let request = self.client.post(url).json(&ValueRange::rows(None, rows));
        let body: AppendValuesResponse = self.send(request, range).await?;
        Ok(AppendOutcome {
            table_range: body.table_range,
        })
    }
}
