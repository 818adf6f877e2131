// src/sheets/mod.rs

//! External spreadsheet sink.
//!
//! The pipeline only needs two things from the sheet: make sure the
//! source's tab has its header row, and append a batch of rows. The
//! Google implementation speaks the Sheets REST values API with a bearer
//! token; tests substitute an in-memory sink.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::{AppError, Result};
use crate::models::{SheetsConfig, SourceKind};

/// Where committed rows go.
#[async_trait]
pub trait SheetSink: Send + Sync {
    /// Verify the credentials actually grant access to the spreadsheet.
    async fn authenticate(&self) -> Result<()>;

    /// Write the header row if the source's tab is still empty.
    async fn ensure_headers(&self, source: SourceKind) -> Result<()>;

    /// Append rows as one batched write; returns the row count written.
    /// Partial-row visibility is avoided by sending a single request.
    async fn append(&self, source: SourceKind, rows: Vec<Vec<String>>) -> Result<usize>;
}

/// Google Sheets values API client.
pub struct GoogleSheets {
    client: reqwest::Client,
    api_base: String,
    spreadsheet_id: String,
    token: String,
}

impl GoogleSheets {
    pub fn new(config: &SheetsConfig, token: &str) -> Result<Self> {
        if config.spreadsheet_id.is_empty() {
            return Err(AppError::config("sheets.spreadsheet_id is not set"));
        }
        if token.is_empty() {
            return Err(AppError::config("SHEETS_TOKEN is not set"));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            token: token.to_string(),
        })
    }

    fn values_url(&self, suffix: &str) -> String {
        format!(
            "{}/{}/values/{}",
            self.api_base, self.spreadsheet_id, suffix
        )
    }

    async fn read_range(&self, range: &str) -> Result<Value> {
        let response = self
            .client
            .get(self.values_url(range))
            .bearer_auth(&self.token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AppError::commit(format!(
                "sheet read {range} failed: {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }
}

/// Range targeting the first cells of a named tab.
fn tab_range(sheet_name: &str, cells: &str) -> String {
    format!("'{sheet_name}'!{cells}")
}

#[async_trait]
impl SheetSink for GoogleSheets {
    async fn authenticate(&self) -> Result<()> {
        let url = format!(
            "{}/{}?fields=spreadsheetId",
            self.api_base, self.spreadsheet_id
        );
        let response = self.client.get(url).bearer_auth(&self.token).send().await?;
        if !response.status().is_success() {
            return Err(AppError::commit(format!(
                "spreadsheet access check failed: {}",
                response.status()
            )));
        }
        log::debug!("spreadsheet access verified");
        Ok(())
    }

    async fn ensure_headers(&self, source: SourceKind) -> Result<()> {
        let spec = source.spec();
        let range = tab_range(spec.sheet_name, "A1:Z1");
        let first_row = self.read_range(&range).await?;
        if first_row["values"].as_array().is_some_and(|v| !v.is_empty()) {
            return Ok(());
        }

        let headers: Vec<String> = spec.headers.iter().map(|h| h.to_string()).collect();
        self.append(source, vec![headers]).await?;
        log::info!("{source}: wrote header row to '{}'", spec.sheet_name);
        Ok(())
    }

    async fn append(&self, source: SourceKind, rows: Vec<Vec<String>>) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let spec = source.spec();
        let count = rows.len();
        let url = format!(
            "{}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
            self.values_url(&tab_range(spec.sheet_name, "A1"))
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&json!({ "values": rows }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AppError::commit(format!(
                "sheet append to '{}' failed: {}",
                spec.sheet_name,
                response.status()
            )));
        }

        log::info!("{source}: appended {count} rows to '{}'", spec.sheet_name);
        Ok(count)
    }
}
