// --- File: crates/sheetbook_sheets/src/client.rs ---
//! Google Sheets v4 client.
//!
//! Implements [`RowStore`] over the `spreadsheets.values` REST endpoints:
//! `GET values/{range}`, `PUT values/{cell}` and `POST values/{range}:append`.
//! Writes use `USER_ENTERED` so numbers and dates are interpreted the same
//! way as if typed into the sheet.

use std::sync::Arc;

use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use sheetbook_common::{BoxFuture, HTTP_CLIENT};
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::address::{a1_cell, quote_sheet_name};
use crate::auth::TokenProvider;
use crate::error::SheetError;
use crate::store::{Grid, RowStore};

#[derive(Deserialize, Debug)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Row store backed by one spreadsheet document.
pub struct SheetsClient {
    http: Client,
    api_base: String,
    spreadsheet_id: String,
    tokens: Arc<dyn TokenProvider>,
    // Serialises read-verify-write sequences issued by this client.
    write_lock: Mutex<()>,
}

impl SheetsClient {
    pub fn new(
        api_base: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            http: HTTP_CLIENT.clone(),
            api_base: api_base.into(),
            spreadsheet_id: spreadsheet_id.into(),
            tokens,
            write_lock: Mutex::new(()),
        }
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    fn values_url(&self, range: &str) -> Result<Url, SheetError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| SheetError::ConfigError(format!("Invalid sheets.api_base: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| SheetError::ConfigError("sheets.api_base cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        Ok(url)
    }

    async fn get_values(&self, range: &str) -> Result<Grid, SheetError> {
        let url = self.values_url(range)?;
        let token = self.tokens.access_token().await?;
        debug!("[Sheets] GET {}", range);
        let response = self.http.get(url).bearer_auth(token).send().await?;
        let status = response.status();
        let body_text = response.text().await?;
        if !status.is_success() {
            let message = api_error_message(&body_text);
            error!("[Sheets] Read of {} failed: {} - {}", range, status, message);
            return Err(SheetError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }
        let value_range: ValueRange = serde_json::from_str(&body_text)?;
        Ok(value_range
            .values
            .into_iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect())
    }

    async fn put_cell(&self, cell: &str, value: &str) -> Result<(), SheetError> {
        let url = self.values_url(cell)?;
        let token = self.tokens.access_token().await?;
        debug!("[Sheets] PUT {}", cell);
        let response = self
            .http
            .put(url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({
                "range": cell,
                "majorDimension": "ROWS",
                "values": [[value]],
            }))
            .send()
            .await?;
        check_write(cell, response).await
    }
}

/// Pulls `error.message` out of a Google API error body, or returns the body.
fn api_error_message(body_text: &str) -> String {
    serde_json::from_str::<Value>(body_text)
        .ok()
        .and_then(|json| {
            json.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body_text.to_string())
}

async fn check_write(target: &str, response: Response) -> Result<(), SheetError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body_text = response.text().await.unwrap_or_default();
    let message = format!("{} - {}", status, api_error_message(&body_text));
    error!("[Sheets] Write to {} rejected: {}", target, message);
    Err(SheetError::WriteError {
        target: target.to_string(),
        message,
    })
}

fn cell_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl RowStore for SheetsClient {
    fn read_range<'a>(&'a self, sheet: &'a str) -> BoxFuture<'a, Grid, SheetError> {
        Box::pin(async move { self.get_values(&quote_sheet_name(sheet)).await })
    }

    fn update_cell<'a>(
        &'a self,
        sheet: &'a str,
        row: usize,
        column: &'a str,
        value: &'a str,
    ) -> BoxFuture<'a, (), SheetError> {
        Box::pin(async move {
            let cell = a1_cell(sheet, row, column)?;
            self.put_cell(&cell, value).await
        })
    }

    fn append_row<'a>(
        &'a self,
        sheet: &'a str,
        values: Vec<String>,
    ) -> BoxFuture<'a, (), SheetError> {
        Box::pin(async move {
            let range = quote_sheet_name(sheet);
            let url = self.values_url(&format!("{}:append", range))?;
            let token = self.tokens.access_token().await?;
            debug!("[Sheets] APPEND {}", range);
            let response = self
                .http
                .post(url)
                .bearer_auth(token)
                .query(&[
                    ("valueInputOption", "USER_ENTERED"),
                    ("insertDataOption", "INSERT_ROWS"),
                ])
                .json(&json!({
                    "majorDimension": "ROWS",
                    "values": [values],
                }))
                .send()
                .await?;
            check_write(&range, response).await
        })
    }

    fn compare_and_set_cell<'a>(
        &'a self,
        sheet: &'a str,
        row: usize,
        column: &'a str,
        expected: &'a str,
        new: &'a str,
    ) -> BoxFuture<'a, bool, SheetError> {
        Box::pin(async move {
            let cell = a1_cell(sheet, row, column)?;
            let _guard = self.write_lock.lock().await;
            let grid = self.get_values(&cell).await?;
            let current = grid
                .first()
                .and_then(|r| r.first())
                .map(String::as_str)
                .unwrap_or("");
            if current != expected {
                debug!(
                    "[Sheets] {} holds '{}' (expected '{}'); skipping write",
                    cell, current, expected
                );
                return Ok(false);
            }
            self.put_cell(&cell, new).await?;
            Ok(true)
        })
    }
}
